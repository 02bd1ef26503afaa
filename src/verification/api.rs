//! The remote verification endpoint and the seam the dispatcher calls through.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::ServerVerdict;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Anything that can verify a batch of addresses in one call.
///
/// Implementations return one verdict per address they know about; order is
/// not significant. A returned error marks the whole batch as failed.
#[async_trait]
pub trait VerificationBackend: Send + Sync {
    async fn verify_batch(&self, emails: &[String]) -> Result<Vec<ServerVerdict>>;
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    emails: &'a [String],
}

#[derive(Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    results: Option<Vec<ServerVerdict>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Talks to the `POST {base}/email/validate` endpoint.
#[derive(Debug, Clone)]
pub struct HttpVerifier {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpVerifier {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Initialization(format!("Failed to build HTTP client: {}", e)))?;
        let url = config.verify_url();
        tracing::debug!(target: "dispatch", "HTTP verifier targeting {}", url);
        Ok(Self {
            client,
            url,
            token: config.api_token.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl VerificationBackend for HttpVerifier {
    async fn verify_batch(&self, emails: &[String]) -> Result<Vec<ServerVerdict>> {
        let start_time = Instant::now();
        let mut request = self.client.post(&self.url).json(&VerifyRequest { emails });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(target: "dispatch",
            "POST {} ({} emails) -> {} in {:.2?}",
            self.url,
            emails.len(),
            status,
            start_time.elapsed()
        );

        if !status.is_success() {
            return Err(endpoint_error(status, response.text().await.unwrap_or_default()));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        let body = response.text().await?;
        let parsed: VerifyResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::MalformedResponse(format!("{} (body: {:.200})", e, body)))?;
        Ok(parsed.results.unwrap_or_default())
    }
}

fn endpoint_error(status: StatusCode, body: String) -> AppError {
    if status == StatusCode::UNAUTHORIZED {
        return AppError::Endpoint {
            status: status.as_u16(),
            message: "Session expired. Please log in again.".to_string(),
        };
    }

    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.detail)
        .map(|d| match d {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });

    let message = detail.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });

    AppError::Endpoint {
        status: status.as_u16(),
        message,
    }
}
