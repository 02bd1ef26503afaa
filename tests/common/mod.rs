#![allow(dead_code)]

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const VERIFY_PATH: &str = "/email/validate";

#[derive(Deserialize)]
struct VerifyBody {
    emails: Vec<String>,
}

/// Answers each batch with one verdict per email, in reverse order.
///
/// Addresses at `example.com` are deliverable, anything else is valid but not
/// deliverable. A batch containing an address with "fail" in it gets a 500.
pub struct EchoVerifier {
    pub delay: Duration,
}

impl Respond for EchoVerifier {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: VerifyBody = match request.body_json() {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(422).set_body_json(json!({"detail": "bad body"})),
        };

        if body.emails.iter().any(|e| e.contains("fail")) {
            return ResponseTemplate::new(500)
                .set_body_json(json!({"detail": "Validation backend crashed"}))
                .set_delay(self.delay);
        }

        let results: Vec<serde_json::Value> = body
            .emails
            .iter()
            .rev()
            .map(|email| {
                let deliverable = email.ends_with("@example.com");
                json!({
                    "email": email,
                    "valid": true,
                    "deliverable": deliverable,
                    "reason": if deliverable { "Valid Domain" } else { "SMTP unreachable - possibly valid" },
                })
            })
            .collect();

        ResponseTemplate::new(200)
            .set_body_json(json!({ "results": results }))
            .set_delay(self.delay)
    }
}

/// Starts a mock verification endpoint backed by [`EchoVerifier`].
pub async fn mock_verify_server(delay_ms: u64) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(VERIFY_PATH))
        .respond_with(EchoVerifier {
            delay: Duration::from_millis(delay_ms),
        })
        .mount(&server)
        .await;

    server
}

/// Starts a mock endpoint that always answers with `status_code`.
pub async fn mock_status_server(status_code: u16, body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(VERIFY_PATH))
        .respond_with(ResponseTemplate::new(status_code).set_body_json(body))
        .mount(&server)
        .await;

    server
}
