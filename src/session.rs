//! One validation session: extraction, classification, verification,
//! merging and caching, driven end to end by [`ValidationSession::run`].

use crate::cache::ResultCache;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::models::{ClassificationVerdict, MergedResult, ServerVerdict, Summary};
use crate::results::{merge, summarize};
use crate::utils::classify::Classifier;
use crate::utils::extract::extract_candidates;
use crate::verification::{Dispatcher, HttpVerifier, ProgressObserver, VerificationBackend};

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything a finished run produced.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<MergedResult>,
    pub summary: Summary,
    pub elapsed: Duration,
    /// Candidates answered from the cache instead of the endpoint.
    pub cache_hits: usize,
    pub failed_batches: usize,
}

impl RunReport {
    /// One-line end-of-run notification.
    pub fn notification(&self) -> String {
        if self.results.is_empty() {
            return "No email addresses found in the input".to_string();
        }
        let mut line = format!(
            "Validated {} emails in {}ms",
            self.summary.total,
            self.elapsed.as_millis()
        );
        if self.failed_batches > 0 {
            line.push_str(&format!(
                " ({} batch{} failed, affected rows say so)",
                self.failed_batches,
                if self.failed_batches == 1 { "" } else { "es" }
            ));
        }
        line
    }
}

/// Owns the collaborators for one tab/process worth of validation runs.
pub struct ValidationSession {
    config: Arc<Config>,
    classifier: Classifier,
    dispatcher: Dispatcher,
    cache: ResultCache,
    last_results: Option<Vec<MergedResult>>,
}

impl ValidationSession {
    pub fn new(
        config: Arc<Config>,
        backend: Arc<dyn VerificationBackend>,
        cache: ResultCache,
    ) -> Self {
        Self {
            classifier: Classifier::new(&config),
            dispatcher: Dispatcher::new(backend, &config),
            cache,
            last_results: None,
            config,
        }
    }

    /// Builds a session against the configured HTTP endpoint and cache file.
    pub fn from_config(config: Config) -> Result<Self> {
        let backend = Arc::new(HttpVerifier::new(&config)?);
        let cache = ResultCache::from_config(&config);
        Ok(Self::new(Arc::new(config), backend, cache))
    }

    /// Candidates `text` would produce, without validating them.
    pub fn count_candidates(&self, text: &str) -> usize {
        extract_candidates(&self.config.email_regex, text).len()
    }

    pub fn classify(&self, email: &str) -> ClassificationVerdict {
        self.classifier.classify(email)
    }

    pub fn last_results(&self) -> Option<&[MergedResult]> {
        self.last_results.as_deref()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Validates every address found in `text`.
    ///
    /// Runs to completion: batch failures surface as per-row reasons and
    /// cache write failures are logged.
    pub async fn run(&mut self, text: &str, observer: &dyn ProgressObserver) -> RunReport {
        let start_time = Instant::now();
        self.last_results = None;

        let candidates = extract_candidates(&self.config.email_regex, text);
        if candidates.is_empty() {
            tracing::info!(target: "session", "No candidates in input");
            return RunReport::default();
        }
        tracing::info!(target: "session", "Starting validation of {} candidates", candidates.len());

        let classifications = self.classifier.classify_all(&candidates);
        let client_valid: Vec<String> = classifications
            .iter()
            .filter(|c| c.client_valid)
            .map(|c| c.email.clone())
            .collect();
        observer.on_progress(
            client_valid.len(),
            candidates.len(),
            "Client validation complete",
        );

        let (cached_verdicts, to_verify) = self.split_cached(client_valid);
        let cache_hits = cached_verdicts.len();
        if cache_hits > 0 {
            tracing::info!(target: "session", "Answered {} candidates from cache", cache_hits);
        }

        let outcome = self.dispatcher.verify(&to_verify, observer).await;
        let mut verified = outcome.answered;
        verified.extend(cached_verdicts.iter().map(|v| v.email.clone()));
        let mut server_verdicts = cached_verdicts;
        server_verdicts.extend(outcome.verdicts);

        let results = merge(&classifications, &server_verdicts);

        self.cache.record(&results, &verified);
        if let Err(e) = self.cache.save() {
            tracing::warn!(target: "session", "Failed to save cache to {}: {}", self.cache.location(), e);
        }

        let report = RunReport {
            summary: summarize(&results),
            results: results.clone(),
            elapsed: start_time.elapsed(),
            cache_hits,
            failed_batches: outcome.failed_batches,
        };
        self.last_results = Some(results);

        tracing::info!(target: "session", "{}", report.notification());
        report
    }

    /// Separates candidates with a fresh cached verdict from those that still
    /// need the endpoint. Without `reuse_cached_results` nothing is reused,
    /// and entries the endpoint never answered are always retried.
    fn split_cached(&self, candidates: Vec<String>) -> (Vec<ServerVerdict>, Vec<String>) {
        if !self.config.reuse_cached_results {
            return (Vec::new(), candidates);
        }

        let mut cached = Vec::new();
        let mut remaining = Vec::new();
        for email in candidates {
            match self.cache.get(&email) {
                Some(entry) if entry.verified => cached.push(ServerVerdict {
                    email,
                    valid: entry.result.valid,
                    deliverable: entry.result.deliverable,
                    reason: entry.result.reason.clone(),
                }),
                _ => remaining.push(email),
            }
        }
        (cached, remaining)
    }
}
