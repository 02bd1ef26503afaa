//! Batched, bounded-concurrency verification of client-valid candidates.

use super::api::VerificationBackend;
use super::progress::ProgressObserver;
use crate::core::config::Config;
use crate::core::error::AppError;
use crate::core::models::ServerVerdict;

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// What a dispatch run produced.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// Server verdicts, including synthetic ones for failed batches.
    pub verdicts: Vec<ServerVerdict>,
    /// Emails the endpoint actually returned a verdict for.
    pub answered: HashSet<String>,
    pub batches: usize,
    pub failed_batches: usize,
}

/// Splits candidates into fixed-size batches and sends them through a
/// [`VerificationBackend`] with at most `max_concurrency` requests in flight.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn VerificationBackend>,
    batch_size: usize,
    max_concurrency: usize,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn VerificationBackend>, config: &Config) -> Self {
        Self::with_limits(backend, config.batch_size, config.max_concurrency)
    }

    pub fn with_limits(
        backend: Arc<dyn VerificationBackend>,
        batch_size: usize,
        max_concurrency: usize,
    ) -> Self {
        Self {
            backend,
            batch_size: batch_size.max(1),
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Verifies every candidate. Never fails as a whole: a batch whose call
    /// errors yields a "Server error - try again" verdict for each of its
    /// emails and the remaining batches carry on.
    pub async fn verify(
        &self,
        candidates: &[String],
        observer: &dyn ProgressObserver,
    ) -> DispatchOutcome {
        let total = candidates.len();
        if total == 0 {
            return DispatchOutcome::default();
        }

        let batches: Vec<&[String]> = candidates.chunks(self.batch_size).collect();
        let batch_count = batches.len();
        let start_time = Instant::now();
        tracing::info!(target: "dispatch",
            "Verifying {} candidates in {} batches (batch size {}, concurrency {})",
            total, batch_count, self.batch_size, self.max_concurrency
        );

        let permits = Semaphore::new(self.max_concurrency);
        let permits = &permits;
        let backend = &self.backend;

        let mut pending: FuturesUnordered<_> = batches
            .into_iter()
            .enumerate()
            .map(|(index, batch)| async move {
                let result = match permits.acquire().await {
                    Ok(_permit) => backend.verify_batch(batch).await,
                    Err(e) => Err(AppError::Task(format!("Permit pool closed: {}", e))),
                };
                (index, batch, result)
            })
            .collect();

        let mut outcome = DispatchOutcome {
            verdicts: Vec::with_capacity(total),
            answered: HashSet::with_capacity(total),
            batches: batch_count,
            failed_batches: 0,
        };
        let mut processed = 0;

        while let Some((index, batch, result)) = pending.next().await {
            match result {
                Ok(verdicts) => {
                    tracing::debug!(target: "dispatch",
                        "Batch {}/{} returned {} verdicts for {} emails",
                        index + 1, batch_count, verdicts.len(), batch.len()
                    );
                    outcome
                        .answered
                        .extend(verdicts.iter().map(|v| v.email.clone()));
                    outcome.verdicts.extend(verdicts);
                }
                Err(e) => {
                    tracing::error!(target: "dispatch", "Batch {}/{} failed: {}", index + 1, batch_count, e);
                    outcome.failed_batches += 1;
                    outcome
                        .verdicts
                        .extend(batch.iter().map(|email| ServerVerdict::server_error(email)));
                }
            }
            processed += batch.len();
            observer.on_progress(
                processed,
                total,
                &format!("Processed batch {}/{}", index + 1, batch_count),
            );
        }

        tracing::info!(target: "dispatch",
            "Verification finished in {:.2?}: {} batches, {} failed",
            start_time.elapsed(), batch_count, outcome.failed_batches
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Result;
    use crate::core::models::SERVER_ERROR_REASON;
    use crate::verification::progress::NoProgress;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Marks every address deliverable, failing any batch containing a
    /// poisoned address, and records peak concurrency.
    #[derive(Default)]
    struct FakeBackend {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
        poisoned: Vec<String>,
    }

    #[async_trait]
    impl VerificationBackend for FakeBackend {
        async fn verify_batch(&self, emails: &[String]) -> Result<Vec<ServerVerdict>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if emails.iter().any(|e| self.poisoned.contains(e)) {
                return Err(AppError::Endpoint {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(emails
                .iter()
                .rev()
                .map(|email| ServerVerdict {
                    email: email.clone(),
                    valid: true,
                    deliverable: true,
                    reason: "Valid Domain".to_string(),
                })
                .collect())
        }
    }

    fn emails(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("user{}@example.com", i)).collect()
    }

    #[tokio::test]
    async fn never_exceeds_concurrency_limit() {
        let backend = Arc::new(FakeBackend::default());
        let dispatcher = Dispatcher::with_limits(backend.clone(), 50, 3);
        let outcome = dispatcher.verify(&emails(520), &NoProgress).await;

        assert_eq!(outcome.batches, 11);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 11);
        assert_eq!(backend.peak.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.verdicts.len(), 520);
        assert_eq!(outcome.failed_batches, 0);
    }

    #[tokio::test]
    async fn failed_batch_only_affects_its_members() {
        let candidates = emails(120);
        let backend = Arc::new(FakeBackend {
            poisoned: vec!["user60@example.com".to_string()],
            ..Default::default()
        });
        let dispatcher = Dispatcher::with_limits(backend, 50, 3);
        let outcome = dispatcher.verify(&candidates, &NoProgress).await;

        assert_eq!(outcome.failed_batches, 1);
        for verdict in &outcome.verdicts {
            let index: usize = verdict
                .email
                .trim_start_matches("user")
                .trim_end_matches("@example.com")
                .parse()
                .unwrap();
            let in_failed_batch = (50..100).contains(&index);
            assert_eq!(verdict.reason == SERVER_ERROR_REASON, in_failed_batch, "{}", verdict.email);
            assert_eq!(verdict.deliverable, !in_failed_batch);
            assert_eq!(outcome.answered.contains(&verdict.email), !in_failed_batch);
        }
        assert_eq!(outcome.answered.len(), 70);
    }

    #[tokio::test]
    async fn reports_cumulative_progress() {
        let updates = Mutex::new(Vec::new());
        let observer = |done: usize, total: usize, _message: &str| {
            updates.lock().push((done, total));
        };
        let dispatcher = Dispatcher::with_limits(Arc::new(FakeBackend::default()), 10, 2);
        dispatcher.verify(&emails(25), &observer).await;

        let updates = updates.into_inner();
        assert_eq!(updates.len(), 3);
        assert!(updates.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(updates.last(), Some(&(25, 25)));
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let backend = Arc::new(FakeBackend::default());
        let dispatcher = Dispatcher::with_limits(backend.clone(), 50, 3);
        let outcome = dispatcher.verify(&[], &NoProgress).await;
        assert!(outcome.verdicts.is_empty());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }
}
