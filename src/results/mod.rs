//! Merging client and server verdicts, plus the read-only query surface over
//! the merged result set.

pub mod export;
pub mod query;

pub use export::export_csv;
pub use query::{filter_by_status, search};

use crate::core::models::{ClassificationVerdict, MergedResult, ServerVerdict, Summary};
use std::collections::HashMap;

/// Combines classifications with server verdicts, one result per
/// classification, in classification order.
///
/// A server verdict for the same email overrides `valid`, `deliverable` and
/// `reason`; deliverable addresses always read "Deliverable". Without one, the
/// client verdict stands and `deliverable` is false.
pub fn merge(
    classifications: &[ClassificationVerdict],
    server_verdicts: &[ServerVerdict],
) -> Vec<MergedResult> {
    let by_email: HashMap<&str, &ServerVerdict> = server_verdicts
        .iter()
        .map(|v| (v.email.as_str(), v))
        .collect();

    classifications
        .iter()
        .map(|client| match by_email.get(client.email.as_str()) {
            Some(server) => MergedResult {
                email: client.email.clone(),
                valid: server.valid,
                deliverable: server.deliverable,
                reason: if server.deliverable {
                    "Deliverable".to_string()
                } else if server.reason.is_empty() {
                    client.reason.clone()
                } else {
                    server.reason.clone()
                },
                risk: client.risk,
            },
            None => MergedResult {
                email: client.email.clone(),
                valid: client.client_valid,
                deliverable: false,
                reason: client.reason.clone(),
                risk: client.risk,
            },
        })
        .collect()
}

pub fn summarize(results: &[MergedResult]) -> Summary {
    let valid_count = results.iter().filter(|r| r.valid).count();
    Summary {
        total: results.len(),
        valid_count,
        invalid_count: results.len() - valid_count,
        deliverable_count: results.iter().filter(|r| r.deliverable).count(),
    }
}
