//! Filtering and searching over merged results. Nothing here mutates the
//! input; every function returns a fresh list.

use crate::core::models::{MergedResult, StatusFilter};

pub fn filter_by_status(results: &[MergedResult], status: StatusFilter) -> Vec<MergedResult> {
    results
        .iter()
        .filter(|r| status.matches(r))
        .cloned()
        .collect()
}

/// Case-insensitive substring match on the email. An empty query matches
/// everything.
pub fn search(results: &[MergedResult], query: &str) -> Vec<MergedResult> {
    let needle = query.trim().to_lowercase();
    results
        .iter()
        .filter(|r| r.email.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Risk;

    fn result(email: &str, valid: bool, deliverable: bool) -> MergedResult {
        MergedResult {
            email: email.to_string(),
            valid,
            deliverable,
            reason: String::new(),
            risk: Risk::Low,
        }
    }

    fn mixed_set() -> Vec<MergedResult> {
        let mut results = Vec::new();
        for i in 0..3 {
            results.push(result(&format!("deliver{}@example.com", i), true, true));
        }
        for i in 0..4 {
            results.push(result(&format!("valid{}@example.com", i), true, false));
        }
        for i in 0..3 {
            results.push(result(&format!("invalid{}@example", i), false, false));
        }
        results
    }

    #[test]
    fn deliverable_filter_returns_only_deliverable() {
        let filtered = filter_by_status(&mixed_set(), StatusFilter::Deliverable);
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|r| r.deliverable));
    }

    #[test]
    fn filters_partition_the_set() {
        let set = mixed_set();
        assert_eq!(filter_by_status(&set, StatusFilter::All).len(), 10);
        assert_eq!(filter_by_status(&set, StatusFilter::Valid).len(), 4);
        assert_eq!(filter_by_status(&set, StatusFilter::Invalid).len(), 3);
    }

    #[test]
    fn search_is_case_insensitive() {
        let set = mixed_set();
        assert_eq!(search(&set, "VALID").len(), 7);
        assert_eq!(search(&set, "Deliver1").len(), 1);
        assert_eq!(search(&set, "").len(), 10);
        assert!(search(&set, "nomatch").is_empty());
    }
}
