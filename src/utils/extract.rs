//! Pulls candidate addresses out of free-form text.

use regex::Regex;
use std::collections::HashSet;

/// Returns every distinct email-shaped token in `text`, lower-cased, in the
/// order first seen.
///
/// Text without any match (including empty input) yields an empty list.
pub fn extract_candidates(email_regex: &Regex, text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let candidates: Vec<String> = email_regex
        .find_iter(text)
        .map(|m| m.as_str().trim().to_lowercase())
        .filter(|email| seen.insert(email.clone()))
        .collect();

    tracing::debug!(target: "extract", "Extracted {} unique candidates", candidates.len());
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_EMAIL_PATTERN;

    fn regex() -> Regex {
        Regex::new(DEFAULT_EMAIL_PATTERN).unwrap()
    }

    #[test]
    fn dedups_and_lowercases() {
        let found = extract_candidates(&regex(), "a@gmail.co\nbad-email\nJOHN@EXAMPLE.COM");
        assert_eq!(found, vec!["a@gmail.co", "john@example.com"]);
    }

    #[test]
    fn duplicates_differing_in_case_collapse() {
        let found = extract_candidates(&regex(), "Jane@Example.org, jane@example.org; JANE@EXAMPLE.ORG");
        assert_eq!(found, vec!["jane@example.org"]);
    }

    #[test]
    fn empty_and_blank_input_yield_nothing() {
        assert!(extract_candidates(&regex(), "").is_empty());
        assert!(extract_candidates(&regex(), "   \n\t ").is_empty());
        assert!(extract_candidates(&regex(), "no addresses in here @ all").is_empty());
    }

    #[test]
    fn finds_addresses_inside_prose() {
        let text = "Contact <sales@shop.example.co.uk> or (ops+alerts@example.io).";
        let found = extract_candidates(&regex(), text);
        assert_eq!(found, vec!["sales@shop.example.co.uk", "ops+alerts@example.io"]);
    }

    #[test]
    fn every_candidate_matches_the_pattern() {
        let re = regex();
        let text = "x@y.zz,, @@a.b foo@bar baz.qux@host.tld first.last@sub.domain.com";
        for candidate in extract_candidates(&re, text) {
            assert!(re.is_match(&candidate), "{} should match", candidate);
        }
    }
}
