//! Client-side format classification.
//!
//! Classification is an ordered table of [`FormatRule`]s: the first rule whose
//! check fails decides the verdict. Addresses that pass every rule are checked
//! against the domain-correction table and finally graded by the strict
//! pattern. No I/O happens here, so the whole input can be classified before
//! any request is issued.

use crate::core::config::{default_domain_corrections, Config};
use crate::core::models::{ClassificationVerdict, Risk};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 253;

static BASIC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Basic email pattern failed to compile. This is a bug.")
});

static STRICT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9._-]*[a-zA-Z0-9])?@[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?(\.[a-zA-Z]{2,})+$",
    )
    .expect("Strict email pattern failed to compile. This is a bug.")
});

static DEFAULT_CLASSIFIER: Lazy<Classifier> =
    Lazy::new(|| Classifier::with_corrections(default_domain_corrections()));

/// An address split at its `@`, when it has exactly one.
struct Address<'a> {
    full: &'a str,
    parts: Option<(&'a str, &'a str)>,
}

impl<'a> Address<'a> {
    fn parse(full: &'a str) -> Self {
        let mut pieces = full.split('@');
        let parts = match (pieces.next(), pieces.next(), pieces.next()) {
            (Some(local), Some(domain), None) if !domain.is_empty() => Some((local, domain)),
            _ => None,
        };
        Self { full, parts }
    }

    fn local(&self) -> &'a str {
        self.parts.map_or("", |(local, _)| local)
    }

    fn domain(&self) -> &'a str {
        self.parts.map_or("", |(_, domain)| domain)
    }
}

/// One step of the format check: `check` must hold, otherwise the address is
/// rejected with `reason`.
pub struct FormatRule {
    pub name: &'static str,
    pub reason: &'static str,
    check: fn(&Address<'_>) -> bool,
}

/// Evaluated top to bottom; the first failure wins.
static FORMAT_RULES: &[FormatRule] = &[
    FormatRule {
        name: "basic_shape",
        reason: "Invalid format",
        check: |a| BASIC_PATTERN.is_match(a.full),
    },
    FormatRule {
        name: "total_length",
        reason: "Email too long",
        check: |a| a.full.len() <= MAX_EMAIL_LEN,
    },
    FormatRule {
        name: "single_at",
        reason: "Invalid format",
        check: |a| a.parts.is_some(),
    },
    FormatRule {
        name: "local_length",
        reason: "Local part too long",
        check: |a| a.local().len() <= MAX_LOCAL_LEN,
    },
    FormatRule {
        name: "local_dot_edges",
        reason: "Invalid local part",
        check: |a| !a.local().starts_with('.') && !a.local().ends_with('.'),
    },
    FormatRule {
        name: "local_consecutive_dots",
        reason: "Invalid local part",
        check: |a| !a.local().contains(".."),
    },
    FormatRule {
        name: "domain_length",
        reason: "Domain too long",
        check: |a| a.domain().len() <= MAX_DOMAIN_LEN,
    },
    FormatRule {
        name: "domain_hyphen_edges",
        reason: "Invalid domain",
        check: |a| !a.domain().starts_with('-') && !a.domain().ends_with('-'),
    },
];

/// The ordered rule table, for inspection.
pub fn format_rules() -> &'static [FormatRule] {
    FORMAT_RULES
}

/// Applies the format rules and the typo table to candidate addresses.
#[derive(Debug, Clone)]
pub struct Classifier {
    corrections: HashMap<String, String>,
}

impl Classifier {
    pub fn new(config: &Config) -> Self {
        Self::with_corrections(config.domain_corrections.clone())
    }

    pub fn with_corrections(corrections: HashMap<String, String>) -> Self {
        Self { corrections }
    }

    /// Produces a verdict for one address. Total and side-effect free.
    pub fn classify(&self, email: &str) -> ClassificationVerdict {
        let address = Address::parse(email);

        if let Some(rule) = FORMAT_RULES.iter().find(|rule| !(rule.check)(&address)) {
            tracing::trace!(target: "classify", "{} failed rule '{}'", email, rule.name);
            return ClassificationVerdict::rejected(email, rule.reason);
        }

        let domain = address.domain().to_ascii_lowercase();
        if let Some(suggestion) = self.corrections.get(&domain) {
            return ClassificationVerdict {
                email: email.to_string(),
                client_valid: true,
                reason: format!("Did you mean @{}?", suggestion),
                risk: Risk::Medium,
            };
        }

        // Both tiers accept; the strict pattern only refines the reason.
        let reason = if STRICT_PATTERN.is_match(email) {
            "Format valid"
        } else {
            "Basic format valid"
        };

        ClassificationVerdict {
            email: email.to_string(),
            client_valid: true,
            reason: reason.to_string(),
            risk: Risk::Low,
        }
    }

    pub fn classify_all(&self, emails: &[String]) -> Vec<ClassificationVerdict> {
        let verdicts: Vec<ClassificationVerdict> =
            emails.iter().map(|email| self.classify(email)).collect();
        tracing::debug!(target: "classify",
            "Classified {} candidates, {} client-valid",
            verdicts.len(),
            verdicts.iter().filter(|v| v.client_valid).count()
        );
        verdicts
    }
}

/// Classifies with the built-in correction table.
pub fn classify(email: &str) -> ClassificationVerdict {
    DEFAULT_CLASSIFIER.classify(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typo_domain_is_flagged_but_valid() {
        let verdict = classify("a@gmail.co");
        assert!(verdict.client_valid);
        assert_eq!(verdict.reason, "Did you mean @gmail.com?");
        assert_eq!(verdict.risk, Risk::Medium);
    }

    #[test]
    fn clean_address_is_format_valid() {
        let verdict = classify("john@example.com");
        assert!(verdict.client_valid);
        assert_eq!(verdict.reason, "Format valid");
        assert_eq!(verdict.risk, Risk::Low);
    }

    #[test]
    fn basic_only_addresses_are_still_valid() {
        for email in ["a_@example.com", "%promo@example.com", "a@example-.com"] {
            let verdict = classify(email);
            assert!(verdict.client_valid, "{}", email);
            assert_eq!(verdict.reason, "Basic format valid", "{}", email);
        }
    }

    #[test]
    fn rule_failures_report_their_reason() {
        let long_local = format!("{}@example.com", "a".repeat(65));
        let long_total = format!("{}@{}.com", "a".repeat(64), "b".repeat(186));
        let cases = [
            ("user@example.c", "Invalid format"),
            ("a@b@c.com", "Invalid format"),
            ("plainaddress", "Invalid format"),
            (long_total.as_str(), "Email too long"),
            (long_local.as_str(), "Local part too long"),
            (".a@example.com", "Invalid local part"),
            ("a.@example.com", "Invalid local part"),
            ("a..b@example.com", "Invalid local part"),
            ("a@-example.com", "Invalid domain"),
            ("a@example.com-", "Invalid format"),
        ];
        for (email, reason) in cases {
            let verdict = classify(email);
            assert!(!verdict.client_valid, "{}", email);
            assert_eq!(verdict.reason, reason, "{}", email);
        }
    }

    #[test]
    fn length_rule_runs_before_local_rules() {
        let email = format!("{}..x@{}.com", "a".repeat(70), "b".repeat(190));
        assert_eq!(classify(&email).reason, "Email too long");
    }

    #[test]
    fn strict_matches_without_typo_are_format_valid() {
        for email in [
            "first.last@sub.example.org",
            "x1@y2.io",
            "a-b_c@domain-name.travel",
            "q@example.co.uk",
        ] {
            assert!(STRICT_PATTERN.is_match(email));
            let verdict = classify(email);
            assert!(verdict.client_valid, "{}", email);
            assert_eq!(verdict.reason, "Format valid", "{}", email);
        }
    }

    #[test]
    fn basic_failures_are_never_client_valid() {
        for email in ["", "@", "a@", "@b.com", "a b@c.com", "a@b.c0m", "a@b"] {
            assert!(!BASIC_PATTERN.is_match(email));
            assert!(!classify(email).client_valid, "{}", email);
        }
    }

    #[test]
    fn classification_is_idempotent() {
        for email in ["a@gmail.co", "bad", "a..b@x.com", "john@example.com"] {
            assert_eq!(classify(email), classify(email));
        }
    }

    #[test]
    fn custom_corrections_are_used() {
        let mut corrections = HashMap::new();
        corrections.insert("exmaple.com".to_string(), "example.com".to_string());
        let classifier = Classifier::with_corrections(corrections);
        assert_eq!(
            classifier.classify("me@exmaple.com").reason,
            "Did you mean @example.com?"
        );
        assert_eq!(classifier.classify("a@gmail.co").reason, "Format valid");
    }

    #[test]
    fn rule_table_order_is_stable() {
        let names: Vec<&str> = format_rules().iter().map(|r| r.name).collect();
        assert_eq!(names.first(), Some(&"basic_shape"));
        assert_eq!(names.last(), Some(&"domain_hyphen_edges"));
        assert_eq!(names.len(), 8);
    }
}
