//! Core data structures shared by the extraction, classification,
//! verification and aggregation stages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How suspicious a client-side verdict is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    #[default]
    Low,
    Medium,
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Risk::Low => f.write_str("low"),
            Risk::Medium => f.write_str("medium"),
        }
    }
}

/// Outcome of the local syntactic rules for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    pub email: String,
    /// True when every format rule passed.
    pub client_valid: bool,
    /// Rule outcome, or a typo suggestion.
    pub reason: String,
    pub risk: Risk,
}

impl ClassificationVerdict {
    pub(crate) fn rejected(email: &str, reason: &str) -> Self {
        Self {
            email: email.to_string(),
            client_valid: false,
            reason: reason.to_string(),
            risk: Risk::Low,
        }
    }
}

/// Verdict returned by the remote verification endpoint for one email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerVerdict {
    pub email: String,
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub deliverable: bool,
    #[serde(default)]
    pub reason: String,
}

/// Reason attached to every email of a batch whose request failed.
pub const SERVER_ERROR_REASON: &str = "Server error - try again";

impl ServerVerdict {
    /// Creates the synthetic negative verdict used when a batch call fails.
    pub fn server_error(email: &str) -> Self {
        Self {
            email: email.to_string(),
            valid: false,
            deliverable: false,
            reason: SERVER_ERROR_REASON.to_string(),
        }
    }
}

/// Final per-email record exposed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedResult {
    pub email: String,
    pub valid: bool,
    pub deliverable: bool,
    pub reason: String,
    #[serde(default)]
    pub risk: Risk,
}

impl MergedResult {
    /// The exclusive display status of this result.
    pub fn status(&self) -> ResultStatus {
        if self.deliverable {
            ResultStatus::Deliverable
        } else if self.valid {
            ResultStatus::Valid
        } else {
            ResultStatus::Invalid
        }
    }
}

/// Exclusive status bucket a result falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Deliverable,
    Valid,
    Invalid,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::Deliverable => f.write_str("deliverable"),
            ResultStatus::Valid => f.write_str("valid"),
            ResultStatus::Invalid => f.write_str("invalid"),
        }
    }
}

/// Status filter accepted by [`crate::results::filter_by_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Valid,
    Deliverable,
    Invalid,
}

impl StatusFilter {
    pub fn matches(self, result: &MergedResult) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Valid => result.status() == ResultStatus::Valid,
            StatusFilter::Deliverable => result.status() == ResultStatus::Deliverable,
            StatusFilter::Invalid => result.status() == ResultStatus::Invalid,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "valid" => Ok(StatusFilter::Valid),
            "deliverable" => Ok(StatusFilter::Deliverable),
            "invalid" => Ok(StatusFilter::Invalid),
            other => Err(format!(
                "unknown status '{}' (expected all, valid, deliverable or invalid)",
                other
            )),
        }
    }
}

/// Which rows a CSV export includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportScope {
    #[default]
    All,
    ValidOnly,
}

impl FromStr for ExportScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ExportScope::All),
            "valid" | "valid-only" | "validonly" => Ok(ExportScope::ValidOnly),
            other => Err(format!(
                "unknown export scope '{}' (expected all or valid)",
                other
            )),
        }
    }
}

/// Simple counts over a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub total: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub deliverable_count: usize,
}

impl Summary {
    /// Share of valid results, rounded to the nearest whole percent.
    pub fn valid_percent(&self) -> u32 {
        percent(self.valid_count, self.total)
    }

    pub fn invalid_percent(&self) -> u32 {
        percent(self.invalid_count, self.total)
    }
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}
