//! Core library for email-triage.
//!
//! Pulls email addresses out of free-form text, classifies them with local
//! format rules, verifies the plausible ones in bounded-concurrency batches
//! against a remote endpoint, and merges, caches and exports the outcome.

pub mod cache;
pub mod core;
pub mod results;
pub mod session;
pub mod utils;
pub mod verification;

pub use crate::cache::{CacheStore, FileStore, MemoryStore, ResultCache};
pub use crate::core::config::{Config, ConfigBuilder, ConfigFile};
pub use crate::core::error::{AppError, Result};
pub use crate::core::models::{
    ClassificationVerdict, ExportScope, MergedResult, ResultStatus, Risk, ServerVerdict,
    StatusFilter, Summary,
};
pub use crate::results::{export_csv, filter_by_status, merge, search, summarize};
pub use crate::session::{RunReport, ValidationSession};
pub use crate::utils::classify::{classify, Classifier};
pub use crate::utils::extract::extract_candidates;
pub use crate::verification::{
    Dispatcher, HttpVerifier, NoProgress, ProgressObserver, VerificationBackend,
};
