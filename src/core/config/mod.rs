//! Defines the core runtime `Config` struct, its defaults, and related utilities.
//! Submodules handle loading, building, and validation.

pub(crate) mod builder;
pub(crate) mod file;
pub(crate) mod loading;
pub(crate) mod validation;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;
pub use loading::load_config_file;

use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Extraction pattern used to pull candidate addresses out of free-form text.
pub const DEFAULT_EMAIL_PATTERN: &str = r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}";

/// Runtime configuration settings used by the email-triage core logic.
#[derive(Clone)]
pub struct Config {
    pub api_base_url: String,
    pub verify_endpoint: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub user_agent: String,

    pub batch_size: usize,
    pub max_concurrency: usize,

    pub email_regex: Regex,
    pub domain_corrections: HashMap<String, String>,

    pub cache_path: Option<PathBuf>,
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
    pub reuse_cached_results: bool,

    pub loaded_config_path: Option<String>,
}

/// Common misspellings of the big mailbox providers.
pub fn default_domain_corrections() -> HashMap<String, String> {
    [
        ("gmail.co", "gmail.com"),
        ("gmail.cm", "gmail.com"),
        ("gmai.com", "gmail.com"),
        ("gmial.com", "gmail.com"),
        ("yahoo.co", "yahoo.com"),
        ("yahoo.cm", "yahoo.com"),
        ("hotmail.co", "hotmail.com"),
        ("hotmail.cm", "hotmail.com"),
        ("outlook.co", "outlook.com"),
        ("outlook.cm", "outlook.com"),
    ]
    .iter()
    .map(|(typo, fix)| (typo.to_string(), fix.to_string()))
    .collect()
}

/// Default location of the persisted verdict cache.
pub fn default_cache_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".email-triage")
        .join("cache.json")
}

impl Config {
    fn build_default() -> Self {
        let email_regex = Regex::new(DEFAULT_EMAIL_PATTERN)
            .expect("Default email regex pattern failed to compile. This is a bug.");

        Config {
            api_base_url: "http://localhost:8000".to_string(),
            verify_endpoint: "/email/validate".to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(30),
            user_agent: format!("email-triage-core/{}", env!("CARGO_PKG_VERSION")),
            batch_size: 50,
            max_concurrency: 3,
            email_regex,
            domain_corrections: default_domain_corrections(),
            cache_path: Some(default_cache_path()),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            cache_max_entries: 1000,
            reuse_cached_results: false,
            loaded_config_path: None,
        }
    }

    /// Full URL of the verification endpoint.
    pub fn verify_url(&self) -> String {
        format!(
            "{}{}",
            self.api_base_url.trim_end_matches('/'),
            sanitize_path(&self.verify_endpoint)
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::build_default()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("verify_endpoint", &self.verify_endpoint)
            .field("api_token_set", &self.api_token.is_some())
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .field("batch_size", &self.batch_size)
            .field("max_concurrency", &self.max_concurrency)
            .field("email_regex", &self.email_regex.as_str())
            .field("domain_corrections_count", &self.domain_corrections.len())
            .field("cache_path", &self.cache_path)
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_max_entries", &self.cache_max_entries)
            .field("reuse_cached_results", &self.reuse_cached_results)
            .field("loaded_config_path", &self.loaded_config_path)
            .finish()
    }
}

/// Strips `..` segments and collapses repeated slashes in an endpoint path.
pub fn sanitize_path(path: &str) -> String {
    let without_dots = path.replace("..", "");
    let mut sanitized = String::with_capacity(without_dots.len());
    let mut previous_slash = false;
    for c in without_dots.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        sanitized.push(c);
    }
    sanitized
}
