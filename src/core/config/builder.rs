//! Layered construction of [`Config`]: defaults, then file values, then
//! explicit overrides (usually from the command line).

use super::file::ConfigFile;
use super::{validation, Config};
use crate::core::error::{AppError, Result};
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    file: Option<ConfigFile>,
    loaded_path: Option<String>,
    api_base_url: Option<String>,
    api_token: Option<String>,
    request_timeout: Option<Duration>,
    batch_size: Option<usize>,
    max_concurrency: Option<usize>,
    cache_path: Option<PathBuf>,
    disable_cache: bool,
    reuse_cached_results: Option<bool>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file: ConfigFile, loaded_path: Option<String>) -> Self {
        self.file = Some(file);
        self.loaded_path = loaded_path;
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Keeps verdicts in memory only.
    pub fn disable_cache(mut self) -> Self {
        self.disable_cache = true;
        self
    }

    pub fn reuse_cached_results(mut self, reuse: bool) -> Self {
        self.reuse_cached_results = Some(reuse);
        self
    }

    pub fn build(self) -> Result<Config> {
        let mut config = Config::default();

        if let Some(file) = self.file {
            apply_file(&mut config, file)?;
        }
        config.loaded_config_path = self.loaded_path;

        if let Some(url) = self.api_base_url {
            config.api_base_url = url;
        }
        if let Some(token) = self.api_token {
            config.api_token = Some(token);
        }
        if let Some(timeout) = self.request_timeout {
            config.request_timeout = timeout;
        }
        if let Some(size) = self.batch_size {
            config.batch_size = size;
        }
        if let Some(limit) = self.max_concurrency {
            config.max_concurrency = limit;
        }
        if let Some(path) = self.cache_path {
            config.cache_path = Some(path);
        }
        if self.disable_cache {
            config.cache_path = None;
        }
        if let Some(reuse) = self.reuse_cached_results {
            config.reuse_cached_results = reuse;
        }

        validation::validate(&config)?;
        tracing::debug!("Final configuration: {:?}", config);
        Ok(config)
    }
}

fn apply_file(config: &mut Config, file: ConfigFile) -> Result<()> {
    let ConfigFile {
        api,
        dispatch,
        classifier,
        cache,
    } = file;

    if let Some(url) = api.base_url {
        config.api_base_url = url;
    }
    if let Some(endpoint) = api.verify_endpoint {
        config.verify_endpoint = endpoint;
    }
    if api.token.is_some() {
        config.api_token = api.token;
    }
    if let Some(secs) = api.request_timeout {
        config.request_timeout = Duration::from_secs(secs);
    }
    if let Some(agent) = api.user_agent {
        config.user_agent = agent;
    }

    if let Some(size) = dispatch.batch_size {
        config.batch_size = size;
    }
    if let Some(limit) = dispatch.max_concurrency {
        config.max_concurrency = limit;
    }

    if let Some(pattern) = classifier.email_pattern {
        config.email_regex = Regex::new(&pattern).map_err(|e| {
            AppError::Config(format!("Invalid classifier.email_pattern '{}': {}", pattern, e))
        })?;
    }
    if let Some(corrections) = classifier.domain_corrections {
        for (typo, fix) in corrections {
            config
                .domain_corrections
                .insert(typo.trim().to_lowercase(), fix.trim().to_lowercase());
        }
    }

    if let Some(path) = cache.path {
        config.cache_path = Some(PathBuf::from(path));
    }
    if let Some(hours) = cache.ttl_hours {
        let secs = hours.checked_mul(60 * 60).ok_or_else(|| {
            AppError::Config(format!("cache.ttl_hours {} is out of range", hours))
        })?;
        config.cache_ttl = Duration::from_secs(secs);
    }
    if let Some(max) = cache.max_entries {
        config.cache_max_entries = max;
    }
    if let Some(reuse) = cache.reuse_results {
        config.reuse_cached_results = reuse;
    }
    if cache.enabled == Some(false) {
        config.cache_path = None;
    }

    Ok(())
}
