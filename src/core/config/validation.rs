//! Sanity checks applied to a fully built [`Config`].

use super::Config;
use crate::core::error::{AppError, Result};
use url::Url;

pub(crate) fn validate(config: &Config) -> Result<()> {
    if config.batch_size == 0 {
        return Err(AppError::Config("batch_size must be at least 1".to_string()));
    }
    if config.max_concurrency == 0 {
        return Err(AppError::Config(
            "max_concurrency must be at least 1".to_string(),
        ));
    }
    if config.cache_max_entries == 0 {
        return Err(AppError::Config(
            "cache max_entries must be at least 1".to_string(),
        ));
    }

    let base = Url::parse(&config.api_base_url)?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(AppError::Config(format!(
            "api base_url must use http or https, got '{}'",
            base.scheme()
        )));
    }

    if !config.verify_endpoint.starts_with('/') {
        return Err(AppError::Config(format!(
            "verify_endpoint must be a relative path starting with '/', got '{}'",
            config.verify_endpoint
        )));
    }

    if config.request_timeout.is_zero() {
        return Err(AppError::Config(
            "request_timeout must be greater than zero".to_string(),
        ));
    }

    Ok(())
}
