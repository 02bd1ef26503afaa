//! Defines the structure mirroring the TOML configuration file format.

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub(crate) api: ApiConfig,
    #[serde(default)]
    pub(crate) dispatch: DispatchConfig,
    #[serde(default)]
    pub(crate) classifier: ClassifierConfig,
    #[serde(default)]
    pub(crate) cache: CacheConfig,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ApiConfig {
    pub(crate) base_url: Option<String>,
    pub(crate) verify_endpoint: Option<String>,
    pub(crate) token: Option<String>,
    pub(crate) request_timeout: Option<u64>,
    pub(crate) user_agent: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct DispatchConfig {
    pub(crate) batch_size: Option<usize>,
    pub(crate) max_concurrency: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ClassifierConfig {
    pub(crate) email_pattern: Option<String>,
    /// Extra typo corrections, merged over the built-in table.
    pub(crate) domain_corrections: Option<HashMap<String, String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct CacheConfig {
    pub(crate) path: Option<String>,
    pub(crate) ttl_hours: Option<u64>,
    pub(crate) max_entries: Option<usize>,
    pub(crate) reuse_results: Option<bool>,
    pub(crate) enabled: Option<bool>,
}
