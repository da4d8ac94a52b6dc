//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use super::types::{LlmDialect, Res};

/// Default model identifier for the completion endpoint.
fn default_llm_model() -> String {
    "llama3".to_string()
}

/// Default per-call timeout for the completion endpoint, in seconds.
///
/// Large-model completion is slow; this is deliberately on the order of minutes.
fn default_llm_timeout_secs() -> u64 {
    300
}

/// Default per-call timeout for tracker requests, in seconds.
fn default_tracker_timeout_secs() -> u64 {
    30
}

/// Default bound on search results returned per bulk query.
fn default_search_max_results() -> u32 {
    50
}

/// Default bound on the broad scan behind the assignee ranking.
fn default_assignee_scan_max_results() -> u32 {
    1000
}

/// Default HTTP listen address.
fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

/// Configuration for the desk-bot application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Shared inner configuration.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// The actual configuration values.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Tracker base URL (`TRACKER_BASE_URL`), e.g. `https://example.atlassian.net`.
    pub tracker_base_url: String,
    /// Account email used for tracker basic auth (`TRACKER_EMAIL`).
    pub tracker_email: String,
    /// API token used for tracker basic auth (`TRACKER_API_TOKEN`).
    pub tracker_api_token: String,
    /// Per-call timeout for tracker requests, in seconds (`TRACKER_TIMEOUT_SECS`).
    #[serde(default = "default_tracker_timeout_secs")]
    pub tracker_timeout_secs: u64,
    /// Completion endpoint base URL (`LLM_ENDPOINT`).
    pub llm_endpoint: String,
    /// Model identifier sent with every completion request (`LLM_MODEL`).
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    /// Wire dialect of the completion endpoint (`LLM_DIALECT`): `ollama` or `openai`.
    #[serde(default)]
    pub llm_dialect: LlmDialect,
    /// Per-call timeout for completion requests, in seconds (`LLM_TIMEOUT_SECS`).
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
    /// Maximum results returned by bulk searches (`SEARCH_MAX_RESULTS`).
    #[serde(default = "default_search_max_results")]
    pub search_max_results: u32,
    /// Bound on the broad scan behind the assignee ranking (`ASSIGNEE_SCAN_MAX_RESULTS`).
    #[serde(default = "default_assignee_scan_max_results")]
    pub assignee_scan_max_results: u32,
    /// HTTP listen address (`LISTEN_ADDR`).
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Config {
    /// Load configuration from the environment, optionally merged with a TOML file.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("DESK_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        if result.search_max_results < 1 || result.search_max_results > 1000 {
            return Err(anyhow::anyhow!("Search max results must be between 1 and 1000."));
        }

        if result.assignee_scan_max_results < 1 || result.assignee_scan_max_results > 1000 {
            return Err(anyhow::anyhow!("Assignee scan max results must be between 1 and 1000."));
        }

        if result.tracker_timeout_secs == 0 || result.llm_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Timeouts must be greater than zero."));
        }

        Ok(result)
    }
}
