//! Configuration management for WhoQA services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Redis result cache configuration
    #[serde(default)]
    pub redis: RedisConfig,

    /// Web search provider configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Structured answer engine configuration
    #[serde(default)]
    pub structured: StructuredConfig,

    /// Answer scoring parameters
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Sustained inbound requests per second (0 disables limiting)
    #[serde(default = "default_rate_limit_rps")]
    pub rate_limit_rps: u32,

    /// Inbound burst allowance
    #[serde(default = "default_rate_limit_burst")]
    pub rate_limit_burst: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    /// Redis URL; the in-memory cache is used when unset
    pub url: Option<String>,

    /// Key prefix for namespacing
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// TTL in seconds (0 keeps entries forever)
    #[serde(default)]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Search API endpoint
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// API key sent in the X-API-KEY header
    pub api_key: Option<String>,

    /// Results requested per rewritten query
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_call_timeout")]
    pub timeout_ms: u64,

    /// Retries after the first failed attempt
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Outbound requests per second
    #[serde(default = "default_qps")]
    pub requests_per_second: u32,

    /// Rewritten queries retrieved concurrently per question
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StructuredConfig {
    /// Query endpoint of the structured answer engine
    #[serde(default = "default_structured_endpoint")]
    pub endpoint: String,

    /// Application id for the engine
    pub app_id: Option<String>,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_structured_timeout")]
    pub timeout_ms: u64,

    /// Retries after the first failed attempt
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringConfig {
    /// Base weight for quoted (phrase) queries
    #[serde(default = "default_quoted_weight")]
    pub quoted_weight: f64,

    /// Base weight for the unquoted fallback query
    #[serde(default = "default_unquoted_weight")]
    pub unquoted_weight: f64,

    /// Multiplier applied once per capitalized word
    #[serde(default = "default_capitalization_factor")]
    pub capitalization_factor: f64,

    /// Words search engines inject into snippets
    #[serde(default = "default_boilerplate_words")]
    pub boilerplate_words: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level or EnvFilter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 60 }
fn default_rate_limit_rps() -> u32 { 20 }
fn default_rate_limit_burst() -> u32 { 40 }
fn default_key_prefix() -> String { "whoqa".to_string() }
fn default_search_endpoint() -> String { "https://google.serper.dev/search".to_string() }
fn default_results_per_query() -> usize { 10 }
fn default_call_timeout() -> u64 { 5_000 }
fn default_retries() -> u32 { 1 }
fn default_qps() -> u32 { 5 }
fn default_concurrency() -> usize { 1 }
fn default_structured_endpoint() -> String { "http://api.wolframalpha.com/v2/query".to_string() }
fn default_structured_timeout() -> u64 { 10_000 }
fn default_quoted_weight() -> f64 { 5.0 }
fn default_unquoted_weight() -> f64 { 2.0 }
fn default_capitalization_factor() -> f64 { 2.2 }
fn default_boilerplate_words() -> Vec<String> { vec!["Cached".to_string(), "Similar".to_string()] }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_metrics_port() -> u16 { 0 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            rate_limit_rps: default_rate_limit_rps(),
            rate_limit_burst: default_rate_limit_burst(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            key_prefix: default_key_prefix(),
            ttl_secs: 0,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            api_key: None,
            results_per_query: default_results_per_query(),
            timeout_ms: default_call_timeout(),
            max_retries: default_retries(),
            requests_per_second: default_qps(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for StructuredConfig {
    fn default() -> Self {
        Self {
            endpoint: default_structured_endpoint(),
            app_id: None,
            timeout_ms: default_structured_timeout(),
            max_retries: default_retries(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            quoted_weight: default_quoted_weight(),
            unquoted_weight: default_unquoted_weight(),
            capitalization_factor: default_capitalization_factor(),
            boilerplate_words: default_boilerplate_words(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., APP__SEARCH__API_KEY=...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl StructuredConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            redis: RedisConfig::default(),
            search: SearchConfig::default(),
            structured: StructuredConfig::default(),
            scoring: ScoringConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.scoring.quoted_weight, 5.0);
        assert_eq!(config.scoring.unquoted_weight, 2.0);
        assert_eq!(config.scoring.capitalization_factor, 2.2);
        assert_eq!(config.scoring.boilerplate_words, vec!["Cached", "Similar"]);
        assert!(config.redis.url.is_none());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"search": {"api_key": "k", "results_per_query": 5}}"#,
        )
        .unwrap();
        assert_eq!(config.search.api_key.as_deref(), Some("k"));
        assert_eq!(config.search.results_per_query, 5);
        assert_eq!(config.search.max_retries, 1);
        assert_eq!(config.search.timeout(), Duration::from_millis(5_000));
        assert_eq!(config.structured.timeout_ms, 10_000);
    }
}
