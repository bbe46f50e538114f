//! Configuration structures
//!
//! Deserialisable from JSON/TOML files or assembled from environment
//! variables by the infra loader. Every section has defaults except the
//! Commerce7 credentials.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BIND_ADDR, DEFAULT_COMMERCE7_BASE_URL, DEFAULT_DB_PATH, DEFAULT_DB_POOL_SIZE,
    DEFAULT_HISTORY_START, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_PAGES,
    DEFAULT_PAGE_DELAY_MS, DEFAULT_PAGE_SIZE,
};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub commerce7: Commerce7Config,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// SQLite storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: DEFAULT_DB_PATH.to_string(), pool_size: DEFAULT_DB_POOL_SIZE }
    }
}

/// Commerce7 API credentials and endpoint
#[derive(Clone, Serialize, Deserialize)]
pub struct Commerce7Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub app_id: String,
    pub api_key: String,
    pub tenant_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Commerce7Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for Commerce7Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commerce7Config")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .field("api_key", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Fetch policy and sync defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Records requested per upstream page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Hard ceiling on pages per run.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Attempts per page (initial try included).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay between full pages; also the unit of linear retry backoff.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    /// First day of the full historical range (`YYYY-MM-DD`).
    #[serde(default = "default_history_start")]
    pub history_start: String,
}

impl SyncConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
            history_start: DEFAULT_HISTORY_START.to_string(),
        }
    }
}

/// HTTP trigger surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: DEFAULT_BIND_ADDR.to_string() }
    }
}

fn default_pool_size() -> u32 {
    DEFAULT_DB_POOL_SIZE
}

fn default_base_url() -> String {
    DEFAULT_COMMERCE7_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_page_delay_ms() -> u64 {
    DEFAULT_PAGE_DELAY_MS
}

fn default_history_start() -> String {
    DEFAULT_HISTORY_START.to_string()
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
[commerce7]
app_id = "app"
api_key = "secret"
tenant_id = "winery"
"#,
        )
        .expect("config parses");

        assert_eq!(config.commerce7.base_url, DEFAULT_COMMERCE7_BASE_URL);
        assert_eq!(config.sync.page_size, 50);
        assert_eq!(config.sync.max_pages, 100);
        assert_eq!(config.sync.max_attempts, 3);
        assert_eq!(config.sync.page_delay(), Duration::from_secs(2));
        assert_eq!(config.database.path, DEFAULT_DB_PATH);
        assert_eq!(config.server.bind_addr, DEFAULT_BIND_ADDR);
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = Commerce7Config {
            base_url: DEFAULT_COMMERCE7_BASE_URL.into(),
            app_id: "app".into(),
            api_key: "super-secret".into(),
            tenant_id: "winery".into(),
            timeout_secs: 30,
        };

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
