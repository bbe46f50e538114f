//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the Commerce7 credentials are missing, falls back to a file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `CELLARSYNC_C7_APP_ID`, `CELLARSYNC_C7_API_KEY`, `CELLARSYNC_C7_TENANT_ID`
//!
//! Optional (defaults in `cellarsync_domain::constants`):
//! - `CELLARSYNC_C7_BASE_URL`, `CELLARSYNC_C7_TIMEOUT_SECS`
//! - `CELLARSYNC_DB_PATH`, `CELLARSYNC_DB_POOL_SIZE`
//! - `CELLARSYNC_PAGE_SIZE`, `CELLARSYNC_MAX_PAGES`, `CELLARSYNC_MAX_ATTEMPTS`,
//!   `CELLARSYNC_PAGE_DELAY_MS`, `CELLARSYNC_HISTORY_START`
//! - `CELLARSYNC_BIND_ADDR`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./cellarsync.json` or `./cellarsync.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use cellarsync_domain::constants::{
    DEFAULT_COMMERCE7_BASE_URL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_PAGES, DEFAULT_PAGE_DELAY_MS, DEFAULT_PAGE_SIZE,
};
use cellarsync_domain::{
    CellarSyncError, Commerce7Config, Config, DatabaseConfig, DateRange, Result, ServerConfig,
    SyncConfig,
};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["config.json", "config.toml", "cellarsync.json", "cellarsync.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `CellarSyncError::Config` if configuration cannot be loaded from
/// either source or fails validation.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only the Commerce7 credentials are required; every other setting falls
/// back to its default.
///
/// # Errors
/// Returns `CellarSyncError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let commerce7 = Commerce7Config {
        base_url: env_or("CELLARSYNC_C7_BASE_URL", DEFAULT_COMMERCE7_BASE_URL.to_string())?,
        app_id: env_var("CELLARSYNC_C7_APP_ID")?,
        api_key: env_var("CELLARSYNC_C7_API_KEY")?,
        tenant_id: env_var("CELLARSYNC_C7_TENANT_ID")?,
        timeout_secs: env_or("CELLARSYNC_C7_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
    };

    let database_defaults = DatabaseConfig::default();
    let database = DatabaseConfig {
        path: env_or("CELLARSYNC_DB_PATH", database_defaults.path)?,
        pool_size: env_or("CELLARSYNC_DB_POOL_SIZE", database_defaults.pool_size)?,
    };

    let sync = SyncConfig {
        page_size: env_or("CELLARSYNC_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
        max_pages: env_or("CELLARSYNC_MAX_PAGES", DEFAULT_MAX_PAGES)?,
        max_attempts: env_or("CELLARSYNC_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
        page_delay_ms: env_or("CELLARSYNC_PAGE_DELAY_MS", DEFAULT_PAGE_DELAY_MS)?,
        history_start: env_or("CELLARSYNC_HISTORY_START", SyncConfig::default().history_start)?,
    };

    let server =
        ServerConfig { bind_addr: env_or("CELLARSYNC_BIND_ADDR", ServerConfig::default().bind_addr)? };

    let config = Config { database, commerce7, sync, server };
    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations via
/// [`probe_config_paths`]. Format is detected by file extension.
///
/// # Errors
/// Returns `CellarSyncError::Config` if the file is missing, cannot be
/// parsed, or fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CellarSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CellarSyncError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CellarSyncError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    validate(&config)?;
    Ok(config)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CellarSyncError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CellarSyncError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(CellarSyncError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Rejects settings that would make a sync run meaningless.
fn validate(config: &Config) -> Result<()> {
    let c7 = &config.commerce7;
    for (name, value) in
        [("app_id", &c7.app_id), ("api_key", &c7.api_key), ("tenant_id", &c7.tenant_id)]
    {
        if value.trim().is_empty() {
            return Err(CellarSyncError::Config(format!("commerce7.{name} must not be empty")));
        }
    }

    url::Url::parse(&c7.base_url).map_err(|e| {
        CellarSyncError::Config(format!("Invalid commerce7.base_url {}: {}", c7.base_url, e))
    })?;

    if config.sync.page_size == 0 || config.sync.max_pages == 0 || config.sync.max_attempts == 0 {
        return Err(CellarSyncError::Config(
            "sync.page_size, sync.max_pages and sync.max_attempts must be positive".to_string(),
        ));
    }

    if config.database.pool_size == 0 {
        return Err(CellarSyncError::Config("database.pool_size must be positive".to_string()));
    }

    DateRange::parse(&config.sync.history_start, &config.sync.history_start).map_err(|e| {
        CellarSyncError::Config(format!("Invalid sync.history_start: {}", e))
    })?;

    Ok(())
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its parent, and the directory
/// of the running executable.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `CellarSyncError::Config` if the variable is not set or blank.
fn env_var(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(CellarSyncError::Config(format!(
            "Missing required environment variable: {}",
            key
        ))),
    }
}

/// Parse an optional environment variable, using `default` when unset.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| CellarSyncError::Config(format!("Invalid value for {}: {}", key, e))),
        _ => Ok(default),
    }
}
