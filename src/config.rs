//! Persistent application configuration model and defaults.

use std::path::Path;

use log::{info, warn};

/// Root configuration persisted to `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    /// Search pipeline tuning.
    #[serde(default)]
    pub search: SearchConfig,
    /// Remote catalog endpoint and transport settings.
    #[serde(default)]
    pub backend: BackendConfig,
}

/// Search pipeline tuning persisted between sessions.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a search fires.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Per-category result limit passed to the catalog.
    #[serde(default = "default_result_limit")]
    pub result_limit: u32,
    /// Age after which a cached result bundle is treated as absent.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Bound on distinct cached queries before FIFO eviction kicks in.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

/// Remote catalog connection settings.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct BackendConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Optional bearer token sent with every catalog request.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            result_limit: default_result_limit(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_result_limit() -> u32 {
    10
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_capacity() -> usize {
    50
}

fn default_endpoint() -> String {
    "http://localhost:4000".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_read_timeout_ms() -> u64 {
    15_000
}

/// Clamps out-of-range values to usable bounds.
pub fn sanitize_config(mut config: Config) -> Config {
    config.search.debounce_ms = config.search.debounce_ms.clamp(50, 2_000);
    config.search.result_limit = config.search.result_limit.clamp(1, 50);
    config.search.cache_ttl_secs = config.search.cache_ttl_secs.clamp(1, 3_600);
    config.search.cache_capacity = config.search.cache_capacity.clamp(1, 500);
    config.backend.connect_timeout_ms = config.backend.connect_timeout_ms.clamp(100, 60_000);
    config.backend.read_timeout_ms = config.backend.read_timeout_ms.clamp(100, 120_000);
    config.backend.endpoint = config.backend.endpoint.trim().to_string();
    if config.backend.endpoint.is_empty() {
        config.backend.endpoint = default_endpoint();
    }
    config
}

/// Loads the config file, creating it with defaults on first run. Parse
/// failures fall back to defaults rather than aborting startup.
pub fn load_or_create(config_file: &Path) -> Result<Config, String> {
    if !config_file.exists() {
        let default_config = sanitize_config(Config::default());
        info!(
            "Config file not found. Creating default config. path={}",
            config_file.display()
        );
        let serialized = toml::to_string(&default_config)
            .map_err(|err| format!("Failed to serialize default config: {}", err))?;
        std::fs::write(config_file, serialized).map_err(|err| {
            format!(
                "Failed to write default config {}: {}",
                config_file.display(),
                err
            )
        })?;
        return Ok(default_config);
    }

    let content = std::fs::read_to_string(config_file).map_err(|err| {
        format!(
            "Failed to read config file {}: {}",
            config_file.display(),
            err
        )
    })?;
    let config = toml::from_str::<Config>(&content).unwrap_or_else(|err| {
        warn!(
            "Config file {} did not parse ({}). Using defaults.",
            config_file.display(),
            err
        );
        Config::default()
    });
    Ok(sanitize_config(config))
}
