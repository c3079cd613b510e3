use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DATA_DIR_ENV: &str = "INTELINK_DATA_DIR";
pub const API_URL_ENV: &str = "INTELINK_API_URL";

const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";
const DEFAULT_LOG_FILTER: &str = "info,intelink=debug";
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;

/// Client settings, stored globally in `{data_root}/global/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the REST backend, e.g. `https://api.intelink.click/api/v1`
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout; none means the HTTP client default
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// tracing filter used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Quiet period before a search/filter change resets the list page
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Region code forced to a minimum of one click on the country map
    #[serde(default)]
    pub map_floor_region: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

fn default_search_debounce_ms() -> u64 {
    DEFAULT_SEARCH_DEBOUNCE_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: None,
            log_filter: default_log_filter(),
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            map_floor_region: None,
        }
    }
}

impl Config {
    /// Load the config for a data root, then apply environment overrides.
    ///
    /// A missing config file yields the defaults.
    pub fn load(data_root: &Path) -> Result<Self> {
        let mut config = Self::load_stored(data_root)?;

        if let Ok(url) = env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_url = url.trim().to_string();
            }
        }

        Ok(config)
    }

    /// Load only what is stored on disk, without environment overrides.
    pub fn load_stored(data_root: &Path) -> Result<Self> {
        let path = config_file_path(data_root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Set one setting by its file key. An empty value resets optional
    /// settings.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "api_url" => {
                url::Url::parse(value).with_context(|| format!("Invalid URL '{}'", value))?;
                self.api_url = value.to_string();
            }
            "timeout_secs" => {
                self.timeout_secs = if value.is_empty() {
                    None
                } else {
                    let secs: u64 = value.parse().context("timeout_secs must be a number")?;
                    if secs == 0 {
                        anyhow::bail!("timeout_secs must be at least 1; leave it empty for no timeout");
                    }
                    Some(secs)
                };
            }
            "log_filter" => self.log_filter = value.to_string(),
            "search_debounce_ms" => {
                self.search_debounce_ms =
                    value.parse().context("search_debounce_ms must be a number")?;
            }
            "map_floor_region" => {
                self.map_floor_region = (!value.is_empty()).then(|| value.to_uppercase());
            }
            other => anyhow::bail!("Unknown setting '{}'", other),
        }
        Ok(())
    }

    /// Save the config to the global config file
    pub fn save(&self, data_root: &Path) -> Result<()> {
        let path = config_file_path(data_root);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Request timeout; a stored 0 counts as unset.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|&s| s > 0).map(Duration::from_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

/// Root directory for config, session and logs.
pub fn resolve_data_root() -> PathBuf {
    match env::var_os(DATA_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(".intelink"),
    }
}

fn config_file_path(data_root: &Path) -> PathBuf {
    data_root.join("global").join("config.json")
}
