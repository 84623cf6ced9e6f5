use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{RangeSpec, provider::ProviderId};

const DEFAULT_CACHE_TTL_HOURS: u64 = 24;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Configuration for a single provider (API key, optional endpoint override).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Where the current position comes from when no city is given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum GeolocationConfig {
    /// Look the position up from the public IP address.
    #[default]
    Ip,
    /// Always use these coordinates.
    Fixed { latitude: f64, longitude: f64 },
    /// Location access refused.
    Off,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// City used by `show`/`browse` when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_days: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_hours: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub geolocation: GeolocationConfig,

    /// Example TOML:
    /// [providers.geoapify]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "tempchart", "tempchart")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the persisted series cache.
    pub fn cache_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.cache_dir().join("series_cache.json"))
    }

    /// Set or replace a provider API key, keeping any endpoint override.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .entry(provider_id.as_str().to_string())
            .and_modify(|cfg| cfg.api_key = api_key.clone())
            .or_insert(ProviderConfig { api_key, base_url: None });
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some_and(|key| !key.trim().is_empty())
    }

    /// API key for a provider, or an error telling the user how to add one.
    pub fn require_api_key(&self, id: ProviderId) -> Result<&str> {
        self.provider_api_key(id).filter(|key| !key.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured for provider '{id}'.\n\
                 Hint: run `tempchart configure {id}` and enter your API key."
            )
        })
    }

    pub fn provider_base_url(&self, id: ProviderId) -> Option<&str> {
        self.provider_config(id).and_then(|cfg| cfg.base_url.as_deref())
    }

    /// Range used when neither `--days` nor explicit dates are given.
    pub fn default_range(&self) -> RangeSpec {
        self.default_days.map(RangeSpec::LastDays).unwrap_or_default()
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        let hours = self.cache_ttl_hours.unwrap_or(DEFAULT_CACHE_TTL_HOURS);
        i64::try_from(hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }
}
