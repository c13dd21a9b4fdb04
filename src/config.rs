use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::applicant::RawApplicant;

/// Which backend drives the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Raw HTTP session replaying form posts.
    Http,
    /// Real browser driven over WebDriver.
    Browser,
}

/// Process-level settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the booking service.
    pub base_url: String,
    /// Minutes to sleep after an attempt-level failure.
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u64,
    /// Distance Matrix API key.
    pub maps_api_key: String,
    /// Path of the persisted distance cache.
    #[serde(default = "default_distance_cache")]
    pub distance_cache: PathBuf,
    /// Transport backend.
    #[serde(default = "default_backend")]
    pub backend: Backend,
    /// WebDriver endpoint, used by the browser backend.
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
}

fn default_cooldown_minutes() -> u64 {
    15
}

fn default_distance_cache() -> PathBuf {
    PathBuf::from("office_distances.json")
}

fn default_backend() -> Backend {
    Backend::Http
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

/// Full configuration file: `[app]` plus the raw `[applicant]` fields,
/// which are validated separately by the domain validator.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub applicant: RawApplicant,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}
