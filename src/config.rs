// src/config.rs

use crate::cooldown::CooldownPolicy;
use crate::downloader::DEFAULT_CHUNK_SIZE;
use crate::reconciler::ErrorPolicy;
use crate::remote::DEFAULT_USER_AGENT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/MiguVT/ModpackDownloaderQuestCraft/main/mods.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Format(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Settings for a synchronization run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    pub manifest_url: String,
    /// Target directory; detecting it is the caller's job.
    pub mods_dir: PathBuf,
    pub chunk_size: usize,
    /// Pause after a failed download. 0 disables it.
    pub cooldown_ms: u64,
    /// Connect and idle-read limit; also caps the manifest fetch and size checks.
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub stop_on_error: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            mods_dir: PathBuf::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            cooldown_ms: 1000,
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            stop_on_error: false,
        }
    }
}

impl SyncConfig {
    pub fn new(mods_dir: impl Into<PathBuf>) -> Self {
        Self { mods_dir: mods_dir.into(), ..Default::default() }
    }

    /// Reads a JSON config file; missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: SyncConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.manifest_url.trim().is_empty() {
            return Err(ConfigError::Invalid("manifest_url is empty".into()));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be positive".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn cooldown(&self) -> CooldownPolicy {
        CooldownPolicy::from_millis(self.cooldown_ms)
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        if self.stop_on_error {
            ErrorPolicy::StopOnError
        } else {
            ErrorPolicy::ContinueOnError
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
