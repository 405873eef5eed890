//! Harvest configuration schema and loading.
//!
//! Settings come from an optional TOML file, then environment overrides.
//! Credentials are never read from here; the CLI takes them from flags or
//! the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::BackoffPolicy;
use crate::error::{HarvestError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://chatgpt.com/backend-api";
pub const DEFAULT_SESSION_URL: &str = "https://chatgpt.com/api/auth/session";

/// Runtime settings for a harvest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Base of the listing and per-conversation endpoints.
    pub api_base_url: String,

    /// Endpoint that trades a session cookie for an access token.
    pub session_url: String,

    /// Items per listing page. The backend pages in twenties.
    pub page_size: u64,

    /// Idle time between pagination calls.
    pub page_delay_ms: u64,

    /// Idle time before each conversation fetch.
    pub throttle_ms: u64,

    /// Total attempts per conversation fetch.
    pub max_attempts: u32,

    pub initial_backoff_ms: u64,
    pub backoff_multiplier: u32,

    pub request_timeout_secs: u64,

    /// Directory the archive is written to.
    pub output_dir: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session_url: DEFAULT_SESSION_URL.to_string(),
            page_size: crate::offsets::PAGE_SIZE,
            page_delay_ms: 1000,
            throttle_ms: 1000,
            max_attempts: 3,
            initial_backoff_ms: 10_000,
            backoff_multiplier: 2,
            request_timeout_secs: 30,
            output_dir: PathBuf::from("."),
        }
    }
}

impl HarvestConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            HarvestError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml(&contents)
            .map_err(|e| HarvestError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Apply `GPT_BACKUP_*` environment overrides.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("GPT_BACKUP_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(url) = lookup("GPT_BACKUP_SESSION_URL") {
            self.session_url = url;
        }
        if let Some(raw) = lookup("GPT_BACKUP_THROTTLE_MS") {
            self.throttle_ms = parse_env("GPT_BACKUP_THROTTLE_MS", &raw)?;
        }
        if let Some(raw) = lookup("GPT_BACKUP_MAX_ATTEMPTS") {
            self.max_attempts = parse_env("GPT_BACKUP_MAX_ATTEMPTS", &raw)?;
        }
        if let Some(dir) = lookup("GPT_BACKUP_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            multiplier: self.backoff_multiplier,
        }
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| HarvestError::Config(format!("{} has an invalid value: {:?}", key, raw)))
}
