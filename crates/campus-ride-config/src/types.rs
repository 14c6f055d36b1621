//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [api]
//! base_url = "https://api.campusride.vn"
//! timeout_secs = 30
//!
//! [storage]
//! data_dir = "~/.local/share/campus-ride"
//!
//! [session]
//! consistency_delay_ms = 500
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Default per-send timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default delay between a session mutation and the profile re-fetch.
pub const DEFAULT_CONSISTENCY_DELAY_MS: u64 = 500;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g. project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CampusRideConfig {
    /// Remote API settings.
    pub api: Option<ApiConfig>,

    /// Local credential storage settings.
    pub storage: Option<StorageConfig>,

    /// Session reconciliation settings.
    pub session: Option<SessionConfig>,
}

impl CampusRideConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Merging is field-wise within each section so that a project-local
    /// file can override a single key without restating the whole section.
    pub fn merge(&mut self, other: CampusRideConfig) {
        if let Some(api) = other.api {
            let base = self.api.get_or_insert_with(ApiConfig::default);
            if api.base_url.is_some() {
                base.base_url = api.base_url;
            }
            if api.timeout_secs.is_some() {
                base.timeout_secs = api.timeout_secs;
            }
            if api.user_agent.is_some() {
                base.user_agent = api.user_agent;
            }
        }

        if let Some(storage) = other.storage
            && storage.data_dir.is_some()
        {
            self.storage = Some(storage);
        }

        if let Some(session) = other.session
            && session.consistency_delay_ms.is_some()
        {
            self.session = Some(session);
        }
    }

    /// Effective API base URL.
    pub fn base_url(&self) -> &str {
        self.api
            .as_ref()
            .and_then(|a| a.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    /// Effective per-send timeout.
    pub fn timeout(&self) -> Duration {
        let secs = self
            .api
            .as_ref()
            .and_then(|a| a.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Custom user agent, if configured.
    pub fn user_agent(&self) -> Option<&str> {
        self.api.as_ref().and_then(|a| a.user_agent.as_deref())
    }

    /// Effective data directory for persisted credentials.
    ///
    /// Falls back to the platform data dir (`~/.local/share/campus-ride` on
    /// Linux), then `./.campus-ride`.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = self.storage.as_ref().and_then(|s| s.data_dir.clone()) {
            return expand_home(dir);
        }
        dirs::data_dir()
            .map(|d| d.join(crate::discovery::APP_NAME))
            .unwrap_or_else(|| PathBuf::from(".campus-ride"))
    }

    /// Effective consistency delay for session reconciliation.
    pub fn consistency_delay(&self) -> Duration {
        let ms = self
            .session
            .as_ref()
            .and_then(|s| s.consistency_delay_ms)
            .unwrap_or(DEFAULT_CONSISTENCY_DELAY_MS);
        Duration::from_millis(ms)
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: PathBuf) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or(path),
        Err(_) => path,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// `[api]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Timeout applied to each individual send.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Custom user agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the persisted tokens and profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// `[session]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay before re-fetching the profile after login or a profile switch.
    /// `0` disables the delay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistency_delay_ms: Option<u64>,
}
