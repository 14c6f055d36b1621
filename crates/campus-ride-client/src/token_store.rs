//! Credential and cached-profile persistence.
//!
//! The access token lives in memory (loaded once at startup) and in durable
//! storage; the refresh token and the cached profile are read from storage
//! on demand. None of the operations here fail: storage problems are logged
//! and degrade to "logged out" or "no cache".

use std::sync::Arc;

use parking_lot::RwLock;

use crate::storage::{MemoryStorage, SharedStorage};
use crate::types::Profile;

/// Storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Storage key for the cached profile blob.
pub const PROFILE_KEY: &str = "user_profile";

/// Process-wide credential store.
#[derive(Debug)]
pub struct TokenStore {
    backend: SharedStorage,
    access_token: RwLock<Option<String>>,
}

impl TokenStore {
    /// Create a store over the given backend. Call [`load`](Self::load) before use.
    pub fn new(backend: SharedStorage) -> Self {
        Self {
            backend,
            access_token: RwLock::new(None),
        }
    }

    /// Create a store backed by memory only.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Populate the in-memory access token from durable storage.
    ///
    /// An absent or unreadable token leaves the store logged out.
    pub async fn load(&self) {
        let token = match self.backend.get(ACCESS_TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored access token");
                None
            }
        };
        tracing::debug!(logged_in = token.is_some(), "Token store loaded");
        *self.access_token.write() = token;
    }

    /// Current in-memory access token.
    pub fn access_token(&self) -> Option<String> {
        self.access_token.read().clone()
    }

    /// Whether an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.read().is_some()
    }

    /// Replace the access token in memory and in durable storage.
    pub async fn set_access_token(&self, token: &str) {
        *self.access_token.write() = Some(token.to_string());
        if let Err(e) = self.backend.set(ACCESS_TOKEN_KEY, token).await {
            tracing::warn!(error = %e, "Failed to persist access token");
        }
    }

    /// Persist a refresh token. Empty or absent tokens are ignored.
    pub async fn set_refresh_token(&self, token: Option<&str>) {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return;
        };
        if let Err(e) = self.backend.set(REFRESH_TOKEN_KEY, token).await {
            tracing::warn!(error = %e, "Failed to persist refresh token");
        }
    }

    /// Stored refresh token; read failures degrade to `None`.
    pub async fn refresh_token(&self) -> Option<String> {
        match self.backend.get(REFRESH_TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read refresh token");
                None
            }
        }
    }

    /// Cached profile; read failures and corrupt blobs degrade to `None`.
    pub async fn cached_profile(&self) -> Option<Profile> {
        let raw = match self.backend.get(PROFILE_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cached profile");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding corrupt cached profile");
                None
            }
        }
    }

    /// Replace the cached profile.
    pub async fn set_cached_profile(&self, profile: &Profile) {
        let raw = match serde_json::to_string(profile) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize profile");
                return;
            }
        };
        if let Err(e) = self.backend.set(PROFILE_KEY, &raw).await {
            tracing::warn!(error = %e, "Failed to persist cached profile");
        }
    }

    /// Remove access token, refresh token and cached profile. Idempotent.
    pub async fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, PROFILE_KEY] {
            if let Err(e) = self.backend.remove(key).await {
                tracing::warn!(key, error = %e, "Failed to remove stored credential");
            }
        }
        *self.access_token.write() = None;
        tracing::info!("Session credentials cleared");
    }
}
