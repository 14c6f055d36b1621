//! Profile API.

use serde_json::Value;

use crate::client::CampusRideClient;
use crate::error::{Error, Result};
use crate::request::{ApiRequest, FilePart, Upload};
use crate::session::ReconciledSession;
use crate::types::{Profile, ProfileMode};

/// Endpoint returning the canonical profile.
pub(crate) const ME_ENDPOINT: &str = "auth/me";

/// Profile API client.
pub struct ProfileApi {
    client: CampusRideClient,
}

impl ProfileApi {
    pub(crate) fn new(client: CampusRideClient) -> Self {
        Self { client }
    }

    /// Current profile.
    ///
    /// Serves the cached profile unless `force_refresh` is set or nothing is
    /// cached; a fetched profile replaces the cache.
    pub async fn me(&self, force_refresh: bool) -> Result<Profile> {
        if !force_refresh && let Some(profile) = self.client.tokens().cached_profile().await {
            return Ok(profile);
        }

        let profile = self.fetch().await?;
        self.client.tokens().set_cached_profile(&profile).await;
        Ok(profile)
    }

    /// Fetch the profile from the server without touching the cache.
    pub async fn fetch(&self) -> Result<Profile> {
        let body = self.client.request(&ApiRequest::get(ME_ENDPOINT)).await?;
        profile_from_value(body.into_json())
    }

    /// Switch between rider and driver mode.
    pub async fn switch_profile(&self, mode: ProfileMode) -> Result<ReconciledSession> {
        self.client.session().switch_profile(mode).await
    }

    /// Upload a new avatar; returns the updated profile and refreshes the cache.
    pub async fn upload_avatar(&self, file: FilePart) -> Result<Profile> {
        let request = ApiRequest::post("users/avatar").upload(Upload::new("avatar", file));
        self.client.request(&request).await?;
        self.me(true).await
    }
}

/// Decode a profile from `{...}`, `{ "user": {...} }` or `{ "data": {...} }`
/// and combinations thereof.
pub(crate) fn profile_from_value(value: Value) -> Result<Profile> {
    let mut value = value;
    for key in ["data", "user"] {
        if let Some(inner) = value.get_mut(key).filter(|v| v.is_object()) {
            value = inner.take();
        }
    }
    serde_json::from_value(value).map_err(Error::Decode)
}
