//! Session reconciliation after login, OTP verification and profile switches.
//!
//! The mutating call is the source of truth for the new token and the
//! active mode. After a short delay the canonical profile is re-fetched and
//! merged with what the mutation reported, then cached.
//!
//! A failed re-fetch does not fail the operation: the token is already
//! persisted, and the cached profile is patched with the mutation's mode and
//! may otherwise stay stale until the next successful profile fetch.
//!
//! Login and OTP grants that carry an access token start a new session:
//! every credential and the cached profile of the previous session are
//! dropped first, so nothing of an earlier account survives a failed
//! re-fetch. Only a profile switch falls back to the prior cache.

use crate::client::CampusRideClient;
use crate::error::Result;
use crate::request::ApiRequest;
use crate::types::{
    LoginRequest, Profile, ProfileMode, SessionGrant, SwitchProfileRequest, VerifyOtpRequest,
};

const LOGIN_ENDPOINT: &str = "auth/login";
const VERIFY_OTP_ENDPOINT: &str = "auth/verify-otp";
const SWITCH_PROFILE_ENDPOINT: &str = "auth/switch-profile";

/// Outcome of a reconciled session mutation.
#[derive(Debug, Clone)]
pub struct ReconciledSession {
    /// Profile now cached, if any is known.
    pub profile: Option<Profile>,
    /// Active mode after reconciliation.
    pub mode: Option<ProfileMode>,
    /// Whether the profile came from a successful re-fetch.
    pub refreshed: bool,
}

/// How a mutation relates to the stored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    /// Credential exchange (login, OTP); a granted token replaces the session.
    Grant,
    /// Change within the current session (profile switch).
    Update,
}

/// Runs session mutations and reconciles the cached profile.
pub struct SessionManager {
    client: CampusRideClient,
}

impl SessionManager {
    pub(crate) fn new(client: CampusRideClient) -> Self {
        Self { client }
    }

    /// Log in.
    pub async fn login(&self, request: &LoginRequest) -> Result<ReconciledSession> {
        let request = ApiRequest::post(LOGIN_ENDPOINT).json(request)?.anonymous();
        self.establish(request, Mutation::Grant).await
    }

    /// Confirm an OTP.
    pub async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<ReconciledSession> {
        let request = ApiRequest::post(VERIFY_OTP_ENDPOINT).json(request)?.anonymous();
        self.establish(request, Mutation::Grant).await
    }

    /// Switch the active mode.
    pub async fn switch_profile(&self, mode: ProfileMode) -> Result<ReconciledSession> {
        let request =
            ApiRequest::post(SWITCH_PROFILE_ENDPOINT).json(&SwitchProfileRequest { profile: mode })?;
        let outcome = self.establish(request, Mutation::Update).await?;
        if outcome.mode != Some(mode) {
            tracing::warn!(
                requested = %mode,
                reconciled = ?outcome.mode,
                "Active mode after switch differs from the requested mode"
            );
        }
        Ok(outcome)
    }

    /// Run a session mutation and reconcile.
    async fn establish(&self, request: ApiRequest, kind: Mutation) -> Result<ReconciledSession> {
        let tokens = self.client.tokens();

        // Mutation errors surface untouched.
        let body = self.client.request(&request).await?;
        let grant = SessionGrant::from_value(&body.into_json());

        let new_session = kind == Mutation::Grant && grant.access_token.is_some();
        if new_session {
            tokens.clear().await;
        }

        // The follow-up read must carry the new token.
        if let Some(token) = grant.access_token.as_deref() {
            tokens.set_access_token(token).await;
        }
        tokens.set_refresh_token(grant.refresh_token.as_deref()).await;

        let previous = match kind {
            Mutation::Update => tokens.cached_profile().await,
            Mutation::Grant => None,
        };

        let fetched = if tokens.is_authenticated() {
            let delay = self.client.inner().consistency_delay;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match self.client.profile().fetch().await {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!(
                        endpoint = %request.endpoint,
                        error = %e,
                        "Profile re-fetch failed; cached profile may be stale"
                    );
                    None
                }
            }
        } else {
            tracing::debug!(
                endpoint = %request.endpoint,
                "No session after mutation, skipping re-fetch"
            );
            None
        };

        let outcome = reconcile(&grant, fetched, previous);
        if let Some(profile) = &outcome.profile {
            tokens.set_cached_profile(profile).await;
        }
        Ok(outcome)
    }
}

/// Merge the mutation's view, the re-fetched profile and the prior cache.
///
/// Mode precedence: mutation, then re-fetch, then prior cache. The profile
/// body comes from the re-fetch, else the mutation's embedded user, else the
/// prior cache.
fn reconcile(
    grant: &SessionGrant,
    fetched: Option<Profile>,
    previous: Option<Profile>,
) -> ReconciledSession {
    let refreshed = fetched.is_some();
    let fetched_mode = fetched.as_ref().and_then(|p| p.active_profile);
    let previous_mode = previous.as_ref().and_then(|p| p.active_profile);

    let mode = match (grant.mode(), fetched_mode) {
        (Some(mode), _) => Some(mode),
        (None, Some(mode)) => Some(mode),
        (None, None) => {
            tracing::warn!(
                previous = ?previous_mode,
                "Neither the mutation nor the profile reported an active mode; keeping cached value"
            );
            previous_mode
        }
    };

    let mut profile = fetched.or_else(|| grant.user.clone()).or(previous);
    if let Some(profile) = profile.as_mut()
        && mode.is_some()
    {
        profile.active_profile = mode;
    }

    ReconciledSession {
        profile,
        mode,
        refreshed,
    }
}
