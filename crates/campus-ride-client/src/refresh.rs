//! Single-flight access token refresh.
//!
//! Every caller that sees a 401 asks the coordinator for a fresh token.
//! While a refresh is running, later callers await the same shared future
//! instead of starting their own. A caller arriving after a refresh has
//! already finished gets the newer token straight from the store.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use reqwest::header::{HeaderValue, ACCEPT};
use url::Url;

use crate::error::RefreshFailure;
use crate::response::read_payload;
use crate::token_store::TokenStore;
use crate::types::SessionGrant;

/// Refresh endpoint, relative to the API base URL.
pub const REFRESH_ENDPOINT: &str = "auth/refresh";

type RefreshOutcome = std::result::Result<String, RefreshFailure>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Coordinates refreshes so concurrent 401s share one refresh call.
#[derive(Debug)]
pub(crate) struct RefreshCoordinator {
    http: reqwest::Client,
    url: Url,
    timeout: Duration,
    tokens: Arc<TokenStore>,
    in_flight: Mutex<InFlight>,
}

#[derive(Default)]
struct InFlight {
    next_id: u64,
    current: Option<(u64, SharedRefresh)>,
}

impl std::fmt::Debug for InFlight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlight")
            .field("next_id", &self.next_id)
            .field("running", &self.current.is_some())
            .finish()
    }
}

impl RefreshCoordinator {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: &Url,
        timeout: Duration,
        tokens: Arc<TokenStore>,
    ) -> std::result::Result<Self, url::ParseError> {
        Ok(Self {
            http,
            url: base_url.join(REFRESH_ENDPOINT)?,
            timeout,
            tokens,
            in_flight: Mutex::new(InFlight::default()),
        })
    }

    /// Obtain a token newer than `stale`.
    ///
    /// With `stale = None` a refresh is always performed (or joined).
    pub(crate) async fn refresh(self: &Arc<Self>, stale: Option<&str>) -> RefreshOutcome {
        let (id, shared) = {
            let mut in_flight = self.in_flight.lock();
            match &in_flight.current {
                Some((id, shared)) => {
                    tracing::debug!("Joining in-flight token refresh");
                    (*id, shared.clone())
                }
                None => {
                    if let Some(stale) = stale {
                        match self.tokens.access_token() {
                            Some(current) if current != stale => {
                                tracing::debug!("Token already refreshed by another request");
                                return Ok(current);
                            }
                            None => return Err(RefreshFailure::Cleared),
                            Some(_) => {}
                        }
                    }

                    let id = in_flight.next_id;
                    in_flight.next_id += 1;
                    let shared = Arc::clone(self).run().boxed().shared();
                    in_flight.current = Some((id, shared.clone()));
                    (id, shared)
                }
            }
        };

        let outcome = shared.await;

        let mut in_flight = self.in_flight.lock();
        if in_flight
            .current
            .as_ref()
            .is_some_and(|(current, _)| *current == id)
        {
            in_flight.current = None;
        }
        outcome
    }

    /// Perform one refresh; on failure the session is cleared.
    async fn run(self: Arc<Self>) -> RefreshOutcome {
        tracing::info!("Access token rejected, refreshing");
        match self.exchange().await {
            Ok(token) => {
                tracing::info!("Access token refreshed");
                Ok(token)
            }
            Err(reason) => {
                tracing::warn!(%reason, "Token refresh failed, clearing session");
                self.tokens.clear().await;
                Err(reason)
            }
        }
    }

    async fn exchange(&self) -> RefreshOutcome {
        let refresh_token = self
            .tokens
            .refresh_token()
            .await
            .ok_or(RefreshFailure::MissingRefreshToken)?;

        let response = self
            .http
            .post(self.url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RefreshFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshFailure::Rejected {
                status: status.as_u16(),
            });
        }

        let body = read_payload(response, "refresh response could not be read")
            .await
            .map_err(|e| match e {
                crate::Error::Transport { message, .. } => RefreshFailure::Transport(message),
                _ => RefreshFailure::MissingAccessToken,
            })?;

        let grant = SessionGrant::from_value(&body.into_json());
        let access_token = grant
            .access_token
            .ok_or(RefreshFailure::MissingAccessToken)?;

        self.tokens.set_access_token(&access_token).await;
        self.tokens
            .set_refresh_token(grant.refresh_token.as_deref())
            .await;
        Ok(access_token)
    }
}
