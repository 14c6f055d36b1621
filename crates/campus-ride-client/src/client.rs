//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::api::{AuthApi, BanksApi, ProfileApi, VerificationApi, WalletApi};
use crate::error::{Error, Result, DEFAULT_TRANSPORT_MESSAGE};
use crate::refresh::RefreshCoordinator;
use crate::request::{ApiRequest, RequestBody, Upload};
use crate::response::{http_error, read_payload, Payload};
use crate::session::SessionManager;
use crate::storage::{MemoryStorage, SharedStorage};
use crate::token_store::TokenStore;

/// Default timeout for each individual send.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default delay between a session mutation and the profile re-fetch.
const DEFAULT_CONSISTENCY_DELAY: Duration = Duration::from_millis(500);

fn application_json() -> HeaderValue {
    HeaderValue::from_static("application/json")
}

/// Campus Ride API client.
///
/// Attaches the stored bearer token to every request. A 401 answered to a
/// request that carried a token triggers exactly one refresh and one retry;
/// if the refresh fails the session is cleared and
/// [`Error::SessionExpired`] is returned.
///
/// # Example
///
/// ```no_run
/// use campus_ride_client::{CampusRideClient, FileStorage};
///
/// # async fn example() -> campus_ride_client::Result<()> {
/// let client = CampusRideClient::builder()
///     .base_url("https://api.campusride.vn")
///     .storage(FileStorage::new("/var/lib/campus-ride"))
///     .build()?;
/// client.tokens().load().await;
///
/// let wallet = client.wallet().balance().await?;
/// println!("Balance: {}", wallet.balance);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CampusRideClient {
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    /// HTTP client.
    pub(crate) http: reqwest::Client,
    /// Base URL for API requests.
    pub(crate) base_url: Url,
    /// Per-send timeout.
    pub(crate) timeout: Duration,
    /// Credentials.
    pub(crate) tokens: Arc<TokenStore>,
    /// Single-flight refresh.
    refresher: Arc<RefreshCoordinator>,
    /// Delay used by session reconciliation.
    pub(crate) consistency_delay: Duration,
    /// Message carried by transport errors.
    transport_message: String,
}

impl std::fmt::Debug for CampusRideClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CampusRideClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .field("authenticated", &self.inner.tokens.is_authenticated())
            .finish()
    }
}

impl CampusRideClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Build a client and load persisted credentials.
    pub async fn init(
        storage: SharedStorage,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Self::builder()
            .base_url(base_url)
            .timeout(timeout)
            .shared_storage(storage)
            .build()?;
        client.tokens().load().await;
        Ok(client)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Credential store.
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    pub(crate) fn inner(&self) -> &ClientInner {
        &self.inner
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the authentication API.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access the profile API.
    pub fn profile(&self) -> ProfileApi {
        ProfileApi::new(self.clone())
    }

    /// Access the wallet API.
    pub fn wallet(&self) -> WalletApi {
        WalletApi::new(self.clone())
    }

    /// Access the verification API.
    pub fn verification(&self) -> VerificationApi {
        VerificationApi::new(self.clone())
    }

    /// Access the bank directory.
    pub fn banks(&self) -> BanksApi {
        BanksApi::new(self.clone())
    }

    /// Session reconciliation for login and profile switches.
    pub fn session(&self) -> SessionManager {
        SessionManager::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request pipeline
    // ─────────────────────────────────────────────────────────────────────────

    /// Perform one logical request with automatic token refresh.
    pub async fn request(&self, request: &ApiRequest) -> Result<Payload> {
        let token = if request.anonymous {
            None
        } else {
            self.inner.tokens.access_token()
        };
        let response = self.send(request, token.as_deref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED
            && let Some(stale) = token
        {
            tracing::debug!(endpoint = %request.endpoint, "Received 401, attempting refresh");
            let fresh = self
                .inner
                .refresher
                .refresh(Some(&stale))
                .await
                .map_err(|reason| Error::SessionExpired { reason })?;

            // A second 401 is surfaced as-is.
            let retried = self.send(request, Some(&fresh)).await?;
            return self.handle_response(retried).await;
        }

        self.handle_response(response).await
    }

    /// Perform a request and deserialize the body.
    pub async fn request_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        self.request(request).await?.decode()
    }

    /// Force a token refresh (joining one already in flight).
    pub async fn refresh_session(&self) -> Result<String> {
        self.inner
            .refresher
            .refresh(None)
            .await
            .map_err(|reason| Error::SessionExpired { reason })
    }

    /// Make a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_json(&ApiRequest::get(path)).await
    }

    /// Make a POST request.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_json(&ApiRequest::post(path).json(body)?).await
    }

    /// Make a PUT request.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_json(&ApiRequest::put(path).json(body)?).await
    }

    /// Make a PATCH request.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_json(&ApiRequest::patch(path).json(body)?).await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request(&ApiRequest::delete(path)).await?;
        Ok(())
    }

    /// POST a multipart upload.
    pub async fn upload(&self, path: &str, upload: Upload) -> Result<Payload> {
        self.request(&ApiRequest::post(path).upload(upload)).await
    }

    /// Build a URL for an API path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.inner.base_url.join(path).map_err(Error::from)
    }

    /// Send the request once with the given token.
    async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<reqwest::Response> {
        let url = self.url(&request.endpoint)?;
        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), url)
            .headers(request.headers.clone())
            .header(ACCEPT, application_json())
            .timeout(self.inner.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| Error::Config("Invalid access token".to_string()))?;
            builder = builder.header(AUTHORIZATION, value);
        }

        builder = match &request.body {
            Some(RequestBody::Json(value)) => builder
                .header(CONTENT_TYPE, application_json())
                .body(serde_json::to_vec(value).map_err(Error::Encode)?),
            Some(RequestBody::Multipart(upload)) => builder.multipart(upload.to_form()?),
            Some(RequestBody::Binary(bytes)) => builder.body(bytes.clone()),
            None => builder,
        };

        tracing::debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            authenticated = token.is_some(),
            "Sending request"
        );

        builder.send().await.map_err(|source| self.transport_error(source))
    }

    /// Turn a response into a payload or a structured error.
    async fn handle_response(&self, response: reqwest::Response) -> Result<Payload> {
        let status = response.status();
        let payload = read_payload(response, &self.inner.transport_message).await?;
        if status.is_success() {
            Ok(payload)
        } else {
            tracing::debug!(status = status.as_u16(), "Request failed");
            Err(http_error(status.as_u16(), payload))
        }
    }

    fn transport_error(&self, source: reqwest::Error) -> Error {
        tracing::warn!(error = %source, "Transport failure");
        Error::Transport {
            message: self.inner.transport_message.clone(),
            source,
        }
    }
}

/// Builder for creating a [`CampusRideClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    consistency_delay: Duration,
    user_agent: Option<String>,
    storage: Option<SharedStorage>,
    transport_message: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            consistency_delay: DEFAULT_CONSISTENCY_DELAY,
            user_agent: None,
            storage: None,
            transport_message: None,
        }
    }

    /// Set the base URL for the API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the per-send timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the delay before the post-mutation profile re-fetch.
    pub fn consistency_delay(mut self, delay: Duration) -> Self {
        self.consistency_delay = delay;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the credential storage backend. Defaults to memory.
    pub fn storage<S: crate::storage::StorageBackend + 'static>(self, storage: S) -> Self {
        self.shared_storage(Arc::new(storage))
    }

    /// Set an already shared storage backend.
    pub fn shared_storage(mut self, storage: SharedStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Override the message carried by transport errors.
    pub fn transport_error_message(mut self, message: impl Into<String>) -> Self {
        self.transport_message = Some(message.into());
        self
    }

    /// Build the client. Persisted tokens are not loaded until
    /// [`TokenStore::load`] is called.
    pub fn build(self) -> Result<CampusRideClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        // Parse and normalize base URL
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("campus-ride-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let tokens = Arc::new(TokenStore::new(storage));
        let refresher = Arc::new(RefreshCoordinator::new(
            http.clone(),
            &base_url,
            self.timeout,
            tokens.clone(),
        )?);

        Ok(CampusRideClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: self.timeout,
                tokens,
                refresher,
                consistency_delay: self.consistency_delay,
                transport_message: self
                    .transport_message
                    .unwrap_or_else(|| DEFAULT_TRANSPORT_MESSAGE.to_string()),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageBackend;

    #[test]
    fn test_builder_requires_base_url() {
        let result = ClientBuilder::new().build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_with_base_url() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:3000")
            .build()
            .unwrap();

        assert_eq!(client.base_url().as_str(), "http://localhost:3000/");
        assert!(!client.tokens().is_authenticated());
    }

    #[test]
    fn test_builder_keeps_path_prefix() {
        let client = ClientBuilder::new()
            .base_url("https://api.example.test/api/v1")
            .build()
            .unwrap();

        assert_eq!(client.base_url().as_str(), "https://api.example.test/api/v1/");
        let url = client.url("/auth/me").unwrap();
        assert_eq!(url.as_str(), "https://api.example.test/api/v1/auth/me");
    }

    #[test]
    fn test_url_building() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:3000")
            .build()
            .unwrap();

        let url = client.url("wallet").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/wallet");

        let url = client.url("/wallet").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/wallet");
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let result = ClientBuilder::new().base_url("not a url").build();
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_init_loads_tokens() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        storage
            .set(crate::token_store::ACCESS_TOKEN_KEY, "persisted")
            .await
            .unwrap();

        let client = CampusRideClient::init(storage, "http://localhost:3000", DEFAULT_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(client.tokens().access_token().as_deref(), Some("persisted"));
    }
}
