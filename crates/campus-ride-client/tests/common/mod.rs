//! Common test utilities for integration tests.

use std::time::Duration;

use campus_ride_client::{CampusRideClient, MemoryStorage};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A mock API server with a client pointed at it.
pub struct TestApi {
    /// The mock server.
    pub server: MockServer,
    /// Client configured for this server, with in-memory storage.
    pub client: CampusRideClient,
}

impl TestApi {
    /// Start a mock server and an unauthenticated client.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let client = CampusRideClient::builder()
            .base_url(server.uri())
            .timeout(Duration::from_secs(5))
            .consistency_delay(Duration::ZERO)
            .storage(MemoryStorage::new())
            .build()
            .unwrap();
        Self { server, client }
    }

    /// Start with an access and refresh token already stored.
    pub async fn signed_in(access: &str, refresh: &str) -> Self {
        let api = Self::start().await;
        api.client.tokens().set_access_token(access).await;
        api.client.tokens().set_refresh_token(Some(refresh)).await;
        api
    }

    /// Mount a refresh endpoint answering with new tokens, expected `times` times.
    pub async fn mock_refresh(&self, access: &str, refresh: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access,
                "refresh_token": refresh,
            })))
            .expect(times)
            .mount(&self.server)
            .await;
    }
}

/// A profile body as the server returns it from `/auth/me`.
pub fn profile_body(id: &str, mode: &str) -> Value {
    json!({
        "data": {
            "id": id,
            "full_name": "Nguyễn Văn An",
            "phone": "0901234567",
            "active_profile": mode,
            "is_verified": true
        }
    })
}
