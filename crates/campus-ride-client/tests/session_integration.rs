//! End-to-end session tests: login, refresh, expiry and profile switching.

mod common;

use std::sync::Arc;
use std::time::Duration;

use campus_ride_client::{
    CampusRideClient, FileStorage, LoginRequest, Profile, ProfileMode, SharedStorage,
};
use common::{profile_body, TestApi};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_login_persists_tokens_and_skips_refresh() {
    let api = TestApi::start().await;
    api.mock_refresh("unused", "unused", 0).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(json!({"phone": "0901234567", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "acc-1",
            "refresh_token": "ref-1",
            "user": {"id": 42, "active_profile": "rider"}
        })))
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer acc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("42", "rider")))
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wallet"))
        .and(header("authorization", "Bearer acc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"balance": 150000}})))
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api
        .client
        .auth()
        .login(&LoginRequest::phone("0901234567", "secret"))
        .await
        .unwrap();
    assert!(session.refreshed);
    assert_eq!(session.mode, Some(ProfileMode::Rider));
    let profile = session.profile.unwrap();
    assert_eq!(profile.id, "42");
    assert_eq!(profile.full_name.as_deref(), Some("Nguyễn Văn An"));

    let tokens = api.client.tokens();
    assert_eq!(tokens.access_token().as_deref(), Some("acc-1"));
    assert_eq!(tokens.refresh_token().await.as_deref(), Some("ref-1"));
    assert_eq!(tokens.cached_profile().await.unwrap().id, "42");

    let wallet = api.client.wallet().balance().await.unwrap();
    assert_eq!(wallet.balance.to_string(), "150.000 ₫");
}

#[tokio::test]
async fn test_login_failure_leaves_store_untouched() {
    let api = TestApi::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": "Sai số điện thoại hoặc mật khẩu"})),
        )
        .mount(&api.server)
        .await;

    let err = api
        .client
        .auth()
        .login(&LoginRequest::identifier("0901234567", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), 401);
    assert!(!err.requires_login());
    assert!(!api.client.tokens().is_authenticated());
    assert!(api.client.tokens().cached_profile().await.is_none());
}

/// Signed in as user A with a cached driver profile.
async fn signed_in_as_a() -> TestApi {
    let api = TestApi::signed_in("a-access", "a-refresh").await;
    api.client
        .tokens()
        .set_cached_profile(&Profile {
            id: "user-a".to_string(),
            active_profile: Some(ProfileMode::Driver),
            ..Default::default()
        })
        .await;
    api
}

#[tokio::test]
async fn test_login_as_other_user_drops_previous_session() {
    let api = signed_in_as_a().await;
    api.mock_refresh("unused", "unused", 0).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "b-access"})))
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer b-access"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api
        .client
        .auth()
        .login(&LoginRequest::phone("0907654321", "secret-b"))
        .await
        .unwrap();
    assert!(!session.refreshed);
    assert!(session.profile.is_none());
    assert!(session.mode.is_none());

    let tokens = api.client.tokens();
    assert_eq!(tokens.access_token().as_deref(), Some("b-access"));
    assert_eq!(tokens.refresh_token().await, None);
    assert_eq!(tokens.cached_profile().await, None);

    let requests = api.server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_login_again_replaces_cached_profile() {
    let api = signed_in_as_a().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a-access-2",
            "refresh_token": "a-refresh-2"
        })))
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer a-access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("user-a", "rider")))
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api
        .client
        .auth()
        .login(&LoginRequest::phone("0901234567", "secret"))
        .await
        .unwrap();
    assert!(session.refreshed);
    assert_eq!(session.mode, Some(ProfileMode::Rider));

    let tokens = api.client.tokens();
    assert_eq!(tokens.access_token().as_deref(), Some("a-access-2"));
    assert_eq!(tokens.refresh_token().await.as_deref(), Some("a-refresh-2"));
    let cached = tokens.cached_profile().await.unwrap();
    assert_eq!(cached.id, "user-a");
    assert_eq!(cached.active_profile, Some(ProfileMode::Rider));
}

#[tokio::test]
async fn test_wrong_password_over_stale_session_is_not_expiry() {
    let api = signed_in_as_a().await;
    api.mock_refresh("unused", "unused", 0).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": "Sai số điện thoại hoặc mật khẩu"})),
        )
        .expect(1)
        .mount(&api.server)
        .await;

    let err = api
        .client
        .auth()
        .login(&LoginRequest::phone("0901234567", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), 401);
    assert!(!err.requires_login());

    let tokens = api.client.tokens();
    assert_eq!(tokens.access_token().as_deref(), Some("a-access"));
    assert_eq!(tokens.refresh_token().await.as_deref(), Some("a-refresh"));
    assert_eq!(tokens.cached_profile().await.unwrap().id, "user-a");
}

#[tokio::test]
async fn test_expired_token_is_refreshed_transparently() {
    let api = TestApi::signed_in("expired", "ref-1").await;
    api.mock_refresh("fresh", "ref-2", 1).await;

    Mock::given(method("GET"))
        .and(path("/wallet/transactions"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wallet/transactions"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [
                {"id": 1, "type": "topup", "amount": 100000, "status": "success"},
                {"id": 2, "type": "ride_payment", "amount": "25000"}
            ],
            "page": 1,
            "total": 2
        })))
        .expect(1)
        .mount(&api.server)
        .await;

    let page = api.client.wallet().transactions(1).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].kind, "topup");
    assert_eq!(page.items[1].amount.amount(), 25_000);
    assert_eq!(api.client.tokens().access_token().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_rejected_refresh_requires_login() {
    let api = TestApi::signed_in("expired", "ref-expired").await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "refresh token expired"})),
        )
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wallet"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&api.server)
        .await;

    let err = api.client.wallet().balance().await.unwrap_err();
    assert!(err.requires_login());

    let tokens = api.client.tokens();
    assert!(tokens.access_token().is_none());
    assert!(tokens.refresh_token().await.is_none());
    assert!(tokens.cached_profile().await.is_none());
}

#[tokio::test]
async fn test_switch_mode_survives_stale_profile_read() {
    let api = TestApi::signed_in("acc-1", "ref-1").await;
    api.client
        .tokens()
        .set_cached_profile(&Profile {
            id: "42".to_string(),
            active_profile: Some(ProfileMode::Rider),
            ..Default::default()
        })
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/switch-profile"))
        .and(body_partial_json(json!({"profile": "driver"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"access_token": "acc-driver", "active_profile": "driver"}
        })))
        .expect(1)
        .mount(&api.server)
        .await;
    // Replica still reports the previous mode.
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer acc-driver"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("42", "rider")))
        .expect(1)
        .mount(&api.server)
        .await;

    let outcome = api
        .client
        .profile()
        .switch_profile(ProfileMode::Driver)
        .await
        .unwrap();
    assert!(outcome.refreshed);
    assert_eq!(outcome.mode, Some(ProfileMode::Driver));

    let cached = api.client.tokens().cached_profile().await.unwrap();
    assert_eq!(cached.active_profile, Some(ProfileMode::Driver));
    assert_eq!(cached.full_name.as_deref(), Some("Nguyễn Văn An"));
    assert_eq!(
        api.client.tokens().access_token().as_deref(),
        Some("acc-driver")
    );
}

#[tokio::test]
async fn test_switch_mode_survives_failed_profile_read() {
    let api = TestApi::signed_in("acc-1", "ref-1").await;
    api.client
        .tokens()
        .set_cached_profile(&Profile {
            id: "42".to_string(),
            active_profile: Some(ProfileMode::Rider),
            ..Default::default()
        })
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/switch-profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "acc-driver",
            "activeProfile": "driver"
        })))
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&api.server)
        .await;

    let outcome = api
        .client
        .profile()
        .switch_profile(ProfileMode::Driver)
        .await
        .unwrap();
    assert!(!outcome.refreshed);
    assert_eq!(outcome.mode, Some(ProfileMode::Driver));

    let cached = api.client.tokens().cached_profile().await.unwrap();
    assert_eq!(cached.id, "42");
    assert_eq!(cached.active_profile, Some(ProfileMode::Driver));
}

#[tokio::test]
async fn test_switch_mode_waits_for_consistency_delay() {
    let server = wiremock::MockServer::start().await;
    let client = CampusRideClient::builder()
        .base_url(server.uri())
        .consistency_delay(Duration::from_millis(150))
        .build()
        .unwrap();
    client.tokens().set_access_token("acc-1").await;

    Mock::given(method("POST"))
        .and(path("/auth/switch-profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "acc-2", "active_profile": "driver"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("1", "driver")))
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    client
        .profile()
        .switch_profile(ProfileMode::Driver)
        .await
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_otp_without_tokens_skips_profile_read() {
    let api = TestApi::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/verify-otp"))
        .and(body_partial_json(json!({"phone": "0901234567", "otp": "123456"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Verified"})))
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("1", "rider")))
        .expect(0)
        .mount(&api.server)
        .await;

    let outcome = api
        .client
        .auth()
        .verify_otp("0901234567", "123456")
        .await
        .unwrap();
    assert!(!outcome.refreshed);
    assert!(outcome.profile.is_none());
    assert!(!api.client.tokens().is_authenticated());
}

#[tokio::test]
async fn test_logout_clears_even_when_server_fails() {
    let api = TestApi::signed_in("acc-1", "ref-1").await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer acc-1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&api.server)
        .await;

    api.client.auth().logout().await.unwrap();
    assert!(!api.client.tokens().is_authenticated());
    assert!(api.client.tokens().refresh_token().await.is_none());

    // A second logout is a local no-op.
    api.client.auth().logout().await.unwrap();
}

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let server = wiremock::MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "acc-1", "refresh_token": "ref-1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("7", "rider")))
        .mount(&server)
        .await;

    {
        let storage: SharedStorage = Arc::new(FileStorage::new(dir.path()));
        let client = CampusRideClient::init(storage, server.uri(), Duration::from_secs(5))
            .await
            .unwrap();
        client
            .auth()
            .login(&LoginRequest::email("an@student.edu.vn", "secret"))
            .await
            .unwrap();
    }

    let storage: SharedStorage = Arc::new(FileStorage::new(dir.path()));
    let client = CampusRideClient::init(storage, server.uri(), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(client.tokens().access_token().as_deref(), Some("acc-1"));

    // Served from cache; no extra request needed.
    let profile = client.profile().me(false).await.unwrap();
    assert_eq!(profile.id, "7");
}
