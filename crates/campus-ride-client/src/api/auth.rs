//! Authentication API.

use crate::client::CampusRideClient;
use crate::error::Result;
use crate::request::ApiRequest;
use crate::session::ReconciledSession;
use crate::types::{LoginRequest, RegisterRequest, RegisterResponse, VerifyOtpRequest};

/// Authentication API client.
pub struct AuthApi {
    client: CampusRideClient,
}

impl AuthApi {
    pub(crate) fn new(client: CampusRideClient) -> Self {
        Self { client }
    }

    /// Log in and reconcile the cached profile.
    pub async fn login(&self, request: &LoginRequest) -> Result<ReconciledSession> {
        self.client.session().login(request).await
    }

    /// Create an account. The server sends an OTP to the phone number.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse> {
        self.client
            .request(&ApiRequest::post("auth/register").json(request)?.anonymous())
            .await?
            .decode_data()
    }

    /// Confirm an OTP. When the server answers with tokens the session is
    /// established as after a login.
    pub async fn verify_otp(&self, phone: &str, otp: &str) -> Result<ReconciledSession> {
        self.client
            .session()
            .verify_otp(&VerifyOtpRequest {
                phone: phone.to_string(),
                otp: otp.to_string(),
            })
            .await
    }

    /// Ask the server to send a new OTP.
    pub async fn resend_otp(&self, phone: &str) -> Result<()> {
        let request =
            ApiRequest::post("auth/resend-otp")
                .json(&serde_json::json!({ "phone": phone }))?
                .anonymous();
        self.client.request(&request).await?;
        Ok(())
    }

    /// Log out: notify the server when a session exists, then clear local
    /// credentials regardless of the server's answer.
    pub async fn logout(&self) -> Result<()> {
        if self.client.tokens().is_authenticated()
            && let Err(e) = self.client.request(&ApiRequest::post("auth/logout")).await
        {
            tracing::warn!(error = %e, "Server logout failed, clearing local session anyway");
        }
        self.client.tokens().clear().await;
        Ok(())
    }
}
