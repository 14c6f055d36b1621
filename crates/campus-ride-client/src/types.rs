//! Request and response types for the Campus Ride API.
//!
//! These types mirror the server's API contract. Response types are lenient:
//! optional fields default, and unknown profile fields are kept so the cached
//! profile round-trips everything the server sent.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::money::Vnd;

// ─────────────────────────────────────────────────────────────────────────────
// Profile
// ─────────────────────────────────────────────────────────────────────────────

/// Which side of the marketplace the session is acting as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileMode {
    Rider,
    Driver,
}

impl ProfileMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ProfileMode::Rider => "rider",
            ProfileMode::Driver => "driver",
        }
    }
}

impl fmt::Display for ProfileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rider" | "passenger" => Ok(ProfileMode::Rider),
            "driver" => Ok(ProfileMode::Driver),
            other => Err(format!("unknown profile mode '{}'", other)),
        }
    }
}

/// The current user's profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// User ID.
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Account role (user, admin, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Active mode.
    #[serde(
        default,
        alias = "active_mode",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_profile: Option<ProfileMode>,
    /// Account verified (phone/email confirmed).
    #[serde(default)]
    pub is_verified: bool,
    /// Driver documents approved.
    #[serde(default)]
    pub is_driver_verified: bool,
    /// Student card approved.
    #[serde(default)]
    pub is_student_verified: bool,
    /// Avatar image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Fields this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// Whether the user may switch into driver mode.
    pub fn can_drive(&self) -> bool {
        self.is_driver_verified
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Login credentials. Exactly one of `phone` or `email` is expected.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password: String,
}

impl LoginRequest {
    /// Login with a phone number.
    pub fn phone(phone: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            phone: Some(phone.into()),
            email: None,
            password: password.into(),
        }
    }

    /// Login with an email address.
    pub fn email(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            phone: None,
            email: Some(email.into()),
            password: password.into(),
        }
    }

    /// Pick phone or email login from a free-form identifier.
    pub fn identifier(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        let identifier = identifier.into();
        if identifier.contains('@') {
            Self::email(identifier, password)
        } else {
            Self::phone(identifier, password)
        }
    }
}

/// Account registration.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password: String,
}

/// OTP confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub otp: String,
}

/// Registration acknowledgement; an OTP has been sent.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub user_id: Option<String>,
}

/// Body of a session-mutating response (login, OTP verify, profile switch).
///
/// Fields are looked up at the top level first, then under a `data`
/// envelope. Missing or malformed fields are `None`, never an error.
#[derive(Debug, Clone, Default)]
pub struct SessionGrant {
    /// New access token (`access_token` or `token`).
    pub access_token: Option<String>,
    /// New refresh token.
    pub refresh_token: Option<String>,
    /// Embedded user profile.
    pub user: Option<Profile>,
    /// Active mode reported by the mutation itself.
    pub active_profile: Option<ProfileMode>,
}

impl SessionGrant {
    /// Extract the grant from a response body.
    pub fn from_value(value: &Value) -> Self {
        let layers: Vec<&Map<String, Value>> = value
            .as_object()
            .into_iter()
            .chain(value.get("data").and_then(Value::as_object))
            .collect();
        let text = |keys: &[&str]| {
            lookup(&layers, keys)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        Self {
            access_token: text(&["access_token", "accessToken", "token"]),
            refresh_token: text(&["refresh_token", "refreshToken"]),
            user: lookup(&layers, &["user", "profile"])
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            active_profile: text(&["active_profile", "activeProfile", "active_mode"])
                .and_then(|s| s.parse().ok()),
        }
    }

    /// Active mode: the mutation's own value first, then the embedded user's.
    pub fn mode(&self) -> Option<ProfileMode> {
        self.active_profile
            .or_else(|| self.user.as_ref().and_then(|u| u.active_profile))
    }
}

/// First key found, searching each layer in order.
fn lookup<'a>(layers: &[&'a Map<String, Value>], keys: &[&str]) -> Option<&'a Value> {
    layers
        .iter()
        .find_map(|layer| keys.iter().find_map(|k| layer.get(*k)))
}

/// Profile switch request.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchProfileRequest {
    pub profile: ProfileMode,
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallet
// ─────────────────────────────────────────────────────────────────────────────

/// Wallet summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// Available balance.
    pub balance: Vnd,
    /// Amount held by pending withdrawals.
    #[serde(default)]
    pub pending: Vnd,
    /// Currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "VND".to_string()
}

/// Top-up request.
#[derive(Debug, Clone, Serialize)]
pub struct TopUpRequest {
    pub amount: Vnd,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

/// Payment gateway checkout created for a top-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUpSession {
    /// Gateway page the user completes the payment on.
    #[serde(alias = "payment_url", alias = "paymentUrl", alias = "checkoutUrl")]
    pub checkout_url: String,
    /// Gateway order reference.
    #[serde(
        default,
        alias = "orderCode",
        deserialize_with = "opt_string_or_number"
    )]
    pub order_code: Option<String>,
    /// Amount the gateway will charge.
    #[serde(default)]
    pub amount: Option<Vnd>,
}

/// Withdrawal to a bank account.
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawRequest {
    pub amount: Vnd,
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
}

/// Wallet transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// topup, withdraw, ride_payment, ride_earning, ...
    #[serde(alias = "type")]
    pub kind: String,
    pub amount: Vnd,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One page of wallet history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionPage {
    #[serde(default, alias = "transactions", alias = "data")]
    pub items: Vec<Transaction>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Banks
// ─────────────────────────────────────────────────────────────────────────────

/// Bank directory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    pub code: String,
    pub name: String,
    #[serde(default, alias = "shortName")]
    pub short_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub bin: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Verification
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of verification document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    StudentCard,
    NationalId,
    DriverLicense,
    VehicleRegistration,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::StudentCard => "student_card",
            DocumentKind::NationalId => "national_id",
            DocumentKind::DriverLicense => "driver_license",
            DocumentKind::VehicleRegistration => "vehicle_registration",
        }
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "student_card" => Ok(DocumentKind::StudentCard),
            "national_id" => Ok(DocumentKind::NationalId),
            "driver_license" => Ok(DocumentKind::DriverLicense),
            "vehicle_registration" => Ok(DocumentKind::VehicleRegistration),
            other => Err(format!("unknown document kind '{}'", other)),
        }
    }
}

/// Review state of one uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStatus {
    #[serde(alias = "type", alias = "document_type")]
    pub kind: String,
    /// pending, approved, rejected.
    pub status: String,
    #[serde(default, alias = "reason")]
    pub note: Option<String>,
}

/// Overall verification state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub documents: Vec<DocumentStatus>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// IDs arrive as either strings or integers.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(opt_string_or_number(deserializer)?.unwrap_or_default())
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
