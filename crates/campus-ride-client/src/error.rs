//! Client error types.

use thiserror::Error;

use crate::response::Payload;

/// Message shown for failures that never produced an HTTP response.
pub const DEFAULT_TRANSPORT_MESSAGE: &str =
    "Không thể kết nối đến máy chủ. Vui lòng kiểm tra kết nối mạng.";

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// No HTTP response was obtained (DNS, timeout, connection reset).
    #[error("{message}")]
    Transport {
        /// Display message.
        message: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The access token was rejected and could not be refreshed.
    ///
    /// Credentials have already been cleared when this is returned.
    #[error("Session expired: {reason}")]
    SessionExpired {
        /// Why the refresh failed.
        reason: RefreshFailure,
    },

    /// Server returned a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, raw body text, or a generic fallback.
        message: String,
        /// Parsed response body, for caller-specific inspection.
        body: Payload,
    },

    /// Body declared a JSON content type but failed to parse.
    #[error("Invalid response body (HTTP {status}): {source}")]
    InvalidResponse {
        /// HTTP status code of the response.
        status: u16,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// A parsed body did not match the expected shape.
    #[error("Unexpected response shape: {0}")]
    Decode(#[source] serde_json::Error),

    /// Request body could not be serialized.
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected locally; no request was sent.
    #[error("{0}")]
    Validation(String),
}

impl Error {
    /// HTTP status associated with this error.
    ///
    /// Transport failures report `0`; purely local errors report `0` too.
    pub fn status(&self) -> u16 {
        match self {
            Error::Http { status, .. } | Error::InvalidResponse { status, .. } => *status,
            Error::SessionExpired { .. } => 401,
            _ => 0,
        }
    }

    /// Whether the caller should route the user to a login flow.
    pub fn requires_login(&self) -> bool {
        matches!(self, Error::SessionExpired { .. })
    }

    /// Check if this is a transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Http { status: 404, .. })
    }

    /// Check if this is a conflict error (e.g. duplicate phone on register).
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Http { status: 409, .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Http { status, .. } if *status >= 500)
    }

    /// Parsed body of a failed HTTP response.
    pub fn server_body(&self) -> Option<&Payload> {
        match self {
            Error::Http { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Why a token refresh failed.
///
/// Cloneable so one outcome can be shared by every caller awaiting the
/// same in-flight refresh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshFailure {
    /// No refresh token is stored.
    #[error("no refresh token stored")]
    MissingRefreshToken,

    /// The refresh endpoint answered with a non-success status.
    #[error("refresh rejected with HTTP {status}")]
    Rejected { status: u16 },

    /// The refresh endpoint could not be reached.
    #[error("refresh request failed: {0}")]
    Transport(String),

    /// The refresh endpoint answered without a usable token.
    #[error("refresh response carried no access token")]
    MissingAccessToken,

    /// Another caller's refresh already failed and cleared the session.
    #[error("session was cleared")]
    Cleared,
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
