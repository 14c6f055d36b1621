//! Response body parsing.
//!
//! Empty bodies become [`Payload::Empty`] whatever their declared content
//! type, JSON content types are decoded strictly, everything else passes
//! through as text.

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// No body (204/205, `Content-Length: 0`, or blank text).
    Empty,
    /// Decoded JSON body.
    Json(Value),
    /// Non-JSON body, verbatim.
    Text(String),
}

impl Payload {
    /// Whether the body was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// Borrow the JSON value, if this is a JSON body.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Convert into a JSON value: empty becomes `null`, text becomes a string.
    pub fn into_json(self) -> Value {
        match self {
            Payload::Empty => Value::Null,
            Payload::Json(value) => value,
            Payload::Text(text) => Value::String(text),
        }
    }

    /// Deserialize the body into `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.into_json()).map_err(Error::Decode)
    }

    /// Unwrap a `{ "data": ... }` envelope if present.
    pub fn into_data(self) -> Value {
        match self.into_json() {
            Value::Object(mut map) if map.get("data").is_some_and(|d| !d.is_null()) => {
                map.remove("data").unwrap_or_default()
            }
            other => other,
        }
    }

    /// Deserialize the body into `T`, unwrapping a `data` envelope.
    pub fn decode_data<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.into_data()).map_err(Error::Decode)
    }

    /// Server-provided error message, if any.
    ///
    /// Prefers a JSON `message` field, then `error`, then non-blank raw text.
    pub(crate) fn server_message(&self) -> Option<String> {
        match self {
            Payload::Json(value) => ["message", "error"]
                .iter()
                .filter_map(|key| value.get(key))
                .find_map(|v| match v {
                    Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                    Value::Array(items) => {
                        let joined = items
                            .iter()
                            .filter_map(Value::as_str)
                            .collect::<Vec<_>>()
                            .join(", ");
                        (!joined.is_empty()).then_some(joined)
                    }
                    _ => None,
                }),
            Payload::Text(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            _ => None,
        }
    }
}

/// Read and parse a response body.
pub(crate) async fn read_payload(
    response: reqwest::Response,
    transport_message: &str,
) -> Result<Payload> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let content_length = response.content_length();

    if is_bodiless(status, content_length) {
        return Ok(Payload::Empty);
    }

    let text = response.text().await.map_err(|source| Error::Transport {
        message: transport_message.to_string(),
        source,
    })?;

    parse_body(status.as_u16(), content_type.as_deref(), &text)
}

/// Whether the status or length alone guarantees an empty body.
fn is_bodiless(status: StatusCode, content_length: Option<u64>) -> bool {
    status == StatusCode::NO_CONTENT
        || status == StatusCode::RESET_CONTENT
        || content_length == Some(0)
}

/// Parse body text according to its declared content type.
pub(crate) fn parse_body(status: u16, content_type: Option<&str>, text: &str) -> Result<Payload> {
    if text.trim().is_empty() {
        return Ok(Payload::Empty);
    }

    if content_type.is_some_and(is_json_content_type) {
        return serde_json::from_str(text)
            .map(Payload::Json)
            .map_err(|source| Error::InvalidResponse { status, source });
    }

    Ok(Payload::Text(text.to_string()))
}

/// `application/json`, `application/problem+json`, and friends.
fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Build the error for a non-success response.
pub(crate) fn http_error(status: u16, body: Payload) -> Error {
    let message = body
        .server_message()
        .unwrap_or_else(|| format!("Request failed with status {}", status));
    Error::Http {
        status,
        message,
        body,
    }
}
