//! Request context: one per logical call, rebuilt into a transport request
//! on every send so the post-refresh retry carries the same body.

use std::path::Path;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;

use crate::error::{Error, Result};

/// Request body kinds.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// JSON document; sent with `Content-Type: application/json`.
    Json(serde_json::Value),
    /// Multipart form; the transport sets `Content-Type` with the boundary.
    Multipart(Upload),
    /// Raw bytes; `Content-Type` is left to the transport.
    Binary(Vec<u8>),
}

impl RequestBody {
    /// Whether the transport computes the content type for this body.
    pub fn is_binary(&self) -> bool {
        matches!(self, RequestBody::Multipart(_) | RequestBody::Binary(_))
    }
}

/// A file to upload.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Bytes of the file.
    pub bytes: Vec<u8>,
    /// File name reported to the server.
    pub file_name: String,
    /// MIME type, if known.
    pub mime: Option<String>,
}

impl FilePart {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            mime: None,
        }
    }

    /// Set the MIME type.
    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a file from disk, guessing the MIME type from its extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = guess_mime(path);
        Ok(Self {
            bytes,
            file_name,
            mime,
        })
    }
}

fn guess_mime(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime.to_string())
}

/// Multipart upload: one file part plus string fields.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Form field carrying the file (`file`, `document`, `avatar`).
    pub field: String,
    /// The file.
    pub file: FilePart,
    /// Additional string fields, in order.
    pub fields: Vec<(String, String)>,
}

impl Upload {
    pub fn new(field: impl Into<String>, file: FilePart) -> Self {
        Self {
            field: field.into(),
            file,
            fields: Vec::new(),
        }
    }

    /// Add a string field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Build a fresh transport form. Forms are single-use, so each send
    /// builds its own.
    pub(crate) fn to_form(&self) -> Result<Form> {
        let mut part = Part::bytes(self.file.bytes.clone()).file_name(self.file.file_name.clone());
        if let Some(mime) = &self.file.mime {
            part = part
                .mime_str(mime)
                .map_err(|e| Error::Config(format!("invalid MIME type '{}': {}", mime, e)))?;
        }

        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        Ok(form.part(self.field.clone(), part))
    }
}

/// One logical API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the API base URL.
    pub endpoint: String,
    /// Optional body.
    pub body: Option<RequestBody>,
    /// Extra headers set by the caller.
    pub headers: HeaderMap,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// Send without the stored bearer token (and so never refresh).
    pub anonymous: bool,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
            headers: HeaderMap::new(),
            query: Vec::new(),
            anonymous: false,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PATCH, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(Error::Encode)?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    /// Attach a multipart upload.
    pub fn upload(mut self, upload: Upload) -> Self {
        self.body = Some(RequestBody::Multipart(upload));
        self
    }

    /// Attach a raw binary body.
    pub fn binary(mut self, bytes: Vec<u8>) -> Self {
        self.body = Some(RequestBody::Binary(bytes));
        self
    }

    /// Add a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Omit the `Authorization` header. Used for credential exchanges, where
    /// a stale token must not turn a rejected password into a refresh.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Whether the body lets the transport choose `Content-Type`.
    pub fn has_binary_body(&self) -> bool {
        self.body.as_ref().is_some_and(RequestBody::is_binary)
    }
}
