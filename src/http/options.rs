//! Per-request options and the prepared request seen by hooks

use crate::error::{Error, Result};
use crate::types::{JsonValue, Method, StringMap};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::path::Path;
use std::time::Duration;

/// Content type sent for file parts without an explicit one
pub const DEFAULT_PART_MIME: &str = "application/octet-stream";

/// Request body
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Serialized as JSON with `Content-Type: application/json`
    Json(JsonValue),
    /// Url-encoded form fields
    Form(Vec<(String, String)>),
    /// Raw text
    Text(String),
    /// Raw bytes
    Bytes(Bytes),
    /// `multipart/form-data` file parts
    Multipart(Vec<FilePart>),
}

/// One file field of a multipart body, held in memory so every retry can resend it
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    /// Form field name
    pub field: String,
    /// File name reported to the server
    pub file_name: String,
    /// Content type
    pub mime: String,
    /// File content
    pub content: Bytes,
}

impl FilePart {
    /// Build a part from in-memory content
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            mime: DEFAULT_PART_MIME.to_string(),
            content: content.into(),
        }
    }

    /// Read a file from disk into a part
    pub fn from_path(field: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::config(format!("'{}' has no file name", path.display())))?;
        Ok(Self::new(field, file_name, content))
    }

    /// Set the content type
    #[must_use]
    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }
}

/// Options for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters, in order
    pub query: Vec<(String, String)>,
    /// Header overrides for this request only, keyed by lowercase name
    pub headers: StringMap,
    /// Request body
    pub body: Option<Body>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Create empty request options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header; names are case-insensitive, the last value wins
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    /// Set url-encoded form body
    #[must_use]
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.body = Some(Body::Form(fields));
        self
    }

    /// Set raw text body
    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Body::Text(body.into()));
        self
    }

    /// Set raw bytes body
    #[must_use]
    pub fn bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(Body::Bytes(body.into()));
        self
    }

    /// Add a multipart file part; replaces any non-multipart body
    #[must_use]
    pub fn file(mut self, part: FilePart) -> Self {
        match self.body {
            Some(Body::Multipart(ref mut parts)) => parts.push(part),
            _ => self.body = Some(Body::Multipart(vec![part])),
        }
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A fully resolved request, handed to request hooks before dispatch
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Merged headers
    pub headers: HeaderMap,
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// Request body
    pub body: Option<Body>,
    /// Timeout for each attempt
    pub timeout: Duration,
}

impl PreparedRequest {
    /// Set a header, replacing any previous value
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        insert_header(&mut self.headers, name, value)
    }

    /// Header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Insert a header into a map, replacing values under the same name
pub(crate) fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::config(format!("Invalid header name '{name}': {e}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| Error::config(format!("Invalid value for header '{name}': {e}")))?;
    headers.insert(name, value);
    Ok(())
}
