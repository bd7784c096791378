//! Buffered response returned by the agent

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// Final response of a request, body fully read
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    url: String,
    body: Bytes,
    attempts: u32,
}

impl ApiResponse {
    /// Assemble a response from its parts
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        url: impl Into<String>,
        body: impl Into<Bytes>,
        attempts: u32,
    ) -> Self {
        Self {
            status,
            headers,
            url: url.into(),
            body: body.into(),
            attempts,
        }
    }

    /// Read a transport response to the end
    pub(crate) async fn read(
        response: reqwest::Response,
        attempts: u32,
    ) -> std::result::Result<Self, reqwest::Error> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().to_string();
        let body = response.bytes().await?;
        Ok(Self::new(status, headers, url, body, attempts))
    }

    /// Response status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response status as a number
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Final URL of the request
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw body
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8, lossily
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON
    pub fn json<T: DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Attempts made, including the first
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the server declared a JSON body
    pub fn is_json(&self) -> bool {
        self.header("content-type")
            .is_some_and(|ct| ct.starts_with("application/json"))
    }
}
