//! HTTP capability.
//!
//! The core builds a request description; the shell executes it with the
//! platform transport and hands the outcome back. Transport failures are
//! `Err(HttpError)`; an HTTP error status is a normal `HttpResponse` the
//! app inspects, because non-2xx handling is application logic here.
//!
//! All endpoints are same-origin, so requests carry origin-relative paths
//! rather than absolute URLs.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::DEFAULT_REQUEST_TIMEOUT;

pub const MAX_PATH_LENGTH: usize = 2048;
pub const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;
pub const MAX_HEADER_VALUE_LENGTH: usize = 8192;
pub const MAX_HEADERS_COUNT: usize = 32;
pub const MAX_TIMEOUT_MS: u64 = 300_000;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpError {
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("too many headers: {count} exceeds maximum of {max}")]
    TooManyHeaders { count: usize, max: usize },

    #[error("request body too large: {size} bytes exceeds maximum of {max} bytes")]
    BodyTooLarge { size: usize, max: usize },

    #[error("serialization error: {message}")]
    Serialization { message: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl HttpError {
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }
}

/// Origin-relative request path, e.g. `/post/7/like/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestPath(String);

impl RequestPath {
    pub fn new(path: impl Into<String>) -> Result<Self, HttpError> {
        let path = path.into();

        if !path.starts_with('/') {
            return Err(HttpError::InvalidPath {
                path,
                reason: "path must be origin-relative and start with '/'".to_string(),
            });
        }

        if path.len() > MAX_PATH_LENGTH {
            return Err(HttpError::InvalidPath {
                path: path.chars().take(100).collect(),
                reason: format!("path exceeds maximum length of {MAX_PATH_LENGTH} bytes"),
            });
        }

        if path.starts_with("//") {
            return Err(HttpError::InvalidPath {
                path,
                reason: "protocol-relative paths are not allowed".to_string(),
            });
        }

        if path
            .chars()
            .any(|c| c.is_ascii_control() || c.is_whitespace())
        {
            return Err(HttpError::InvalidPath {
                path,
                reason: "path contains whitespace or control characters".to_string(),
            });
        }

        Ok(Self(path))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeaders {
    headers: Vec<(String, String)>,
}

impl HttpHeaders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), HttpError> {
        if self.headers.len() >= MAX_HEADERS_COUNT {
            return Err(HttpError::TooManyHeaders {
                count: self.headers.len(),
                max: MAX_HEADERS_COUNT,
            });
        }

        let name = name.into();
        let value = value.into();

        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(HttpError::InvalidHeader {
                name,
                reason: "invalid header name".to_string(),
            });
        }

        if value.len() > MAX_HEADER_VALUE_LENGTH
            || value.chars().any(|c| c == '\r' || c == '\n' || c == '\0')
        {
            return Err(HttpError::InvalidHeader {
                name,
                reason: "invalid header value".to_string(),
            });
        }

        let name_lower = name.to_lowercase();
        self.headers.retain(|(n, _)| n.to_lowercase() != name_lower);
        self.headers.push((name, value));
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        let name_lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| n.to_lowercase() == name_lower)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    method: HttpMethod,
    path: RequestPath,
    headers: HttpHeaders,
    body: Option<Vec<u8>>,
    timeout_ms: u64,
    request_id: String,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Result<Self, HttpError> {
        Ok(Self {
            method,
            path: RequestPath::new(path)?,
            headers: HttpHeaders::new(),
            body: None,
            timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            request_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, HttpError> {
        self.headers.insert(name, value)?;
        Ok(self)
    }

    pub fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, HttpError> {
        let body = serde_json::to_vec(value).map_err(|e| HttpError::Serialization {
            message: e.to_string(),
        })?;

        if body.len() > MAX_REQUEST_BODY_SIZE {
            return Err(HttpError::BodyTooLarge {
                size: body.len(),
                max: MAX_REQUEST_BODY_SIZE,
            });
        }

        self.headers.insert("Content-Type", "application/json")?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, HttpError> {
        let ms = timeout.as_millis() as u64;
        if ms == 0 || ms > MAX_TIMEOUT_MS {
            return Err(HttpError::InvalidPath {
                path: self.path.as_str().to_string(),
                reason: format!("timeout must be within 1..={MAX_TIMEOUT_MS} ms"),
            });
        }
        self.timeout_ms = ms;
        Ok(self)
    }

    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    #[must_use]
    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    status: u16,
    body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub fn ok_json<T: Serialize>(value: &T) -> Self {
        Self::new(200, serde_json::to_vec(value).unwrap_or_default())
    }

    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(|e| HttpError::Serialization {
            message: format!("failed to parse response JSON: {e}"),
        })
    }
}

pub type HttpResult = Result<HttpResponse, HttpError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpOperation {
    Execute(HttpRequest),
}

impl Operation for HttpOperation {
    type Output = HttpResult;
}

pub struct Http<E> {
    context: CapabilityContext<HttpOperation, E>,
}

impl<Ev> Capability<Ev> for Http<Ev> {
    type Operation = HttpOperation;
    type MappedSelf<MappedEv> = Http<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Http::new(self.context.map_event(f))
    }
}

impl<E> Http<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<HttpOperation, E>) -> Self {
        Self { context }
    }

    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder<'_, E> {
        RequestBuilder {
            context: &self.context,
            request: HttpRequest::new(HttpMethod::Get, path),
        }
    }

    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder<'_, E> {
        RequestBuilder {
            context: &self.context,
            request: HttpRequest::new(HttpMethod::Post, path),
        }
    }
}

/// Builds a request and dispatches it to the shell. Builder errors are
/// delivered through the same callback as transport errors, so the app
/// handles both in one place.
pub struct RequestBuilder<'a, E> {
    context: &'a CapabilityContext<HttpOperation, E>,
    request: Result<HttpRequest, HttpError>,
}

impl<E> RequestBuilder<'_, E>
where
    E: Send + 'static,
{
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.request = self.request.and_then(|r| r.with_header(name, value));
        self
    }

    #[must_use]
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.request = self.request.and_then(|r| r.with_json(value));
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request = self.request.and_then(|r| r.with_timeout(timeout));
        self
    }

    pub fn send<F>(self, callback: F)
    where
        F: FnOnce(HttpResult) -> E + Send + 'static,
    {
        let context = self.context.clone();
        match self.request {
            Ok(request) => {
                self.context.spawn(async move {
                    let result = context
                        .request_from_shell(HttpOperation::Execute(request))
                        .await;
                    context.update_app(callback(result));
                });
            }
            Err(error) => {
                self.context.spawn(async move {
                    context.update_app(callback(Err(error)));
                });
            }
        }
    }
}
