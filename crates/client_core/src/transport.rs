//! Single request/response calls against the content backend.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::error::ClientError;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl TransportRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

/// Status and parsed JSON body. The body is only read for 2xx responses.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl TransportResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    pub fn status(status: u16) -> Self {
        Self { status, body: None }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Network(String),
    #[error("response body is not valid JSON: {0}")]
    Decode(String),
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

impl From<TransportError> for ClientError {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Network(message) => ClientError::Transport(message),
            TransportError::Decode(message) => ClientError::Malformed(message),
            TransportError::Url(err) => ClientError::Transport(err.to_string()),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Strips one trailing `/` from a configured backend url. An empty or
/// absent value falls back to `origin`.
pub fn resolve_base_url(configured: Option<&str>, origin: &str) -> String {
    let configured = configured.map(str::trim).unwrap_or_default();
    let base = configured.strip_suffix('/').unwrap_or(configured);
    if base.is_empty() {
        origin.trim_end_matches('/').to_string()
    } else {
        base.to_string()
    }
}

pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let base_url = base_url.into();
        Url::parse(&base_url)?;
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, request: &TransportRequest) -> Result<Url, TransportError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, request.path))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.endpoint(&request)?;
        let builder = match request.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let res = builder
            .send()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;
        let status = res.status().as_u16();
        if !res.status().is_success() {
            return Ok(TransportResponse::status(status));
        }

        let bytes = res
            .bytes()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;
        let body = serde_json::from_slice::<Value>(&bytes)
            .map_err(|err| TransportError::Decode(err.to_string()))?;
        Ok(TransportResponse {
            status,
            body: Some(body),
        })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
