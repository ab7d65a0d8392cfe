use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Url};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Status and full body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network-level failure: DNS, connect, TLS, timeout, or an interrupted body.
///
/// Never carries the request URL, which embeds the API key.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self { message: message.into(), source: Some(source.into()) }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        let message = if err.is_timeout() {
            "request timed out"
        } else if err.is_connect() {
            "connection failed"
        } else if err.is_body() || err.is_decode() {
            "failed to read response body"
        } else if err.is_builder() {
            "failed to build HTTP client"
        } else {
            "request failed"
        };
        Self::with_source(message, err)
    }
}

/// Performs the single GET a forecast lookup needs.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` connection pool.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }

    /// Applies `timeout` to the whole exchange, body included.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        let res = self.http.get(url.clone()).send().await?;

        let status = res.status().as_u16();
        let body = res.bytes().await?;

        Ok(TransportResponse { status, body: body.to_vec() })
    }
}
