use std::{fmt, sync::Arc, time::Duration};

use reqwest::Url;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    client::transport::{HttpTransport, Transport},
    error::ForecastError,
    model::Forecast,
};

pub mod transport;

pub const DEFAULT_BASE_URL: &str = "https://api.forecast.io";

/// Fetch the forecast for one coordinate pair with a fresh default client.
///
/// Coordinates are forwarded verbatim; the upstream rejects invalid ones.
pub async fn get(api_key: &str, latitude: f64, longitude: f64) -> Result<Forecast, ForecastError> {
    ForecastClient::new(api_key).get(latitude, longitude).await
}

/// Reusable handle for forecast lookups.
///
/// Cloning is cheap; clones share the transport and its connection pool.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    api_key: ApiKey,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl ForecastClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: ApiKey(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            transport: Arc::new(HttpTransport::new()),
        }
    }

    pub fn builder(api_key: impl Into<String>) -> ForecastClientBuilder {
        ForecastClientBuilder {
            api_key: ApiKey(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            transport: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/forecast/<key>/<latitude>,<longitude>`
    pub fn forecast_url(&self, latitude: f64, longitude: f64) -> Result<Url, ForecastError> {
        let mut url = parse_base_url(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|()| invalid_base_url(&self.base_url, "URL cannot be a base"))?
            .pop_if_empty()
            .push("forecast")
            .push(&self.api_key.0)
            .push(&format!("{latitude},{longitude}"));
        Ok(url)
    }

    /// One GET, then a full decode of the body. No retries.
    ///
    /// Non-2xx responses are reported as [`ForecastError::Status`] without
    /// attempting to decode the body.
    #[tracing::instrument(name = "forecast", level = "debug", skip(self))]
    pub async fn get(&self, latitude: f64, longitude: f64) -> Result<Forecast, ForecastError> {
        let url = self.forecast_url(latitude, longitude)?;

        debug!("requesting forecast");
        let res = self.transport.get(&url).await?;
        debug!(status = res.status, bytes = res.body.len(), "forecast response received");

        if !res.is_success() {
            warn!(status = res.status, "forecast API returned an error status");
            return Err(ForecastError::Status {
                status: res.status,
                body: truncate_body(&String::from_utf8_lossy(&res.body)),
            });
        }

        let forecast = serde_json::from_slice(&res.body)?;
        Ok(forecast)
    }

    /// Like [`get`](Self::get), but gives up as soon as `cancel` fires.
    ///
    /// The in-flight request is dropped, which releases its connection.
    pub async fn get_cancellable(
        &self,
        latitude: f64,
        longitude: f64,
        cancel: &CancellationToken,
    ) -> Result<Forecast, ForecastError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(latitude, longitude, "forecast request cancelled");
                Err(ForecastError::Cancelled)
            }
            res = self.get(latitude, longitude) => res,
        }
    }

    pub async fn get_with_deadline(
        &self,
        latitude: f64,
        longitude: f64,
        deadline: Duration,
    ) -> Result<Forecast, ForecastError> {
        tokio::time::timeout(deadline, self.get(latitude, longitude))
            .await
            .map_err(|_| ForecastError::DeadlineElapsed(deadline))?
    }
}

#[derive(Debug)]
pub struct ForecastClientBuilder {
    api_key: ApiKey,
    base_url: String,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
}

impl ForecastClientBuilder {
    /// Scheme and host to talk to instead of the public API.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Timeout for the default HTTP transport. Ignored with a custom transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<ForecastClient, ForecastError> {
        parse_base_url(&self.base_url)?;

        let transport: Arc<dyn Transport> = match (self.transport, self.timeout) {
            (Some(transport), _) => transport,
            (None, Some(timeout)) => Arc::new(HttpTransport::with_timeout(timeout)?),
            (None, None) => Arc::new(HttpTransport::new()),
        };

        Ok(ForecastClient { api_key: self.api_key, base_url: self.base_url, transport })
    }
}

/// Kept out of `Debug` output so clients can be logged freely.
#[derive(Clone)]
struct ApiKey(String);

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, ForecastError> {
    let url = Url::parse(base_url).map_err(|e| invalid_base_url(base_url, &e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid_base_url(base_url, "scheme must be http or https"));
    }
    if url.cannot_be_a_base() {
        return Err(invalid_base_url(base_url, "URL cannot be a base"));
    }

    Ok(url)
}

fn invalid_base_url(url: &str, reason: &str) -> ForecastError {
    ForecastError::InvalidBaseUrl { url: url.to_string(), reason: reason.to_string() }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::{TransportError, TransportResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every request with the same canned response and records URLs.
    #[derive(Debug)]
    struct CannedTransport {
        response: TransportResponse,
        seen: Mutex<Vec<String>>,
    }

    impl CannedTransport {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: TransportResponse::new(status, body),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
            self.seen.lock().unwrap().push(url.to_string());
            Ok(self.response.clone())
        }
    }

    #[derive(Debug)]
    struct RefusingTransport;

    #[async_trait]
    impl Transport for RefusingTransport {
        async fn get(&self, _url: &Url) -> Result<TransportResponse, TransportError> {
            Err(TransportError::new("connection refused"))
        }
    }

    #[derive(Debug)]
    struct HangingTransport;

    #[async_trait]
    impl Transport for HangingTransport {
        async fn get(&self, _url: &Url) -> Result<TransportResponse, TransportError> {
            std::future::pending().await
        }
    }

    fn client_with(transport: Arc<dyn Transport>) -> ForecastClient {
        ForecastClient::builder("KEY").transport(transport).build().expect("valid client")
    }

    #[test]
    fn url_uses_key_and_plain_float_formatting() {
        let client = ForecastClient::new("abc123");
        let url = client.forecast_url(37.8, -122.4).unwrap();
        assert_eq!(url.as_str(), "https://api.forecast.io/forecast/abc123/37.8,-122.4");

        let url = client.forecast_url(10.0, 0.5).unwrap();
        assert_eq!(url.as_str(), "https://api.forecast.io/forecast/abc123/10,0.5");
    }

    #[test]
    fn url_forwards_out_of_range_coordinates() {
        let client = ForecastClient::new("k");
        let url = client.forecast_url(123.0, -500.25).unwrap();
        assert!(url.path().ends_with("/123,-500.25"));
    }

    #[test]
    fn url_honours_base_with_trailing_slash() {
        let client = ForecastClient::builder("k").base_url("http://localhost:8080/").build().unwrap();
        let url = client.forecast_url(1.0, 2.0).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/forecast/k/1,2");
    }

    #[test]
    fn key_is_a_single_path_segment() {
        let client = ForecastClient::new("a/b");
        let url = client.forecast_url(1.0, 2.0).unwrap();
        assert_eq!(url.path(), "/forecast/a%2Fb/1,2");
    }

    #[test]
    fn debug_output_hides_key() {
        let client = ForecastClient::new("super-secret");
        assert!(!format!("{client:?}").contains("super-secret"));
    }

    #[test]
    fn builder_rejects_bad_base_url() {
        let err = ForecastClient::builder("k").base_url("not a url").build().unwrap_err();
        assert!(matches!(err, ForecastError::InvalidBaseUrl { .. }));

        let err = ForecastClient::builder("k").base_url("ftp://example.com").build().unwrap_err();
        assert!(err.to_string().contains("scheme must be http or https"));
    }

    #[tokio::test]
    async fn decodes_body_from_transport() {
        let transport = CannedTransport::new(
            200,
            r#"{"latitude": 37.8, "longitude": -122.4, "timezone": "America/Los_Angeles"}"#,
        );
        let client = client_with(transport.clone());

        let forecast = client.get(37.8, -122.4).await.unwrap();

        assert_eq!(forecast.latitude, 37.8);
        assert_eq!(forecast.longitude, -122.4);
        assert_eq!(forecast.timezone, "America/Los_Angeles");
        assert_eq!(transport.seen(), vec!["https://api.forecast.io/forecast/KEY/37.8,-122.4"]);
    }

    #[tokio::test]
    async fn missing_alerts_is_not_an_error() {
        let client = client_with(CannedTransport::new(200, r#"{"latitude": 1.0}"#));
        let forecast = client.get(1.0, 2.0).await.unwrap();
        assert!(forecast.alerts.is_empty());
    }

    #[tokio::test]
    async fn truncated_body_is_decode_error() {
        let client = client_with(CannedTransport::new(200, r#"{"latitude": 37.8"#));
        let err = client.get(37.8, -122.4).await.unwrap_err();
        assert!(err.is_decode(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn wrong_shape_is_decode_error() {
        let client = client_with(CannedTransport::new(200, r#"{"latitude": "north"}"#));
        let err = client.get(1.0, 2.0).await.unwrap_err();
        assert!(err.is_decode());
    }

    #[tokio::test]
    async fn transport_failure_is_transport_error() {
        let client = client_with(Arc::new(RefusingTransport));
        let err = client.get(1.0, 2.0).await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn error_status_is_reported_without_decoding() {
        let client = client_with(CannedTransport::new(403, r#"{"code":403,"error":"daily usage limit exceeded"}"#));
        let err = client.get(1.0, 2.0).await.unwrap_err();

        match err {
            ForecastError::Status { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("daily usage limit exceeded"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_returns_promptly() {
        let client = client_with(Arc::new(HangingTransport));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client.get_cancellable(1.0, 2.0, &cancel).await.unwrap_err();
        assert!(matches!(err, ForecastError::Cancelled));
    }

    #[tokio::test]
    async fn uncancelled_request_completes() {
        let client = client_with(CannedTransport::new(200, r#"{"timezone": "UTC"}"#));
        let cancel = CancellationToken::new();

        let forecast = client.get_cancellable(0.0, 0.0, &cancel).await.unwrap();
        assert_eq!(forecast.timezone, "UTC");
    }

    #[tokio::test]
    async fn deadline_elapses() {
        let client = client_with(Arc::new(HangingTransport));
        let err = client.get_with_deadline(1.0, 2.0, Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, ForecastError::DeadlineElapsed(d) if d == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn concurrent_calls_do_not_mix_results() {
        let north = client_with(CannedTransport::new(200, r#"{"latitude": 60.0, "timezone": "Europe/Oslo"}"#));
        let south = client_with(CannedTransport::new(200, r#"{"latitude": -33.9, "timezone": "Africa/Johannesburg"}"#));

        let (a, b) = tokio::join!(north.get(60.0, 10.7), south.get(-33.9, 18.4));

        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!((a.latitude, a.timezone.as_str()), (60.0, "Europe/Oslo"));
        assert_eq!((b.latitude, b.timezone.as_str()), (-33.9, "Africa/Johannesburg"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);

        assert_eq!(truncate_body("short"), "short");
    }
}
