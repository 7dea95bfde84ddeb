//! HTTP client for the station's series endpoint
//!
//! One GET per refresh cycle, `hours`/`maxpts` query parameters, bounded
//! connect and read timeouts. Status 200 is the only success; everything
//! else is a typed failure carrying the cause for logging. No retries,
//! no redirect handling beyond the HTTP stack's defaults.

use std::time::Duration;
use tracing::debug;

/// Default connect and read timeout bound, seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Typed failure for a fetch attempt. The refresh cycle does not branch on
/// the subtype; it only propagates "no data this cycle" and logs the cause.
#[derive(Debug)]
pub enum FetchError {
    /// Endpoint URL rejected before any network activity
    InvalidEndpoint(String),
    /// Response arrived with a status other than 200
    Status(reqwest::StatusCode),
    /// Connect failure, I/O error, or timeout
    Network(reqwest::Error),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::InvalidEndpoint(url) => write!(f, "invalid endpoint: {}", url),
            FetchError::Status(status) => write!(f, "unexpected status: {}", status),
            FetchError::Network(e) => write!(f, "network error: {}", e),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Network(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StationConfig {
    pub url: String,
    /// Requested time window, hours back from now
    pub hours: u32,
    /// Maximum points the server should return for the window
    pub maxpts: u32,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            url: "http://192.168.0.17:8000/indexjson.php".to_string(),
            hours: 24,
            maxpts: 2000,
            connect_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Client over the station endpoint.
///
/// Built once and reused across cycles (connection pooling); the underlying
/// connection and body stream are released on every exit path, bounded by
/// the configured timeouts.
pub struct StationClient {
    endpoint: reqwest::Url,
    hours: u32,
    maxpts: u32,
    http: reqwest::Client,
}

impl StationClient {
    pub fn new(config: StationConfig) -> Result<Self, FetchError> {
        let endpoint = reqwest::Url::parse(&config.url)
            .map_err(|e| FetchError::InvalidEndpoint(format!("{}: {}", config.url, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.host_str().is_none() {
            return Err(FetchError::InvalidEndpoint(config.url));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .http1_only()
            .build()
            .map_err(FetchError::Network)?;

        Ok(Self { endpoint, hours: config.hours, maxpts: config.maxpts, http })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    /// Perform one GET and return the raw response body.
    ///
    /// Must be called from a runtime task, never from the presentation
    /// thread; the call blocks its task until response or timeout.
    pub async fn fetch(&self) -> Result<String, FetchError> {
        debug!(
            url = %self.endpoint,
            hours = self.hours,
            maxpts = self.maxpts,
            "station_fetch"
        );

        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[("hours", self.hours), ("maxpts", self.maxpts)])
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        response.text().await.map_err(FetchError::Network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StationConfig::default();
        assert_eq!(config.hours, 24);
        assert_eq!(config.maxpts, 2000);
        assert_eq!(config.connect_timeout, Duration::from_secs(20));
        assert_eq!(config.read_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_new_accepts_http_endpoint() {
        let client = StationClient::new(StationConfig::default()).unwrap();
        assert_eq!(client.endpoint().host_str(), Some("192.168.0.17"));
    }

    #[test]
    fn test_new_rejects_malformed_url() {
        let config = StationConfig { url: "not a url".to_string(), ..Default::default() };
        assert!(matches!(StationClient::new(config), Err(FetchError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_new_rejects_relative_url() {
        let config = StationConfig { url: "/indexjson.php".to_string(), ..Default::default() };
        assert!(matches!(StationClient::new(config), Err(FetchError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_new_rejects_non_http_scheme() {
        let config =
            StationConfig { url: "ftp://192.168.0.17/data".to_string(), ..Default::default() };
        assert!(matches!(StationClient::new(config), Err(FetchError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::InvalidEndpoint("bogus".to_string());
        assert_eq!(err.to_string(), "invalid endpoint: bogus");

        let err = FetchError::Status(reqwest::StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("404"));
    }
}
