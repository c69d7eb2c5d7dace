//! Request building and HTTP transport for the telephony server.
//!
//! Every request is a `GET` against
//! `{base_url}/api/{function}?source=..&user=..&pass=..&function=..&...`.
//! The transport returns the raw text body of any `2xx` response and signals
//! network failures and non-success statuses as a [`TransportError`]; it does
//! not parse, map or substitute data. A vendor `ERROR: ...` body is a normal
//! response and reaches the parser like any other.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use ccd_core::DialerConfig;
use reqwest::{StatusCode, Url};
use tracing::{debug, instrument, warn};

/// Errors raised by a [`Transport`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TransportError {
    /// No telephony server address is configured.
    #[error("no telephony server configured")]
    NotConfigured,

    /// The configured address cannot be turned into a request URL.
    #[error("invalid telephony server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Network failure, DNS failure or timeout. Never carries the request
    /// URL, whose query holds the API key.
    #[error("telephony request failed: {0}")]
    Http(reqwest::Error),

    /// The server answered with a non-success status.
    #[error("telephony server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl TransportError {
    /// Wraps a `reqwest` error with the request URL stripped.
    fn http(err: reqwest::Error) -> Self {
        TransportError::Http(err.without_url())
    }

    /// Returns `true` for failures that may succeed on another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Http(_) => true,
            TransportError::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

/// Ordered request parameters.
///
/// Values are rendered with [`fmt::Display`] and sent verbatim in insertion
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.push(name, value);
        self
    }

    /// Appends a parameter only when `value` is present.
    #[must_use]
    pub fn with_opt<V: fmt::Display>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl fmt::Display) {
        self.pairs.push((name.into(), value.to_string()));
    }

    /// Returns the first value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Sends one named function call to the telephony server.
///
/// Implementations must be thread-safe (`Send + Sync`); adapters share one
/// transport across tasks.
#[async_trait]
pub trait Transport: fmt::Debug + Send + Sync {
    /// Performs the call and returns the raw response body.
    async fn call(&self, function: &str, params: &Params) -> Result<String, TransportError>;
}

/// Builds the request URL for `function`.
///
/// Query order is `source`, `user`, `pass`, `function`, then every remaining
/// parameter. `user` and `pass` in `params` replace the defaults instead of
/// being sent twice; `source` and `function` in `params` are ignored.
///
/// # Errors
///
/// Returns `NotConfigured` for an empty base URL and `InvalidUrl` if the
/// result does not parse.
pub fn build_url(
    base_url: &str,
    source_tag: &str,
    default_user: &str,
    default_pass: &str,
    function: &str,
    params: &Params,
) -> Result<Url, TransportError> {
    let base_url = normalize_base_url(base_url)?;
    let url_string = format!("{base_url}/api/{function}");
    let mut url = Url::parse(&url_string).map_err(|e| TransportError::InvalidUrl {
        url: url_string.clone(),
        reason: e.to_string(),
    })?;

    let user = params.get("user").unwrap_or(default_user);
    let pass = params.get("pass").unwrap_or(default_pass);

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("source", source_tag)
            .append_pair("user", user)
            .append_pair("pass", pass)
            .append_pair("function", function);
        for (name, value) in params.iter() {
            if !matches!(name, "source" | "user" | "pass" | "function") {
                query.append_pair(name, value);
            }
        }
    }

    Ok(url)
}

/// Normalizes a base URL by trimming whitespace and trailing slashes.
///
/// # Errors
///
/// Returns `NotConfigured` if the URL is empty or contains only whitespace.
fn normalize_base_url(base_url: &str) -> Result<&str, TransportError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(TransportError::NotConfigured);
    }
    Ok(trimmed)
}

/// [`Transport`] over HTTP(S) with `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Option<String>,
    source_tag: String,
    api_user: String,
    api_key: String,
    retries: usize,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("source_tag", &self.source_tag)
            .field("api_user", &self.api_user)
            .field("retries", &self.retries)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Creates a transport from adapter configuration.
    ///
    /// A configuration without a server is accepted; every call then fails
    /// with [`TransportError::NotConfigured`] without touching the network.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &DialerConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(TransportError::http)?;

        Ok(Self {
            http,
            base_url: config.base_url.clone().filter(|_| config.has_server()),
            source_tag: config.source_tag.clone(),
            api_user: config.api_user.clone(),
            api_key: config.api_key.clone(),
            retries: config.retries,
        })
    }

    /// Sends a single GET request and returns the body.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The HTTP request fails (network error, timeout, etc.)
    /// - The server returns a non-success status code
    async fn send_once(&self, url: Url) -> Result<String, TransportError> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/plain")
            .send()
            .await
            .map_err(TransportError::http)?;

        let status = response.status();
        if status.is_success() {
            response.text().await.map_err(TransportError::http)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(TransportError::Status { status, body })
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, params))]
    async fn call(&self, function: &str, params: &Params) -> Result<String, TransportError> {
        let Some(base_url) = self.base_url.as_deref() else {
            return Err(TransportError::NotConfigured);
        };

        let url = build_url(
            base_url,
            &self.source_tag,
            &self.api_user,
            &self.api_key,
            function,
            params,
        )?;
        debug!(path = url.path(), "sending telephony request");

        let operation = || self.send_once(url.clone());

        operation
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(100))
                    .with_max_delay(Duration::from_secs(2))
                    .with_max_times(self.retries)
                    .with_jitter(),
            )
            .when(TransportError::is_retryable)
            .notify(|err, delay| warn!(error = %err, ?delay, "retrying telephony request"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path, query_param},
    };

    use super::*;

    fn config_for(server: &MockServer) -> DialerConfig {
        DialerConfig::default()
            .with_base_url(server.uri())
            .with_credentials("admin", "test-key")
    }

    // --- build_url tests ---

    #[test]
    fn test_build_url_orders_fixed_parameters_first() {
        let params = Params::new().with("phone_number", "3001234567");

        let url = build_url(
            "https://dialer.example.com/",
            "CCD_CRM",
            "admin",
            "secret",
            "lead_search",
            &params,
        )
        .unwrap();

        assert_eq!(url.path(), "/api/lead_search");
        assert_eq!(
            url.query(),
            Some("source=CCD_CRM&user=admin&pass=secret&function=lead_search&phone_number=3001234567")
        );
    }

    #[test]
    fn test_build_url_params_override_default_credentials() {
        let params = Params::new()
            .with("user", "supervisor")
            .with("campaign_id", "VENTAS")
            .with("pass", "override");

        let url = build_url("http://10.0.0.5", "CCD_CRM", "admin", "secret", "campaign_stats", &params)
            .unwrap();

        assert_eq!(
            url.query(),
            Some("source=CCD_CRM&user=supervisor&pass=override&function=campaign_stats&campaign_id=VENTAS")
        );
    }

    #[test]
    fn test_build_url_ignores_reserved_params() {
        let params = Params::new()
            .with("function", "agent_pause")
            .with("source", "OTHER")
            .with("agent_user", "agent001");

        let url = build_url("http://10.0.0.5", "CCD_CRM", "admin", "secret", "agent_status", &params)
            .unwrap();

        assert_eq!(
            url.query(),
            Some("source=CCD_CRM&user=admin&pass=secret&function=agent_status&agent_user=agent001")
        );
    }

    #[test]
    fn test_build_url_encodes_values() {
        let params = Params::new().with("comments", "call back & confirm");

        let url = build_url("http://10.0.0.5", "CCD_CRM", "admin", "", "update_lead", &params)
            .unwrap();

        let comments = url
            .query_pairs()
            .find(|(name, _)| name == "comments")
            .map(|(_, value)| value.into_owned());
        assert_eq!(comments.as_deref(), Some("call back & confirm"));
    }

    #[test]
    fn test_build_url_empty_base_is_not_configured() {
        let err = build_url("  / ", "CCD_CRM", "admin", "", "agent_status", &Params::new())
            .unwrap_err();

        assert!(matches!(err, TransportError::NotConfigured));
    }

    #[test]
    fn test_build_url_invalid_base_returns_error() {
        let err = build_url("not a url", "CCD_CRM", "admin", "", "agent_status", &Params::new())
            .unwrap_err();

        assert!(matches!(err, TransportError::InvalidUrl { .. }));
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_params_with_opt_skips_missing_values() {
        let params = Params::new()
            .with_opt("agent_user", Some("agent001"))
            .with_opt("campaign_id", None::<&str>)
            .with("limit", 10);

        let pairs: Vec<(&str, &str)> = params.iter().collect();
        assert_eq!(pairs, vec![("agent_user", "agent001"), ("limit", "10")]);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(!TransportError::NotConfigured.is_retryable());
        assert!(
            TransportError::Status {
                status: StatusCode::BAD_GATEWAY,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !TransportError::Status {
                status: StatusCode::UNAUTHORIZED,
                body: String::new()
            }
            .is_retryable()
        );
    }

    // --- HTTP tests ---

    #[tokio::test]
    async fn test_call_without_server_is_not_configured() {
        let transport = HttpTransport::new(&DialerConfig::default()).unwrap();

        let err = transport.call("agent_status", &Params::new()).await.unwrap_err();

        assert!(matches!(err, TransportError::NotConfigured));
    }

    #[tokio::test]
    async fn test_call_success_returns_raw_body() {
        let server = MockServer::start().await;
        let body = "user|status\nagent001|READY\n";

        Mock::given(method("GET"))
            .and(path("/api/agent_status"))
            .and(query_param("source", "CCD_CRM"))
            .and(query_param("user", "admin"))
            .and(query_param("pass", "test-key"))
            .and(query_param("function", "agent_status"))
            .and(query_param("agent_user", "agent001"))
            .and(header("accept", "text/plain"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&config_for(&server)).unwrap();
        let result = transport
            .call("agent_status", &Params::new().with("agent_user", "agent001"))
            .await
            .unwrap();

        assert_eq!(result, body);
    }

    #[tokio::test]
    async fn test_call_error_status_returns_status_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/agent_status"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&config_for(&server)).unwrap();
        let err = transport.call("agent_status", &Params::new()).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("maintenance"));
    }

    #[tokio::test]
    async fn test_call_vendor_error_line_is_returned_as_body() {
        let server = MockServer::start().await;
        let body = "ERROR: lead_search NO RESULTS FOUND - 5550000000";

        Mock::given(method("GET"))
            .and(path("/api/lead_search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&config_for(&server)).unwrap();
        let result = transport.call("lead_search", &Params::new()).await.unwrap();

        assert_eq!(result, body);
    }

    #[tokio::test]
    async fn test_network_error_does_not_leak_api_key() {
        let config = DialerConfig::default()
            .with_base_url("http://127.0.0.1:1")
            .with_credentials("admin", "s3cretKEY");
        let transport = HttpTransport::new(&config).unwrap();

        let err = transport.call("agent_status", &Params::new()).await.unwrap_err();

        assert!(matches!(err, TransportError::Http(_)));
        let message = err.to_string();
        assert!(!message.contains("s3cretKEY"), "{message}");
        assert!(!format!("{err:?}").contains("s3cretKEY"));
    }

    #[tokio::test]
    async fn test_call_retries_server_errors_when_configured() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/agent_status"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.retries = 2;
        let transport = HttpTransport::new(&config).unwrap();

        let err = transport.call("agent_status", &Params::new()).await.unwrap_err();

        assert!(matches!(err, TransportError::Status { .. }));
    }

    #[tokio::test]
    async fn test_call_does_not_retry_client_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/agent_status"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.retries = 2;
        let transport = HttpTransport::new(&config).unwrap();

        let err = transport.call("agent_status", &Params::new()).await.unwrap_err();

        assert!(matches!(err, TransportError::Status { status, .. } if status == StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_debug_output_hides_api_key() {
        let config = DialerConfig::default().with_credentials("admin", "top-secret");
        let transport = HttpTransport::new(&config).unwrap();

        let debug = format!("{transport:?}");

        assert!(debug.contains("HttpTransport"));
        assert!(!debug.contains("top-secret"));
    }
}
