//! OpenDaylight RESTCONF client.
//!
//! A thin wrapper around `reqwest` that knows the controller base URL from the
//! data source settings and fetches JSON documents relative to it:
//!
//! - Validating `baseUrl` (http/https scheme and a host)
//! - Building requests with consistent `Accept` and `User-Agent` headers
//! - Turning non-2xx responses and malformed bodies into [`FetchError`]
//!
//! Requests are never retried here; a failed fetch is reported once and the
//! caller decides what to do with it.
//!
//! # Example
//!
//! ```ignore
//! use odl_api::OdlClient;
//! use odl_types::DataSourceSettings;
//!
//! let client = OdlClient::new(&DataSourceSettings::default())?;
//! let document = client.get_json("/rests/data/network-topology:network-topology").await?;
//! println!("{}", document);
//! ```

use std::env;
use std::time::Duration;

use odl_types::DataSourceSettings;
use odl_util::http::{JsonParseError, join_url, parse_response_json_strict, response_preview, status_error_message};
use odl_util::redact_sensitive;
use reqwest::{Client, Method, RequestBuilder, header};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Upper bound for a whole request, body included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures of the document fetch step. None of them are retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}{}: {body_preview}", .hint.as_deref().map(|h| format!(" ({h})")).unwrap_or_default())]
    Status {
        url: String,
        status: u16,
        hint: Option<String>,
        body_preview: String,
    },

    #[error(transparent)]
    Parse(#[from] JsonParseError),

    /// Failure of a non-HTTP document source (files, fixtures).
    #[error("document source error: {0}")]
    Source(String),
}

#[derive(Debug, Clone)]
/// Configured `reqwest::Client` bound to one controller.
pub struct OdlClient {
    base_url: String,
    http: Client,
    user_agent: String,
}

impl OdlClient {
    /// Build a client for the controller named in `settings`.
    pub fn new(settings: &DataSourceSettings) -> Result<Self, FetchError> {
        Self::with_timeout(settings, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(settings: &DataSourceSettings, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = validate_base_url(&settings.base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            http,
            user_agent: format!("odl-datasource/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a controller-relative URI.
    pub fn url_for(&self, uri: &str) -> String {
        join_url(&self.base_url, uri)
    }

    /// Build a request for a method and controller-relative URI.
    pub fn request(&self, method: Method, uri: &str) -> RequestBuilder {
        let url = self.url_for(uri);
        debug!(url = %redact_sensitive(&url), %method, "building request");
        self.http.request(method, url).header(header::USER_AGENT, &self.user_agent)
    }

    /// `GET {baseUrl}{uri}` and parse the body as JSON.
    pub async fn get_json(&self, uri: &str) -> Result<Value, FetchError> {
        let url = self.url_for(uri);
        let response = self
            .request(Method::GET, uri)
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: redact_sensitive(&url),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| FetchError::Network {
            url: redact_sensitive(&url),
            source,
        })?;
        debug!(status = status.as_u16(), bytes = body.len(), "controller response received");

        if !status.is_success() {
            return Err(FetchError::Status {
                url: redact_sensitive(&url),
                status: status.as_u16(),
                hint: status_error_message(status.as_u16()),
                body_preview: response_preview(&body),
            });
        }

        Ok(parse_response_json_strict(&body, Some(status))?)
    }
}

/// Validate that a base URL is usable: http or https, with a host.
pub fn validate_base_url(base: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidBaseUrl {
        url: redact_sensitive(base),
        reason,
    };

    let trimmed = base.trim();
    if trimmed.is_empty() {
        return Err(invalid("baseUrl is empty".to_string()));
    }
    let parsed = Url::parse(trimmed).map_err(|error| invalid(error.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}://'; expected http or https", parsed.scheme())));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("baseUrl must include a host".to_string()));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("baseUrl must not carry a query string or fragment".to_string()));
    }

    Ok(parsed)
}
