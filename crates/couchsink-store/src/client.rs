//! Document store HTTP client
//!
//! Wraps `reqwest::Client` with the store's base address, the fixed
//! authorization header supplied at task start, and the configured timeouts.
//! Responses are returned whatever their status; interpreting them is left to
//! the core classifier.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use couchsink_store::client::CouchClient;
//! use reqwest::Method;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = CouchClient::new("http://localhost:5984")?
//!     .with_authorization("Basic YWRtaW46c2VjcmV0")?;
//! let url = client.url_for(&["orders", "d1"]);
//! let response = client.execute(client.request(Method::GET, url)).await?;
//! println!("{} {}", response.status, response.body);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use couchsink_core::{config::StoreConfig, domain::StoreResponse};
use reqwest::{
    header::{HeaderValue, ACCEPT, AUTHORIZATION},
    Client, Method, RequestBuilder,
};
use tracing::{debug, trace};
use url::Url;

use crate::StoreError;

/// Default whole-request timeout when none is configured
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout when none is configured
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the document store
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct CouchClient {
    /// The underlying HTTP client
    client: Client,
    /// Base address of the store
    base_url: Url,
    /// Fixed `Authorization` header value, if credentials are configured
    authorization: Option<HeaderValue>,
}

impl CouchClient {
    /// Creates a client for the store at `base_url` with default timeouts
    ///
    /// # Errors
    /// Returns an error if the URL cannot be parsed or the HTTP client cannot
    /// be built
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        Self::with_timeouts(base_url, DEFAULT_REQUEST_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Creates a client with explicit request and connect timeouts
    ///
    /// # Errors
    /// Returns an error if the URL cannot be parsed or the HTTP client cannot
    /// be built
    pub fn with_timeouts(
        base_url: &str,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            authorization: None,
        })
    }

    /// Creates a client from the `store` configuration section
    ///
    /// # Errors
    /// Returns an error if the URL or the credentials are unusable
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Self::with_timeouts(
            &config.url,
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )?;

        match config.basic_auth() {
            Some(auth) => client.with_authorization(auth),
            None => Ok(client),
        }
    }

    /// Sets the `Authorization` header value sent with every request
    ///
    /// # Errors
    /// Returns an error if the value is not a valid header value
    pub fn with_authorization(mut self, value: impl AsRef<str>) -> Result<Self, StoreError> {
        let mut header = HeaderValue::from_str(value.as_ref())
            .map_err(|e| StoreError::InvalidAuthorization(e.to_string()))?;
        header.set_sensitive(true);
        self.authorization = Some(header);
        Ok(self)
    }

    /// Returns true if requests carry an `Authorization` header
    pub fn has_authorization(&self) -> bool {
        self.authorization.is_some()
    }

    /// Returns the base address of the store
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds a URL by appending percent-encoded path segments to the base
    ///
    /// Each segment is encoded on its own, so a database name such as
    /// `crm/customers` becomes the single segment `crm%2Fcustomers`.
    pub fn url_for(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Creates an authenticated request builder for the given method and URL
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");

        match &self.authorization {
            Some(auth) => builder.header(AUTHORIZATION, auth.clone()),
            None => builder,
        }
    }

    /// Sends a request and captures status, reason phrase and body
    ///
    /// Non-success statuses are returned as ordinary responses.
    ///
    /// # Errors
    /// Returns an error only when no response was received (connection
    /// failure, timeout) or the body could not be read
    pub async fn execute(&self, builder: RequestBuilder) -> Result<StoreResponse, StoreError> {
        let response = builder.send().await?;

        let status = response.status();
        let status_message = status.canonical_reason().unwrap_or_default().to_string();
        let url = response.url().clone();
        let body = response.text().await?;

        debug!(
            url = %redact(&url),
            status = status.as_u16(),
            body_len = body.len(),
            "Store responded"
        );
        trace!(body = %body, "Store response body");

        Ok(StoreResponse::new(status.as_u16(), status_message, body))
    }
}

/// Parses and normalizes the base address
fn parse_base_url(raw: &str) -> Result<Url, StoreError> {
    let url = Url::parse(raw).map_err(|e| StoreError::InvalidUrl(format!("{raw}: {e}")))?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(StoreError::InvalidUrl(format!(
            "{raw}: expected an http(s) base address"
        )));
    }

    Ok(url)
}

/// Strips userinfo from a URL before logging it
fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    let _ = shown.set_password(None);
    let _ = shown.set_username("");
    shown.to_string()
}
