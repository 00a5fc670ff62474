//! HTTP client for the geotrail-service REST API.
//!
//! [`RouteClient`] implements [`RouteBackend`] over HTTP and also exposes the
//! single-fix endpoints. Every call is one request with no retries.
//!
//! # Example
//!
//! ```no_run
//! use geotrail_core::{RouteBackend, RouteClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RouteClient::new("http://localhost:8000")?;
//!
//! let health = client.health().await?;
//! println!("service {} is {}", health.version, health.status);
//!
//! for route in client.fetch_history("1", 10).await? {
//!     println!("{}: {} points", route.date, route.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use geotrail_types::{
    DeleteAck, ErrorBody, LocationAck, LocationDeleteAck, LocationList, PositionSample, Route,
    RouteDate, UploadAck,
};

use crate::backend::RouteBackend;
use crate::error::{Error, Result};

/// Default backend address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Connection settings for [`RouteClient`].
///
/// Passed explicitly at construction; there is no process-wide default client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the service, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Settings for `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Service health response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the service answers.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Server time.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Filter for listing single position fixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationFilter {
    /// Only fixes on or after this date.
    pub start_date: Option<RouteDate>,
    /// Only fixes on or before this date.
    pub end_date: Option<RouteDate>,
    /// Maximum number of fixes (server default 1000).
    pub limit: Option<u32>,
}

impl LocationFilter {
    fn date_range(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(start) = self.start_date {
            query.push(("start_date", start.to_string()));
        }
        if let Some(end) = self.end_date {
            query.push(("end_date", end.to_string()));
        }
        query
    }
}

/// HTTP client for the route service.
#[derive(Debug, Clone)]
pub struct RouteClient {
    client: Client,
    base_url: Url,
}

impl RouteClient {
    /// Create a client for `base_url` with default settings.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(&ClientConfig::new(base_url))
    }

    /// Create a client from explicit settings.
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::invalid_config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Get the base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Check if the service is reachable.
    pub async fn is_reachable(&self) -> bool {
        self.health().await.is_ok()
    }

    /// Get service health.
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.endpoint(&["api", "health"]);
        let response = self.send(self.client.get(url.clone()), &url).await?;
        self.handle_response(response).await
    }

    /// Record a single position fix for `owner`.
    pub async fn record_location(
        &self,
        owner: &str,
        sample: &PositionSample,
    ) -> Result<LocationAck> {
        let url = self.endpoint(&["gps", "location"]);
        let request = self
            .client
            .post(url.clone())
            .query(&[("user_id", owner)])
            .json(sample);
        let response = self.send(request, &url).await?;
        self.handle_response(response).await
    }

    /// List recorded single fixes for `owner`, newest first.
    pub async fn locations(&self, owner: &str, filter: &LocationFilter) -> Result<LocationList> {
        let url = self.endpoint(&["gps", "locations", owner]);
        let mut query = filter.date_range();
        if let Some(limit) = filter.limit {
            query.push(("limit", limit.to_string()));
        }

        let response = self
            .send(self.client.get(url.clone()).query(&query), &url)
            .await?;
        self.handle_response(response).await
    }

    /// Every fix `owner` recorded on one UTC day, oldest first.
    pub async fn locations_on(&self, owner: &str, date: RouteDate) -> Result<LocationList> {
        let date_segment = date.to_string();
        let url = self.endpoint(&["gps", "locations", owner, "date", &date_segment]);
        let response = self.send(self.client.get(url.clone()), &url).await?;
        self.handle_response(response).await
    }

    /// Delete `owner`'s fixes within the filter's date range, or all of them.
    ///
    /// The filter's `limit` is ignored.
    pub async fn delete_locations(
        &self,
        owner: &str,
        filter: &LocationFilter,
    ) -> Result<LocationDeleteAck> {
        let url = self.endpoint(&["gps", "locations", owner]);
        let request = self.client.delete(url.clone()).query(&filter.date_range());
        let response = self.send(request, &url).await?;
        self.handle_response(response).await
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // parse_base_url guarantees a base that can carry path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<reqwest::Response> {
        debug!(%url, "Sending request");
        request
            .send()
            .await
            .map_err(|e| Error::network(url.as_str(), e))
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::InvalidResponse(e.to_string()))
        } else {
            Err(Error::rejected(status.as_u16(), error_detail(response).await))
        }
    }

    async fn keyed<T: DeserializeOwned>(
        &self,
        method: Method,
        owner: &str,
        date: RouteDate,
    ) -> Result<T> {
        let date_segment = date.to_string();
        let url = self.endpoint(&["gps", owner, &date_segment]);
        let response = self
            .send(self.client.request(method, url.clone()), &url)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found(owner, date));
        }
        self.handle_response(response).await
    }
}

/// Pull the service's `detail` message out of an error body.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    response
        .json::<ErrorBody>()
        .await
        .map(|body| body.detail)
        .unwrap_or_else(|_| status.to_string())
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(Error::invalid_config(format!(
            "URL must start with http:// or https://, got: {}",
            base_url
        )));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| Error::invalid_config(format!("invalid URL '{}': {}", base_url, e)))?;
    if url.cannot_be_a_base() {
        return Err(Error::invalid_config(format!(
            "URL cannot be used as a base: {}",
            base_url
        )));
    }
    Ok(url)
}

#[async_trait]
impl RouteBackend for RouteClient {
    async fn upload(&self, route: &Route) -> Result<UploadAck> {
        let url = self.endpoint(&["gps", "upload"]);
        let response = self
            .send(self.client.post(url.clone()).json(route), &url)
            .await?;
        self.handle_response(response).await
    }

    async fn fetch(&self, owner: &str, date: RouteDate) -> Result<Route> {
        self.keyed(Method::GET, owner, date).await
    }

    async fn fetch_history(&self, owner: &str, limit: u32) -> Result<Vec<Route>> {
        let url = self.endpoint(&["gps", owner, "routes"]);
        let request = self.client.get(url.clone()).query(&[("limit", limit)]);
        let response = self.send(request, &url).await?;
        self.handle_response(response).await
    }

    async fn delete(&self, owner: &str, date: RouteDate) -> Result<DeleteAck> {
        self.keyed(Method::DELETE, owner, date).await
    }
}
