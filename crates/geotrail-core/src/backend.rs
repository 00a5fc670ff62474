//! The route backend abstraction.
//!
//! A [`RouteBackend`] stores routes keyed by `(owner, date)`. Every call is a
//! single request/response with no intermediate state and no retries; callers
//! that need bounded latency wrap calls in their own deadline.

use std::sync::Arc;

use async_trait::async_trait;

use geotrail_types::{DeleteAck, Route, RouteDate, UploadAck};

use crate::error::Result;

/// Remote (or in-memory) storage for routes.
///
/// Implemented by [`RouteClient`](crate::RouteClient) for the HTTP service and
/// by [`MockBackend`](crate::MockBackend) for tests.
#[async_trait]
pub trait RouteBackend: Send + Sync {
    /// Store a route. Uploading to an existing `(owner, date)` key replaces
    /// the stored points; the ack reports `replaced: true` in that case.
    async fn upload(&self, route: &Route) -> Result<UploadAck>;

    /// Fetch the route stored for `(owner, date)`.
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) when nothing is stored.
    async fn fetch(&self, owner: &str, date: RouteDate) -> Result<Route>;

    /// Fetch up to `limit` of the owner's most recent routes, newest first.
    async fn fetch_history(&self, owner: &str, limit: u32) -> Result<Vec<Route>>;

    /// Delete the route stored for `(owner, date)`.
    async fn delete(&self, owner: &str, date: RouteDate) -> Result<DeleteAck>;
}

#[async_trait]
impl<T: RouteBackend + ?Sized> RouteBackend for Arc<T> {
    async fn upload(&self, route: &Route) -> Result<UploadAck> {
        (**self).upload(route).await
    }

    async fn fetch(&self, owner: &str, date: RouteDate) -> Result<Route> {
        (**self).fetch(owner, date).await
    }

    async fn fetch_history(&self, owner: &str, limit: u32) -> Result<Vec<Route>> {
        (**self).fetch_history(owner, limit).await
    }

    async fn delete(&self, owner: &str, date: RouteDate) -> Result<DeleteAck> {
        (**self).delete(owner, date).await
    }
}
