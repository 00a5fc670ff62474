//! Data models for stored data.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use geotrail_types::{LocationRecord, PositionSample, Route, RouteDate};

/// A route stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRoute {
    /// Database row ID.
    pub id: i64,
    /// Owner identifier.
    pub owner: String,
    /// Route date.
    pub date: RouteDate,
    /// Points in capture order.
    pub points: Vec<PositionSample>,
    /// When the route was first uploaded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the route was last replaced.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl StoredRoute {
    /// Convert into the wire-level route.
    pub fn into_route(self) -> Route {
        Route::new(self.owner, self.date, self.points)
    }
}

impl From<StoredRoute> for Route {
    fn from(stored: StoredRoute) -> Self {
        stored.into_route()
    }
}

/// Result of storing a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Database row ID of the route.
    pub route_id: i64,
    /// Number of points now stored for the route.
    pub point_count: usize,
    /// Whether an existing route for the same key was replaced.
    pub replaced: bool,
}

/// A single position fix stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLocation {
    /// Database row ID.
    pub id: i64,
    /// Owner identifier.
    pub owner: String,
    /// The fix itself.
    pub sample: PositionSample,
    /// When the server stored the fix.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

impl StoredLocation {
    /// Convert into the wire-level record.
    pub fn to_record(&self) -> LocationRecord {
        LocationRecord {
            id: self.id,
            sample: self.sample,
        }
    }
}
