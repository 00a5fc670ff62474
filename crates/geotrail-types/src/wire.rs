//! Request and response bodies shared by the route backend and its clients.
//!
//! Routes and samples themselves serialize directly (see [`crate::Route`] and
//! [`crate::PositionSample`]); this module holds the acknowledgments and
//! listings that wrap them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{PositionSample, RouteDate};

/// Acknowledgment of a successful route upload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UploadAck {
    /// Human-readable status message.
    pub message: String,
    /// Owner the route was stored under.
    pub user_id: String,
    /// Date the route was stored under.
    pub date: RouteDate,
    /// Number of points stored.
    pub point_count: usize,
    /// Whether an existing route for the same key was replaced.
    #[cfg_attr(feature = "serde", serde(default))]
    pub replaced: bool,
}

/// Acknowledgment of a route deletion.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeleteAck {
    /// Human-readable status message.
    pub message: String,
    /// Owner of the deleted route.
    pub user_id: String,
    /// Date of the deleted route.
    pub date: RouteDate,
    /// Number of points removed with the route.
    #[cfg_attr(feature = "serde", serde(default))]
    pub deleted_points: usize,
}

/// A single stored position fix.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocationRecord {
    /// Backend-assigned identifier.
    pub id: i64,
    /// The recorded sample.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub sample: PositionSample,
}

/// Acknowledgment of a single recorded position fix.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocationAck {
    /// Human-readable status message.
    pub message: String,
    /// Owner the fix was recorded for.
    pub user_id: String,
    /// The stored record.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub record: LocationRecord,
}

/// A listing of stored position fixes.
///
/// Range listings are newest first. A single-day listing carries `date` and
/// is in capture order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocationList {
    /// Owner the fixes belong to.
    pub user_id: String,
    /// The day listed, for single-day listings.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub date: Option<RouteDate>,
    /// Number of fixes returned.
    pub total_locations: usize,
    /// The fixes.
    pub locations: Vec<LocationRecord>,
}

/// Acknowledgment of a bulk deletion of position fixes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocationDeleteAck {
    /// Human-readable status message.
    pub message: String,
    /// Owner whose fixes were deleted.
    pub user_id: String,
    /// Number of fixes removed.
    pub deleted_count: usize,
}

/// Error body returned with every non-2xx backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ErrorBody {
    /// Description of what went wrong.
    pub detail: String,
}
