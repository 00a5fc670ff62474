//! Platform-agnostic types for GPS position samples and routes.
//!
//! This crate provides the shared data model used by the tracking client
//! (geotrail-core), the storage layer (geotrail-store) and the HTTP backend
//! (geotrail-service).
//!
//! # Features
//!
//! - [`PositionSample`]: one coordinate reading with its capture time
//! - [`Route`]: the ordered samples for one owner on one calendar date
//! - [`RouteDate`]: a strict `YYYY-MM-DD` calendar date
//! - Acknowledgment and listing bodies exchanged with the backend
//!
//! # Example
//!
//! ```
//! use geotrail_types::{PositionSample, Route, RouteDate};
//!
//! let date: RouteDate = "2025-01-31".parse().unwrap();
//! let route = Route::new("1", date, vec![PositionSample::now(25.0479, 121.5171)]);
//! assert_eq!(route.len(), 1);
//! ```

pub mod error;
pub mod types;
pub mod wire;

pub use error::{ParseError, ParseResult};
pub use types::{PositionSample, Route, RouteDate, parse_timestamp, validate_owner};
pub use wire::{
    DeleteAck, ErrorBody, LocationAck, LocationDeleteAck, LocationList, LocationRecord, UploadAck,
};
