//! Error types for data parsing and validation in geotrail-types.

use thiserror::Error;

/// Errors that can occur when parsing or validating route data.
///
/// This error type is transport-agnostic; network and storage errors
/// belong in the crates that perform I/O.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A calendar date was not in `YYYY-MM-DD` form.
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A timestamp was not valid RFC 3339 / ISO-8601.
    #[error("invalid timestamp '{0}': expected RFC 3339")]
    InvalidTimestamp(String),

    /// Latitude outside [-90, 90] or not finite.
    #[error("latitude {0} out of range: must be between -90 and 90")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180] or not finite.
    #[error("longitude {0} out of range: must be between -180 and 180")]
    LongitudeOutOfRange(f64),

    /// Owner identifier is empty or contains characters that cannot be used in a URL path.
    #[error("invalid owner '{0}': {1}")]
    InvalidOwner(String, &'static str),

    /// A route had no points.
    #[error("route contains no points")]
    EmptyRoute,

    /// A route exceeded the configured point limit.
    #[error("route has {count} points, at most {max} are allowed")]
    TooManyPoints {
        /// Number of points received.
        count: usize,
        /// Configured maximum.
        max: usize,
    },
}

/// Result type alias using geotrail-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
