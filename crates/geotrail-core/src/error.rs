//! Error types for geotrail-core.
//!
//! Two layers of errors exist:
//!
//! - [`PositionError`] describes why a position source could not produce a
//!   fix. During an active tracking session these are reported to error
//!   observers and tracking continues; a single failed fix is skipped.
//! - [`Error`] is returned by operations the caller invokes directly
//!   (single-shot fixes, uploads, backend queries).
//!
//! # Recovery
//!
//! | Error | Recovery |
//! |-------|----------|
//! | [`Error::Position`] with [`PositionError::PermissionDenied`] | Ask the user to grant location access |
//! | [`Error::Position`] with `Unavailable` / `Timeout` | Try again later |
//! | [`Error::EmptyRoute`] | Nothing to upload; no request was made |
//! | [`Error::Network`] | Check connectivity and retry manually |
//! | [`Error::BackendRejected`] | Fix the request; the detail explains why |
//! | [`Error::NotFound`] | No route stored for that owner and date |
//!
//! Uploads are never retried automatically. A failed upload leaves the
//! session's points untouched so the caller can retry.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use geotrail_types::{ParseError, RouteDate};

/// Boxed transport error kept as the source of [`Error::Network`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification of position source failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionErrorKind {
    /// The user or platform denied location access.
    PermissionDenied,
    /// The source could not determine a position.
    Unavailable,
    /// No fix arrived within the allowed time.
    Timeout,
    /// Anything the source could not classify.
    Unknown,
}

/// Why a position source failed to produce a sample.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PositionError {
    /// Location access was denied.
    #[error("location permission denied")]
    PermissionDenied,

    /// The source could not produce a position.
    #[error("position unavailable: {0}")]
    Unavailable(String),

    /// No fix within the allowed time.
    #[error("position request timed out after {0:?}")]
    Timeout(Duration),

    /// Unclassified source failure.
    #[error("unknown position error: {0}")]
    Unknown(String),
}

impl PositionError {
    /// Create an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// The coarse classification of this error.
    #[must_use]
    pub fn kind(&self) -> PositionErrorKind {
        match self {
            Self::PermissionDenied => PositionErrorKind::PermissionDenied,
            Self::Unavailable(_) => PositionErrorKind::Unavailable,
            Self::Timeout(_) => PositionErrorKind::Timeout,
            Self::Unknown(_) => PositionErrorKind::Unknown,
        }
    }

    /// A message suitable for showing to the person holding the device.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "location permission denied; allow location access and try again"
            }
            Self::Unavailable(_) => {
                "location is unavailable; check that location services are enabled"
            }
            Self::Timeout(_) => "timed out waiting for a location fix; try again",
            Self::Unknown(_) => "an unknown error occurred while getting the location",
        }
    }
}

/// Errors returned by tracking sessions and route backends.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The position source could not produce a sample.
    #[error(transparent)]
    Position(#[from] PositionError),

    /// Upload attempted with zero points. No request was made.
    #[error("route is empty: nothing to upload")]
    EmptyRoute,

    /// Transport-level failure talking to the backend.
    #[error("backend not reachable at {url}: {source}")]
    Network {
        /// The URL being requested.
        url: String,
        /// The underlying transport error.
        #[source]
        source: BoxError,
    },

    /// The backend answered with a non-2xx status.
    #[error("backend rejected request ({status}): {detail}")]
    BackendRejected {
        /// HTTP status code.
        status: u16,
        /// The backend's `detail` message.
        detail: String,
    },

    /// No route stored for the requested key.
    #[error("no route stored for owner '{owner}' on {date}")]
    NotFound {
        /// Owner identifier.
        owner: String,
        /// Route date.
        date: RouteDate,
    },

    /// The backend answered 2xx with a body that could not be understood.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    /// Route data failed validation.
    #[error("invalid data: {0}")]
    InvalidData(#[from] ParseError),

    /// Invalid configuration provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a network error.
    pub fn network(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Network {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Create a backend rejection.
    pub fn rejected(status: u16, detail: impl Into<String>) -> Self {
        Self::BackendRejected {
            status,
            detail: detail.into(),
        }
    }

    /// Create a not-found error for a route key.
    pub fn not_found(owner: impl Into<String>, date: RouteDate) -> Self {
        Self::NotFound {
            owner: owner.into(),
            date,
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Whether this is the not-found kind.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias using geotrail-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::EmptyRoute.to_string(), "route is empty: nothing to upload");

        let err = Error::rejected(400, "route contains no points");
        assert_eq!(
            err.to_string(),
            "backend rejected request (400): route contains no points"
        );

        let date: RouteDate = "2025-01-31".parse().unwrap();
        let err = Error::not_found("1", date);
        assert!(err.is_not_found());
        assert!(err.to_string().contains("2025-01-31"));

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::network("http://localhost:8000/gps/upload", io);
        assert!(err.to_string().contains("localhost:8000"));
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_position_error_is_transparent() {
        let err: Error = PositionError::PermissionDenied.into();
        assert_eq!(err.to_string(), "location permission denied");
    }

    #[test]
    fn test_position_error_kinds() {
        assert_eq!(
            PositionError::PermissionDenied.kind(),
            PositionErrorKind::PermissionDenied
        );
        assert_eq!(
            PositionError::unavailable("no signal").kind(),
            PositionErrorKind::Unavailable
        );
        assert_eq!(
            PositionError::Timeout(Duration::from_secs(10)).kind(),
            PositionErrorKind::Timeout
        );
        assert_eq!(
            PositionError::Unknown("?".into()).kind(),
            PositionErrorKind::Unknown
        );
    }

    #[test]
    fn test_user_messages_are_actionable() {
        assert!(
            PositionError::PermissionDenied
                .user_message()
                .contains("location permission denied")
        );
        assert!(
            PositionError::Timeout(Duration::from_secs(1))
                .user_message()
                .contains("try again")
        );
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: Error = ParseError::EmptyRoute.into();
        assert!(matches!(err, Error::InvalidData(ParseError::EmptyRoute)));
    }
}
