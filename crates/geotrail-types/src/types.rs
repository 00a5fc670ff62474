//! Core types for position samples and routes.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, Time};

use crate::error::{ParseError, ParseResult};

/// Mean Earth radius in meters, used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Maximum length of an owner identifier.
pub const MAX_OWNER_LEN: usize = 128;

/// One geographic coordinate reading with a capture timestamp.
///
/// On the wire a sample is `{ "lat": f64, "lng": f64, "ts": "<RFC 3339>" }`.
/// Samples are immutable once created; range checks are available through
/// [`PositionSample::validate`] but are not enforced on construction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PositionSample {
    /// Latitude in decimal degrees.
    #[cfg_attr(feature = "serde", serde(rename = "lat"))]
    pub latitude: f64,
    /// Longitude in decimal degrees.
    #[cfg_attr(feature = "serde", serde(rename = "lng"))]
    pub longitude: f64,
    /// When the fix was captured.
    #[cfg_attr(feature = "serde", serde(rename = "ts", with = "time::serde::rfc3339"))]
    pub captured_at: OffsetDateTime,
}

impl PositionSample {
    /// Create a sample from raw coordinates and a capture time.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, captured_at: OffsetDateTime) -> Self {
        Self {
            latitude,
            longitude,
            captured_at,
        }
    }

    /// Create a sample captured now (UTC).
    #[must_use]
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, OffsetDateTime::now_utc())
    }

    /// Check that both coordinates are finite and within range.
    ///
    /// # Examples
    ///
    /// ```
    /// use geotrail_types::PositionSample;
    ///
    /// assert!(PositionSample::now(25.0479, 121.5171).validate().is_ok());
    /// assert!(PositionSample::now(91.0, 0.0).validate().is_err());
    /// ```
    pub fn validate(&self) -> ParseResult<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ParseError::LatitudeOutOfRange(self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ParseError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }

    /// Great-circle distance to another sample in meters (haversine).
    #[must_use]
    pub fn distance_to(&self, other: &PositionSample) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    /// Format the capture time as RFC 3339.
    pub fn timestamp_rfc3339(&self) -> ParseResult<String> {
        self.captured_at
            .format(&Rfc3339)
            .map_err(|e| ParseError::InvalidTimestamp(e.to_string()))
    }
}

/// Parse an RFC 3339 timestamp such as `2025-01-31T08:30:00.000Z`.
pub fn parse_timestamp(s: &str) -> ParseResult<OffsetDateTime> {
    OffsetDateTime::parse(s, &Rfc3339).map_err(|_| ParseError::InvalidTimestamp(s.to_string()))
}

/// A calendar date keying a route, formatted as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteDate(Date);

impl RouteDate {
    /// Wrap a [`time::Date`].
    #[must_use]
    pub const fn new(date: Date) -> Self {
        Self(date)
    }

    /// Today's date in UTC.
    #[must_use]
    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    /// The UTC calendar date a timestamp falls on.
    #[must_use]
    pub fn of(timestamp: OffsetDateTime) -> Self {
        Self(timestamp.to_offset(time::UtcOffset::UTC).date())
    }

    /// The wrapped date.
    #[must_use]
    pub const fn as_date(&self) -> Date {
        self.0
    }

    /// Midnight UTC at the start of this date.
    #[must_use]
    pub fn start_of_day(&self) -> OffsetDateTime {
        self.0.with_time(Time::MIDNIGHT).assume_utc()
    }

    /// The last representable instant of this date in UTC.
    #[must_use]
    pub fn end_of_day(&self) -> OffsetDateTime {
        self.start_of_day() + Duration::DAY - Duration::NANOSECOND
    }
}

impl From<Date> for RouteDate {
    fn from(date: Date) -> Self {
        Self(date)
    }
}

impl FromStr for RouteDate {
    type Err = ParseError;

    /// Parse a strict `YYYY-MM-DD` date.
    ///
    /// ```
    /// use geotrail_types::RouteDate;
    ///
    /// let date: RouteDate = "2025-01-31".parse().unwrap();
    /// assert_eq!(date.to_string(), "2025-01-31");
    /// assert!("31/01/2025".parse::<RouteDate>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = format_description!("[year]-[month]-[day]");
        Date::parse(s.trim(), &format)
            .map(Self)
            .map_err(|_| ParseError::InvalidDate(s.to_string()))
    }
}

impl fmt::Display for RouteDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

#[cfg(feature = "serde")]
impl Serialize for RouteDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for RouteDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Check that an owner identifier is usable as a route key and URL path segment.
pub fn validate_owner(owner: &str) -> ParseResult<()> {
    if owner.trim().is_empty() {
        return Err(ParseError::InvalidOwner(owner.to_string(), "must not be empty"));
    }
    if owner.len() > MAX_OWNER_LEN {
        return Err(ParseError::InvalidOwner(owner.to_string(), "too long"));
    }
    if owner.chars().any(|c| c == '/' || c == '?' || c == '#' || c.is_control()) {
        return Err(ParseError::InvalidOwner(
            owner.to_string(),
            "contains reserved characters",
        ));
    }
    Ok(())
}

/// The full ordered sequence of samples for one owner on one calendar date.
///
/// On the wire a route is `{ "user_id", "date", "route": [sample, ...] }`.
/// Insertion order is capture order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Route {
    /// Owner identifier.
    #[cfg_attr(feature = "serde", serde(rename = "user_id"))]
    pub owner: String,
    /// Calendar date the route belongs to.
    pub date: RouteDate,
    /// Samples in capture order.
    #[cfg_attr(feature = "serde", serde(rename = "route"))]
    pub points: Vec<PositionSample>,
}

impl Route {
    /// Create a route.
    #[must_use]
    pub fn new(owner: impl Into<String>, date: RouteDate, points: Vec<PositionSample>) -> Self {
        Self {
            owner: owner.into(),
            date,
            points,
        }
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the route has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Validate the owner, the point count and every point.
    pub fn validate(&self, max_points: usize) -> ParseResult<()> {
        validate_owner(&self.owner)?;
        if self.points.is_empty() {
            return Err(ParseError::EmptyRoute);
        }
        if self.points.len() > max_points {
            return Err(ParseError::TooManyPoints {
                count: self.points.len(),
                max: max_points,
            });
        }
        self.points.iter().try_for_each(PositionSample::validate)
    }

    /// Total path length in meters.
    #[must_use]
    pub fn distance_meters(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum()
    }

    /// Time between the first and last sample, if there are at least two.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if self.points.len() > 1 => {
                Some(last.captured_at - first.captured_at)
            }
            _ => None,
        }
    }
}
