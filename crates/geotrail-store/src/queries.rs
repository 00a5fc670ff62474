//! Query builder for single position fixes.
//!
//! # Example
//!
//! ```
//! use geotrail_store::{LocationQuery, Store};
//! use time::{Duration, OffsetDateTime};
//!
//! let store = Store::open_in_memory()?;
//! let yesterday = OffsetDateTime::now_utc() - Duration::hours(24);
//!
//! let query = LocationQuery::new()
//!     .owner("1")
//!     .since(yesterday)
//!     .limit(50);
//!
//! let fixes = store.query_locations(&query)?;
//! assert!(fixes.is_empty());
//! # Ok::<(), geotrail_store::Error>(())
//! ```

use time::OffsetDateTime;

/// Fluent query builder for stored position fixes.
///
/// By default, queries return results ordered by capture time descending
/// (newest first).
#[derive(Debug, Default, Clone)]
pub struct LocationQuery {
    /// Filter by owner.
    pub owner: Option<String>,
    /// Only fixes captured at or after this time.
    pub since: Option<OffsetDateTime>,
    /// Only fixes captured at or before this time.
    pub until: Option<OffsetDateTime>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Order by capture time descending (newest first).
    pub newest_first: bool,
}

impl LocationQuery {
    /// Create a new query: all owners, no time range, no limit, newest first.
    pub fn new() -> Self {
        Self {
            newest_first: true,
            ..Default::default()
        }
    }

    /// Filter by owner.
    pub fn owner(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    /// Filter to fixes captured at or after this time.
    pub fn since(mut self, time: OffsetDateTime) -> Self {
        self.since = Some(time);
        self
    }

    /// Filter to fixes captured at or before this time.
    pub fn until(mut self, time: OffsetDateTime) -> Self {
        self.until = Some(time);
        self
    }

    /// Limit the number of results.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Order results oldest first.
    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }

    pub(crate) fn build_where(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref owner) = self.owner {
            conditions.push("owner = ?");
            params.push(Box::new(owner.clone()));
        }

        if let Some(since) = self.since {
            conditions.push("captured_at >= ?");
            params.push(Box::new(since.unix_timestamp()));
        }

        if let Some(until) = self.until {
            conditions.push("captured_at <= ?");
            params.push(Box::new(until.unix_timestamp()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    pub(crate) fn build_sql(&self) -> String {
        let (where_clause, _) = self.build_where();
        let order = if self.newest_first { "DESC" } else { "ASC" };

        let mut sql = format!(
            "SELECT id, owner, latitude, longitude, captured_at, captured_nanos, captured_offset, \
             recorded_at \
             FROM locations {} ORDER BY captured_at {order}, captured_nanos {order}, id {order}",
            where_clause
        );

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        sql
    }
}
