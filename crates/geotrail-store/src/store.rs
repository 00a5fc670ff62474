//! Main store implementation.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info};

use geotrail_types::{PositionSample, Route, RouteDate};

use crate::error::{Error, Result};
use crate::models::{StoredLocation, StoredRoute, UpsertOutcome};
use crate::queries::LocationQuery;
use crate::schema;

/// SQLite-based store for routes and single position fixes.
pub struct Store {
    conn: Connection,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.conn.path())
            .finish()
    }
}

/// Unix seconds, nanosecond remainder and the UTC offset in seconds.
fn split_timestamp(ts: OffsetDateTime) -> (i64, i64, i32) {
    (
        ts.unix_timestamp(),
        i64::from(ts.nanosecond()),
        ts.offset().whole_seconds(),
    )
}

fn join_timestamp(secs: i64, nanos: i64, offset: i32) -> Result<OffsetDateTime> {
    let invalid = |e: &dyn std::fmt::Display| {
        Error::InvalidTimestamp(format!("{secs}.{nanos:09}{offset:+}s: {e}"))
    };
    let total = i128::from(secs) * 1_000_000_000 + i128::from(nanos);
    let utc = OffsetDateTime::from_unix_timestamp_nanos(total).map_err(|e| invalid(&e))?;
    let offset = UtcOffset::from_whole_seconds(offset).map_err(|e| invalid(&e))?;
    utc.checked_to_offset(offset)
        .ok_or_else(|| invalid(&"out of range"))
}

fn unix_to_datetime(secs: i64) -> Result<OffsetDateTime> {
    join_timestamp(secs, 0, 0)
}

/// Raw route row before its points are loaded.
struct RouteRow {
    id: i64,
    owner: String,
    date: String,
    created_at: i64,
    updated_at: i64,
}

impl RouteRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            date: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    // === Route operations ===

    /// Store a route, replacing any route already stored for the same
    /// `(owner, date)` key. The replacement is atomic.
    pub fn upsert_route(&self, route: &Route) -> Result<UpsertOutcome> {
        let date = route.date.to_string();
        let now = OffsetDateTime::now_utc().unix_timestamp();

        let tx = self.conn.unchecked_transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM routes WHERE owner = ?1 AND date = ?2",
                params![route.owner, date],
                |row| row.get(0),
            )
            .optional()?;

        let route_id = match existing {
            Some(id) => {
                tx.execute("DELETE FROM route_points WHERE route_id = ?1", [id])?;
                tx.execute(
                    "UPDATE routes SET updated_at = ?2 WHERE id = ?1",
                    params![id, now],
                )?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO routes (owner, date, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?3)",
                    params![route.owner, date, now],
                )?;
                tx.last_insert_rowid()
            }
        };

        {
            let mut stmt = tx.prepare(
                "INSERT INTO route_points
                    (route_id, seq, latitude, longitude, captured_at, captured_nanos,
                     captured_offset)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (seq, point) in route.points.iter().enumerate() {
                let (secs, nanos, offset) = split_timestamp(point.captured_at);
                stmt.execute(params![
                    route_id,
                    seq as i64,
                    point.latitude,
                    point.longitude,
                    secs,
                    nanos,
                    offset
                ])?;
            }
        }

        tx.commit()?;

        let replaced = existing.is_some();
        debug!(
            "Stored route {} for {} on {} ({} points, replaced: {})",
            route_id,
            route.owner,
            date,
            route.len(),
            replaced
        );

        Ok(UpsertOutcome {
            route_id,
            point_count: route.len(),
            replaced,
        })
    }

    /// Get the route stored for `(owner, date)`.
    pub fn get_route(&self, owner: &str, date: RouteDate) -> Result<Option<StoredRoute>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, owner, date, created_at, updated_at
                 FROM routes WHERE owner = ?1 AND date = ?2",
                params![owner, date.to_string()],
                RouteRow::from_row,
            )
            .optional()?;

        row.map(|row| self.load_route(row)).transpose()
    }

    /// The owner's most recent routes, newest date first.
    pub fn route_history(&self, owner: &str, limit: u32) -> Result<Vec<StoredRoute>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, date, created_at, updated_at
             FROM routes WHERE owner = ?1 ORDER BY date DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![owner, limit], RouteRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(|row| self.load_route(row)).collect()
    }

    /// Delete the route stored for `(owner, date)`.
    ///
    /// Returns the number of points removed, or `None` if nothing was stored.
    pub fn delete_route(&self, owner: &str, date: RouteDate) -> Result<Option<usize>> {
        let tx = self.conn.unchecked_transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM routes WHERE owner = ?1 AND date = ?2",
                params![owner, date.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(route_id) = existing else {
            return Ok(None);
        };

        let points = tx.execute("DELETE FROM route_points WHERE route_id = ?1", [route_id])?;
        tx.execute("DELETE FROM routes WHERE id = ?1", [route_id])?;
        tx.commit()?;

        debug!("Deleted route {} for {} on {}", route_id, owner, date);
        Ok(Some(points))
    }

    /// Count stored routes, optionally for one owner.
    pub fn count_routes(&self, owner: Option<&str>) -> Result<u64> {
        let count: i64 = match owner {
            Some(owner) => self.conn.query_row(
                "SELECT COUNT(*) FROM routes WHERE owner = ?1",
                [owner],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM routes", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }

    fn load_route(&self, row: RouteRow) -> Result<StoredRoute> {
        let mut stmt = self.conn.prepare(
            "SELECT latitude, longitude, captured_at, captured_nanos, captured_offset
             FROM route_points WHERE route_id = ?1 ORDER BY seq",
        )?;
        let raw = stmt
            .query_map([row.id], |r| {
                Ok((
                    r.get::<_, f64>(0)?,
                    r.get::<_, f64>(1)?,
                    r.get::<_, i64>(2)?,
                    r.get::<_, i64>(3)?,
                    r.get::<_, i32>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let points = raw
            .into_iter()
            .map(|(lat, lng, secs, nanos, offset)| {
                Ok(PositionSample::new(
                    lat,
                    lng,
                    join_timestamp(secs, nanos, offset)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(StoredRoute {
            id: row.id,
            date: row.date.parse()?,
            owner: row.owner,
            points,
            created_at: unix_to_datetime(row.created_at)?,
            updated_at: unix_to_datetime(row.updated_at)?,
        })
    }

    // === Single fix operations ===

    /// Record a single position fix.
    pub fn insert_location(&self, owner: &str, sample: &PositionSample) -> Result<StoredLocation> {
        let recorded_at = OffsetDateTime::now_utc();
        let (secs, nanos, offset) = split_timestamp(sample.captured_at);

        self.conn.execute(
            "INSERT INTO locations
                (owner, latitude, longitude, captured_at, captured_nanos, captured_offset,
                 recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                owner,
                sample.latitude,
                sample.longitude,
                secs,
                nanos,
                offset,
                recorded_at.unix_timestamp()
            ],
        )?;

        Ok(StoredLocation {
            id: self.conn.last_insert_rowid(),
            owner: owner.to_string(),
            sample: *sample,
            recorded_at: unix_to_datetime(recorded_at.unix_timestamp())?,
        })
    }

    /// Query stored fixes.
    pub fn query_locations(&self, query: &LocationQuery) -> Result<Vec<StoredLocation>> {
        let sql = query.build_sql();
        let (_, params) = query.build_where();

        debug!("Executing query: {}", sql);

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params_ref.as_slice(), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i32>(6)?,
                    row.get::<_, i64>(7)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(id, owner, lat, lng, secs, nanos, offset, recorded)| {
                Ok(StoredLocation {
                    id,
                    owner,
                    sample: PositionSample::new(lat, lng, join_timestamp(secs, nanos, offset)?),
                    recorded_at: unix_to_datetime(recorded)?,
                })
            })
            .collect()
    }

    /// Delete the fixes matching `query`'s owner and time range.
    ///
    /// Ordering and limit are ignored. Returns the number of fixes removed.
    pub fn delete_locations(&self, query: &LocationQuery) -> Result<usize> {
        let (where_clause, params) = query.build_where();
        let sql = format!("DELETE FROM locations {}", where_clause);

        debug!("Executing delete: {}", sql);

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let deleted = self.conn.execute(&sql, params_ref.as_slice())?;
        Ok(deleted)
    }

    /// Count stored fixes, optionally for one owner.
    pub fn count_locations(&self, owner: Option<&str>) -> Result<u64> {
        let count: i64 = match owner {
            Some(owner) => self.conn.query_row(
                "SELECT COUNT(*) FROM locations WHERE owner = ?1",
                [owner],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM locations", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }
}
