//! Database schema and migrations.

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Initialize the database schema.
pub fn initialize(conn: &Connection) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version == 0 {
        create_schema_v1(conn)?;
        migrate_to_v2(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if version < SCHEMA_VERSION {
        migrate(conn, version)?;
    }

    Ok(())
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 =
        conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))?;

    Ok(version)
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
        [version],
    )?;
    Ok(())
}

/// Create the initial schema (version 1).
///
/// Timestamps are stored as unix seconds plus a nanosecond remainder so
/// they sort numerically and round-trip exactly. Dates are `YYYY-MM-DD`
/// text, which sorts chronologically.
fn create_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        -- One row per (owner, date)
        CREATE TABLE IF NOT EXISTS routes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner TEXT NOT NULL,
            date TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE(owner, date)
        );
        CREATE INDEX IF NOT EXISTS idx_routes_owner_date
            ON routes(owner, date);

        -- Points of a route in capture order
        CREATE TABLE IF NOT EXISTS route_points (
            route_id INTEGER NOT NULL REFERENCES routes(id) ON DELETE CASCADE,
            seq INTEGER NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            captured_at INTEGER NOT NULL,
            captured_nanos INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (route_id, seq)
        );

        -- Single position fixes
        CREATE TABLE IF NOT EXISTS locations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            captured_at INTEGER NOT NULL,
            captured_nanos INTEGER NOT NULL DEFAULT 0,
            recorded_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_locations_owner_time
            ON locations(owner, captured_at);
        "#,
    )?;

    Ok(())
}

/// Version 2: keep the UTC offset a timestamp was reported with.
///
/// Rows written by version 1 read back as UTC.
fn migrate_to_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        ALTER TABLE route_points ADD COLUMN captured_offset INTEGER NOT NULL DEFAULT 0;
        ALTER TABLE locations ADD COLUMN captured_offset INTEGER NOT NULL DEFAULT 0;
        "#,
    )?;
    Ok(())
}

/// Run migrations from old_version to current.
fn migrate(conn: &Connection, old_version: i32) -> Result<()> {
    if old_version < 2 {
        migrate_to_v2(conn)?;
    }
    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}
