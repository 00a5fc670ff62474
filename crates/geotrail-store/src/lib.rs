//! SQLite persistence for geotrail.
//!
//! Stores routes keyed by `(owner, date)` and single position fixes.
//!
//! # Features
//!
//! - Atomic replace-on-upload for routes
//! - Route history per owner, newest date first
//! - Single-fix log with time-range queries
//!
//! # Example
//!
//! ```no_run
//! use geotrail_store::Store;
//!
//! let store = Store::open_default()?;
//! for route in store.route_history("1", 10)? {
//!     println!("{}: {} points", route.date, route.points.len());
//! }
//! # Ok::<(), geotrail_store::Error>(())
//! ```

mod error;
mod models;
mod queries;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::{StoredLocation, StoredRoute, UpsertOutcome};
pub use queries::LocationQuery;
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/geotrail/routes.db`
/// - macOS: `~/Library/Application Support/geotrail/routes.db`
/// - Windows: `C:\Users\<user>\AppData\Local\geotrail\routes.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("geotrail")
        .join("routes.db")
}
