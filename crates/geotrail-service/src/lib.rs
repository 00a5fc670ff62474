//! HTTP backend that stores GPS routes for geotrail clients.
//!
//! This crate provides a service that:
//! - Accepts route uploads, replacing any route already stored for the same owner and date
//! - Serves single routes and per-owner route history
//! - Records and lists single position fixes
//!
//! # REST API Endpoints
//!
//! - `GET /api/health` - Service health check
//! - `POST /gps/upload` - Upload a route
//! - `GET /gps/{user_id}/routes?limit=N` - Route history, newest date first
//! - `GET /gps/{user_id}/{date}` - Fetch one route
//! - `DELETE /gps/{user_id}/{date}` - Delete one route
//! - `POST /gps/location?user_id=ID` - Record a single fix
//! - `GET /gps/locations/{user_id}` - List single fixes
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/geotrail/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8000"
//!
//! [storage]
//! path = "~/.local/share/geotrail/routes.db"
//!
//! [limits]
//! max_route_points = 10000
//! default_history_limit = 30
//! ```

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod state;

pub use config::{
    Config, ConfigError, LimitsConfig, ServerConfig, StorageConfig, ValidationError,
    default_config_path,
};
pub use state::AppState;

/// Build the complete application: API routes plus tracing and CORS layers.
///
/// Browsers post routes from arbitrary origins, so CORS is wide open.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
