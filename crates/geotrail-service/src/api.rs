//! REST API endpoints for geotrail-service.
//!
//! # Endpoints
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `GET` | `/api/health` | Liveness check |
//! | `POST` | `/gps/upload` | Store a route, replacing any route for the same owner and date |
//! | `GET` | `/gps/{user_id}/routes?limit=N` | Most recent routes, newest date first |
//! | `GET` | `/gps/{user_id}/{date}` | One route |
//! | `DELETE` | `/gps/{user_id}/{date}` | Delete one route |
//! | `POST` | `/gps/location?user_id=ID` | Record a single fix |
//! | `GET` | `/gps/locations/{user_id}` | List single fixes, newest first |
//! | `GET` | `/gps/locations/{user_id}/date/{date}` | One day's fixes in capture order |
//! | `DELETE` | `/gps/locations/{user_id}` | Delete fixes, optionally within a date range |
//!
//! Date ranges (`start_date`, `end_date`) are whole UTC days, both inclusive.
//! Timestamps come back with the UTC offset they were reported with.
//!
//! ## Error Handling
//!
//! Every error is returned as `{"detail": "<message>"}` via [`AppError`].
//! Malformed input is 400, a missing route is 404 and store failures are 500.
//!
//! # Example
//!
//! ```ignore
//! use geotrail_service::api;
//!
//! let app = api::router().with_state(state);
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{error, info};

use geotrail_store::LocationQuery;
use geotrail_types::{
    DeleteAck, ErrorBody, LocationAck, LocationDeleteAck, LocationList, PositionSample, Route,
    RouteDate, UploadAck, validate_owner,
};

use crate::state::AppState;

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        // Routes
        .route("/gps/upload", post(upload_route))
        .route("/gps/{user_id}/routes", get(route_history))
        .route("/gps/{user_id}/{date}", get(get_route).delete(delete_route))
        // Single fixes
        .route("/gps/location", post(record_location))
        .route(
            "/gps/locations/{user_id}",
            get(list_locations).delete(delete_locations),
        )
        .route("/gps/locations/{user_id}/date/{date}", get(day_locations))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
    })
}

fn parse_date(raw: &str) -> Result<RouteDate, AppError> {
    raw.parse()
        .map_err(|e: geotrail_types::ParseError| AppError::BadRequest(e.to_string()))
}

fn check_owner(owner: &str) -> Result<(), AppError> {
    validate_owner(owner).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Store an uploaded route.
async fn upload_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Route>, JsonRejection>,
) -> Result<Json<UploadAck>, AppError> {
    let Json(route) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    route
        .validate(state.config.limits.max_route_points)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let outcome = {
        let store = state.store.lock().await;
        store.upsert_route(&route)?
    };

    info!(
        "Stored route for {} on {} ({} points, replaced: {})",
        route.owner, route.date, outcome.point_count, outcome.replaced
    );

    Ok(Json(UploadAck {
        message: if outcome.replaced {
            "GPS route replaced successfully".to_string()
        } else {
            "GPS route uploaded successfully".to_string()
        },
        user_id: route.owner,
        date: route.date,
        point_count: outcome.point_count,
        replaced: outcome.replaced,
    }))
}

/// Query parameters for route history.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Number of routes to return.
    pub limit: Option<u32>,
}

/// The owner's most recent routes, newest date first.
async fn route_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<Vec<Route>>, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    check_owner(&user_id)?;
    let limit = state.config.limits.history_limit(params.limit);

    let store = state.store.lock().await;
    let routes = store
        .route_history(&user_id, limit)?
        .into_iter()
        .map(Route::from)
        .collect();

    Ok(Json(routes))
}

/// One route by owner and date.
async fn get_route(
    State(state): State<Arc<AppState>>,
    Path((user_id, date)): Path<(String, String)>,
) -> Result<Json<Route>, AppError> {
    check_owner(&user_id)?;
    let date = parse_date(&date)?;

    let store = state.store.lock().await;
    let stored = store
        .get_route(&user_id, date)?
        .ok_or_else(|| AppError::route_not_found(&user_id, date))?;

    Ok(Json(stored.into_route()))
}

/// Delete one route by owner and date.
async fn delete_route(
    State(state): State<Arc<AppState>>,
    Path((user_id, date)): Path<(String, String)>,
) -> Result<Json<DeleteAck>, AppError> {
    check_owner(&user_id)?;
    let date = parse_date(&date)?;

    let deleted_points = {
        let store = state.store.lock().await;
        store
            .delete_route(&user_id, date)?
            .ok_or_else(|| AppError::route_not_found(&user_id, date))?
    };

    info!("Deleted route for {} on {}", user_id, date);

    Ok(Json(DeleteAck {
        message: "GPS route deleted successfully".to_string(),
        user_id,
        date,
        deleted_points,
    }))
}

/// Query parameters for recording a fix.
#[derive(Debug, Deserialize)]
pub struct LocationParams {
    /// Owner of the fix.
    pub user_id: String,
}

/// Record a single position fix.
async fn record_location(
    State(state): State<Arc<AppState>>,
    params: Result<Query<LocationParams>, QueryRejection>,
    payload: Result<Json<PositionSample>, JsonRejection>,
) -> Result<(StatusCode, Json<LocationAck>), AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let Json(sample) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    check_owner(&params.user_id)?;
    sample
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let stored = {
        let store = state.store.lock().await;
        store.insert_location(&params.user_id, &sample)?
    };

    Ok((
        StatusCode::CREATED,
        Json(LocationAck {
            message: "Location recorded successfully".to_string(),
            user_id: stored.owner.clone(),
            record: stored.to_record(),
        }),
    ))
}

/// Query parameters for listing fixes.
#[derive(Debug, Deserialize)]
pub struct LocationListParams {
    /// First day to include (YYYY-MM-DD).
    pub start_date: Option<String>,
    /// Last day to include (YYYY-MM-DD).
    pub end_date: Option<String>,
    /// Maximum number of fixes.
    pub limit: Option<u32>,
}

/// Build a query for `owner`'s fixes between two optional whole days.
fn range_query(
    owner: &str,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<LocationQuery, AppError> {
    let start = start_date.map(parse_date).transpose()?;
    let end = end_date.map(parse_date).transpose()?;
    if let (Some(start), Some(end)) = (start, end)
        && start > end
    {
        return Err(AppError::BadRequest(format!(
            "start_date {} is after end_date {}",
            start, end
        )));
    }

    let mut query = LocationQuery::new().owner(owner);
    if let Some(start) = start {
        query = query.since(start.start_of_day());
    }
    if let Some(end) = end {
        query = query.until(end.end_of_day());
    }
    Ok(query)
}

fn location_list(
    user_id: String,
    date: Option<RouteDate>,
    stored: &[geotrail_store::StoredLocation],
) -> LocationList {
    let locations: Vec<_> = stored.iter().map(|s| s.to_record()).collect();
    LocationList {
        user_id,
        date,
        total_locations: locations.len(),
        locations,
    }
}

/// List single fixes, newest first.
async fn list_locations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: Result<Query<LocationListParams>, QueryRejection>,
) -> Result<Json<LocationList>, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    check_owner(&user_id)?;

    let query = range_query(
        &user_id,
        params.start_date.as_deref(),
        params.end_date.as_deref(),
    )?
    .limit(
        params
            .limit
            .unwrap_or(state.config.limits.default_location_limit)
            .max(1),
    );

    let store = state.store.lock().await;
    let stored = store.query_locations(&query)?;
    Ok(Json(location_list(user_id, None, &stored)))
}

/// Every fix captured on one UTC day, oldest first.
async fn day_locations(
    State(state): State<Arc<AppState>>,
    Path((user_id, date)): Path<(String, String)>,
) -> Result<Json<LocationList>, AppError> {
    check_owner(&user_id)?;
    let date = parse_date(&date)?;

    let query = LocationQuery::new()
        .owner(&user_id)
        .since(date.start_of_day())
        .until(date.end_of_day())
        .oldest_first();

    let store = state.store.lock().await;
    let stored = store.query_locations(&query)?;
    Ok(Json(location_list(user_id, Some(date), &stored)))
}

/// Query parameters for deleting fixes.
#[derive(Debug, Deserialize)]
pub struct LocationRangeParams {
    /// First day to delete (YYYY-MM-DD).
    pub start_date: Option<String>,
    /// Last day to delete (YYYY-MM-DD).
    pub end_date: Option<String>,
}

/// Delete an owner's fixes, all of them unless a date range is given.
async fn delete_locations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: Result<Query<LocationRangeParams>, QueryRejection>,
) -> Result<Json<LocationDeleteAck>, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    check_owner(&user_id)?;
    let query = range_query(
        &user_id,
        params.start_date.as_deref(),
        params.end_date.as_deref(),
    )?;

    let deleted_count = {
        let store = state.store.lock().await;
        store.delete_locations(&query)?
    };

    info!("Deleted {} locations for {}", deleted_count, user_id);

    Ok(Json(LocationDeleteAck {
        message: "GPS locations deleted successfully".to_string(),
        user_id,
        deleted_count,
    }))
}

/// API error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Store(geotrail_store::Error),
}

impl AppError {
    fn route_not_found(owner: &str, date: RouteDate) -> Self {
        AppError::NotFound(format!("No GPS route found for user {} on {}", owner, date))
    }
}

impl From<geotrail_store::Error> for AppError {
    fn from(e: geotrail_store::Error) -> Self {
        AppError::Store(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, detail) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Store(e) => {
                error!("Store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}
