//! Fetch, history and delete: read and remove stored routes.

use anyhow::{Context, Result};

use geotrail_core::{RouteBackend, RouteDate};

use crate::config::Settings;
use crate::format::{format_delete_ack, format_history_text, format_route_text};
use crate::util::{Output, connect};

pub async fn cmd_fetch(settings: &Settings, date: Option<RouteDate>, out: &Output) -> Result<()> {
    let owner = settings.require_owner()?;
    let date = date.unwrap_or_else(RouteDate::today);
    let client = connect(&settings.server)?;

    let route = client
        .fetch(owner, date)
        .await
        .with_context(|| format!("Failed to fetch route for {} on {}", owner, date))?;

    out.emit(&route, format_route_text)
}

pub async fn cmd_history(settings: &Settings, limit: u32, out: &Output) -> Result<()> {
    let owner = settings.require_owner()?;
    let client = connect(&settings.server)?;

    let routes = client
        .fetch_history(owner, limit.max(1))
        .await
        .with_context(|| format!("Failed to fetch route history for {}", owner))?;

    out.emit(&routes, |routes, opts| format_history_text(routes, opts))
}

pub async fn cmd_delete(settings: &Settings, date: RouteDate, out: &Output) -> Result<()> {
    let owner = settings.require_owner()?;
    let client = connect(&settings.server)?;

    let ack = client
        .delete(owner, date)
        .await
        .with_context(|| format!("Failed to delete route for {} on {}", owner, date))?;

    out.emit(&ack, format_delete_ack)
}
