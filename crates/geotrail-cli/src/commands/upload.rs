//! Upload command implementation.

use std::path::Path;

use anyhow::{Context, Result};

use geotrail_core::{Route, RouteBackend, RouteDate};

use crate::config::Settings;
use crate::format::format_upload_ack;
use crate::sources::load_samples;
use crate::util::{Output, connect};

/// Upload a recorded sample file as one route.
///
/// Without `date`, the route is stored under the day of its first sample.
pub async fn cmd_upload(
    settings: &Settings,
    file: &Path,
    date: Option<RouteDate>,
    out: &Output,
) -> Result<()> {
    let owner = settings.require_owner()?;
    let samples = load_samples(file)?;
    let date = date.unwrap_or_else(|| RouteDate::of(samples[0].captured_at));
    let route = Route::new(owner, date, samples);

    out.note(format!(
        "Uploading {} points for {} on {} to {}",
        route.len(),
        owner,
        date,
        settings.server
    ));

    let client = connect(&settings.server)?;
    let ack = client
        .upload(&route)
        .await
        .with_context(|| format!("Failed to upload {}", file.display()))?;

    out.emit(&ack, format_upload_ack)
}
