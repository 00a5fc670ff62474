//! Track command implementation.
//!
//! Runs a route session until Ctrl+C, the requested duration elapses or a
//! replay runs out. The route is uploaded on a schedule while tracking and
//! once more on the way out.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tracing::{info, warn};

use geotrail_core::{
    PeriodicUpload, PositionSample, PositionSource, RandomWalkSource, RouteDate, RouteSession,
    SessionEvent, WatchOptions,
};

use crate::config::Settings;
use crate::format::{format_sample_line, format_upload_ack};
use crate::sources::{ReplaySource, load_samples};
use crate::util::{Output, connect};

/// Sample spacing for replays when no interval is given.
const REPLAY_INTERVAL: Duration = Duration::from_millis(200);

/// Arguments for the track command.
pub struct TrackArgs<'a> {
    pub replay: Option<PathBuf>,
    pub interval: Option<u64>,
    pub upload_every: Option<u64>,
    pub duration: Option<u64>,
    pub date: Option<RouteDate>,
    pub origin: (f64, f64),
    pub settings: &'a Settings,
    pub out: &'a Output,
}

pub async fn cmd_track(args: TrackArgs<'_>) -> Result<()> {
    let TrackArgs {
        replay,
        interval,
        upload_every,
        duration,
        date,
        origin,
        settings,
        out,
    } = args;

    let owner = settings.require_owner()?;
    let client = Arc::new(connect(&settings.server)?);

    let (source, replay_len): (Arc<dyn PositionSource>, Option<usize>) = match &replay {
        Some(path) => {
            let source = ReplaySource::new(load_samples(path)?);
            let count = source.sample_count();
            (Arc::new(source) as Arc<dyn PositionSource>, Some(count))
        }
        None => {
            let (lat, lng) = origin;
            PositionSample::now(lat, lng)
                .validate()
                .context("Invalid starting position")?;
            (
                Arc::new(RandomWalkSource::new(lat, lng)) as Arc<dyn PositionSource>,
                None,
            )
        }
    };

    let sample_interval = match (interval, replay_len) {
        (Some(seconds), _) => Duration::from_secs(seconds),
        (None, Some(_)) => REPLAY_INTERVAL,
        (None, None) => settings.sample_interval,
    };
    let upload_interval = upload_every
        .map(Duration::from_secs)
        .unwrap_or(settings.upload_interval);

    let options = WatchOptions::builder().interval(sample_interval).build();
    let session = RouteSession::with_options(owner, source, client, options)?;
    let mut events = session.subscribe();

    session.start();
    let uploader = match date {
        Some(date) => PeriodicUpload::start_for_date(session.clone(), upload_interval, date),
        None => PeriodicUpload::start(session.clone(), upload_interval),
    };

    out.note(format!(
        "Tracking {} | Sample every {:?} | Upload every {:?} | Press Ctrl+C to stop",
        owner, sample_interval, upload_interval
    ));

    let deadline = duration.map(|seconds| Instant::now() + Duration::from_secs(seconds));
    let reason = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break "interrupted",
            _ = wait_until(deadline) => break "duration elapsed",
            event = events.recv() => match event {
                Ok(SessionEvent::Sample { index, sample }) => {
                    out.note(format_sample_line(index, &sample));
                    if replay_len == Some(index + 1) {
                        break "replay finished";
                    }
                }
                Ok(SessionEvent::SourceError { message, .. }) => {
                    out.note(format!("Position error: {}", message));
                }
                Ok(SessionEvent::Stopped { .. }) => break "position source ended",
                Ok(SessionEvent::Uploaded { point_count, .. }) => {
                    out.note(format!("Uploaded {} points", point_count));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Fell behind on session events");
                    if replay_len.is_some_and(|count| session.len() >= count) {
                        break "replay finished";
                    }
                }
                Err(RecvError::Closed) => break "session closed",
            }
        }
    };

    uploader.stop();
    session.stop();
    info!(
        reason,
        points = session.len(),
        uploads = uploader.succeeded(),
        failed = uploader.failed(),
        "Tracking stopped"
    );

    if session.is_empty() {
        out.note("No points recorded, nothing to upload.");
        return Ok(());
    }

    out.note(format!(
        "Stopped ({}), uploading {} points...",
        reason,
        session.len()
    ));
    let ack = session.upload(date).await.context("Final upload failed")?;
    out.emit(&ack, format_upload_ack)
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
