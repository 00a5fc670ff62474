//! Locate command implementation.

use anyhow::{Context, Result, bail};

use geotrail_core::{Error, PositionSample, RandomWalkSource, report_current_position};

use crate::config::Settings;
use crate::format::format_location_ack;
use crate::sources::FixedSource;
use crate::util::{Output, connect};

/// Where the simulated device sits when no coordinates are given.
const SIMULATED_ORIGIN: (f64, f64) = (25.0479, 121.5171);

pub async fn cmd_locate(
    settings: &Settings,
    coordinates: Option<(f64, f64)>,
    out: &Output,
) -> Result<()> {
    let owner = settings.require_owner()?;
    let client = connect(&settings.server)?;

    let ack = match coordinates {
        Some((lat, lng)) => {
            PositionSample::now(lat, lng)
                .validate()
                .context("Invalid coordinates")?;
            report_current_position(&FixedSource::new(lat, lng), &client, owner).await
        }
        None => {
            let (lat, lng) = SIMULATED_ORIGIN;
            report_current_position(&RandomWalkSource::new(lat, lng), &client, owner).await
        }
    };

    let ack = match ack {
        Ok(ack) => ack,
        Err(Error::Position(e)) => bail!("{}", e.user_message()),
        Err(e) => return Err(anyhow::Error::new(e).context("Failed to record position")),
    };

    out.emit(&ack, format_location_ack)
}
