//! Read the current position once and push it to the service.

use tracing::{info, warn};

use geotrail_types::LocationAck;

use crate::client::RouteClient;
use crate::error::Result;
use crate::source::PositionSource;

/// Take a single fix from `source` and record it for `owner`.
///
/// A source failure is returned as [`Error::Position`](crate::Error::Position)
/// before any request is made; use
/// [`PositionError::user_message`](crate::PositionError::user_message) to show
/// it to a person.
pub async fn report_current_position(
    source: &dyn PositionSource,
    client: &RouteClient,
    owner: &str,
) -> Result<LocationAck> {
    let sample = source.current_position().await.inspect_err(|e| {
        warn!(owner, error = %e, "Could not get current position");
    })?;

    let ack = client.record_location(owner, &sample).await?;
    info!(
        owner,
        id = ack.record.id,
        lat = sample.latitude,
        lng = sample.longitude,
        "Position recorded"
    );
    Ok(ack)
}
