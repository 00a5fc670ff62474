//! Example: Simulated Tracking Session
//!
//! This example walks a simulated device around a starting point, records
//! the route in a session and uploads it to a running geotrail-service.
//!
//! Run with: `cargo run --example simulate_track -- [BASE_URL] [OWNER]`

use std::env;
use std::sync::Arc;
use std::time::Duration;

use geotrail_core::{RandomWalkSource, RouteClient, RouteSession, WatchOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let base_url = args.get(1).map(String::as_str).unwrap_or("http://localhost:8000");
    let owner = args.get(2).map(String::as_str).unwrap_or("1");

    let client = RouteClient::new(base_url)?;
    if !client.is_reachable().await {
        eprintln!("geotrail-service is not reachable at {}", base_url);
        std::process::exit(1);
    }

    let source = Arc::new(RandomWalkSource::new(25.0479, 121.5171).max_step(25.0));
    let options = WatchOptions::with_interval(Duration::from_secs(1));
    let session = RouteSession::with_options(owner, source, Arc::new(client), options)?;

    session.on_sample(|s| println!("  {:.6}, {:.6}", s.latitude, s.longitude));

    println!("Tracking for 10 seconds...");
    session.start();
    tokio::time::sleep(Duration::from_secs(10)).await;
    session.stop();

    let ack = session.upload(None).await?;
    println!();
    println!(
        "Uploaded {} points for {} on {}{}",
        ack.point_count,
        ack.user_id,
        ack.date,
        if ack.replaced { " (replaced)" } else { "" }
    );

    Ok(())
}
