//! Route tracking for geotrail.
//!
//! This crate turns a stream of position fixes into routes and hands them to
//! a backend for storage.
//!
//! # Features
//!
//! - **Route sessions**: start/stop tracking, snapshot, clear and upload
//! - **Position sources**: a small trait with cancellable, bounded subscriptions
//! - **Observers and events**: callbacks and a broadcast channel per session
//! - **Periodic upload**: a caller-owned task that uploads on a schedule
//! - **HTTP backend client**: talks to `geotrail-service` (feature `http-client`)
//! - **Test doubles**: scripted source and in-memory backend
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use geotrail_core::{RandomWalkSource, RouteClient, RouteSession, WatchOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(RandomWalkSource::new(25.0479, 121.5171));
//!     let backend = Arc::new(RouteClient::new("http://localhost:8000")?);
//!     let options = WatchOptions::with_interval(Duration::from_secs(5));
//!     let session = RouteSession::with_options("1", source, backend, options)?;
//!
//!     session.on_sample(|s| println!("{:.5}, {:.5}", s.latitude, s.longitude));
//!     session.start();
//!     tokio::time::sleep(Duration::from_secs(60)).await;
//!     session.stop();
//!
//!     let ack = session.upload(None).await?;
//!     println!("stored {} points for {}", ack.point_count, ack.date);
//!     Ok(())
//! }
//! ```

pub mod backend;
#[cfg(feature = "http-client")]
pub mod client;
pub mod error;
pub mod events;
#[cfg(feature = "http-client")]
pub mod locate;
pub mod mock;
pub mod schedule;
pub mod session;
pub mod simulate;
pub mod source;

pub use backend::RouteBackend;
#[cfg(feature = "http-client")]
pub use client::{ClientConfig, DEFAULT_BASE_URL, HealthResponse, LocationFilter, RouteClient};
pub use error::{Error, PositionError, PositionErrorKind, Result};
pub use events::{EventDispatcher, EventReceiver, EventSender, SessionEvent};
#[cfg(feature = "http-client")]
pub use locate::report_current_position;
pub use mock::{MockBackend, MockPositionSource};
pub use schedule::PeriodicUpload;
pub use session::{ObserverId, RouteSession};
pub use simulate::RandomWalkSource;
pub use source::{PositionSource, PositionWatch, SampleResult, WatchOptions, WatchOptionsBuilder};

// Re-export from geotrail-types
pub use geotrail_types::{
    DeleteAck, LocationAck, LocationDeleteAck, LocationList, LocationRecord, ParseError,
    PositionSample, Route, RouteDate, UploadAck,
};
