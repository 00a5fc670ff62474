//! Caller-owned periodic upload.
//!
//! The session itself never uploads on its own. Callers that want the route
//! pushed on a schedule start a [`PeriodicUpload`] next to the session and
//! stop it independently of tracking.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use geotrail_types::RouteDate;

use crate::error::Error;
use crate::session::RouteSession;

#[derive(Debug, Default)]
struct Counters {
    succeeded: AtomicU32,
    failed: AtomicU32,
    skipped: AtomicU32,
}

/// A background task that uploads a session's route every period.
///
/// Ticks with no points are skipped quietly. Failed uploads are logged and
/// the task keeps going; nothing is retried early. Dropping the handle stops
/// the task.
#[derive(Debug)]
pub struct PeriodicUpload {
    cancel_token: CancellationToken,
    counters: Arc<Counters>,
    every: Duration,
}

impl PeriodicUpload {
    /// Start uploading `session` every `every`. The first upload happens one
    /// full period after start.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn start(session: RouteSession, every: Duration) -> Self {
        Self::spawn(session, every, None)
    }

    /// Like [`start`](Self::start), but every upload is stored under `date`
    /// instead of the current day.
    pub fn start_for_date(session: RouteSession, every: Duration, date: RouteDate) -> Self {
        Self::spawn(session, every, Some(date))
    }

    fn spawn(session: RouteSession, every: Duration, date: Option<RouteDate>) -> Self {
        let every = every.max(Duration::from_millis(1));
        let cancel_token = CancellationToken::new();
        let counters = Arc::new(Counters::default());

        let token = cancel_token.clone();
        let task_counters = Arc::clone(&counters);
        tokio::spawn(async move {
            run(session, every, date, token, task_counters).await;
        });

        Self {
            cancel_token,
            counters,
            every,
        }
    }

    /// Stop the task. Returns `false` if it was already stopped.
    pub fn stop(&self) -> bool {
        if self.cancel_token.is_cancelled() {
            return false;
        }
        self.cancel_token.cancel();
        true
    }

    /// Whether the task is still scheduled.
    pub fn is_running(&self) -> bool {
        !self.cancel_token.is_cancelled()
    }

    /// The upload period.
    pub fn period(&self) -> Duration {
        self.every
    }

    /// Number of uploads the backend accepted.
    pub fn succeeded(&self) -> u32 {
        self.counters.succeeded.load(Ordering::Relaxed)
    }

    /// Number of uploads that failed.
    pub fn failed(&self) -> u32 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    /// Number of ticks skipped because the route was empty.
    pub fn skipped(&self) -> u32 {
        self.counters.skipped.load(Ordering::Relaxed)
    }
}

impl Drop for PeriodicUpload {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn run(
    session: RouteSession,
    every: Duration,
    date: Option<RouteDate>,
    token: CancellationToken,
    counters: Arc<Counters>,
) {
    info!(owner = session.owner(), every = ?every, "Periodic upload started");

    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut consecutive_failures = 0u32;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match session.upload(date).await {
            Ok(ack) => {
                consecutive_failures = 0;
                counters.succeeded.fetch_add(1, Ordering::Relaxed);
                debug!(points = ack.point_count, "Periodic upload stored route");
            }
            Err(Error::EmptyRoute) => {
                counters.skipped.fetch_add(1, Ordering::Relaxed);
                debug!("No points yet, skipping periodic upload");
            }
            Err(e) => {
                consecutive_failures += 1;
                counters.failed.fetch_add(1, Ordering::Relaxed);
                if consecutive_failures <= 3 {
                    warn!(
                        "Periodic upload failed: {} (attempt {})",
                        e, consecutive_failures
                    );
                } else if consecutive_failures == 4 {
                    error!(
                        "Periodic upload has failed {} times in a row, suppressing further warnings",
                        consecutive_failures
                    );
                }
            }
        }
    }

    info!(owner = session.owner(), "Periodic upload stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SessionEvent;
    use crate::mock::{MockBackend, MockPositionSource};
    use geotrail_types::PositionSample;

    async fn tracking_session() -> (Arc<MockPositionSource>, Arc<MockBackend>, RouteSession) {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = RouteSession::new("1", source.clone(), backend.clone()).unwrap();
        session.start();
        (source, backend, session)
    }

    async fn push(source: &MockPositionSource, session: &RouteSession) {
        let mut events = session.subscribe();
        source.push_sample(PositionSample::now(25.0, 121.0)).await;
        loop {
            if let SessionEvent::Sample { .. } = events.recv().await.unwrap() {
                break;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_uploads_every_period() {
        let (source, backend, session) = tracking_session().await;
        push(&source, &session).await;

        let task = PeriodicUpload::start(session.clone(), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.upload_count(), 0);

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(backend.upload_count(), 2);
        assert_eq!(task.succeeded(), 2);
        assert_eq!(session.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uploads_under_fixed_date() {
        let (source, backend, session) = tracking_session().await;
        push(&source, &session).await;
        let date: RouteDate = "2024-12-24".parse().unwrap();

        let _task = PeriodicUpload::start_for_date(session, Duration::from_secs(10), date);
        tokio::time::sleep(Duration::from_secs(15)).await;

        let uploaded = backend.last_upload().await.unwrap();
        assert_eq!(uploaded.date, date);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_ticks_are_skipped() {
        let (_source, backend, session) = tracking_session().await;

        let task = PeriodicUpload::start(session, Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(35)).await;

        assert_eq!(backend.upload_count(), 0);
        assert_eq!(task.skipped(), 3);
        assert_eq!(task.failed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_the_task() {
        let (source, backend, session) = tracking_session().await;
        push(&source, &session).await;
        backend.set_should_fail(true, None).await;

        let task = PeriodicUpload::start(session, Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(task.failed(), 2);

        backend.set_should_fail(false, None).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(task.succeeded(), 1);
        assert!(task.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let (source, backend, session) = tracking_session().await;
        push(&source, &session).await;

        let task = PeriodicUpload::start(session, Duration::from_secs(10));
        assert!(task.stop());
        assert!(!task.stop());
        assert!(!task.is_running());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.upload_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_the_task() {
        let (source, backend, session) = tracking_session().await;
        push(&source, &session).await;

        drop(PeriodicUpload::start(session, Duration::from_secs(10)));
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.upload_count(), 0);
    }
}
