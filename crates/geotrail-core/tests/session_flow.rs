//! Integration tests for route sessions against the in-memory backend.
//!
//! These exercise the public API only, the way a front end would use it.

use std::sync::Arc;
use std::time::Duration;

use geotrail_core::{
    Error, MockBackend, MockPositionSource, PeriodicUpload, PositionError, PositionSample,
    RandomWalkSource, RouteBackend, RouteDate, RouteSession, SessionEvent, WatchOptions,
};
use time::macros::datetime;
use tokio::sync::broadcast::Receiver;

async fn wait_for_samples(events: &mut Receiver<SessionEvent>, count: usize) {
    let mut seen = 0;
    tokio::time::timeout(Duration::from_secs(5), async {
        while seen < count {
            if let SessionEvent::Sample { .. } = events.recv().await.unwrap() {
                seen += 1;
            }
        }
    })
    .await
    .expect("timed out waiting for samples");
}

#[tokio::test]
async fn test_track_upload_fetch_delete() {
    let source = Arc::new(MockPositionSource::new());
    let backend = Arc::new(MockBackend::new());
    let session = RouteSession::new("1", source.clone(), backend.clone()).unwrap();
    let mut events = session.subscribe();

    let t1 = datetime!(2025-01-31 08:00:00 UTC);
    let t2 = datetime!(2025-01-31 08:00:30 UTC);

    session.start();
    source
        .push_sample(PositionSample::new(25.0479, 121.5171, t1))
        .await;
    source
        .push_sample(PositionSample::new(25.0465, 121.5168, t2))
        .await;
    wait_for_samples(&mut events, 2).await;
    session.stop();

    let date: RouteDate = "2025-01-31".parse().unwrap();
    let ack = session.upload(Some(date)).await.unwrap();
    assert_eq!(ack.point_count, 2);
    assert_eq!(session.len(), 2);

    let stored = backend.fetch("1", date).await.unwrap();
    assert_eq!(stored.points[0].captured_at, t1);
    assert_eq!(stored.points[1].captured_at, t2);

    let deleted = backend.delete("1", date).await.unwrap();
    assert_eq!(deleted.deleted_points, 2);
    assert!(matches!(
        backend.fetch("1", date).await,
        Err(Error::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_reupload_replaces_route() {
    let source = Arc::new(MockPositionSource::new());
    let backend = Arc::new(MockBackend::new());
    let session = RouteSession::new("1", source.clone(), backend.clone()).unwrap();
    let mut events = session.subscribe();
    let date: RouteDate = "2025-01-31".parse().unwrap();

    session.start();
    source.push_sample(PositionSample::now(1.0, 1.0)).await;
    wait_for_samples(&mut events, 1).await;
    assert!(!session.upload(Some(date)).await.unwrap().replaced);

    source.push_sample(PositionSample::now(1.1, 1.1)).await;
    wait_for_samples(&mut events, 1).await;
    let ack = session.upload(Some(date)).await.unwrap();
    assert!(ack.replaced);
    assert_eq!(ack.point_count, 2);
    assert_eq!(backend.fetch("1", date).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_history_returns_all_when_limit_exceeds_count() {
    let backend = MockBackend::new();
    for day in ["2025-01-29", "2025-01-30", "2025-01-31"] {
        let date: RouteDate = day.parse().unwrap();
        let route = geotrail_core::Route::new(
            "1",
            date,
            vec![PositionSample::new(
                25.0,
                121.0,
                date.start_of_day() + time::Duration::hours(8),
            )],
        );
        backend.upload(&route).await.unwrap();
    }

    let history = backend.fetch_history("1", 10).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|pair| pair[0].date > pair[1].date));
}

#[tokio::test]
async fn test_source_errors_are_reported_as_events() {
    let source = Arc::new(MockPositionSource::new());
    let backend = Arc::new(MockBackend::new());
    let session = RouteSession::new("1", source.clone(), backend).unwrap();
    let mut events = session.subscribe();

    session.start();
    source.push_error(PositionError::PermissionDenied).await;

    let event = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            if matches!(event, SessionEvent::SourceError { .. }) {
                return event;
            }
        }
    })
    .await
    .unwrap();

    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "source_error");
    assert_eq!(json["kind"], "permission_denied");
    assert!(session.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_random_walk_with_periodic_upload() {
    let source = Arc::new(RandomWalkSource::with_seed(25.0479, 121.5171, 11));
    let backend = Arc::new(MockBackend::new());
    let options = WatchOptions::with_interval(Duration::from_secs(5));
    let session = RouteSession::with_options("walker", source, backend.clone(), options).unwrap();

    session.start();
    let uploads = PeriodicUpload::start(session.clone(), Duration::from_secs(60));
    tokio::time::sleep(Duration::from_secs(125)).await;
    uploads.stop();
    session.stop();

    assert_eq!(uploads.succeeded(), 2);
    let last = backend.last_upload().await.unwrap();
    assert_eq!(last.owner, "walker");
    assert!(last.len() >= 12);
    assert!(last.validate(10_000).is_ok());
}
