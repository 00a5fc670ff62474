//! End-to-end tests: a tracking session uploading to a running service over HTTP.

use std::sync::Arc;
use std::time::Duration;

use geotrail_core::{
    Error, LocationFilter, MockPositionSource, PositionSample, RouteBackend, RouteClient,
    RouteDate, RouteSession, SessionEvent, report_current_position,
};
use geotrail_service::{AppState, Config};
use geotrail_store::Store;
use time::macros::datetime;

/// Serve the full application on an ephemeral port.
async fn spawn_service() -> (RouteClient, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("routes.db")).unwrap();
    let app = geotrail_service::app(AppState::new(store, Config::default()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = RouteClient::new(&format!("http://{}", addr)).unwrap();
    (client, dir)
}

async fn wait_for_samples(session: &RouteSession, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while session.len() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for samples");
}

#[tokio::test]
async fn test_health() {
    let (client, _dir) = spawn_service().await;
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert!(client.is_reachable().await);
}

#[tokio::test]
async fn test_session_upload_roundtrip() {
    let (client, _dir) = spawn_service().await;
    let client = Arc::new(client);
    let source = Arc::new(MockPositionSource::new());
    let session = RouteSession::new("1", source.clone(), client.clone()).unwrap();
    let mut events = session.subscribe();

    let t1 = datetime!(2025-01-31 08:30:00 UTC);
    let t2 = datetime!(2025-01-31 08:32:00.250 UTC);

    assert!(session.start());
    source
        .push_sample(PositionSample::new(25.047924, 121.517081, t1))
        .await;
    source
        .push_sample(PositionSample::new(25.0465, 121.5168, t2))
        .await;
    wait_for_samples(&session, 2).await;
    session.stop();

    let date: RouteDate = "2025-01-31".parse().unwrap();
    let ack = session.upload(Some(date)).await.unwrap();
    assert_eq!(ack.point_count, 2);
    assert_eq!(ack.user_id, "1");
    assert!(!ack.replaced);

    let route = client.fetch("1", date).await.unwrap();
    assert_eq!(route.points, session.current_route());
    assert_eq!(route.points[1].captured_at, t2);

    // Second upload of the same day replaces the stored route
    let ack = session.upload(Some(date)).await.unwrap();
    assert!(ack.replaced);
    assert_eq!(client.fetch_history("1", 10).await.unwrap().len(), 1);

    let mut saw_upload = false;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Uploaded { point_count, .. } = event {
            assert_eq!(point_count, 2);
            saw_upload = true;
        }
    }
    assert!(saw_upload);
}

#[tokio::test]
async fn test_history_and_delete() {
    let (client, _dir) = spawn_service().await;
    let source = Arc::new(MockPositionSource::new());
    let client = Arc::new(client);
    let session = RouteSession::new("walker", source.clone(), client.clone()).unwrap();

    session.start();
    source.push_sample(PositionSample::now(10.0, 20.0)).await;
    wait_for_samples(&session, 1).await;

    for day in ["2025-01-29", "2025-01-31", "2025-01-30"] {
        session.upload(Some(day.parse().unwrap())).await.unwrap();
    }

    let history = client.fetch_history("walker", 2).await.unwrap();
    let dates: Vec<String> = history.iter().map(|r| r.date.to_string()).collect();
    assert_eq!(dates, vec!["2025-01-31", "2025-01-30"]);

    let date: RouteDate = "2025-01-30".parse().unwrap();
    let ack = client.delete("walker", date).await.unwrap();
    assert_eq!(ack.deleted_points, 1);

    assert!(matches!(
        client.fetch("walker", date).await,
        Err(Error::NotFound { .. })
    ));
    assert!(matches!(
        client.delete("walker", date).await,
        Err(Error::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_rejected_upload_surfaces_detail() {
    let (client, _dir) = spawn_service().await;
    let route = geotrail_core::Route::new(
        "1",
        "2025-01-31".parse().unwrap(),
        vec![PositionSample::new(
            91.0,
            0.0,
            datetime!(2025-01-31 08:00:00 UTC),
        )],
    );

    match client.upload(&route).await {
        Err(Error::BackendRejected { status, detail }) => {
            assert_eq!(status, 400);
            assert!(detail.contains("latitude"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_report_current_position() {
    let (client, _dir) = spawn_service().await;
    let source = MockPositionSource::with_position(PositionSample::new(
        25.0479,
        121.5171,
        datetime!(2025-01-31 09:00:00 UTC),
    ));

    let ack = report_current_position(&source, &client, "1").await.unwrap();
    assert_eq!(ack.user_id, "1");
    assert_eq!(ack.record.sample.latitude, 25.0479);

    let list = client
        .locations("1", &LocationFilter::default())
        .await
        .unwrap();
    assert_eq!(list.total_locations, 1);
    assert_eq!(list.locations[0].id, ack.record.id);

    let filter = LocationFilter {
        start_date: Some("2025-02-01".parse().unwrap()),
        ..Default::default()
    };
    assert_eq!(client.locations("1", &filter).await.unwrap().total_locations, 0);
}

#[tokio::test]
async fn test_day_listing_and_location_delete() {
    let (client, _dir) = spawn_service().await;
    let day: RouteDate = "2025-01-31".parse().unwrap();
    for ts in [
        datetime!(2025-01-31 18:00 UTC),
        datetime!(2025-01-31 07:00 UTC),
        datetime!(2025-02-01 07:00 UTC),
    ] {
        client
            .record_location("1", &PositionSample::new(25.0, 121.5, ts))
            .await
            .unwrap();
    }

    let list = client.locations_on("1", day).await.unwrap();
    assert_eq!(list.date, Some(day));
    assert_eq!(list.total_locations, 2);
    assert_eq!(
        list.locations[0].sample.captured_at,
        datetime!(2025-01-31 07:00 UTC)
    );

    let filter = LocationFilter {
        start_date: Some(day),
        end_date: Some(day),
        ..Default::default()
    };
    let ack = client.delete_locations("1", &filter).await.unwrap();
    assert_eq!(ack.deleted_count, 2);
    assert_eq!(client.locations_on("1", day).await.unwrap().total_locations, 0);

    let backwards = LocationFilter {
        start_date: Some("2025-02-02".parse().unwrap()),
        end_date: Some(day),
        ..Default::default()
    };
    let err = client.delete_locations("1", &backwards).await.unwrap_err();
    assert!(matches!(err, Error::BackendRejected { status: 400, .. }));

    let ack = client
        .delete_locations("1", &LocationFilter::default())
        .await
        .unwrap();
    assert_eq!(ack.deleted_count, 1);
}
