//! The route tracking session.
//!
//! A [`RouteSession`] subscribes to a [`PositionSource`], appends every sample
//! it receives to an in-memory route and uploads that route to a
//! [`RouteBackend`] on demand.
//!
//! ```text
//!            start()                    stop()
//!   Idle ───────────────► Active ───────────────► Idle
//!    ▲   (points reset,     │  (points kept,
//!    │    subscribe)        │   subscription cancelled)
//!    └──────────────────────┘
//! ```
//!
//! A source that ends its subscription moves the session to Idle the same way
//! `stop()` does.
//!
//! `upload()` and `clear()` are valid in both states. Neither changes the
//! tracking state and `upload()` never clears the points.
//!
//! Samples are delivered on a background task. Appends happen under a short
//! lock and observers are invoked after the lock is released, so an observer
//! may call back into the session (including [`RouteSession::stop`]).

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use geotrail_types::{PositionSample, Route, RouteDate, UploadAck, validate_owner};

use crate::backend::RouteBackend;
use crate::error::{Error, PositionError, Result};
use crate::events::{EventDispatcher, EventReceiver, SessionEvent};
use crate::source::{PositionSource, PositionWatch, WatchOptions};

/// Handle returned when registering an observer; pass it to
/// [`RouteSession::remove_observer`] to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type SampleObserver = Arc<dyn Fn(&PositionSample) + Send + Sync>;
type ErrorObserver = Arc<dyn Fn(&PositionError) + Send + Sync>;

#[derive(Default)]
struct SessionState {
    active: bool,
    /// Bumped on every `start()` so a stale subscription can never append.
    generation: u64,
    points: Vec<PositionSample>,
    subscription: Option<CancellationToken>,
}

#[derive(Default)]
struct Observers {
    next_id: u64,
    samples: Vec<(ObserverId, SampleObserver)>,
    errors: Vec<(ObserverId, ErrorObserver)>,
}

struct Inner {
    owner: String,
    source: Arc<dyn PositionSource>,
    backend: Arc<dyn RouteBackend>,
    options: WatchOptions,
    state: Mutex<SessionState>,
    observers: Mutex<Observers>,
    events: EventDispatcher,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observers(&self) -> MutexGuard<'_, Observers> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, generation: u64, sample: PositionSample) {
        let index = {
            let mut state = self.state();
            if !state.active || state.generation != generation {
                return;
            }
            state.points.push(sample);
            let index = state.points.len() - 1;
            self.events.send(SessionEvent::Sample { index, sample });
            index
        };
        debug!(
            owner = %self.owner,
            index,
            lat = sample.latitude,
            lng = sample.longitude,
            "Recorded sample"
        );

        let observers: Vec<SampleObserver> = self
            .observers()
            .samples
            .iter()
            .map(|(_, f)| Arc::clone(f))
            .collect();
        for observer in observers {
            notify("sample", || observer(&sample));
        }
    }

    fn report(&self, generation: u64, error: &PositionError) {
        {
            let state = self.state();
            if !state.active || state.generation != generation {
                return;
            }
            self.events.send(SessionEvent::source_error(error));
        }
        warn!(owner = %self.owner, error = %error, "Position source error; tracking continues");

        let observers: Vec<ErrorObserver> = self
            .observers()
            .errors
            .iter()
            .map(|(_, f)| Arc::clone(f))
            .collect();
        for observer in observers {
            notify("error", || observer(error));
        }
    }
}

impl Inner {
    /// The source ended the subscription on its own. Go idle, keep the points.
    fn finish(&self, generation: u64) {
        let points = {
            let mut state = self.state();
            if !state.active || state.generation != generation {
                return;
            }
            state.active = false;
            if let Some(token) = state.subscription.take() {
                token.cancel();
            }
            let points = state.points.len();
            self.events.send(SessionEvent::Stopped {
                owner: self.owner.clone(),
                points,
            });
            points
        };
        info!(
            owner = %self.owner,
            points,
            "Position source closed the subscription; tracking stopped"
        );
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = state.subscription.take() {
            token.cancel();
        }
    }
}

fn notify(kind: &str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        warn!("{kind} observer panicked; ignoring");
    }
}

async fn drive(session: Weak<Inner>, mut watch: PositionWatch, generation: u64) {
    let token = watch.cancellation_token();
    loop {
        let item = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            item = watch.next() => item,
        };
        let Some(inner) = session.upgrade() else {
            break;
        };
        match item {
            Some(Ok(sample)) => inner.record(generation, sample),
            Some(Err(error)) => inner.report(generation, &error),
            None => {
                inner.finish(generation);
                break;
            }
        }
    }
}

/// Accumulates position samples for one owner and uploads them as a route.
///
/// Cloning is cheap; clones share the same state. The subscription is
/// cancelled when the last clone is dropped. An observer that captures a
/// clone keeps the session alive until it is removed.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use geotrail_core::{RouteClient, RouteSession, RandomWalkSource};
///
/// let source = Arc::new(RandomWalkSource::new(25.0479, 121.5171));
/// let backend = Arc::new(RouteClient::new("http://localhost:8000")?);
/// let session = RouteSession::new("1", source, backend)?;
///
/// session.start();
/// // ... later
/// session.stop();
/// let ack = session.upload(None).await?;
/// println!("stored {} points", ack.point_count);
/// ```
#[derive(Clone)]
pub struct RouteSession {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RouteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state();
        f.debug_struct("RouteSession")
            .field("owner", &self.inner.owner)
            .field("active", &state.active)
            .field("points", &state.points.len())
            .finish()
    }
}

impl RouteSession {
    /// Create an idle session with default [`WatchOptions`].
    pub fn new(
        owner: impl Into<String>,
        source: Arc<dyn PositionSource>,
        backend: Arc<dyn RouteBackend>,
    ) -> Result<Self> {
        Self::with_options(owner, source, backend, WatchOptions::default())
    }

    /// Create an idle session that subscribes with the given options.
    pub fn with_options(
        owner: impl Into<String>,
        source: Arc<dyn PositionSource>,
        backend: Arc<dyn RouteBackend>,
        options: WatchOptions,
    ) -> Result<Self> {
        let owner = owner.into();
        validate_owner(&owner)?;
        options.validate()?;

        Ok(Self {
            inner: Arc::new(Inner {
                owner,
                source,
                backend,
                options,
                state: Mutex::new(SessionState::default()),
                observers: Mutex::new(Observers::default()),
                events: EventDispatcher::default(),
            }),
        })
    }

    /// The owner identifier routes are uploaded under.
    pub fn owner(&self) -> &str {
        &self.inner.owner
    }

    /// Whether the session is currently subscribed to its source.
    pub fn is_active(&self) -> bool {
        self.inner.state().active
    }

    /// Begin tracking.
    ///
    /// Resets the points and subscribes to the position source. Returns
    /// `false` without side effects if the session is already tracking.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn start(&self) -> bool {
        let inner = &self.inner;
        let mut state = inner.state();
        if state.active {
            info!(owner = %inner.owner, "Already tracking");
            return false;
        }

        if let Some(old) = state.subscription.take() {
            old.cancel();
        }
        state.points.clear();
        state.generation += 1;

        let watch = inner.source.watch(&inner.options);
        state.subscription = Some(watch.cancellation_token());
        tokio::spawn(drive(Arc::downgrade(inner), watch, state.generation));

        state.active = true;
        inner.events.send(SessionEvent::Started {
            owner: inner.owner.clone(),
        });
        drop(state);

        info!(owner = %inner.owner, "Tracking started");
        true
    }

    /// Stop tracking. The accumulated points are kept.
    ///
    /// Returns `false` if the session was not tracking. Safe to call from
    /// inside an observer.
    pub fn stop(&self) -> bool {
        let inner = &self.inner;
        let mut state = inner.state();
        if !state.active {
            info!(owner = %inner.owner, "Not tracking");
            return false;
        }

        state.active = false;
        if let Some(token) = state.subscription.take() {
            token.cancel();
        }
        let points = state.points.len();
        inner.events.send(SessionEvent::Stopped {
            owner: inner.owner.clone(),
            points,
        });
        drop(state);

        info!(owner = %inner.owner, points, "Tracking stopped");
        true
    }

    /// A copy of the points recorded so far, in arrival order.
    pub fn current_route(&self) -> Vec<PositionSample> {
        self.inner.state().points.clone()
    }

    /// Number of points recorded so far.
    pub fn len(&self) -> usize {
        self.inner.state().points.len()
    }

    /// Whether no points have been recorded.
    pub fn is_empty(&self) -> bool {
        self.inner.state().points.is_empty()
    }

    /// Discard all points. Does not affect the subscription.
    pub fn clear(&self) {
        let discarded = {
            let mut state = self.inner.state();
            let discarded = state.points.len();
            state.points.clear();
            self.inner.events.send(SessionEvent::Cleared { discarded });
            discarded
        };
        debug!(owner = %self.inner.owner, discarded, "Cleared points");
    }

    /// Upload the current points as the route for `date` (today, UTC, if `None`).
    ///
    /// Fails with [`Error::EmptyRoute`] without contacting the backend when
    /// there are no points. The points are left untouched whether the
    /// upload succeeds or fails.
    pub async fn upload(&self, date: Option<RouteDate>) -> Result<UploadAck> {
        let date = date.unwrap_or_else(RouteDate::today);
        let points = self.current_route();
        if points.is_empty() {
            return Err(Error::EmptyRoute);
        }

        let route = Route::new(self.inner.owner.clone(), date, points);
        let ack = self.inner.backend.upload(&route).await?;

        if ack.point_count != route.len() {
            warn!(
                owner = %self.inner.owner,
                %date,
                sent = route.len(),
                acknowledged = ack.point_count,
                "Backend acknowledged a different point count"
            );
        }
        info!(
            owner = %self.inner.owner,
            %date,
            points = ack.point_count,
            replaced = ack.replaced,
            "Route uploaded"
        );
        self.inner.events.send(SessionEvent::Uploaded {
            date,
            point_count: ack.point_count,
            replaced: ack.replaced,
        });
        Ok(ack)
    }

    /// Register a callback invoked for every recorded sample.
    pub fn on_sample<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&PositionSample) + Send + Sync + 'static,
    {
        let mut observers = self.inner.observers();
        let id = ObserverId(observers.next_id);
        observers.next_id += 1;
        observers.samples.push((id, Arc::new(observer)));
        id
    }

    /// Register a callback invoked for every position source error.
    pub fn on_error<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&PositionError) + Send + Sync + 'static,
    {
        let mut observers = self.inner.observers();
        let id = ObserverId(observers.next_id);
        observers.next_id += 1;
        observers.errors.push((id, Arc::new(observer)));
        id
    }

    /// Unregister an observer. Returns `false` if the id was unknown.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.inner.observers();
        let before = observers.samples.len() + observers.errors.len();
        observers.samples.retain(|(existing, _)| *existing != id);
        observers.errors.retain(|(existing, _)| *existing != id);
        before != observers.samples.len() + observers.errors.len()
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> EventReceiver {
        self.inner.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, MockPositionSource};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use time::macros::datetime;
    use tokio::sync::mpsc;

    fn sample(lat: f64, lng: f64) -> PositionSample {
        PositionSample::now(lat, lng)
    }

    fn session(source: &Arc<MockPositionSource>, backend: &Arc<MockBackend>) -> RouteSession {
        RouteSession::new("1", source.clone(), backend.clone()).unwrap()
    }

    async fn next_sample_event(events: &mut EventReceiver) -> PositionSample {
        loop {
            match events.recv().await.unwrap() {
                SessionEvent::Sample { sample, .. } => return sample,
                _ => continue,
            }
        }
    }

    async fn wait_for(events: &mut EventReceiver, pred: impl Fn(&SessionEvent) -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let event = events.recv().await.unwrap();
                if pred(&event) {
                    break;
                }
            }
        })
        .await
        .unwrap();
    }

    #[test]
    fn test_rejects_invalid_owner() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        assert!(RouteSession::new("", source.clone(), backend.clone()).is_err());
        assert!(RouteSession::new("a/b", source, backend).is_err());
    }

    #[tokio::test]
    async fn test_samples_appended_in_arrival_order() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);
        let mut events = session.subscribe();

        assert!(session.start());
        let pushed = vec![sample(1.0, 1.0), sample(2.0, 2.0), sample(3.0, 3.0)];
        for s in &pushed {
            source.push_sample(*s).await;
            next_sample_event(&mut events).await;
        }

        assert_eq!(session.current_route(), pushed);
        assert_eq!(session.len(), 3);
    }

    #[tokio::test]
    async fn test_start_twice_creates_one_subscription() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);

        assert!(session.start());
        assert!(!session.start());
        assert!(session.is_active());
        assert_eq!(source.watch_count(), 1);
        assert_eq!(source.active_watches(), 1);
    }

    #[tokio::test]
    async fn test_stop_keeps_points_and_restart_resets_them() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);
        let mut events = session.subscribe();

        session.start();
        source.push_sample(sample(25.0, 121.0)).await;
        next_sample_event(&mut events).await;

        assert!(session.stop());
        assert!(!session.is_active());
        assert_eq!(session.len(), 1);
        assert_eq!(source.active_watches(), 0);
        assert!(!session.stop());

        session.start();
        assert!(session.is_empty());
        assert_eq!(source.watch_count(), 2);
        assert_eq!(source.active_watches(), 1);
    }

    #[tokio::test]
    async fn test_source_closing_goes_idle_and_keeps_points() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);
        let mut events = session.subscribe();

        session.start();
        source.push_sample(sample(25.0, 121.0)).await;
        next_sample_event(&mut events).await;

        source.close_all();
        wait_for(&mut events, |e| {
            matches!(e, SessionEvent::Stopped { points: 1, .. })
        })
        .await;

        assert!(!session.is_active());
        assert_eq!(session.len(), 1);
        assert!(!session.stop());

        assert!(session.start());
        assert!(session.is_empty());
        assert_eq!(source.watch_count(), 2);
        assert_eq!(source.active_watches(), 1);
    }

    #[tokio::test]
    async fn test_samples_after_stop_are_ignored() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);

        session.start();
        session.stop();
        assert_eq!(source.push_sample(sample(1.0, 1.0)).await, 0);
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_clear_empties_in_any_state() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);
        let mut events = session.subscribe();

        session.clear();
        assert!(session.current_route().is_empty());

        session.start();
        source.push_sample(sample(1.0, 1.0)).await;
        next_sample_event(&mut events).await;
        session.clear();
        assert!(session.current_route().is_empty());
        assert!(session.is_active());

        source.push_sample(sample(2.0, 2.0)).await;
        next_sample_event(&mut events).await;
        session.stop();
        session.clear();
        assert!(session.current_route().is_empty());
    }

    #[tokio::test]
    async fn test_current_route_is_a_copy() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);
        let mut events = session.subscribe();

        session.start();
        source.push_sample(sample(1.0, 1.0)).await;
        next_sample_event(&mut events).await;

        let mut copy = session.current_route();
        copy.clear();
        assert_eq!(session.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_empty_makes_no_backend_call() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);

        let result = session.upload(None).await;
        assert!(matches!(result, Err(Error::EmptyRoute)));
        assert_eq!(backend.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_sends_route_and_keeps_points() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);
        let mut events = session.subscribe();

        let first = PositionSample::new(25.0479, 121.5171, datetime!(2025-01-31 08:00 UTC));
        let second = PositionSample::new(25.0465, 121.5168, datetime!(2025-01-31 08:00:30 UTC));

        session.start();
        for s in [first, second] {
            source.push_sample(s).await;
            next_sample_event(&mut events).await;
        }

        let date: RouteDate = "2025-01-31".parse().unwrap();
        let ack = session.upload(Some(date)).await.unwrap();
        assert_eq!(ack.point_count, 2);
        assert!(!ack.replaced);

        let uploaded = backend.last_upload().await.unwrap();
        assert_eq!(uploaded.owner, "1");
        assert_eq!(uploaded.date, date);
        assert_eq!(uploaded.points, vec![first, second]);
        assert_eq!(session.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_points() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);
        let mut events = session.subscribe();

        session.start();
        source.push_sample(sample(1.0, 1.0)).await;
        next_sample_event(&mut events).await;

        backend.set_should_fail(true, Some("database is locked")).await;
        let err = session.upload(None).await.unwrap_err();
        assert!(matches!(err, Error::BackendRejected { status: 500, .. }));
        assert_eq!(session.len(), 1);

        backend.set_should_fail(false, None).await;
        assert!(session.upload(None).await.is_ok());
        assert_eq!(backend.upload_count(), 2);
    }

    #[tokio::test]
    async fn test_source_errors_do_not_stop_tracking() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);
        let mut events = session.subscribe();

        let (tx, mut rx) = mpsc::unbounded_channel();
        session.on_error(move |e| {
            let _ = tx.send(e.clone());
        });

        session.start();
        source.push_error(PositionError::Timeout(Duration::from_secs(10))).await;
        assert_eq!(
            rx.recv().await.unwrap(),
            PositionError::Timeout(Duration::from_secs(10))
        );

        assert!(session.is_active());
        source.push_sample(sample(1.0, 1.0)).await;
        next_sample_event(&mut events).await;
        assert_eq!(session.len(), 1);
    }

    #[tokio::test]
    async fn test_stop_from_error_observer() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);
        let mut events = session.subscribe();

        let handle = session.clone();
        let id = session.on_error(move |_| {
            handle.stop();
        });

        session.start();
        source.push_error(PositionError::PermissionDenied).await;
        wait_for(&mut events, |e| matches!(e, SessionEvent::Stopped { .. })).await;

        assert!(!session.is_active());
        assert!(session.remove_observer(id));
    }

    #[tokio::test]
    async fn test_panicking_observer_is_isolated() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);

        session.on_sample(|_| panic!("observer bug"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        session.on_sample(move |s| {
            let _ = tx.send(*s);
        });

        session.start();
        source.push_sample(sample(1.0, 1.0)).await;
        source.push_sample(sample(2.0, 2.0)).await;

        assert_eq!(rx.recv().await.unwrap().latitude, 1.0);
        assert_eq!(rx.recv().await.unwrap().latitude, 2.0);
        assert!(session.is_active());
        assert_eq!(session.len(), 2);
    }

    #[tokio::test]
    async fn test_removed_observer_is_not_called() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);
        let mut events = session.subscribe();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = session.on_sample(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(session.remove_observer(id));
        assert!(!session.remove_observer(id));

        session.start();
        source.push_sample(sample(1.0, 1.0)).await;
        next_sample_event(&mut events).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dropping_session_cancels_subscription() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);

        session.start();
        assert_eq!(source.active_watches(), 1);
        drop(session);
        assert_eq!(source.active_watches(), 0);
    }

    #[tokio::test]
    async fn test_event_sequence() {
        let source = Arc::new(MockPositionSource::new());
        let backend = Arc::new(MockBackend::new());
        let session = session(&source, &backend);
        let mut events = session.subscribe();

        session.start();
        source.push_sample(sample(1.0, 1.0)).await;
        next_sample_event(&mut events).await;
        session.stop();
        session.clear();

        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::Stopped { points: 1, .. }
        ));
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::Cleared { discarded: 1 }
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn current_route_preserves_arrival_order(
                coords in proptest::collection::vec((-90.0f64..=90.0, -180.0f64..=180.0), 0..40)
            ) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();

                let route = runtime.block_on(async {
                    let source = Arc::new(MockPositionSource::new());
                    let backend = Arc::new(MockBackend::new());
                    let session = session(&source, &backend);
                    let mut events = session.subscribe();

                    session.start();
                    for (lat, lng) in &coords {
                        source.push_sample(sample(*lat, *lng)).await;
                        next_sample_event(&mut events).await;
                    }
                    session.current_route()
                });

                let got: Vec<(f64, f64)> = route.iter().map(|s| (s.latitude, s.longitude)).collect();
                prop_assert_eq!(got, coords);
            }
        }
    }
}
