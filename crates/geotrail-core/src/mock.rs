//! Mock position source and route backend for testing.
//!
//! Neither mock touches real hardware or the network, so sessions can be
//! exercised deterministically.
//!
//! # Features
//!
//! - **Scripted pushes**: [`MockPositionSource::push_sample`] delivers a fix to
//!   every live subscription
//! - **Failure injection**: both mocks can be told to fail, permanently or for
//!   a number of calls
//! - **Call counting**: assert how often the source was watched or the backend
//!   was called

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;

use geotrail_types::{DeleteAck, PositionSample, Route, RouteDate, UploadAck};

use crate::backend::RouteBackend;
use crate::error::{Error, PositionError, Result};
use crate::source::{PositionSource, PositionWatch, SampleResult, WatchOptions};

/// Most points the mock backend accepts per route, matching the service default.
pub const MOCK_MAX_ROUTE_POINTS: usize = 10_000;

type WatchSlot = (mpsc::Sender<SampleResult>, CancellationToken);

/// A scripted position source.
///
/// ```
/// use geotrail_core::{MockPositionSource, PositionSource};
///
/// #[tokio::main]
/// async fn main() {
///     let source = MockPositionSource::new();
///     let fix = source.current_position().await.unwrap();
///     assert_eq!(fix.latitude, 25.0479);
/// }
/// ```
pub struct MockPositionSource {
    current: RwLock<PositionSample>,
    watches: Mutex<Vec<WatchSlot>>,
    watch_count: AtomicU32,
    read_count: AtomicU32,
    should_fail: RwLock<Option<PositionError>>,
    /// Number of single-shot requests to fail before succeeding.
    remaining_failures: AtomicU32,
    /// Simulated fix latency in milliseconds (0 = no delay).
    read_latency_ms: AtomicU64,
}

impl std::fmt::Debug for MockPositionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPositionSource")
            .field("watch_count", &self.watch_count.load(Ordering::Relaxed))
            .field("active_watches", &self.active_watches())
            .finish()
    }
}

impl Default for MockPositionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPositionSource {
    /// Create a source whose single-shot fix is Taipei Main Station.
    pub fn new() -> Self {
        Self::with_position(PositionSample::now(25.0479, 121.5171))
    }

    /// Create a source that reports `sample` for single-shot requests.
    pub fn with_position(sample: PositionSample) -> Self {
        Self {
            current: RwLock::new(sample),
            watches: Mutex::new(Vec::new()),
            watch_count: AtomicU32::new(0),
            read_count: AtomicU32::new(0),
            should_fail: RwLock::new(None),
            remaining_failures: AtomicU32::new(0),
            read_latency_ms: AtomicU64::new(0),
        }
    }

    fn live_senders(&self) -> Vec<mpsc::Sender<SampleResult>> {
        let mut watches = self.watches.lock().unwrap_or_else(PoisonError::into_inner);
        watches.retain(|(tx, token)| !token.is_cancelled() && !tx.is_closed());
        watches.iter().map(|(tx, _)| tx.clone()).collect()
    }

    /// Deliver a fix to every live subscription. Returns how many received it.
    pub async fn push_sample(&self, sample: PositionSample) -> usize {
        self.push(Ok(sample)).await
    }

    /// Deliver an error to every live subscription. Returns how many received it.
    pub async fn push_error(&self, error: PositionError) -> usize {
        self.push(Err(error)).await
    }

    async fn push(&self, item: SampleResult) -> usize {
        let mut delivered = 0;
        for tx in self.live_senders() {
            if tx.send(item.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Close every subscription from the source side.
    pub fn close_all(&self) {
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of subscriptions that have not been cancelled or dropped.
    pub fn active_watches(&self) -> usize {
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(tx, token)| !token.is_cancelled() && !tx.is_closed())
            .count()
    }

    /// Total number of subscriptions ever created.
    pub fn watch_count(&self) -> u32 {
        self.watch_count.load(Ordering::Relaxed)
    }

    /// Number of successful single-shot fixes served.
    pub fn read_count(&self) -> u32 {
        self.read_count.load(Ordering::Relaxed)
    }

    /// Change the single-shot fix.
    pub async fn set_position(&self, sample: PositionSample) {
        *self.current.write().await = sample;
    }

    /// Make every single-shot request fail with `error` (or succeed again with `None`).
    pub async fn set_should_fail(&self, error: Option<PositionError>) {
        *self.should_fail.write().await = error;
    }

    /// Fail the next `count` single-shot requests with `Unavailable`.
    pub fn set_transient_failures(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Delay each single-shot fix by `latency`.
    pub fn set_read_latency(&self, latency: Duration) {
        self.read_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }
}

#[async_trait]
impl PositionSource for MockPositionSource {
    async fn current_position(&self) -> std::result::Result<PositionSample, PositionError> {
        let latency = self.read_latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.remaining_failures.load(Ordering::Relaxed) > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(PositionError::unavailable("mock transient failure"));
        }

        if let Some(error) = self.should_fail.read().await.clone() {
            return Err(error);
        }

        self.read_count.fetch_add(1, Ordering::Relaxed);
        Ok(*self.current.read().await)
    }

    fn watch(&self, options: &WatchOptions) -> PositionWatch {
        let (tx, token, watch) = PositionWatch::channel(options.buffer_size);
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((tx, token));
        self.watch_count.fetch_add(1, Ordering::Relaxed);
        watch
    }
}

/// An in-memory route backend.
///
/// Keeps routes keyed by `(owner, date)` with the same replace-on-upload
/// semantics as the HTTP service.
pub struct MockBackend {
    routes: RwLock<BTreeMap<(String, RouteDate), Route>>,
    uploads: RwLock<Vec<Route>>,
    upload_count: AtomicU32,
    fetch_count: AtomicU32,
    history_count: AtomicU32,
    delete_count: AtomicU32,
    should_fail: AtomicBool,
    fail_status: AtomicU16,
    fail_detail: RwLock<String>,
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("upload_count", &self.upload_count())
            .field("should_fail", &self.should_fail.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(BTreeMap::new()),
            uploads: RwLock::new(Vec::new()),
            upload_count: AtomicU32::new(0),
            fetch_count: AtomicU32::new(0),
            history_count: AtomicU32::new(0),
            delete_count: AtomicU32::new(0),
            should_fail: AtomicBool::new(false),
            fail_status: AtomicU16::new(500),
            fail_detail: RwLock::new("mock failure".to_string()),
        }
    }

    /// Store a route directly, bypassing call counting.
    pub async fn insert(&self, route: Route) {
        self.routes
            .write()
            .await
            .insert((route.owner.clone(), route.date), route);
    }

    /// Make every call fail with a rejection (status 500 unless changed with
    /// [`set_fail_status`](Self::set_fail_status)).
    pub async fn set_should_fail(&self, fail: bool, detail: Option<&str>) {
        self.should_fail.store(fail, Ordering::Relaxed);
        if let Some(detail) = detail {
            *self.fail_detail.write().await = detail.to_string();
        }
    }

    /// Status code used for injected failures.
    pub fn set_fail_status(&self, status: u16) {
        self.fail_status.store(status, Ordering::Relaxed);
    }

    /// Number of upload calls, including failed ones.
    pub fn upload_count(&self) -> u32 {
        self.upload_count.load(Ordering::Relaxed)
    }

    /// Number of fetch calls.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    /// Number of history calls.
    pub fn history_count(&self) -> u32 {
        self.history_count.load(Ordering::Relaxed)
    }

    /// Number of delete calls.
    pub fn delete_count(&self) -> u32 {
        self.delete_count.load(Ordering::Relaxed)
    }

    /// The most recent route that was accepted.
    pub async fn last_upload(&self) -> Option<Route> {
        self.uploads.read().await.last().cloned()
    }

    /// Number of routes currently stored.
    pub async fn stored_routes(&self) -> usize {
        self.routes.read().await.len()
    }

    async fn check_should_fail(&self) -> Result<()> {
        if self.should_fail.load(Ordering::Relaxed) {
            Err(Error::rejected(
                self.fail_status.load(Ordering::Relaxed),
                self.fail_detail.read().await.clone(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RouteBackend for MockBackend {
    async fn upload(&self, route: &Route) -> Result<UploadAck> {
        self.upload_count.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail().await?;
        route
            .validate(MOCK_MAX_ROUTE_POINTS)
            .map_err(|e| Error::rejected(400, e.to_string()))?;

        let replaced = self
            .routes
            .write()
            .await
            .insert((route.owner.clone(), route.date), route.clone())
            .is_some();
        self.uploads.write().await.push(route.clone());

        Ok(UploadAck {
            message: if replaced {
                "GPS route replaced successfully".to_string()
            } else {
                "GPS route uploaded successfully".to_string()
            },
            user_id: route.owner.clone(),
            date: route.date,
            point_count: route.len(),
            replaced,
        })
    }

    async fn fetch(&self, owner: &str, date: RouteDate) -> Result<Route> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail().await?;
        self.routes
            .read()
            .await
            .get(&(owner.to_string(), date))
            .cloned()
            .ok_or_else(|| Error::not_found(owner, date))
    }

    async fn fetch_history(&self, owner: &str, limit: u32) -> Result<Vec<Route>> {
        self.history_count.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail().await?;
        let routes = self.routes.read().await;
        Ok(routes
            .values()
            .rev()
            .filter(|route| route.owner == owner)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn delete(&self, owner: &str, date: RouteDate) -> Result<DeleteAck> {
        self.delete_count.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail().await?;
        let removed = self
            .routes
            .write()
            .await
            .remove(&(owner.to_string(), date))
            .ok_or_else(|| Error::not_found(owner, date))?;

        Ok(DeleteAck {
            message: "GPS route deleted successfully".to_string(),
            user_id: owner.to_string(),
            date,
            deleted_points: removed.len(),
        })
    }
}
