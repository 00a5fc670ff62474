//! Position sources and cancellable position subscriptions.
//!
//! A [`PositionSource`] yields a single fix on request and can be watched
//! for a continuous sequence of fixes. A watch is a [`PositionWatch`]: an
//! async stream over a bounded channel that stops when cancelled or dropped.
//!
//! Sources that can only answer single-shot requests get a watch for free
//! through [`PositionWatch::polling`], which polls at
//! [`WatchOptions::interval`] and turns slow fixes into
//! [`PositionError::Timeout`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::Stream;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use geotrail_types::PositionSample;

use crate::error::{Error, PositionError};

/// Result type for watch items.
pub type SampleResult = std::result::Result<PositionSample, PositionError>;

/// Something that can report the device's geographic position.
///
/// # Example
///
/// ```ignore
/// use geotrail_core::{PositionSource, WatchOptions};
/// use futures::StreamExt;
///
/// async fn follow<S: PositionSource>(source: &S) {
///     let fix = source.current_position().await;
///     let mut watch = source.watch(&WatchOptions::default());
///     while let Some(item) = watch.next().await {
///         println!("{:?}", item);
///     }
/// }
/// ```
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Obtain a single fix.
    async fn current_position(&self) -> std::result::Result<PositionSample, PositionError>;

    /// Start a continuous subscription.
    ///
    /// Each call creates an independent subscription; cancelling one does not
    /// affect others.
    fn watch(&self, options: &WatchOptions) -> PositionWatch;
}

/// Options for position subscriptions.
///
/// ```
/// use std::time::Duration;
/// use geotrail_core::WatchOptions;
///
/// let options = WatchOptions::builder()
///     .interval(Duration::from_secs(5))
///     .timeout(Duration::from_secs(2))
///     .build();
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// How often polling sources take a fix. Default: 30 seconds.
    pub interval: Duration,
    /// Longest wait for a single fix before reporting a timeout. Default: 10 seconds.
    pub timeout: Duration,
    /// Buffer size of the subscription channel. Default: 16.
    pub buffer_size: usize,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
            buffer_size: 16,
        }
    }
}

impl WatchOptions {
    /// Create a new builder for WatchOptions.
    pub fn builder() -> WatchOptionsBuilder {
        WatchOptionsBuilder::default()
    }

    /// Create options with a specific interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Validate the options and return an error if invalid.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::invalid_config("buffer_size must be > 0"));
        }
        if self.interval.is_zero() {
            return Err(Error::invalid_config("interval must be > 0"));
        }
        if self.timeout.is_zero() {
            return Err(Error::invalid_config("timeout must be > 0"));
        }
        Ok(())
    }
}

/// Builder for WatchOptions.
#[derive(Debug, Clone, Default)]
pub struct WatchOptionsBuilder {
    options: WatchOptions,
}

impl WatchOptionsBuilder {
    /// Set the polling interval.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.options.interval = interval;
        self
    }

    /// Set the per-fix timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set the buffer size.
    #[must_use]
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.options.buffer_size = size;
        self
    }

    /// Build the WatchOptions.
    #[must_use]
    pub fn build(self) -> WatchOptions {
        self.options
    }
}

/// A cancellable stream of position fixes.
///
/// Cancellation is synchronous and idempotent: after [`cancel`](Self::cancel)
/// the producer stops and the stream ends once buffered items are drained.
/// Dropping the watch cancels it.
pub struct PositionWatch {
    receiver: mpsc::Receiver<SampleResult>,
    cancel_token: CancellationToken,
}

impl PositionWatch {
    /// Wrap an existing channel. The producer must stop when `cancel_token`
    /// is cancelled.
    pub fn from_channel(
        receiver: mpsc::Receiver<SampleResult>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            cancel_token,
        }
    }

    /// Create a bounded channel and the watch reading from it.
    ///
    /// Returns the sender, the token the producer should observe, and the watch.
    pub fn channel(
        buffer_size: usize,
    ) -> (mpsc::Sender<SampleResult>, CancellationToken, PositionWatch) {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        let token = CancellationToken::new();
        let watch = Self::from_channel(rx, token.clone());
        (tx, token, watch)
    }

    /// Build a watch by polling `fetch` every `options.interval`.
    ///
    /// Fixes slower than `options.timeout` are reported as
    /// [`PositionError::Timeout`]. Must be called within a tokio runtime.
    pub fn polling<F, Fut>(options: &WatchOptions, mut fetch: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = SampleResult> + Send + 'static,
    {
        let (tx, token, watch) = Self::channel(options.buffer_size);
        let period = options.interval;
        let fix_timeout = options.timeout;

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Position watch cancelled, stopping poller");
                        break;
                    }
                    _ = ticker.tick() => {
                        let item = match timeout(fix_timeout, fetch()).await {
                            Ok(result) => result,
                            Err(_) => Err(PositionError::Timeout(fix_timeout)),
                        };
                        if token.is_cancelled() {
                            break;
                        }
                        if tx.send(item).await.is_err() {
                            debug!("Position watch receiver dropped, stopping poller");
                            break;
                        }
                    }
                }
            }
        });

        watch
    }

    /// Cancel the subscription. Calling this more than once has no further effect.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Whether the subscription has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// A token that cancels this subscription when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

impl std::fmt::Debug for PositionWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionWatch")
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish()
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl Stream for PositionWatch {
    type Item = SampleResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}
