//! A simulated position source.
//!
//! [`RandomWalkSource`] wanders randomly around a starting coordinate. It is
//! used by the CLI's `track` command when no real device is available and by
//! the `simulate_track` example.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use geotrail_types::PositionSample;

use crate::error::PositionError;
use crate::source::{PositionSource, PositionWatch, WatchOptions};

const METERS_PER_DEGREE: f64 = 111_320.0;

#[derive(Debug)]
struct Walk {
    latitude: f64,
    longitude: f64,
    max_step_m: f64,
    dropout: f64,
    rng: StdRng,
}

impl Walk {
    fn step(&mut self) -> Result<PositionSample, PositionError> {
        if self.dropout > 0.0 && self.rng.random_bool(self.dropout) {
            return Err(PositionError::unavailable("simulated signal loss"));
        }

        let bearing = self.rng.random_range(0.0..std::f64::consts::TAU);
        let distance = self.rng.random_range(0.0..=self.max_step_m);

        let d_lat = distance * bearing.cos() / METERS_PER_DEGREE;
        let lat_scale = self.latitude.to_radians().cos().abs().max(1e-6);
        let d_lng = distance * bearing.sin() / (METERS_PER_DEGREE * lat_scale);

        self.latitude = (self.latitude + d_lat).clamp(-90.0, 90.0);
        self.longitude = wrap_longitude(self.longitude + d_lng);

        Ok(PositionSample::now(self.latitude, self.longitude))
    }
}

fn wrap_longitude(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        lng
    } else {
        (lng + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// A position source that performs a random walk.
///
/// Every fix moves up to `max_step_m` meters in a random direction from the
/// previous one. Latitude is clamped to `[-90, 90]` and longitude wraps
/// around the antimeridian, so every fix is in range.
#[derive(Debug, Clone)]
pub struct RandomWalkSource {
    walk: Arc<Mutex<Walk>>,
}

impl RandomWalkSource {
    /// Start a walk at the given coordinate with a random seed.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self::from_rng(latitude, longitude, StdRng::from_os_rng())
    }

    /// Start a reproducible walk.
    pub fn with_seed(latitude: f64, longitude: f64, seed: u64) -> Self {
        Self::from_rng(latitude, longitude, StdRng::seed_from_u64(seed))
    }

    fn from_rng(latitude: f64, longitude: f64, rng: StdRng) -> Self {
        Self {
            walk: Arc::new(Mutex::new(Walk {
                latitude: latitude.clamp(-90.0, 90.0),
                longitude: wrap_longitude(longitude),
                max_step_m: 15.0,
                dropout: 0.0,
                rng,
            })),
        }
    }

    /// Largest distance between consecutive fixes (default 15 m).
    #[must_use]
    pub fn max_step(self, meters: f64) -> Self {
        self.with_walk(|walk| walk.max_step_m = meters.max(0.0));
        self
    }

    /// Probability in `[0, 1]` that a fix fails with `Unavailable`.
    #[must_use]
    pub fn dropout(self, probability: f64) -> Self {
        self.with_walk(|walk| walk.dropout = probability.clamp(0.0, 1.0));
        self
    }

    fn with_walk<T>(&self, f: impl FnOnce(&mut Walk) -> T) -> T {
        let mut walk = self.walk.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut walk)
    }
}

#[async_trait]
impl PositionSource for RandomWalkSource {
    async fn current_position(&self) -> Result<PositionSample, PositionError> {
        self.with_walk(Walk::step)
    }

    fn watch(&self, options: &WatchOptions) -> PositionWatch {
        let source = self.clone();
        PositionWatch::polling(options, move || {
            let item = source.with_walk(Walk::step);
            async move { item }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;

    #[tokio::test]
    async fn test_steps_stay_close() {
        let source = RandomWalkSource::with_seed(25.0479, 121.5171, 7).max_step(10.0);
        let mut previous = source.current_position().await.unwrap();
        for _ in 0..100 {
            let next = source.current_position().await.unwrap();
            assert!(next.validate().is_ok());
            assert!(previous.distance_to(&next) <= 10.5);
            previous = next;
        }
    }

    #[tokio::test]
    async fn test_seeded_walks_repeat() {
        let a = RandomWalkSource::with_seed(0.0, 0.0, 42);
        let b = RandomWalkSource::with_seed(0.0, 0.0, 42);
        for _ in 0..10 {
            let (x, y) = (
                a.current_position().await.unwrap(),
                b.current_position().await.unwrap(),
            );
            assert_eq!(x.latitude, y.latitude);
            assert_eq!(x.longitude, y.longitude);
        }
    }

    #[tokio::test]
    async fn test_stays_in_range_near_poles_and_antimeridian() {
        let source = RandomWalkSource::with_seed(89.9999, 179.9999, 3).max_step(500.0);
        for _ in 0..200 {
            let fix = source.current_position().await.unwrap();
            assert!(fix.validate().is_ok(), "out of range: {fix:?}");
        }
    }

    #[tokio::test]
    async fn test_full_dropout_always_fails() {
        let source = RandomWalkSource::with_seed(0.0, 0.0, 1).dropout(1.0);
        assert!(matches!(
            source.current_position().await,
            Err(PositionError::Unavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_polls() {
        let source = RandomWalkSource::with_seed(25.0, 121.0, 9);
        let mut watch = source.watch(&WatchOptions::with_interval(Duration::from_secs(1)));
        for _ in 0..3 {
            assert!(watch.next().await.unwrap().is_ok());
        }
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(10.0), 10.0);
        assert!((wrap_longitude(181.0) - -179.0).abs() < 1e-9);
        assert!((wrap_longitude(-181.0) - 179.0).abs() < 1e-9);
    }
}
