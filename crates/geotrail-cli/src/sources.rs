//! Sample files and the position sources the CLI feeds into a session.
//!
//! A sample file is either a JSON array of `{"lat", "lng", "ts"}` objects or
//! CSV with a `lat,lng,ts` header.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::debug;

use geotrail_core::{PositionError, PositionSample, PositionSource, PositionWatch, WatchOptions};

/// Read and validate every sample in a file.
pub fn load_samples(path: &Path) -> Result<Vec<PositionSample>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let samples = parse_samples(&content)
        .with_context(|| format!("Failed to parse samples from {}", path.display()))?;
    debug!(count = samples.len(), path = %path.display(), "Loaded samples");
    Ok(samples)
}

/// Parse samples from JSON (if the content starts with `[`) or CSV.
pub fn parse_samples(content: &str) -> Result<Vec<PositionSample>> {
    let samples: Vec<PositionSample> = if content.trim_start().starts_with('[') {
        serde_json::from_str(content).context("Invalid JSON sample array")?
    } else {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        reader
            .deserialize()
            .enumerate()
            .map(|(i, row)| row.with_context(|| format!("Invalid CSV record {}", i + 1)))
            .collect::<Result<_>>()?
    };

    if samples.is_empty() {
        bail!("File contains no samples");
    }
    for (i, sample) in samples.iter().enumerate() {
        sample
            .validate()
            .with_context(|| format!("Invalid sample {}", i + 1))?;
    }
    Ok(samples)
}

/// Replays recorded samples in order, one per watch interval.
///
/// The watch ends after the last sample.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    samples: Arc<Vec<PositionSample>>,
    cursor: Arc<AtomicUsize>,
}

impl ReplaySource {
    pub fn new(samples: Vec<PositionSample>) -> Self {
        Self {
            samples: Arc::new(samples),
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

#[async_trait]
impl PositionSource for ReplaySource {
    async fn current_position(&self) -> Result<PositionSample, PositionError> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.samples
            .get(index)
            .copied()
            .ok_or_else(|| PositionError::unavailable("replay exhausted"))
    }

    fn watch(&self, options: &WatchOptions) -> PositionWatch {
        let (tx, token, watch) = PositionWatch::channel(options.buffer_size);
        let samples = Arc::clone(&self.samples);
        let period = options.interval;

        tokio::spawn(async move {
            for (i, sample) in samples.iter().enumerate() {
                if i > 0 {
                    tokio::select! {
                        _ = token.cancelled() => return,
                        _ = tokio::time::sleep(period) => {}
                    }
                }
                if token.is_cancelled() || tx.send(Ok(*sample)).await.is_err() {
                    return;
                }
            }
            debug!("Replay finished");
        });

        watch
    }
}

/// Always reports the same coordinates, stamped with the current time.
#[derive(Debug, Clone, Copy)]
pub struct FixedSource {
    latitude: f64,
    longitude: f64,
}

impl FixedSource {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[async_trait]
impl PositionSource for FixedSource {
    async fn current_position(&self) -> Result<PositionSample, PositionError> {
        Ok(PositionSample::now(self.latitude, self.longitude))
    }

    fn watch(&self, options: &WatchOptions) -> PositionWatch {
        let source = *self;
        PositionWatch::polling(options, move || async move { source.current_position().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;
    use time::macros::datetime;

    #[test]
    fn test_parse_csv() {
        let csv = "lat,lng,ts\n\
                   25.047924, 121.517081, 2025-01-31T08:30:00Z\n\
                   25.0465,121.5168,2025-01-31T08:32:00.500Z\n";
        let samples = parse_samples(csv).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].latitude, 25.047924);
        assert_eq!(
            samples[1].captured_at,
            datetime!(2025-01-31 08:32:00.5 UTC)
        );
    }

    #[test]
    fn test_parse_json() {
        let json = r#"[
            {"lat": 25.047924, "lng": 121.517081, "ts": "2025-01-31T08:30:00.000Z"},
            {"lat": 25.0465, "lng": 121.5168, "ts": "2025-01-31T08:32:00.000Z"}
        ]"#;
        let samples = parse_samples(json).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].longitude, 121.5168);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_samples("lat,lng,ts\n").is_err());
        assert!(parse_samples("[]").is_err());
        assert!(parse_samples("lat,lng,ts\n95.0,0.0,2025-01-31T08:30:00Z\n").is_err());
        assert!(parse_samples("lat,lng,ts\n1.0,2.0,yesterday\n").is_err());

        let err = parse_samples("lat,lng,ts\n1.0,2.0,2025-01-31T08:30:00Z\n1.0,200.0,2025-01-31T08:31:00Z\n")
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid sample 2"));
    }

    #[test]
    fn test_load_samples_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route.csv");
        std::fs::write(&path, "lat,lng,ts\n1.0,2.0,2025-01-31T08:30:00Z\n").unwrap();
        assert_eq!(load_samples(&path).unwrap().len(), 1);
        assert!(load_samples(&dir.path().join("missing.csv")).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_watch_emits_in_order_then_ends() {
        let samples = vec![
            PositionSample::new(1.0, 1.0, datetime!(2025-01-31 08:00:00 UTC)),
            PositionSample::new(2.0, 2.0, datetime!(2025-01-31 08:00:01 UTC)),
            PositionSample::new(3.0, 3.0, datetime!(2025-01-31 08:00:02 UTC)),
        ];
        let source = ReplaySource::new(samples.clone());
        let watch = source.watch(&WatchOptions::with_interval(Duration::from_secs(1)));

        let received: Vec<PositionSample> = watch.map(|r| r.unwrap()).collect().await;
        assert_eq!(received, samples);
    }

    #[tokio::test]
    async fn test_replay_current_position_exhausts() {
        let source = ReplaySource::new(vec![PositionSample::now(1.0, 1.0)]);
        assert!(source.current_position().await.is_ok());
        assert!(matches!(
            source.current_position().await,
            Err(PositionError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_fixed_source() {
        let sample = FixedSource::new(-33.8688, 151.2093)
            .current_position()
            .await
            .unwrap();
        assert_eq!(sample.latitude, -33.8688);
        assert_eq!(sample.longitude, 151.2093);
    }
}
