//! Prerecorded feed replay.
//!
//! One `<exchange>.ndjson` file per venue, each line a
//! `{"ts_ms": ..., "payload": "..."}` record holding the raw venue message
//! exactly as it came off the wire. Inter-message delays are reproduced
//! from the recorded timestamps, scaled by the configured speed and
//! anchored to the first record, so a recording plays back with its
//! original cadence.

use anyhow::{Context, Result};
use async_trait::async_trait;
use common::Exchange;
use feed_worker_trait::{FeedEvent, FeedWorker, FeedWorkerFactory};
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;
use tokio::time::Duration;

#[derive(Debug, Deserialize)]
struct ReplayRecord {
    ts_ms: i64,
    payload: String,
}

#[derive(Clone)]
pub struct ReplayFeedFactory {
    dir: PathBuf,
    speed: f64,
}

impl ReplayFeedFactory {
    pub fn new(dir: impl Into<PathBuf>, speed: f64) -> Self {
        Self {
            dir: dir.into(),
            speed,
        }
    }
}

#[async_trait]
impl FeedWorkerFactory for ReplayFeedFactory {
    async fn spawn_worker(&self, exchange: Exchange) -> Result<Box<dyn FeedWorker>> {
        let path = self.dir.join(format!("{}.ndjson", exchange));
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading replay file {}", path.display()))?;
        let mut records = VecDeque::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: ReplayRecord = serde_json::from_str(line)
                .with_context(|| format!("{}:{}", path.display(), number + 1))?;
            records.push_back(record);
        }
        Ok(Box::new(ReplayFeedWorker {
            records,
            speed: self.speed,
            first_ts_ms: None,
            started: Instant::now(),
            connected_sent: false,
            disconnect_sent: false,
        }))
    }
}

struct ReplayFeedWorker {
    records: VecDeque<ReplayRecord>,
    speed: f64,
    first_ts_ms: Option<i64>,
    started: Instant,
    connected_sent: bool,
    disconnect_sent: bool,
}

#[async_trait]
impl FeedWorker for ReplayFeedWorker {
    async fn next_event(&mut self) -> Option<FeedEvent> {
        if !self.connected_sent {
            self.connected_sent = true;
            return Some(FeedEvent::Connected);
        }
        let Some(record) = self.records.pop_front() else {
            if !self.disconnect_sent {
                self.disconnect_sent = true;
                return Some(FeedEvent::Disconnected("replay exhausted".to_string()));
            }
            return None;
        };

        // Pace playback against the first record's timestamp.
        if let Some(first_ts) = self.first_ts_ms {
            let elapsed_ms = (record.ts_ms - first_ts).max(0) as u64;
            let delay = Duration::from_millis((elapsed_ms as f64 / self.speed) as u64);
            let target = self.started + delay;
            let now = Instant::now();
            if target > now {
                tokio::time::sleep(target - now).await;
            }
        } else {
            self.first_ts_ms = Some(record.ts_ms);
            self.started = Instant::now();
        }

        Some(FeedEvent::Message(record.payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_recording(dir: &std::path::Path, exchange: Exchange, lines: &[(i64, &str)]) {
        let path = dir.join(format!("{}.ndjson", exchange));
        let mut file = std::fs::File::create(path).unwrap();
        for (ts_ms, payload) in lines {
            let record = serde_json::json!({"ts_ms": ts_ms, "payload": payload});
            writeln!(file, "{}", record).unwrap();
        }
    }

    #[tokio::test]
    async fn test_replays_in_order_then_disconnects() {
        let dir = tempfile::tempdir().unwrap();
        write_recording(
            dir.path(),
            Exchange::Binance,
            &[(1000, r#"{"a":1}"#), (1001, r#"{"a":2}"#)],
        );

        let factory = ReplayFeedFactory::new(dir.path(), 1000.0);
        let mut worker = factory.spawn_worker(Exchange::Binance).await.unwrap();

        assert_eq!(worker.next_event().await, Some(FeedEvent::Connected));
        assert_eq!(
            worker.next_event().await,
            Some(FeedEvent::Message(r#"{"a":1}"#.to_string()))
        );
        assert_eq!(
            worker.next_event().await,
            Some(FeedEvent::Message(r#"{"a":2}"#.to_string()))
        );
        assert_eq!(
            worker.next_event().await,
            Some(FeedEvent::Disconnected("replay exhausted".to_string()))
        );
        assert_eq!(worker.next_event().await, None);
    }

    #[tokio::test]
    async fn test_missing_recording_is_a_spawn_error() {
        let factory = ReplayFeedFactory::new("/nonexistent/recordings", 1.0);
        assert!(factory.spawn_worker(Exchange::Okx).await.is_err());
    }
}
