//! The single consumption point for all worker event streams.
//!
//! Each worker owns a bounded FIFO buffer. A worker producing faster than
//! the consumer drains loses its oldest entry: quote streams are
//! superseded-by-newer-value data, so shedding the stalest item is the
//! correct overload response and is counted, not raised. Delivery keeps
//! each worker's internal order; nothing is guaranteed across workers.

use crate::metrics::IngestMetrics;
use anyhow::{anyhow, Result};
use common::Exchange;
use feed_worker_trait::FeedEvent;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

struct MuxShared {
    /// One buffer per configured exchange, fixed at construction.
    buffers: Vec<(Exchange, Mutex<VecDeque<FeedEvent>>)>,
    capacity: usize,
    /// Round-robin scan position, advanced past each served buffer so one
    /// backlogged worker cannot starve the others.
    cursor: AtomicUsize,
    notify: Notify,
    metrics: Arc<IngestMetrics>,
}

/// Consumer handle. Cheap to clone; all clones drain the same buffers.
#[derive(Clone)]
pub struct IngestionMux {
    shared: Arc<MuxShared>,
}

/// Producer handle for one worker incarnation.
pub struct MuxProducer {
    shared: Arc<MuxShared>,
    index: usize,
    exchange: Exchange,
}

impl IngestionMux {
    pub fn new(exchanges: &[Exchange], capacity: usize, metrics: Arc<IngestMetrics>) -> Self {
        let buffers = exchanges
            .iter()
            .map(|&exchange| (exchange, Mutex::new(VecDeque::with_capacity(capacity))))
            .collect();
        Self {
            shared: Arc::new(MuxShared {
                buffers,
                capacity,
                cursor: AtomicUsize::new(0),
                notify: Notify::new(),
                metrics,
            }),
        }
    }

    /// Create a producer for the given exchange. Each worker incarnation
    /// gets its own handle; they all feed the same per-exchange buffer.
    pub fn producer(&self, exchange: Exchange) -> Result<MuxProducer> {
        let index = self
            .shared
            .buffers
            .iter()
            .position(|(e, _)| *e == exchange)
            .ok_or_else(|| anyhow!("exchange {} is not registered with the mux", exchange))?;
        Ok(MuxProducer {
            shared: Arc::clone(&self.shared),
            index,
            exchange,
        })
    }

    /// Pop the next buffered event without waiting.
    pub fn try_poll(&self) -> Option<(Exchange, FeedEvent)> {
        let n = self.shared.buffers.len();
        if n == 0 {
            return None;
        }
        let start = self.shared.cursor.load(Ordering::Relaxed);
        for i in 0..n {
            let idx = (start + i) % n;
            let (exchange, buffer) = &self.shared.buffers[idx];
            let mut buffer = buffer.lock();
            if let Some(event) = buffer.pop_front() {
                drop(buffer);
                self.shared.cursor.store((idx + 1) % n, Ordering::Relaxed);
                return Some((*exchange, event));
            }
        }
        None
    }

    /// Await the next event from any worker.
    pub async fn poll(&self) -> (Exchange, FeedEvent) {
        loop {
            // Register interest before checking so a push between the check
            // and the await cannot be lost.
            let notified = self.shared.notify.notified();
            if let Some(item) = self.try_poll() {
                return item;
            }
            notified.await;
        }
    }
}

impl MuxProducer {
    /// Enqueue one event, shedding this worker's oldest entry on overflow.
    pub fn push(&self, event: FeedEvent) {
        {
            let (_, buffer) = &self.shared.buffers[self.index];
            let mut buffer = buffer.lock();
            if buffer.len() == self.shared.capacity {
                buffer.pop_front();
                self.shared.metrics.record_drop(self.exchange);
            }
            buffer.push_back(event);
        }
        self.shared.notify.notify_one();
    }
}
