//! The boundary between the core and per-exchange feed connectors.
//!
//! A feed worker wraps one live connection to one venue. Everything at the
//! wire level (connection establishment, subscription handshakes,
//! keep-alive framing, TLS, and any in-lifetime reconnect attempts) stays
//! inside the worker. The core only consumes the event sequence.

use anyhow::Result;
use async_trait::async_trait;
use common::Exchange;

/// One item in a worker's event sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A raw venue message, exchange-native structured text. Opaque to the
    /// core beyond what the venue's normalizer extracts.
    Message(String),
    /// The underlying connection is established and subscribed.
    Connected,
    /// The worker has lost its connection and exhausted its own retries.
    Disconnected(String),
    /// The worker hit a non-recoverable condition (bad credentials,
    /// rejected subscription, protocol violation).
    FatalError(String),
}

/// A lazy, infinite, non-restartable event sequence from one venue.
///
/// `None` means the sequence terminated; a terminated or fatally-errored
/// worker is never polled again, the supervisor launches a fresh instance
/// instead.
#[async_trait]
pub trait FeedWorker: Send {
    /// Await the next event from this worker.
    async fn next_event(&mut self) -> Option<FeedEvent>;
}

/// Builds fresh worker instances. Invoked by the supervisor on every start
/// and restart.
#[async_trait]
pub trait FeedWorkerFactory: Send + Sync {
    async fn spawn_worker(&self, exchange: Exchange) -> Result<Box<dyn FeedWorker>>;
}
