//! The consumer side of the mux: normalize raw messages, watch per-venue
//! sequence continuity, and push canonical quotes to the detector.
//!
//! Fault isolation is the invariant here: a malformed message, an unknown
//! channel, or a sequence anomaly on one exchange never interrupts
//! processing for any other exchange or instrument.

use crate::metrics::IngestMetrics;
use crate::mux::IngestionMux;
use crate::normalize::NormalizerRegistry;
use anyhow::Result;
use common::{CanonicalQuote, Exchange, Instrument};
use feed_worker_trait::FeedEvent;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct IngestPipeline {
    mux: IngestionMux,
    registry: NormalizerRegistry,
    quote_tx: mpsc::Sender<CanonicalQuote>,
    metrics: Arc<IngestMetrics>,
    shutdown_rx: watch::Receiver<bool>,
    /// Highest sequence seen per venue stream. Sequences are only ever
    /// compared within one venue.
    last_sequence: HashMap<(Exchange, Instrument), u64>,
}

impl IngestPipeline {
    pub fn new(
        mux: IngestionMux,
        registry: NormalizerRegistry,
        quote_tx: mpsc::Sender<CanonicalQuote>,
        metrics: Arc<IngestMetrics>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            mux,
            registry,
            quote_tx,
            metrics,
            shutdown_rx,
            last_sequence: HashMap::new(),
        }
    }

    /// Spawn the consumption loop onto the runtime.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) -> Result<()> {
        info!("Ingest pipeline started");
        loop {
            tokio::select! {
                _ = self.shutdown_rx.changed() => {
                    info!("Ingest pipeline stopping on shutdown signal");
                    break;
                }
                (exchange, event) = self.mux.poll() => {
                    match event {
                        FeedEvent::Message(raw) => {
                            if !self.handle_message(exchange, &raw).await {
                                // The detector side is gone; nothing left to
                                // feed.
                                warn!("Quote channel closed; ingest pipeline stopping");
                                break;
                            }
                        }
                        FeedEvent::Connected => {
                            debug!(exchange = %exchange, "Feed connected");
                        }
                        FeedEvent::Disconnected(reason) => {
                            debug!(exchange = %exchange, reason = %reason, "Feed disconnected");
                        }
                        FeedEvent::FatalError(reason) => {
                            warn!(exchange = %exchange, reason = %reason, "Feed reported fatal error");
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns false only when the downstream channel has closed.
    async fn handle_message(&mut self, exchange: Exchange, raw: &str) -> bool {
        self.metrics.record_message(exchange);
        match self.registry.normalize(exchange, raw, Instant::now()) {
            Ok(Some(quote)) => {
                self.track_sequence(&quote);
                self.quote_tx.send(quote).await.is_ok()
            }
            Ok(None) => true,
            Err(e) => {
                self.metrics.record_parse_failure(exchange);
                warn!(exchange = %exchange, error = %e, "Discarding unparsable message");
                true
            }
        }
    }

    fn track_sequence(&mut self, quote: &CanonicalQuote) {
        let Some(sequence) = quote.sequence else {
            return;
        };
        let key = (quote.exchange, quote.instrument.clone());
        match self.last_sequence.get(&key) {
            Some(&last) if sequence <= last => {
                self.metrics.record_out_of_order(quote.exchange);
                debug!(
                    exchange = %quote.exchange,
                    instrument = %quote.instrument,
                    sequence,
                    last,
                    "Out-of-order or duplicate sequence"
                );
            }
            Some(&last) => {
                if sequence > last + 1 {
                    self.metrics.record_sequence_gap(quote.exchange);
                    debug!(
                        exchange = %quote.exchange,
                        instrument = %quote.instrument,
                        from = last,
                        to = sequence,
                        "Sequence gap"
                    );
                }
                self.last_sequence.insert(key, sequence);
            }
            None => {
                self.last_sequence.insert(key, sequence);
            }
        }
    }
}
