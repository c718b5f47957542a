//! The detector service loop: consume canonical quotes, fold them into the
//! market state store, and re-evaluate the affected instrument on every
//! update.

use crate::dedup::OpportunityDeduplicator;
use crate::engine::{DetectionEngine, DetectorConfig};
use crate::sink::OpportunitySink;
use crate::store::MarketStateStore;
use anyhow::Result;
use common::CanonicalQuote;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;

/// A stream of canonical quotes from the ingestion side.
pub type PriceStream = Pin<Box<dyn Stream<Item = CanonicalQuote> + Send>>;

pub struct DetectorService {
    /// The shared market state store. Constructed by the caller and also
    /// handed to the operator surface; the service is its only writer.
    store: Arc<MarketStateStore>,
    engine: DetectionEngine,
    dedup: OpportunityDeduplicator,
    sink: Arc<dyn OpportunitySink>,
    quote_stream: PriceStream,
    /// Receiver for shutdown signals.
    shutdown_rx: Receiver<()>,
    emitted: u64,
}

impl DetectorService {
    pub fn new(
        config: DetectorConfig,
        store: Arc<MarketStateStore>,
        quote_stream: PriceStream,
        sink: Arc<dyn OpportunitySink>,
        shutdown_rx: Receiver<()>,
    ) -> Self {
        Self {
            store,
            engine: DetectionEngine::new(&config),
            dedup: OpportunityDeduplicator::new(config.dedup_ttl),
            sink,
            quote_stream,
            shutdown_rx,
            emitted: 0,
        }
    }

    /// Spawn the detection loop onto the runtime.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    /// The main detection loop.
    pub async fn run(mut self) -> Result<()> {
        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    log::info!("DetectorService shutting down.");
                    break;
                }
                maybe_quote = self.quote_stream.next() => {
                    match maybe_quote {
                        Some(quote) => self.on_quote(quote).await,
                        None => {
                            // Stream ended
                            break;
                        }
                    }
                }
            }
        }
        log::info!("DetectorService stopped after {} emissions.", self.emitted);
        Ok(())
    }

    async fn on_quote(&mut self, quote: CanonicalQuote) {
        let instrument = quote.instrument.clone();
        self.store.update(quote);

        let views = self.store.read(&instrument);
        let Some(opportunity) = self.engine.evaluate(&instrument, &views) else {
            return;
        };
        if self.dedup.is_duplicate(&opportunity) {
            return;
        }
        log::info!(
            "Opportunity on {}: buy {} at {}, sell {} at {}, spread {} (ratio {})",
            opportunity.instrument,
            opportunity.buy_exchange,
            opportunity.buy_price,
            opportunity.sell_exchange,
            opportunity.sell_price,
            opportunity.spread,
            opportunity.spread_ratio
        );
        // A sink failure loses one emission, never the detection loop.
        if let Err(e) = self.sink.publish(&opportunity).await {
            log::error!("Failed to publish opportunity: {}", e);
        }
        self.emitted += 1;
    }
}
