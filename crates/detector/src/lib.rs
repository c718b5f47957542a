//! # Arbitrage Detector Crate
//!
//! This crate holds the market state store and the detection engine that
//! compares state across exchanges. It is designed as a service that
//! consumes a stream of canonical quotes and emits opportunity records to a
//! sink, communicating with the rest of the system via channels.

pub mod dedup;
pub mod engine;
pub mod service;
pub mod sink;
pub mod store;

// Re-export the main pieces for easy access.
pub use dedup::OpportunityDeduplicator;
pub use engine::{DetectionEngine, DetectorConfig};
pub use service::{DetectorService, PriceStream};
pub use sink::{ChannelSink, LogSink, OpportunitySink};
pub use store::{ExchangeView, MarketStateStore};
