//! # Feed Ingestor
//!
//! Everything between the per-exchange feed workers and the detector:
//! the supervised worker lifecycle, the lossy bounded multiplexer, the
//! per-venue normalizers, and the pipeline that folds raw venue messages
//! into canonical quotes.

pub mod metrics;
pub mod mux;
pub mod normalize;
pub mod pipeline;
pub mod sources;
pub mod supervisor;

pub use metrics::IngestMetrics;
pub use mux::{IngestionMux, MuxProducer};
pub use normalize::NormalizerRegistry;
pub use pipeline::IngestPipeline;
pub use supervisor::{Supervisor, SupervisorHandle, WorkerHealth, WorkerStatus};
