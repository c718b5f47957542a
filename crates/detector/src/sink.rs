//! The core → sink boundary.
//!
//! The core defines only the record shape; transport is the consumer's
//! concern. A log stream and an in-process channel are provided; anything
//! else (downstream queue, UI push) implements the trait out of tree.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use common::ArbitrageOpportunity;
use tokio::sync::mpsc;

#[async_trait]
pub trait OpportunitySink: Send + Sync {
    /// Deliver one opportunity record to the external consumer.
    async fn publish(&self, opportunity: &ArbitrageOpportunity) -> Result<()>;
}

/// Emits each opportunity as one structured JSON line.
pub struct LogSink;

#[async_trait]
impl OpportunitySink for LogSink {
    async fn publish(&self, opportunity: &ArbitrageOpportunity) -> Result<()> {
        let line = serde_json::to_string(opportunity)?;
        log::info!(target: "opportunity", "{}", line);
        Ok(())
    }
}

/// Pushes opportunities onto an in-process queue.
pub struct ChannelSink {
    tx: mpsc::Sender<ArbitrageOpportunity>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ArbitrageOpportunity>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl OpportunitySink for ChannelSink {
    async fn publish(&self, opportunity: &ArbitrageOpportunity) -> Result<()> {
        self.tx
            .send(opportunity.clone())
            .await
            .map_err(|_| anyhow!("opportunity channel closed"))
    }
}
