//! The detection engine: a pure, synchronous comparison over one
//! instrument's cross-exchange state.
//!
//! Staleness filtering substitutes for cross-venue synchronization: quotes
//! arrive independently, so an evaluation pass may mix update times across
//! exchanges, and only entries younger than the bound are comparable.

use crate::store::ExchangeView;
use chrono::Utc;
use common::{ArbitrageOpportunity, Instrument};
use rust_decimal::Decimal;
use std::time::Duration;
use uuid::Uuid;

/// Detector tuning. The defaults mirror `config/default.yml`; production
/// values come from configuration.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub staleness_bound: Duration,
    pub min_spread_ratio: Decimal,
    pub dedup_ttl: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            staleness_bound: Duration::from_millis(3000),
            min_spread_ratio: Decimal::new(5, 4), // 0.0005
            dedup_ttl: Duration::from_millis(5000),
        }
    }
}

pub struct DetectionEngine {
    staleness_bound: Duration,
    min_spread_ratio: Decimal,
}

impl DetectionEngine {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            staleness_bound: config.staleness_bound,
            min_spread_ratio: config.min_spread_ratio,
        }
    }

    /// Evaluate one instrument's views and return at most one opportunity:
    /// the best valid (sell, buy) pairing across distinct exchanges.
    ///
    /// Views that are stale or flagged unusable are discarded first. On
    /// equal spreads the pairing with the fresher legs wins, biasing toward
    /// actionable rather than stale pricing.
    pub fn evaluate(
        &self,
        instrument: &Instrument,
        views: &[ExchangeView],
    ) -> Option<ArbitrageOpportunity> {
        let candidates: Vec<&ExchangeView> = views
            .iter()
            .filter(|v| v.usable && v.age <= self.staleness_bound)
            .collect();
        if candidates.len() < 2 {
            return None;
        }

        let mut best: Option<(Decimal, Duration, &ExchangeView, &ExchangeView)> = None;
        for &sell in &candidates {
            for &buy in &candidates {
                // An exchange cannot arbitrage against itself.
                if sell.exchange == buy.exchange {
                    continue;
                }
                if buy.quote.best_ask.0 <= Decimal::ZERO {
                    continue;
                }
                let spread = sell.quote.best_bid.0 - buy.quote.best_ask.0;
                let combined_age = sell.age + buy.age;
                let better = match &best {
                    None => true,
                    Some((best_spread, best_age, _, _)) => {
                        spread > *best_spread || (spread == *best_spread && combined_age < *best_age)
                    }
                };
                if better {
                    best = Some((spread, combined_age, sell, buy));
                }
            }
        }

        let (spread, _, sell, buy) = best?;
        if spread <= Decimal::ZERO {
            return None;
        }
        let spread_ratio = spread / buy.quote.best_ask.0;
        if spread_ratio < self.min_spread_ratio {
            return None;
        }

        Some(ArbitrageOpportunity {
            id: Uuid::new_v4(),
            instrument: instrument.clone(),
            buy_exchange: buy.exchange,
            sell_exchange: sell.exchange,
            buy_price: buy.quote.best_ask,
            sell_price: sell.quote.best_bid,
            spread,
            spread_ratio,
            detected_at: Utc::now(),
        })
    }
}
