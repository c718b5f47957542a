//! Synthetic feed source.
//!
//! Each worker random-walks a mid price per instrument and emits the
//! venue-native ticker JSON for its exchange, so the full normalize path is
//! exercised exactly as it would be by a live connector. Occasional
//! keep-alive noise exercises the parse-to-nothing path.

use super::venue_symbol;
use anyhow::Result;
use async_trait::async_trait;
use common::{Exchange, Instrument};
use feed_worker_trait::{FeedEvent, FeedWorker, FeedWorkerFactory};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Clone)]
pub struct SimFeedFactory {
    tick_interval: Duration,
    spread_bps: u32,
    volatility_bps: u32,
    base_prices: HashMap<String, Decimal>,
    instruments: Vec<Instrument>,
}

impl SimFeedFactory {
    pub fn new(
        tick_interval_ms: u64,
        spread_bps: u32,
        volatility_bps: u32,
        base_prices: HashMap<String, Decimal>,
        instruments: Vec<Instrument>,
    ) -> Self {
        Self {
            tick_interval: Duration::from_millis(tick_interval_ms),
            spread_bps,
            volatility_bps,
            base_prices,
            instruments,
        }
    }
}

#[async_trait]
impl FeedWorkerFactory for SimFeedFactory {
    async fn spawn_worker(&self, exchange: Exchange) -> Result<Box<dyn FeedWorker>> {
        let base = self
            .base_prices
            .get(exchange.as_str())
            .copied()
            .unwrap_or_else(|| Decimal::new(60_000, 0));
        let mids = self
            .instruments
            .iter()
            .map(|instrument| (instrument.clone(), base))
            .collect();
        Ok(Box::new(SimFeedWorker {
            exchange,
            tick_interval: self.tick_interval,
            spread_bps: self.spread_bps,
            volatility_bps: self.volatility_bps,
            mids,
            instruments: self.instruments.clone(),
            rng: StdRng::from_entropy(),
            connected_sent: false,
            sequence: 0,
            cursor: 0,
        }))
    }
}

struct SimFeedWorker {
    exchange: Exchange,
    tick_interval: Duration,
    spread_bps: u32,
    volatility_bps: u32,
    mids: HashMap<Instrument, Decimal>,
    instruments: Vec<Instrument>,
    rng: StdRng,
    connected_sent: bool,
    sequence: u64,
    cursor: usize,
}

impl SimFeedWorker {
    fn next_quote_message(&mut self) -> String {
        let instrument = self.instruments[self.cursor % self.instruments.len()].clone();
        self.cursor = self.cursor.wrapping_add(1);
        self.sequence += 1;

        let vol = self.volatility_bps as i64;
        let drift_bps = self.rng.gen_range(-vol..=vol);
        let mid = self
            .mids
            .get(&instrument)
            .copied()
            .unwrap_or_else(|| Decimal::new(60_000, 0));
        // One basis point is 1e-4, so bps map onto Decimal scale 4 directly.
        let mid = (mid * (Decimal::ONE + Decimal::new(drift_bps, 4))).round_dp(2);
        self.mids.insert(instrument.clone(), mid);

        let half = (mid * Decimal::new(self.spread_bps as i64, 4)).round_dp(2);
        let bid = mid - half;
        let mut ask = mid + half;
        if ask <= bid {
            ask = bid + Decimal::new(1, 2);
        }
        let bid_size = Decimal::new(self.rng.gen_range(10..=500), 2);
        let ask_size = Decimal::new(self.rng.gen_range(10..=500), 2);

        let symbol = venue_symbol(self.exchange, &instrument);
        let ts_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let payload = match self.exchange {
            Exchange::Binance => serde_json::json!({
                "u": self.sequence,
                "s": symbol,
                "b": bid.to_string(),
                "B": bid_size.to_string(),
                "a": ask.to_string(),
                "A": ask_size.to_string(),
            }),
            Exchange::Okx => serde_json::json!({
                "arg": {"channel": "tickers", "instId": symbol},
                "data": [{
                    "instId": symbol,
                    "bestBid": bid.to_string(),
                    "bestAsk": ask.to_string(),
                    "ts": ts_ms.to_string(),
                }],
            }),
            Exchange::Bybit => serde_json::json!({
                "topic": format!("tickers.{}", symbol),
                "type": "snapshot",
                "cs": self.sequence,
                "ts": ts_ms,
                "data": {
                    "symbol": symbol,
                    "bid1Price": bid.to_string(),
                    "bid1Size": bid_size.to_string(),
                    "ask1Price": ask.to_string(),
                    "ask1Size": ask_size.to_string(),
                },
            }),
            Exchange::Bitget => serde_json::json!({
                "action": "snapshot",
                "arg": {"instType": "USDT-FUTURES", "channel": "ticker", "instId": symbol},
                "data": [{
                    "instId": symbol,
                    "bidPr": bid.to_string(),
                    "askPr": ask.to_string(),
                    "bidSz": bid_size.to_string(),
                    "askSz": ask_size.to_string(),
                }],
                "ts": ts_ms,
            }),
        };
        payload.to_string()
    }

    fn keep_alive_noise(&self) -> String {
        match self.exchange {
            Exchange::Binance => r#"{"result":null,"id":1}"#.to_string(),
            Exchange::Bybit => r#"{"op":"pong","args":[]}"#.to_string(),
            Exchange::Okx | Exchange::Bitget => "pong".to_string(),
        }
    }
}

#[async_trait]
impl FeedWorker for SimFeedWorker {
    async fn next_event(&mut self) -> Option<FeedEvent> {
        if !self.connected_sent {
            self.connected_sent = true;
            return Some(FeedEvent::Connected);
        }
        tokio::time::sleep(self.tick_interval).await;
        if self.instruments.is_empty() {
            return Some(FeedEvent::Message(self.keep_alive_noise()));
        }
        if self.rng.gen_ratio(1, 25) {
            return Some(FeedEvent::Message(self.keep_alive_noise()));
        }
        Some(FeedEvent::Message(self.next_quote_message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::NormalizerRegistry;
    use std::time::Instant;

    fn factory() -> SimFeedFactory {
        SimFeedFactory::new(
            1,
            5,
            10,
            HashMap::new(),
            vec![Instrument::from("BTC/USDT")],
        )
    }

    #[tokio::test]
    async fn test_first_event_is_connected() {
        let mut worker = factory().spawn_worker(Exchange::Binance).await.unwrap();
        assert_eq!(worker.next_event().await, Some(FeedEvent::Connected));
    }

    #[tokio::test]
    async fn test_emitted_messages_normalize_on_every_venue() {
        let registry = NormalizerRegistry::new([Instrument::from("BTC/USDT")]);
        for exchange in Exchange::ALL {
            let mut worker = factory().spawn_worker(exchange).await.unwrap();
            assert_eq!(worker.next_event().await, Some(FeedEvent::Connected));

            // Pull ticks until a price-bearing message shows up (keep-alive
            // noise is interleaved at random).
            let mut normalized = None;
            for _ in 0..100 {
                if let Some(FeedEvent::Message(raw)) = worker.next_event().await {
                    if let Some(quote) =
                        registry.normalize(exchange, &raw, Instant::now()).unwrap()
                    {
                        normalized = Some(quote);
                        break;
                    }
                }
            }
            let quote = normalized.expect("no quote produced");
            assert_eq!(quote.exchange, exchange);
            assert_eq!(quote.instrument, Instrument::from("BTC/USDT"));
            assert!(!quote.is_crossed());
        }
    }
}
