//! The market state store: the latest canonical quote per
//! `(exchange, instrument)` key.
//!
//! Each venue message is a full, self-contained snapshot of that venue's
//! top of book, so `update` overwrites the whole entry; a quote without
//! size information overwrites a previous entry's size with "unknown".
//! Entries are never deleted; a venue going quiet is represented by entry
//! age, not removal. Per-key updates are atomic under the lock, but no
//! snapshot consistency is promised across keys: readers compensate with
//! the staleness bound, not synchronization.

use common::{CanonicalQuote, Exchange, Instrument};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

struct MarketStateEntry {
    quote: CanonicalQuote,
    updated_at: Instant,
    usable: bool,
}

/// One exchange's entry for an instrument, as seen by the detection engine.
#[derive(Debug, Clone)]
pub struct ExchangeView {
    pub exchange: Exchange,
    pub quote: CanonicalQuote,
    pub age: Duration,
    pub usable: bool,
}

/// Operator-facing freshness row.
#[derive(Debug, Clone)]
pub struct FreshnessEntry {
    pub exchange: Exchange,
    pub instrument: Instrument,
    pub age: Duration,
    pub usable: bool,
}

pub struct MarketStateStore {
    entries: RwLock<HashMap<(Exchange, Instrument), MarketStateEntry>>,
    crossed_books: AtomicU64,
}

impl MarketStateStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            crossed_books: AtomicU64::new(0),
        }
    }

    /// Overwrite the entry for the quote's key, last write wins.
    ///
    /// A crossed book (`ask < bid`) is stored but flagged unusable rather
    /// than rejected: some venues report transient crossed books, and the
    /// entry still carries the venue's most recent self-description.
    pub fn update(&self, quote: CanonicalQuote) {
        let usable = !quote.is_crossed();
        if !usable {
            self.crossed_books.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "Crossed book from {} for {}: bid {} > ask {}; entry unusable for detection",
                quote.exchange,
                quote.instrument,
                quote.best_bid,
                quote.best_ask
            );
        }
        let key = (quote.exchange, quote.instrument.clone());
        let entry = MarketStateEntry {
            updated_at: quote.observed_at,
            usable,
            quote,
        };
        self.entries.write().insert(key, entry);
    }

    /// All exchanges' current entries for an instrument, with ages.
    pub fn read(&self, instrument: &Instrument) -> Vec<ExchangeView> {
        let now = Instant::now();
        let entries = self.entries.read();
        entries
            .iter()
            .filter(|((_, key_instrument), _)| key_instrument == instrument)
            .map(|((exchange, _), entry)| ExchangeView {
                exchange: *exchange,
                quote: entry.quote.clone(),
                age: now.saturating_duration_since(entry.updated_at),
                usable: entry.usable,
            })
            .collect()
    }

    /// Per-key freshness, ordered by exchange then instrument.
    pub fn freshness(&self) -> Vec<FreshnessEntry> {
        let now = Instant::now();
        let entries = self.entries.read();
        let mut rows: Vec<FreshnessEntry> = entries
            .iter()
            .map(|((exchange, instrument), entry)| FreshnessEntry {
                exchange: *exchange,
                instrument: instrument.clone(),
                age: now.saturating_duration_since(entry.updated_at),
                usable: entry.usable,
            })
            .collect();
        rows.sort_by(|a, b| {
            (a.exchange, &a.instrument).cmp(&(b.exchange, &b.instrument))
        });
        rows
    }

    /// Total crossed-book anomalies seen since startup.
    pub fn crossed_book_count(&self) -> u64 {
        self.crossed_books.load(Ordering::Relaxed)
    }
}

impl Default for MarketStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Price, Quantity};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn quote(
        exchange: Exchange,
        instrument: &str,
        bid: Decimal,
        ask: Decimal,
        bid_size: Option<Decimal>,
    ) -> CanonicalQuote {
        CanonicalQuote {
            exchange,
            instrument: Instrument::from(instrument),
            best_bid: Price(bid),
            best_ask: Price(ask),
            bid_size: bid_size.map(Quantity),
            ask_size: None,
            observed_at: Instant::now(),
            sequence: None,
        }
    }

    #[test]
    fn test_last_write_wins_per_key() {
        let store = MarketStateStore::new();
        store.update(quote(Exchange::Binance, "BTC/USDT", dec!(1), dec!(2), None));
        // Interleave writes to other keys.
        store.update(quote(Exchange::Bybit, "BTC/USDT", dec!(5), dec!(6), None));
        store.update(quote(Exchange::Binance, "ETH/USDT", dec!(9), dec!(10), None));
        store.update(quote(Exchange::Binance, "BTC/USDT", dec!(3), dec!(4), None));

        let views = store.read(&Instrument::from("BTC/USDT"));
        let binance = views
            .iter()
            .find(|v| v.exchange == Exchange::Binance)
            .unwrap();
        assert_eq!(binance.quote.best_bid, Price(dec!(3)));
        assert_eq!(binance.quote.best_ask, Price(dec!(4)));

        let bybit = views.iter().find(|v| v.exchange == Exchange::Bybit).unwrap();
        assert_eq!(bybit.quote.best_bid, Price(dec!(5)));
    }

    #[test]
    fn test_sizeless_quote_overwrites_size_with_unknown() {
        let store = MarketStateStore::new();
        store.update(quote(
            Exchange::Okx,
            "BTC/USDT",
            dec!(1),
            dec!(2),
            Some(dec!(7)),
        ));
        store.update(quote(Exchange::Okx, "BTC/USDT", dec!(1), dec!(2), None));

        let views = store.read(&Instrument::from("BTC/USDT"));
        assert_eq!(views[0].quote.bid_size, None);
    }

    #[test]
    fn test_crossed_book_is_stored_but_unusable() {
        let store = MarketStateStore::new();
        store.update(quote(Exchange::Bitget, "BTC/USDT", dec!(10), dec!(9), None));

        let views = store.read(&Instrument::from("BTC/USDT"));
        assert_eq!(views.len(), 1);
        assert!(!views[0].usable);
        assert_eq!(store.crossed_book_count(), 1);

        // A clean update restores usability.
        store.update(quote(Exchange::Bitget, "BTC/USDT", dec!(9), dec!(10), None));
        let views = store.read(&Instrument::from("BTC/USDT"));
        assert!(views[0].usable);
    }

    #[test]
    fn test_read_is_scoped_to_one_instrument() {
        let store = MarketStateStore::new();
        store.update(quote(Exchange::Binance, "BTC/USDT", dec!(1), dec!(2), None));
        store.update(quote(Exchange::Binance, "ETH/USDT", dec!(3), dec!(4), None));

        let views = store.read(&Instrument::from("ETH/USDT"));
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].quote.instrument, Instrument::from("ETH/USDT"));
    }

    #[test]
    fn test_freshness_lists_every_key() {
        let store = MarketStateStore::new();
        store.update(quote(Exchange::Binance, "BTC/USDT", dec!(1), dec!(2), None));
        store.update(quote(Exchange::Okx, "BTC/USDT", dec!(1), dec!(2), None));

        let rows = store.freshness();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].exchange <= rows[1].exchange);
    }

    #[test]
    fn test_concurrent_writers_land_on_distinct_keys() {
        use std::sync::Arc;
        let store = Arc::new(MarketStateStore::new());
        let mut handles = Vec::new();
        for exchange in Exchange::ALL {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for i in 0..100i64 {
                    store.update(quote(
                        exchange,
                        "BTC/USDT",
                        Decimal::new(i, 0),
                        Decimal::new(i + 1, 0),
                        None,
                    ));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let views = store.read(&Instrument::from("BTC/USDT"));
        assert_eq!(views.len(), Exchange::ALL.len());
        for view in views {
            assert_eq!(view.quote.best_bid, Price(dec!(99)));
        }
    }
}
