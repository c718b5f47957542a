//! Per-venue message normalization.
//!
//! Each supported venue registers one parser that maps that venue's native
//! message shapes onto `CanonicalQuote`. Heartbeats, subscription
//! acknowledgements, and unrelated channels normalize to `None`; malformed
//! payloads are a counted `FeedError::Parse`, never fatal. Venue symbol
//! spellings are resolved to the canonical form here, before anything is
//! stored.

pub mod binance;
pub mod bitget;
pub mod bybit;
pub mod okx;

use common::{CanonicalQuote, Exchange, FeedError, Instrument, Price, Quantity};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Instant;

/// Dispatch table from exchange identity to that venue's parser, plus the
/// tracked-instrument filter applied after symbol normalization.
pub struct NormalizerRegistry {
    tracked: HashSet<Instrument>,
}

impl NormalizerRegistry {
    pub fn new(tracked: impl IntoIterator<Item = Instrument>) -> Self {
        Self {
            tracked: tracked.into_iter().collect(),
        }
    }

    /// Normalize one raw payload from the given venue.
    ///
    /// `observed_at` is the receipt time and becomes the quote's timestamp;
    /// venue-reported clocks are never used for staleness.
    pub fn normalize(
        &self,
        exchange: Exchange,
        raw: &str,
        observed_at: Instant,
    ) -> Result<Option<CanonicalQuote>, FeedError> {
        let quote = match exchange {
            Exchange::Binance => binance::normalize(raw, observed_at)?,
            Exchange::Okx => okx::normalize(raw, observed_at)?,
            Exchange::Bybit => bybit::normalize(raw, observed_at)?,
            Exchange::Bitget => bitget::normalize(raw, observed_at)?,
        };
        Ok(quote.filter(|q| self.tracked.contains(&q.instrument)))
    }
}

/// Plain text keep-alive frames some venues send outside JSON framing.
pub(crate) fn is_text_heartbeat(raw: &str) -> bool {
    matches!(raw.trim(), "ping" | "pong")
}

pub(crate) fn parse_price(field: &'static str, s: &str) -> Result<Price, FeedError> {
    Decimal::from_str(s)
        .map(Price)
        .map_err(|e| FeedError::Parse(format!("bad {} '{}': {}", field, s, e)))
}

pub(crate) fn parse_quantity(field: &'static str, s: &str) -> Result<Quantity, FeedError> {
    Decimal::from_str(s)
        .map(Quantity)
        .map_err(|e| FeedError::Parse(format!("bad {} '{}': {}", field, s, e)))
}

/// Split a concatenated venue symbol like `BTCUSDT` into `BTC/USDT`.
///
/// Known quote assets are matched as suffixes; anything unrecognized falls
/// back to a 3-character base split, mirroring how the feed side has always
/// treated uncommon pairs.
pub(crate) fn split_concatenated_symbol(venue_symbol: &str) -> Instrument {
    let s = venue_symbol.to_uppercase();
    for quote in ["USDT", "USDC", "BUSD"] {
        if let Some(base) = s.strip_suffix(quote) {
            if !base.is_empty() {
                return Instrument(format!("{}/{}", base, quote));
            }
        }
    }
    if s.len() > 3 {
        Instrument(format!("{}/{}", &s[..3], &s[3..]))
    } else {
        Instrument(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_concatenated_symbol() {
        assert_eq!(split_concatenated_symbol("BTCUSDT"), Instrument::from("BTC/USDT"));
        assert_eq!(split_concatenated_symbol("ethusdc"), Instrument::from("ETH/USDC"));
        assert_eq!(split_concatenated_symbol("BNBBUSD"), Instrument::from("BNB/BUSD"));
        // Fallback split for an unknown quote asset.
        assert_eq!(split_concatenated_symbol("DOGEUR"), Instrument::from("DOG/EUR"));
    }

    #[test]
    fn test_registry_filters_untracked_instruments() {
        let registry = NormalizerRegistry::new([Instrument::from("ETH/USDT")]);
        let raw = r#"{"u":1,"s":"BTCUSDT","b":"60000.0","B":"1.0","a":"60001.0","A":"1.0"}"#;
        let quote = registry
            .normalize(Exchange::Binance, raw, Instant::now())
            .unwrap();
        assert!(quote.is_none());
    }

    #[test]
    fn test_registry_passes_tracked_instruments() {
        let registry = NormalizerRegistry::new([Instrument::from("BTC/USDT")]);
        let raw = r#"{"u":1,"s":"BTCUSDT","b":"60000.0","B":"1.0","a":"60001.0","A":"1.0"}"#;
        let quote = registry
            .normalize(Exchange::Binance, raw, Instant::now())
            .unwrap()
            .unwrap();
        assert_eq!(quote.instrument, Instrument::from("BTC/USDT"));
        assert_eq!(quote.exchange, Exchange::Binance);
    }

    #[test]
    fn test_text_heartbeats() {
        assert!(is_text_heartbeat("ping"));
        assert!(is_text_heartbeat("pong\n"));
        assert!(!is_text_heartbeat("{}"));
    }
}
