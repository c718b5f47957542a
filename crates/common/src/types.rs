use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Represents a price, using a high-precision decimal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Price(pub Decimal);

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a quantity of an asset, using a high-precision decimal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Quantity(pub Decimal);

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tradable contract identifier in its canonical spelling (e.g. `BTC/USDT`).
/// Venue-native spellings are mapped to this form before anything is stored.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Instrument(pub String);

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Instrument {
    fn from(s: &str) -> Self {
        Instrument(s.to_uppercase())
    }
}

/// The fixed set of supported venues.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
    Okx,
    Bybit,
    Bitget,
}

impl Exchange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Okx => "okx",
            Exchange::Bybit => "bybit",
            Exchange::Bitget => "bitget",
        }
    }

    /// All supported venues, in a stable order.
    pub const ALL: [Exchange; 4] = [
        Exchange::Binance,
        Exchange::Okx,
        Exchange::Bybit,
        Exchange::Bitget,
    ];
}

impl std::str::FromStr for Exchange {
    type Err = crate::errors::FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binance" => Ok(Exchange::Binance),
            "okx" => Ok(Exchange::Okx),
            "bybit" => Ok(Exchange::Bybit),
            "bitget" => Ok(Exchange::Bitget),
            _ => Err(crate::errors::FeedError::UnsupportedExchange(s.to_string())),
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One venue's current best-price view of one instrument, normalized from
/// that venue's native message format.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalQuote {
    pub exchange: Exchange,
    pub instrument: Instrument,
    pub best_bid: Price,
    pub best_ask: Price,
    /// Size at the best bid; some venues' ticker channels omit it.
    pub bid_size: Option<Quantity>,
    /// Size at the best ask; some venues' ticker channels omit it.
    pub ask_size: Option<Quantity>,
    /// Receipt time assigned by the normalizer at parse time. Venue-reported
    /// timestamps are not used, so staleness comparisons stay consistent
    /// across venues with clock skew.
    pub observed_at: Instant,
    /// Per-venue monotonic counter, where the venue provides one. Only ever
    /// compared within a single venue's stream.
    pub sequence: Option<u64>,
}

impl CanonicalQuote {
    /// True when the venue reported a crossed book (`ask < bid`). Crossed
    /// quotes are stored but excluded from detection.
    pub fn is_crossed(&self) -> bool {
        self.best_ask < self.best_bid
    }
}

/// A detected cross-exchange arbitrage opportunity. Emitted as an event to
/// the configured sink; never stored.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ArbitrageOpportunity {
    pub id: Uuid,
    pub instrument: Instrument,
    /// The venue whose ask is lower (buy leg).
    pub buy_exchange: Exchange,
    /// The venue whose bid is higher (sell leg).
    pub sell_exchange: Exchange,
    pub buy_price: Price,
    pub sell_price: Price,
    pub spread: Decimal,
    pub spread_ratio: Decimal,
    pub detected_at: DateTime<Utc>,
}

impl ArbitrageOpportunity {
    /// Stable content hash covering the legs and prices, ignoring the id and
    /// detection time. Two emissions with the same hash describe the same
    /// market condition.
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.instrument.0.as_bytes());
        hasher.update(self.buy_exchange.as_str().as_bytes());
        hasher.update(self.sell_exchange.as_str().as_bytes());
        hasher.update(self.buy_price.0.to_string().as_bytes());
        hasher.update(self.sell_price.0.to_string().as_bytes());
        *hasher.finalize().as_bytes()
    }
}
