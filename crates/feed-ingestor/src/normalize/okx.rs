//! OKX message normalization.
//!
//! Subscribed to the public `tickers` channel; pushes arrive as
//! `{"arg":{"channel":"tickers","instId":...},"data":[{...}]}` with one
//! ticker per push. Event frames (`{"event":"subscribe",...}`) and text
//! heartbeats are noise.

use super::{is_text_heartbeat, parse_price, parse_quantity};
use common::{CanonicalQuote, Exchange, FeedError, Instrument};
use serde::Deserialize;
use std::time::Instant;

#[derive(Debug, Deserialize)]
struct PushMsg {
    arg: PushArg,
    #[serde(default)]
    data: Vec<TickerData>,
}

#[derive(Debug, Deserialize)]
struct PushArg {
    channel: String,
}

#[derive(Debug, Deserialize)]
struct TickerData {
    #[serde(rename = "instId")]
    inst_id: String,
    #[serde(rename = "bestBid")]
    best_bid: String,
    #[serde(rename = "bestAsk")]
    best_ask: String,
    #[serde(rename = "bidSz", default)]
    bid_size: Option<String>,
    #[serde(rename = "askSz", default)]
    ask_size: Option<String>,
}

/// Map an OKX instrument id to the canonical spelling:
/// `BTC-USDT-SWAP` → `BTC/USDT`.
fn canonical_symbol(inst_id: &str) -> Instrument {
    let trimmed = inst_id.strip_suffix("-SWAP").unwrap_or(inst_id);
    Instrument(trimmed.to_uppercase().replace('-', "/"))
}

pub(crate) fn normalize(
    raw: &str,
    observed_at: Instant,
) -> Result<Option<CanonicalQuote>, FeedError> {
    if is_text_heartbeat(raw) {
        return Ok(None);
    }
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| FeedError::Parse(format!("okx: {}", e)))?;
    // Subscription acks and errors come as event frames, not pushes.
    if value.get("event").is_some() {
        return Ok(None);
    }
    if value.get("arg").is_none() {
        return Ok(None);
    }
    let msg: PushMsg = serde_json::from_value(value)
        .map_err(|e| FeedError::Parse(format!("okx ticker: {}", e)))?;
    if msg.arg.channel != "tickers" {
        return Ok(None);
    }
    let Some(ticker) = msg.data.first() else {
        return Ok(None);
    };

    let bid_size = ticker
        .bid_size
        .as_deref()
        .map(|s| parse_quantity("bid size", s))
        .transpose()?;
    let ask_size = ticker
        .ask_size
        .as_deref()
        .map(|s| parse_quantity("ask size", s))
        .transpose()?;

    Ok(Some(CanonicalQuote {
        exchange: Exchange::Okx,
        instrument: canonical_symbol(&ticker.inst_id),
        best_bid: parse_price("bid price", &ticker.best_bid)?,
        best_ask: parse_price("ask price", &ticker.best_ask)?,
        bid_size,
        ask_size,
        observed_at,
        sequence: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Price;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ticker_push() {
        let raw = r#"{"arg":{"channel":"tickers","instId":"BTC-USDT-SWAP"},
            "data":[{"instType":"SWAP","instId":"BTC-USDT-SWAP","last":"60050.0",
                     "bestBid":"60049.5","bestAsk":"60050.5","ts":"1716000000000"}]}"#;
        let quote = normalize(raw, Instant::now()).unwrap().unwrap();
        assert_eq!(quote.instrument, Instrument::from("BTC/USDT"));
        assert_eq!(quote.best_bid, Price(dec!(60049.5)));
        assert_eq!(quote.best_ask, Price(dec!(60050.5)));
        // This venue's ticker omits sizes.
        assert_eq!(quote.bid_size, None);
        assert_eq!(quote.sequence, None);
    }

    #[test]
    fn test_ticker_push_with_sizes() {
        let raw = r#"{"arg":{"channel":"tickers","instId":"ETH-USDT-SWAP"},
            "data":[{"instId":"ETH-USDT-SWAP","bestBid":"2000.1","bestAsk":"2000.3",
                     "bidSz":"12","askSz":"8"}]}"#;
        let quote = normalize(raw, Instant::now()).unwrap().unwrap();
        assert_eq!(quote.instrument, Instrument::from("ETH/USDT"));
        assert_eq!(quote.bid_size, Some(common::Quantity(dec!(12))));
        assert_eq!(quote.ask_size, Some(common::Quantity(dec!(8))));
    }

    #[test]
    fn test_subscribe_ack_is_noise() {
        let raw = r#"{"event":"subscribe","arg":{"channel":"tickers","instId":"BTC-USDT-SWAP"}}"#;
        assert_eq!(normalize(raw, Instant::now()).unwrap(), None);
    }

    #[test]
    fn test_other_channel_is_noise() {
        let raw = r#"{"arg":{"channel":"trades","instId":"BTC-USDT-SWAP"},"data":[{"px":"1"}]}"#;
        assert_eq!(normalize(raw, Instant::now()).unwrap(), None);
    }

    #[test]
    fn test_text_ping_is_noise() {
        assert_eq!(normalize("pong", Instant::now()).unwrap(), None);
    }

    #[test]
    fn test_malformed_ticker_is_a_parse_error() {
        let raw = r#"{"arg":{"channel":"tickers","instId":"BTC-USDT-SWAP"},
            "data":[{"instId":"BTC-USDT-SWAP","bestBid":"high","bestAsk":"60050.5"}]}"#;
        assert!(normalize(raw, Instant::now()).is_err());
    }
}
