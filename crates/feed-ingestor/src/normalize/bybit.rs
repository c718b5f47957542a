//! Bybit v5 message normalization.
//!
//! Subscribed to `tickers.<SYMBOL>` on the linear public stream. Snapshot
//! pushes carry the full top of book; delta pushes only carry changed
//! fields, and a delta missing either side cannot produce a usable
//! self-contained quote, so it normalizes to `None`. The `cs` cross
//! sequence is the per-venue sequence counter.

use super::{is_text_heartbeat, parse_price, parse_quantity, split_concatenated_symbol};
use common::{CanonicalQuote, Exchange, FeedError};
use serde::Deserialize;
use std::time::Instant;

#[derive(Debug, Deserialize)]
struct PushMsg {
    #[serde(default)]
    cs: Option<u64>,
    data: TickerData,
}

#[derive(Debug, Deserialize)]
struct TickerData {
    symbol: String,
    #[serde(rename = "bid1Price", default)]
    bid_price: Option<String>,
    #[serde(rename = "bid1Size", default)]
    bid_size: Option<String>,
    #[serde(rename = "ask1Price", default)]
    ask_price: Option<String>,
    #[serde(rename = "ask1Size", default)]
    ask_size: Option<String>,
}

pub(crate) fn normalize(
    raw: &str,
    observed_at: Instant,
) -> Result<Option<CanonicalQuote>, FeedError> {
    if is_text_heartbeat(raw) {
        return Ok(None);
    }
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| FeedError::Parse(format!("bybit: {}", e)))?;
    // Op responses: subscribe acks and JSON pongs ({"op":"pong",...},
    // {"success":true,"op":"subscribe",...}).
    if value.get("op").is_some() || value.get("success").is_some() {
        return Ok(None);
    }
    let Some(topic) = value.get("topic").and_then(|t| t.as_str()) else {
        return Ok(None);
    };
    if !topic.starts_with("tickers.") {
        return Ok(None);
    }
    let msg: PushMsg = serde_json::from_value(value)
        .map_err(|e| FeedError::Parse(format!("bybit ticker: {}", e)))?;

    // Deltas that touched neither side of the book carry no price update.
    let (Some(bid_price), Some(ask_price)) = (&msg.data.bid_price, &msg.data.ask_price) else {
        return Ok(None);
    };

    let bid_size = msg
        .data
        .bid_size
        .as_deref()
        .map(|s| parse_quantity("bid size", s))
        .transpose()?;
    let ask_size = msg
        .data
        .ask_size
        .as_deref()
        .map(|s| parse_quantity("ask size", s))
        .transpose()?;

    Ok(Some(CanonicalQuote {
        exchange: Exchange::Bybit,
        instrument: split_concatenated_symbol(&msg.data.symbol),
        best_bid: parse_price("bid price", bid_price)?,
        best_ask: parse_price("ask price", ask_price)?,
        bid_size,
        ask_size,
        observed_at,
        sequence: msg.cs,
    }))
}
