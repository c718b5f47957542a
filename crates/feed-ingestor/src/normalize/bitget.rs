//! Bitget v2 message normalization.
//!
//! Subscribed to the USDT-futures `ticker` channel. Pushes arrive as
//! `{"action":"snapshot","arg":{"channel":"ticker","instId":...},
//! "data":[{...}]}`. Event frames and text heartbeats are noise.

use super::{is_text_heartbeat, parse_price, parse_quantity, split_concatenated_symbol};
use common::{CanonicalQuote, Exchange, FeedError};
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
    #[serde(rename = "bidPr")]
    bid_price: String,
    #[serde(rename = "askPr")]
    ask_price: String,
    #[serde(rename = "bidSz", default)]
    bid_size: Option<String>,
    #[serde(rename = "askSz", default)]
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
        serde_json::from_str(raw).map_err(|e| FeedError::Parse(format!("bitget: {}", e)))?;
    if value.get("event").is_some() {
        return Ok(None);
    }
    if value.get("arg").is_none() {
        return Ok(None);
    }
    let msg: PushMsg = serde_json::from_value(value)
        .map_err(|e| FeedError::Parse(format!("bitget ticker: {}", e)))?;
    if msg.arg.channel != "ticker" {
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
        exchange: Exchange::Bitget,
        instrument: split_concatenated_symbol(&ticker.inst_id),
        best_bid: parse_price("bid price", &ticker.bid_price)?,
        best_ask: parse_price("ask price", &ticker.ask_price)?,
        bid_size,
        ask_size,
        observed_at,
        sequence: None,
    }))
}
