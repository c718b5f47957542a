//! Binance message normalization.
//!
//! Three price-bearing shapes arrive on the raw stream: `bookTicker`
//! (top-of-book push, no event-type tag), `depthUpdate`, and `aggTrade`.
//! `bookTicker` and `depthUpdate` share the order-book update-id domain, so
//! both carry it as the per-venue sequence; `aggTrade` ids live in a
//! different domain and are not sequenced.

use super::{is_text_heartbeat, parse_price, parse_quantity, split_concatenated_symbol};
use common::{CanonicalQuote, Exchange, FeedError};
use serde::Deserialize;
use std::time::Instant;

#[derive(Debug, Deserialize)]
struct BookTickerMsg {
    #[serde(rename = "u")]
    update_id: u64,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "b")]
    bid_price: String,
    #[serde(rename = "B")]
    bid_qty: String,
    #[serde(rename = "a")]
    ask_price: String,
    #[serde(rename = "A")]
    ask_qty: String,
}

#[derive(Debug, Deserialize)]
struct DepthUpdateMsg {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "u")]
    final_update_id: u64,
    #[serde(rename = "b")]
    bids: Vec<[String; 2]>,
    #[serde(rename = "a")]
    asks: Vec<[String; 2]>,
}

#[derive(Debug, Deserialize)]
struct AggTradeMsg {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "p")]
    price: String,
}

pub(crate) fn normalize(
    raw: &str,
    observed_at: Instant,
) -> Result<Option<CanonicalQuote>, FeedError> {
    if is_text_heartbeat(raw) {
        return Ok(None);
    }
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| FeedError::Parse(format!("binance: {}", e)))?;
    // Combined streams wrap the payload in {"stream": ..., "data": ...}.
    let payload = value.get("data").unwrap_or(&value);

    match payload.get("e").and_then(|e| e.as_str()) {
        Some("depthUpdate") => {
            let msg: DepthUpdateMsg = serde_json::from_value(payload.clone())
                .map_err(|e| FeedError::Parse(format!("binance depthUpdate: {}", e)))?;
            // An update can momentarily clear one side of the book; without
            // both sides there is no usable top-of-book snapshot.
            let (Some(best_bid), Some(best_ask)) = (msg.bids.first(), msg.asks.first()) else {
                return Ok(None);
            };
            Ok(Some(CanonicalQuote {
                exchange: Exchange::Binance,
                instrument: split_concatenated_symbol(&msg.symbol),
                best_bid: parse_price("bid price", &best_bid[0])?,
                best_ask: parse_price("ask price", &best_ask[0])?,
                bid_size: Some(parse_quantity("bid size", &best_bid[1])?),
                ask_size: Some(parse_quantity("ask size", &best_ask[1])?),
                observed_at,
                sequence: Some(msg.final_update_id),
            }))
        }
        Some("aggTrade") => {
            let msg: AggTradeMsg = serde_json::from_value(payload.clone())
                .map_err(|e| FeedError::Parse(format!("binance aggTrade: {}", e)))?;
            // No explicit bid/ask on a trade print; the trade price stands
            // in for both sides.
            let price = parse_price("trade price", &msg.price)?;
            Ok(Some(CanonicalQuote {
                exchange: Exchange::Binance,
                instrument: split_concatenated_symbol(&msg.symbol),
                best_bid: price,
                best_ask: price,
                bid_size: None,
                ask_size: None,
                observed_at,
                sequence: None,
            }))
        }
        Some(_) => Ok(None),
        None => {
            // bookTicker pushes carry no "e" tag; recognize them by shape.
            if payload.get("b").is_some() && payload.get("a").is_some() && payload.get("s").is_some()
            {
                let msg: BookTickerMsg = serde_json::from_value(payload.clone())
                    .map_err(|e| FeedError::Parse(format!("binance bookTicker: {}", e)))?;
                Ok(Some(CanonicalQuote {
                    exchange: Exchange::Binance,
                    instrument: split_concatenated_symbol(&msg.symbol),
                    best_bid: parse_price("bid price", &msg.bid_price)?,
                    best_ask: parse_price("ask price", &msg.ask_price)?,
                    bid_size: Some(parse_quantity("bid size", &msg.bid_qty)?),
                    ask_size: Some(parse_quantity("ask size", &msg.ask_qty)?),
                    observed_at,
                    sequence: Some(msg.update_id),
                }))
            } else {
                // Subscription acks ({"result":null,"id":1}) and other
                // control responses.
                Ok(None)
            }
        }
    }
}
