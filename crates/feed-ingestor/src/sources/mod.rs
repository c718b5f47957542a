//! Feed worker sources shipped with the workspace.
//!
//! Live websocket connectors implement `FeedWorker` out of tree; these two
//! exist so the whole pipeline can run without network access: a synthetic
//! random-walk source and an NDJSON recording replay.

pub mod replay;
pub mod sim;

pub use replay::ReplayFeedFactory;
pub use sim::SimFeedFactory;

use common::{Exchange, Instrument};

/// Map a canonical instrument to the venue's native spelling, the inverse
/// of what the normalizers do.
pub(crate) fn venue_symbol(exchange: Exchange, instrument: &Instrument) -> String {
    match exchange {
        Exchange::Okx => format!("{}-SWAP", instrument.0.replace('/', "-")),
        Exchange::Binance | Exchange::Bybit | Exchange::Bitget => instrument.0.replace('/', ""),
    }
}
