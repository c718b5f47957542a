use thiserror::Error;

/// Error taxonomy for the ingestion path. None of these are fatal to the
/// system as a whole: a parse failure discards one message, a transport
/// failure ends one worker incarnation.
#[derive(Error, Debug, PartialEq)]
pub enum FeedError {
    /// A malformed or unexpectedly shaped venue payload.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The venue rejected or dropped a subscription.
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// A transport-level failure reported by a feed worker.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A venue identifier outside the supported set.
    #[error("Unsupported exchange: {0}")]
    UnsupportedExchange(String),
}
