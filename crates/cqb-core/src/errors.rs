/// Core error type for the bot.
///
/// Adapter crates should map their specific errors into this type so the bot
/// core can handle failures consistently (user-facing message vs fatal).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// The login exchange itself failed. Not retried.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Every candidate endpoint failed; carries the last observed failure.
    #[error("quote retrieval failed: {0}")]
    QuoteRetrieval(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
