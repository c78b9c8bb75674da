use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransactionError>;

/// The transaction layer's error taxonomy (spec §7). `Terminated` is a
/// marker used internally to prune the store and is never surfaced on
/// the user-facing error stream — see [`crate::manager::TransactionManager`].
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("transport failure on transaction {key}: {source}")]
    TransportFailure {
        key: String,
        #[source]
        source: sipstack_transport::Error,
    },

    #[error("transaction {key} timed out")]
    Timeout { key: String },

    /// Emitted exactly once when a transaction is removed from the
    /// store. Recovered locally by the manager, never republished.
    #[error("transaction {key} terminated")]
    Terminated { key: String },

    #[error("message delivered to transaction {key} does not match its expected kind: {reason}")]
    UnexpectedMessage { key: String, reason: String },

    #[error("no transaction found for key {0}")]
    TransactionNotFound(String),

    #[error("could not compute a transaction key: {0}")]
    InvalidTransactionId(String),

    #[error(transparent)]
    Parse(#[from] sipstack_core::error::SipParseError),

    #[error(transparent)]
    Transport(#[from] sipstack_transport::Error),
}
