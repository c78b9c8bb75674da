use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by a [`crate::Transport`] implementation. The
/// transaction layer treats any of these as a transport failure for the
/// transaction that attempted the send (spec §7: "transaction transport
/// errors").
#[derive(Error, Debug)]
pub enum Error {
    #[error("transport is closed")]
    TransportClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
