use thiserror::Error;

/// Result type alias for every parser in this crate.
pub type Result<T> = std::result::Result<T, SipParseError>;

/// Syntax and framing errors raised while turning bytes into a typed SIP
/// message. Per-header parse errors are recovered by the message parser
/// (the offending header is dropped, see
/// [`crate::parser::message`]) — this enum is what gets constructed for
/// that locally-recovered failure as much as for a fatal one; only the
/// caller decides which errors are fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SipParseError {
    #[error("invalid start line: {0}")]
    InvalidStartLine(String),

    #[error("invalid header line: {0}")]
    InvalidHeader(String),

    #[error("invalid URI: {0}")]
    InvalidUri(String),

    #[error("unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid parameter list: {0}")]
    InvalidParams(String),

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("Content-Length header missing")]
    MissingContentLength,

    #[error("duplicate Content-Length header")]
    DuplicateContentLength,

    #[error("declared body length {declared} does not match available {available} bytes")]
    BodyLengthMismatch { declared: usize, available: usize },

    #[error("message is missing the blank line terminating the header block")]
    MissingHeaderTerminator,

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("wildcard URI is not valid in this context")]
    WildcardNotAllowed,
}
