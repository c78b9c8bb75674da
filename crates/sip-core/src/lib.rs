//! SIP message grammar: primitives, URIs, headers, and the message
//! parser itself. This crate has no knowledge of transactions or
//! transport — it only turns bytes into typed messages and back.

pub mod buffer;
pub mod error;
pub mod header;
pub mod message;
pub mod parser;
pub mod primitive;
pub mod uri;

/// Common imports for crates consuming parsed SIP messages.
pub mod prelude {
    pub use crate::buffer::{DatagramBuffer, MessageBuffer, ReadOutcome, StreamBuffer};
    pub use crate::error::{Result, SipParseError};
    pub use crate::header::Header;
    pub use crate::message::{Message, Request, Response};
    pub use crate::parser::{parse_datagram_message, parse_stream_message};
    pub use crate::primitive::{MaybeString, Method, Params, Port};
    pub use crate::uri::{SipUri, Uri, WildcardUri};
}
