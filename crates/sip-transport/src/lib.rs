//! The transport capability boundary (spec §6.1): the `Transport` trait
//! the transaction layer sends through, the events it reports, and the
//! reliability predicate that gates the T-family retransmission timers.
//! Concrete socket transports are deliberately out of scope.

pub mod error;
mod transport;

pub use error::{Error, Result};
pub use transport::{is_reliable, Transport, TransportEvent};

pub mod prelude {
    pub use crate::{is_reliable, Error, Result, Transport, TransportEvent};
}
