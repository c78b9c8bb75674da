//! The `Transport` capability the core consumes (spec §6.1). Real socket
//! transports (UDP/TCP/TLS/WS) are out of scope for this crate — it only
//! defines the trait boundary and the event/reliability vocabulary the
//! transaction layer is built against; a concrete binding lives in
//! whatever crate owns the sockets.

use std::fmt;
use std::net::SocketAddr;

use async_trait::async_trait;

use sipstack_core::message::Message;

use crate::error::Result;

/// A bidirectional SIP message carrier. Implementations own exactly one
/// local binding (one UDP socket, one TCP connection, ...); the
/// transaction layer holds an `Arc<dyn Transport>` per transaction and
/// calls `send_message` for every retransmission.
#[async_trait]
pub trait Transport: fmt::Debug + Send + Sync {
    /// The local address this transport is bound to.
    fn local_addr(&self) -> Result<SocketAddr>;

    /// Serializes and sends `message` to `destination`. Must be safe to
    /// call concurrently from multiple transactions.
    async fn send_message(&self, message: Message, destination: SocketAddr) -> Result<()>;

    /// Closes the transport. Idempotent.
    async fn close(&self) -> Result<()>;

    fn is_closed(&self) -> bool;
}

/// Events a transport reports back to whatever demultiplexes its inbound
/// stream (spec §6.2's `inbound_messages`, plus out-of-band notices).
#[derive(Debug, Clone)]
pub enum TransportEvent {
    MessageReceived {
        message: Message,
        source: SocketAddr,
        destination: SocketAddr,
    },
    Error {
        error: String,
    },
    Closed,
}

/// Whether timer suppression applies to `transport_name` (spec §6.1):
/// unreliable transports run the full T-family retransmission timers;
/// reliable ones skip them (RFC 3261 §17.1.1.2, §17.1.2.2, §17.2.1).
pub fn is_reliable(transport_name: &str) -> bool {
    matches!(transport_name.to_ascii_uppercase().as_str(), "TCP" | "TLS" | "WS" | "WSS" | "SCTP")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn udp_is_unreliable_tcp_is_reliable() {
        assert!(!is_reliable("UDP"));
        assert!(is_reliable("tcp"));
        assert!(is_reliable("TLS"));
        assert!(is_reliable("ws"));
    }
}
