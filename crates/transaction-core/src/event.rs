//! The transaction layer's event vocabulary (spec §4.7a). Everything the
//! manager publishes — new transactions, stray messages, transport
//! failures, timeouts, state changes — flows through one
//! `mpsc::Receiver<TransactionEvent>`; spec.md's narrower
//! `new_server_transactions`/`stray_responses`/`errors` streams are
//! filtering projections a caller builds over the same channel.

use std::net::SocketAddr;

use sipstack_core::message::{Request, Response};

use crate::key::TxKey;
use crate::transaction::{TransactionKind, TransactionState};

#[derive(Debug, Clone)]
pub enum TransactionEvent {
    /// A new server transaction was created for an inbound `INVITE`.
    InviteRequest {
        key: TxKey,
        request: Request,
        source: SocketAddr,
    },
    /// A new server transaction was created for an inbound non-`INVITE`
    /// request.
    NonInviteRequest {
        key: TxKey,
        request: Request,
        source: SocketAddr,
    },
    ProvisionalResponse { key: TxKey, response: Response },
    SuccessResponse { key: TxKey, response: Response },
    FailureResponse { key: TxKey, response: Response },
    /// An `ACK` was delivered to its server INVITE transaction.
    AckReceived { key: TxKey, request: Request },
    /// A `CANCEL` was delivered to its server INVITE transaction.
    CancelReceived { key: TxKey, request: Request },
    /// An `ACK` that matched no live server INVITE transaction (e.g. the
    /// 2xx case, where the dialog layer owns ACK matching — property 9).
    StrayAck { request: Request, source: SocketAddr },
    /// A `CANCEL` that matched no live server transaction.
    StrayCancel { request: Request, source: SocketAddr },
    /// Any other inbound request that matched no existing key and whose
    /// transaction could not be created (e.g. a keying error).
    StrayRequest { request: Request, source: SocketAddr },
    /// An inbound response matching no client transaction.
    StrayResponse { response: Response, source: SocketAddr },
    TransportError { key: TxKey, error: String },
    TransactionTimeout { key: TxKey },
    /// Emitted exactly once as a transaction leaves the store; recovered
    /// internally by the manager and not republished to user-facing
    /// consumers.
    TransactionTerminated { key: TxKey },
    StateChanged {
        key: TxKey,
        kind: TransactionKind,
        old_state: TransactionState,
        new_state: TransactionState,
    },
    TimerTriggered { key: TxKey, timer: &'static str },
}

impl TransactionEvent {
    /// `true` for the two marker events the manager handles internally
    /// (store pruning) and never forwards to the user-facing error
    /// stream (spec §7's propagation policy).
    pub fn is_internal_only(&self) -> bool {
        matches!(self, TransactionEvent::TransactionTerminated { .. })
    }

    pub fn key(&self) -> Option<&TxKey> {
        match self {
            TransactionEvent::InviteRequest { key, .. }
            | TransactionEvent::NonInviteRequest { key, .. }
            | TransactionEvent::ProvisionalResponse { key, .. }
            | TransactionEvent::SuccessResponse { key, .. }
            | TransactionEvent::FailureResponse { key, .. }
            | TransactionEvent::AckReceived { key, .. }
            | TransactionEvent::CancelReceived { key, .. }
            | TransactionEvent::TransportError { key, .. }
            | TransactionEvent::TransactionTimeout { key }
            | TransactionEvent::TransactionTerminated { key }
            | TransactionEvent::StateChanged { key, .. }
            | TransactionEvent::TimerTriggered { key, .. } => Some(key),
            TransactionEvent::StrayAck { .. }
            | TransactionEvent::StrayCancel { .. }
            | TransactionEvent::StrayRequest { .. }
            | TransactionEvent::StrayResponse { .. } => None,
        }
    }
}
