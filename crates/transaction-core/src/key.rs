//! Transaction keying (component G, spec §4.6): deterministic derivation
//! of a `TxKey` from message fields (never from raw bytes), so retransmits
//! of the same request or response land on the same transaction.

use sipstack_core::header::{Header, NameAddr, ViaHop};
use sipstack_core::message::{Message, Request};
use sipstack_core::primitive::Method;

use crate::error::{Result, TransactionError};

/// An opaque, deterministically-derived transaction identifier.
pub type TxKey = String;

/// CANCEL and ACK route to the server side of the INVITE transaction
/// they reference, so they key identically to it (spec §4.6, property 6).
fn effective_method(method: &Method) -> Method {
    match method {
        Method::Ack | Method::Cancel => Method::Invite,
        other => other.clone(),
    }
}

fn first_via_hop(headers: &[Header]) -> Option<&ViaHop> {
    headers.iter().find_map(|h| match h {
        Header::Via(hops) => hops.first(),
        _ => None,
    })
}

fn cseq(headers: &[Header]) -> Option<(u32, Method)> {
    headers.iter().find_map(|h| match h {
        Header::CSeq { seq_no, method } => Some((*seq_no, method.clone())),
        _ => None,
    })
}

fn from_addr(headers: &[Header]) -> Option<&NameAddr> {
    headers.iter().find_map(|h| match h {
        Header::From(addr) => Some(addr),
        _ => None,
    })
}

fn call_id(headers: &[Header]) -> Option<&str> {
    headers.iter().find_map(|h| match h {
        Header::CallId(s) => Some(s.as_str()),
        _ => None,
    })
}

/// The method used for keying purposes: a request's own method for a
/// request, the `CSeq` method for a response (which may differ from the
/// status-line, which carries none).
fn keying_method(headers: &[Header], own_method: Option<&Method>) -> Result<Method> {
    if let Some(m) = own_method {
        return Ok(m.clone());
    }
    cseq(headers)
        .map(|(_, m)| m)
        .ok_or_else(|| TransactionError::InvalidTransactionId("message has no CSeq header".into()))
}

/// Pre-RFC 3261 fallback key (spec §4.6): used when the top `Via`'s
/// `branch` doesn't carry the `z9hG4bK` magic cookie.
fn fallback_key(headers: &[Header], via: &ViaHop, cseq_method: &Method) -> Result<TxKey> {
    let from_tag = from_addr(headers)
        .and_then(|a| a.params.get("tag"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| TransactionError::InvalidTransactionId("missing From tag for legacy keying".into()))?;
    let cid = call_id(headers)
        .ok_or_else(|| TransactionError::InvalidTransactionId("missing Call-ID for legacy keying".into()))?;
    let (seq_no, _) = cseq(headers)
        .ok_or_else(|| TransactionError::InvalidTransactionId("missing CSeq for legacy keying".into()))?;
    Ok(format!("legacy|{from_tag}|{cid}|{cseq_method}|{seq_no}|{via}"))
}

/// Computes the server-side key for an inbound request: the key under
/// which its matching server transaction is stored. `ACK`/`CANCEL`
/// resolve to the key of the `INVITE` server transaction they target.
pub fn make_server_tx_key(request: &Request) -> Result<TxKey> {
    let via = first_via_hop(&request.headers)
        .ok_or_else(|| TransactionError::InvalidTransactionId("request has no Via header".into()))?;
    let method = effective_method(&request.method);

    if via.has_rfc3261_branch() {
        let branch = via.branch().expect("has_rfc3261_branch implies branch()");
        let port = via.port.map(|p| p.to_string()).unwrap_or_default();
        Ok(format!("{branch}|{}|{port}|{method}", via.host))
    } else {
        fallback_key(&request.headers, via, &method)
    }
}

/// Computes the client-side key of `message`: for an outbound request,
/// this is the key its own client transaction is stored under; for an
/// inbound response, this is the key used to find that transaction.
pub fn make_client_tx_key(message: &Message) -> Result<TxKey> {
    let headers = message.headers();
    let via = first_via_hop(headers)
        .ok_or_else(|| TransactionError::InvalidTransactionId("message has no Via header".into()))?;
    let own_method = match message {
        Message::Request(r) => Some(&r.method),
        Message::Response(_) => None,
    };
    let method = effective_method(&keying_method(headers, own_method)?);

    if via.has_rfc3261_branch() {
        let branch = via.branch().expect("has_rfc3261_branch implies branch()");
        Ok(format!("{branch}|{method}"))
    } else {
        fallback_key(headers, via, &method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sipstack_core::parser::parse_datagram_message;

    fn invite_request() -> Request {
        let raw = b"INVITE sip:bob@biloxi.com SIP/2.0\r\n\
Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
Call-ID: a84b4c76e66710\r\n\
CSeq: 314159 INVITE\r\n\
Content-Length: 0\r\n\r\n";
        match parse_datagram_message(raw).unwrap() {
            Message::Request(r) => r,
            _ => unreachable!(),
        }
    }

    #[test]
    fn ack_and_cancel_key_identically_to_their_invite_on_the_server_side() {
        let invite = invite_request();
        let invite_key = make_server_tx_key(&invite).unwrap();

        let mut ack = invite.clone();
        ack.method = Method::Ack;
        let ack_key = make_server_tx_key(&ack).unwrap();
        assert_eq!(invite_key, ack_key);

        let mut cancel = invite.clone();
        cancel.method = Method::Cancel;
        let cancel_key = make_server_tx_key(&cancel).unwrap();
        assert_eq!(invite_key, cancel_key);
    }

    #[test]
    fn client_key_depends_only_on_branch_and_method() {
        let invite = invite_request();
        let key_a = make_client_tx_key(&Message::Request(invite.clone())).unwrap();

        let mut same_branch_different_to = invite.clone();
        same_branch_different_to.recipient = invite.recipient.clone();
        let key_b = make_client_tx_key(&Message::Request(same_branch_different_to)).unwrap();
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn missing_via_is_a_keying_error() {
        let mut invite = invite_request();
        invite.headers.retain(|h| !matches!(h, Header::Via(_)));
        assert!(make_server_tx_key(&invite).is_err());
    }
}
