//! Convenience request/response builders for tests and quick manual
//! construction — not part of the transaction layer's own logic, kept
//! separate the way the teacher's `transaction-core/src/builders.rs`
//! separates message construction from transaction-management code.
//! Dialog-layer helpers (`DialogInfo` and friends) are deliberately not
//! ported here: dialog tracking is out of scope for this crate.

use sipstack_core::header::{Header, NameAddr, ViaHop};
use sipstack_core::message::{Request, Response};
use sipstack_core::primitive::{MaybeString, Method};
use sipstack_core::uri::{SipUri, Uri};

fn via(branch: &str, host: &str) -> Header {
    let mut hop = ViaHop::new("SIP", "2.0", "UDP", host, None);
    hop.params.add("branch", MaybeString::Some(branch.to_string()));
    Header::Via(vec![hop])
}

fn name_addr(user: &str, host: &str, tag: Option<&str>) -> NameAddr {
    let mut uri = SipUri::new(host.to_string());
    uri.user = MaybeString::Some(user.to_string());
    let mut addr = NameAddr::new(uri);
    if let Some(tag) = tag {
        addr.params.add("tag", MaybeString::Some(tag.to_string()));
    }
    addr
}

/// Builds a bare-bones `INVITE` (or any method, via `method`) with a
/// fresh RFC 3261 branch, ready for
/// `TransactionManager::create_client_transaction`. Mirrors the shape of
/// the teacher's `client_quick` test helper.
pub fn client_quick(method: Method, branch: &str, from_tag: &str, call_id: &str, seq_no: u32, to_host: &str) -> Request {
    let recipient = {
        let mut uri = SipUri::new(to_host.to_string());
        uri.user = MaybeString::Some("bob".to_string());
        Uri::Sip(uri)
    };
    Request {
        method: method.clone(),
        recipient,
        sip_version: "SIP/2.0".to_string(),
        headers: vec![
            via(branch, "pc.example.com"),
            Header::From(name_addr("alice", "example.com", Some(from_tag))),
            Header::To(name_addr("bob", to_host, None)),
            Header::CallId(call_id.to_string()),
            Header::CSeq { seq_no, method },
            Header::MaxForwards(70),
            Header::ContentLength(0),
        ],
        body: String::new(),
    }
}

/// Builds a response with `status_code`/`reason` answering `request`,
/// copying the headers a response must echo (`Via`, `From`, `To`,
/// `Call-ID`, `CSeq`). Adds a `to_tag` if the response is a final
/// response establishing a dialog. Mirrors the teacher's `server_quick`
/// test helper.
pub fn server_quick(request: &Request, status_code: u16, reason: &str, to_tag: Option<&str>) -> Response {
    let mut headers = Vec::new();
    for h in &request.headers {
        match h {
            Header::Via(_) | Header::From(_) | Header::CallId(_) | Header::CSeq { .. } => headers.push(h.clone()),
            Header::To(addr) => {
                let mut addr = addr.clone();
                if let Some(tag) = to_tag {
                    addr.params.add("tag", MaybeString::Some(tag.to_string()));
                }
                headers.push(Header::To(addr));
            }
            _ => {}
        }
    }
    headers.push(Header::ContentLength(0));
    Response {
        sip_version: "SIP/2.0".to_string(),
        status_code,
        reason: reason.to_string(),
        headers,
        body: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_quick_builds_a_well_formed_invite() {
        let req = client_quick(Method::Invite, "z9hG4bK-test", "atag", "cid-1", 1, "biloxi.com");
        assert_eq!(req.method, Method::Invite);
        assert!(req.header(|h| matches!(h, Header::Via(_)).then_some(())).is_some());
    }

    #[test]
    fn server_quick_echoes_request_headers_and_adds_to_tag() {
        let req = client_quick(Method::Invite, "z9hG4bK-test", "atag", "cid-1", 1, "biloxi.com");
        let resp = server_quick(&req, 200, "OK", Some("btag"));
        assert_eq!(resp.status_code, 200);
        let to = resp
            .header(|h| match h {
                Header::To(a) => Some(a.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(to.params.get("tag").and_then(|v| v.as_str()), Some("btag"));
    }
}
