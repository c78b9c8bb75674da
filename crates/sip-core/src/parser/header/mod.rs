//! The header dispatch table (component E): maps a (possibly compact)
//! header name to its parser, falling back to [`crate::header::GenericHeader`]
//! for anything unrecognized.

mod address;
mod cseq;
mod media_type;
mod simple;
mod via;

pub use address::{parse_address_list, parse_single_address};
pub use cseq::parse_cseq;
pub use media_type::{parse_accept, parse_media_type};
pub use simple::{parse_call_id, parse_method_list, parse_token_list, parse_u32};
pub use via::parse_via;

use crate::error::{Result, SipParseError};
use crate::header::{GenericHeader, Header};
use crate::parser::lexer::trim_ws;

/// Expands a compact header name (RFC 3261 §7.3.3) to its long form.
/// Names with no compact alias pass through unchanged.
fn normalize_name(lower: &str) -> &str {
    match lower {
        "t" => "to",
        "f" => "from",
        "m" => "contact",
        "i" => "call-id",
        "v" => "via",
        "l" => "content-length",
        "c" => "content-type",
        "k" => "supported",
        "s" => "subject",
        "e" => "content-encoding",
        other => other,
    }
}

/// Parses one raw, already-unfolded header line (`"Name: body"`) into
/// zero or more [`Header`] values (zero only never happens; several
/// happen for `Contact`, which fans a comma-separated body out into one
/// `Header::Contact` per address).
pub fn parse_header_line(line: &str) -> Result<Vec<Header>> {
    let colon = line
        .find(':')
        .ok_or_else(|| SipParseError::InvalidHeader(format!("header line has no ':': '{line}'")))?;
    let raw_name = trim_ws(&line[..colon]);
    let body = trim_ws(&line[colon + 1..]);
    let lower = raw_name.to_ascii_lowercase();
    let name = normalize_name(&lower);

    let headers = match name {
        "to" => vec![Header::To(parse_single_address(body)?)],
        "from" => vec![Header::From(parse_single_address(body)?)],
        "contact" => parse_address_list(body, true)?
            .into_iter()
            .map(Header::Contact)
            .collect(),
        "via" => vec![Header::Via(parse_via(body)?)],
        "cseq" => {
            let (seq_no, method) = parse_cseq(body)?;
            vec![Header::CSeq { seq_no, method }]
        }
        "call-id" => vec![Header::CallId(parse_call_id(body)?)],
        "max-forwards" => vec![Header::MaxForwards(parse_u32(body, "Max-Forwards")?)],
        "content-length" => vec![Header::ContentLength(parse_u32(body, "Content-Length")?)],
        "expires" => vec![Header::Expires(parse_u32(body, "Expires")?)],
        "allow" => vec![Header::Allow(parse_method_list(body))],
        "supported" => vec![Header::Supported(parse_token_list(body))],
        "require" => vec![Header::Require(parse_token_list(body))],
        "route" => vec![Header::Route(parse_address_list(body, false)?)],
        "record-route" => vec![Header::RecordRoute(parse_address_list(body, false)?)],
        "user-agent" => vec![Header::UserAgent(body.to_string())],
        "content-type" => vec![Header::ContentType(parse_media_type(body)?)],
        "accept" => vec![Header::Accept(parse_accept(body)?)],
        _ => vec![Header::Generic(GenericHeader {
            name: raw_name.to_string(),
            contents: body.to_string(),
        })],
    };
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_long_and_compact_names() {
        let long = parse_header_line("To: <sip:bob@biloxi.com>").unwrap();
        let compact = parse_header_line("t: <sip:bob@biloxi.com>").unwrap();
        assert!(matches!(&long[0], Header::To(_)));
        assert!(matches!(&compact[0], Header::To(_)));
    }

    #[test]
    fn unknown_header_becomes_generic() {
        let headers = parse_header_line("X-Custom: hello world").unwrap();
        match &headers[0] {
            Header::Generic(g) => {
                assert_eq!(g.name, "X-Custom");
                assert_eq!(g.contents, "hello world");
            }
            other => panic!("expected Generic, got {other:?}"),
        }
    }

    #[test]
    fn missing_colon_is_an_error() {
        assert!(parse_header_line("NoColonHere").is_err());
    }

    #[test]
    fn contact_line_with_multiple_entries_yields_multiple_headers() {
        let headers = parse_header_line("Contact: <sip:a@b>, <sip:c@d>").unwrap();
        assert_eq!(headers.len(), 2);
        assert!(headers.iter().all(|h| matches!(h, Header::Contact(_))));
    }

    #[test]
    fn compact_subject_and_content_encoding_fall_back_to_generic() {
        let headers = parse_header_line("s: test call").unwrap();
        assert!(matches!(&headers[0], Header::Generic(g) if g.name == "s"));
    }
}
