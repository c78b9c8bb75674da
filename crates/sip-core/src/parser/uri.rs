//! The `sip:`/`sips:` URI parser (component C).

use crate::error::{Result, SipParseError};
use crate::parser::lexer::trim_ws;
use crate::parser::params::parse_params;
use crate::primitive::{MaybeString, Params};
use crate::uri::{SipUri, Uri, WildcardUri};

/// Parses a URI per spec component C: `*` becomes [`Uri::Wildcard`];
/// otherwise a `sip:`/`sips:` URI is required.
pub fn parse_uri(input: &str) -> Result<Uri> {
    let trimmed = trim_ws(input);
    if trimmed == "*" {
        return Ok(Uri::Wildcard(WildcardUri));
    }
    parse_sip_uri(trimmed).map(Uri::Sip)
}

/// Parses a `sip:`/`sips:` URI directly (no wildcard allowed). Used by
/// the request-line parser, which rejects a wildcard recipient outright.
pub fn parse_sip_uri(input: &str) -> Result<SipUri> {
    let colon = input.find(':').ok_or_else(|| {
        SipParseError::InvalidUri(format!("missing scheme delimiter in '{input}'"))
    })?;
    let scheme = &input[..colon];
    let encrypted = if scheme.eq_ignore_ascii_case("sips") {
        true
    } else if scheme.eq_ignore_ascii_case("sip") {
        false
    } else {
        return Err(SipParseError::UnsupportedScheme(scheme.to_string()));
    };
    let rest = &input[colon + 1..];

    // The user-info/host boundary: search for '@' only before the first
    // ';' (uri-params) or '?' (uri-headers), since host/port can never
    // contain a literal '@' while user-info with one must be
    // percent-encoded anyway.
    let boundary = rest
        .find(|c| c == ';' || c == '?')
        .unwrap_or(rest.len());
    let userinfo_at = rest[..boundary].find('@');

    let (user, password, host_port_rest) = if let Some(at) = userinfo_at {
        let userinfo = &rest[..at];
        let host_rest = &rest[at + 1..];
        let (user, password) = match userinfo.find(':') {
            Some(colon) => (
                MaybeString::some(percent_decode(&userinfo[..colon])),
                MaybeString::some(percent_decode(&userinfo[colon + 1..])),
            ),
            None => (MaybeString::some(percent_decode(userinfo)), MaybeString::None),
        };
        (user, password, host_rest)
    } else {
        (MaybeString::None, MaybeString::None, rest)
    };

    let host_port_end = host_port_rest
        .find(|c| c == ';' || c == '?')
        .unwrap_or(host_port_rest.len());
    let host_port = &host_port_rest[..host_port_end];
    let after_host_port = &host_port_rest[host_port_end..];

    let (host, port) = parse_host_port(host_port)?;

    let mut pos = 0usize;
    let uri_params = if after_host_port.starts_with(';') {
        let (params, consumed) = parse_params(after_host_port, ';', ';', '?', true, true)?;
        pos = consumed;
        decode_params(params)
    } else {
        Params::new()
    };

    let headers_src = &after_host_port[pos..];
    let headers = if headers_src.starts_with('?') {
        let (params, _consumed) = parse_params(headers_src, '?', '&', '\0', true, false)?;
        decode_params(params)
    } else {
        Params::new()
    };

    Ok(SipUri {
        encrypted,
        user,
        password: password,
        host: percent_decode(&host),
        port,
        uri_params,
        headers,
    })
}

/// Splits `host[:port]`, handling a bracketed IPv6 literal (with an
/// optional `%25zone` inside the brackets).
fn parse_host_port(host_port: &str) -> Result<(String, Option<u16>)> {
    if host_port.starts_with('[') {
        let close = host_port.find(']').ok_or_else(|| {
            SipParseError::InvalidUri(format!("unterminated IPv6 literal in '{host_port}'"))
        })?;
        let host = host_port[..=close].to_string();
        let after = &host_port[close + 1..];
        let port = parse_optional_port(after)?;
        return Ok((host, port));
    }

    match host_port.rfind(':') {
        Some(colon) => {
            let host = host_port[..colon].to_string();
            let port = parse_port(&host_port[colon + 1..])?;
            Ok((host, Some(port)))
        }
        None => Ok((host_port.to_string(), None)),
    }
}

fn parse_optional_port(after_host: &str) -> Result<Option<u16>> {
    if after_host.is_empty() {
        return Ok(None);
    }
    let port_str = after_host
        .strip_prefix(':')
        .ok_or_else(|| SipParseError::InvalidUri(format!("unexpected text after host: '{after_host}'")))?;
    Ok(Some(parse_port(port_str)?))
}

fn parse_port(s: &str) -> Result<u16> {
    s.parse::<u16>()
        .map_err(|_| SipParseError::InvalidPort(s.to_string()))
}

fn decode_params(params: Params) -> Params {
    params
        .iter()
        .map(|(k, v)| {
            let key = percent_decode(k);
            let value = match v {
                MaybeString::None => MaybeString::None,
                MaybeString::Some(s) => MaybeString::some(percent_decode(s)),
            };
            (key, value)
        })
        .collect()
}

/// Percent-decodes a URI component per RFC 3261 §19.1.2. Bytes that
/// don't form a valid escape sequence pass through unchanged; the
/// resulting bytes are interpreted as UTF-8 (lossily, for malformed
/// input rather than failing the whole URI over one bad octet).
pub fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_is_recognized() {
        assert_eq!(parse_uri(" * ").unwrap(), Uri::Wildcard(WildcardUri));
    }

    #[test]
    fn basic_uri() {
        let uri = parse_sip_uri("sip:bob@biloxi.com").unwrap();
        assert!(!uri.encrypted);
        assert_eq!(uri.user.as_str(), Some("bob"));
        assert_eq!(uri.host, "biloxi.com");
        assert_eq!(uri.port, None);
    }

    #[test]
    fn sips_with_port_and_params() {
        let uri = parse_sip_uri("sips:alice:secret@atlanta.com:5061;transport=tcp;lr").unwrap();
        assert!(uri.encrypted);
        assert_eq!(uri.user.as_str(), Some("alice"));
        assert_eq!(uri.password.as_str(), Some("secret"));
        assert_eq!(uri.port, Some(5061));
        assert_eq!(uri.uri_params.get("transport").unwrap().as_str(), Some("tcp"));
        assert_eq!(uri.uri_params.get("lr"), Some(&MaybeString::None));
    }

    #[test]
    fn uri_headers_require_equals() {
        let uri = parse_sip_uri("sip:bob@biloxi.com?subject=project&priority=urgent").unwrap();
        assert_eq!(uri.headers.get("subject").unwrap().as_str(), Some("project"));
        assert_eq!(uri.headers.get("priority").unwrap().as_str(), Some("urgent"));

        assert!(parse_sip_uri("sip:bob@biloxi.com?subject").is_err());
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        match parse_sip_uri("tel:+15551234567") {
            Err(SipParseError::UnsupportedScheme(s)) => assert_eq!(s, "tel"),
            other => panic!("expected UnsupportedScheme, got {other:?}"),
        }
    }

    #[test]
    fn ipv6_literal_with_zone_and_port() {
        let uri = parse_sip_uri("sip:bob@[2001:db8::1%25eth0]:5060").unwrap();
        assert_eq!(uri.host, "[2001:db8::1%eth0]");
        assert_eq!(uri.port, Some(5060));
    }

    #[test]
    fn percent_decoding_applies_to_user_and_host() {
        let uri = parse_sip_uri("sip:john%20doe@example.com").unwrap();
        assert_eq!(uri.user.as_str(), Some("john doe"));
    }

    #[test]
    fn equality_is_case_insensitive_on_scheme_and_host_but_not_user() {
        let a = parse_sip_uri("SIP:Bob@Biloxi.COM").unwrap();
        let b = parse_sip_uri("sip:Bob@biloxi.com").unwrap();
        assert_eq!(a, b);

        let c = parse_sip_uri("sip:bob@biloxi.com").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn display_round_trips() {
        let uri = parse_sip_uri("sip:alice@atlanta.com:5060;transport=tcp").unwrap();
        let rendered = uri.to_string();
        let reparsed = parse_sip_uri(&rendered).unwrap();
        assert_eq!(uri, reparsed);
    }
}
