//! Start-line classification (spec §4.4): a request line has exactly
//! two single-space separators and a third field beginning with `SIP`;
//! a status line has at least two spaces and a first field beginning
//! with `SIP`.

use crate::error::{Result, SipParseError};
use crate::parser::uri::parse_uri;
use crate::primitive::Method;
use crate::uri::Uri;

pub enum StartLine {
    Request { method: Method, recipient: Uri, sip_version: String },
    Response { sip_version: String, status_code: u16, reason: String },
}

pub fn parse_start_line(line: &str) -> Result<StartLine> {
    let parts: Vec<&str> = line.splitn(3, ' ').collect();
    if parts.len() != 3 {
        return Err(SipParseError::InvalidStartLine(format!(
            "expected 3 space-separated fields, got '{line}'"
        )));
    }

    if parts[2].to_ascii_uppercase().starts_with("SIP") {
        let method = Method::parse(parts[0]);
        let recipient = parse_uri(parts[1])?;
        if recipient.is_wildcard() {
            return Err(SipParseError::WildcardNotAllowed);
        }
        return Ok(StartLine::Request {
            method,
            recipient,
            sip_version: parts[2].to_string(),
        });
    }

    if parts[0].to_ascii_uppercase().starts_with("SIP") {
        let status_code: u16 = parts[1]
            .parse()
            .map_err(|_| SipParseError::InvalidStartLine(format!("invalid status code '{}'", parts[1])))?;
        return Ok(StartLine::Response {
            sip_version: parts[0].to_string(),
            status_code,
            reason: parts[2].to_string(),
        });
    }

    Err(SipParseError::InvalidStartLine(format!(
        "neither field begins with 'SIP': '{line}'"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_line() {
        match parse_start_line("INVITE sip:bob@biloxi.com SIP/2.0").unwrap() {
            StartLine::Request { method, sip_version, .. } => {
                assert_eq!(method, Method::Invite);
                assert_eq!(sip_version, "SIP/2.0");
            }
            _ => panic!("expected Request"),
        }
    }

    #[test]
    fn parses_status_line_with_multiword_reason() {
        match parse_start_line("SIP/2.0 404 Not Found").unwrap() {
            StartLine::Response { status_code, reason, .. } => {
                assert_eq!(status_code, 404);
                assert_eq!(reason, "Not Found");
            }
            _ => panic!("expected Response"),
        }
    }

    #[test]
    fn rejects_wildcard_request_uri() {
        assert!(parse_start_line("REGISTER * SIP/2.0").is_err());
    }

    #[test]
    fn rejects_malformed_line() {
        assert!(parse_start_line("garbage").is_err());
        assert!(parse_start_line("NOT SIP here").is_err());
    }
}
