//! Parsers too small to need their own module: `Call-ID`, the
//! non-negative 32-bit numeric headers (`Max-Forwards`, `Content-Length`,
//! `Expires`), `User-Agent`, and comma-separated token lists (`Allow`,
//! `Supported`, `Require`).

use crate::error::{Result, SipParseError};
use crate::parser::lexer::{split_unquoted, trim_ws};
use crate::primitive::Method;

pub fn parse_call_id(body: &str) -> Result<String> {
    let body = trim_ws(body);
    if body.is_empty() {
        return Err(SipParseError::InvalidHeader("Call-ID must not be empty".into()));
    }
    if body.contains(';') || body.chars().any(|c| c.is_whitespace()) {
        return Err(SipParseError::InvalidHeader(
            "Call-ID must not contain ';' or whitespace".into(),
        ));
    }
    Ok(body.to_string())
}

pub fn parse_u32(body: &str, header_name: &str) -> Result<u32> {
    let body = trim_ws(body);
    body.parse::<u32>()
        .map_err(|_| SipParseError::InvalidHeader(format!("invalid {header_name} value '{body}'")))
}

pub fn parse_token_list(body: &str) -> Vec<String> {
    split_unquoted(body, ',', false)
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

pub fn parse_method_list(body: &str) -> Vec<Method> {
    parse_token_list(body).into_iter().map(|t| Method::parse(&t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_id_rejects_whitespace_and_semicolon() {
        assert!(parse_call_id("a b").is_err());
        assert!(parse_call_id("a;b").is_err());
        assert!(parse_call_id("").is_err());
        assert_eq!(parse_call_id(" abc123@host ").unwrap(), "abc123@host");
    }

    #[test]
    fn numeric_headers_parse_non_negative_decimal() {
        assert_eq!(parse_u32(" 70 ", "Max-Forwards").unwrap(), 70);
        assert!(parse_u32("-1", "Max-Forwards").is_err());
        assert!(parse_u32("abc", "Expires").is_err());
    }

    #[test]
    fn parses_token_lists() {
        assert_eq!(parse_token_list("INVITE, ACK,  BYE"), vec!["INVITE", "ACK", "BYE"]);
        assert_eq!(parse_method_list("invite, bye"), vec![Method::Invite, Method::Bye]);
    }
}
