use crate::error::{Result, SipParseError};
use crate::parser::lexer::split_ws;
use crate::primitive::Method;

/// Parses a `CSeq` body: exactly one whitespace-delimited decimal
/// number (at most 2^31 - 1) followed by a method token. A `;` anywhere
/// in the body is rejected.
pub fn parse_cseq(body: &str) -> Result<(u32, Method)> {
    if body.contains(';') {
        return Err(SipParseError::InvalidHeader(
            "CSeq must not contain ';'".into(),
        ));
    }
    let parts = split_ws(body);
    let [seq_str, method_str] = parts.as_slice() else {
        return Err(SipParseError::InvalidHeader(format!(
            "CSeq requires exactly a number and a method, got '{body}'"
        )));
    };
    let seq_no: u32 = seq_str
        .parse()
        .map_err(|_| SipParseError::InvalidHeader(format!("invalid CSeq number '{seq_str}'")))?;
    if seq_no > 0x7fff_ffff {
        return Err(SipParseError::InvalidHeader(format!(
            "CSeq number {seq_no} exceeds 2^31 - 1"
        )));
    }
    Ok((seq_no, Method::parse(method_str)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_cseq() {
        let (seq, method) = parse_cseq("2 INVITE").unwrap();
        assert_eq!(seq, 2);
        assert_eq!(method, Method::Invite);
    }

    #[test]
    fn tolerates_extra_whitespace() {
        let (seq, method) = parse_cseq("  2     INVITE  ").unwrap();
        assert_eq!(seq, 2);
        assert_eq!(method, Method::Invite);
    }

    #[test]
    fn rejects_semicolon() {
        assert!(parse_cseq("2 INVITE;tag=1").is_err());
    }

    #[test]
    fn rejects_out_of_range_sequence_number() {
        assert!(parse_cseq("2147483648 INVITE").is_err());
        assert!(parse_cseq("2147483647 INVITE").is_ok());
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert!(parse_cseq("2").is_err());
        assert!(parse_cseq("2 INVITE extra").is_err());
    }
}
