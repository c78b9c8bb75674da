//! The generic `key[=value]` list parser (component D), parameterized by
//! start/separator/end delimiters, a quoting policy, and a singleton
//! policy. Every parameter-bearing construct in the grammar — SIP header
//! parameters, URI parameters, URI headers — goes through this one
//! function so their quoting and escaping rules stay identical.

use crate::error::{Result, SipParseError};
use crate::parser::lexer::{is_ws, scan_quoted};
use crate::primitive::{MaybeString, Params};

/// Parses a `key[=value]` list out of `source[...]`, starting at byte
/// offset `pos`.
///
/// - If `start != 0`, `source[pos]` must equal `start` or this fails.
/// - `sep == 0` or `end == 0` mean "no such delimiter" (match only
///   end-of-string for `end`, or never split further for `sep`).
/// - `quote_values`: when true, a value may be a double-quoted string;
///   an unterminated quote, a quote appearing mid-value (not at the
///   start), or a quote in a key, are all errors.
/// - `permit_singletons`: when true, `;foo` (no `=`) is accepted with
///   value `MaybeString::None`; when false every parameter must have an
///   `=`.
///
/// Returns `(params, consumed)` where `consumed` is the number of bytes
/// read, inclusive of the leading `start` delimiter (if any) and
/// exclusive of the `end` sentinel.
pub fn parse_params(
    source: &str,
    start: char,
    sep: char,
    end: char,
    quote_values: bool,
    permit_singletons: bool,
) -> Result<(Params, usize)> {
    let bytes = source.as_bytes();
    let mut pos = 0usize;

    if start != '\0' {
        if bytes.first().copied() != Some(start as u8) {
            return Err(SipParseError::InvalidParams(format!(
                "expected leading '{start}'"
            )));
        }
        pos += start.len_utf8();
    }

    let mut params = Params::new();

    loop {
        // Skip unquoted whitespace between tokens.
        while pos < bytes.len() && is_ws(bytes[pos] as char) {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }
        if end != '\0' && bytes[pos] as char == end {
            break;
        }

        let (key, key_end) = scan_key(source, pos, sep, end)?;
        pos = key_end;

        while pos < bytes.len() && is_ws(bytes[pos] as char) {
            pos += 1;
        }

        let value = if pos < bytes.len() && bytes[pos] as char == '=' {
            pos += 1;
            while pos < bytes.len() && is_ws(bytes[pos] as char) {
                pos += 1;
            }
            let (value, value_end) = scan_value(source, pos, sep, end, quote_values)?;
            pos = value_end;
            value
        } else if permit_singletons {
            MaybeString::None
        } else {
            return Err(SipParseError::InvalidParams(format!(
                "parameter '{key}' requires a value"
            )));
        };

        params.add(key, value);

        while pos < bytes.len() && is_ws(bytes[pos] as char) {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }
        if end != '\0' && bytes[pos] as char == end {
            break;
        }
        if sep != '\0' && bytes[pos] as char == sep {
            pos += 1;
            continue;
        }
        return Err(SipParseError::InvalidParams(format!(
            "expected '{sep}' or end of parameter list at byte {pos}"
        )));
    }

    Ok((params, pos))
}

fn scan_key(source: &str, start: usize, sep: char, end: char) -> Result<(String, usize)> {
    let bytes = source.as_bytes();
    if bytes.get(start).copied() == Some(b'"') {
        return Err(SipParseError::InvalidParams(
            "quotes are not permitted in a parameter key".into(),
        ));
    }
    let mut i = start;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == '=' || c == sep || (end != '\0' && c == end) || is_ws(c) {
            break;
        }
        i += 1;
    }
    if i == start {
        return Err(SipParseError::InvalidParams(format!(
            "empty parameter key at byte {start}"
        )));
    }
    Ok((source[start..i].to_string(), i))
}

fn scan_value(
    source: &str,
    start: usize,
    sep: char,
    end: char,
    quote_values: bool,
) -> Result<(MaybeString, usize)> {
    let bytes = source.as_bytes();
    if quote_values && bytes.get(start).copied() == Some(b'"') {
        return match scan_quoted(source, start) {
            Some((content, value_end)) => Ok((MaybeString::some(content), value_end)),
            None => Err(SipParseError::InvalidParams(
                "unterminated quoted parameter value".into(),
            )),
        };
    }

    let mut i = start;
    let mut saw_quote = false;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == sep || (end != '\0' && c == end) {
            break;
        }
        if c == '"' {
            // A quote not at the start of the value: either a quoting
            // policy violation (quote_values=true) or, when quoting is
            // disabled, a literal value character.
            if quote_values {
                saw_quote = true;
            }
        }
        i += 1;
    }
    if saw_quote {
        return Err(SipParseError::InvalidParams(
            "quote character is not valid in the middle of a parameter value".into(),
        ));
    }
    // Lenient per spec §9 open question (a): trailing whitespace before
    // the separator is trimmed, but a separator immediately following
    // '=' yields an empty-value pair rather than an error.
    let raw = &source[start..i];
    let trimmed_end = raw.trim_end_matches(is_ws).len();
    let value_end = start + trimmed_end;
    Ok((MaybeString::some(&source[start..value_end]), i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sip_parameter_style_list() {
        let (params, consumed) = parse_params(";foo=bar;baz", ';', ';', '\0', true, true).unwrap();
        assert_eq!(params.get("foo").unwrap().as_str(), Some("bar"));
        assert_eq!(params.get("baz").unwrap(), &MaybeString::None);
        assert_eq!(consumed, ";foo=bar;baz".len());
    }

    #[test]
    fn stops_at_end_sentinel_without_consuming_it() {
        let (params, consumed) = parse_params("?a=1&b=2 rest", '?', '&', ' ', true, false).unwrap();
        assert_eq!(params.get("a").unwrap().as_str(), Some("1"));
        assert_eq!(params.get("b").unwrap().as_str(), Some("2"));
        assert_eq!(&"?a=1&b=2 rest"[consumed..], " rest");
    }

    #[test]
    fn rejects_missing_leading_start_delimiter() {
        assert!(parse_params("foo=bar", ';', ';', '\0', true, true).is_err());
    }

    #[test]
    fn singleton_rejected_when_not_permitted() {
        assert!(parse_params("?foo", '?', '&', '\0', true, false).is_err());
    }

    #[test]
    fn singleton_value_is_none_not_empty_string() {
        let (params, _) = parse_params(";foo", ';', ';', '\0', true, true).unwrap();
        assert_eq!(params.get("foo"), Some(&MaybeString::None));
    }

    #[test]
    fn empty_value_after_equals_is_some_empty_string() {
        let (params, _) = parse_params(";foo=", ';', ';', '\0', true, true).unwrap();
        assert_eq!(params.get("foo"), Some(&MaybeString::some("")));
    }

    #[test]
    fn quoted_value_may_contain_the_separator() {
        let (params, _) = parse_params(r#";foo="a;b";bar=1"#, ';', ';', '\0', true, true).unwrap();
        assert_eq!(params.get("foo").unwrap().as_str(), Some("a;b"));
        assert_eq!(params.get("bar").unwrap().as_str(), Some("1"));
    }

    #[test]
    fn unclosed_quote_is_an_error() {
        assert!(parse_params(r#";foo="unterminated"#, ';', ';', '\0', true, true).is_err());
    }

    #[test]
    fn quote_mid_value_is_an_error() {
        assert!(parse_params(r#";foo=a"b"#, ';', ';', '\0', true, true).is_err());
    }

    #[test]
    fn quoting_disabled_treats_quote_as_literal() {
        let (params, _) = parse_params(r#";foo=a"b"#, ';', ';', '\0', false, true).unwrap();
        assert_eq!(params.get("foo").unwrap().as_str(), Some(r#"a"b"#));
    }

    #[test]
    fn round_trip_through_render_and_reparse() {
        let (params, _) = parse_params(";a=1;b;c=\"x y\"", ';', ';', '\0', true, true).unwrap();
        let rendered = params.render(';');
        let (reparsed, _) = parse_params(&rendered, ';', ';', '\0', true, true).unwrap();
        assert_eq!(reparsed, params);
    }
}
