//! Lexical helpers shared by the URI, parameter, and header parsers:
//! whitespace classification, delimiter search that respects quoting
//! and angle-bracket nesting, quoted-string scanning, and header line
//! folding (RFC 3261 §7.3.1).

/// `true` for the ABNF `WSP` class used throughout the header grammar.
pub fn is_ws(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

/// Trims leading and trailing unquoted whitespace.
pub fn trim_ws(s: &str) -> &str {
    s.trim_matches(|c: char| is_ws(c) || c == '\r' || c == '\n')
}

/// Scans a double-quoted string starting at `s[start] == '"'`.
///
/// Returns `(content, end)` where `content` is the text between the
/// quotes (with backslash-escapes resolved) and `end` is the index one
/// past the closing quote. Fails if the string is unterminated or an
/// escape sequence ends input early.
pub fn scan_quoted(s: &str, start: usize) -> Option<(String, usize)> {
    let bytes = s.as_bytes();
    debug_assert_eq!(bytes.get(start), Some(&b'"'));
    let mut i = start + 1;
    let mut content = String::new();
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => {
                content.push(bytes[i + 1] as char);
                i += 2;
            }
            b'"' => return Some((content, i + 1)),
            c => {
                content.push(c as char);
                i += 1;
            }
        }
    }
    None
}

/// Finds the first occurrence of `needle` in `s` that is not inside a
/// double-quoted region and (when `respect_angles` is set) not inside a
/// `<...>` region. Used for comma-splitting address-header lists
/// (RFC 3261 §20: `To`, `From`, `Contact`, `Route`, `Record-Route`).
pub fn find_unquoted(s: &str, needle: char, respect_angles: bool) -> Option<usize> {
    let mut chars = s.char_indices().peekable();
    let mut angle_depth = 0i32;
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => {
                // Skip to the matching close quote (or end of string).
                if let Some((_, end)) = scan_quoted(s, idx) {
                    while let Some((next_idx, _)) = chars.peek() {
                        if *next_idx >= end {
                            break;
                        }
                        chars.next();
                    }
                } else {
                    return None;
                }
            }
            '<' if respect_angles => angle_depth += 1,
            '>' if respect_angles => angle_depth = (angle_depth - 1).max(0),
            c if c == needle && angle_depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Splits `s` at every top-level occurrence of `needle` (outside quotes
/// and, when `respect_angles`, outside angle brackets), trimming
/// whitespace from each piece. Empty input yields a single empty piece.
pub fn split_unquoted(s: &str, needle: char, respect_angles: bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    let mut base = 0usize;
    loop {
        match find_unquoted(rest, needle, respect_angles) {
            Some(at) => {
                parts.push(trim_ws(&s[base..base + at]));
                base += at + needle.len_utf8();
                rest = &s[base..];
            }
            None => {
                parts.push(trim_ws(&s[base..]));
                break;
            }
        }
    }
    parts
}

/// Splits `s` on runs of unquoted whitespace, discarding empty pieces.
/// Used to tokenize e.g. the CSeq header body (`"2 INVITE"`).
pub fn split_ws(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_quotes = false;
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == '"' && !in_quotes {
            if let Some((_, end)) = scan_quoted(s, i) {
                if start.is_none() {
                    start = Some(i);
                }
                i = end;
                continue;
            } else {
                in_quotes = true;
            }
        }
        if is_ws(c) && !in_quotes {
            if let Some(st) = start.take() {
                out.push(&s[st..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
        i += 1;
    }
    if let Some(st) = start {
        out.push(&s[st..]);
    }
    out
}

/// Unfolds a raw header block (the bytes between the start line and the
/// blank line terminator) into logical header lines per RFC 3261 §7.3.1:
/// a line beginning with SP or HTAB is a continuation of the previous
/// line, and its leading whitespace run collapses to a single space. A
/// would-be continuation with no prior line (i.e. the block itself
/// starts with whitespace) is discarded.
pub fn unfold_header_lines(raw_lines: &[String]) -> Vec<String> {
    let mut logical: Vec<String> = Vec::new();
    for line in raw_lines {
        let starts_with_ws = line.chars().next().is_some_and(is_ws);
        if starts_with_ws {
            if let Some(prev) = logical.last_mut() {
                let continuation = line.trim_start_matches(is_ws);
                prev.push(' ');
                prev.push_str(continuation);
            } else {
                tracing::debug!("discarding continuation line with no preceding header: {line:?}");
            }
        } else {
            logical.push(line.clone());
        }
    }
    logical
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_unquoted_respects_quotes_and_angles() {
        let parts = split_unquoted(
            r#""Alice, Bob" <sip:a@b>;tag=1, <sip:c@d;foo=x,y>"#,
            ',',
            true,
        );
        assert_eq!(parts, vec![r#""Alice, Bob" <sip:a@b>;tag=1"#, "<sip:c@d;foo=x,y>"]);
    }

    #[test]
    fn scan_quoted_handles_escapes() {
        let (content, end) = scan_quoted(r#""a\"b" rest"#, 0).unwrap();
        assert_eq!(content, "a\"b");
        assert_eq!(&r#""a\"b" rest"#[end..], " rest");
    }

    #[test]
    fn scan_quoted_fails_when_unterminated() {
        assert!(scan_quoted(r#""unterminated"#, 0).is_none());
    }

    #[test]
    fn split_ws_tokenizes_cseq_body() {
        assert_eq!(split_ws("  2     INVITE  "), vec!["2", "INVITE"]);
    }

    #[test]
    fn unfold_merges_continuation_with_single_space() {
        let raw = vec!["CSeq:   2     ".to_string(), "    INVITE".to_string()];
        let lines = unfold_header_lines(&raw);
        assert_eq!(lines, vec!["CSeq:   2      INVITE".to_string()]);
    }

    #[test]
    fn unfold_discards_leading_continuation() {
        let raw = vec!["   orphan".to_string(), "To: <sip:a@b>".to_string()];
        let lines = unfold_header_lines(&raw);
        assert_eq!(lines, vec!["To: <sip:a@b>".to_string()]);
    }
}
