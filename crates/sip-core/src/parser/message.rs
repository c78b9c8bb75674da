//! Component F: the top-level message parser. Turns a byte buffer into
//! a [`Message`], in either of the two modes described by spec §4.4:
//!
//! - **datagram**: the buffer holds exactly one message; `Content-Length`
//!   is informative only and the body is whatever bytes remain after the
//!   header block.
//! - **stream**: the buffer is fed incrementally and may hold zero, one,
//!   or several messages back to back; `Content-Length` is mandatory and
//!   gives the exact body length to read.
//!
//! In both modes a per-header parse error is recovered: the offending
//! header line is dropped and logged, and parsing continues with the
//! rest of the message. Start-line and body-framing errors are fatal —
//! in stream mode they leave the buffer's cursor wherever it stopped,
//! since framing is lost and the connection is expected to be torn down
//! by the caller.

use crate::buffer::{MessageBuffer, ReadOutcome, StreamBuffer};
use crate::error::{Result, SipParseError};
use crate::header::Header;
use crate::message::{Message, Request, Response};
use crate::parser::header::parse_header_line;
use crate::parser::lexer::unfold_header_lines;
use crate::parser::start_line::{parse_start_line, StartLine};

/// Reads the start line and the (unfolded, dispatched) header list from
/// `buf`. Returns `Incomplete` the moment any underlying read does,
/// leaving it to the caller to decide what that means for their mode.
fn read_head<B: MessageBuffer>(buf: &mut B) -> Result<ReadOutcome<(StartLine, Vec<Header>)>> {
    let start_line = match buf.next_line() {
        ReadOutcome::Ready(line) => line,
        ReadOutcome::Incomplete => return Ok(ReadOutcome::Incomplete),
    };
    let start_line = parse_start_line(&start_line)?;

    let mut raw_lines = Vec::new();
    loop {
        match buf.next_line() {
            ReadOutcome::Ready(line) if line.is_empty() => break,
            ReadOutcome::Ready(line) => raw_lines.push(line),
            ReadOutcome::Incomplete => return Ok(ReadOutcome::Incomplete),
        }
    }

    let mut headers = Vec::new();
    for line in unfold_header_lines(&raw_lines) {
        match parse_header_line(&line) {
            Ok(parsed) => headers.extend(parsed),
            Err(e) => tracing::debug!("dropping unparsable header line {line:?}: {e}"),
        }
    }

    Ok(ReadOutcome::Ready((start_line, headers)))
}

fn content_length(headers: &[Header]) -> Result<Option<u32>> {
    let mut found = None;
    for h in headers {
        if let Header::ContentLength(n) = h {
            if found.replace(*n).is_some() {
                return Err(SipParseError::DuplicateContentLength);
            }
        }
    }
    Ok(found)
}

fn build_message(start_line: StartLine, headers: Vec<Header>, body: String) -> Message {
    match start_line {
        StartLine::Request { method, recipient, sip_version } => Message::Request(Request {
            method,
            recipient,
            sip_version,
            headers,
            body,
        }),
        StartLine::Response { sip_version, status_code, reason } => Message::Response(Response {
            sip_version,
            status_code,
            reason,
            headers,
            body,
        }),
    }
}

/// Parses exactly one message out of a datagram-mode buffer. `data` is
/// assumed to hold the whole message: running out of input before the
/// header block's terminating blank line is a fatal framing error, not
/// "come back later".
pub fn parse_datagram_message(data: &[u8]) -> Result<Message> {
    let mut buf = crate::buffer::DatagramBuffer::new(data);
    let (start_line, headers) = match read_head(&mut buf)? {
        ReadOutcome::Ready(head) => head,
        ReadOutcome::Incomplete => return Err(SipParseError::MissingHeaderTerminator),
    };

    content_length(&headers)?;

    let remaining = buf.remaining();
    let body = String::from_utf8_lossy(remaining).into_owned();
    Ok(build_message(start_line, headers, body))
}

/// Attempts to parse one message out of a stream-mode buffer.
///
/// - `Ok(Some(message))`: a complete message was parsed and its bytes
///   consumed from `buf`; the caller should call again immediately in
///   case another message follows in the same buffer.
/// - `Ok(None)`: not enough data is buffered yet; `buf` is left exactly
///   as it was, so the caller can `feed` more bytes and retry.
/// - `Err(_)`: a fatal framing error (bad start line, missing or
///   duplicate `Content-Length`). Framing is lost; `buf`'s cursor is left
///   wherever parsing stopped.
pub fn parse_stream_message(buf: &mut StreamBuffer) -> Result<Option<Message>> {
    let snapshot = buf.snapshot();

    let (start_line, headers) = match read_head(buf)? {
        ReadOutcome::Ready(head) => head,
        ReadOutcome::Incomplete => {
            buf.restore(snapshot);
            return Ok(None);
        }
    };

    let len = match content_length(&headers)? {
        Some(n) => n,
        None => return Err(SipParseError::MissingContentLength),
    };

    match buf.next_chunk(len as usize) {
        ReadOutcome::Ready(bytes) => {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            Ok(Some(build_message(start_line, headers, body)))
        }
        ReadOutcome::Incomplete => {
            buf.restore(snapshot);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Method;

    #[test]
    fn datagram_mode_takes_remainder_as_body_regardless_of_content_length() {
        let raw = b"INVITE sip:bob@biloxi.com SIP/2.0\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
Call-ID: a84b4c76e66710\r\n\
CSeq: 314159 INVITE\r\n\
Content-Length: 4\r\n\
\r\n\
hello world";
        let msg = parse_datagram_message(raw).unwrap();
        match msg {
            Message::Request(r) => {
                assert_eq!(r.method, Method::Invite);
                assert_eq!(r.body, "hello world");
            }
            _ => panic!("expected request"),
        }
    }

    #[test]
    fn datagram_mode_requires_header_terminator() {
        let raw = b"INVITE sip:bob@biloxi.com SIP/2.0\r\nTo: <sip:bob@biloxi.com>\r\n";
        assert!(matches!(
            parse_datagram_message(raw),
            Err(SipParseError::MissingHeaderTerminator)
        ));
    }

    #[test]
    fn stream_mode_waits_for_full_body_then_parses() {
        let mut buf = StreamBuffer::new();
        buf.feed(b"SIP/2.0 200 OK\r\nContent-Length: 5\r\n\r\nhe");
        assert!(parse_stream_message(&mut buf).unwrap().is_none());
        buf.feed(b"llo");
        let msg = parse_stream_message(&mut buf).unwrap().unwrap();
        match msg {
            Message::Response(r) => {
                assert_eq!(r.status_code, 200);
                assert_eq!(r.body, "hello");
            }
            _ => panic!("expected response"),
        }
    }

    #[test]
    fn stream_mode_parses_back_to_back_messages_from_one_buffer() {
        let mut buf = StreamBuffer::new();
        buf.feed(b"SIP/2.0 100 Trying\r\nContent-Length: 0\r\n\r\n");
        buf.feed(b"SIP/2.0 180 Ringing\r\nContent-Length: 0\r\n\r\n");
        let first = parse_stream_message(&mut buf).unwrap().unwrap();
        let second = parse_stream_message(&mut buf).unwrap().unwrap();
        match (first, second) {
            (Message::Response(a), Message::Response(b)) => {
                assert_eq!(a.status_code, 100);
                assert_eq!(b.status_code, 180);
            }
            _ => panic!("expected two responses"),
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn stream_mode_requires_content_length() {
        let mut buf = StreamBuffer::new();
        buf.feed(b"SIP/2.0 200 OK\r\n\r\n");
        assert!(matches!(
            parse_stream_message(&mut buf),
            Err(SipParseError::MissingContentLength)
        ));
    }

    #[test]
    fn stream_mode_rejects_duplicate_content_length() {
        let mut buf = StreamBuffer::new();
        buf.feed(b"SIP/2.0 200 OK\r\nContent-Length: 0\r\nContent-Length: 0\r\n\r\n");
        assert!(matches!(
            parse_stream_message(&mut buf),
            Err(SipParseError::DuplicateContentLength)
        ));
    }

    #[test]
    fn folded_cseq_header_unfolds_before_dispatch() {
        let raw = b"SIP/2.0 200 OK\r\nCSeq:   2\r\n   INVITE\r\nContent-Length: 0\r\n\r\n";
        let msg = parse_datagram_message(raw).unwrap();
        let seq = msg.first_header(|h| match h {
            Header::CSeq { seq_no, method } => Some((*seq_no, method.clone())),
            _ => None,
        });
        assert_eq!(seq, Some((2, Method::Invite)));
    }
}
