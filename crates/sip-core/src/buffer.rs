//! The line-oriented input buffer shared by the datagram and stream
//! message parsers (spec §4.4, §9): `next_line()` reads up to CRLF,
//! `next_chunk(n)` reads exactly `n` bytes. The two parser modes differ
//! only in what "not enough data yet" means: for a datagram the whole
//! message is already present, so running out of data is a framing
//! error; for a stream it means "wait for more bytes and try again".

use bytes::{Buf, BytesMut};

/// The outcome of one `next_line`/`next_chunk` call.
pub enum ReadOutcome<T> {
    Ready(T),
    /// Not enough data is buffered yet to satisfy the read.
    Incomplete,
}

pub trait MessageBuffer {
    fn next_line(&mut self) -> ReadOutcome<String>;
    fn next_chunk(&mut self, n: usize) -> ReadOutcome<Vec<u8>>;
}

/// A one-shot reader over a byte slice known to hold exactly one
/// message (datagram mode).
pub struct DatagramBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DatagramBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }
}

impl<'a> MessageBuffer for DatagramBuffer<'a> {
    fn next_line(&mut self) -> ReadOutcome<String> {
        let rest = &self.data[self.pos..];
        match find_crlf(rest) {
            Some(idx) => {
                let line = String::from_utf8_lossy(&rest[..idx]).into_owned();
                self.pos += idx + 2;
                ReadOutcome::Ready(line)
            }
            None => ReadOutcome::Incomplete,
        }
    }

    fn next_chunk(&mut self, n: usize) -> ReadOutcome<Vec<u8>> {
        let rest = &self.data[self.pos..];
        if rest.len() < n {
            return ReadOutcome::Incomplete;
        }
        let chunk = rest[..n].to_vec();
        self.pos += n;
        ReadOutcome::Ready(chunk)
    }
}

/// An incrementally-fed accumulator for stream-mode transports (TCP,
/// TLS, WS) that may split or coalesce messages arbitrarily.
#[derive(Default)]
pub struct StreamBuffer {
    inner: BytesMut,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, data: &[u8]) {
        self.inner.extend_from_slice(data);
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Captures the current cursor so a partial, speculative parse can be
    /// rolled back when it turns out more data is needed.
    pub fn snapshot(&self) -> BytesMut {
        self.inner.clone()
    }

    pub fn restore(&mut self, snapshot: BytesMut) {
        self.inner = snapshot;
    }
}

impl MessageBuffer for StreamBuffer {
    fn next_line(&mut self) -> ReadOutcome<String> {
        match find_crlf(&self.inner) {
            Some(idx) => {
                let line = String::from_utf8_lossy(&self.inner[..idx]).into_owned();
                self.inner.advance(idx + 2);
                ReadOutcome::Ready(line)
            }
            None => ReadOutcome::Incomplete,
        }
    }

    fn next_chunk(&mut self, n: usize) -> ReadOutcome<Vec<u8>> {
        if self.inner.len() < n {
            return ReadOutcome::Incomplete;
        }
        let chunk = self.inner[..n].to_vec();
        self.inner.advance(n);
        ReadOutcome::Ready(chunk)
    }
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == b"\r\n")
}
