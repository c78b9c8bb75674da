//! The `Request`/`Response` message types (component F's output).

use std::fmt;

use crate::header::Header;
use crate::primitive::Method;
use crate::uri::Uri;

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub recipient: Uri,
    pub sip_version: String,
    pub headers: Vec<Header>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub sip_version: String,
    pub status_code: u16,
    pub reason: String,
    pub headers: Vec<Header>,
    pub body: String,
}

/// The message sum type the parser produces and the transport consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(Request),
    Response(Response),
}

impl Message {
    /// Serializes the message to its wire form (CRLF line endings).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    pub fn headers(&self) -> &[Header] {
        match self {
            Message::Request(r) => &r.headers,
            Message::Response(r) => &r.headers,
        }
    }

    pub fn first_header<'a, F, T>(&'a self, f: F) -> Option<T>
    where
        F: Fn(&'a Header) -> Option<T>,
    {
        self.headers().iter().find_map(f)
    }
}

impl Request {
    pub fn header<'a, F, T>(&'a self, f: F) -> Option<T>
    where
        F: Fn(&'a Header) -> Option<T>,
    {
        self.headers.iter().find_map(f)
    }
}

impl Response {
    pub fn header<'a, F, T>(&'a self, f: F) -> Option<T>
    where
        F: Fn(&'a Header) -> Option<T>,
    {
        self.headers.iter().find_map(f)
    }

    pub fn is_provisional(&self) -> bool {
        (100..200).contains(&self.status_code)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_final(&self) -> bool {
        self.status_code >= 200
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}\r\n", self.method, self.recipient, self.sip_version)?;
        for h in &self.headers {
            write!(f, "{h}\r\n")?;
        }
        write!(f, "\r\n{}", self.body)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}\r\n", self.sip_version, self.status_code, self.reason)?;
        for h in &self.headers {
            write!(f, "{h}\r\n")?;
        }
        write!(f, "\r\n{}", self.body)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Request(r) => write!(f, "{r}"),
            Message::Response(r) => write!(f, "{r}"),
        }
    }
}
