//! The header sum type (component E's output) and the value types its
//! variants carry.

mod media_type;
mod name_addr;
mod via;

pub use media_type::MediaType;
pub use name_addr::NameAddr;
pub use via::ViaHop;

use std::fmt;

use crate::primitive::{Method, Params};

/// An unrecognized header, preserved verbatim so the parser never has to
/// reject a whole message over a header it doesn't have a typed model
/// for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericHeader {
    pub name: String,
    pub contents: String,
}

/// The header sum type. Each variant carries its RFC 3261 §20 payload;
/// anything not named here becomes [`GenericHeader`].
#[derive(Debug, Clone, PartialEq)]
pub enum Header {
    To(NameAddr),
    From(NameAddr),
    /// One `Contact:` line with N comma-separated entries parses into N
    /// `Header::Contact` values (see spec component E).
    Contact(NameAddr),
    /// One `Via:` line with N comma-separated entries parses into one
    /// `Header::Via` carrying N hops, oldest (top) first.
    Via(Vec<ViaHop>),
    CSeq { seq_no: u32, method: Method },
    CallId(String),
    MaxForwards(u32),
    ContentLength(u32),
    Expires(u32),
    Allow(Vec<Method>),
    Supported(Vec<String>),
    Require(Vec<String>),
    Route(Vec<NameAddr>),
    RecordRoute(Vec<NameAddr>),
    UserAgent(String),
    ContentType(MediaType),
    Accept(Vec<MediaType>),
    Generic(GenericHeader),
}

impl Header {
    /// The canonical (long form) header name, used when rendering.
    pub fn name(&self) -> &str {
        match self {
            Header::To(_) => "To",
            Header::From(_) => "From",
            Header::Contact(_) => "Contact",
            Header::Via(_) => "Via",
            Header::CSeq { .. } => "CSeq",
            Header::CallId(_) => "Call-ID",
            Header::MaxForwards(_) => "Max-Forwards",
            Header::ContentLength(_) => "Content-Length",
            Header::Expires(_) => "Expires",
            Header::Allow(_) => "Allow",
            Header::Supported(_) => "Supported",
            Header::Require(_) => "Require",
            Header::Route(_) => "Route",
            Header::RecordRoute(_) => "Record-Route",
            Header::UserAgent(_) => "User-Agent",
            Header::ContentType(_) => "Content-Type",
            Header::Accept(_) => "Accept",
            Header::Generic(g) => &g.name,
        }
    }
}

fn render_addr_list(f: &mut fmt::Formatter<'_>, addrs: &[NameAddr]) -> fmt::Result {
    for (i, a) in addrs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{a}")?;
    }
    Ok(())
}

fn render_token_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.name())?;
        match self {
            Header::To(a) | Header::From(a) | Header::Contact(a) => write!(f, "{a}"),
            Header::Via(hops) => {
                for (i, hop) in hops.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{hop}")?;
                }
                Ok(())
            }
            Header::CSeq { seq_no, method } => write!(f, "{seq_no} {method}"),
            Header::CallId(s) => write!(f, "{s}"),
            Header::MaxForwards(n) | Header::ContentLength(n) | Header::Expires(n) => write!(f, "{n}"),
            Header::Allow(methods) => render_token_list(f, methods),
            Header::Supported(tokens) | Header::Require(tokens) => render_token_list(f, tokens),
            Header::Route(addrs) | Header::RecordRoute(addrs) => render_addr_list(f, addrs),
            Header::UserAgent(s) => write!(f, "{s}"),
            Header::ContentType(mt) => write!(f, "{mt}"),
            Header::Accept(list) => render_token_list(f, list),
            Header::Generic(g) => write!(f, "{}", g.contents),
        }
    }
}

/// A params-bearing construct shares the `(key: Params)` accessor shape;
/// used by transaction keying and header tests alike.
pub fn empty_params() -> Params {
    Params::new()
}
