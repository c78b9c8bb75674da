//! URI types (component C's output): the `sip:`/`sips:` URI and the `*`
//! wildcard form used by `Contact: *`.

use std::fmt;
use std::str::FromStr;

use crate::error::SipParseError;
use crate::primitive::{MaybeString, Params, Port};

/// A fully parsed `sip:`/`sips:` URI.
#[derive(Debug, Clone)]
pub struct SipUri {
    pub encrypted: bool,
    pub user: MaybeString,
    pub password: MaybeString,
    pub host: String,
    pub port: Option<Port>,
    pub uri_params: Params,
    pub headers: Params,
}

impl SipUri {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            encrypted: false,
            user: MaybeString::None,
            password: MaybeString::None,
            host: host.into(),
            port: None,
            uri_params: Params::new(),
            headers: Params::new(),
        }
    }
}

impl PartialEq for SipUri {
    fn eq(&self, other: &Self) -> bool {
        self.encrypted == other.encrypted
            && self.host.eq_ignore_ascii_case(&other.host)
            && self.user == other.user
            && self.password == other.password
            && self.port == other.port
            && self.uri_params == other.uri_params
            && self.headers == other.headers
    }
}
impl Eq for SipUri {}

impl fmt::Display for SipUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", if self.encrypted { "sips" } else { "sip" })?;
        if let MaybeString::Some(user) = &self.user {
            write!(f, "{user}")?;
            if let MaybeString::Some(pass) = &self.password {
                write!(f, ":{pass}")?;
            }
            write!(f, "@")?;
        }
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]", self.host)?;
        } else {
            write!(f, "{}", self.host)?;
        }
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        write!(f, "{}", self.uri_params.render(';'))?;
        if !self.headers.is_empty() {
            write!(f, "?{}", self.headers.render('&').trim_start_matches('&'))?;
        }
        Ok(())
    }
}

/// The `*` token, valid only in a `Contact` header (RFC 3261 §20.10),
/// used for REGISTER-style "remove all bindings".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WildcardUri;

impl fmt::Display for WildcardUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*")
    }
}

/// The URI sum type: a concrete `sip:`/`sips:` URI, or the `Contact: *`
/// wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Uri {
    Sip(SipUri),
    Wildcard(WildcardUri),
}

impl Uri {
    pub fn as_sip(&self) -> Option<&SipUri> {
        match self {
            Uri::Sip(u) => Some(u),
            Uri::Wildcard(_) => None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Uri::Wildcard(_))
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uri::Sip(u) => write!(f, "{u}"),
            Uri::Wildcard(w) => write!(f, "{w}"),
        }
    }
}

impl From<SipUri> for Uri {
    fn from(u: SipUri) -> Self {
        Uri::Sip(u)
    }
}

impl FromStr for SipUri {
    type Err = SipParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::uri::parse_sip_uri(s)
    }
}

impl FromStr for Uri {
    type Err = SipParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::uri::parse_uri(s)
    }
}
