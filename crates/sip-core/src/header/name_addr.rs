use std::fmt;

use crate::primitive::{MaybeString, Params};
use crate::uri::Uri;

/// The common shape of every address-form header value: `To`, `From`,
/// `Contact`, `Route`, `Record-Route` (spec component E). `address` may
/// be [`Uri::Wildcard`], which is only semantically valid for `Contact`
/// — the parser enforces that, not this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameAddr {
    pub display_name: MaybeString,
    pub address: Uri,
    pub params: Params,
}

impl NameAddr {
    pub fn new(address: impl Into<Uri>) -> Self {
        Self {
            display_name: MaybeString::None,
            address: address.into(),
            params: Params::new(),
        }
    }
}

impl fmt::Display for NameAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bracketed = self.display_name.is_some() || !self.params.is_empty();
        if let MaybeString::Some(name) = &self.display_name {
            if name.chars().any(|c| c == ',' || c == ';' || c == '"') {
                write!(f, "\"{name}\" ")?;
            } else {
                write!(f, "{name} ")?;
            }
        }
        if bracketed {
            write!(f, "<{}>", self.address)?;
        } else {
            write!(f, "{}", self.address)?;
        }
        write!(f, "{}", self.params.render(';'))
    }
}
