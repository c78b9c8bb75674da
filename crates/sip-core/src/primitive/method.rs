use std::fmt;

/// A SIP request method: an uppercased token.
///
/// The well-known methods get their own variant (matching RFC 3261's
/// registered set); any other token is preserved verbatim in `Extension`
/// so an unrecognized method never fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Invite,
    Ack,
    Bye,
    Cancel,
    Register,
    Options,
    Subscribe,
    Notify,
    Extension(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Invite => "INVITE",
            Method::Ack => "ACK",
            Method::Bye => "BYE",
            Method::Cancel => "CANCEL",
            Method::Register => "REGISTER",
            Method::Options => "OPTIONS",
            Method::Subscribe => "SUBSCRIBE",
            Method::Notify => "NOTIFY",
            Method::Extension(s) => s.as_str(),
        }
    }

    /// Parses a token into a `Method`, uppercasing it first so lower- or
    /// mixed-case wire input (non-conformant but seen in the wild) still
    /// matches a well-known variant.
    pub fn parse(token: &str) -> Method {
        let upper = token.to_ascii_uppercase();
        match upper.as_str() {
            "INVITE" => Method::Invite,
            "ACK" => Method::Ack,
            "BYE" => Method::Bye,
            "CANCEL" => Method::Cancel,
            "REGISTER" => Method::Register,
            "OPTIONS" => Method::Options,
            "SUBSCRIBE" => Method::Subscribe,
            "NOTIFY" => Method::Notify,
            _ => Method::Extension(upper),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A 16-bit port number, optional wherever a `host[:port]` grammar
/// allows the `:port` suffix to be absent.
pub type Port = u16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_methods_case_insensitively() {
        assert_eq!(Method::parse("invite"), Method::Invite);
        assert_eq!(Method::parse("ACK"), Method::Ack);
        assert_eq!(Method::parse("CaNcEl"), Method::Cancel);
    }

    #[test]
    fn preserves_unknown_tokens_uppercased() {
        assert_eq!(Method::parse("publish"), Method::Extension("PUBLISH".into()));
    }

    #[test]
    fn display_round_trips() {
        assert_eq!(Method::Invite.to_string(), "INVITE");
        assert_eq!(Method::Extension("PUBLISH".into()).to_string(), "PUBLISH");
    }
}
