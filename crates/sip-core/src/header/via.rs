use std::fmt;

use crate::primitive::{Params, Port};

/// One hop of a `Via` header: `SIP/2.0/UDP host:port;params`. A single
/// `Via:` line may list several hops separated by commas; each becomes
/// one `ViaHop` inside the same `Header::Via(Vec<ViaHop>)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViaHop {
    pub protocol_name: String,
    pub protocol_version: String,
    pub transport: String,
    pub host: String,
    pub port: Option<Port>,
    pub params: Params,
}

impl ViaHop {
    pub fn new(
        protocol_name: impl Into<String>,
        protocol_version: impl Into<String>,
        transport: impl Into<String>,
        host: impl Into<String>,
        port: Option<Port>,
    ) -> Self {
        Self {
            protocol_name: protocol_name.into(),
            protocol_version: protocol_version.into(),
            transport: transport.into(),
            host: host.into(),
            port,
            params: Params::new(),
        }
    }

    pub fn branch(&self) -> Option<&str> {
        self.params.get("branch").and_then(|v| v.as_str())
    }

    /// `true` when `branch` begins with the RFC 3261 §8.1.1.7 magic
    /// cookie and has a non-empty suffix — the discriminator transaction
    /// keying uses to choose RFC 3261 vs RFC 2543 matching.
    pub fn has_rfc3261_branch(&self) -> bool {
        self.branch()
            .is_some_and(|b| b.len() > MAGIC_COOKIE.len() && b.starts_with(MAGIC_COOKIE))
    }
}

/// The `z9hG4bK` prefix marking an RFC 3261-compliant branch parameter.
pub const MAGIC_COOKIE: &str = "z9hG4bK";

impl fmt::Display for ViaHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} {}",
            self.protocol_name, self.protocol_version, self.transport, self.host
        )?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        write!(f, "{}", self.params.render(';'))
    }
}
