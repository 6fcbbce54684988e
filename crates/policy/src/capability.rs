use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Top-level capabilities a process may hold.
///
/// The set is closed: every guard invocation sees exactly these variants, in
/// the order of [`Capability::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Run,
    Read,
    Write,
    Net,
    Env,
    Plugin,
    Hrtime,
}

impl Capability {
    /// Every capability, in registry order.
    pub const ALL: [Capability; 7] = [
        Capability::Run,
        Capability::Read,
        Capability::Write,
        Capability::Net,
        Capability::Env,
        Capability::Plugin,
        Capability::Hrtime,
    ];

    pub fn all() -> &'static [Capability] {
        &Self::ALL
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Run => "run",
            Capability::Read => "read",
            Capability::Write => "write",
            Capability::Net => "net",
            Capability::Env => "env",
            Capability::Plugin => "plugin",
            Capability::Hrtime => "hrtime",
        }
    }

    /// The command-line flag that grants this capability, e.g. `--allow-net`.
    pub fn flag(self) -> String {
        format!("--allow-{}", self.as_str())
    }

    /// Whether grants of this capability can be narrowed to a host or path.
    pub fn supports_scope(self) -> bool {
        matches!(self, Capability::Read | Capability::Write | Capability::Net)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::UnknownCapability(s.to_string()))
    }
}

/// Observed state of a capability, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityState {
    Granted,
    Denied,
    Prompt,
}

impl CapabilityState {
    pub fn is_granted(self) -> bool {
        matches!(self, CapabilityState::Granted)
    }
}

impl fmt::Display for CapabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CapabilityState::Granted => "granted",
            CapabilityState::Denied => "denied",
            CapabilityState::Prompt => "prompt",
        })
    }
}

/// A capability with an optional scope (host, URL or path).
///
/// A descriptor without a scope is a request for the full capability. Scopes
/// can only be attached to capabilities that [support them](Capability::supports_scope).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CapabilityDescriptor {
    capability: Capability,
    scope: Option<String>,
}

impl CapabilityDescriptor {
    /// An unscoped request for `capability`.
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            scope: None,
        }
    }

    /// A request narrowed to `scope`.
    ///
    /// An empty scope is the same as no scope.
    pub fn with_scope(capability: Capability, scope: impl Into<String>) -> Result<Self> {
        let scope = scope.into();
        if scope.is_empty() {
            return Ok(Self::new(capability));
        }
        if !capability.supports_scope() {
            return Err(Error::Invalid(format!(
                "{capability} does not support a scope (got \"{scope}\")"
            )));
        }
        Ok(Self {
            capability,
            scope: Some(scope),
        })
    }

    pub fn net(host: impl Into<String>) -> Result<Self> {
        Self::with_scope(Capability::Net, host)
    }

    pub fn read(path: impl Into<String>) -> Result<Self> {
        Self::with_scope(Capability::Read, path)
    }

    pub fn write(path: impl Into<String>) -> Result<Self> {
        Self::with_scope(Capability::Write, path)
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn is_unscoped(&self) -> bool {
        self.scope.is_none()
    }

    /// The scope as shown in diagnostics, without an `http://` or `https://` prefix.
    pub fn display_scope(&self) -> Option<&str> {
        self.scope.as_deref().map(strip_http_scheme)
    }

    /// The flag form of this descriptor, e.g. `--allow-net=google.com`.
    pub fn flag(&self) -> String {
        match self.display_scope() {
            Some(scope) => format!("{}={scope}", self.capability.flag()),
            None => self.capability.flag(),
        }
    }
}

impl From<Capability> for CapabilityDescriptor {
    fn from(capability: Capability) -> Self {
        Self::new(capability)
    }
}

impl fmt::Display for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}({scope})", self.capability),
            None => write!(f, "{}", self.capability),
        }
    }
}

/// A descriptor together with the state the host reported for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityStatus {
    pub descriptor: CapabilityDescriptor,
    pub state: CapabilityState,
}

impl CapabilityStatus {
    pub fn new(descriptor: CapabilityDescriptor, state: CapabilityState) -> Self {
        Self { descriptor, state }
    }

    pub fn capability(&self) -> Capability {
        self.descriptor.capability()
    }

    pub fn is_granted(&self) -> bool {
        self.state.is_granted()
    }
}

fn strip_http_scheme(scope: &str) -> &str {
    scope
        .strip_prefix("https://")
        .or_else(|| scope.strip_prefix("http://"))
        .unwrap_or(scope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_every_capability_once() {
        let names: Vec<_> = Capability::all().iter().map(|c| c.as_str()).collect();
        assert_eq!(
            names,
            ["run", "read", "write", "net", "env", "plugin", "hrtime"]
        );
    }

    #[test]
    fn flags_and_scopability() {
        assert_eq!(Capability::Env.flag(), "--allow-env");
        assert!(Capability::Net.supports_scope());
        assert!(Capability::Read.supports_scope());
        assert!(!Capability::Env.supports_scope());
        assert!(!Capability::Hrtime.supports_scope());
    }

    #[test]
    fn parse_capability_names() {
        assert_eq!("net".parse::<Capability>().unwrap(), Capability::Net);
        assert!(matches!(
            "network".parse::<Capability>(),
            Err(Error::UnknownCapability(name)) if name == "network"
        ));
    }

    #[test]
    fn scope_on_unscopable_capability_is_rejected() {
        let err = CapabilityDescriptor::with_scope(Capability::Env, "HOME").unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
    }

    #[test]
    fn empty_scope_means_unscoped() {
        let desc = CapabilityDescriptor::with_scope(Capability::Env, "").unwrap();
        assert!(desc.is_unscoped());
    }

    #[test]
    fn flag_strips_http_scheme() {
        let desc = CapabilityDescriptor::net("http://google.com").unwrap();
        assert_eq!(desc.flag(), "--allow-net=google.com");
        assert_eq!(desc.scope(), Some("http://google.com"));
        assert_eq!(CapabilityDescriptor::new(Capability::Run).flag(), "--allow-run");
    }
}
