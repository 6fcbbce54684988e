//! In-memory grant table using command-line flag syntax.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use policy::{Capability, CapabilityDescriptor, CapabilityState};

use crate::provider::CapabilityProvider;
use crate::{Error, Result};

/// Environment variable holding whitespace-separated grant flags.
pub const GRANTS_ENV: &str = "PERMGUARD_GRANTS";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Grants {
    Full,
    Scoped(Vec<String>),
}

/// Live grants of a process, as a table of capability to scopes.
///
/// Built from flags such as `--allow-env`, `--allow-net=google.com,example.org`
/// or `-A`. An unscoped query is granted only by a full grant; a scoped query
/// is granted by a full grant or by a listed scope that covers it. Anything
/// else reports [`CapabilityState::Prompt`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantTable {
    grants: HashMap<Capability, Grants>,
}

impl GrantTable {
    /// A table with nothing granted.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with every capability granted in full (`-A`).
    pub fn all() -> Self {
        let mut table = Self::new();
        for capability in Capability::all() {
            table.grant(*capability);
        }
        table
    }

    /// Grant `capability` in full.
    pub fn grant(&mut self, capability: Capability) -> &mut Self {
        self.grants.insert(capability, Grants::Full);
        self
    }

    /// Grant `capability` for the given scopes only.
    ///
    /// Has no effect if the capability is already granted in full.
    pub fn grant_scoped<I, S>(&mut self, capability: Capability, scopes: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !capability.supports_scope() {
            return Err(Error::InvalidGrant(format!(
                "{} does not accept a scope list",
                capability.flag()
            )));
        }
        let scopes: Vec<String> = scopes
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.is_empty())
            .collect();
        if scopes.is_empty() {
            self.grant(capability);
            return Ok(self);
        }

        match self.grants.entry(capability).or_insert(Grants::Scoped(Vec::new())) {
            Grants::Full => {}
            Grants::Scoped(existing) => existing.extend(scopes),
        }
        Ok(self)
    }

    /// Build a table from grant flags.
    pub fn from_flags<I, S>(flags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for flag in flags {
            table.apply_flag(flag.as_ref())?;
        }
        Ok(table)
    }

    /// Build a table from [`GRANTS_ENV`].
    ///
    /// Returns `None` when the variable is not set, meaning the host exposes
    /// no capability information.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var(GRANTS_ENV) {
            Ok(value) => Self::from_flags(value.split_whitespace()).map(Some),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(Error::InvalidGrant(format!("{GRANTS_ENV}: {e}"))),
        }
    }

    fn apply_flag(&mut self, flag: &str) -> Result<()> {
        if flag == "-A" || flag == "--allow-all" {
            *self = Self::all();
            return Ok(());
        }

        let rest = flag
            .strip_prefix("--allow-")
            .ok_or_else(|| Error::InvalidGrant(flag.to_string()))?;
        let (name, list) = match rest.split_once('=') {
            Some((name, list)) => (name, Some(list)),
            None => (rest, None),
        };
        let capability: Capability = name
            .parse()
            .map_err(|_| Error::InvalidGrant(flag.to_string()))?;

        match list {
            Some(list) => {
                self.grant_scoped(capability, list.split(','))?;
            }
            None => {
                self.grant(capability);
            }
        }
        Ok(())
    }

    fn state_of(&self, descriptor: &CapabilityDescriptor) -> CapabilityState {
        let capability = descriptor.capability();
        let granted = match (self.grants.get(&capability), descriptor.scope()) {
            (Some(Grants::Full), _) => true,
            (Some(Grants::Scoped(scopes)), Some(requested)) => scopes
                .iter()
                .any(|allowed| covers(capability, allowed, requested)),
            (Some(Grants::Scoped(_)), None) | (None, _) => false,
        };

        if granted {
            CapabilityState::Granted
        } else {
            CapabilityState::Prompt
        }
    }
}

impl CapabilityProvider for GrantTable {
    async fn query(&self, descriptor: &CapabilityDescriptor) -> Result<CapabilityState> {
        Ok(self.state_of(descriptor))
    }
}

fn covers(capability: Capability, allowed: &str, requested: &str) -> bool {
    match capability {
        Capability::Net => host_covers(allowed, requested),
        Capability::Read | Capability::Write => path_covers(allowed, requested),
        _ => allowed == requested,
    }
}

/// Paths are compared after lexical cleanup. A requested path that still
/// climbs above its start with `..` is never covered.
fn path_covers(allowed: &str, requested: &str) -> bool {
    let requested = clean_path(requested);
    if requested
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return false;
    }
    requested.starts_with(clean_path(allowed))
}

/// Drop `.` components and fold `..` into its parent without touching the
/// filesystem. `..` at the root stays at the root.
fn clean_path(path: &str) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => cleaned.push(".."),
            },
            other => cleaned.push(other),
        }
    }
    cleaned
}

/// `google.com` covers `google.com` and `mail.google.com`. A port on the
/// allowed side must match exactly; no port allows any.
fn host_covers(allowed: &str, requested: &str) -> bool {
    let (allowed_host, allowed_port) = split_port(bare_host(allowed));
    let (requested_host, requested_port) = split_port(bare_host(requested));

    let allowed_host = allowed_host.to_ascii_lowercase();
    let requested_host = requested_host.to_ascii_lowercase();

    let host_ok = requested_host == allowed_host
        || requested_host.ends_with(&format!(".{allowed_host}"));
    let port_ok = allowed_port.is_none() || allowed_port == requested_port;
    host_ok && port_ok
}

fn bare_host(scope: &str) -> &str {
    let without_scheme = scope.split_once("://").map_or(scope, |(_, rest)| rest);
    without_scheme
        .split_once('/')
        .map_or(without_scheme, |(host, _)| host)
}

/// IPv6 addresses carry a port only in bracketed form, `[::1]:8080`.
fn split_port(host: &str) -> (&str, Option<&str>) {
    if let Some(rest) = host.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((addr, tail)) => (addr, tail.strip_prefix(':').filter(|p| is_port(p))),
            None => (host, None),
        };
    }
    if host.matches(':').count() > 1 {
        return (host, None);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if is_port(port) => (name, Some(port)),
        _ => (host, None),
    }
}

fn is_port(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
