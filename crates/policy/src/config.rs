//! Guard configuration loaded from TOML.

use std::path::Path;

use serde::Deserialize;

use crate::{Error, Grant, Policy, Result};

/// Everything one guard invocation needs to decide.
///
/// Built once per invocation and never mutated by the guard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "GuardFile")]
pub struct GuardConfig {
    pub policy: Policy,
    /// Abort when a declared capability has not been granted.
    pub abort_on_missing: bool,
    /// Abort when an undeclared unscoped capability has been granted.
    pub abort_on_extra: bool,
    /// Write diagnostics through the reporter.
    pub verbose: bool,
    /// Still print scope recommendations when the host cannot be queried.
    pub advise_when_unsupported: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            policy: Policy::empty(),
            abort_on_missing: false,
            abort_on_extra: true,
            verbose: false,
            advise_when_unsupported: false,
        }
    }
}

impl GuardConfig {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn abort_on_missing(mut self, yes: bool) -> Self {
        self.abort_on_missing = yes;
        self
    }

    pub fn abort_on_extra(mut self, yes: bool) -> Self {
        self.abort_on_extra = yes;
        self
    }

    pub fn verbose(mut self, yes: bool) -> Self {
        self.verbose = yes;
        self
    }

    pub fn advise_when_unsupported(mut self, yes: bool) -> Self {
        self.advise_when_unsupported = yes;
        self
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))
    }
}

/// On-disk shape of [`GuardConfig`], before grants are normalized.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GuardFile {
    #[serde(default)]
    granted: Vec<Grant>,
    #[serde(default)]
    abort_on_missing: bool,
    #[serde(default = "default_abort_on_extra")]
    abort_on_extra: bool,
    #[serde(default)]
    verbose: bool,
    #[serde(default)]
    advise_when_unsupported: bool,
}

fn default_abort_on_extra() -> bool {
    true
}

impl TryFrom<GuardFile> for GuardConfig {
    type Error = Error;

    fn try_from(file: GuardFile) -> Result<Self> {
        Ok(Self {
            policy: Policy::normalize(file.granted)?,
            abort_on_missing: file.abort_on_missing,
            abort_on_extra: file.abort_on_extra,
            verbose: file.verbose,
            advise_when_unsupported: file.advise_when_unsupported,
        })
    }
}
