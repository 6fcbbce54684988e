//! Guard configuration from permguard.toml and command-line overrides.

use std::path::{Path, PathBuf};

use clap::Args;
use policy::GuardConfig;

use crate::error::{Error, Result};

/// Policy file looked up in the working directory when `--policy` is absent.
pub const POLICY_FILE: &str = "permguard.toml";

#[derive(Debug, Args)]
pub struct PolicyArgs {
    /// Policy file (default: ./permguard.toml if present)
    #[arg(short, long)]
    pub policy: Option<PathBuf>,

    /// Print diagnostics
    #[arg(short, long)]
    pub verbose: bool,

    /// Abort when a declared capability has not been granted
    #[arg(long)]
    pub abort_on_missing: bool,

    /// Do not abort when an undeclared capability has been granted
    #[arg(long)]
    pub no_abort_on_extra: bool,

    /// Print scope recommendations even when grants cannot be queried
    #[arg(long)]
    pub advise_when_unsupported: bool,
}

/// Where the configuration came from, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Defaults,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Defaults => f.write_str("defaults"),
        }
    }
}

impl PolicyArgs {
    /// Load the policy file and apply flag overrides on top.
    ///
    /// Flags only tighten or loosen what they name; everything else comes
    /// from the file.
    pub fn resolve(&self) -> Result<(GuardConfig, Source)> {
        let (config, source) = match &self.policy {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::PolicyNotFound { path: path.clone() });
                }
                (GuardConfig::load(path)?, Source::File(path.clone()))
            }
            None if Path::new(POLICY_FILE).exists() => (
                GuardConfig::load(POLICY_FILE)?,
                Source::File(PathBuf::from(POLICY_FILE)),
            ),
            None => (GuardConfig::default(), Source::Defaults),
        };

        Ok((self.apply(config), source))
    }

    fn apply(&self, mut config: GuardConfig) -> GuardConfig {
        config.verbose |= self.verbose;
        config.abort_on_missing |= self.abort_on_missing;
        config.advise_when_unsupported |= self.advise_when_unsupported;
        if self.no_abort_on_extra {
            config.abort_on_extra = false;
        }
        config
    }
}
