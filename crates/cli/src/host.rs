//! Live grants given on the command line or through the environment.

use std::fmt;

use clap::Args;
use guard::{CapabilityProvider, GRANTS_ENV, GrantTable, Unsupported};
use policy::{Capability, CapabilityDescriptor, CapabilityState};

#[derive(Debug, Args)]
pub struct GrantArgs {
    /// Read grants from the PERMGUARD_GRANTS environment variable
    #[arg(long, conflicts_with_all = ["allow_all", "allow_run", "allow_read", "allow_write", "allow_net", "allow_env", "allow_plugin", "allow_hrtime"])]
    pub from_env: bool,

    /// Grant every capability
    #[arg(short = 'A', long)]
    pub allow_all: bool,

    /// Grant subprocess execution
    #[arg(long)]
    pub allow_run: bool,

    /// Grant file reads, optionally limited to a comma-separated path list
    #[arg(long, value_name = "PATHS", num_args = 0..=1, require_equals = true, default_missing_value = "")]
    pub allow_read: Option<String>,

    /// Grant file writes, optionally limited to a comma-separated path list
    #[arg(long, value_name = "PATHS", num_args = 0..=1, require_equals = true, default_missing_value = "")]
    pub allow_write: Option<String>,

    /// Grant network access, optionally limited to a comma-separated host list
    #[arg(long, value_name = "HOSTS", num_args = 0..=1, require_equals = true, default_missing_value = "")]
    pub allow_net: Option<String>,

    /// Grant environment access
    #[arg(long)]
    pub allow_env: bool,

    /// Grant plugin loading
    #[arg(long)]
    pub allow_plugin: bool,

    /// Grant high-resolution time
    #[arg(long)]
    pub allow_hrtime: bool,
}

impl GrantArgs {
    /// The grants as flag strings, e.g. `--allow-net=google.com`.
    pub fn to_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if self.allow_all {
            flags.push("--allow-all".to_string());
        }

        let switches = [
            (self.allow_run, Capability::Run),
            (self.allow_env, Capability::Env),
            (self.allow_plugin, Capability::Plugin),
            (self.allow_hrtime, Capability::Hrtime),
        ];
        flags.extend(switches.into_iter().filter(|(on, _)| *on).map(|(_, c)| c.flag()));

        let lists = [
            (&self.allow_read, Capability::Read),
            (&self.allow_write, Capability::Write),
            (&self.allow_net, Capability::Net),
        ];
        for (list, capability) in lists {
            match list.as_deref() {
                Some("") => flags.push(capability.flag()),
                Some(list) => flags.push(format!("{}={list}", capability.flag())),
                None => {}
            }
        }
        flags
    }

    pub fn into_host(self) -> guard::Result<Host> {
        if self.from_env {
            return Ok(match GrantTable::from_env()? {
                Some(table) => Host::Table(table),
                None => {
                    tracing::debug!("{GRANTS_ENV} not set, capability queries unsupported");
                    Host::Unsupported(Unsupported)
                }
            });
        }
        Ok(Host::Table(GrantTable::from_flags(self.to_flags())?))
    }
}

/// The provider selected on the command line.
#[derive(Debug)]
pub enum Host {
    Table(GrantTable),
    Unsupported(Unsupported),
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Table(_) => f.write_str("grant flags"),
            Host::Unsupported(_) => f.write_str("unsupported"),
        }
    }
}

impl CapabilityProvider for Host {
    fn is_supported(&self) -> bool {
        match self {
            Host::Table(table) => table.is_supported(),
            Host::Unsupported(host) => host.is_supported(),
        }
    }

    async fn query(&self, descriptor: &CapabilityDescriptor) -> guard::Result<CapabilityState> {
        match self {
            Host::Table(table) => table.query(descriptor).await,
            Host::Unsupported(host) => host.query(descriptor).await,
        }
    }
}
