//! permguard guard: reconcile declared capabilities with live grants.
//!
//! Call [`run_guard`] before the rest of a program runs. It checks that:
//!
//! 1. No unscoped capability has been granted that the policy does not
//!    request in full ("extra").
//! 2. Every capability the policy declares has actually been granted
//!    ("missing").
//!
//! and exits the process with code 1 when configured to abort on either.
//! Unscoped requests for capabilities that accept a scope are reported as
//! recommendations.
//!
//! # Overview
//!
//! - **CapabilityProvider**: the host's view of live grants. [`GrantTable`]
//!   models grants from `--allow-*` flags; [`Unsupported`] is a host with no
//!   capability system, for which the guard is a no-op.
//! - **engine**: the three classifications, free of side effects.
//! - **decision**: [`evaluate`] walks the decision phases and returns a
//!   [`Verdict`] without exiting.
//! - **Reporter**: where diagnostic lines go.
//!
//! # Example
//!
//! ```no_run
//! use guard::{GrantTable, run_guard};
//! use policy::{Capability, CapabilityDescriptor, GuardConfig, Grant, Policy};
//!
//! # async fn example() -> guard::Result<()> {
//! let policy = Policy::normalize([
//!     Grant::from(CapabilityDescriptor::net("http://google.com")?),
//!     Grant::Name(Capability::Env),
//! ])?;
//! let config = GuardConfig::new(policy).abort_on_missing(true).verbose(true);
//! let host = GrantTable::from_flags(["--allow-env", "--allow-net=google.com"])?;
//!
//! run_guard(config, &host).await?;
//! println!("Code is now executing");
//! # Ok(())
//! # }
//! ```

mod decision;
pub mod engine;
mod error;
mod provider;
mod report;
#[cfg(test)]
mod testing;

pub use decision::{ABORT_CODE, Outcome, Phase, Verdict, evaluate};
pub use engine::{Classification, reconcile};
pub use error::{Error, Result};
pub use provider::{CapabilityProvider, GRANTS_ENV, GrantTable, Unsupported, query_all};
pub use report::{Line, MemoryReporter, Reporter, StderrReporter};

use policy::GuardConfig;

/// Run the guard and exit the process if it decides to abort.
///
/// Returns normally only when the program may continue. Diagnostics go to
/// stderr when `config.verbose` is set.
pub async fn run_guard<P: CapabilityProvider>(config: GuardConfig, provider: &P) -> Result<()> {
    let verdict = evaluate(&config, provider, &StderrReporter).await?;
    match verdict.outcome {
        Outcome::Continue => Ok(()),
        Outcome::Abort { code } => terminate(code),
    }
}

/// Exit the process with `code`.
pub fn terminate(code: i32) -> ! {
    tracing::debug!(code, "guard terminating process");
    std::process::exit(code)
}
