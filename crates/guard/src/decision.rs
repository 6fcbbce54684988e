//! Turning a classification into a continue/abort decision.

use policy::GuardConfig;

use crate::Result;
use crate::engine::{self, Classification};
use crate::provider::CapabilityProvider;
use crate::report::{self, Reporter};

/// Exit code used when the guard aborts.
pub const ABORT_CODE: i32 = 1;

/// Where a guard evaluation is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Normalizing,
    CheckingExtra,
    CheckingMissing,
    Terminated,
    Continuing,
}

impl Phase {
    pub fn is_final(self) -> bool {
        matches!(self, Phase::Terminated | Phase::Continuing)
    }
}

/// What the caller should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Abort { code: i32 },
}

/// Result of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub outcome: Outcome,
    /// Final phase, either [`Phase::Continuing`] or [`Phase::Terminated`].
    pub phase: Phase,
    /// Classifications computed before the decision. `missing` stays empty
    /// when the extra check already aborted.
    pub classification: Classification,
}

impl Verdict {
    pub fn should_continue(&self) -> bool {
        matches!(self.outcome, Outcome::Continue)
    }
}

struct Machine {
    phase: Phase,
}

impl Machine {
    fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    fn enter(&mut self, next: Phase) {
        tracing::debug!(from = ?self.phase, to = ?next, "guard phase");
        self.phase = next;
    }

    fn finish(mut self, outcome: Outcome, classification: Classification) -> Verdict {
        self.enter(match outcome {
            Outcome::Continue => Phase::Continuing,
            Outcome::Abort { .. } => Phase::Terminated,
        });
        Verdict {
            outcome,
            phase: self.phase,
            classification,
        }
    }
}

/// Evaluate `config` against the live grants reported by `provider`.
///
/// Never exits the process: an abort is returned as [`Outcome::Abort`].
/// Provider failures are returned as errors and never treated as a pass.
pub async fn evaluate<P, R>(config: &GuardConfig, provider: &P, reporter: &R) -> Result<Verdict>
where
    P: CapabilityProvider,
    R: Reporter,
{
    let mut machine = Machine::new();
    let mut classification = Classification {
        recommendations: engine::recommendations(&config.policy),
        ..Classification::default()
    };

    if !provider.is_supported() {
        tracing::debug!("capability queries unsupported, guard disabled");
        if config.verbose && config.advise_when_unsupported {
            report_recommendations(&classification, reporter);
        }
        return Ok(machine.finish(Outcome::Continue, classification));
    }

    machine.enter(Phase::Normalizing);
    if config.verbose {
        report_recommendations(&classification, reporter);
    }

    machine.enter(Phase::CheckingExtra);
    classification.extra = engine::find_extra(&config.policy, provider).await?;
    if !classification.extra.is_empty() {
        tracing::debug!(count = classification.extra.len(), "extra capabilities granted");
        if config.verbose {
            for status in &classification.extra {
                reporter.error(&report::extra(status));
            }
            reporter.error(&report::extra_summary(config.abort_on_extra));
        }
        if config.abort_on_extra {
            return Ok(machine.finish(Outcome::Abort { code: ABORT_CODE }, classification));
        }
    }

    machine.enter(Phase::CheckingMissing);
    classification.missing = engine::find_missing(&config.policy, provider).await?;
    if !classification.missing.is_empty() {
        tracing::debug!(count = classification.missing.len(), "declared capabilities missing");
        if config.verbose {
            for status in &classification.missing {
                reporter.warning(&report::missing(status));
            }
            reporter.warning(&report::missing_summary(config.abort_on_missing));
        }
        if config.abort_on_missing {
            return Ok(machine.finish(Outcome::Abort { code: ABORT_CODE }, classification));
        }
    }

    Ok(machine.finish(Outcome::Continue, classification))
}

fn report_recommendations<R: Reporter>(classification: &Classification, reporter: &R) {
    for descriptor in &classification.recommendations {
        reporter.advisory(&report::recommendation(descriptor));
    }
}
