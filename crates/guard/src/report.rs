//! Diagnostic lines and where they go.

use std::sync::Mutex;

use policy::{CapabilityDescriptor, CapabilityStatus};

const PREFIX: &str = "permguard";

/// Line-oriented sink for guard diagnostics.
///
/// Three independent channels; each call receives one preformatted line.
pub trait Reporter: Send + Sync {
    fn advisory(&self, line: &str);
    fn warning(&self, line: &str);
    fn error(&self, line: &str);
}

/// Writes every line to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn advisory(&self, line: &str) {
        eprintln!("{line}");
    }

    fn warning(&self, line: &str) {
        eprintln!("{line}");
    }

    fn error(&self, line: &str) {
        eprintln!("{line}");
    }
}

/// A line captured by [`MemoryReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Advisory(String),
    Warning(String),
    Error(String),
}

/// Keeps lines in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<Line>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<Line> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn push(&self, line: Line) {
        self.lock().push(line);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Line>> {
        // A poisoned lock still holds every line pushed before the panic.
        self.lines.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Reporter for MemoryReporter {
    fn advisory(&self, line: &str) {
        self.push(Line::Advisory(line.to_string()));
    }

    fn warning(&self, line: &str) {
        self.push(Line::Warning(line.to_string()));
    }

    fn error(&self, line: &str) {
        self.push(Line::Error(line.to_string()));
    }
}

pub(crate) fn recommendation(descriptor: &CapabilityDescriptor) -> String {
    let capability = descriptor.capability();
    let flag = capability.flag();
    format!(
        "{PREFIX}: warning: insecure top-level permission \"{flag}\" has been provided. \
         Consider using a scoped permission with allowlist instead \"{flag}=<allow-{capability}>\""
    )
}

pub(crate) fn extra(status: &CapabilityStatus) -> String {
    format!(
        "{PREFIX}: error: insecure top-level permission \"{}\" has been provided",
        status.capability().flag()
    )
}

pub(crate) fn extra_summary(aborting: bool) -> String {
    if aborting {
        format!("{PREFIX}: exiting due to insecure top-level permissions")
    } else {
        format!("{PREFIX}: continuing despite insecure top-level permissions")
    }
}

pub(crate) fn missing(status: &CapabilityStatus) -> String {
    format!(
        "{PREFIX}: warning: missing permission \"{}\"",
        status.descriptor.flag()
    )
}

pub(crate) fn missing_summary(aborting: bool) -> String {
    if aborting {
        format!("{PREFIX}: exiting due to missing required permissions")
    } else {
        format!("{PREFIX}: continuing despite missing required permissions")
    }
}
