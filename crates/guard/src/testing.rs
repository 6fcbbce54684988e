//! Scripted provider for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use policy::{Capability, CapabilityDescriptor, CapabilityState};

use crate::provider::CapabilityProvider;
use crate::{Error, Result};

/// Answers exact descriptor lookups; everything else is `Prompt`.
#[derive(Debug, Default)]
pub struct FakeProvider {
    answers: HashMap<CapabilityDescriptor, CapabilityState>,
    failing: Option<CapabilityDescriptor>,
    unsupported: bool,
    queries: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unsupported() -> Self {
        Self {
            unsupported: true,
            ..Self::default()
        }
    }

    pub fn answer(mut self, descriptor: CapabilityDescriptor, state: CapabilityState) -> Self {
        self.answers.insert(descriptor, state);
        self
    }

    pub fn granted(self, capability: Capability) -> Self {
        self.answer(CapabilityDescriptor::new(capability), CapabilityState::Granted)
    }

    pub fn granted_scoped(self, descriptor: CapabilityDescriptor) -> Self {
        self.answer(descriptor, CapabilityState::Granted)
    }

    pub fn failing_on(mut self, descriptor: CapabilityDescriptor) -> Self {
        self.failing = Some(descriptor);
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl CapabilityProvider for FakeProvider {
    fn is_supported(&self) -> bool {
        !self.unsupported
    }

    async fn query(&self, descriptor: &CapabilityDescriptor) -> Result<CapabilityState> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.as_ref() == Some(descriptor) {
            return Err(Error::Query {
                descriptor: descriptor.to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(self
            .answers
            .get(descriptor)
            .copied()
            .unwrap_or(CapabilityState::Prompt))
    }
}
