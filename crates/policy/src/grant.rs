//! Caller-supplied grants, before normalization.

use serde::Deserialize;

use crate::{Capability, CapabilityDescriptor, Result};

/// A declared grant: either a bare capability name or an explicit descriptor.
///
/// In TOML both forms can be mixed in one list:
///
/// ```toml
/// granted = ["env", { name = "net", url = "http://google.com" }]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Grant {
    /// Shorthand for an unscoped request.
    Name(Capability),
    /// A capability with an optional scope.
    Descriptor(DescriptorGrant),
}

/// The table form of a [`Grant`].
///
/// Unknown keys are rejected: a mistyped scope key must not silently turn a
/// scoped request into an unscoped one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptorGrant {
    pub name: Capability,
    #[serde(default, alias = "url", alias = "path")]
    pub scope: Option<String>,
}

impl Grant {
    pub fn scoped(name: Capability, scope: impl Into<String>) -> Self {
        Grant::Descriptor(DescriptorGrant {
            name,
            scope: Some(scope.into()),
        })
    }

    /// Convert to the canonical descriptor shape.
    pub fn into_descriptor(self) -> Result<CapabilityDescriptor> {
        match self {
            Grant::Name(name) | Grant::Descriptor(DescriptorGrant { name, scope: None }) => {
                Ok(CapabilityDescriptor::new(name))
            }
            Grant::Descriptor(DescriptorGrant {
                name,
                scope: Some(scope),
            }) => CapabilityDescriptor::with_scope(name, scope),
        }
    }
}

impl From<Capability> for Grant {
    fn from(name: Capability) -> Self {
        Grant::Name(name)
    }
}

impl From<CapabilityDescriptor> for Grant {
    fn from(descriptor: CapabilityDescriptor) -> Self {
        Grant::Descriptor(DescriptorGrant {
            name: descriptor.capability(),
            scope: descriptor.scope().map(str::to_string),
        })
    }
}
