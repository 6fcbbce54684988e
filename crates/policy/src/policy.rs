//! Declared policy: the capabilities a program says it needs.

use crate::{Capability, CapabilityDescriptor, Grant, Result};

/// A normalized set of declared capability descriptors.
///
/// Descriptors keep their declaration order so diagnostics come out in the
/// order the caller wrote them. Duplicates are allowed and harmless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    descriptors: Vec<CapabilityDescriptor>,
}

impl Policy {
    /// An empty policy: no unscoped grant is acceptable.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalize caller-supplied grants into canonical descriptors.
    pub fn normalize<I, G>(grants: I) -> Result<Self>
    where
        I: IntoIterator<Item = G>,
        G: Into<Grant>,
    {
        let descriptors = grants
            .into_iter()
            .map(|grant| grant.into().into_descriptor())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { descriptors })
    }

    pub fn descriptors(&self) -> &[CapabilityDescriptor] {
        &self.descriptors
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Whether the policy asks for `capability` without a scope.
    pub fn allows_unscoped(&self, capability: Capability) -> bool {
        self.descriptors
            .iter()
            .any(|d| d.capability() == capability && d.is_unscoped())
    }
}

impl FromIterator<CapabilityDescriptor> for Policy {
    fn from_iter<T: IntoIterator<Item = CapabilityDescriptor>>(iter: T) -> Self {
        Self {
            descriptors: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Policy {
    type Item = &'a CapabilityDescriptor;
    type IntoIter = std::slice::Iter<'a, CapabilityDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn normalize_keeps_declaration_order() {
        let policy = Policy::normalize([
            Grant::scoped(Capability::Net, "google.com"),
            Grant::Name(Capability::Env),
        ])
        .unwrap();

        let names: Vec<_> = policy.iter().map(|d| d.capability()).collect();
        assert_eq!(names, [Capability::Net, Capability::Env]);
        assert_eq!(policy.descriptors()[0].scope(), Some("google.com"));
    }

    #[test]
    fn normalize_accepts_bare_capabilities() {
        let policy = Policy::normalize([Capability::Env, Capability::Env]).unwrap();
        assert_eq!(policy.len(), 2);
        assert!(policy.allows_unscoped(Capability::Env));
    }

    #[test]
    fn scoped_declaration_does_not_allow_unscoped() {
        let policy = Policy::normalize([CapabilityDescriptor::net("google.com").unwrap()]).unwrap();
        assert!(!policy.allows_unscoped(Capability::Net));
    }

    #[test]
    fn normalize_rejects_scope_on_plain_capability() {
        let err = Policy::normalize([Grant::scoped(Capability::Run, "ls")]).unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
    }

    #[test]
    fn empty_policy_allows_nothing() {
        let policy = Policy::empty();
        assert!(policy.is_empty());
        assert!(Capability::all().iter().all(|c| !policy.allows_unscoped(*c)));
    }
}
