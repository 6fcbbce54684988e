//! Reconciliation of declared policy against live grants.

use policy::{Capability, CapabilityDescriptor, CapabilityStatus, Policy};
use serde::Serialize;

use crate::Result;
use crate::provider::{CapabilityProvider, query_all};

/// Discrepancies between a policy and the live grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Unscoped live grants the policy never asked for.
    pub extra: Vec<CapabilityStatus>,
    /// Declared descriptors the host has not granted.
    pub missing: Vec<CapabilityStatus>,
    /// Declared unscoped descriptors that could have been scoped.
    pub recommendations: Vec<CapabilityDescriptor>,
}

impl Classification {
    pub fn is_clean(&self) -> bool {
        self.extra.is_empty() && self.missing.is_empty()
    }
}

/// Top-level capabilities granted in full that the policy does not request
/// in full.
///
/// A scoped declaration does not excuse an unscoped grant of the same
/// capability.
pub async fn find_extra<P: CapabilityProvider>(
    policy: &Policy,
    provider: &P,
) -> Result<Vec<CapabilityStatus>> {
    let top_level: Vec<_> = Capability::all()
        .iter()
        .copied()
        .map(CapabilityDescriptor::new)
        .collect();

    let statuses = query_all(provider, &top_level).await?;
    Ok(statuses
        .into_iter()
        .filter(|status| status.is_granted() && !policy.allows_unscoped(status.capability()))
        .collect())
}

/// Declared descriptors whose exact query is not `granted`.
pub async fn find_missing<P: CapabilityProvider>(
    policy: &Policy,
    provider: &P,
) -> Result<Vec<CapabilityStatus>> {
    let statuses = query_all(provider, policy.descriptors()).await?;
    Ok(statuses
        .into_iter()
        .filter(|status| !status.is_granted())
        .collect())
}

/// Unscoped declarations of capabilities that accept a scope.
pub fn recommendations(policy: &Policy) -> Vec<CapabilityDescriptor> {
    policy
        .iter()
        .filter(|d| d.is_unscoped() && d.capability().supports_scope())
        .cloned()
        .collect()
}

/// Run every classification without deciding anything.
pub async fn reconcile<P: CapabilityProvider>(
    policy: &Policy,
    provider: &P,
) -> Result<Classification> {
    let (extra, missing) =
        futures::try_join!(find_extra(policy, provider), find_missing(policy, provider))?;

    Ok(Classification {
        extra,
        missing,
        recommendations: recommendations(policy),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;
    use policy::{CapabilityState, Grant};

    fn net_google() -> CapabilityDescriptor {
        CapabilityDescriptor::net("google.com").unwrap()
    }

    #[tokio::test]
    async fn nothing_granted_means_nothing_extra() {
        let policies = [
            Policy::empty(),
            Policy::normalize(Capability::ALL).unwrap(),
            Policy::normalize([net_google()]).unwrap(),
        ];
        let provider = FakeProvider::new()
            .answer(CapabilityDescriptor::new(Capability::Env), CapabilityState::Denied);

        for policy in &policies {
            assert!(find_extra(policy, &provider).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn undeclared_full_grant_is_extra() {
        let provider = FakeProvider::new().granted(Capability::Env);

        let extra = find_extra(&Policy::empty(), &provider).await.unwrap();

        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].capability(), Capability::Env);
        assert_eq!(extra[0].state, CapabilityState::Granted);
    }

    #[tokio::test]
    async fn scoped_declaration_does_not_excuse_full_grant() {
        let policy = Policy::normalize([net_google()]).unwrap();
        let provider = FakeProvider::new()
            .granted(Capability::Net)
            .granted_scoped(net_google());

        let classification = reconcile(&policy, &provider).await.unwrap();

        let extra: Vec<_> = classification.extra.iter().map(|s| s.capability()).collect();
        assert_eq!(extra, [Capability::Net]);
        assert!(classification.missing.is_empty());
    }

    #[tokio::test]
    async fn extra_follows_registry_order() {
        let provider = FakeProvider::new()
            .granted(Capability::Hrtime)
            .granted(Capability::Run)
            .granted(Capability::Env);
        let policy = Policy::normalize([Capability::Env]).unwrap();

        let extra = find_extra(&policy, &provider).await.unwrap();

        let names: Vec<_> = extra.iter().map(|s| s.capability()).collect();
        assert_eq!(names, [Capability::Run, Capability::Hrtime]);
    }

    #[tokio::test]
    async fn granted_descriptors_are_never_missing() {
        let policy = Policy::normalize([Grant::from(net_google()), Grant::Name(Capability::Env)]).unwrap();
        let provider = FakeProvider::new()
            .granted_scoped(net_google())
            .granted(Capability::Env);

        assert!(find_missing(&policy, &provider).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_keeps_policy_order_and_state() {
        let read_tmp = CapabilityDescriptor::read("/tmp").unwrap();
        let policy = Policy::normalize([
            Grant::from(read_tmp.clone()),
            Grant::Name(Capability::Env),
            Grant::from(net_google()),
        ])
        .unwrap();
        let provider = FakeProvider::new()
            .granted(Capability::Env)
            .answer(net_google(), CapabilityState::Denied);

        let missing = find_missing(&policy, &provider).await.unwrap();

        assert_eq!(
            missing,
            vec![
                CapabilityStatus::new(read_tmp, CapabilityState::Prompt),
                CapabilityStatus::new(net_google(), CapabilityState::Denied),
            ]
        );
    }

    #[test]
    fn recommendations_only_for_scopable_unscoped() {
        let policy = Policy::normalize([
            Grant::Name(Capability::Net),
            Grant::Name(Capability::Env),
            Grant::from(net_google()),
            Grant::Name(Capability::Write),
        ])
        .unwrap();

        let names: Vec<_> = recommendations(&policy)
            .iter()
            .map(|d| d.capability())
            .collect();
        assert_eq!(names, [Capability::Net, Capability::Write]);
    }

    #[tokio::test]
    async fn query_failure_propagates() {
        let provider = FakeProvider::new().failing_on(CapabilityDescriptor::new(Capability::Plugin));

        let err = reconcile(&Policy::empty(), &provider).await.unwrap_err();

        assert!(matches!(err, crate::Error::Query { .. }));
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let policy = Policy::normalize([Capability::Net]).unwrap();
        let provider = FakeProvider::new()
            .granted(Capability::Read)
            .granted(Capability::Net);

        let first = reconcile(&policy, &provider).await.unwrap();
        let second = reconcile(&policy, &provider).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.query_count(), 2 * (Capability::ALL.len() + policy.len()));
    }
}
