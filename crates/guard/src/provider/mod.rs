//! Capability providers.
//!
//! A provider answers "what is the live state of this capability?" for the
//! host the process runs in. The guard only ever reads through it.

mod grants;

pub use grants::{GRANTS_ENV, GrantTable};

use std::future::Future;

use futures::future::try_join_all;
use policy::{CapabilityDescriptor, CapabilityState, CapabilityStatus};

use crate::Result;

/// Trait for hosts that can report live capability grants.
///
/// Whether a broad live grant satisfies a narrower scoped query is up to the
/// implementation; the guard takes the returned state as authoritative.
pub trait CapabilityProvider: Send + Sync {
    /// Whether the host supports capability queries at all.
    ///
    /// When this returns `false` the guard does nothing.
    fn is_supported(&self) -> bool {
        true
    }

    /// Query the current state of one descriptor. Must not change any grant.
    fn query(
        &self,
        descriptor: &CapabilityDescriptor,
    ) -> impl Future<Output = Result<CapabilityState>> + Send;
}

/// Query every descriptor concurrently.
///
/// Returns one status per descriptor, in input order, once all queries have
/// finished. The first failed query fails the whole batch.
pub async fn query_all<P: CapabilityProvider>(
    provider: &P,
    descriptors: &[CapabilityDescriptor],
) -> Result<Vec<CapabilityStatus>> {
    let queries = descriptors.iter().map(|descriptor| async move {
        let state = provider.query(descriptor).await?;
        Ok::<_, crate::Error>(CapabilityStatus::new(descriptor.clone(), state))
    });
    try_join_all(queries).await
}

/// A host without a capability system.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unsupported;

impl CapabilityProvider for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    async fn query(&self, descriptor: &CapabilityDescriptor) -> Result<CapabilityState> {
        Err(crate::Error::Query {
            descriptor: descriptor.to_string(),
            reason: "host does not support capability queries".to_string(),
        })
    }
}
