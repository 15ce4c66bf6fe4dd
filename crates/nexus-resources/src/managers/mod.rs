//! Resource managers
//!
//! Each manager owns one domain of the object graph and exposes the same
//! three-part contract: what must exist, what currently exists, and how to
//! compare the two for the kinds it owns.

use async_trait::async_trait;
use nexus_common::Error;

use crate::comparator::Comparator;
use crate::resource::{ManagedResource, ResourceKind};
use crate::store::ObjectStore;

pub mod deployment;
pub mod jvm;
pub mod networking;
pub mod persistence;
pub mod security;

pub use deployment::ComputeManager;
pub use networking::NetworkManager;
pub use persistence::StorageManager;
pub use security::IdentityManager;

/// Contract shared by all resource managers
#[async_trait]
pub trait ResourceManager: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Kinds this manager owns. No two managers may own the same kind.
    fn kinds(&self) -> &'static [ResourceKind];

    /// Objects that must exist for the instance
    fn required(&self) -> Result<Vec<ManagedResource>, Error>;

    /// Objects of the owned kinds that currently exist
    async fn deployed(&self, store: &dyn ObjectStore) -> Result<Vec<ManagedResource>, Error>;

    /// Comparator overrides for owned kinds
    fn comparators(&self) -> Vec<(ResourceKind, Comparator)> {
        Vec::new()
    }
}
