//! Reconciliation supervisor
//!
//! One pass: validate, probe the platform once, normalize once, then ask
//! every manager what must exist and what does exist. The result is a plan;
//! applying it is left to the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;
use nexus_common::crd::Nexus;
use nexus_common::{Capabilities, CapabilityProbe, Error};
use tracing::{debug, info, instrument};

use crate::comparator::{ComparatorRegistry, Verdict};
use crate::defaults::{normalize, NormalizedSpec};
use crate::managers::{
    ComputeManager, IdentityManager, NetworkManager, ResourceManager, StorageManager,
};
use crate::resource::{ResourceKind, ResourceSet};
use crate::store::ObjectStore;

/// Outcome of one reconciliation pass
#[derive(Debug)]
pub struct ReconcilePlan {
    /// Instance name
    pub instance: String,
    /// Instance namespace
    pub namespace: String,
    /// Platform capabilities seen by this pass
    pub capabilities: Capabilities,
    /// Spec with defaults applied
    pub spec: NormalizedSpec,
    /// Objects that must exist
    pub required: ResourceSet,
    /// Objects of managed kinds that currently exist
    pub deployed: ResourceSet,
    /// Comparator in effect for each kind
    pub comparators: ComparatorRegistry,
}

impl ReconcilePlan {
    /// Action to take for every required or deployed object
    pub fn verdicts(&self) -> Vec<Verdict> {
        self.comparators.verdicts(&self.required, &self.deployed)
    }
}

/// Drives the managers for one Nexus instance at a time
///
/// Holds no per-instance state; passes for the same instance must be
/// serialized by the caller.
#[derive(Clone)]
pub struct Supervisor {
    store: Arc<dyn ObjectStore>,
    probe: Arc<dyn CapabilityProbe>,
}

impl Supervisor {
    /// Create a supervisor reading from `store` and probing with `probe`
    pub fn new(store: Arc<dyn ObjectStore>, probe: Arc<dyn CapabilityProbe>) -> Self {
        Self { store, probe }
    }

    /// Compute required and deployed state for `nexus`
    ///
    /// Fails without a partial plan if validation, capability discovery,
    /// synthesis or any fetch fails. Objects that are simply absent are not
    /// failures.
    #[instrument(skip(self, nexus), fields(instance = ?nexus.metadata.name))]
    pub async fn reconcile_plan(&self, nexus: &Nexus) -> Result<ReconcilePlan, Error> {
        let (instance, namespace) = identity(nexus)?;
        nexus.spec.validate(&instance)?;

        let capabilities = self.probe.discover().await?;
        let spec = normalize(&instance, &namespace, &nexus.spec, &capabilities);

        let (required, deployed, comparators) = {
            let managers = managers(&spec, capabilities);
            check_ownership(&managers)?;

            let mut required = ResourceSet::new();
            for manager in &managers {
                let objects = manager.required()?;
                debug!(manager = manager.name(), count = objects.len(), "required objects");
                required.extend(objects);
            }

            let store = self.store.as_ref();
            let fetched = try_join_all(managers.iter().map(|m| m.deployed(store))).await?;
            let mut deployed = ResourceSet::new();
            for objects in fetched {
                deployed.extend(objects);
            }

            let mut comparators = ComparatorRegistry::new();
            for manager in &managers {
                for (kind, comparator) in manager.comparators() {
                    comparators.register(kind, comparator);
                }
            }

            (required, deployed, comparators)
        };

        info!(
            namespace = %namespace,
            required = required.len(),
            deployed = deployed.len(),
            "computed reconcile plan"
        );

        Ok(ReconcilePlan {
            instance,
            namespace,
            capabilities,
            spec,
            required,
            deployed,
            comparators,
        })
    }
}

fn identity(nexus: &Nexus) -> Result<(String, String), Error> {
    let name = nexus
        .metadata
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::validation("Nexus resource has no name"))?;
    let namespace = nexus
        .metadata
        .namespace
        .clone()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::validation_for(&name, "Nexus resource has no namespace"))?;
    Ok((name, namespace))
}

fn managers(
    spec: &NormalizedSpec,
    capabilities: Capabilities,
) -> Vec<Box<dyn ResourceManager + '_>> {
    vec![
        Box::new(IdentityManager::new(spec)),
        Box::new(StorageManager::new(spec)),
        Box::new(ComputeManager::new(spec)),
        Box::new(NetworkManager::new(spec, capabilities)),
    ]
}

/// Every kind must be owned by exactly one manager
fn check_ownership(managers: &[Box<dyn ResourceManager + '_>]) -> Result<(), Error> {
    let mut owners: BTreeMap<ResourceKind, &'static str> = BTreeMap::new();
    for manager in managers {
        for kind in manager.kinds() {
            if let Some(previous) = owners.insert(*kind, manager.name()) {
                return Err(Error::internal_with_context(
                    "supervisor",
                    format!(
                        "{kind} is owned by both the {previous} and {} managers",
                        manager.name()
                    ),
                ));
            }
        }
    }
    Ok(())
}
