//! Storage manager: the instance's PersistentVolumeClaim

use async_trait::async_trait;
use nexus_common::quantity::quantities_equal;
use nexus_common::Error;
use tracing::debug;

use super::ResourceManager;
use crate::comparator::{metadata_matches, typed_comparator, Comparator};
use crate::defaults::NormalizedSpec;
use crate::k8s::{ObjectMeta, PersistentVolumeClaim, PvcResources, PvcSpec};
use crate::resource::{ManagedResource, ResourceKind};
use crate::store::{fetch, ObjectStore};

const STORAGE: &str = "storage";

/// Produces and compares the data claim of an instance
pub struct StorageManager<'a> {
    spec: &'a NormalizedSpec,
}

impl<'a> StorageManager<'a> {
    /// Create a manager for the given spec
    pub fn new(spec: &'a NormalizedSpec) -> Self {
        Self { spec }
    }

    /// Build the claim. A single replica gets a ReadWriteOnce volume; more
    /// replicas share a ReadWriteMany one.
    pub fn build_claim(&self) -> PersistentVolumeClaim {
        let spec = self.spec;
        let access_mode = if spec.replicas <= 1 {
            PvcSpec::READ_WRITE_ONCE
        } else {
            PvcSpec::READ_WRITE_MANY
        };

        PersistentVolumeClaim::new(
            ObjectMeta::new(&spec.name, &spec.namespace),
            PvcSpec {
                access_modes: vec![access_mode.to_string()],
                resources: PvcResources {
                    requests: [(STORAGE.to_string(), spec.persistence.volume_size.clone())]
                        .into_iter()
                        .collect(),
                },
                storage_class_name: spec.persistence.storage_class.clone(),
            },
        )
    }
}

#[async_trait]
impl<'a> ResourceManager for StorageManager<'a> {
    fn name(&self) -> &'static str {
        "storage"
    }

    fn kinds(&self) -> &'static [ResourceKind] {
        &[ResourceKind::PersistentVolumeClaim]
    }

    fn required(&self) -> Result<Vec<ManagedResource>, Error> {
        if !self.spec.persistence.persistent {
            return Ok(Vec::new());
        }
        Ok(vec![self.build_claim().into()])
    }

    async fn deployed(&self, store: &dyn ObjectStore) -> Result<Vec<ManagedResource>, Error> {
        // Claims hold data; one left behind after persistence is switched off
        // is never reported for deletion.
        if !self.spec.persistence.persistent {
            return Ok(Vec::new());
        }
        let claim = fetch(
            store,
            ResourceKind::PersistentVolumeClaim,
            &self.spec.namespace,
            &self.spec.name,
        )
        .await?;
        debug!(instance = %self.spec.name, found = claim.is_some(), "fetched data claim");
        Ok(claim.into_iter().collect())
    }

    fn comparators(&self) -> Vec<(ResourceKind, Comparator)> {
        vec![(
            ResourceKind::PersistentVolumeClaim,
            typed_comparator!(PersistentVolumeClaim, pvc_matches),
        )]
    }
}

/// Compare access modes, requested size and storage class. An unset
/// requested class accepts whatever default the cluster injected.
pub fn pvc_matches(deployed: &PersistentVolumeClaim, requested: &PersistentVolumeClaim) -> bool {
    let (d, r) = (&deployed.spec, &requested.spec);

    let size_matches = match (d.storage_request(), r.storage_request()) {
        (Some(d), Some(r)) => quantities_equal(d, r),
        (d, r) => d == r,
    };

    metadata_matches(&deployed.metadata, &requested.metadata)
        && d.access_modes == r.access_modes
        && size_matches
        && (r.storage_class_name.is_none() || d.storage_class_name == r.storage_class_name)
}
