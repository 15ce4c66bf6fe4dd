//! Comparator engine
//!
//! A kind-indexed registry of equality predicates. Every kind starts with
//! structural equality; managers override kinds whose deployed form carries
//! platform-injected or defaulted fields.

use std::collections::BTreeMap;

use nexus_common::quantity::quantities_equal;
use serde::Serialize;

use crate::k8s::{ObjectMeta, ResourceList};
use crate::resource::{ManagedResource, ResourceKind, ResourceSet};

/// Equality predicate over (deployed, requested)
pub type Comparator = fn(&ManagedResource, &ManagedResource) -> bool;

/// Structural equality over the whole typed object
pub fn structural_eq(deployed: &ManagedResource, requested: &ManagedResource) -> bool {
    deployed == requested
}

/// Adapts a typed `fn(&T, &T) -> bool` into a [`Comparator`] for one variant.
macro_rules! typed_comparator {
    ($variant:ident, $f:path) => {
        (|deployed: &$crate::resource::ManagedResource,
          requested: &$crate::resource::ManagedResource| {
            match (deployed, requested) {
                (
                    $crate::resource::ManagedResource::$variant(d),
                    $crate::resource::ManagedResource::$variant(r),
                ) => $f(d, r),
                _ => false,
            }
        }) as $crate::comparator::Comparator
    };
}
pub(crate) use typed_comparator;

/// Kind to comparator mapping
#[derive(Clone, Debug, Default)]
pub struct ComparatorRegistry {
    overrides: BTreeMap<ResourceKind, Comparator>,
}

impl ComparatorRegistry {
    /// Registry where every kind uses structural equality
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the comparator for `kind`
    pub fn register(&mut self, kind: ResourceKind, comparator: Comparator) {
        self.overrides.insert(kind, comparator);
    }

    /// Comparator in effect for `kind`
    pub fn get(&self, kind: ResourceKind) -> Comparator {
        self.overrides.get(&kind).copied().unwrap_or(structural_eq)
    }

    /// True when `kind` has a custom comparator
    pub fn has_override(&self, kind: ResourceKind) -> bool {
        self.overrides.contains_key(&kind)
    }

    /// Compare a deployed object against the requested one
    pub fn compare(
        &self,
        kind: ResourceKind,
        deployed: &ManagedResource,
        requested: &ManagedResource,
    ) -> bool {
        (self.get(kind))(deployed, requested)
    }

    /// Pair required and deployed objects by (kind, name) and decide an action
    /// for each.
    ///
    /// Deployed objects with no requested counterpart are marked for deletion.
    pub fn verdicts(&self, required: &ResourceSet, deployed: &ResourceSet) -> Vec<Verdict> {
        let mut verdicts = Vec::new();

        for kind in ResourceKind::ALL {
            for requested in required.get(kind) {
                let action = match deployed.find(kind, requested.name()) {
                    Some(current) if self.compare(kind, current, requested) => Action::NoOp,
                    Some(_) => Action::Update,
                    None => Action::Create,
                };
                verdicts.push(Verdict::new(kind, requested.name(), action));
            }

            for current in deployed.get(kind) {
                if required.find(kind, current.name()).is_none() {
                    verdicts.push(Verdict::new(kind, current.name(), Action::Delete));
                }
            }
        }

        verdicts
    }
}

/// What the caller should do with one object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Action {
    /// Requested but not deployed
    Create,
    /// Deployed but different from the requested form
    Update,
    /// Deployed and equivalent
    NoOp,
    /// Deployed but no longer requested
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::NoOp => "no-op",
            Action::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Per-object decision
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// Object kind
    pub kind: ResourceKind,
    /// Object name
    pub name: String,
    /// Decided action
    pub action: Action,
}

impl Verdict {
    /// Verdict for the object `kind`/`name`
    pub fn new(kind: ResourceKind, name: impl Into<String>, action: Action) -> Self {
        Self {
            kind,
            name: name.into(),
            action,
        }
    }
}

// =============================================================================
// Shared comparison helpers
// =============================================================================

/// Name and namespace match, and every requested label and annotation is
/// present on the deployed object. Extra keys added by other controllers
/// are ignored.
pub fn metadata_matches(deployed: &ObjectMeta, requested: &ObjectMeta) -> bool {
    deployed.name == requested.name
        && deployed.namespace == requested.namespace
        && is_subset(&requested.labels, &deployed.labels)
        && is_subset(&requested.annotations, &deployed.annotations)
}

fn is_subset(wanted: &BTreeMap<String, String>, actual: &BTreeMap<String, String>) -> bool {
    wanted.iter().all(|(k, v)| actual.get(k) == Some(v))
}

/// Same resource names with equal quantities ("1024Mi" matches "1Gi")
pub fn resource_lists_match(deployed: &ResourceList, requested: &ResourceList) -> bool {
    deployed.len() == requested.len()
        && requested.iter().all(|(name, qty)| {
            deployed
                .get(name)
                .is_some_and(|current| quantities_equal(current, qty))
        })
}
