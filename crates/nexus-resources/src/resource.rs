//! Resource model: the closed set of kinds the operator manages
//!
//! Every synthesized or fetched object is a [`ManagedResource`]; dispatch on
//! kind (fetching, comparing, planning) goes through [`ResourceKind`].

use std::collections::BTreeMap;

use kube::discovery::ApiResource;
use nexus_common::kube_utils::HasApiResource;
use nexus_common::Error;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::k8s::{
    Deployment, Ingress, ObjectMeta, PersistentVolumeClaim, Route, Service, ServiceAccount,
};

/// Every kind of object the operator manages
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ResourceKind {
    /// apps/v1 Deployment
    Deployment,
    /// v1 Service
    Service,
    /// v1 PersistentVolumeClaim
    PersistentVolumeClaim,
    /// v1 ServiceAccount
    ServiceAccount,
    /// route.openshift.io/v1 Route
    Route,
    /// networking.k8s.io/v1 Ingress
    Ingress,
}

impl ResourceKind {
    /// All kinds, in planning order
    pub const ALL: [ResourceKind; 6] = [
        Self::ServiceAccount,
        Self::PersistentVolumeClaim,
        Self::Deployment,
        Self::Service,
        Self::Route,
        Self::Ingress,
    ];

    /// Kubernetes kind string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => Deployment::KIND,
            Self::Service => Service::KIND,
            Self::PersistentVolumeClaim => PersistentVolumeClaim::KIND,
            Self::ServiceAccount => ServiceAccount::KIND,
            Self::Route => Route::KIND,
            Self::Ingress => Ingress::KIND,
        }
    }

    /// ApiResource for dynamic API access
    pub fn api_resource(&self) -> ApiResource {
        match self {
            Self::Deployment => Deployment::api_resource(),
            Self::Service => Service::api_resource(),
            Self::PersistentVolumeClaim => PersistentVolumeClaim::api_resource(),
            Self::ServiceAccount => ServiceAccount::api_resource(),
            Self::Route => Route::api_resource(),
            Self::Ingress => Ingress::api_resource(),
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete object, desired or observed
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ManagedResource {
    /// Deployment
    Deployment(Deployment),
    /// Service
    Service(Service),
    /// PersistentVolumeClaim
    PersistentVolumeClaim(PersistentVolumeClaim),
    /// ServiceAccount
    ServiceAccount(ServiceAccount),
    /// Route
    Route(Route),
    /// Ingress
    Ingress(Ingress),
}

impl ManagedResource {
    /// Decode an object read from the API server
    pub fn from_json(kind: ResourceKind, value: serde_json::Value) -> Result<Self, Error> {
        Ok(match kind {
            ResourceKind::Deployment => Self::Deployment(decode(kind, value)?),
            ResourceKind::Service => Self::Service(decode(kind, value)?),
            ResourceKind::PersistentVolumeClaim => Self::PersistentVolumeClaim(decode(kind, value)?),
            ResourceKind::ServiceAccount => Self::ServiceAccount(decode(kind, value)?),
            ResourceKind::Route => Self::Route(decode(kind, value)?),
            ResourceKind::Ingress => Self::Ingress(decode(kind, value)?),
        })
    }

    /// Kind of this object
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Deployment(_) => ResourceKind::Deployment,
            Self::Service(_) => ResourceKind::Service,
            Self::PersistentVolumeClaim(_) => ResourceKind::PersistentVolumeClaim,
            Self::ServiceAccount(_) => ResourceKind::ServiceAccount,
            Self::Route(_) => ResourceKind::Route,
            Self::Ingress(_) => ResourceKind::Ingress,
        }
    }

    /// Object metadata
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Deployment(r) => &r.metadata,
            Self::Service(r) => &r.metadata,
            Self::PersistentVolumeClaim(r) => &r.metadata,
            Self::ServiceAccount(r) => &r.metadata,
            Self::Route(r) => &r.metadata,
            Self::Ingress(r) => &r.metadata,
        }
    }

    /// Object name
    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Object namespace
    pub fn namespace(&self) -> &str {
        &self.metadata().namespace
    }
}

fn decode<T: DeserializeOwned>(kind: ResourceKind, value: serde_json::Value) -> Result<T, Error> {
    serde_json::from_value(value)
        .map_err(|e| Error::serialization_for_kind(kind.as_str(), format!("failed to decode: {e}")))
}

macro_rules! impl_from_resource {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for ManagedResource {
                fn from(resource: $variant) -> Self {
                    Self::$variant(resource)
                }
            }
        )*
    };
}

impl_from_resource!(
    Deployment,
    Service,
    PersistentVolumeClaim,
    ServiceAccount,
    Route,
    Ingress,
);

/// Objects grouped by kind, in the order each manager produced them
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResourceSet(BTreeMap<ResourceKind, Vec<ManagedResource>>);

impl ResourceSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one manager's output, keeping its order within each kind
    pub fn extend(&mut self, resources: impl IntoIterator<Item = ManagedResource>) {
        for resource in resources {
            self.0.entry(resource.kind()).or_default().push(resource);
        }
    }

    /// Objects of one kind
    pub fn get(&self, kind: ResourceKind) -> &[ManagedResource] {
        self.0.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up one object by kind and name
    pub fn find(&self, kind: ResourceKind, name: &str) -> Option<&ManagedResource> {
        self.get(kind).iter().find(|r| r.name() == name)
    }

    /// Kinds with at least one object
    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.0.keys().copied()
    }

    /// All objects, grouped by kind
    pub fn iter(&self) -> impl Iterator<Item = &ManagedResource> {
        self.0.values().flatten()
    }

    /// Total number of objects
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// True when no objects are present
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
