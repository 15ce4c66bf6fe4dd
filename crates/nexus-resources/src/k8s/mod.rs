//! Kubernetes object types synthesized and compared by the managers
//!
//! These are deliberately narrow: only fields the operator sets are
//! modelled, so anything the API server adds on its own (status, defaults
//! for untouched fields, bookkeeping metadata) is dropped when a deployed
//! object is read back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

mod core_v1;
mod network;
mod rbac;
mod workload;

pub use core_v1::{
    PersistentVolumeClaim, PvcResources, PvcSpec, Service, ServiceAccount, ServicePort,
    ServiceSpec,
};
pub use network::{
    Ingress, IngressBackend, IngressPath, IngressRule, IngressServiceBackend, IngressSpec,
    IngressTls, HttpIngressRuleValue, Route, RoutePort, RouteSpec, RouteTargetReference, RouteTls,
    ServiceBackendPort,
};
pub use rbac::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
pub use workload::{
    Container, ContainerPort, Deployment, DeploymentSpec, DeploymentStrategy, EnvVar,
    HttpGetAction, PersistentVolumeClaimVolumeSource, PodSecurityContext, PodSpec,
    PodTemplateMeta, PodTemplateSpec, Probe, ResourceList, ResourceRequirements, Volume,
    VolumeMount,
};

pub use nexus_common::kube_utils::ObjectMeta;

/// Implements `HasApiResource`, serde defaults for apiVersion/kind and a
/// `new(metadata, spec)` constructor for a top-level object type.
macro_rules! impl_resource {
    ($type:ident, $spec:ty, $api_version:literal, $kind:literal) => {
        impl nexus_common::kube_utils::HasApiResource for $type {
            const API_VERSION: &'static str = $api_version;
            const KIND: &'static str = $kind;
        }

        impl $type {
            fn default_api_version() -> String {
                $api_version.to_string()
            }

            fn default_kind() -> String {
                $kind.to_string()
            }

            /// Create a new object with the given metadata and spec
            pub fn new(metadata: ObjectMeta, spec: $spec) -> Self {
                Self {
                    api_version: Self::default_api_version(),
                    kind: Self::default_kind(),
                    metadata,
                    spec,
                }
            }
        }
    };
}
pub(crate) use impl_resource;

/// A port given either by number or by name
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum IntOrString {
    /// Port number
    Int(i32),
    /// Named port
    String(String),
}

impl From<i32> for IntOrString {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

/// Label selector
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Exact-match labels
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
}

impl LabelSelector {
    /// Select on exactly these labels
    pub fn new(match_labels: BTreeMap<String, String>) -> Self {
        Self { match_labels }
    }
}
