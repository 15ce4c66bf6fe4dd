//! Core API group types: Service, PersistentVolumeClaim, ServiceAccount

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{impl_resource, IntOrString, ObjectMeta, ResourceList};

// =============================================================================
// Service
// =============================================================================

/// Kubernetes Service
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// API version
    #[serde(default = "Service::default_api_version")]
    pub api_version: String,
    /// Kind
    #[serde(default = "Service::default_kind")]
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: ServiceSpec,
}

impl_resource!(Service, ServiceSpec, "v1", "Service");

/// Service spec
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// Service type (ClusterIP, NodePort)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    /// Pod selector
    #[serde(default)]
    pub selector: BTreeMap<String, String>,
    /// Ports
    #[serde(default)]
    pub ports: Vec<ServicePort>,
}

impl ServiceSpec {
    /// Cluster-internal virtual IP; the Kubernetes default
    pub const CLUSTER_IP: &'static str = "ClusterIP";
    /// Exposed on a port of every node
    pub const NODE_PORT: &'static str = "NodePort";
}

/// Service port
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    /// Port name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Service port
    pub port: i32,
    /// Target port on the pods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<IntOrString>,
    /// Protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Node port, for NodePort services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_port: Option<i32>,
}

// =============================================================================
// PersistentVolumeClaim
// =============================================================================

/// Kubernetes PersistentVolumeClaim
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaim {
    /// API version
    #[serde(default = "PersistentVolumeClaim::default_api_version")]
    pub api_version: String,
    /// Kind
    #[serde(default = "PersistentVolumeClaim::default_kind")]
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: PvcSpec,
}

impl_resource!(PersistentVolumeClaim, PvcSpec, "v1", "PersistentVolumeClaim");

/// PersistentVolumeClaim spec
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PvcSpec {
    /// Access modes
    #[serde(default)]
    pub access_modes: Vec<String>,
    /// Storage request
    #[serde(default)]
    pub resources: PvcResources,
    /// Storage class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
}

impl PvcSpec {
    /// Mountable read-write by a single node
    pub const READ_WRITE_ONCE: &'static str = "ReadWriteOnce";
    /// Mountable read-write by many nodes
    pub const READ_WRITE_MANY: &'static str = "ReadWriteMany";

    /// Requested storage, if any
    pub fn storage_request(&self) -> Option<&str> {
        self.resources.requests.get("storage").map(String::as_str)
    }
}

/// PersistentVolumeClaim resource requests
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PvcResources {
    /// Requests
    #[serde(default)]
    pub requests: ResourceList,
}

// =============================================================================
// ServiceAccount
// =============================================================================

/// Kubernetes ServiceAccount
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    /// API version
    #[serde(default = "ServiceAccount::default_api_version")]
    pub api_version: String,
    /// Kind
    #[serde(default = "ServiceAccount::default_kind")]
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
}

impl nexus_common::kube_utils::HasApiResource for ServiceAccount {
    const API_VERSION: &'static str = "v1";
    const KIND: &'static str = "ServiceAccount";
}

impl ServiceAccount {
    fn default_api_version() -> String {
        "v1".to_string()
    }

    fn default_kind() -> String {
        "ServiceAccount".to_string()
    }

    /// Create a new ServiceAccount
    pub fn new(metadata: ObjectMeta) -> Self {
        Self {
            api_version: Self::default_api_version(),
            kind: Self::default_kind(),
            metadata,
        }
    }
}
