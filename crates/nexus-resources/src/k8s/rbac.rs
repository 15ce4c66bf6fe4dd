//! RBAC types for the instance's Role and RoleBinding

use serde::{Deserialize, Serialize};

use nexus_common::kube_utils::HasApiResource;

use super::ObjectMeta;

/// Kubernetes Role
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Granted rules
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

impl HasApiResource for Role {
    const API_VERSION: &'static str = "rbac.authorization.k8s.io/v1";
    const KIND: &'static str = "Role";
}

impl Role {
    /// Create a new Role
    pub fn new(metadata: ObjectMeta, rules: Vec<PolicyRule>) -> Self {
        Self {
            api_version: Self::API_VERSION.to_string(),
            kind: Self::KIND.to_string(),
            metadata,
            rules,
        }
    }
}

/// A single RBAC rule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    /// API groups
    pub api_groups: Vec<String>,
    /// Resources
    pub resources: Vec<String>,
    /// Verbs
    pub verbs: Vec<String>,
}

impl PolicyRule {
    /// Rule granting `verbs` on `resources` in `api_groups`
    pub fn new(api_groups: &[&str], resources: &[&str], verbs: &[&str]) -> Self {
        let owned = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            api_groups: owned(api_groups),
            resources: owned(resources),
            verbs: owned(verbs),
        }
    }
}

/// Kubernetes RoleBinding
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Role being granted
    pub role_ref: RoleRef,
    /// Identities receiving the role
    pub subjects: Vec<Subject>,
}

impl HasApiResource for RoleBinding {
    const API_VERSION: &'static str = "rbac.authorization.k8s.io/v1";
    const KIND: &'static str = "RoleBinding";
}

impl RoleBinding {
    /// Create a new RoleBinding
    pub fn new(metadata: ObjectMeta, role_ref: RoleRef, subjects: Vec<Subject>) -> Self {
        Self {
            api_version: Self::API_VERSION.to_string(),
            kind: Self::KIND.to_string(),
            metadata,
            role_ref,
            subjects,
        }
    }
}

/// Reference to the bound role
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    /// API group of the role
    pub api_group: String,
    /// Role kind
    pub kind: String,
    /// Role name
    pub name: String,
}

/// Identity bound to a role
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Subject kind
    pub kind: String,
    /// Subject name
    pub name: String,
    /// Subject namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}
