//! Shared Kubernetes utilities using kube-rs
//!
//! Metadata shared by every synthesized object and helpers for building the
//! `ApiResource` needed to address a kind dynamically.

use std::collections::BTreeMap;

use kube::discovery::ApiResource;

// =============================================================================
// ObjectMeta - Canonical metadata for every synthesized object
// =============================================================================

/// Standard Kubernetes ObjectMeta for synthesized resources.
///
/// Only the fields the operator owns are modelled. Server-populated metadata
/// (uid, resourceVersion, managedFields, ...) is dropped on deserialization,
/// so a fetched object compares cleanly against a synthesized one.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Resource name
    pub name: String,
    /// Resource namespace
    #[serde(default)]
    pub namespace: String,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Create new metadata carrying the standard labels for a Nexus instance
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            labels: instance_labels(&name),
            name,
            namespace: namespace.into(),
            annotations: BTreeMap::new(),
        }
    }

    /// Create metadata for an object owned by `instance` but named differently
    pub fn for_instance(
        name: impl Into<String>,
        namespace: impl Into<String>,
        instance: &str,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels: instance_labels(instance),
            annotations: BTreeMap::new(),
        }
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

/// Labels stamped on every object and pod belonging to a Nexus instance
pub fn instance_labels(instance: &str) -> BTreeMap<String, String> {
    let mut labels = selector_labels(instance);
    labels.insert(crate::LABEL_NAME.to_string(), instance.to_string());
    labels.insert(
        crate::LABEL_MANAGED_BY.to_string(),
        crate::LABEL_MANAGED_BY_NEXUS.to_string(),
    );
    labels
}

/// Labels used by the Deployment and Service to select the instance's pods
pub fn selector_labels(instance: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(crate::LABEL_APP.to_string(), instance.to_string())])
}

// =============================================================================
// HasApiResource Trait
// =============================================================================

/// Trait for types that have a known API group, version, and kind.
///
/// # Example
/// ```ignore
/// impl HasApiResource for Route {
///     const API_VERSION: &'static str = "route.openshift.io/v1";
///     const KIND: &'static str = "Route";
/// }
///
/// let ar = Route::api_resource();
/// ```
pub trait HasApiResource {
    /// Full API version (e.g., "apps/v1", "v1")
    const API_VERSION: &'static str;
    /// Resource kind (e.g., "Deployment")
    const KIND: &'static str;

    /// Build an ApiResource from the type's constants.
    fn api_resource() -> ApiResource {
        build_api_resource(Self::API_VERSION, Self::KIND)
    }
}

/// Build an ApiResource from an apiVersion string and kind.
pub fn build_api_resource(api_version: &str, kind: &str) -> ApiResource {
    let (group, version) = parse_api_version(api_version);
    ApiResource {
        group,
        version,
        kind: kind.to_string(),
        api_version: api_version.to_string(),
        plural: pluralize_kind(kind),
    }
}

/// Split an apiVersion into (group, version); the core group is empty.
pub fn parse_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

const KIND_PLURALS: &[(&str, &str)] = &[
    ("ingress", "ingresses"),
    ("persistentvolumeclaim", "persistentvolumeclaims"),
    ("rolebinding", "rolebindings"),
];

/// Lowercase plural resource name for a kind
pub fn pluralize_kind(kind: &str) -> String {
    let lower = kind.to_lowercase();

    for (singular, plural) in KIND_PLURALS {
        if *singular == lower {
            return (*plural).to_string();
        }
    }

    if lower.ends_with('s') || lower.ends_with("ch") || lower.ends_with("sh") {
        format!("{}es", lower)
    } else if lower.ends_with('y') && !lower.ends_with("ay") && !lower.ends_with("ey") {
        format!("{}ies", &lower[..lower.len() - 1])
    } else {
        format!("{}s", lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_metadata_carries_instance_labels() {
        let meta = ObjectMeta::new("nexus3", "tools");

        assert_eq!(meta.name, "nexus3");
        assert_eq!(meta.namespace, "tools");
        assert_eq!(meta.labels.get(crate::LABEL_APP), Some(&"nexus3".to_string()));
        assert_eq!(
            meta.labels.get(crate::LABEL_MANAGED_BY),
            Some(&crate::LABEL_MANAGED_BY_NEXUS.to_string())
        );
        assert!(meta.annotations.is_empty());
    }

    #[test]
    fn for_instance_labels_by_owner_not_name() {
        let meta = ObjectMeta::for_instance("nexus3-data", "tools", "nexus3");
        assert_eq!(meta.name, "nexus3-data");
        assert_eq!(meta.labels.get(crate::LABEL_NAME), Some(&"nexus3".to_string()));
    }

    #[test]
    fn server_metadata_is_dropped_on_deserialize() {
        let meta: ObjectMeta = serde_json::from_value(serde_json::json!({
            "name": "nexus3",
            "namespace": "tools",
            "uid": "abc",
            "resourceVersion": "42",
            "labels": {"app": "nexus3"}
        }))
        .expect("metadata should deserialize");

        assert_eq!(meta.name, "nexus3");
        assert_eq!(meta.labels.len(), 1);
        assert!(meta.annotations.is_empty());
    }

    #[test]
    fn api_resources_for_core_and_grouped_kinds() {
        let ar = build_api_resource("v1", "Service");
        assert_eq!(ar.group, "");
        assert_eq!(ar.version, "v1");
        assert_eq!(ar.plural, "services");

        let ar = build_api_resource("networking.k8s.io/v1", "Ingress");
        assert_eq!(ar.group, "networking.k8s.io");
        assert_eq!(ar.plural, "ingresses");

        let ar = build_api_resource("route.openshift.io/v1", "Route");
        assert_eq!(ar.plural, "routes");
    }

    #[test]
    fn pluralize_handles_known_and_regular_kinds() {
        assert_eq!(pluralize_kind("PersistentVolumeClaim"), "persistentvolumeclaims");
        assert_eq!(pluralize_kind("ServiceAccount"), "serviceaccounts");
        assert_eq!(pluralize_kind("Deployment"), "deployments");
        assert_eq!(pluralize_kind("Policy"), "policies");
    }
}
