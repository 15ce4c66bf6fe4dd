//! Persistent storage settings

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Persistence configuration for the Nexus data directory
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceSpec {
    /// Back the data directory with a PersistentVolumeClaim
    #[serde(default)]
    pub persistent: bool,

    /// Requested volume size (e.g., "10Gi")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_size: Option<String>,

    /// Storage class; the cluster default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}
