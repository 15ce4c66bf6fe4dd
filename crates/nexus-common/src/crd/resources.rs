//! Compute resource requirements

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// CPU and memory quantities
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ResourceQuantity {
    /// CPU quantity (e.g., "500m", "2")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    /// Memory quantity (e.g., "2Gi")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

impl ResourceQuantity {
    /// True when neither cpu nor memory is set
    pub fn is_empty(&self) -> bool {
        self.cpu.is_none() && self.memory.is_none()
    }
}

/// Resource requests and limits for the Nexus container
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ResourceRequirements {
    /// Requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<ResourceQuantity>,
    /// Limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceQuantity>,
}

impl ResourceRequirements {
    /// True when neither requests nor limits carry a quantity
    pub fn is_empty(&self) -> bool {
        self.requests.as_ref().is_none_or(ResourceQuantity::is_empty)
            && self.limits.as_ref().is_none_or(ResourceQuantity::is_empty)
    }

    /// Memory limit, if one is set
    pub fn memory_limit(&self) -> Option<&str> {
        self.limits.as_ref()?.memory.as_deref()
    }
}
