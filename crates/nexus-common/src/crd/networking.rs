//! External exposure settings

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How the instance is reachable from outside the cluster
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum ExposeAs {
    /// Cluster node port on the instance's Service
    NodePort,
    /// OpenShift Route (host-routed)
    Route,
    /// Kubernetes Ingress (path-based, gateway-routed)
    Ingress,
}

impl ExposeAs {
    /// Canonical string form, as written in a manifest
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodePort => "NodePort",
            Self::Route => "Route",
            Self::Ingress => "Ingress",
        }
    }
}

impl std::fmt::Display for ExposeAs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Networking configuration for a Nexus instance
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkingSpec {
    /// Expose the instance outside the cluster
    #[serde(default)]
    pub expose: bool,

    /// Exposure mechanism; picked from platform capabilities when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expose_as: Option<ExposeAs>,

    /// Host name for Route and Ingress exposure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Node port for NodePort exposure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_port: Option<i32>,

    /// TLS settings for Route and Ingress exposure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsSpec>,
}

/// TLS settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TlsSpec {
    /// Redirect plain HTTP to HTTPS (Route only)
    #[serde(default)]
    pub mandatory: bool,

    /// Secret holding the certificate (Ingress only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
}
