//! Platform capability discovery
//!
//! Answers which optional exposure kinds the cluster serves and whether it
//! is an OpenShift cluster. Probed once per reconciliation pass and treated
//! as read-only afterwards.

use async_trait::async_trait;
use kube::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

/// API group serving OpenShift Routes
pub const ROUTE_GROUP: &str = "route.openshift.io";
/// Kind of the OpenShift Route resource
pub const ROUTE_KIND: &str = "Route";
/// API group serving Kubernetes Ingresses
pub const INGRESS_GROUP: &str = "networking.k8s.io";
/// Kind of the Kubernetes Ingress resource
pub const INGRESS_KIND: &str = "Ingress";
/// API group only present on OpenShift clusters
pub const OPENSHIFT_CONFIG_GROUP: &str = "config.openshift.io";

/// What the current cluster supports
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// OpenShift Routes are served
    pub routes: bool,
    /// Kubernetes Ingresses are served
    pub ingress: bool,
    /// The cluster is OpenShift
    pub openshift: bool,
}

impl Capabilities {
    /// Derive capabilities from the (group, kind) pairs a cluster serves
    pub fn from_served<'a>(served: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut caps = Self::default();
        for (group, kind) in served {
            match (group, kind) {
                (ROUTE_GROUP, ROUTE_KIND) => caps.routes = true,
                (INGRESS_GROUP, INGRESS_KIND) => caps.ingress = true,
                (OPENSHIFT_CONFIG_GROUP, _) => caps.openshift = true,
                _ => {}
            }
        }
        caps
    }
}

/// Source of platform capabilities for a reconciliation pass
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    /// Probe the platform. A failed probe aborts the pass.
    async fn discover(&self) -> Result<Capabilities>;
}

/// Probe backed by Kubernetes API discovery
pub struct KubeCapabilityProbe {
    client: Client,
}

impl KubeCapabilityProbe {
    /// Create a probe over the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CapabilityProbe for KubeCapabilityProbe {
    async fn discover(&self) -> Result<Capabilities> {
        use kube::discovery::Discovery;

        let discovery = Discovery::new(self.client.clone())
            .filter(&[ROUTE_GROUP, INGRESS_GROUP, OPENSHIFT_CONFIG_GROUP])
            .run()
            .await
            .map_err(|e| {
                Error::internal_with_context(
                    "capability discovery",
                    format!("API discovery failed: {e}"),
                )
            })?;

        let mut served = Vec::new();
        for api_group in discovery.groups() {
            for (ar, _caps) in api_group.resources_by_stability() {
                debug!(group = %api_group.name(), kind = %ar.kind, "discovered served kind");
                served.push((api_group.name().to_string(), ar.kind));
            }
        }

        let caps =
            Capabilities::from_served(served.iter().map(|(g, k)| (g.as_str(), k.as_str())));
        info!(
            routes = caps.routes,
            ingress = caps.ingress,
            openshift = caps.openshift,
            "probed platform capabilities"
        );
        Ok(caps)
    }
}

/// Probe returning a fixed answer, for offline rendering
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticCapabilityProbe(pub Capabilities);

#[async_trait]
impl CapabilityProbe for StaticCapabilityProbe {
    async fn discover(&self) -> Result<Capabilities> {
        Ok(self.0)
    }
}
