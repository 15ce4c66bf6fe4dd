//! Network exposure manager
//!
//! Exposure is one of: none, a node port on the instance's Service, an
//! OpenShift Route, or a Kubernetes Ingress. Route and Ingress are built
//! through builders whose decorators are pure and commute.

use async_trait::async_trait;
use futures::try_join;
use nexus_common::crd::ExposeAs;
use nexus_common::{Capabilities, Error};
use tracing::debug;

use super::ResourceManager;
use crate::comparator::{typed_comparator, Comparator};
use crate::defaults::{NormalizedNetworking, NormalizedSpec};
use crate::k8s::{Service, ServiceSpec};
use crate::resource::{ManagedResource, ResourceKind};
use crate::store::{fetch, ObjectStore};

mod ingress;
mod route;

pub use ingress::{ingress_matches, IngressBuilder, INGRESS_PATH, REWRITE_TARGET_ANNOTATION};
pub use route::{route_matches, RouteBuilder};

/// Turn the Service into a NodePort service when node port exposure is on.
///
/// The Service itself belongs to the compute manager; this is the only
/// effect node port exposure has on the object graph.
pub fn apply_node_port(mut service: Service, networking: &NormalizedNetworking) -> Service {
    if networking.exposure() != Some(ExposeAs::NodePort) {
        return service;
    }
    service.spec.type_ = Some(ServiceSpec::NODE_PORT.to_string());
    for port in &mut service.spec.ports {
        port.node_port = Some(networking.node_port);
    }
    service
}

/// Produces and compares the exposure objects of an instance
pub struct NetworkManager<'a> {
    spec: &'a NormalizedSpec,
    capabilities: Capabilities,
}

impl<'a> NetworkManager<'a> {
    /// Create a manager for the given spec and platform
    pub fn new(spec: &'a NormalizedSpec, capabilities: Capabilities) -> Self {
        Self { spec, capabilities }
    }

    fn require_host(&self) -> Result<&'a str, Error> {
        self.spec.networking.host.as_deref().ok_or_else(|| {
            Error::validation_for_field(
                &self.spec.name,
                "spec.networking.host",
                format!(
                    "host is required when exposing as {}",
                    self.spec.networking.expose_as.map_or("", |e| e.as_str())
                ),
            )
        })
    }

    fn require_capability(&self, available: bool, kind: ResourceKind) -> Result<(), Error> {
        if available {
            Ok(())
        } else {
            Err(Error::capability_unavailable(&self.spec.name, kind.as_str()))
        }
    }
}

#[async_trait]
impl<'a> ResourceManager for NetworkManager<'a> {
    fn name(&self) -> &'static str {
        "network"
    }

    fn kinds(&self) -> &'static [ResourceKind] {
        &[ResourceKind::Route, ResourceKind::Ingress]
    }

    fn required(&self) -> Result<Vec<ManagedResource>, Error> {
        let networking = &self.spec.networking;

        match networking.exposure() {
            None => Ok(Vec::new()),
            Some(ExposeAs::NodePort) => {
                if networking.node_port <= 0 {
                    return Err(Error::validation_for_field(
                        &self.spec.name,
                        "spec.networking.nodePort",
                        "a node port is required when exposing as NodePort",
                    ));
                }
                Ok(Vec::new())
            }
            Some(ExposeAs::Route) => {
                self.require_capability(self.capabilities.routes, ResourceKind::Route)?;
                let host = self.require_host()?;

                let mut builder = RouteBuilder::new(self.spec, host);
                if networking.tls.mandatory {
                    builder = builder.with_edge_tls().with_redirect();
                }
                Ok(vec![builder.build().into()])
            }
            Some(ExposeAs::Ingress) => {
                self.require_capability(self.capabilities.ingress, ResourceKind::Ingress)?;
                let host = self.require_host()?;

                let mut builder = IngressBuilder::new(self.spec, host);
                if let Some(ref secret) = networking.tls.secret_name {
                    builder = builder.with_tls_secret(secret);
                }
                Ok(vec![builder.build().into()])
            }
        }
    }

    /// Exposure objects are looked up whenever the platform serves their
    /// kind, so switching modes leaves the old object visible for deletion.
    async fn deployed(&self, store: &dyn ObjectStore) -> Result<Vec<ManagedResource>, Error> {
        let (namespace, name) = (&self.spec.namespace, &self.spec.name);

        let route = async {
            if self.capabilities.routes {
                fetch(store, ResourceKind::Route, namespace, name).await
            } else {
                Ok(None)
            }
        };
        let ingress = async {
            if self.capabilities.ingress {
                fetch(store, ResourceKind::Ingress, namespace, name).await
            } else {
                Ok(None)
            }
        };

        let (route, ingress) = try_join!(route, ingress)?;
        debug!(
            instance = %name,
            route = route.is_some(),
            ingress = ingress.is_some(),
            "fetched exposure objects"
        );
        Ok(route.into_iter().chain(ingress).collect())
    }

    fn comparators(&self) -> Vec<(ResourceKind, Comparator)> {
        vec![
            (ResourceKind::Route, typed_comparator!(Route, route_matches)),
            (
                ResourceKind::Ingress,
                typed_comparator!(Ingress, ingress_matches),
            ),
        ]
    }
}
