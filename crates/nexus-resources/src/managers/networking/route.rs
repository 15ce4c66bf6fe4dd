//! OpenShift Route synthesis

use nexus_common::NEXUS_HTTP_PORT;
use tracing::debug;

use crate::comparator::metadata_matches;
use crate::defaults::NormalizedSpec;
use crate::k8s::{
    IntOrString, ObjectMeta, Route, RoutePort, RouteSpec, RouteTargetReference, RouteTls,
};

const TARGET_KIND: &str = "Service";

/// Builds the Route for an instance
///
/// Decorators only touch the TLS block and commute with each other.
pub struct RouteBuilder<'a> {
    spec: &'a NormalizedSpec,
    route: Route,
}

impl<'a> RouteBuilder<'a> {
    /// Base route: `host` to the instance's Service on the HTTP port
    pub fn new(spec: &'a NormalizedSpec, host: &str) -> Self {
        let route = Route::new(
            ObjectMeta::new(&spec.name, &spec.namespace),
            RouteSpec {
                host: Some(host.to_string()),
                to: RouteTargetReference {
                    kind: TARGET_KIND.to_string(),
                    name: spec.name.clone(),
                    weight: None,
                },
                port: Some(RoutePort {
                    target_port: IntOrString::Int(NEXUS_HTTP_PORT),
                }),
                tls: None,
            },
        );
        Self { spec, route }
    }

    /// Terminate TLS at the router
    pub fn with_edge_tls(mut self) -> Self {
        let insecure = self
            .route
            .spec
            .tls
            .take()
            .and_then(|tls| tls.insecure_edge_termination_policy);
        self.route.spec.tls = Some(RouteTls {
            termination: RouteTls::EDGE.to_string(),
            insecure_edge_termination_policy: insecure,
        });
        self
    }

    /// Redirect plain HTTP to HTTPS
    pub fn with_redirect(mut self) -> Self {
        let termination = self
            .route
            .spec
            .tls
            .take()
            .map(|tls| tls.termination)
            .unwrap_or_else(|| RouteTls::EDGE.to_string());
        self.route.spec.tls = Some(RouteTls {
            termination,
            insecure_edge_termination_policy: Some(RouteTls::REDIRECT.to_string()),
        });
        self
    }

    /// Finish the route
    pub fn build(self) -> Route {
        debug!(
            instance = %self.spec.name,
            tls = self.route.spec.tls.is_some(),
            "built route"
        );
        self.route
    }
}

/// Compare host, backend, port and TLS. The router-assigned weight only
/// counts when one was requested.
pub fn route_matches(deployed: &Route, requested: &Route) -> bool {
    let (d, r) = (&deployed.spec, &requested.spec);

    metadata_matches(&deployed.metadata, &requested.metadata)
        && d.host == r.host
        && d.to.kind == r.to.kind
        && d.to.name == r.to.name
        && (r.to.weight.is_none() || d.to.weight == r.to.weight)
        && d.port == r.port
        && d.tls == r.tls
}
