//! Kubernetes Ingress synthesis

use nexus_common::NEXUS_HTTP_PORT;
use tracing::debug;

use crate::comparator::metadata_matches;
use crate::defaults::NormalizedSpec;
use crate::k8s::{
    HttpIngressRuleValue, Ingress, IngressBackend, IngressPath, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTls, ObjectMeta, ServiceBackendPort,
};

/// Path captured and forwarded to the Nexus root
pub const INGRESS_PATH: &str = "/?(.*)";

/// Annotation rewriting the captured path for ingress-nginx
pub const REWRITE_TARGET_ANNOTATION: &str = "nginx.ingress.kubernetes.io/rewrite-target";

const REWRITE_TARGET: &str = "/$1";
const PATH_TYPE: &str = "ImplementationSpecific";

/// Builds the Ingress for an instance
pub struct IngressBuilder<'a> {
    spec: &'a NormalizedSpec,
    ingress: Ingress,
}

impl<'a> IngressBuilder<'a> {
    /// Base ingress: one rule for `host` forwarding every path to the
    /// instance's Service
    pub fn new(spec: &'a NormalizedSpec, host: &str) -> Self {
        let rule = IngressRule {
            host: Some(host.to_string()),
            http: Some(HttpIngressRuleValue {
                paths: vec![IngressPath {
                    path: Some(INGRESS_PATH.to_string()),
                    path_type: PATH_TYPE.to_string(),
                    backend: IngressBackend {
                        service: Some(IngressServiceBackend {
                            name: spec.name.clone(),
                            port: ServiceBackendPort {
                                number: Some(NEXUS_HTTP_PORT),
                                name: None,
                            },
                        }),
                    },
                }],
            }),
        };

        let ingress = Ingress::new(
            ObjectMeta::new(&spec.name, &spec.namespace)
                .with_annotation(REWRITE_TARGET_ANNOTATION, REWRITE_TARGET),
            IngressSpec {
                rules: vec![rule],
                tls: Vec::new(),
            },
        );
        Self { spec, ingress }
    }

    /// Serve TLS from `secret_name` for every host the rules cover
    pub fn with_tls_secret(mut self, secret_name: &str) -> Self {
        let hosts = self
            .ingress
            .spec
            .rules
            .iter()
            .filter_map(|rule| rule.host.clone())
            .collect();
        self.ingress.spec.tls = vec![IngressTls {
            hosts,
            secret_name: Some(secret_name.to_string()),
        }];
        self
    }

    /// Finish the ingress
    pub fn build(self) -> Ingress {
        debug!(
            instance = %self.spec.name,
            tls = !self.ingress.spec.tls.is_empty(),
            "built ingress"
        );
        self.ingress
    }
}

/// Compare rules and TLS; annotations added by ingress controllers are ignored.
pub fn ingress_matches(deployed: &Ingress, requested: &Ingress) -> bool {
    metadata_matches(&deployed.metadata, &requested.metadata)
        && deployed.spec.rules == requested.spec.rules
        && deployed.spec.tls == requested.spec.tls
}
