//! Compute manager: the Nexus Deployment and its Service

use async_trait::async_trait;
use futures::try_join;
use nexus_common::crd::{ProbeSpec, PullPolicy};
use nexus_common::kube_utils::{instance_labels, selector_labels};
use nexus_common::{Error, NEXUS_DATA_DIR, NEXUS_HTTP_PORT, NEXUS_PORT_NAME, NEXUS_UID};
use tracing::debug;

use super::jvm::{jvm_params, JVM_PARAMS_ENV};
use super::networking::apply_node_port;
use super::ResourceManager;
use crate::comparator::{metadata_matches, resource_lists_match, typed_comparator, Comparator};
use crate::defaults::NormalizedSpec;
use crate::image::effective_pull_policy;
use crate::k8s::{
    Container, ContainerPort, Deployment, DeploymentSpec, DeploymentStrategy, EnvVar,
    HttpGetAction, IntOrString, LabelSelector, ObjectMeta, PodSecurityContext, PodSpec,
    PodTemplateMeta, PodTemplateSpec, Probe, ResourceRequirements, Service, ServicePort,
    ServiceSpec, Volume, VolumeMount,
};
use crate::resource::{ManagedResource, ResourceKind};
use crate::store::{fetch, ObjectStore};

/// Name of the single Nexus container
pub const CONTAINER_NAME: &str = "nexus-server";

/// Health endpoint probed for liveness and readiness
pub const HEALTH_PATH: &str = "/service/rest/v1/status";

const PROTOCOL_TCP: &str = "TCP";
const SCHEME_HTTP: &str = "HTTP";

/// Name of the pod volume backed by the instance's claim
pub fn data_volume_name(instance: &str) -> String {
    format!("{instance}-data")
}

/// Produces and compares the Deployment and Service of an instance
pub struct ComputeManager<'a> {
    spec: &'a NormalizedSpec,
}

impl<'a> ComputeManager<'a> {
    /// Create a manager for the given spec
    pub fn new(spec: &'a NormalizedSpec) -> Self {
        Self { spec }
    }

    /// Build the Deployment
    pub fn build_deployment(&self) -> Deployment {
        let spec = self.spec;
        let persistent = spec.persistence.persistent;

        let volumes = if persistent {
            vec![Volume::from_pvc(data_volume_name(&spec.name), &spec.name)]
        } else {
            Vec::new()
        };

        let strategy = if persistent && spec.replicas == 1 {
            DeploymentStrategy::RECREATE
        } else {
            DeploymentStrategy::ROLLING_UPDATE
        };

        Deployment::new(
            ObjectMeta::new(&spec.name, &spec.namespace),
            DeploymentSpec {
                replicas: spec.replicas as i32,
                selector: LabelSelector::new(selector_labels(&spec.name)),
                template: PodTemplateSpec {
                    metadata: PodTemplateMeta {
                        labels: instance_labels(&spec.name),
                    },
                    spec: PodSpec {
                        service_account_name: Some(spec.service_account_name.clone()),
                        containers: vec![self.build_container()],
                        volumes,
                        security_context: self.security_context(),
                    },
                },
                strategy: Some(DeploymentStrategy::of_type(strategy)),
            },
        )
    }

    fn build_container(&self) -> Container {
        let spec = self.spec;

        let volume_mounts = if spec.persistence.persistent {
            vec![VolumeMount {
                name: data_volume_name(&spec.name),
                mount_path: NEXUS_DATA_DIR.to_string(),
            }]
        } else {
            Vec::new()
        };

        let pull_policy = effective_pull_policy(spec.image_pull_policy, &spec.image);

        Container {
            name: CONTAINER_NAME.to_string(),
            image: spec.image.clone(),
            image_pull_policy: Some(pull_policy.as_str().to_string()),
            env: vec![EnvVar::literal(
                JVM_PARAMS_ENV,
                jvm_params(
                    spec.resources.memory_limit(),
                    spec.generate_random_admin_password,
                ),
            )],
            ports: vec![ContainerPort {
                name: Some(NEXUS_PORT_NAME.to_string()),
                container_port: NEXUS_HTTP_PORT,
                protocol: Some(PROTOCOL_TCP.to_string()),
            }],
            resources: Some(ResourceRequirements::from(&spec.resources)),
            liveness_probe: Some(build_probe(&spec.liveness_probe)),
            readiness_probe: Some(build_probe(&spec.readiness_probe)),
            volume_mounts,
        }
    }

    /// The certified image manages its own data directory permissions when a
    /// volume is attached, so the fixed UID is left out in that case only.
    fn security_context(&self) -> Option<PodSecurityContext> {
        if self.spec.use_red_hat_image && self.spec.persistence.persistent {
            return None;
        }
        Some(PodSecurityContext {
            run_as_user: Some(NEXUS_UID),
            fs_group: Some(NEXUS_UID),
            supplemental_groups: vec![NEXUS_UID],
        })
    }

    /// Build the Service in front of the pods
    pub fn build_service(&self) -> Service {
        let spec = self.spec;
        let service = Service::new(
            ObjectMeta::new(&spec.name, &spec.namespace),
            ServiceSpec {
                type_: Some(ServiceSpec::CLUSTER_IP.to_string()),
                selector: selector_labels(&spec.name),
                ports: vec![ServicePort {
                    name: Some(NEXUS_PORT_NAME.to_string()),
                    port: NEXUS_HTTP_PORT,
                    target_port: Some(IntOrString::Int(NEXUS_HTTP_PORT)),
                    protocol: Some(PROTOCOL_TCP.to_string()),
                    node_port: None,
                }],
            },
        );
        apply_node_port(service, &spec.networking)
    }
}

fn build_probe(probe: &ProbeSpec) -> Probe {
    Probe {
        http_get: Some(HttpGetAction {
            path: HEALTH_PATH.to_string(),
            port: IntOrString::Int(NEXUS_HTTP_PORT),
            scheme: Some(SCHEME_HTTP.to_string()),
        }),
        initial_delay_seconds: Some(probe.initial_delay_seconds),
        timeout_seconds: Some(probe.timeout_seconds),
        period_seconds: Some(probe.period_seconds),
        success_threshold: Some(probe.success_threshold),
        failure_threshold: Some(probe.failure_threshold),
    }
}

#[async_trait]
impl<'a> ResourceManager for ComputeManager<'a> {
    fn name(&self) -> &'static str {
        "compute"
    }

    fn kinds(&self) -> &'static [ResourceKind] {
        &[ResourceKind::Deployment, ResourceKind::Service]
    }

    fn required(&self) -> Result<Vec<ManagedResource>, Error> {
        Ok(vec![
            self.build_deployment().into(),
            self.build_service().into(),
        ])
    }

    async fn deployed(&self, store: &dyn ObjectStore) -> Result<Vec<ManagedResource>, Error> {
        let (namespace, name) = (&self.spec.namespace, &self.spec.name);
        let (deployment, service) = try_join!(
            fetch(store, ResourceKind::Deployment, namespace, name),
            fetch(store, ResourceKind::Service, namespace, name),
        )?;
        debug!(
            instance = %name,
            deployment = deployment.is_some(),
            service = service.is_some(),
            "fetched compute objects"
        );
        Ok(deployment.into_iter().chain(service).collect())
    }

    fn comparators(&self) -> Vec<(ResourceKind, Comparator)> {
        vec![
            (
                ResourceKind::Deployment,
                typed_comparator!(Deployment, deployment_matches),
            ),
            (
                ResourceKind::Service,
                typed_comparator!(Service, service_matches),
            ),
        ]
    }
}

// =============================================================================
// Comparators
// =============================================================================

const DEFAULT_TIMEOUT_SECONDS: i32 = 1;
const DEFAULT_PERIOD_SECONDS: i32 = 10;
const DEFAULT_SUCCESS_THRESHOLD: i32 = 1;
const DEFAULT_FAILURE_THRESHOLD: i32 = 3;

/// Compare the fields the operator sets, with API server defaults applied to
/// both sides.
pub fn deployment_matches(deployed: &Deployment, requested: &Deployment) -> bool {
    let (d, r) = (&deployed.spec, &requested.spec);
    let (dp, rp) = (&d.template.spec, &r.template.spec);

    let strategy_type = |s: &Option<DeploymentStrategy>| {
        s.as_ref()
            .and_then(|s| s.type_.clone())
            .unwrap_or_else(|| DeploymentStrategy::ROLLING_UPDATE.to_string())
    };

    // A security context left unset by us is whatever the platform injected.
    let security_context_matches = rp.security_context.is_none()
        || dp.security_context == rp.security_context;

    metadata_matches(&deployed.metadata, &requested.metadata)
        && d.replicas == r.replicas
        && d.selector == r.selector
        && r.template
            .metadata
            .labels
            .iter()
            .all(|(k, v)| d.template.metadata.labels.get(k) == Some(v))
        && dp.service_account_name == rp.service_account_name
        && dp.volumes == rp.volumes
        && security_context_matches
        && strategy_type(&d.strategy) == strategy_type(&r.strategy)
        && dp.containers.len() == rp.containers.len()
        && dp
            .containers
            .iter()
            .zip(&rp.containers)
            .all(|(dc, rc)| container_matches(dc, rc))
}

fn container_matches(deployed: &Container, requested: &Container) -> bool {
    let policy = |c: &Container| {
        effective_pull_policy(
            c.image_pull_policy.as_deref().and_then(PullPolicy::parse),
            &c.image,
        )
    };
    let resources = |c: &Container| c.resources.clone().unwrap_or_default();
    let (dr, rr) = (resources(deployed), resources(requested));

    deployed.name == requested.name
        && deployed.image == requested.image
        && policy(deployed) == policy(requested)
        && deployed.env == requested.env
        && deployed.ports.len() == requested.ports.len()
        && deployed
            .ports
            .iter()
            .zip(&requested.ports)
            .all(|(d, r)| container_port_matches(d, r))
        && resource_lists_match(&dr.requests, &rr.requests)
        && resource_lists_match(&dr.limits, &rr.limits)
        && probe_matches(deployed.liveness_probe.as_ref(), requested.liveness_probe.as_ref())
        && probe_matches(deployed.readiness_probe.as_ref(), requested.readiness_probe.as_ref())
        && deployed.volume_mounts == requested.volume_mounts
}

fn container_port_matches(deployed: &ContainerPort, requested: &ContainerPort) -> bool {
    let protocol = |p: &ContainerPort| {
        p.protocol
            .clone()
            .unwrap_or_else(|| PROTOCOL_TCP.to_string())
    };
    deployed.name == requested.name
        && deployed.container_port == requested.container_port
        && protocol(deployed) == protocol(requested)
}

fn probe_matches(deployed: Option<&Probe>, requested: Option<&Probe>) -> bool {
    match (deployed, requested) {
        (None, None) => true,
        (Some(d), Some(r)) => {
            let action = |p: &Probe| {
                p.http_get.as_ref().map(|h| {
                    (
                        h.path.clone(),
                        h.port.clone(),
                        h.scheme.clone().unwrap_or_else(|| SCHEME_HTTP.to_string()),
                    )
                })
            };
            action(d) == action(r)
                && d.initial_delay_seconds.unwrap_or(0) == r.initial_delay_seconds.unwrap_or(0)
                && d.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
                    == r.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
                && d.period_seconds.unwrap_or(DEFAULT_PERIOD_SECONDS)
                    == r.period_seconds.unwrap_or(DEFAULT_PERIOD_SECONDS)
                && d.success_threshold.unwrap_or(DEFAULT_SUCCESS_THRESHOLD)
                    == r.success_threshold.unwrap_or(DEFAULT_SUCCESS_THRESHOLD)
                && d.failure_threshold.unwrap_or(DEFAULT_FAILURE_THRESHOLD)
                    == r.failure_threshold.unwrap_or(DEFAULT_FAILURE_THRESHOLD)
        }
        _ => false,
    }
}

/// Compare Service fields the operator sets. The cluster IP and any node
/// port the API server allocated on its own are ignored.
pub fn service_matches(deployed: &Service, requested: &Service) -> bool {
    let service_type = |s: &Service| {
        s.spec
            .type_
            .clone()
            .unwrap_or_else(|| ServiceSpec::CLUSTER_IP.to_string())
    };

    metadata_matches(&deployed.metadata, &requested.metadata)
        && service_type(deployed) == service_type(requested)
        && deployed.spec.selector == requested.spec.selector
        && deployed.spec.ports.len() == requested.spec.ports.len()
        && deployed
            .spec
            .ports
            .iter()
            .zip(&requested.spec.ports)
            .all(|(d, r)| service_port_matches(d, r))
}

fn service_port_matches(deployed: &ServicePort, requested: &ServicePort) -> bool {
    let protocol = |p: &ServicePort| {
        p.protocol
            .clone()
            .unwrap_or_else(|| PROTOCOL_TCP.to_string())
    };
    let target = |p: &ServicePort| p.target_port.clone().unwrap_or(IntOrString::Int(p.port));

    deployed.name == requested.name
        && deployed.port == requested.port
        && protocol(deployed) == protocol(requested)
        && target(deployed) == target(requested)
        && (requested.node_port.is_none() || deployed.node_port == requested.node_port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::normalize;
    use nexus_common::crd::{
        ExposeAs, NetworkingSpec, NexusSpec, PersistenceSpec, ResourceQuantity,
        ResourceRequirements as SpecResources,
    };
    use nexus_common::{Capabilities, LABEL_APP};

    fn normalized(spec: NexusSpec) -> NormalizedSpec {
        normalize("nexus3", "tools", &spec, &Capabilities::default())
    }

    fn persistent() -> Option<PersistenceSpec> {
        Some(PersistenceSpec {
            persistent: true,
            ..Default::default()
        })
    }

    fn container(deployment: &Deployment) -> &Container {
        deployment
            .spec
            .template
            .spec
            .containers
            .first()
            .expect("should have a container")
    }

    // ==========================================================================
    // Story: A default instance runs one Nexus container on port 8081
    // ==========================================================================

    #[test]
    fn default_deployment_shape() {
        let spec = normalized(NexusSpec::default());
        let deployment = ComputeManager::new(&spec).build_deployment();

        assert_eq!(deployment.api_version, "apps/v1");
        assert_eq!(deployment.kind, "Deployment");
        assert_eq!(deployment.metadata.name, "nexus3");
        assert_eq!(deployment.metadata.namespace, "tools");
        assert_eq!(deployment.spec.replicas, 1);
        assert_eq!(
            deployment.spec.selector.match_labels.get(LABEL_APP),
            Some(&"nexus3".to_string())
        );
        assert_eq!(
            deployment.spec.template.spec.service_account_name.as_deref(),
            Some("nexus3")
        );

        let c = container(&deployment);
        assert_eq!(c.name, CONTAINER_NAME);
        assert_eq!(c.image, "docker.io/sonatype/nexus3:latest");
        assert_eq!(c.ports.len(), 1);
        assert_eq!(c.ports[0].container_port, 8081);
        assert_eq!(c.ports[0].name.as_deref(), Some("http"));
        assert_eq!(c.ports[0].protocol.as_deref(), Some("TCP"));
        assert!(c.volume_mounts.is_empty());
        assert!(deployment.spec.template.spec.volumes.is_empty());
    }

    #[test]
    fn jvm_params_are_injected() {
        let spec = normalized(NexusSpec::default());
        let deployment = ComputeManager::new(&spec).build_deployment();

        let env = &container(&deployment).env;
        assert_eq!(env.len(), 1);
        assert_eq!(env[0].name, JVM_PARAMS_ENV);
        assert_eq!(
            env[0].value.as_deref(),
            Some(
                "-Djava.util.prefs.userRoot=/nexus-data/javaprefs \
                 -Dnexus.security.randompassword=false \
                 -XX:MaxDirectMemorySize=2148m -Xms1718m -Xmx1718m"
            )
        );
    }

    #[test]
    fn jvm_params_follow_the_memory_limit() {
        let spec = normalized(NexusSpec {
            resources: Some(SpecResources {
                requests: None,
                limits: Some(ResourceQuantity {
                    cpu: Some("4".to_string()),
                    memory: Some("4Gi".to_string()),
                }),
            }),
            ..Default::default()
        });
        let deployment = ComputeManager::new(&spec).build_deployment();
        let value = container(&deployment).env[0]
            .value
            .clone()
            .expect("env should have a value");
        assert!(value.contains("-Xmx3436m"));

        let resources = container(&deployment)
            .resources
            .as_ref()
            .expect("should have resources");
        assert_eq!(resources.limits.get("memory").map(String::as_str), Some("4Gi"));
        assert!(resources.requests.is_empty());
    }

    #[test]
    fn two_builds_are_identical() {
        let spec = normalized(NexusSpec {
            generate_random_admin_password: true,
            persistence: persistent(),
            ..Default::default()
        });
        let manager = ComputeManager::new(&spec);
        assert_eq!(manager.build_deployment(), manager.build_deployment());
        assert_eq!(manager.build_service(), manager.build_service());
    }

    // ==========================================================================
    // Story: Probes hit the status endpoint with the tuned timings
    // ==========================================================================

    #[test]
    fn probes_use_normalized_values() {
        let spec = normalized(NexusSpec {
            liveness_probe: Some(ProbeSpec {
                initial_delay_seconds: 240,
                timeout_seconds: 0,
                period_seconds: 20,
                success_threshold: 1,
                failure_threshold: 0,
            }),
            ..Default::default()
        });
        let deployment = ComputeManager::new(&spec).build_deployment();
        let c = container(&deployment);

        let liveness = c.liveness_probe.as_ref().expect("should have liveness");
        let http = liveness.http_get.as_ref().expect("should be http");
        assert_eq!(http.path, HEALTH_PATH);
        assert_eq!(http.port, IntOrString::Int(8081));
        assert_eq!(liveness.initial_delay_seconds, Some(240));
        assert_eq!(liveness.timeout_seconds, Some(1));
        assert_eq!(liveness.failure_threshold, Some(1));

        let readiness = c.readiness_probe.as_ref().expect("should have readiness");
        assert_eq!(readiness.initial_delay_seconds, Some(30));
        assert_eq!(readiness.period_seconds, Some(10));
    }

    // ==========================================================================
    // Story: Persistence mounts the claim at the data directory
    // ==========================================================================

    #[test]
    fn persistence_mounts_the_claim() {
        let spec = normalized(NexusSpec {
            persistence: persistent(),
            ..Default::default()
        });
        let deployment = ComputeManager::new(&spec).build_deployment();

        let volumes = &deployment.spec.template.spec.volumes;
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].name, "nexus3-data");
        assert_eq!(
            volumes[0]
                .persistent_volume_claim
                .as_ref()
                .map(|p| p.claim_name.as_str()),
            Some("nexus3")
        );

        let mounts = &container(&deployment).volume_mounts;
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].name, "nexus3-data");
        assert_eq!(mounts[0].mount_path, "/nexus-data");
    }

    #[test]
    fn single_persistent_replica_uses_recreate() {
        let spec = normalized(NexusSpec {
            persistence: persistent(),
            ..Default::default()
        });
        let deployment = ComputeManager::new(&spec).build_deployment();
        assert_eq!(
            deployment.spec.strategy.and_then(|s| s.type_).as_deref(),
            Some("Recreate")
        );

        let spec = normalized(NexusSpec {
            replicas: 3,
            persistence: persistent(),
            ..Default::default()
        });
        let deployment = ComputeManager::new(&spec).build_deployment();
        assert_eq!(
            deployment.spec.strategy.and_then(|s| s.type_).as_deref(),
            Some("RollingUpdate")
        );
    }

    // ==========================================================================
    // Story: Only certified image plus persistence drops the security context
    // ==========================================================================

    #[test]
    fn security_context_exemption() {
        let cases = [
            (false, false, true),
            (false, true, true),
            (true, false, true),
            (true, true, false),
        ];

        for (use_red_hat_image, persistent_volume, expect_context) in cases {
            let spec = normalized(NexusSpec {
                use_red_hat_image,
                persistence: Some(PersistenceSpec {
                    persistent: persistent_volume,
                    ..Default::default()
                }),
                ..Default::default()
            });
            let deployment = ComputeManager::new(&spec).build_deployment();
            let context = deployment.spec.template.spec.security_context;

            assert_eq!(
                context.is_some(),
                expect_context,
                "certified={use_red_hat_image} persistent={persistent_volume}"
            );
            if let Some(context) = context {
                assert_eq!(context.run_as_user, Some(200));
                assert_eq!(context.fs_group, Some(200));
                assert_eq!(context.supplemental_groups, vec![200]);
            }
        }
    }

    // ==========================================================================
    // Story: Pull policy is explicit or inferred from the tag
    // ==========================================================================

    #[test]
    fn pull_policy_synthesis() {
        let cases = [
            ("repo/img", None, "Always"),
            ("repo/img:1.0", None, "IfNotPresent"),
            ("repo/img:latest", None, "Always"),
            ("repo/img:1.0", Some("Always"), "Always"),
            ("repo/img", Some("Never"), "Never"),
        ];

        for (image, policy, expected) in cases {
            let spec = normalized(NexusSpec {
                image: Some(image.to_string()),
                image_pull_policy: policy.map(str::to_string),
                ..Default::default()
            });
            let deployment = ComputeManager::new(&spec).build_deployment();
            assert_eq!(
                container(&deployment).image_pull_policy.as_deref(),
                Some(expected),
                "image={image} policy={policy:?}"
            );
        }
    }

    // ==========================================================================
    // Story: The Service fronts port 8081, optionally as a NodePort
    // ==========================================================================

    #[test]
    fn cluster_ip_service_by_default() {
        let spec = normalized(NexusSpec::default());
        let service = ComputeManager::new(&spec).build_service();

        assert_eq!(service.metadata.name, "nexus3");
        assert_eq!(service.spec.type_.as_deref(), Some("ClusterIP"));
        assert_eq!(service.spec.selector.get(LABEL_APP), Some(&"nexus3".to_string()));
        assert_eq!(service.spec.ports.len(), 1);
        assert_eq!(service.spec.ports[0].port, 8081);
        assert_eq!(service.spec.ports[0].target_port, Some(IntOrString::Int(8081)));
        assert_eq!(service.spec.ports[0].node_port, None);
    }

    #[test]
    fn node_port_exposure_mutates_the_service() {
        let spec = normalized(NexusSpec {
            networking: Some(NetworkingSpec {
                expose: true,
                expose_as: Some(ExposeAs::NodePort),
                node_port: Some(31031),
                ..Default::default()
            }),
            ..Default::default()
        });
        let service = ComputeManager::new(&spec).build_service();

        assert_eq!(service.spec.type_.as_deref(), Some("NodePort"));
        assert_eq!(service.spec.ports[0].node_port, Some(31031));
    }

    // ==========================================================================
    // Story: Deployed objects with server defaults compare equal
    // ==========================================================================

    fn deployed_copy(deployment: &Deployment) -> Deployment {
        let mut deployed = deployment.clone();
        deployed.metadata = deployed
            .metadata
            .with_annotation("deployment.kubernetes.io/revision", "2");
        deployed.spec.strategy = None;
        deployed.spec.template.spec.security_context = Some(PodSecurityContext::default());
        let c = &mut deployed.spec.template.spec.containers[0];
        c.image_pull_policy = None;
        c.ports[0].protocol = None;
        if let Some(ref mut resources) = c.resources {
            for value in resources.limits.values_mut() {
                if value == "2Gi" {
                    *value = "2048Mi".to_string();
                }
            }
        }
        deployed
    }

    #[test]
    fn server_defaults_do_not_cause_updates() {
        let spec = normalized(NexusSpec {
            use_red_hat_image: true,
            persistence: Some(PersistenceSpec {
                persistent: true,
                ..Default::default()
            }),
            replicas: 2,
            ..Default::default()
        });
        let requested = ComputeManager::new(&spec).build_deployment();
        assert!(requested.spec.template.spec.security_context.is_none());

        let deployed = deployed_copy(&requested);
        assert_ne!(deployed, requested);
        assert!(deployment_matches(&deployed, &requested));
    }

    #[test]
    fn unset_pull_policy_matches_inferred_one() {
        let spec = normalized(NexusSpec {
            image: Some("repo/img:1.0".to_string()),
            ..Default::default()
        });
        let requested = ComputeManager::new(&spec).build_deployment();

        let mut deployed = requested.clone();
        deployed.spec.template.spec.containers[0].image_pull_policy =
            Some("IfNotPresent".to_string());
        let mut unset = requested.clone();
        unset.spec.template.spec.containers[0].image_pull_policy = None;
        assert!(deployment_matches(&deployed, &unset));

        deployed.spec.template.spec.containers[0].image_pull_policy = Some("Always".to_string());
        assert!(!deployment_matches(&deployed, &unset));
    }

    #[test]
    fn real_drift_is_detected() {
        let spec = normalized(NexusSpec::default());
        let requested = ComputeManager::new(&spec).build_deployment();

        let mut scaled = requested.clone();
        scaled.spec.replicas = 2;
        assert!(!deployment_matches(&scaled, &requested));

        let mut retagged = requested.clone();
        retagged.spec.template.spec.containers[0].image = "other:1".to_string();
        assert!(!deployment_matches(&retagged, &requested));

        let mut no_context = requested.clone();
        no_context.spec.template.spec.security_context = None;
        assert!(!deployment_matches(&no_context, &requested));

        let mut env = requested.clone();
        env.spec.template.spec.containers[0].env.clear();
        assert!(!deployment_matches(&env, &requested));
    }

    #[test]
    fn service_ignores_allocated_node_port_and_defaults() {
        let spec = normalized(NexusSpec::default());
        let requested = ComputeManager::new(&spec).build_service();

        let mut deployed = requested.clone();
        deployed.spec.type_ = None;
        deployed.spec.ports[0].protocol = None;
        deployed.spec.ports[0].target_port = None;
        assert!(service_matches(&deployed, &requested));

        deployed.spec.type_ = Some("NodePort".to_string());
        deployed.spec.ports[0].node_port = Some(30000);
        assert!(!service_matches(&deployed, &requested));
    }

    #[test]
    fn requested_node_port_must_match() {
        let spec = normalized(NexusSpec {
            networking: Some(NetworkingSpec {
                expose: true,
                expose_as: Some(ExposeAs::NodePort),
                node_port: Some(31031),
                ..Default::default()
            }),
            ..Default::default()
        });
        let requested = ComputeManager::new(&spec).build_service();

        let mut deployed = requested.clone();
        assert!(service_matches(&deployed, &requested));
        deployed.spec.ports[0].node_port = Some(30000);
        assert!(!service_matches(&deployed, &requested));
    }

    // ==========================================================================
    // Story: Fetching tolerates absence
    // ==========================================================================

    #[tokio::test]
    async fn deployed_returns_only_existing_objects() {
        use crate::store::MockObjectStore;

        let spec = normalized(NexusSpec::default());
        let manager = ComputeManager::new(&spec);
        let service = serde_json::to_value(manager.build_service()).expect("should encode");

        let mut store = MockObjectStore::new();
        store.expect_get().returning(move |kind, _, _| match kind {
            ResourceKind::Service => Ok(Some(service.clone())),
            _ => Ok(None),
        });

        let deployed = manager.deployed(&store).await.expect("fetch should succeed");
        assert_eq!(deployed.len(), 1);
        assert_eq!(deployed[0].kind(), ResourceKind::Service);
    }

    #[tokio::test]
    async fn fetch_errors_abort() {
        use crate::store::MockObjectStore;

        let spec = normalized(NexusSpec::default());
        let manager = ComputeManager::new(&spec);

        let mut store = MockObjectStore::new();
        store.expect_get().returning(|kind, _, name| match kind {
            ResourceKind::Deployment => Err(Error::fetch(kind.as_str(), name, "forbidden")),
            _ => Ok(None),
        });

        let err = manager.deployed(&store).await.expect_err("should fail");
        assert_eq!(err.kind(), Some("Deployment"));
    }
}
