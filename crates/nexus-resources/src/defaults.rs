//! Defaulting normalizer
//!
//! Turns a raw [`NexusSpec`] into a [`NormalizedSpec`] in which every field
//! the managers consult has a concrete value. Normalization is total: it
//! never fails, it only fills and clamps. Fields that cannot be repaired are
//! rejected earlier by [`NexusSpec::validate`].

use nexus_common::crd::{
    AdminCredentials, ExposeAs, NetworkingSpec, NexusSpec, PersistenceSpec, ProbeSpec, PullPolicy,
    ResourceQuantity, ResourceRequirements, TlsSpec,
};
use nexus_common::Capabilities;
use serde::Serialize;

/// Community image used when none is given
pub const COMMUNITY_IMAGE: &str = "docker.io/sonatype/nexus3:latest";

/// Red Hat certified image; always wins when requested
pub const CERTIFIED_IMAGE: &str = "registry.connect.redhat.com/sonatype/nexus-repository-manager";

/// Volume size used when persistence is on but no size is given
pub const DEFAULT_VOLUME_SIZE: &str = "10Gi";

const DEFAULT_CPU_REQUEST: &str = "1";
const DEFAULT_CPU_LIMIT: &str = "2";
const DEFAULT_MEMORY: &str = "2Gi";

/// Probe timings used when a probe is not configured
pub const DEFAULT_PROBE: ProbeSpec = ProbeSpec {
    initial_delay_seconds: 30,
    timeout_seconds: 15,
    period_seconds: 10,
    success_threshold: 1,
    failure_threshold: 3,
};

/// A Nexus spec with every default applied
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSpec {
    /// Instance name
    pub name: String,
    /// Instance namespace
    pub namespace: String,
    /// Number of pods
    pub replicas: u32,
    /// Container image
    pub image: String,
    /// The certified image is in use
    pub use_red_hat_image: bool,
    /// Explicit pull policy; `None` means infer from the image tag
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_policy")]
    pub image_pull_policy: Option<PullPolicy>,
    /// Container resources
    pub resources: ResourceRequirements,
    /// Admin credentials, passed through untouched
    #[serde(skip)]
    pub credentials: Option<AdminCredentials>,
    /// Generate a random admin password on first start
    pub generate_random_admin_password: bool,
    /// Persistence settings
    pub persistence: NormalizedPersistence,
    /// Networking settings
    pub networking: NormalizedNetworking,
    /// Liveness probe
    pub liveness_probe: ProbeSpec,
    /// Readiness probe
    pub readiness_probe: ProbeSpec,
    /// Service account the pods run as
    pub service_account_name: String,
}

fn serialize_policy<S: serde::Serializer>(
    policy: &Option<PullPolicy>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match policy {
        Some(p) => serializer.serialize_str(p.as_str()),
        None => serializer.serialize_none(),
    }
}

/// Persistence with its size resolved
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPersistence {
    /// Back the data directory with a claim
    pub persistent: bool,
    /// Requested size
    pub volume_size: String,
    /// Explicit storage class; the cluster default applies otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

/// Networking with the exposure mode resolved
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedNetworking {
    /// Expose outside the cluster
    pub expose: bool,
    /// Exposure mode; always set when `expose` is true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expose_as: Option<ExposeAs>,
    /// Host for Route and Ingress
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Requested node port; zero when not given
    pub node_port: i32,
    /// TLS settings
    pub tls: TlsSpec,
}

impl NormalizedNetworking {
    /// The active exposure mode, `None` when not exposed
    pub fn exposure(&self) -> Option<ExposeAs> {
        if self.expose {
            self.expose_as
        } else {
            None
        }
    }
}

impl NormalizedSpec {
    /// Exposure mode, `None` when the instance is cluster-internal
    pub fn exposure(&self) -> Option<ExposeAs> {
        self.networking.exposure()
    }
}

/// Apply every default and clamp to `spec`.
pub fn normalize(
    name: &str,
    namespace: &str,
    spec: &NexusSpec,
    capabilities: &Capabilities,
) -> NormalizedSpec {
    NormalizedSpec {
        name: name.to_string(),
        namespace: namespace.to_string(),
        replicas: spec.replicas,
        image: normalize_image(spec),
        use_red_hat_image: spec.use_red_hat_image,
        image_pull_policy: spec.image_pull_policy.as_deref().and_then(PullPolicy::parse),
        resources: normalize_resources(spec.resources.as_ref()),
        credentials: spec.credentials.clone(),
        generate_random_admin_password: spec.generate_random_admin_password,
        persistence: normalize_persistence(spec.persistence.as_ref()),
        networking: normalize_networking(spec.networking.as_ref(), capabilities),
        liveness_probe: normalize_probe(spec.liveness_probe.as_ref()),
        readiness_probe: normalize_probe(spec.readiness_probe.as_ref()),
        service_account_name: non_empty(spec.service_account_name.as_deref())
            .unwrap_or(name)
            .to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn normalize_image(spec: &NexusSpec) -> String {
    if spec.use_red_hat_image {
        return CERTIFIED_IMAGE.to_string();
    }
    non_empty(spec.image.as_deref())
        .unwrap_or(COMMUNITY_IMAGE)
        .to_string()
}

fn normalize_resources(resources: Option<&ResourceRequirements>) -> ResourceRequirements {
    match resources {
        Some(r) if !r.is_empty() => r.clone(),
        _ => ResourceRequirements {
            requests: Some(ResourceQuantity {
                cpu: Some(DEFAULT_CPU_REQUEST.to_string()),
                memory: Some(DEFAULT_MEMORY.to_string()),
            }),
            limits: Some(ResourceQuantity {
                cpu: Some(DEFAULT_CPU_LIMIT.to_string()),
                memory: Some(DEFAULT_MEMORY.to_string()),
            }),
        },
    }
}

fn normalize_probe(probe: Option<&ProbeSpec>) -> ProbeSpec {
    let Some(probe) = probe else {
        return DEFAULT_PROBE;
    };
    ProbeSpec {
        initial_delay_seconds: probe.initial_delay_seconds.max(0),
        timeout_seconds: probe.timeout_seconds.max(1),
        period_seconds: probe.period_seconds.max(1),
        success_threshold: probe.success_threshold.max(1),
        failure_threshold: probe.failure_threshold.max(1),
    }
}

fn normalize_persistence(persistence: Option<&PersistenceSpec>) -> NormalizedPersistence {
    let persistence = persistence.cloned().unwrap_or_default();
    NormalizedPersistence {
        persistent: persistence.persistent,
        volume_size: non_empty(persistence.volume_size.as_deref())
            .unwrap_or(DEFAULT_VOLUME_SIZE)
            .to_string(),
        storage_class: persistence.storage_class.filter(|c| !c.is_empty()),
    }
}

fn normalize_networking(
    networking: Option<&NetworkingSpec>,
    capabilities: &Capabilities,
) -> NormalizedNetworking {
    let networking = networking.cloned().unwrap_or_default();
    let expose_as = match networking.expose_as {
        None if networking.expose => Some(default_exposure(capabilities)),
        other => other,
    };
    NormalizedNetworking {
        expose: networking.expose,
        expose_as,
        host: networking.host.filter(|h| !h.is_empty()),
        node_port: networking.node_port.unwrap_or(0),
        tls: networking.tls.unwrap_or_default(),
    }
}

/// Exposure picked when the user asks to expose without naming a mode
fn default_exposure(capabilities: &Capabilities) -> ExposeAs {
    if capabilities.openshift && capabilities.routes {
        ExposeAs::Route
    } else if capabilities.ingress {
        ExposeAs::Ingress
    } else {
        ExposeAs::NodePort
    }
}

impl From<NormalizedSpec> for NexusSpec {
    fn from(spec: NormalizedSpec) -> Self {
        NexusSpec {
            replicas: spec.replicas,
            image: Some(spec.image),
            use_red_hat_image: spec.use_red_hat_image,
            image_pull_policy: spec.image_pull_policy.map(|p| p.as_str().to_string()),
            resources: Some(spec.resources),
            credentials: spec.credentials,
            generate_random_admin_password: spec.generate_random_admin_password,
            persistence: Some(PersistenceSpec {
                persistent: spec.persistence.persistent,
                volume_size: Some(spec.persistence.volume_size),
                storage_class: spec.persistence.storage_class,
            }),
            networking: Some(NetworkingSpec {
                expose: spec.networking.expose,
                expose_as: spec.networking.expose_as,
                host: spec.networking.host,
                node_port: Some(spec.networking.node_port),
                tls: Some(spec.networking.tls),
            }),
            liveness_probe: Some(spec.liveness_probe),
            readiness_probe: Some(spec.readiness_probe),
            service_account_name: Some(spec.service_account_name),
        }
    }
}
