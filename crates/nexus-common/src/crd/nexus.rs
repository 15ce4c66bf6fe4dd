//! The Nexus custom resource

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{NetworkingSpec, PersistenceSpec, ProbeSpec, ResourceRequirements};
use crate::quantity::{validate_cpu_quantity, validate_memory_quantity};
use crate::{Error, Result};

/// Smallest accepted replica count
pub const MIN_REPLICAS: u32 = 1;

/// Largest accepted replica count
pub const MAX_REPLICAS: u32 = 100;

const MIN_PASSWORD_LEN: usize = 5;

/// Image pull policy values Kubernetes recognizes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PullPolicy {
    /// Pull on every pod start
    Always,
    /// Pull only when the image is missing on the node
    IfNotPresent,
    /// Never pull
    Never,
}

impl PullPolicy {
    /// Parse the Kubernetes spelling; anything else is unrecognized
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Always" => Some(Self::Always),
            "IfNotPresent" => Some(Self::IfNotPresent),
            "Never" => Some(Self::Never),
            _ => None,
        }
    }

    /// Kubernetes spelling of the policy
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "Always",
            Self::IfNotPresent => "IfNotPresent",
            Self::Never => "Never",
        }
    }
}

impl std::fmt::Display for PullPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Administrator credentials
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct AdminCredentials {
    /// Admin user name
    pub user: String,
    /// Admin password, at least five characters
    pub password: String,
}

/// Specification for a Sonatype Nexus Repository Manager instance
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "apps.m88i.io",
    version = "v1alpha1",
    kind = "Nexus",
    plural = "nexus",
    shortname = "nx",
    namespaced,
    printcolumn = r#"{"name":"Replicas","type":"integer","jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Expose As","type":"string","jsonPath":".spec.networking.exposeAs"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct NexusSpec {
    /// Number of pods (1-100)
    #[serde(default = "default_replicas")]
    pub replicas: u32,

    /// Container image; the community image is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Use the Red Hat certified image, overriding `image`
    #[serde(default)]
    pub use_red_hat_image: bool,

    /// Image pull policy; inferred from the image tag when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,

    /// CPU and memory for the Nexus container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    /// Administrator credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<AdminCredentials>,

    /// Generate a random admin password on first start
    #[serde(default)]
    pub generate_random_admin_password: bool,

    /// Data directory persistence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence: Option<PersistenceSpec>,

    /// External exposure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networking: Option<NetworkingSpec>,

    /// Liveness probe tuning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<ProbeSpec>,

    /// Readiness probe tuning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<ProbeSpec>,

    /// Service account the pods run as; defaults to the instance name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
}

fn default_replicas() -> u32 {
    MIN_REPLICAS
}

impl Default for NexusSpec {
    fn default() -> Self {
        Self {
            replicas: default_replicas(),
            image: None,
            use_red_hat_image: false,
            image_pull_policy: None,
            resources: None,
            credentials: None,
            generate_random_admin_password: false,
            persistence: None,
            networking: None,
            liveness_probe: None,
            readiness_probe: None,
            service_account_name: None,
        }
    }
}

impl NexusSpec {
    /// Validate fields that cannot be repaired by defaulting.
    ///
    /// Correlated networking fields (host, node port) are checked by the
    /// exposure manager, once the exposure mode is known.
    pub fn validate(&self, instance: &str) -> Result<()> {
        if !(MIN_REPLICAS..=MAX_REPLICAS).contains(&self.replicas) {
            return Err(Error::validation_for_field(
                instance,
                "spec.replicas",
                format!(
                    "replicas must be between {} and {}, got {}",
                    MIN_REPLICAS, MAX_REPLICAS, self.replicas
                ),
            ));
        }

        if let Some(ref creds) = self.credentials {
            if creds.user.is_empty() {
                return Err(Error::validation_for_field(
                    instance,
                    "spec.credentials.user",
                    "admin user cannot be empty",
                ));
            }
            if creds.password.chars().count() < MIN_PASSWORD_LEN {
                return Err(Error::validation_for_field(
                    instance,
                    "spec.credentials.password",
                    format!(
                        "admin password must be at least {} characters",
                        MIN_PASSWORD_LEN
                    ),
                ));
            }
        }

        if let Some(ref resources) = self.resources {
            for (field, quantity) in [
                ("requests", resources.requests.as_ref()),
                ("limits", resources.limits.as_ref()),
            ] {
                let Some(quantity) = quantity else { continue };
                if let Some(ref cpu) = quantity.cpu {
                    validate_cpu_quantity(cpu).map_err(|msg| {
                        Error::validation_for_field(
                            instance,
                            format!("spec.resources.{field}.cpu"),
                            msg,
                        )
                    })?;
                }
                if let Some(ref memory) = quantity.memory {
                    validate_memory_quantity(memory).map_err(|msg| {
                        Error::validation_for_field(
                            instance,
                            format!("spec.resources.{field}.memory"),
                            msg,
                        )
                    })?;
                }
            }
        }

        if let Some(size) = self
            .persistence
            .as_ref()
            .and_then(|p| p.volume_size.as_deref())
            .filter(|s| !s.is_empty())
        {
            validate_memory_quantity(size).map_err(|msg| {
                Error::validation_for_field(instance, "spec.persistence.volumeSize", msg)
            })?;
        }

        Ok(())
    }
}
