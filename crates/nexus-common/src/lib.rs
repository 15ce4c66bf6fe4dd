//! Common types for the Nexus operator: CRD, errors, capabilities and utilities

#![deny(missing_docs)]

pub mod capabilities;
pub mod crd;
pub mod error;
pub mod kube_utils;
pub mod quantity;
pub mod telemetry;

pub use capabilities::{Capabilities, CapabilityProbe, KubeCapabilityProbe, StaticCapabilityProbe};
pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Standard Kubernetes label key for the application name
pub const LABEL_NAME: &str = "app.kubernetes.io/name";

/// Standard Kubernetes label key for the managing tool
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value of the managed-by label on every object this operator synthesizes
pub const LABEL_MANAGED_BY_NEXUS: &str = "nexus-operator";

/// Label used to select the pods of a Nexus instance
pub const LABEL_APP: &str = "app";

/// Container port the Nexus web application listens on
pub const NEXUS_HTTP_PORT: i32 = 8081;

/// Name of the container port and service port
pub const NEXUS_PORT_NAME: &str = "http";

/// Directory holding the Nexus blob stores and configuration
pub const NEXUS_DATA_DIR: &str = "/nexus-data";

/// Non-root UID and GID the community image runs as
pub const NEXUS_UID: i64 = 200;
