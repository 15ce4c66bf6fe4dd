//! CLI commands

use std::path::Path;

use nexus_common::crd::Nexus;

use crate::{Error, Result};

pub mod plan;
pub mod render;

/// Namespace assumed when the manifest does not name one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Read a `Nexus` manifest, filling in the namespace when it is missing
pub fn load_manifest(path: &Path, namespace: Option<&str>) -> Result<Nexus> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::manifest(path, e.to_string()))?;
    parse_manifest(&raw, namespace).map_err(|e| Error::manifest(path, e.to_string()))
}

/// Parse a `Nexus` manifest. An explicit `namespace` overrides the manifest's.
pub fn parse_manifest(raw: &str, namespace: Option<&str>) -> Result<Nexus> {
    let mut nexus: Nexus = serde_yaml::from_str(raw)?;
    match namespace {
        Some(ns) => nexus.metadata.namespace = Some(ns.to_string()),
        None if nexus.metadata.namespace.is_none() => {
            nexus.metadata.namespace = Some(DEFAULT_NAMESPACE.to_string())
        }
        None => {}
    }
    Ok(nexus)
}
