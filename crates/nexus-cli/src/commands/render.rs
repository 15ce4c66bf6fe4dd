//! Render command: synthesize an instance offline

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Args;
use nexus_common::crd::Nexus;
use nexus_common::{Capabilities, Error as CoreError, StaticCapabilityProbe};
use nexus_resources::{ObjectStore, ResourceKind, Supervisor};
use tracing::info;

use super::load_manifest;
use crate::Result;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Nexus manifest to render
    #[arg(short, long)]
    pub file: PathBuf,

    /// Namespace to render into, overriding the manifest
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Pretend the cluster is OpenShift
    #[arg(long)]
    pub openshift: bool,

    /// Pretend the cluster serves OpenShift Routes
    #[arg(long)]
    pub routes: bool,

    /// Pretend the cluster serves Ingresses
    #[arg(long)]
    pub ingress: bool,

    /// Omit the normalized spec from the output
    #[arg(long)]
    pub objects_only: bool,
}

impl RenderArgs {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            routes: self.routes,
            ingress: self.ingress,
            openshift: self.openshift,
        }
    }
}

/// A cluster with nothing deployed
struct EmptyStore;

#[async_trait]
impl ObjectStore for EmptyStore {
    async fn get(
        &self,
        _kind: ResourceKind,
        _namespace: &str,
        _name: &str,
    ) -> std::result::Result<Option<serde_json::Value>, CoreError> {
        Ok(None)
    }
}

pub async fn run(args: RenderArgs) -> Result<()> {
    let nexus = load_manifest(&args.file, args.namespace.as_deref())?;
    let output = render(&nexus, args.capabilities(), !args.objects_only).await?;
    print!("{output}");
    Ok(())
}

/// Render `nexus` as a multi-document YAML stream
pub async fn render(
    nexus: &Nexus,
    capabilities: Capabilities,
    with_spec: bool,
) -> Result<String> {
    let supervisor = Supervisor::new(
        Arc::new(EmptyStore),
        Arc::new(StaticCapabilityProbe(capabilities)),
    );
    let plan = supervisor.reconcile_plan(nexus).await?;
    info!(
        instance = %plan.instance,
        objects = plan.required.len(),
        "rendered instance"
    );

    let mut documents = Vec::new();
    if with_spec {
        documents.push(serde_yaml::to_string(&plan.spec)?);
    }
    for object in plan.required.iter() {
        documents.push(serde_yaml::to_string(object)?);
    }
    Ok(documents.join("---\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::parse_manifest;
    use crate::Error;

    const ROUTED: &str = r#"
apiVersion: apps.m88i.io/v1alpha1
kind: Nexus
metadata:
  name: nexus3
  namespace: tools
spec:
  persistence:
    persistent: true
  networking:
    expose: true
    exposeAs: Route
    host: nexus.apps.example.com
"#;

    fn kinds(output: &str) -> Vec<String> {
        output
            .split("---\n")
            .filter_map(|doc| {
                let value: serde_yaml::Value = serde_yaml::from_str(doc).ok()?;
                value.get("kind")?.as_str().map(str::to_string)
            })
            .collect()
    }

    #[tokio::test]
    async fn renders_every_required_object() {
        let nexus = parse_manifest(ROUTED, None).expect("should parse");
        let caps = Capabilities {
            routes: true,
            ..Default::default()
        };

        let output = render(&nexus, caps, false).await.expect("should render");
        assert_eq!(
            kinds(&output),
            vec![
                "Deployment",
                "Service",
                "PersistentVolumeClaim",
                "ServiceAccount",
                "Route"
            ]
        );
    }

    #[tokio::test]
    async fn spec_document_comes_first() {
        let nexus = parse_manifest(ROUTED, None).expect("should parse");
        let caps = Capabilities {
            routes: true,
            ..Default::default()
        };

        let output = render(&nexus, caps, true).await.expect("should render");
        let first = output.split("---\n").next().expect("should have a document");
        let spec: serde_yaml::Value = serde_yaml::from_str(first).expect("should be yaml");
        assert_eq!(spec["name"].as_str(), Some("nexus3"));
        assert_eq!(spec["replicas"].as_u64(), Some(1));
    }

    #[tokio::test]
    async fn missing_capability_is_reported() {
        let nexus = parse_manifest(ROUTED, None).expect("should parse");
        let err = render(&nexus, Capabilities::default(), false)
            .await
            .expect_err("should fail");
        assert!(matches!(
            err,
            Error::Nexus(CoreError::CapabilityUnavailable { .. })
        ));
    }
}
