//! Plan command: compare an instance against a live cluster

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use nexus_common::KubeCapabilityProbe;
use nexus_resources::{KubeObjectStore, Supervisor, Verdict};
use tracing::info;

use super::load_manifest;
use crate::{Error, Result};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Nexus manifest to plan
    #[arg(short, long)]
    pub file: PathBuf,

    /// Namespace to plan in, overriding the manifest
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Path to kubeconfig (defaults to KUBECONFIG or ~/.kube/config)
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Print verdicts as YAML instead of a table
    #[arg(long)]
    pub yaml: bool,
}

pub async fn run(args: PlanArgs) -> Result<()> {
    let nexus = load_manifest(&args.file, args.namespace.as_deref())?;
    let client = kube_client(args.kubeconfig.as_ref()).await?;

    let supervisor = Supervisor::new(
        Arc::new(KubeObjectStore::new(client.clone())),
        Arc::new(KubeCapabilityProbe::new(client)),
    );
    let plan = supervisor.reconcile_plan(&nexus).await?;
    let verdicts = plan.verdicts();
    info!(instance = %plan.instance, verdicts = verdicts.len(), "planned instance");

    if args.yaml {
        print!("{}", serde_yaml::to_string(&verdicts)?);
    } else {
        print!("{}", format_table(&verdicts));
    }
    Ok(())
}

async fn kube_client(kubeconfig: Option<&PathBuf>) -> Result<Client> {
    let Some(path) = kubeconfig else {
        return Ok(Client::try_default().await?);
    };
    let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
        Error::command_failed(format!(
            "failed to read kubeconfig {}: {}",
            path.display(),
            e
        ))
    })?;
    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|e| Error::command_failed(format!("invalid kubeconfig: {e}")))?;
    Ok(Client::try_from(config)?)
}

/// One row per verdict, columns aligned
pub fn format_table(verdicts: &[Verdict]) -> String {
    let width = verdicts
        .iter()
        .map(|v| v.kind.as_str().len())
        .max()
        .unwrap_or(0)
        .max("KIND".len());

    let mut out = format!("{:<8} {:<width$} NAME\n", "ACTION", "KIND");
    for verdict in verdicts {
        out.push_str(&format!(
            "{:<8} {:<width$} {}\n",
            verdict.action.to_string(),
            verdict.kind.as_str(),
            verdict.name
        ));
    }
    out
}
