//! nexus-plan
//!
//! Render and plan Nexus instances without running the operator.

use clap::Parser;

use nexus_cli::{Cli, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    nexus_common::telemetry::init_tracing(cli.log_json);
    cli.run().await
}
