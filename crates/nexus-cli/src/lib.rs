//! nexus-plan CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

/// nexus-plan - inspect what the Nexus operator would do
#[derive(Parser, Debug)]
#[command(name = "nexus-plan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "NEXUS_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the normalized spec and required objects, offline
    Render(commands::render::RenderArgs),
    /// Compare required objects against a live cluster
    Plan(commands::plan::PlanArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Render(args) => commands::render::run(args).await,
            Commands::Plan(args) => commands::plan::run(args).await,
        }
    }
}
