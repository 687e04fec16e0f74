use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "feasibility")]
#[command(about = "Buildable envelope and development bilan for a land parcel")]
pub struct CliArgs {
    /// Path to the feasibility request (JSON)
    #[arg(short, long)]
    pub request: String,

    /// Path to the engine TOML configuration
    #[arg(short, long)]
    pub config: Option<String>,

    /// Pretty-print the JSON response
    #[arg(long)]
    pub pretty: bool,

    /// Validate request and configuration, print resolved inputs, compute nothing
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl crate::utils::validation::Validate for CliArgs {
    fn validate(&self) -> crate::utils::error::Result<()> {
        use crate::utils::validation::validate_path;

        validate_path("request", &self.request)?;
        if let Some(config) = &self.config {
            validate_path("config", config)?;
        }
        Ok(())
    }
}
