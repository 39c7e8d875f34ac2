//! BGV CLI - Command-line interface for stage-based background verification
//!
//! This CLI gives operators a terminal interface to:
//! - Browse the checks their organization has purchased
//! - Select checks per stage and initiate stages in order
//! - Run stages and single checks, and retry failures
//! - Track and (re)send candidate consent
//! - Record verdicts on manual and AI-assisted checks
//!
//! Selections are kept in a session file between invocations.

use anyhow::Result;
use bgv_client::{ClientConfig, HttpVerificationService, DEFAULT_ENDPOINT};
use bgv_engine::{SessionSnapshot, StageOrchestrator};
use bgv_types::*;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;
mod session_file;

use commands::{candidate, checks, consent, stage, Orchestrator};
use config::CliConfig;
use output::{print_error, print_warning};

/// BGV CLI application
#[derive(Parser)]
#[command(name = "bgv")]
#[command(about = "BGV - Stage-based background verification CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "BGV_CONFIG")]
    config: Option<PathBuf>,

    /// Verification service endpoint
    #[arg(short, long, env = "BGV_ENDPOINT")]
    endpoint: Option<String>,

    /// Organization to work in
    #[arg(long, env = "BGV_ORG")]
    org: Option<String>,

    /// API token for the verification service
    #[arg(long, env = "BGV_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// List the checks offered to the organization
    Catalog,

    /// Select or inspect the candidate
    Candidate {
        #[command(subcommand)]
        command: candidate::CandidateCommands,
    },

    /// Inspect and navigate stages
    Stage {
        #[command(subcommand)]
        command: stage::StageCommands,
    },

    /// Select or deselect a check for a stage
    Toggle {
        /// Check ID
        check: String,

        /// Stage (defaults to the current stage)
        #[arg(short, long)]
        stage: Option<Stage>,
    },

    /// Submit a stage's selected checks
    Initiate {
        /// Stage (defaults to the current stage)
        stage: Option<Stage>,

        /// Proceed without candidate consent, skipping confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Run every pending check of a stage
    Run {
        /// Stage (defaults to the current stage)
        stage: Option<Stage>,
    },

    /// Run a single check of the current stage
    Start {
        /// Check ID
        check: String,
    },

    /// Retry every failed check
    Retry,

    /// Candidate consent
    Consent {
        #[command(subcommand)]
        command: consent::ConsentCommands,
    },

    /// Record a verdict on a manual or AI check
    Manual {
        /// Stage (primary, secondary, final)
        stage: Stage,

        /// Check ID
        check: String,

        /// New status (in_progress, completed, failed)
        status: CheckStatus,

        /// Reviewer remarks
        #[arg(short, long)]
        remarks: Option<String>,
    },

    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    if let Err(e) = run(cli).await {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let endpoint = cli
        .endpoint
        .clone()
        .or_else(|| config.endpoint.clone())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let organization = cli
        .org
        .clone()
        .or_else(|| config.default_organization.clone())
        .map(OrganizationId::new);
    let session_path = config.session_path()?;

    let token = cli.token.clone().or_else(|| config.api_token.clone());

    if let Commands::Config = cli.command {
        println!("Endpoint: {}", endpoint);
        println!(
            "Organization: {}",
            organization.as_ref().map(|o| o.as_str()).unwrap_or("-")
        );
        println!("API token: {}", if token.is_some() { "set" } else { "not set" });
        println!(
            "Timeout: {}s",
            config.timeout_secs.unwrap_or(bgv_client::DEFAULT_TIMEOUT_SECS)
        );
        println!("Session file: {}", session_path.display());
        return Ok(());
    }

    let mut client_config = ClientConfig::new(endpoint);
    if let Some(secs) = config.timeout_secs {
        client_config = client_config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(token) = token {
        client_config = client_config.with_api_token(token);
    }
    let service = Arc::new(HttpVerificationService::new(client_config)?);

    let mut snapshot = session_file::load(&session_path)?;
    if let Some(org) = organization {
        if snapshot.organization.as_ref() != Some(&org) {
            snapshot = SessionSnapshot {
                organization: Some(org),
                ..SessionSnapshot::default()
            };
        }
    }

    let mut orchestrator = StageOrchestrator::new(service);
    for rejection in orchestrator.resume(snapshot).await? {
        print_warning(&format!("Dropped saved selection: {}", rejection));
    }

    let result = execute(cli.command, &mut orchestrator, cli.output).await;
    session_file::save(&session_path, &orchestrator.snapshot())?;
    result
}

async fn execute(command: Commands, orchestrator: &mut Orchestrator, format: output::OutputFormat) -> Result<()> {
    match command {
        Commands::Catalog => checks::catalog(orchestrator, format),
        Commands::Candidate { command } => candidate::execute(command, orchestrator, format).await,
        Commands::Stage { command } => stage::execute(command, orchestrator, format).await,
        Commands::Toggle { check, stage } => checks::toggle(orchestrator, check, stage),
        Commands::Initiate { stage, yes } => checks::initiate(orchestrator, stage, yes, format).await,
        Commands::Run { stage } => checks::run(orchestrator, stage, format).await,
        Commands::Start { check } => checks::start(orchestrator, check, format).await,
        Commands::Retry => checks::retry(orchestrator, format).await,
        Commands::Consent { command } => consent::execute(command, orchestrator, format).await,
        Commands::Manual {
            stage,
            check,
            status,
            remarks,
        } => checks::manual(orchestrator, stage, check, status, remarks).await,
        Commands::Config => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_manual_command() {
        let cli = Cli::try_parse_from([
            "bgv", "manual", "secondary", "REF", "completed", "--remarks", "verified",
        ])
        .unwrap();
        match cli.command {
            Commands::Manual {
                stage,
                check,
                status,
                remarks,
            } => {
                assert_eq!(stage, Stage::Secondary);
                assert_eq!(check, "REF");
                assert_eq!(status, CheckStatus::Completed);
                assert_eq!(remarks.as_deref(), Some("verified"));
            }
            _ => panic!("expected manual command"),
        }
    }

    #[test]
    fn test_parse_toggle_with_stage() {
        let cli = Cli::try_parse_from(["bgv", "toggle", "PAN", "--stage", "final"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Toggle {
                stage: Some(Stage::Final),
                ..
            }
        ));
    }
}
