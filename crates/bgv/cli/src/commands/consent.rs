//! Consent commands

use super::Orchestrator;
use crate::output::{self, print_info, print_success, print_warning, OutputFormat};
use anyhow::Result;
use clap::Subcommand;

/// Consent subcommands
#[derive(Subcommand)]
pub enum ConsentCommands {
    /// Fetch the candidate's consent status
    Status,

    /// Send (or resend) the consent email
    Send,
}

/// Execute a consent command
pub async fn execute(
    command: ConsentCommands,
    orchestrator: &mut Orchestrator,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ConsentCommands::Status => {
            let status = orchestrator.refresh_consent().await?;
            match format {
                OutputFormat::Json => output::print_json(&serde_json::json!({ "status": status }))?,
                OutputFormat::Table if status.is_given() => print_success(&format!("Consent: {}", status)),
                OutputFormat::Table => print_warning(&format!("Consent: {}", status)),
            }
            Ok(())
        }

        ConsentCommands::Send => {
            let dispatch = orchestrator.send_consent().await?;
            match format {
                OutputFormat::Json => output::print_json(&dispatch)?,
                OutputFormat::Table => {
                    print_success("Consent email sent");
                    print_info(&format!(
                        "Link expires {}",
                        dispatch.expires_at.format("%Y-%m-%d %H:%M UTC")
                    ));
                }
            }
            Ok(())
        }
    }
}
