//! Output formatting utilities

use anyhow::Result;
use bgv_types::{CheckStatus, StageInitiationStatus};
use colored::*;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a vector of items in the specified format
pub fn print_output<T: Serialize + Tabled>(data: Vec<T>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                println!("{}", Table::new(data));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }
    Ok(())
}

/// Print a single item as JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

pub fn color_check_status(status: CheckStatus) -> String {
    match status {
        CheckStatus::Completed => status.as_str().green().to_string(),
        CheckStatus::Failed => status.as_str().red().to_string(),
        CheckStatus::InProgress => status.as_str().yellow().to_string(),
        CheckStatus::NotStarted | CheckStatus::Pending => status.as_str().to_string(),
    }
}

pub fn color_stage_status(status: StageInitiationStatus) -> String {
    match status {
        StageInitiationStatus::Completed => status.as_str().green().to_string(),
        StageInitiationStatus::HasFailures => status.as_str().red().to_string(),
        StageInitiationStatus::InProgress | StageInitiationStatus::Initiated => {
            status.as_str().yellow().to_string()
        }
        StageInitiationStatus::NotInitiated => status.as_str().dimmed().to_string(),
    }
}
