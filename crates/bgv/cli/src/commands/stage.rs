//! Stage commands

use super::Orchestrator;
use crate::output::{self, color_check_status, color_stage_status, print_info, print_success, OutputFormat};
use anyhow::Result;
use bgv_engine::{CheckRow, StageOverview};
use bgv_types::*;
use clap::Subcommand;
use colored::*;
use serde::Serialize;
use tabled::Tabled;

/// Stage subcommands
#[derive(Subcommand)]
pub enum StageCommands {
    /// Show a stage's checks (defaults to the current stage)
    Show {
        /// Stage (primary, secondary, final)
        stage: Option<Stage>,
    },

    /// Make a stage the current one
    Goto {
        /// Stage (primary, secondary, final)
        stage: Stage,
    },

    /// Move to the next stage
    Next,
}

/// Table row for a stage's checks
#[derive(Debug, Serialize, Tabled)]
struct CheckRowView {
    check: String,
    category: String,
    selected: String,
    status: String,
    remarks: String,
    #[tabled(rename = "locked in")]
    locked_in: String,
}

impl From<&CheckRow> for CheckRowView {
    fn from(row: &CheckRow) -> Self {
        Self {
            check: row.check.to_string(),
            category: row
                .category
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            selected: if row.selected { "✓".to_string() } else { String::new() },
            status: row
                .status
                .map(color_check_status)
                .unwrap_or_else(|| "-".to_string()),
            remarks: row
                .remarks
                .as_ref()
                .map(|r| truncate(&r.to_string(), 48))
                .unwrap_or_default(),
            locked_in: row.locked_in.map(|s| s.to_string()).unwrap_or_default(),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    } else {
        text.to_string()
    }
}

/// Print one stage screen
pub fn print_overview(overview: &StageOverview, current: bool, format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return output::print_json(overview);
    }

    let marker = if current { " (current)".bold().to_string() } else { String::new() };
    println!(
        "{}{}  {}  {}",
        overview.stage.as_str().bold(),
        marker,
        color_stage_status(overview.status),
        if overview.locked { "locked".dimmed().to_string() } else { "open".to_string() }
    );
    if !overview.previous_resolved {
        if let Some(previous) = overview.stage.previous() {
            println!("  {}", format!("waiting for {} to finish", previous).dimmed());
        }
    }

    let rows: Vec<CheckRowView> = overview.rows.iter().map(CheckRowView::from).collect();
    output::print_output(rows, format)
}

/// Execute a stage command
pub async fn execute(
    command: StageCommands,
    orchestrator: &mut Orchestrator,
    format: OutputFormat,
) -> Result<()> {
    match command {
        StageCommands::Show { stage } => {
            let current = orchestrator.session().current_stage();
            let stage = stage.unwrap_or(current);
            print_overview(&orchestrator.stage_overview(stage), stage == current, format)
        }

        StageCommands::Goto { stage } => {
            orchestrator.session_mut().set_stage(stage);
            print_success(&format!("Current stage: {}", stage));
            Ok(())
        }

        StageCommands::Next => {
            if orchestrator.session_mut().advance_stage() {
                print_success(&format!(
                    "Current stage: {}",
                    orchestrator.session().current_stage()
                ));
            } else {
                print_info("Already at FINAL");
            }
            Ok(())
        }
    }
}
