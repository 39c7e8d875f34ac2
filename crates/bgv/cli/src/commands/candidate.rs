//! Candidate commands

use super::Orchestrator;
use crate::output::{self, color_stage_status, print_info, print_success, OutputFormat};
use anyhow::Result;
use bgv_types::*;
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;

/// Candidate subcommands
#[derive(Subcommand)]
pub enum CandidateCommands {
    /// Select a candidate and load their verification
    Select {
        /// Candidate ID
        candidate: String,
    },

    /// Show the selected candidate's progress across stages
    Show,
}

/// Table row for the per-stage summary
#[derive(Debug, Serialize, Tabled)]
struct StageRow {
    stage: String,
    status: String,
    locked: String,
    submitted: usize,
    completed: usize,
    failed: usize,
    #[tabled(rename = "selected")]
    pending: usize,
}

fn stage_rows(orchestrator: &Orchestrator) -> Vec<StageRow> {
    let session = orchestrator.session();
    Stage::ALL
        .into_iter()
        .map(|stage| {
            let overview = orchestrator.stage_overview(stage);
            let unsubmitted = session
                .assignment()
                .pending(stage)
                .iter()
                .filter(|c| session.view().is_unprocessed(c))
                .count();
            StageRow {
                stage: stage.to_string(),
                status: color_stage_status(overview.status),
                locked: if overview.locked { "yes" } else { "no" }.to_string(),
                submitted: overview.summary.total,
                completed: overview.summary.completed,
                failed: overview.summary.failed,
                pending: unsubmitted,
            }
        })
        .collect()
}

fn show(orchestrator: &Orchestrator, format: OutputFormat) -> Result<()> {
    let session = orchestrator.session();
    let candidate = session.require_candidate()?;

    if let OutputFormat::Table = format {
        print_info(&format!("Candidate: {}", candidate));
        if let Some(record) = session.record() {
            print_info(&format!("Verification: {}", record.id));
        }
        let consent = session
            .consent()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        print_info(&format!("Consent: {}", consent));
        print_info(&format!("Current stage: {}", session.current_stage()));
    }
    output::print_output(stage_rows(orchestrator), format)
}

/// Execute a candidate command
pub async fn execute(
    command: CandidateCommands,
    orchestrator: &mut Orchestrator,
    format: OutputFormat,
) -> Result<()> {
    match command {
        CandidateCommands::Select { candidate } => {
            orchestrator.load_candidate(CandidateId::new(candidate)).await?;
            print_success("Candidate loaded");
            show(orchestrator, format)
        }

        CandidateCommands::Show => show(orchestrator, format),
    }
}
