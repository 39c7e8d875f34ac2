//! Check selection and execution commands

use super::Orchestrator;
use crate::output::{self, color_check_status, print_error, print_info, print_success, print_warning, OutputFormat};
use anyhow::{bail, Result};
use bgv_engine::{ConsentPolicy, InitiationReceipt, ToggleOutcome};
use bgv_types::*;
use serde::Serialize;
use tabled::Tabled;

/// Table row for the organization catalog
#[derive(Debug, Serialize, Tabled)]
struct CatalogRow {
    check: String,
    category: String,
    price: String,
}

impl From<&OfferedCheck> for CatalogRow {
    fn from(offered: &OfferedCheck) -> Self {
        Self {
            check: offered.check.to_string(),
            category: offered.category.to_string(),
            price: offered
                .price
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn catalog(orchestrator: &Orchestrator, format: OutputFormat) -> Result<()> {
    let session = orchestrator.session();
    if session.organization().is_none() {
        bail!("No organization selected (pass --org or set default_organization)");
    }
    let rows: Vec<CatalogRow> = session.catalog().iter().map(CatalogRow::from).collect();
    output::print_output(rows, format)
}

pub fn toggle(orchestrator: &mut Orchestrator, check: String, stage: Option<Stage>) -> Result<()> {
    let stage = stage.unwrap_or_else(|| orchestrator.session().current_stage());
    let check = CheckId::new(check);

    match orchestrator.toggle(&check, stage) {
        ToggleOutcome::Added { stage, moved_from } if moved_from.is_empty() => {
            print_success(&format!("Selected {} for {}", check, stage));
        }
        ToggleOutcome::Added { stage, moved_from } => {
            print_success(&format!(
                "Moved {} from {} to {}",
                check,
                join(&moved_from),
                stage
            ));
        }
        ToggleOutcome::Removed { stage } => {
            print_success(&format!("Deselected {} from {}", check, stage));
        }
        ToggleOutcome::Rejected(rejection) => {
            print_warning(&format!("Not changed: {}", rejection));
        }
    }
    Ok(())
}

fn print_receipt(receipt: &InitiationReceipt) {
    print_success(&format!(
        "Initiated {} with {} check(s): {}",
        receipt.stage,
        receipt.submitted.len(),
        join(&receipt.submitted)
    ));
    if !receipt.processed.is_empty() {
        print_info(&format!(
            "Skipped already processed: {}",
            join(&receipt.processed)
        ));
    }
    if !receipt.carried_over.is_empty() {
        print_info(&format!(
            "Carried into FINAL from the catalog: {} (initiate FINAL again to submit)",
            join(&receipt.carried_over)
        ));
    }
}

pub async fn initiate(
    orchestrator: &mut Orchestrator,
    stage: Option<Stage>,
    yes: bool,
    format: OutputFormat,
) -> Result<()> {
    let stage = stage.unwrap_or_else(|| orchestrator.session().current_stage());
    let policy = if yes {
        ConsentPolicy::Override
    } else {
        ConsentPolicy::Enforce
    };

    let receipt = match orchestrator.initiate_stage(stage, policy).await {
        Err(err) if err.is_soft() => {
            print_warning(&err.to_string());
            let confirm = dialoguer::Confirm::new()
                .with_prompt(format!("Initiate {} without candidate consent?", stage))
                .default(false)
                .interact()
                .unwrap_or(false);
            if !confirm {
                print_error("Aborted");
                return Ok(());
            }
            orchestrator
                .initiate_stage(stage, ConsentPolicy::Override)
                .await?
        }
        result => result?,
    };

    match format {
        OutputFormat::Json => output::print_json(&receipt),
        OutputFormat::Table => {
            print_receipt(&receipt);
            Ok(())
        }
    }
}

pub async fn run(orchestrator: &mut Orchestrator, stage: Option<Stage>, format: OutputFormat) -> Result<()> {
    let stage = stage.unwrap_or_else(|| orchestrator.session().current_stage());
    print_info(&format!("Running {}...", stage));

    let run = orchestrator.run_stage(stage).await?;
    match format {
        OutputFormat::Json => output::print_json(&run)?,
        OutputFormat::Table => {
            match &run.outcome {
                StageRunOutcome::Completed => print_success(&format!("{} completed", stage)),
                StageRunOutcome::Failed { failed_checks } => print_warning(&format!(
                    "{} finished with failures: {}",
                    stage,
                    join(failed_checks)
                )),
            }
            warn_stale(run.refresh_error.as_deref());
        }
    }
    Ok(())
}

fn warn_stale(refresh_error: Option<&str>) {
    if let Some(err) = refresh_error {
        print_warning(&format!("Could not reload the verification afterwards: {}", err));
    }
}

pub async fn start(orchestrator: &mut Orchestrator, check: String, format: OutputFormat) -> Result<()> {
    let check = CheckId::new(check);
    let run = orchestrator.start_check(&check).await?;
    match format {
        OutputFormat::Json => output::print_json(&run)?,
        OutputFormat::Table => {
            print_success(&format!(
                "{}: {}",
                check,
                color_check_status(run.outcome.status)
            ));
            warn_stale(run.refresh_error.as_deref());
        }
    }
    Ok(())
}

pub async fn retry(orchestrator: &mut Orchestrator, format: OutputFormat) -> Result<()> {
    let report = orchestrator.retry_failed_checks().await?;
    if let OutputFormat::Json = format {
        return output::print_json(&report);
    }

    if report.attempted.is_empty() {
        print_info("No failed checks to retry");
        return Ok(());
    }
    for (stage, check) in &report.succeeded {
        print_success(&format!("{} / {} retried", stage, check));
    }
    for (stage, check) in &report.still_failed {
        print_warning(&format!("{} / {} failed again", stage, check));
    }
    for error in &report.errors {
        print_error(&format!("{} / {}: {}", error.stage, error.check, error.message));
    }
    if report.is_clean() {
        print_success("Every failed check recovered");
    } else {
        print_info(&format!(
            "{} attempted, {} recovered",
            report.attempted.len(),
            report.succeeded.len()
        ));
    }
    warn_stale(report.refresh_error.as_deref());
    Ok(())
}

pub async fn manual(
    orchestrator: &mut Orchestrator,
    stage: Stage,
    check: String,
    status: CheckStatus,
    remarks: Option<String>,
) -> Result<()> {
    let check = CheckId::new(check);
    orchestrator
        .update_manual_check(stage, &check, status, remarks.map(Remarks::text))
        .await?;
    print_success(&format!("{} / {} set to {}", stage, check, status));
    Ok(())
}
