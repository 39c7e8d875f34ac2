//! Execution gate: running initiated checks
//!
//! Every operation here needs an existing record. Check statuses are never
//! set locally; after each call the record is reloaded from the service.
//! A failed reload does not discard what the service already did: the
//! outcome is returned with the reload error attached.

use crate::service::{reload_record, VerificationService};
use crate::session::VerificationSession;
use bgv_types::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One retry call that failed outright
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryError {
    pub stage: Stage,
    pub check: CheckId,
    pub message: String,
}

/// Aggregate result of retrying every FAILED check
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryReport {
    /// Pairs a retry was attempted for, in pipeline order
    pub attempted: Vec<(Stage, CheckId)>,
    /// Pairs no longer FAILED after the retry
    pub succeeded: Vec<(Stage, CheckId)>,
    /// Pairs the service retried but which failed again
    pub still_failed: Vec<(Stage, CheckId)>,
    /// Calls that errored; the remaining retries still ran
    pub errors: Vec<RetryError>,
    /// Set when the record could not be reloaded after the pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_error: Option<String>,
}

impl RetryReport {
    pub fn is_clean(&self) -> bool {
        self.still_failed.is_empty() && self.errors.is_empty()
    }
}

/// Outcome of a call that reached the service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executed<T> {
    pub outcome: T,
    /// Set when the record could not be reloaded afterwards; the session
    /// still holds the record from before the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_error: Option<String>,
}

impl<T> Executed<T> {
    pub fn is_fresh(&self) -> bool {
        self.refresh_error.is_none()
    }
}

/// Runs stages and individual checks, and retries failures
pub struct ExecutionGate<S: ?Sized> {
    service: Arc<S>,
}

impl<S: VerificationService + ?Sized> ExecutionGate<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Execute every runnable check of `stage`.
    ///
    /// A stage with failures is reported as [`StageRunOutcome::Failed`],
    /// not as an error. The record is reloaded either way.
    pub async fn run_stage(
        &self,
        session: &mut VerificationSession,
        stage: Stage,
    ) -> BgvResult<Executed<StageRunOutcome>> {
        let verification = session.require_record()?.id.clone();
        if session.view().entries(stage).is_empty() {
            return Err(BgvError::validation(format!("{} has not been initiated", stage)));
        }

        let outcome = self.service.run_stage(&verification, stage).await?;
        match &outcome {
            StageRunOutcome::Completed => {
                tracing::info!(verification = %verification, stage = %stage, "Stage run completed")
            }
            StageRunOutcome::Failed { failed_checks } => tracing::info!(
                verification = %verification,
                stage = %stage,
                failed = failed_checks.len(),
                "Stage run finished with failures"
            ),
        }

        let refresh_error = self.refresh(session).await;
        Ok(Executed { outcome, refresh_error })
    }

    /// Execute one check of the session's current stage
    pub async fn start_check(
        &self,
        session: &mut VerificationSession,
        check: &CheckId,
    ) -> BgvResult<Executed<CheckRunOutcome>> {
        let stage = session.current_stage();
        let record = session.require_record()?;
        if record.entry(stage, check).is_none() {
            return Err(BgvError::validation(format!(
                "{} is not part of {}",
                check, stage
            )));
        }
        let verification = record.id.clone();

        let outcome = self.service.start_check(&verification, stage, check).await?;
        tracing::info!(
            verification = %verification,
            stage = %stage,
            check = %check,
            status = %outcome.status,
            "Check executed"
        );

        let refresh_error = self.refresh(session).await;
        Ok(Executed { outcome, refresh_error })
    }

    /// Retry every FAILED check across all stages.
    ///
    /// Calls go out one at a time. An error on one check is recorded in the
    /// report and the loop moves on. The record is reloaded once at the end.
    pub async fn retry_failed_checks(&self, session: &mut VerificationSession) -> BgvResult<RetryReport> {
        let verification = session.require_record()?.id.clone();
        let failed = session.view().failed_pairs();

        let mut report = RetryReport::default();
        if failed.is_empty() {
            tracing::info!(verification = %verification, "No failed checks to retry");
            return Ok(report);
        }

        for (stage, check) in failed {
            report.attempted.push((stage, check.clone()));
            match self.service.retry_check(&verification, stage, &check).await {
                Ok(outcome) if outcome.status == CheckStatus::Failed => {
                    report.still_failed.push((stage, check));
                }
                Ok(_) => report.succeeded.push((stage, check)),
                Err(err) => {
                    tracing::warn!(
                        verification = %verification,
                        stage = %stage,
                        check = %check,
                        error = %err,
                        "Retry failed"
                    );
                    report.errors.push(RetryError {
                        stage,
                        check,
                        message: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            verification = %verification,
            attempted = report.attempted.len(),
            succeeded = report.succeeded.len(),
            still_failed = report.still_failed.len(),
            errors = report.errors.len(),
            "Retry pass finished"
        );

        report.refresh_error = self.refresh(session).await;
        Ok(report)
    }

    async fn refresh(&self, session: &mut VerificationSession) -> Option<String> {
        match reload_record(self.service.as_ref(), session).await {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(error = %err, "Record reload failed, keeping the execution result");
                Some(err.to_string())
            }
        }
    }
}
