//! Operator verdicts for checks the service cannot settle on its own

use crate::service::{reload_record, VerificationService};
use crate::session::VerificationSession;
use bgv_types::*;
use std::sync::Arc;

/// Statuses an operator may record by hand
pub const MANUAL_STATUSES: [CheckStatus; 3] = [
    CheckStatus::InProgress,
    CheckStatus::Completed,
    CheckStatus::Failed,
];

/// Records manual verdicts on MANUAL and AI checks
pub struct ManualReview<S: ?Sized> {
    service: Arc<S>,
}

impl<S: VerificationService + ?Sized> ManualReview<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Set the status (and optionally remarks) of a submitted check.
    ///
    /// Checks absent from the catalog are accepted; listed API checks are not.
    pub async fn update_manual_check(
        &self,
        session: &mut VerificationSession,
        stage: Stage,
        check: &CheckId,
        status: CheckStatus,
        remarks: Option<Remarks>,
    ) -> BgvResult<()> {
        let record = session.require_record()?;
        if record.entry(stage, check).is_none() {
            return Err(BgvError::validation(format!("{} is not part of {}", check, stage)));
        }
        if let Some(category) = session.catalog().category_of(check) {
            if !category.accepts_manual_verdict() {
                return Err(BgvError::validation(format!(
                    "{} is an {} check and cannot be updated manually",
                    check, category
                )));
            }
        }
        if !MANUAL_STATUSES.contains(&status) {
            return Err(BgvError::validation(format!(
                "{} is not a manual status (expected IN_PROGRESS, COMPLETED or FAILED)",
                status
            )));
        }
        let verification = record.id.clone();

        let update = ManualCheckUpdate {
            status,
            remarks: remarks.filter(|r| !r.is_empty()),
        };
        self.service
            .update_manual_check(&verification, stage, check, &update)
            .await?;
        tracing::info!(
            verification = %verification,
            stage = %stage,
            check = %check,
            status = %status,
            "Manual verdict recorded"
        );

        reload_record(self.service.as_ref(), session).await
    }
}
