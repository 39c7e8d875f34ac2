//! Stage Orchestrator: the main entry point for the engine
//!
//! The orchestrator owns one operator session and composes the gates over
//! a shared service handle. It:
//! 1. Loads the organization catalog and the candidate's record
//! 2. Edits the pending assignment
//! 3. Initiates stages in order, behind the consent gate
//! 4. Runs stages and checks, retries failures, records manual verdicts
//!
//! It never decides a check's status. Every mutating call is followed by a
//! reload of the record the service holds.

use crate::assignment_store::{ToggleOutcome, ToggleRejection};
use crate::availability::AvailabilityResolver;
use crate::consent_gate::{ConsentGate, ConsentPolicy};
use crate::execution::{Executed, ExecutionGate, RetryReport};
use crate::finalization::{FinalizationGate, InitiationReceipt};
use crate::manual_review::ManualReview;
use crate::service::{reload_record, VerificationService};
use crate::session::{SessionSnapshot, VerificationSession};
use crate::status_view::StageSummary;
use bgv_types::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One row of a stage picker
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckRow {
    pub check: CheckId,
    /// `None` for checks the catalog does not list
    pub category: Option<CheckCategory>,
    /// Selected for this stage but not yet submitted, or submitted into it
    pub selected: bool,
    /// Status of this check's entry in this stage, if submitted here
    pub status: Option<CheckStatus>,
    pub remarks: Option<Remarks>,
    /// Stage holding a non-FAILED entry for this check
    pub locked_in: Option<Stage>,
}

/// Everything a stage screen shows
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageOverview {
    pub stage: Stage,
    pub locked: bool,
    pub status: StageInitiationStatus,
    /// Whether this stage may be initiated with respect to the one before it
    pub previous_resolved: bool,
    pub summary: StageSummary,
    pub rows: Vec<CheckRow>,
}

/// Coordinates one operator's work on one candidate at a time
pub struct StageOrchestrator<S: ?Sized> {
    service: Arc<S>,
    session: VerificationSession,
    availability: AvailabilityResolver,
    consent: ConsentGate<S>,
    finalization: FinalizationGate<S>,
    execution: ExecutionGate<S>,
    manual: ManualReview<S>,
}

impl<S: VerificationService + ?Sized> StageOrchestrator<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self::with_session(service, VerificationSession::new())
    }

    pub fn with_session(service: Arc<S>, session: VerificationSession) -> Self {
        Self {
            availability: AvailabilityResolver::new(),
            consent: ConsentGate::new(Arc::clone(&service)),
            finalization: FinalizationGate::new(Arc::clone(&service)),
            execution: ExecutionGate::new(Arc::clone(&service)),
            manual: ManualReview::new(Arc::clone(&service)),
            service,
            session,
        }
    }

    pub fn session(&self) -> &VerificationSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut VerificationSession {
        &mut self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Fetch an organization's catalog and select it
    pub async fn load_organization(&mut self, organization: OrganizationId) -> BgvResult<&CheckCatalog> {
        let offered = self.service.list_offered_checks(&organization).await?;
        let catalog = CheckCatalog::new(offered);
        tracing::info!(
            organization = %organization,
            checks = catalog.len(),
            "Catalog loaded"
        );
        self.session.select_organization(organization, catalog);
        Ok(self.session.catalog())
    }

    /// Select a candidate and load their record and consent status
    pub async fn load_candidate(&mut self, candidate: CandidateId) -> BgvResult<()> {
        if self.session.organization().is_none() {
            return Err(BgvError::validation("select an organization before a candidate"));
        }
        self.session.select_candidate(candidate);
        self.refresh().await
    }

    /// Reload the record and the consent status
    pub async fn refresh(&mut self) -> BgvResult<()> {
        reload_record(self.service.as_ref(), &mut self.session).await?;
        self.consent.refresh(&mut self.session).await?;
        Ok(())
    }

    /// Reload everything a snapshot refers to, then replay its pending edits.
    ///
    /// Edits the current record no longer allows are dropped and returned.
    pub async fn resume(&mut self, snapshot: SessionSnapshot) -> BgvResult<Vec<ToggleRejection>> {
        if let Some(organization) = snapshot.organization.clone() {
            self.load_organization(organization).await?;
        }
        if let Some(candidate) = snapshot.candidate.clone() {
            self.load_candidate(candidate).await?;
        }

        let mut dropped = Vec::new();
        if self.session.candidate().is_some() {
            self.session.carry_over(snapshot.carried_over.iter().cloned());
            for (stage, checks) in snapshot.pending.iter() {
                for check in checks {
                    if self.session.assignment().contains(stage, check) {
                        continue;
                    }
                    if let ToggleOutcome::Rejected(rejection) = self.session.toggle(check, stage) {
                        tracing::warn!(check = %check, stage = %stage, %rejection, "Saved selection dropped");
                        dropped.push(rejection);
                    }
                }
            }
        }
        self.session.set_stage(snapshot.current_stage);
        Ok(dropped)
    }

    // ── Selection ────────────────────────────────────────────────────

    /// Select or deselect a check for a stage
    pub fn toggle(&mut self, check: &CheckId, stage: Stage) -> ToggleOutcome {
        self.session.toggle(check, stage)
    }

    pub fn visible_checks(&self, stage: Stage) -> Vec<CheckId> {
        self.availability.compute_visible(
            stage,
            self.session.catalog(),
            self.session.assignment(),
            &self.session.view(),
        )
    }

    pub fn stage_overview(&self, stage: Stage) -> StageOverview {
        let view = self.session.view();
        let catalog = self.session.catalog();
        let assignment = self.session.assignment();

        let rows = self
            .visible_checks(stage)
            .into_iter()
            .map(|check| {
                let entry = view.entries(stage).iter().find(|e| e.check == check);
                CheckRow {
                    category: catalog.category_of(&check),
                    selected: assignment.contains(stage, &check),
                    status: entry.map(|e| e.status),
                    remarks: entry.and_then(|e| e.remarks.clone()),
                    locked_in: view.check_lock(&check).map(|(s, _)| s),
                    check,
                }
            })
            .collect();

        StageOverview {
            stage,
            locked: view.is_stage_locked(stage),
            status: view.stage_initiation_status(stage),
            previous_resolved: view.is_prev_stage_completed(stage),
            summary: view.stage_summary(stage),
            rows,
        }
    }

    // ── Stage operations ─────────────────────────────────────────────

    pub async fn initiate_stage(&mut self, stage: Stage, consent: ConsentPolicy) -> BgvResult<InitiationReceipt> {
        self.finalization
            .initiate_stage(&mut self.session, stage, consent)
            .await
    }

    pub async fn run_stage(&mut self, stage: Stage) -> BgvResult<Executed<StageRunOutcome>> {
        self.execution.run_stage(&mut self.session, stage).await
    }

    /// Execute one check of the current stage
    pub async fn start_check(&mut self, check: &CheckId) -> BgvResult<Executed<CheckRunOutcome>> {
        self.execution.start_check(&mut self.session, check).await
    }

    pub async fn retry_failed_checks(&mut self) -> BgvResult<RetryReport> {
        self.execution.retry_failed_checks(&mut self.session).await
    }

    pub async fn update_manual_check(
        &mut self,
        stage: Stage,
        check: &CheckId,
        status: CheckStatus,
        remarks: Option<Remarks>,
    ) -> BgvResult<()> {
        self.manual
            .update_manual_check(&mut self.session, stage, check, status, remarks)
            .await
    }

    // ── Consent ──────────────────────────────────────────────────────

    pub async fn refresh_consent(&mut self) -> BgvResult<ConsentStatus> {
        self.consent.refresh(&mut self.session).await
    }

    pub async fn send_consent(&mut self) -> BgvResult<ConsentDispatch> {
        self.consent.send(&mut self.session).await
    }
}
