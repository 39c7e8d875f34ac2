//! The remote verification service contract
//!
//! The engine coordinates; the service executes. Every mutating call is an
//! async round-trip, and the returned record is the only source of truth
//! for check status.

use crate::session::VerificationSession;
use async_trait::async_trait;
use bgv_types::*;

/// Operations consumed from the remote verification service.
///
/// Implemented over HTTP by `bgv-client`, and in-process by
/// [`InMemoryVerificationService`](crate::memory::InMemoryVerificationService).
#[async_trait]
pub trait VerificationService: Send + Sync {
    /// Checks the organization has purchased
    async fn list_offered_checks(&self, organization: &OrganizationId) -> BgvResult<Vec<OfferedCheck>>;

    /// The candidate's record, or `None` if nothing was ever submitted
    async fn get_verification(&self, candidate: &CandidateId) -> BgvResult<Option<VerificationRecord>>;

    /// Submit a stage's checks; the service creates or updates entries
    async fn initiate_stage_checks(&self, request: &InitiateStageRequest) -> BgvResult<VerificationRecord>;

    /// Execute every PENDING/NOT_STARTED check in a stage
    async fn run_stage(&self, verification: &VerificationId, stage: Stage) -> BgvResult<StageRunOutcome>;

    async fn start_check(
        &self,
        verification: &VerificationId,
        stage: Stage,
        check: &CheckId,
    ) -> BgvResult<CheckRunOutcome>;

    async fn retry_check(
        &self,
        verification: &VerificationId,
        stage: Stage,
        check: &CheckId,
    ) -> BgvResult<RetryOutcome>;

    async fn get_consent_status(&self, candidate: &CandidateId) -> BgvResult<ConsentStatus>;

    /// Send (or resend) the consent email; every send issues a fresh token
    async fn send_consent(&self, candidate: &CandidateId) -> BgvResult<ConsentDispatch>;

    async fn update_manual_check(
        &self,
        verification: &VerificationId,
        stage: Stage,
        check: &CheckId,
        update: &ManualCheckUpdate,
    ) -> BgvResult<()>;
}

/// Replace the session's record with the service's current copy
pub(crate) async fn reload_record<S: VerificationService + ?Sized>(
    service: &S,
    session: &mut VerificationSession,
) -> BgvResult<()> {
    let candidate = session.require_candidate()?.clone();
    let record = service.get_verification(&candidate).await?;
    tracing::debug!(
        candidate = %candidate,
        found = record.is_some(),
        "Verification record refreshed"
    );
    session.apply_record(record);
    Ok(())
}
