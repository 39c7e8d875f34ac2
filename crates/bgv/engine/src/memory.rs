//! In-memory verification service for development and testing.
//!
//! Behaves like the remote service: it owns the records, assigns statuses
//! and issues consent tokens. Outcomes of executed checks can be scripted
//! per check, and individual calls can be made to fail. Every call is
//! logged so tests can assert on exactly what reached the "network".
//!
//! Not suitable for production use.

use crate::service::VerificationService;
use async_trait::async_trait;
use bgv_types::*;
use chrono::{Duration, Utc};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

/// How long an issued consent token stays valid
pub const CONSENT_TOKEN_TTL_HOURS: i64 = 72;

/// A call received by the in-memory service
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceCall {
    ListOfferedChecks(OrganizationId),
    GetVerification(CandidateId),
    InitiateStageChecks {
        stage: Stage,
        checks: Vec<CheckId>,
    },
    RunStage(Stage),
    StartCheck(Stage, CheckId),
    RetryCheck(Stage, CheckId),
    GetConsentStatus(CandidateId),
    SendConsent(CandidateId),
    UpdateManualCheck {
        stage: Stage,
        check: CheckId,
        status: CheckStatus,
    },
}

impl ServiceCall {
    /// Calls that change server-side state
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Self::ListOfferedChecks(_) | Self::GetVerification(_) | Self::GetConsentStatus(_)
        )
    }
}

#[derive(Debug, Default)]
struct State {
    catalogs: HashMap<OrganizationId, Vec<OfferedCheck>>,
    records: HashMap<CandidateId, VerificationRecord>,
    consent: HashMap<CandidateId, ConsentStatus>,
    /// Scripted statuses handed out, in order, each time a check executes
    outcomes: HashMap<CheckId, VecDeque<CheckStatus>>,
    /// Retry calls that fail outright with the given message
    retry_errors: HashMap<CheckId, String>,
    /// Error returned by record reads while set
    read_error: Option<BgvError>,
    calls: Vec<ServiceCall>,
    tokens_issued: u64,
}

impl State {
    fn record_by_id(&mut self, id: &VerificationId) -> BgvResult<&mut VerificationRecord> {
        self.records
            .values_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| BgvError::server(Some(404), format!("verification {} not found", id)))
    }

    fn next_outcome(&mut self, check: &CheckId) -> CheckStatus {
        self.outcomes
            .get_mut(check)
            .and_then(|q| q.pop_front())
            .unwrap_or(CheckStatus::Completed)
    }
}

/// In-process [`VerificationService`]
#[derive(Debug, Default)]
pub struct InMemoryVerificationService {
    state: RwLock<State>,
}

impl InMemoryVerificationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an organization's catalog
    pub fn with_catalog(mut self, organization: OrganizationId, checks: Vec<OfferedCheck>) -> Self {
        self.state.get_mut().catalogs.insert(organization, checks);
        self
    }

    pub async fn set_consent(&self, candidate: CandidateId, status: ConsentStatus) {
        self.state.write().await.consent.insert(candidate, status);
    }

    /// Seed a record as if it had been created earlier
    pub async fn insert_record(&self, record: VerificationRecord) {
        self.state
            .write()
            .await
            .records
            .insert(record.candidate_id.clone(), record);
    }

    /// Queue statuses `check` receives on its next executions (default COMPLETED)
    pub async fn script_outcomes(&self, check: impl Into<String>, statuses: Vec<CheckStatus>) {
        self.state
            .write()
            .await
            .outcomes
            .entry(CheckId::new(check))
            .or_default()
            .extend(statuses);
    }

    /// Make every retry of `check` fail with a server error
    pub async fn fail_retries(&self, check: impl Into<String>, message: impl Into<String>) {
        self.state
            .write()
            .await
            .retry_errors
            .insert(CheckId::new(check), message.into());
    }

    /// Make record reads fail with `error` until cleared with `None`
    pub async fn fail_record_reads(&self, error: Option<BgvError>) {
        self.state.write().await.read_error = error;
    }

    pub async fn record_for(&self, candidate: &CandidateId) -> Option<VerificationRecord> {
        self.state.read().await.records.get(candidate).cloned()
    }

    pub async fn calls(&self) -> Vec<ServiceCall> {
        self.state.read().await.calls.clone()
    }

    pub async fn mutating_calls(&self) -> Vec<ServiceCall> {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|c| c.is_mutating())
            .cloned()
            .collect()
    }

    pub async fn clear_calls(&self) {
        self.state.write().await.calls.clear();
    }
}

#[async_trait]
impl VerificationService for InMemoryVerificationService {
    async fn list_offered_checks(&self, organization: &OrganizationId) -> BgvResult<Vec<OfferedCheck>> {
        let mut state = self.state.write().await;
        state.calls.push(ServiceCall::ListOfferedChecks(organization.clone()));
        Ok(state.catalogs.get(organization).cloned().unwrap_or_default())
    }

    async fn get_verification(&self, candidate: &CandidateId) -> BgvResult<Option<VerificationRecord>> {
        let mut state = self.state.write().await;
        state.calls.push(ServiceCall::GetVerification(candidate.clone()));
        if let Some(err) = &state.read_error {
            return Err(err.clone());
        }
        Ok(state.records.get(candidate).cloned())
    }

    async fn initiate_stage_checks(&self, request: &InitiateStageRequest) -> BgvResult<VerificationRecord> {
        let mut state = self.state.write().await;
        state.calls.push(ServiceCall::InitiateStageChecks {
            stage: request.stage,
            checks: request.checks.clone(),
        });

        if request.checks.is_empty() {
            return Err(BgvError::server(Some(400), "checks must not be empty"));
        }

        let record = state
            .records
            .entry(request.candidate_id.clone())
            .or_insert_with(|| {
                VerificationRecord::new(
                    VerificationId::new(format!("ver-{}", request.candidate_id)),
                    request.candidate_id.clone(),
                    request.organization_id.clone(),
                )
            });

        let now = Utc::now();
        let entries = record.stages.get_mut(request.stage);
        for check in &request.checks {
            match entries.iter_mut().find(|e| &e.check == check) {
                Some(existing) if existing.status == CheckStatus::Failed => {
                    existing.status = CheckStatus::NotStarted;
                    existing.remarks = None;
                    existing.submitted_at = Some(now);
                }
                Some(_) => {}
                None => entries.push(CheckEntry::new(check.as_str(), CheckStatus::NotStarted).submitted(now)),
            }
        }

        Ok(record.clone())
    }

    async fn run_stage(&self, verification: &VerificationId, stage: Stage) -> BgvResult<StageRunOutcome> {
        let mut state = self.state.write().await;
        state.calls.push(ServiceCall::RunStage(stage));

        let runnable: Vec<CheckId> = state
            .record_by_id(verification)?
            .entries(stage)
            .iter()
            .filter(|e| e.status.is_runnable())
            .map(|e| e.check.clone())
            .collect();

        let mut failed_checks = Vec::new();
        for check in runnable {
            let status = state.next_outcome(&check);
            if let Some(entry) = state.record_by_id(verification)?.entry_mut(stage, &check) {
                entry.status = status;
            }
            if status == CheckStatus::Failed {
                failed_checks.push(check);
            }
        }

        if failed_checks.is_empty() {
            Ok(StageRunOutcome::Completed)
        } else {
            Ok(StageRunOutcome::Failed { failed_checks })
        }
    }

    async fn start_check(
        &self,
        verification: &VerificationId,
        stage: Stage,
        check: &CheckId,
    ) -> BgvResult<CheckRunOutcome> {
        let mut state = self.state.write().await;
        state.calls.push(ServiceCall::StartCheck(stage, check.clone()));

        let status = state.next_outcome(check);
        let entry = state
            .record_by_id(verification)?
            .entry_mut(stage, check)
            .ok_or_else(|| BgvError::server(Some(404), format!("{} is not part of {}", check, stage)))?;
        entry.status = status;
        Ok(CheckRunOutcome { status })
    }

    async fn retry_check(
        &self,
        verification: &VerificationId,
        stage: Stage,
        check: &CheckId,
    ) -> BgvResult<RetryOutcome> {
        let mut state = self.state.write().await;
        state.calls.push(ServiceCall::RetryCheck(stage, check.clone()));

        if let Some(message) = state.retry_errors.get(check) {
            return Err(BgvError::server(Some(502), message.clone()));
        }

        let status = state.next_outcome(check);
        let entry = state
            .record_by_id(verification)?
            .entry_mut(stage, check)
            .ok_or_else(|| BgvError::server(Some(404), format!("{} is not part of {}", check, stage)))?;
        if entry.status != CheckStatus::Failed {
            return Err(BgvError::server(
                Some(409),
                format!("{} is {}, only FAILED checks can be retried", check, entry.status),
            ));
        }

        let remarks = Remarks::text(format!("retried: {}", status));
        entry.status = status;
        entry.remarks = Some(remarks.clone());
        Ok(RetryOutcome {
            status,
            remarks: Some(remarks),
        })
    }

    async fn get_consent_status(&self, candidate: &CandidateId) -> BgvResult<ConsentStatus> {
        let mut state = self.state.write().await;
        state.calls.push(ServiceCall::GetConsentStatus(candidate.clone()));
        Ok(state
            .consent
            .get(candidate)
            .copied()
            .unwrap_or(ConsentStatus::NotRequested))
    }

    async fn send_consent(&self, candidate: &CandidateId) -> BgvResult<ConsentDispatch> {
        let mut state = self.state.write().await;
        state.calls.push(ServiceCall::SendConsent(candidate.clone()));

        let current = state
            .consent
            .get(candidate)
            .copied()
            .unwrap_or(ConsentStatus::NotRequested);
        if !current.allows_send() {
            return Err(BgvError::server(Some(409), format!("consent is already {}", current)));
        }

        state.tokens_issued += 1;
        let token = format!("consent-{}-{}", candidate, state.tokens_issued);
        state.consent.insert(candidate.clone(), ConsentStatus::PendingConsent);
        Ok(ConsentDispatch {
            token,
            expires_at: Utc::now() + Duration::hours(CONSENT_TOKEN_TTL_HOURS),
        })
    }

    async fn update_manual_check(
        &self,
        verification: &VerificationId,
        stage: Stage,
        check: &CheckId,
        update: &ManualCheckUpdate,
    ) -> BgvResult<()> {
        let mut state = self.state.write().await;
        state.calls.push(ServiceCall::UpdateManualCheck {
            stage,
            check: check.clone(),
            status: update.status,
        });

        let entry = state
            .record_by_id(verification)?
            .entry_mut(stage, check)
            .ok_or_else(|| BgvError::server(Some(404), format!("{} is not part of {}", check, stage)))?;
        entry.status = update.status;
        entry.remarks = update.remarks.clone();
        Ok(())
    }
}
