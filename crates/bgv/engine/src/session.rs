//! Per-operator session state
//!
//! Everything the operator has selected lives in one explicit
//! [`VerificationSession`] that callers pass by reference. Nothing is
//! shared across candidates: selecting a different candidate discards the
//! assignment, the cached record, the consent status and the stage position.

use crate::assignment_store::{CheckAssignment, StageAssignmentStore, ToggleOutcome};
use crate::status_view::StatusView;
use bgv_types::*;
use serde::{Deserialize, Serialize};

/// Mutable state of one operator working on one candidate
#[derive(Clone, Debug, Default)]
pub struct VerificationSession {
    organization: Option<OrganizationId>,
    candidate: Option<CandidateId>,
    catalog: CheckCatalog,
    store: StageAssignmentStore,
    record: Option<VerificationRecord>,
    consent: Option<ConsentStatus>,
    last_dispatch: Option<ConsentDispatch>,
    current_stage: Stage,
    /// Purchased checks parked in FINAL after it was initiated, not yet submitted
    carried_over: Vec<CheckId>,
}

impl VerificationSession {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Selection ────────────────────────────────────────────────────

    pub fn organization(&self) -> Option<&OrganizationId> {
        self.organization.as_ref()
    }

    pub fn candidate(&self) -> Option<&CandidateId> {
        self.candidate.as_ref()
    }

    /// Select an organization and install its catalog.
    ///
    /// Changing organization also drops the selected candidate.
    pub fn select_organization(&mut self, organization: OrganizationId, catalog: CheckCatalog) {
        if self.organization.as_ref() != Some(&organization) {
            self.candidate = None;
            self.reset_candidate_state();
        }
        self.organization = Some(organization);
        self.catalog = catalog;
    }

    /// Select a candidate; returns true if the selection changed.
    ///
    /// A change wipes all per-candidate state.
    pub fn select_candidate(&mut self, candidate: CandidateId) -> bool {
        if self.candidate.as_ref() == Some(&candidate) {
            return false;
        }
        tracing::debug!(candidate = %candidate, "Candidate selected, resetting session state");
        self.candidate = Some(candidate);
        self.reset_candidate_state();
        true
    }

    fn reset_candidate_state(&mut self) {
        self.store.clear();
        self.record = None;
        self.consent = None;
        self.last_dispatch = None;
        self.current_stage = Stage::Primary;
        self.carried_over.clear();
    }

    /// Candidate and organization, or a validation error naming what is missing
    pub fn require_selection(&self) -> BgvResult<(CandidateId, OrganizationId)> {
        let candidate = self
            .candidate
            .clone()
            .ok_or_else(|| BgvError::validation("no candidate selected"))?;
        let organization = self
            .organization
            .clone()
            .ok_or_else(|| BgvError::validation("no organization selected"))?;
        Ok((candidate, organization))
    }

    pub fn require_candidate(&self) -> BgvResult<&CandidateId> {
        self.candidate
            .as_ref()
            .ok_or_else(|| BgvError::validation("no candidate selected"))
    }

    /// The cached record, required for anything that runs checks
    pub fn require_record(&self) -> BgvResult<&VerificationRecord> {
        self.record
            .as_ref()
            .ok_or_else(|| BgvError::validation("no verification has been initiated for this candidate"))
    }

    // ── Catalog, assignment, record ──────────────────────────────────

    pub fn catalog(&self) -> &CheckCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &StageAssignmentStore {
        &self.store
    }

    pub fn assignment(&self) -> &CheckAssignment {
        self.store.assignment()
    }

    pub fn record(&self) -> Option<&VerificationRecord> {
        self.record.as_ref()
    }

    pub fn view(&self) -> StatusView<'_> {
        StatusView::new(self.record.as_ref())
    }

    /// Split borrow: mutable store alongside a view of the record
    pub fn store_and_view(&mut self) -> (&mut StageAssignmentStore, StatusView<'_>) {
        (&mut self.store, StatusView::new(self.record.as_ref()))
    }

    /// Replace the cached record with the service's and rebuild the assignment from it.
    ///
    /// Unsubmitted selections survive when the new record still allows
    /// them; the rest are dropped. Carried-over checks stay pending in FINAL
    /// until the record lists them.
    pub fn apply_record(&mut self, record: Option<VerificationRecord>) {
        let previous = self.store.assignment().clone();
        match &record {
            Some(r) => self.store.restore_from_record(r),
            None => self.store.clear(),
        }
        self.record = record;

        let carried = std::mem::take(&mut self.carried_over);
        for (stage, checks) in previous.iter() {
            for check in checks {
                if self.store.assignment().contains(stage, check)
                    || (stage == Stage::Final && carried.contains(check))
                {
                    continue;
                }
                if let ToggleOutcome::Rejected(rejection) = self.toggle(check, stage) {
                    tracing::debug!(check = %check, stage = %stage, %rejection, "Pending selection dropped");
                }
            }
        }
        self.carry_over(carried);
    }

    /// Select or deselect `check` for `stage`.
    ///
    /// Selecting a carried-over check for an earlier stage takes it out of FINAL.
    pub fn toggle(&mut self, check: &CheckId, stage: Stage) -> ToggleOutcome {
        let view = StatusView::new(self.record.as_ref());
        let mut outcome = self.store.toggle(check, stage, &view);
        if let ToggleOutcome::Added { moved_from, .. } = &mut outcome {
            if stage != Stage::Final && self.release_carried(check) {
                moved_from.push(Stage::Final);
            }
        }
        outcome
    }

    fn release_carried(&mut self, check: &CheckId) -> bool {
        let before = self.carried_over.len();
        self.carried_over.retain(|c| c != check);
        if self.carried_over.len() == before {
            return false;
        }
        self.store.withdraw(Stage::Final, check);
        true
    }

    /// Park catalog checks in FINAL's pending set, whether or not FINAL is locked.
    ///
    /// Checks the record already lists, or that are pending in an earlier
    /// stage, are skipped. Returns the checks newly carried over.
    pub fn carry_over(&mut self, checks: impl IntoIterator<Item = CheckId>) -> Vec<CheckId> {
        let view = StatusView::new(self.record.as_ref());
        let mut added = Vec::new();
        for check in checks {
            let elsewhere = self
                .store
                .assignment()
                .stages_of(&check)
                .into_iter()
                .any(|s| s != Stage::Final);
            if view.check_status(&check).is_some() || elsewhere {
                tracing::debug!(check = %check, "Carry-over no longer needed");
                continue;
            }
            self.store.append(Stage::Final, [check.clone()]);
            if !self.carried_over.contains(&check) {
                self.carried_over.push(check.clone());
                added.push(check);
            }
        }
        added
    }

    /// Checks waiting in FINAL that were carried over rather than selected
    pub fn carried_over(&self) -> &[CheckId] {
        &self.carried_over
    }

    // ── Consent ──────────────────────────────────────────────────────

    pub fn consent(&self) -> Option<ConsentStatus> {
        self.consent
    }

    pub fn set_consent(&mut self, status: ConsentStatus) {
        self.consent = Some(status);
    }

    pub fn last_dispatch(&self) -> Option<&ConsentDispatch> {
        self.last_dispatch.as_ref()
    }

    pub fn record_dispatch(&mut self, dispatch: ConsentDispatch) {
        self.last_dispatch = Some(dispatch);
        self.consent = Some(ConsentStatus::PendingConsent);
    }

    // ── Navigation ───────────────────────────────────────────────────

    pub fn current_stage(&self) -> Stage {
        self.current_stage
    }

    pub fn set_stage(&mut self, stage: Stage) {
        self.current_stage = stage;
    }

    /// Move to the next stage; false when already at FINAL
    pub fn advance_stage(&mut self) -> bool {
        match self.current_stage.next() {
            Some(next) => {
                self.current_stage = next;
                true
            }
            None => false,
        }
    }

    // ── Load/save hooks ──────────────────────────────────────────────

    /// What survives a navigation boundary: selections and pending edits, never the record
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            organization: self.organization.clone(),
            candidate: self.candidate.clone(),
            current_stage: self.current_stage,
            pending: self.store.assignment().clone(),
            carried_over: self.carried_over.clone(),
        }
    }

    /// Rebuild a session from a snapshot.
    ///
    /// The catalog and record are not part of a snapshot and must be
    /// reloaded. Restored selections that the reloaded record locks are dropped.
    pub fn restore(snapshot: SessionSnapshot) -> Self {
        Self {
            organization: snapshot.organization,
            candidate: snapshot.candidate,
            store: StageAssignmentStore::from_assignment(snapshot.pending),
            current_stage: snapshot.current_stage,
            carried_over: snapshot.carried_over,
            ..Self::default()
        }
    }
}

/// Serializable form of a session, saved when leaving a screen or process
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<CandidateId>,
    #[serde(default)]
    pub current_stage: Stage,
    #[serde(default)]
    pub pending: CheckAssignment,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub carried_over: Vec<CheckId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_state() -> VerificationSession {
        let mut session = VerificationSession::new();
        session.select_organization(
            OrganizationId::new("org-1"),
            vec![OfferedCheck::new("X", CheckCategory::Api)]
                .into_iter()
                .collect(),
        );
        session.select_candidate(CandidateId::new("cand-1"));
        let rec = VerificationRecord::new(
            VerificationId::new("ver-1"),
            CandidateId::new("cand-1"),
            OrganizationId::new("org-1"),
        )
        .with_stage(
            Stage::Primary,
            vec![CheckEntry::new("X", CheckStatus::Completed)],
        );
        session.apply_record(Some(rec));
        session.set_consent(ConsentStatus::ConsentGiven);
        session.set_stage(Stage::Secondary);
        session
    }

    #[test]
    fn test_switching_candidate_resets_everything() {
        let mut session = session_with_state();

        assert!(session.select_candidate(CandidateId::new("cand-2")));
        assert!(session.record().is_none());
        assert!(session.assignment().is_empty());
        assert_eq!(session.consent(), None);
        assert_eq!(session.current_stage(), Stage::Primary);
        // the catalog belongs to the organization and survives
        assert_eq!(session.catalog().len(), 1);
    }

    #[test]
    fn test_reselecting_same_candidate_keeps_state() {
        let mut session = session_with_state();
        assert!(!session.select_candidate(CandidateId::new("cand-1")));
        assert!(session.record().is_some());
        assert_eq!(session.current_stage(), Stage::Secondary);
    }

    #[test]
    fn test_switching_organization_drops_candidate() {
        let mut session = session_with_state();
        session.select_organization(OrganizationId::new("org-2"), CheckCatalog::empty());
        assert!(session.candidate().is_none());
        assert!(session.record().is_none());
        assert!(session.require_selection().is_err());
    }

    #[test]
    fn test_apply_record_restores_assignment() {
        let session = session_with_state();
        assert_eq!(session.assignment().pending(Stage::Primary), &[CheckId::new("X")]);
    }

    #[test]
    fn test_apply_record_keeps_allowed_pending_selections() {
        let mut session = session_with_state();
        for check in ["Y", "Z"] {
            let (store, view) = session.store_and_view();
            store.toggle(&CheckId::new(check), Stage::Secondary, &view);
        }

        // the service now reports Z as submitted into FINAL
        let rec = session
            .record()
            .unwrap()
            .clone()
            .with_stage(Stage::Final, vec![CheckEntry::new("Z", CheckStatus::InProgress)]);
        session.apply_record(Some(rec));

        assert_eq!(session.assignment().pending(Stage::Secondary), &[CheckId::new("Y")]);
        assert_eq!(session.assignment().pending(Stage::Final), &[CheckId::new("Z")]);
    }

    fn final_locked_record() -> VerificationRecord {
        VerificationRecord::new(
            VerificationId::new("ver-1"),
            CandidateId::new("cand-1"),
            OrganizationId::new("org-1"),
        )
        .with_stage(Stage::Primary, vec![CheckEntry::new("X", CheckStatus::Completed)])
        .with_stage(Stage::Secondary, vec![CheckEntry::new("Y", CheckStatus::Failed)])
        .with_stage(Stage::Final, vec![CheckEntry::new("Z", CheckStatus::NotStarted)])
    }

    #[test]
    fn test_carried_over_checks_outlive_reload() {
        let mut session = session_with_state();
        session.apply_record(Some(final_locked_record()));

        let carried = session.carry_over([CheckId::new("W"), CheckId::new("X")]);
        assert_eq!(carried, vec![CheckId::new("W")]);

        session.apply_record(Some(final_locked_record()));
        assert_eq!(
            session.assignment().pending(Stage::Final),
            &[CheckId::new("Z"), CheckId::new("W")]
        );
        assert_eq!(session.snapshot().carried_over, vec![CheckId::new("W")]);

        let submitted = final_locked_record().with_stage(
            Stage::Final,
            vec![
                CheckEntry::new("Z", CheckStatus::NotStarted),
                CheckEntry::new("W", CheckStatus::NotStarted),
            ],
        );
        session.apply_record(Some(submitted));
        assert!(session.carried_over().is_empty());
    }

    #[test]
    fn test_carried_over_check_moves_to_unlocked_stage() {
        let mut session = session_with_state();
        session.apply_record(Some(final_locked_record()));
        session.carry_over([CheckId::new("W")]);

        let outcome = session.toggle(&CheckId::new("W"), Stage::Secondary);
        assert_eq!(
            outcome,
            ToggleOutcome::Added {
                stage: Stage::Secondary,
                moved_from: vec![Stage::Final],
            }
        );
        assert!(!session.assignment().contains(Stage::Final, &CheckId::new("W")));
        assert!(session.carried_over().is_empty());
    }

    #[test]
    fn test_require_selection() {
        let mut session = VerificationSession::new();
        let err = session.require_selection().unwrap_err();
        assert_eq!(err, BgvError::validation("no candidate selected"));

        session.select_candidate(CandidateId::new("c"));
        let err = session.require_selection().unwrap_err();
        assert_eq!(err, BgvError::validation("no organization selected"));
    }

    #[test]
    fn test_advance_stage_stops_at_final() {
        let mut session = VerificationSession::new();
        assert!(session.advance_stage());
        assert!(session.advance_stage());
        assert!(!session.advance_stage());
        assert_eq!(session.current_stage(), Stage::Final);
    }

    #[test]
    fn test_snapshot_excludes_record() {
        let session = session_with_state();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.candidate, Some(CandidateId::new("cand-1")));
        assert_eq!(snapshot.current_stage, Stage::Secondary);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("ver-1"));
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_restore_keeps_selection_and_pending() {
        let snapshot = session_with_state().snapshot();
        let restored = VerificationSession::restore(snapshot.clone());

        assert_eq!(restored.candidate(), Some(&CandidateId::new("cand-1")));
        assert_eq!(restored.organization(), Some(&OrganizationId::new("org-1")));
        assert_eq!(restored.current_stage(), Stage::Secondary);
        assert_eq!(restored.assignment(), &snapshot.pending);
        assert!(restored.record().is_none());
        assert!(restored.catalog().is_empty());
    }

    #[test]
    fn test_dispatch_marks_consent_pending() {
        let mut session = VerificationSession::new();
        session.record_dispatch(ConsentDispatch {
            token: "t-1".into(),
            expires_at: chrono::Utc::now(),
        });
        assert_eq!(session.consent(), Some(ConsentStatus::PendingConsent));
        assert_eq!(session.last_dispatch().unwrap().token, "t-1");
    }
}
