//! Status view: pure derivations over the verification record
//!
//! Nothing here is persisted. Check status, stage status and stage locks
//! are recomputed from the authoritative record every time they are asked
//! for, so a refreshed record is immediately reflected everywhere.

use bgv_types::*;
use serde::{Deserialize, Serialize};

/// Whether a stage's selection can no longer be edited.
///
/// A stage is locked once it has at least one entry that is not FAILED.
/// An empty stage is unlocked, and so is a stage whose every entry FAILED:
/// its checks may be fully re-selected.
pub fn stage_lock(entries: &[CheckEntry]) -> bool {
    !entries.is_empty() && entries.iter().any(|e| e.status != CheckStatus::Failed)
}

/// Non-empty and every entry COMPLETED
pub fn stage_completed(entries: &[CheckEntry]) -> bool {
    !entries.is_empty() && entries.iter().all(|e| e.status == CheckStatus::Completed)
}

/// Aggregate a stage's entries into a single status.
///
/// Priority: empty, all completed, any failed, any in progress, otherwise initiated.
pub fn stage_initiation_status(entries: &[CheckEntry]) -> StageInitiationStatus {
    if entries.is_empty() {
        return StageInitiationStatus::NotInitiated;
    }
    if stage_completed(entries) {
        return StageInitiationStatus::Completed;
    }
    if entries.iter().any(|e| e.status == CheckStatus::Failed) {
        return StageInitiationStatus::HasFailures;
    }
    if entries.iter().any(|e| e.status == CheckStatus::InProgress) {
        return StageInitiationStatus::InProgress;
    }
    StageInitiationStatus::Initiated
}

/// Per-status counts for one stage
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    pub total: usize,
    pub not_started: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
}

impl StageSummary {
    pub fn from_entries(entries: &[CheckEntry]) -> Self {
        let mut summary = Self {
            total: entries.len(),
            ..Self::default()
        };
        for entry in entries {
            match entry.status {
                CheckStatus::NotStarted => summary.not_started += 1,
                CheckStatus::Pending => summary.pending += 1,
                CheckStatus::InProgress => summary.in_progress += 1,
                CheckStatus::Completed => summary.completed += 1,
                CheckStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }
}

/// Read-only view over an optional verification record
#[derive(Clone, Copy, Debug)]
pub struct StatusView<'a> {
    record: Option<&'a VerificationRecord>,
}

impl<'a> StatusView<'a> {
    pub fn new(record: Option<&'a VerificationRecord>) -> Self {
        Self { record }
    }

    /// View of a candidate with nothing submitted yet
    pub fn empty() -> Self {
        Self { record: None }
    }

    pub fn record(&self) -> Option<&'a VerificationRecord> {
        self.record
    }

    pub fn entries(&self, stage: Stage) -> &'a [CheckEntry] {
        match self.record {
            Some(record) => record.entries(stage),
            None => &[],
        }
    }

    /// Status of the first entry for `check`, scanning stages in order.
    ///
    /// `None` means the check was never submitted.
    pub fn check_status(&self, check: &CheckId) -> Option<CheckStatus> {
        Stage::ALL.into_iter().find_map(|stage| {
            self.entries(stage)
                .iter()
                .find(|e| &e.check == check)
                .map(|e| e.status)
        })
    }

    /// Whether `check` has never been processed: unsubmitted or NOT_STARTED
    pub fn is_unprocessed(&self, check: &CheckId) -> bool {
        matches!(self.check_status(check), None | Some(CheckStatus::NotStarted))
    }

    /// The first entry that locks `check`: present in any stage with a status other than FAILED
    pub fn check_lock(&self, check: &CheckId) -> Option<(Stage, CheckStatus)> {
        Stage::ALL.into_iter().find_map(|stage| {
            self.entries(stage)
                .iter()
                .find(|e| &e.check == check && e.status != CheckStatus::Failed)
                .map(|e| (stage, e.status))
        })
    }

    pub fn is_check_locked(&self, check: &CheckId) -> bool {
        self.check_lock(check).is_some()
    }

    pub fn is_check_completed_anywhere(&self, check: &CheckId) -> bool {
        Stage::ALL.into_iter().any(|stage| {
            self.entries(stage)
                .iter()
                .any(|e| &e.check == check && e.status == CheckStatus::Completed)
        })
    }

    pub fn is_stage_completed(&self, stage: Stage) -> bool {
        stage_completed(self.entries(stage))
    }

    pub fn is_stage_locked(&self, stage: Stage) -> bool {
        stage_lock(self.entries(stage))
    }

    pub fn locks(&self) -> PerStage<bool> {
        PerStage::from_fn(|stage| self.is_stage_locked(stage))
    }

    pub fn stage_initiation_status(&self, stage: Stage) -> StageInitiationStatus {
        stage_initiation_status(self.entries(stage))
    }

    /// Whether the stage before `stage` has finished running.
    ///
    /// PRIMARY has no predecessor. Otherwise the previous stage must be
    /// completed or carry failures; FINAL is reachable even when SECONDARY
    /// did not fully succeed.
    pub fn is_prev_stage_completed(&self, stage: Stage) -> bool {
        match stage.previous() {
            None => true,
            Some(prev) => self.stage_initiation_status(prev).is_resolved(),
        }
    }

    /// Every FAILED `(stage, check)` across the record, in pipeline then submission order
    pub fn failed_pairs(&self) -> Vec<(Stage, CheckId)> {
        self.record
            .into_iter()
            .flat_map(|record| record.all_entries())
            .filter(|(_, e)| e.status == CheckStatus::Failed)
            .map(|(stage, e)| (stage, e.check.clone()))
            .collect()
    }

    pub fn stage_summary(&self, stage: Stage) -> StageSummary {
        StageSummary::from_entries(self.entries(stage))
    }
}
