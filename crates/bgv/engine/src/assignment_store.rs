//! Stage assignment store: pending (unsubmitted) stage -> checks selections
//!
//! The store enforces that a check is pending in at most one unlocked
//! stage. Edits against locked checks or locked stages are rejected with a
//! typed reason instead of being silently dropped.

use crate::status_view::StatusView;
use bgv_types::*;
use serde::{Deserialize, Serialize};

/// Per-candidate mapping of stage to selected check ids.
///
/// Each slot is duplicate-free and keeps insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckAssignment {
    stages: PerStage<Vec<CheckId>>,
}

impl CheckAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the per-stage check lists of a record
    pub fn from_record(record: &VerificationRecord) -> Self {
        let mut assignment = Self::new();
        for (stage, entry) in record.all_entries() {
            assignment.insert(stage, entry.check.clone());
        }
        assignment
    }

    pub fn pending(&self, stage: Stage) -> &[CheckId] {
        self.stages.get(stage)
    }

    pub fn contains(&self, stage: Stage, check: &CheckId) -> bool {
        self.stages.get(stage).contains(check)
    }

    /// Stages `check` is currently assigned to
    pub fn stages_of(&self, check: &CheckId) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|s| self.contains(*s, check))
            .collect()
    }

    pub fn is_assigned(&self, check: &CheckId) -> bool {
        Stage::ALL.into_iter().any(|s| self.contains(s, check))
    }

    /// Add `check` to `stage`; false if it was already there
    pub fn insert(&mut self, stage: Stage, check: CheckId) -> bool {
        let slot = self.stages.get_mut(stage);
        if slot.contains(&check) {
            return false;
        }
        slot.push(check);
        true
    }

    /// Remove `check` from `stage`; false if it was not there
    pub fn remove(&mut self, stage: Stage, check: &CheckId) -> bool {
        let slot = self.stages.get_mut(stage);
        let before = slot.len();
        slot.retain(|c| c != check);
        slot.len() != before
    }

    pub fn clear(&mut self) {
        self.stages = PerStage::default();
    }

    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(|(_, checks)| checks.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, &[CheckId])> {
        self.stages.iter().map(|(s, checks)| (s, checks.as_slice()))
    }
}

// ── Toggle Outcomes ──────────────────────────────────────────────────

/// Why a toggle was refused
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ToggleRejection {
    /// The check was already submitted somewhere and has not failed
    CheckLocked {
        check: CheckId,
        stage: Stage,
        status: CheckStatus,
    },
    /// The target stage has been finalized
    StageLocked { stage: Stage },
}

impl std::fmt::Display for ToggleRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CheckLocked {
                check,
                stage,
                status,
            } => write!(f, "{} is locked in {} ({})", check, stage, status),
            Self::StageLocked { stage } => write!(f, "{} is locked", stage),
        }
    }
}

/// Result of a toggle; a rejection is a value, not an error
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// Added to the stage, after removal from any other unlocked stages
    Added {
        stage: Stage,
        moved_from: Vec<Stage>,
    },
    Removed { stage: Stage },
    Rejected(ToggleRejection),
}

impl ToggleOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

// ── Store ────────────────────────────────────────────────────────────

/// Mutable pending assignment for the selected candidate
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageAssignmentStore {
    assignment: CheckAssignment,
}

impl StageAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_assignment(assignment: CheckAssignment) -> Self {
        Self { assignment }
    }

    pub fn assignment(&self) -> &CheckAssignment {
        &self.assignment
    }

    pub fn pending(&self, stage: Stage) -> &[CheckId] {
        self.assignment.pending(stage)
    }

    /// Select or deselect `check` for `stage`.
    ///
    /// Locked checks (submitted anywhere with a status other than FAILED)
    /// and locked stages are rejected without touching the assignment. A
    /// FAILED check can be re-toggled. Adding a check removes it from every
    /// other unlocked stage first, so it is pending in at most one of them.
    pub fn toggle(&mut self, check: &CheckId, stage: Stage, view: &StatusView<'_>) -> ToggleOutcome {
        if let Some((locked_in, status)) = view.check_lock(check) {
            let rejection = ToggleRejection::CheckLocked {
                check: check.clone(),
                stage: locked_in,
                status,
            };
            tracing::debug!(check = %check, stage = %stage, %rejection, "Toggle rejected");
            return ToggleOutcome::Rejected(rejection);
        }
        if view.is_stage_locked(stage) {
            let rejection = ToggleRejection::StageLocked { stage };
            tracing::debug!(check = %check, stage = %stage, %rejection, "Toggle rejected");
            return ToggleOutcome::Rejected(rejection);
        }

        if self.assignment.remove(stage, check) {
            tracing::debug!(check = %check, stage = %stage, "Check deselected");
            return ToggleOutcome::Removed { stage };
        }

        let mut moved_from = Vec::new();
        for other in Stage::ALL {
            if other != stage
                && !view.is_stage_locked(other)
                && self.assignment.remove(other, check)
            {
                moved_from.push(other);
            }
        }
        self.assignment.insert(stage, check.clone());

        tracing::debug!(check = %check, stage = %stage, ?moved_from, "Check selected");
        ToggleOutcome::Added { stage, moved_from }
    }

    /// Replace the whole assignment with the per-stage check lists of `record`
    pub fn restore_from_record(&mut self, record: &VerificationRecord) {
        self.assignment = CheckAssignment::from_record(record);
    }

    /// Append checks to a stage, skipping ones already there; returns those added
    pub fn append(&mut self, stage: Stage, checks: impl IntoIterator<Item = CheckId>) -> Vec<CheckId> {
        let mut added = Vec::new();
        for check in checks {
            if self.assignment.insert(stage, check.clone()) {
                added.push(check);
            }
        }
        added
    }

    /// Drop `check` from a stage's pending set without consulting locks
    pub fn withdraw(&mut self, stage: Stage, check: &CheckId) -> bool {
        self.assignment.remove(stage, check)
    }

    pub fn clear(&mut self) {
        self.assignment.clear();
    }
}
