//! The authoritative verification record
//!
//! The remote service owns this record. The engine only ever replaces its
//! local copy with what the service returns; it never synthesizes a status.

use crate::{CandidateId, CheckId, OrganizationId, PerStage, Remarks, Stage, VerificationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a single submitted check
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    NotStarted,
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl CheckStatus {
    /// Whether a stage run will pick this check up
    pub fn is_runnable(&self) -> bool {
        matches!(self, Self::NotStarted | Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CheckStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "NOT_STARTED" => Ok(Self::NotStarted),
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown check status: {}", other)),
        }
    }
}

/// One submitted check within a stage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckEntry {
    pub check: CheckId,
    pub status: CheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<Remarks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl CheckEntry {
    pub fn new(check: impl Into<String>, status: CheckStatus) -> Self {
        Self {
            check: CheckId::new(check),
            status,
            remarks: None,
            submitted_at: None,
        }
    }

    pub fn submitted(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = Some(at);
        self
    }
}

/// A candidate's verification record as held by the remote service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub id: VerificationId,
    pub candidate_id: CandidateId,
    pub organization_id: OrganizationId,
    /// Submitted checks per stage, in submission order
    #[serde(default)]
    pub stages: PerStage<Vec<CheckEntry>>,
}

impl VerificationRecord {
    pub fn new(
        id: VerificationId,
        candidate_id: CandidateId,
        organization_id: OrganizationId,
    ) -> Self {
        Self {
            id,
            candidate_id,
            organization_id,
            stages: PerStage::default(),
        }
    }

    pub fn with_stage(mut self, stage: Stage, entries: Vec<CheckEntry>) -> Self {
        *self.stages.get_mut(stage) = entries;
        self
    }

    pub fn entries(&self, stage: Stage) -> &[CheckEntry] {
        self.stages.get(stage)
    }

    pub fn entry(&self, stage: Stage, check: &CheckId) -> Option<&CheckEntry> {
        self.stages.get(stage).iter().find(|e| &e.check == check)
    }

    pub fn entry_mut(&mut self, stage: Stage, check: &CheckId) -> Option<&mut CheckEntry> {
        self.stages.get_mut(stage).iter_mut().find(|e| &e.check == check)
    }

    /// Every entry across all stages, in pipeline then submission order
    pub fn all_entries(&self) -> impl Iterator<Item = (Stage, &CheckEntry)> {
        self.stages
            .iter()
            .flat_map(|(stage, entries)| entries.iter().map(move |e| (stage, e)))
    }

    /// Check ids submitted into a stage
    pub fn stage_checks(&self, stage: Stage) -> Vec<CheckId> {
        self.stages
            .get(stage)
            .iter()
            .map(|e| e.check.clone())
            .collect()
    }
}

/// Aggregate status of a stage, derived from its entries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageInitiationStatus {
    NotInitiated,
    Completed,
    HasFailures,
    InProgress,
    Initiated,
}

impl StageInitiationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitiated => "not_initiated",
            Self::Completed => "completed",
            Self::HasFailures => "has_failures",
            Self::InProgress => "in_progress",
            Self::Initiated => "initiated",
        }
    }

    /// Whether the stage has finished running, successfully or not
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Completed | Self::HasFailures)
    }
}

impl std::fmt::Display for StageInitiationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
