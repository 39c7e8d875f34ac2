//! Requests to and outcomes from the remote verification service

use crate::{CandidateId, CheckId, CheckStatus, OrganizationId, Remarks, Stage};
use serde::{Deserialize, Serialize};

/// Body of an `initiateStageChecks` call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateStageRequest {
    pub candidate_id: CandidateId,
    pub organization_id: OrganizationId,
    pub stage: Stage,
    pub checks: Vec<CheckId>,
}

/// Overall result of running a stage
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageRunOutcome {
    Completed,
    /// The run finished but some checks failed
    Failed {
        #[serde(rename = "failedChecks", default)]
        failed_checks: Vec<CheckId>,
    },
}

impl StageRunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn failed_checks(&self) -> &[CheckId] {
        match self {
            Self::Completed => &[],
            Self::Failed { failed_checks } => failed_checks,
        }
    }
}

/// Result of starting a single check
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckRunOutcome {
    pub status: CheckStatus,
}

/// Result of retrying a single failed check
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryOutcome {
    pub status: CheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<Remarks>,
}

/// Operator verdict on a manual or AI-assisted check
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManualCheckUpdate {
    pub status: CheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<Remarks>,
}
