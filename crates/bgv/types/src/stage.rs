//! Stages and per-stage tables
//!
//! Stages run strictly in order: PRIMARY, then SECONDARY, then FINAL.

use serde::{Deserialize, Serialize};

/// One of the three sequential verification phases
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Primary,
    Secondary,
    Final,
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; 3] = [Stage::Primary, Stage::Secondary, Stage::Final];

    /// The stage that must be resolved before this one may be initiated
    pub fn previous(&self) -> Option<Stage> {
        match self {
            Self::Primary => None,
            Self::Secondary => Some(Self::Primary),
            Self::Final => Some(Self::Secondary),
        }
    }

    pub fn next(&self) -> Option<Stage> {
        match self {
            Self::Primary => Some(Self::Secondary),
            Self::Secondary => Some(Self::Final),
            Self::Final => None,
        }
    }

    /// Stages strictly before this one
    pub fn earlier(&self) -> impl Iterator<Item = Stage> + '_ {
        Self::ALL.into_iter().filter(move |s| s < self)
    }

    /// Wire name, also used as a URL path segment
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "PRIMARY",
            Self::Secondary => "SECONDARY",
            Self::Final => "FINAL",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stage name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage: {0} (expected primary, secondary or final)")]
pub struct ParseStageError(pub String);

impl std::str::FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" | "p" | "1" => Ok(Self::Primary),
            "secondary" | "s" | "2" => Ok(Self::Secondary),
            "final" | "f" | "3" => Ok(Self::Final),
            _ => Err(ParseStageError(s.to_string())),
        }
    }
}

// ── Per-Stage Table ──────────────────────────────────────────────────

/// Fixed three-slot table keyed by [`Stage`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de> + Default"
))]
pub struct PerStage<T> {
    #[serde(default)]
    pub primary: T,
    #[serde(default)]
    pub secondary: T,
    #[serde(default, rename = "final")]
    pub final_stage: T,
}

impl<T> PerStage<T> {
    pub fn new(primary: T, secondary: T, final_stage: T) -> Self {
        Self {
            primary,
            secondary,
            final_stage,
        }
    }

    pub fn from_fn(mut f: impl FnMut(Stage) -> T) -> Self {
        Self {
            primary: f(Stage::Primary),
            secondary: f(Stage::Secondary),
            final_stage: f(Stage::Final),
        }
    }

    pub fn get(&self, stage: Stage) -> &T {
        match stage {
            Stage::Primary => &self.primary,
            Stage::Secondary => &self.secondary,
            Stage::Final => &self.final_stage,
        }
    }

    pub fn get_mut(&mut self, stage: Stage) -> &mut T {
        match stage {
            Stage::Primary => &mut self.primary,
            Stage::Secondary => &mut self.secondary,
            Stage::Final => &mut self.final_stage,
        }
    }

    /// Slots in pipeline order
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &T)> {
        Stage::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Stage, &T) -> U) -> PerStage<U> {
        PerStage::from_fn(|s| f(s, self.get(s)))
    }
}
