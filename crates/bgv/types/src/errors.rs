//! Error types for BGV stage workflows

use crate::{ConsentStatus, Stage, StageInitiationStatus};

/// Errors that can occur in stage workflow operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BgvError {
    /// Missing candidate, organization, record or selection. Never reaches the network.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No checks selected ({processed} already processed)")]
    NoChecksSelected { processed: usize },

    #[error("{stage} cannot be initiated: {previous} is {status}")]
    SequenceGate {
        stage: Stage,
        previous: Stage,
        status: StageInitiationStatus,
    },

    /// Soft block: the operator may override and proceed
    #[error("Candidate consent is {status}; confirm to proceed without consent")]
    ConsentRequired { status: ConsentStatus },

    #[error("Consent email cannot be sent while consent is {status}")]
    ConsentNotSendable { status: ConsentStatus },

    /// Server rejected the call; `message` is the server's own detail text
    #[error("{message}")]
    Server {
        status: Option<u16>,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Decode error: {0}")]
    Decode(String),
}

impl BgvError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn server(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Warnings the operator can explicitly override
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::ConsentRequired { .. })
    }
}

/// Result type alias for stage workflow operations
pub type BgvResult<T> = Result<T, BgvError>;
