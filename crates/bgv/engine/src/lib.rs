//! Stage workflow engine for BGV
//!
//! The engine drives a candidate's background verification through its
//! three stages. It keeps the operator's pending selection consistent,
//! derives every lock from the service's record, and gates submission on
//! stage order and candidate consent.
//!
//! # Key Principle
//!
//! **The engine coordinates, the service executes.**
//!
//! Check statuses are never set locally. Each mutating call is followed by
//! a reload of the authoritative [`VerificationRecord`](bgv_types::VerificationRecord).
//!
//! # Architecture
//!
//! The [`StageOrchestrator`] composes specialized components:
//!
//! - [`StageAssignmentStore`]: Pending stage to checks selection
//! - [`StatusView`]: Check status, stage status and lock derivation
//! - [`AvailabilityResolver`]: Which checks a stage picker offers
//! - [`FinalizationGate`]: Stage initiation in sequence
//! - [`ExecutionGate`]: Stage runs, single checks and retries
//! - [`ConsentGate`]: Candidate consent before PRIMARY
//! - [`ManualReview`]: Operator verdicts on MANUAL and AI checks
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use bgv_engine::{ConsentPolicy, InMemoryVerificationService, StageOrchestrator};
//! use bgv_types::*;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let service = Arc::new(InMemoryVerificationService::new().with_catalog(
//!     OrganizationId::new("acme"),
//!     vec![OfferedCheck::new("PAN", CheckCategory::Api)],
//! ));
//! service.set_consent(CandidateId::new("c-42"), ConsentStatus::ConsentGiven).await;
//!
//! let mut orchestrator = StageOrchestrator::new(service);
//! orchestrator.load_organization(OrganizationId::new("acme")).await.unwrap();
//! orchestrator.load_candidate(CandidateId::new("c-42")).await.unwrap();
//!
//! orchestrator.toggle(&CheckId::new("PAN"), Stage::Primary);
//! let receipt = orchestrator
//!     .initiate_stage(Stage::Primary, ConsentPolicy::Enforce)
//!     .await
//!     .unwrap();
//! assert_eq!(receipt.submitted.len(), 1);
//! assert!(orchestrator.session().view().is_stage_locked(Stage::Primary));
//! # }
//! ```

#![deny(unsafe_code)]

pub mod assignment_store;
pub mod availability;
pub mod consent_gate;
pub mod execution;
pub mod finalization;
pub mod manual_review;
pub mod memory;
pub mod orchestrator;
pub mod service;
pub mod session;
pub mod status_view;

// Re-export main types
pub use assignment_store::{CheckAssignment, StageAssignmentStore, ToggleOutcome, ToggleRejection};
pub use availability::AvailabilityResolver;
pub use consent_gate::{ConsentGate, ConsentPolicy};
pub use execution::{Executed, ExecutionGate, RetryError, RetryReport};
pub use finalization::{FinalizationGate, InitiationReceipt};
pub use manual_review::{ManualReview, MANUAL_STATUSES};
pub use memory::{InMemoryVerificationService, ServiceCall};
pub use orchestrator::{CheckRow, StageOrchestrator, StageOverview};
pub use service::VerificationService;
pub use session::{SessionSnapshot, VerificationSession};
pub use status_view::{StageSummary, StatusView};
