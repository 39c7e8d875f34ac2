//! Domain types for BGV stage workflows
//!
//! A candidate's background verification is split into three sequential
//! **stages** (Primary, Secondary, Final). Each stage holds a set of
//! **checks** an organization has purchased. The remote verification
//! service owns the authoritative [`VerificationRecord`]; everything this
//! crate describes about locks and stage status is derived from it.
//!
//! # Key Concepts
//!
//! - **CheckCatalog**: read-only list of checks offered to an organization,
//!   tagged API, MANUAL or AI.
//! - **Stage / PerStage**: the ordered stage enum and a fixed three-slot
//!   table keyed by it.
//! - **VerificationRecord**: per stage, the ordered list of submitted
//!   checks with their status and remarks.
//! - **Remarks**: the free-form result detail a provider attaches to a
//!   check, modelled as a tagged union instead of raw JSON.
//! - **ConsentStatus**: the candidate-side consent signal gating the
//!   Primary stage.

#![deny(unsafe_code)]

mod check;
mod consent;
mod errors;
mod ids;
mod outcome;
mod record;
mod remarks;
mod stage;

pub use check::*;
pub use consent::*;
pub use errors::*;
pub use ids::*;
pub use outcome::*;
pub use record::*;
pub use remarks::*;
pub use stage::*;
