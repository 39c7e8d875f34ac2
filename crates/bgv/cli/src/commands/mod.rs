//! CLI command implementations

pub mod candidate;
pub mod checks;
pub mod consent;
pub mod stage;

use bgv_client::HttpVerificationService;
use bgv_engine::StageOrchestrator;

/// The orchestrator every command runs against
pub type Orchestrator = StageOrchestrator<HttpVerificationService>;
