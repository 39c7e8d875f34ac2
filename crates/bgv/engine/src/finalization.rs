//! Finalization gate: submits a stage's pending selection ("initiate")
//!
//! Stages are initiated in order. Checks the service has already
//! processed are dropped from the outgoing request so a resubmission never
//! creates duplicate entries. On success the session adopts the record the
//! service returns; nothing is marked locally.

use crate::availability::AvailabilityResolver;
use crate::consent_gate::{ConsentGate, ConsentPolicy};
use crate::service::VerificationService;
use crate::session::VerificationSession;
use bgv_types::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What a successful initiation submitted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiationReceipt {
    pub stage: Stage,
    /// Checks sent to the service
    pub submitted: Vec<CheckId>,
    /// Pending checks dropped because the service had already processed them
    pub processed: Vec<CheckId>,
    /// FINAL only: catalog checks never assigned anywhere, now pending in FINAL
    pub carried_over: Vec<CheckId>,
}

/// Submits stage selections to the verification service
pub struct FinalizationGate<S: ?Sized> {
    service: Arc<S>,
    consent: ConsentGate<S>,
    availability: AvailabilityResolver,
}

impl<S: VerificationService + ?Sized> FinalizationGate<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            consent: ConsentGate::new(Arc::clone(&service)),
            service,
            availability: AvailabilityResolver::new(),
        }
    }

    /// Initiate `stage` with its pending selection.
    ///
    /// Fails locally, before any submission, when the candidate or
    /// organization is missing, the previous stage is unresolved, consent
    /// blocks PRIMARY, or nothing unprocessed is pending.
    pub async fn initiate_stage(
        &self,
        session: &mut VerificationSession,
        stage: Stage,
        consent: ConsentPolicy,
    ) -> BgvResult<InitiationReceipt> {
        let (candidate, organization) = session.require_selection()?;

        if let Some(previous) = stage.previous() {
            let view = session.view();
            if !view.is_prev_stage_completed(stage) {
                return Err(BgvError::SequenceGate {
                    stage,
                    previous,
                    status: view.stage_initiation_status(previous),
                });
            }
        }

        self.consent.ensure(session, stage, consent).await?;

        let (submitted, processed) = {
            let view = session.view();
            let (fresh, processed): (Vec<CheckId>, Vec<CheckId>) = session
                .assignment()
                .pending(stage)
                .iter()
                .cloned()
                .partition(|c| view.is_unprocessed(c));
            (fresh, processed)
        };

        if submitted.is_empty() {
            tracing::info!(
                candidate = %candidate,
                stage = %stage,
                processed = processed.len(),
                "Nothing to initiate"
            );
            return Err(BgvError::NoChecksSelected {
                processed: processed.len(),
            });
        }

        let request = InitiateStageRequest {
            candidate_id: candidate.clone(),
            organization_id: organization,
            stage,
            checks: submitted.clone(),
        };
        let record = self.service.initiate_stage_checks(&request).await?;
        if record.candidate_id != candidate {
            return Err(BgvError::server(
                None,
                format!(
                    "service returned the record of {} while initiating {}",
                    record.candidate_id, candidate
                ),
            ));
        }
        session.apply_record(Some(record));

        let carried_over = if stage == Stage::Final {
            let unassigned = self
                .availability
                .never_assigned(session.catalog(), session.assignment());
            session.carry_over(unassigned)
        } else {
            Vec::new()
        };

        tracing::info!(
            candidate = %candidate,
            stage = %stage,
            submitted = submitted.len(),
            processed = processed.len(),
            carried_over = carried_over.len(),
            "Stage initiated"
        );

        Ok(InitiationReceipt {
            stage,
            submitted,
            processed,
            carried_over,
        })
    }
}
