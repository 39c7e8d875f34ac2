//! End-to-end stage workflow against the in-memory service.
//!
//! Walks one candidate from selection through PRIMARY initiation, a
//! partially failing run and the retry pass, then covers the consent block
//! and the stage ordering rules.

use bgv_engine::*;
use bgv_types::*;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn id(s: &str) -> CheckId {
    CheckId::new(s)
}

fn catalog() -> Vec<OfferedCheck> {
    vec![
        OfferedCheck::new("X", CheckCategory::Api),
        OfferedCheck::new("Y", CheckCategory::Api),
        OfferedCheck::new("Z", CheckCategory::Manual),
    ]
}

async fn orchestrator_with(
    consent: ConsentStatus,
) -> (Arc<InMemoryVerificationService>, StageOrchestrator<InMemoryVerificationService>) {
    let service = Arc::new(
        InMemoryVerificationService::new().with_catalog(OrganizationId::new("org-1"), catalog()),
    );
    service.set_consent(CandidateId::new("cand-1"), consent).await;

    let mut orchestrator = StageOrchestrator::new(service.clone());
    orchestrator
        .load_organization(OrganizationId::new("org-1"))
        .await
        .unwrap();
    orchestrator
        .load_candidate(CandidateId::new("cand-1"))
        .await
        .unwrap();
    service.clear_calls().await;
    (service, orchestrator)
}

async fn primary_initiated() -> (Arc<InMemoryVerificationService>, StageOrchestrator<InMemoryVerificationService>) {
    let (service, mut orchestrator) = orchestrator_with(ConsentStatus::ConsentGiven).await;
    orchestrator.toggle(&id("X"), Stage::Primary);
    orchestrator.toggle(&id("Y"), Stage::Primary);
    orchestrator
        .initiate_stage(Stage::Primary, ConsentPolicy::Enforce)
        .await
        .unwrap();
    service.clear_calls().await;
    (service, orchestrator)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn selecting_primary_hides_checks_from_later_stages() {
    let (_, mut orchestrator) = orchestrator_with(ConsentStatus::ConsentGiven).await;

    orchestrator.toggle(&id("X"), Stage::Primary);
    orchestrator.toggle(&id("Y"), Stage::Primary);

    assert_eq!(
        orchestrator.session().assignment().pending(Stage::Primary),
        &[id("X"), id("Y")]
    );
    assert!(orchestrator
        .session()
        .assignment()
        .pending(Stage::Secondary)
        .is_empty());
    assert_eq!(orchestrator.visible_checks(Stage::Secondary), vec![id("Z")]);
}

#[tokio::test]
async fn initiating_primary_locks_it_to_the_submitted_checks() {
    let (service, orchestrator) = primary_initiated().await;

    let record = service
        .record_for(&CandidateId::new("cand-1"))
        .await
        .unwrap();
    let entries: Vec<(CheckId, CheckStatus)> = record
        .entries(Stage::Primary)
        .iter()
        .map(|e| (e.check.clone(), e.status))
        .collect();
    assert_eq!(
        entries,
        vec![
            (id("X"), CheckStatus::NotStarted),
            (id("Y"), CheckStatus::NotStarted),
        ]
    );

    let view = orchestrator.session().view();
    assert!(view.is_stage_locked(Stage::Primary));
    assert_eq!(orchestrator.visible_checks(Stage::Primary), vec![id("X"), id("Y")]);
}

#[tokio::test]
async fn partial_stage_failure_is_reported_and_stage_stays_locked() {
    let (service, mut orchestrator) = primary_initiated().await;
    service.script_outcomes("X", vec![CheckStatus::Failed]).await;

    let run = orchestrator.run_stage(Stage::Primary).await.unwrap();
    assert_eq!(
        run.outcome,
        StageRunOutcome::Failed {
            failed_checks: vec![id("X")]
        }
    );

    let view = orchestrator.session().view();
    assert_eq!(view.check_status(&id("X")), Some(CheckStatus::Failed));
    assert_eq!(view.check_status(&id("Y")), Some(CheckStatus::Completed));
    assert!(view.is_stage_locked(Stage::Primary));
    assert_eq!(
        view.stage_initiation_status(Stage::Primary),
        StageInitiationStatus::HasFailures
    );
}

#[tokio::test]
async fn retry_touches_only_failed_checks() {
    let (service, mut orchestrator) = primary_initiated().await;
    service.script_outcomes("X", vec![CheckStatus::Failed]).await;
    orchestrator.run_stage(Stage::Primary).await.unwrap();
    service.clear_calls().await;

    let report = orchestrator.retry_failed_checks().await.unwrap();

    assert_eq!(report.attempted, vec![(Stage::Primary, id("X"))]);
    assert_eq!(report.succeeded, vec![(Stage::Primary, id("X"))]);
    assert_eq!(
        service.mutating_calls().await,
        vec![ServiceCall::RetryCheck(Stage::Primary, id("X"))]
    );
    assert!(orchestrator.session().view().is_stage_completed(Stage::Primary));
}

#[tokio::test]
async fn pending_consent_blocks_primary_until_overridden() {
    let (service, mut orchestrator) = orchestrator_with(ConsentStatus::PendingConsent).await;
    orchestrator.toggle(&id("X"), Stage::Primary);

    let err = orchestrator
        .initiate_stage(Stage::Primary, ConsentPolicy::Enforce)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BgvError::ConsentRequired {
            status: ConsentStatus::PendingConsent
        }
    );
    assert!(err.is_soft());
    assert!(service.calls().await.is_empty());

    let receipt = orchestrator
        .initiate_stage(Stage::Primary, ConsentPolicy::Override)
        .await
        .unwrap();
    assert_eq!(receipt.submitted, vec![id("X")]);
    assert_eq!(
        service.mutating_calls().await,
        vec![ServiceCall::InitiateStageChecks {
            stage: Stage::Primary,
            checks: vec![id("X")],
        }]
    );
}

// ---------------------------------------------------------------------------
// Ordering and idempotence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reinitiating_processed_stage_selects_nothing() {
    let (service, mut orchestrator) = primary_initiated().await;
    orchestrator.run_stage(Stage::Primary).await.unwrap();
    service.clear_calls().await;

    let err = orchestrator
        .initiate_stage(Stage::Primary, ConsentPolicy::Enforce)
        .await
        .unwrap_err();
    assert_eq!(err, BgvError::NoChecksSelected { processed: 2 });
    assert!(service.mutating_calls().await.is_empty());
}

#[tokio::test]
async fn secondary_waits_for_primary_to_resolve() {
    let (service, mut orchestrator) = primary_initiated().await;
    orchestrator.toggle(&id("Z"), Stage::Secondary);

    let err = orchestrator
        .initiate_stage(Stage::Secondary, ConsentPolicy::Enforce)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BgvError::SequenceGate {
            stage: Stage::Secondary,
            previous: Stage::Primary,
            ..
        }
    ));
    assert!(service.mutating_calls().await.is_empty());

    service.script_outcomes("Y", vec![CheckStatus::Failed]).await;
    orchestrator.run_stage(Stage::Primary).await.unwrap();
    let receipt = orchestrator
        .initiate_stage(Stage::Secondary, ConsentPolicy::Enforce)
        .await
        .unwrap();
    assert_eq!(receipt.submitted, vec![id("Z")]);
}

#[tokio::test]
async fn final_stage_with_nothing_selected_is_rejected() {
    let (service, mut orchestrator) = primary_initiated().await;
    orchestrator.run_stage(Stage::Primary).await.unwrap();

    // FINAL needs SECONDARY resolved
    orchestrator.toggle(&id("Z"), Stage::Secondary);
    orchestrator
        .initiate_stage(Stage::Secondary, ConsentPolicy::Enforce)
        .await
        .unwrap();
    orchestrator.run_stage(Stage::Secondary).await.unwrap();
    service.clear_calls().await;

    let err = orchestrator
        .initiate_stage(Stage::Final, ConsentPolicy::Enforce)
        .await
        .unwrap_err();
    assert_eq!(err, BgvError::NoChecksSelected { processed: 0 });
    assert!(service.mutating_calls().await.is_empty());
}

#[tokio::test]
async fn toggling_a_submitted_check_is_rejected() {
    let (_, mut orchestrator) = primary_initiated().await;
    let before = orchestrator.session().assignment().clone();

    let outcome = orchestrator.toggle(&id("X"), Stage::Secondary);
    assert_eq!(
        outcome,
        ToggleOutcome::Rejected(ToggleRejection::CheckLocked {
            check: id("X"),
            stage: Stage::Primary,
            status: CheckStatus::NotStarted,
        })
    );
    assert_eq!(orchestrator.session().assignment(), &before);
}

#[tokio::test]
async fn failed_checks_can_move_to_a_later_stage() {
    let (service, mut orchestrator) = primary_initiated().await;
    service.script_outcomes("X", vec![CheckStatus::Failed]).await;
    orchestrator.run_stage(Stage::Primary).await.unwrap();

    let outcome = orchestrator.toggle(&id("X"), Stage::Secondary);
    assert!(!outcome.is_rejected());
    assert!(orchestrator
        .session()
        .assignment()
        .contains(Stage::Secondary, &id("X")));
}

#[tokio::test]
async fn switching_candidate_resets_session() {
    let (_, mut orchestrator) = primary_initiated().await;
    orchestrator.session_mut().set_stage(Stage::Secondary);

    orchestrator
        .load_candidate(CandidateId::new("cand-2"))
        .await
        .unwrap();

    let session = orchestrator.session();
    assert!(session.record().is_none());
    assert!(session.assignment().is_empty());
    assert_eq!(session.current_stage(), Stage::Primary);
    assert_eq!(session.consent(), Some(ConsentStatus::NotRequested));
}

#[tokio::test]
async fn consent_resend_after_expiry() {
    let (service, mut orchestrator) = orchestrator_with(ConsentStatus::NotRequested).await;

    let first = orchestrator.send_consent().await.unwrap();
    service
        .set_consent(CandidateId::new("cand-1"), ConsentStatus::TokenExpired)
        .await;
    assert_eq!(
        orchestrator.refresh_consent().await.unwrap(),
        ConsentStatus::TokenExpired
    );

    let second = orchestrator.send_consent().await.unwrap();
    assert_ne!(first.token, second.token);
    assert_eq!(
        orchestrator.session().consent(),
        Some(ConsentStatus::PendingConsent)
    );
}

// ---------------------------------------------------------------------------
// FINAL carry-over
// ---------------------------------------------------------------------------

/// PRIMARY and SECONDARY completed, FINAL initiated with Z; W was never picked
async fn final_initiated_with_leftover() -> (
    Arc<InMemoryVerificationService>,
    StageOrchestrator<InMemoryVerificationService>,
    InitiationReceipt,
) {
    let mut offered = catalog();
    offered.push(OfferedCheck::new("W", CheckCategory::Ai));
    let service = Arc::new(
        InMemoryVerificationService::new().with_catalog(OrganizationId::new("org-1"), offered),
    );
    service
        .set_consent(CandidateId::new("cand-1"), ConsentStatus::ConsentGiven)
        .await;

    let mut orchestrator = StageOrchestrator::new(service.clone());
    orchestrator
        .load_organization(OrganizationId::new("org-1"))
        .await
        .unwrap();
    orchestrator
        .load_candidate(CandidateId::new("cand-1"))
        .await
        .unwrap();

    for (stage, check) in [(Stage::Primary, "X"), (Stage::Secondary, "Y")] {
        orchestrator.toggle(&id(check), stage);
        orchestrator
            .initiate_stage(stage, ConsentPolicy::Enforce)
            .await
            .unwrap();
        orchestrator.run_stage(stage).await.unwrap();
    }

    orchestrator.toggle(&id("Z"), Stage::Final);
    let receipt = orchestrator
        .initiate_stage(Stage::Final, ConsentPolicy::Enforce)
        .await
        .unwrap();
    service.clear_calls().await;
    (service, orchestrator, receipt)
}

#[tokio::test]
async fn carried_over_check_survives_refresh_and_is_submitted() {
    let (service, mut orchestrator, receipt) = final_initiated_with_leftover().await;
    assert_eq!(receipt.carried_over, vec![id("W")]);

    orchestrator.refresh().await.unwrap();
    assert_eq!(
        orchestrator.session().assignment().pending(Stage::Final),
        &[id("Z"), id("W")]
    );
    assert_eq!(orchestrator.visible_checks(Stage::Final), vec![id("Z"), id("W")]);

    let receipt = orchestrator
        .initiate_stage(Stage::Final, ConsentPolicy::Enforce)
        .await
        .unwrap();
    assert!(receipt.submitted.contains(&id("W")));
    let record = service
        .record_for(&CandidateId::new("cand-1"))
        .await
        .unwrap();
    assert!(record.entry(Stage::Final, &id("W")).is_some());
    assert!(orchestrator.session().carried_over().is_empty());
}

#[tokio::test]
async fn carried_over_check_survives_a_saved_session() {
    let (service, orchestrator, _) = final_initiated_with_leftover().await;
    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.carried_over, vec![id("W")]);

    let mut resumed = StageOrchestrator::new(service);
    let dropped = resumed.resume(snapshot).await.unwrap();
    assert!(dropped.is_empty());
    assert_eq!(resumed.session().carried_over(), &[id("W")]);
    assert!(resumed
        .session()
        .assignment()
        .contains(Stage::Final, &id("W")));
}
