//! Property tests: record round-trip and the stage sequence gate.

use bgv_engine::*;
use bgv_types::*;
use proptest::prelude::*;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_status() -> impl Strategy<Value = CheckStatus> {
    prop_oneof![
        Just(CheckStatus::NotStarted),
        Just(CheckStatus::Pending),
        Just(CheckStatus::InProgress),
        Just(CheckStatus::Completed),
        Just(CheckStatus::Failed),
    ]
}

/// Entries with distinct check ids drawn from a small pool
fn arb_entries(prefix: &'static str) -> impl Strategy<Value = Vec<CheckEntry>> {
    prop::collection::vec(arb_status(), 0..6).prop_map(move |statuses| {
        statuses
            .into_iter()
            .enumerate()
            .map(|(i, status)| CheckEntry::new(format!("{}{}", prefix, i), status))
            .collect()
    })
}

fn arb_record() -> impl Strategy<Value = VerificationRecord> {
    (arb_entries("P"), arb_entries("S"), arb_entries("F")).prop_map(|(p, s, f)| {
        VerificationRecord::new(
            VerificationId::new("ver-cand-1"),
            CandidateId::new("cand-1"),
            OrganizationId::new("org-1"),
        )
        .with_stage(Stage::Primary, p)
        .with_stage(Stage::Secondary, s)
        .with_stage(Stage::Final, f)
    })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// Restoring from a record reproduces its per-stage check lists
    #[test]
    fn restore_from_record_round_trips(record in arb_record()) {
        let mut store = StageAssignmentStore::new();
        store.restore_from_record(&record);

        for stage in Stage::ALL {
            prop_assert_eq!(store.pending(stage).to_vec(), record.stage_checks(stage));
        }
    }

    /// SECONDARY is only initiated once PRIMARY is COMPLETED or has failures
    #[test]
    fn secondary_initiation_follows_primary_resolution(primary in arb_entries("P")) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let record = VerificationRecord::new(
                VerificationId::new("ver-cand-1"),
                CandidateId::new("cand-1"),
                OrganizationId::new("org-1"),
            )
            .with_stage(Stage::Primary, primary.clone());
            let resolved = matches!(
                bgv_engine::status_view::stage_initiation_status(&primary),
                StageInitiationStatus::Completed | StageInitiationStatus::HasFailures
            );

            let service = Arc::new(InMemoryVerificationService::new());
            service.insert_record(record).await;
            let mut session = VerificationSession::new();
            session.select_organization(OrganizationId::new("org-1"), CheckCatalog::empty());
            session.select_candidate(CandidateId::new("cand-1"));
            session.apply_record(service.record_for(&CandidateId::new("cand-1")).await);
            {
                let (store, view) = session.store_and_view();
                store.toggle(&CheckId::new("NEW"), Stage::Secondary, &view);
            }

            let gate = FinalizationGate::new(service.clone());
            let result = gate
                .initiate_stage(&mut session, Stage::Secondary, ConsentPolicy::Enforce)
                .await;

            if resolved {
                assert!(result.is_ok(), "{:?}", result);
            } else {
                assert!(matches!(result, Err(BgvError::SequenceGate { .. })));
                assert!(service.mutating_calls().await.is_empty());
            }
        });
    }
}
