//! Availability resolver: which checks a stage picker offers
//!
//! Each check should be processed exactly once across the pipeline, so a
//! check taken by an earlier stage disappears from later pickers. A
//! stage's own pending checks always stay visible so they can still be
//! deselected before finalization.

use crate::assignment_store::CheckAssignment;
use crate::status_view::StatusView;
use bgv_types::*;

/// Computes visible checks per stage
#[derive(Clone, Debug, Default)]
pub struct AvailabilityResolver;

impl AvailabilityResolver {
    pub fn new() -> Self {
        Self
    }

    /// Checks to show for `stage`.
    ///
    /// A locked stage shows what was finalized into it, followed by any
    /// checks carried into it after finalization. An unlocked stage shows
    /// the catalog minus everything assigned to earlier stages, plus its own
    /// pending checks. Catalog order comes first, then pending checks the
    /// catalog does not list.
    pub fn compute_visible(
        &self,
        stage: Stage,
        catalog: &CheckCatalog,
        assignment: &CheckAssignment,
        view: &StatusView<'_>,
    ) -> Vec<CheckId> {
        let own = assignment.pending(stage);

        if view.is_stage_locked(stage) {
            let mut visible: Vec<CheckId> = view.entries(stage).iter().map(|e| e.check.clone()).collect();
            for check in own {
                if !visible.contains(check) {
                    visible.push(check.clone());
                }
            }
            return visible;
        }

        let taken_earlier = |check: &CheckId| {
            stage
                .earlier()
                .any(|earlier| assignment.contains(earlier, check))
        };

        let mut visible: Vec<CheckId> = catalog
            .ids()
            .filter(|c| own.contains(c) || !taken_earlier(c))
            .cloned()
            .collect();

        for check in own {
            if !visible.contains(check) {
                visible.push(check.clone());
            }
        }
        visible
    }

    /// Catalog checks assigned to no stage at all
    pub fn never_assigned(&self, catalog: &CheckCatalog, assignment: &CheckAssignment) -> Vec<CheckId> {
        catalog
            .ids()
            .filter(|c| !assignment.is_assigned(c))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment_store::StageAssignmentStore;

    fn catalog(ids: &[&str]) -> CheckCatalog {
        ids.iter()
            .map(|c| OfferedCheck::new(*c, CheckCategory::Api))
            .collect()
    }

    fn id(s: &str) -> CheckId {
        CheckId::new(s)
    }

    fn ids(v: &[&str]) -> Vec<CheckId> {
        v.iter().map(|s| id(s)).collect()
    }

    #[test]
    fn test_primary_unlocked_shows_whole_catalog() {
        let resolver = AvailabilityResolver::new();
        let cat = catalog(&["X", "Y", "Z"]);
        let mut store = StageAssignmentStore::new();
        store.toggle(&id("Y"), Stage::Secondary, &StatusView::empty());

        let visible =
            resolver.compute_visible(Stage::Primary, &cat, store.assignment(), &StatusView::empty());
        assert_eq!(visible, ids(&["X", "Y", "Z"]));
    }

    #[test]
    fn test_secondary_hides_primary_selections() {
        let resolver = AvailabilityResolver::new();
        let cat = catalog(&["X", "Y", "Z"]);
        let view = StatusView::empty();
        let mut store = StageAssignmentStore::new();
        store.toggle(&id("X"), Stage::Primary, &view);
        store.toggle(&id("Y"), Stage::Primary, &view);

        let visible = resolver.compute_visible(Stage::Secondary, &cat, store.assignment(), &view);
        assert_eq!(visible, ids(&["Z"]));
    }

    #[test]
    fn test_final_hides_primary_and_secondary() {
        let resolver = AvailabilityResolver::new();
        let cat = catalog(&["W", "X", "Y", "Z"]);
        let view = StatusView::empty();
        let mut store = StageAssignmentStore::new();
        store.toggle(&id("W"), Stage::Primary, &view);
        store.toggle(&id("X"), Stage::Secondary, &view);
        store.toggle(&id("Z"), Stage::Final, &view);

        let visible = resolver.compute_visible(Stage::Final, &cat, store.assignment(), &view);
        assert_eq!(visible, ids(&["Y", "Z"]));
    }

    #[test]
    fn test_own_pending_outside_catalog_stays_visible() {
        let resolver = AvailabilityResolver::new();
        let cat = catalog(&["X"]);
        let view = StatusView::empty();
        let mut store = StageAssignmentStore::new();
        store.toggle(&id("LEGACY"), Stage::Secondary, &view);

        let visible = resolver.compute_visible(Stage::Secondary, &cat, store.assignment(), &view);
        assert_eq!(visible, ids(&["X", "LEGACY"]));
    }

    #[test]
    fn test_locked_stage_shows_only_finalized() {
        let resolver = AvailabilityResolver::new();
        let cat = catalog(&["X", "Y", "Z"]);
        let rec = VerificationRecord::new(
            VerificationId::new("v"),
            CandidateId::new("c"),
            OrganizationId::new("o"),
        )
        .with_stage(
            Stage::Primary,
            vec![
                CheckEntry::new("Y", CheckStatus::NotStarted),
                CheckEntry::new("X", CheckStatus::NotStarted),
            ],
        );
        let view = StatusView::new(Some(&rec));
        let mut store = StageAssignmentStore::new();
        store.restore_from_record(&rec);

        let visible = resolver.compute_visible(Stage::Primary, &cat, store.assignment(), &view);
        assert_eq!(visible, ids(&["Y", "X"]));
    }

    #[test]
    fn test_locked_final_shows_carried_checks_after_entries() {
        let resolver = AvailabilityResolver::new();
        let cat = catalog(&["W", "Z"]);
        let rec = VerificationRecord::new(
            VerificationId::new("v"),
            CandidateId::new("c"),
            OrganizationId::new("o"),
        )
        .with_stage(Stage::Final, vec![CheckEntry::new("Z", CheckStatus::NotStarted)]);
        let view = StatusView::new(Some(&rec));
        let mut store = StageAssignmentStore::new();
        store.restore_from_record(&rec);
        store.append(Stage::Final, [id("W")]);

        let visible = resolver.compute_visible(Stage::Final, &cat, store.assignment(), &view);
        assert_eq!(visible, ids(&["Z", "W"]));
    }

    #[test]
    fn test_never_assigned() {
        let resolver = AvailabilityResolver::new();
        let cat = catalog(&["X", "Y", "Z"]);
        let mut store = StageAssignmentStore::new();
        store.toggle(&id("Y"), Stage::Secondary, &StatusView::empty());

        assert_eq!(
            resolver.never_assigned(&cat, store.assignment()),
            ids(&["X", "Z"])
        );
    }
}
