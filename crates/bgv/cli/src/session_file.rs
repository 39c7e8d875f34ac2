//! Session snapshot persistence between invocations

use anyhow::{Context, Result};
use bgv_engine::SessionSnapshot;
use std::path::Path;

/// Read a saved snapshot; a missing file is an empty session
pub fn load(path: &Path) -> Result<SessionSnapshot> {
    if !path.exists() {
        return Ok(SessionSnapshot::default());
    }
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

pub fn save(path: &Path, snapshot: &SessionSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Session saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bgv_engine::CheckAssignment;
    use bgv_types::*;

    #[test]
    fn test_missing_file_is_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = load(&dir.path().join("session.json")).unwrap();
        assert_eq!(snapshot, SessionSnapshot::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut pending = CheckAssignment::new();
        pending.insert(Stage::Secondary, CheckId::new("EDU"));
        let snapshot = SessionSnapshot {
            organization: Some(OrganizationId::new("acme")),
            candidate: Some(CandidateId::new("c-42")),
            current_stage: Stage::Secondary,
            pending,
            carried_over: vec![CheckId::new("PAN")],
        };

        save(&path, &snapshot).unwrap();
        assert_eq!(load(&path).unwrap(), snapshot);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load(&path).is_err());
    }
}
