//! File-backed ledger store.
//!
//! One JSON snapshot per transition. Writes go to a temp file, are synced
//! to disk, then renamed into place: a crash leaves the transition either
//! fully persisted or absent, never partially visible.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use gsep_types::TransitionId;
use tracing::debug;

use crate::error::LedgerError;
use crate::model::SealedLedger;
use crate::traits::LedgerStore;

pub struct FileLedgerStore {
    data_dir: PathBuf,
}

impl FileLedgerStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    fn ledger_path(&self, transition_id: &TransitionId) -> PathBuf {
        self.data_dir.join(format!("ledger-{}.json", transition_id.0))
    }
}

impl LedgerStore for FileLedgerStore {
    fn persist(&self, sealed: &SealedLedger) -> Result<(), LedgerError> {
        let bytes =
            serde_json::to_vec_pretty(sealed).map_err(|e| LedgerError::Persistence(e.to_string()))?;

        let final_path = self.ledger_path(&sealed.transition_id);
        let tmp_path = final_path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&bytes)?;
        // Durability confirmation: data must hit the medium before the
        // rename makes the snapshot visible.
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, &final_path)?;
        sync_dir(&self.data_dir)?;

        debug!(ledger = %sealed.ledger_id, path = %final_path.display(), "sealed ledger persisted");
        Ok(())
    }

    fn load(&self, transition_id: &TransitionId) -> Result<Option<SealedLedger>, LedgerError> {
        let path = self.ledger_path(transition_id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        let sealed =
            serde_json::from_slice(&bytes).map_err(|e| LedgerError::Persistence(e.to_string()))?;
        Ok(Some(sealed))
    }
}

/// Sync the directory entry so the rename itself is durable.
fn sync_dir(dir: &Path) -> Result<(), LedgerError> {
    #[cfg(unix)]
    {
        fs::File::open(dir)?.sync_all()?;
    }
    #[cfg(not(unix))]
    {
        let _ = dir;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gsep_types::{FinalStatus, LedgerId};
    use serde_json::json;

    fn sample(transition_id: TransitionId) -> SealedLedger {
        SealedLedger {
            ledger_id: LedgerId::generate(),
            transition_id,
            final_status: FinalStatus::Committed,
            receipt: json!({"final_lock": "abc"}),
            records: vec![],
            sealed_at: Utc::now(),
        }
    }

    #[test]
    fn persist_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLedgerStore::new(dir.path()).unwrap();
        let tid = TransitionId::new();
        let sealed = sample(tid);

        store.persist(&sealed).unwrap();
        let loaded = store.load(&tid).unwrap().unwrap();
        assert_eq!(loaded, sealed);
    }

    #[test]
    fn load_missing_transition_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLedgerStore::new(dir.path()).unwrap();
        assert!(store.load(&TransitionId::new()).unwrap().is_none());
    }

    #[test]
    fn no_temp_files_remain_after_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLedgerStore::new(dir.path()).unwrap();
        store.persist(&sample(TransitionId::new())).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
