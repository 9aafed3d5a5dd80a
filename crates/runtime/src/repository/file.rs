//! File-based RoundRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use word_core::{Identity, Prize, Round, RoundNumber};

use super::table::{RoundTable, StoreDocument};
use super::{RepositoryError, Result, RoundRepository, UpdateOutcome};

/// File-based implementation of RoundRepository.
///
/// # File Format
///
/// One pretty-printed JSON document holding the allocation counter and every
/// round:
///
/// ```json
/// { "nextRound": 3, "rounds": [ { "round": 1, "commitment": "0x…", … } ] }
/// ```
///
/// Each mutation writes the whole document to a temp file and renames it over
/// the original, so a crash leaves either the old or the new document. The
/// in-memory table only changes after the rename succeeds.
pub struct FileRoundRepository {
    path: PathBuf,
    table: Mutex<RoundTable>,
}

impl FileRoundRepository {
    /// Open the store at `path`, creating an empty one if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let table = if path.exists() {
            let bytes = fs::read(&path)?;
            let document: StoreDocument =
                serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Json(e.to_string()))?;
            let table = RoundTable::from_document(document)?;
            tracing::info!(path = %path.display(), rounds = table.list().len(), "Loaded round store");
            table
        } else {
            tracing::info!(path = %path.display(), "Creating new round store");
            RoundTable::default()
        };

        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, RoundTable>> {
        self.table.lock().map_err(|_| RepositoryError::LockPoisoned)
    }

    fn persist(&self, table: &RoundTable) -> Result<()> {
        let temp_path = self.path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(&table.to_document())
            .map_err(|e| RepositoryError::Json(e.to_string()))?;

        fs::write(&temp_path, bytes)?;

        // Atomic rename
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!("Saved round store to {}", self.path.display());
        Ok(())
    }

    /// Apply `update` to a copy of the table and keep it only if it was persisted.
    fn mutate<T>(
        &self,
        update: impl FnOnce(&mut RoundTable) -> Result<(T, bool)>,
    ) -> Result<T> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        let (value, changed) = update(&mut next)?;
        if changed {
            self.persist(&next)?;
            *guard = next;
        }
        Ok(value)
    }

    fn conditional(
        &self,
        update: impl FnOnce(&mut RoundTable) -> UpdateOutcome,
    ) -> Result<UpdateOutcome> {
        self.mutate(|table| {
            let outcome = update(table);
            Ok((outcome, outcome == UpdateOutcome::Applied))
        })
    }
}

impl RoundRepository for FileRoundRepository {
    fn next_round_number(&self) -> Result<RoundNumber> {
        self.mutate(|table| Ok((table.allocate(), true)))
    }

    fn insert(&self, round: &Round) -> Result<()> {
        self.mutate(|table| table.insert(round).map(|()| ((), true)))
    }

    fn load(&self, round: RoundNumber) -> Result<Option<Round>> {
        Ok(self.lock()?.get(round).cloned())
    }

    fn list(&self) -> Result<Vec<Round>> {
        Ok(self.lock()?.list())
    }

    fn append_whisperer(&self, round: RoundNumber, identity: &Identity) -> Result<UpdateOutcome> {
        self.conditional(|table| table.append_whisperer(round, identity))
    }

    fn finalize(
        &self,
        round: RoundNumber,
        shouter: &Identity,
        phrase: &str,
    ) -> Result<UpdateOutcome> {
        self.conditional(|table| table.finalize(round, shouter, phrase))
    }

    fn add_prize(&self, round: RoundNumber, amount: Prize) -> Result<UpdateOutcome> {
        self.conditional(|table| table.add_prize(round, amount))
    }
}
