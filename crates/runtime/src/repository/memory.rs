//! In-memory RoundRepository implementation for tests and local runs.

use std::sync::RwLock;

use word_core::{Identity, Prize, Round, RoundNumber};

use super::table::RoundTable;
use super::{RepositoryError, Result, RoundRepository, UpdateOutcome};

/// In-memory implementation of RoundRepository.
///
/// Rounds are lost when the process exits.
#[derive(Default)]
pub struct InMemoryRoundRepository {
    table: RwLock<RoundTable>,
}

impl InMemoryRoundRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoundRepository for InMemoryRoundRepository {
    fn next_round_number(&self) -> Result<RoundNumber> {
        let mut table = self
            .table
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(table.allocate())
    }

    fn insert(&self, round: &Round) -> Result<()> {
        let mut table = self
            .table
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        table.insert(round)
    }

    fn load(&self, round: RoundNumber) -> Result<Option<Round>> {
        let table = self
            .table
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(table.get(round).cloned())
    }

    fn list(&self) -> Result<Vec<Round>> {
        let table = self
            .table
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(table.list())
    }

    fn append_whisperer(&self, round: RoundNumber, identity: &Identity) -> Result<UpdateOutcome> {
        let mut table = self
            .table
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(table.append_whisperer(round, identity))
    }

    fn finalize(
        &self,
        round: RoundNumber,
        shouter: &Identity,
        phrase: &str,
    ) -> Result<UpdateOutcome> {
        let mut table = self
            .table
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(table.finalize(round, shouter, phrase))
    }

    fn add_prize(&self, round: RoundNumber, amount: Prize) -> Result<UpdateOutcome> {
        let mut table = self
            .table
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(table.add_prize(round, amount))
    }
}
