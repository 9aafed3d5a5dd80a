//! Round table shared by the repository implementations.
//!
//! Holds the rounds and the allocation counter and implements the
//! conditional updates once. Repositories wrap it in a lock and decide how
//! (and whether) to persist it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use word_core::{Identity, Prize, Round, RoundNumber};

use super::{RepositoryError, Result, UpdateOutcome};

#[derive(Debug, Clone)]
pub(crate) struct RoundTable {
    next_round: RoundNumber,
    rounds: BTreeMap<RoundNumber, Round>,
}

/// On-disk form of the table.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoreDocument {
    next_round: RoundNumber,
    rounds: Vec<Round>,
}

impl Default for RoundTable {
    fn default() -> Self {
        Self {
            next_round: RoundNumber::FIRST,
            rounds: BTreeMap::new(),
        }
    }
}

impl RoundTable {
    pub(crate) fn allocate(&mut self) -> RoundNumber {
        let number = self.next_round;
        self.next_round = number.next();
        number
    }

    pub(crate) fn insert(&mut self, round: &Round) -> Result<()> {
        if self.rounds.contains_key(&round.round) {
            return Err(RepositoryError::Conflict(round.round));
        }
        if round.round >= self.next_round {
            self.next_round = round.round.next();
        }
        self.rounds.insert(round.round, round.clone());
        Ok(())
    }

    pub(crate) fn get(&self, round: RoundNumber) -> Option<&Round> {
        self.rounds.get(&round)
    }

    pub(crate) fn list(&self) -> Vec<Round> {
        self.rounds.values().cloned().collect()
    }

    pub(crate) fn append_whisperer(
        &mut self,
        round: RoundNumber,
        identity: &Identity,
    ) -> UpdateOutcome {
        match self.rounds.get_mut(&round) {
            None => UpdateOutcome::NotFound,
            Some(record) if !record.active => UpdateOutcome::Inactive,
            Some(record) => {
                if record.add_whisperer(identity.clone()) {
                    UpdateOutcome::Applied
                } else {
                    UpdateOutcome::AlreadyPresent
                }
            }
        }
    }

    pub(crate) fn finalize(
        &mut self,
        round: RoundNumber,
        shouter: &Identity,
        phrase: &str,
    ) -> UpdateOutcome {
        match self.rounds.get_mut(&round) {
            None => UpdateOutcome::NotFound,
            Some(record) if !record.active => UpdateOutcome::Inactive,
            Some(record) => {
                record.close(shouter.clone(), phrase);
                UpdateOutcome::Applied
            }
        }
    }

    pub(crate) fn add_prize(&mut self, round: RoundNumber, amount: Prize) -> UpdateOutcome {
        match self.rounds.get_mut(&round) {
            None => UpdateOutcome::NotFound,
            Some(record) if !record.active => UpdateOutcome::Inactive,
            Some(record) => {
                record.prize = record.prize.saturating_add(amount);
                UpdateOutcome::Applied
            }
        }
    }

    pub(crate) fn to_document(&self) -> StoreDocument {
        StoreDocument {
            next_round: self.next_round,
            rounds: self.list(),
        }
    }

    /// Rebuild a table from disk, rejecting documents that break round invariants.
    pub(crate) fn from_document(document: StoreDocument) -> Result<Self> {
        let mut table = Self {
            next_round: document.next_round.max(RoundNumber::FIRST),
            rounds: BTreeMap::new(),
        };
        for round in document.rounds {
            round
                .check_invariants()
                .map_err(|err| RepositoryError::CorruptedData(err.to_string()))?;
            table
                .insert(&round)
                .map_err(|_| RepositoryError::CorruptedData(format!("duplicate round {}", round.round)))?;
        }
        Ok(table)
    }
}
