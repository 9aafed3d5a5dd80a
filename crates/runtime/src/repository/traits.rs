//! Repository contract for round documents.

use word_core::{Identity, Prize, Round, RoundNumber};

use super::Result;

/// Result of a conditional update on one round document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    NotFound,
    /// The round was already closed; nothing changed.
    Inactive,
    /// The identity was already a whisperer; nothing changed.
    AlreadyPresent,
}

/// Storage for rounds.
///
/// Conditional updates check their precondition and apply the change
/// atomically; callers decide what each [`UpdateOutcome`] means.
pub trait RoundRepository: Send + Sync {
    /// Allocate the next round number. Numbers are strictly increasing and
    /// never handed out twice, even if the round is never inserted.
    fn next_round_number(&self) -> Result<RoundNumber>;

    /// Insert a new round. Fails with `Conflict` if the number is taken.
    fn insert(&self, round: &Round) -> Result<()>;

    fn load(&self, round: RoundNumber) -> Result<Option<Round>>;

    /// All rounds ordered by number.
    fn list(&self) -> Result<Vec<Round>>;

    /// Append a whisperer if the round is active and the identity is new.
    fn append_whisperer(&self, round: RoundNumber, identity: &Identity) -> Result<UpdateOutcome>;

    /// Close the round if it is still active.
    fn finalize(&self, round: RoundNumber, shouter: &Identity, phrase: &str)
    -> Result<UpdateOutcome>;

    /// Add to the prize of an active round.
    fn add_prize(&self, round: RoundNumber, amount: Prize) -> Result<UpdateOutcome>;
}
