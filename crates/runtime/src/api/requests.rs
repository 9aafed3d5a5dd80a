//! Inputs and outputs of [`crate::RoundService`] operations.

use ledger_core::TransactionId;
use serde::Serialize;
use word_core::{Commitment, Identity, Prize, Round, RoundNumber};
use zk::ProofData;

/// Create a round from a commitment and a proof of knowing its phrase.
#[derive(Debug, Clone)]
pub struct CreateRound {
    pub commitment: Commitment,
    pub hint: String,
    /// Required when username binding is enabled, ignored otherwise.
    pub username: Option<String>,
    pub proof: ProofData,
    pub prize: Prize,
    pub creator: Option<Identity>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundCreated {
    pub round: RoundNumber,
    pub tx: Option<TransactionId>,
}

#[derive(Debug, Clone)]
pub struct Whisper {
    pub round: RoundNumber,
    pub proof: ProofData,
    pub identity: Identity,
    pub username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Shout {
    pub round: RoundNumber,
    pub phrase: String,
    pub identity: Identity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundShouted {
    pub round: RoundNumber,
    pub tx: Option<TransactionId>,
}

/// What a standalone proof check verifies against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofTarget {
    Round(RoundNumber),
    Commitment(Commitment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProofCheck {
    pub ok: bool,
    /// The referenced round has already been closed by a shout.
    pub shouted: bool,
}

/// Rounds partitioned by whether an identity has whispered to them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortedRounds {
    pub whispered: Vec<Round>,
    pub not_whispered: Vec<Round>,
}
