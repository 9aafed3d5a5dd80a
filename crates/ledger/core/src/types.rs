//! Common types for ledger interactions.

use core::fmt;

use serde::{Deserialize, Serialize};
use word_core::{Commitment, Identity, Prize, RoundNumber};
use zk::ProofData;

/// Generic transaction identifier (hash bytes of the submitted transaction).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Vec<u8>);

impl TransactionId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// `0x`-prefixed hex, the form reported to clients as `txHash`.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Transaction status on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Transaction is waiting for inclusion
    Pending,

    /// Transaction is confirmed on-chain
    Confirmed { block_height: u64 },

    /// Transaction reverted or was dropped
    Failed { error: String },
}

impl TransactionStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// A call on the round contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    /// `newRound(commitment, proof)` with an optional attached prize.
    NewRound {
        commitment: Commitment,
        proof: ProofData,
        prize: Prize,
        username: Option<String>,
    },

    /// `shout(round, phrase, recipient)`; the contract re-derives the commitment.
    Shout {
        round: RoundNumber,
        phrase: String,
        recipient: Identity,
    },

    /// `fundPrize(round)` with `amount` attached.
    FundPrize { round: RoundNumber, amount: Prize },
}

impl LedgerCall {
    pub const fn method(&self) -> &'static str {
        match self {
            Self::NewRound { .. } => "newRound",
            Self::Shout { .. } => "shout",
            Self::FundPrize { .. } => "fundPrize",
        }
    }
}

/// Round record as the contract stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnChainRound {
    pub round: RoundNumber,
    pub commitment: Commitment,
    pub prize: Prize,
    pub active: bool,
    pub shouter: Option<Identity>,
    pub phrase: Option<String>,
}
