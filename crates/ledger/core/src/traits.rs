//! Ledger abstraction traits.
//!
//! This module defines a layered ledger abstraction:
//! - Layer 0: LedgerTransport (pure infrastructure)
//! - Layer 1: RoundLedger (round contract calls and reads)
//! - Layer 2: WordLedger (composite trait)

use async_trait::async_trait;
use word_core::{Commitment, Identity, Prize, RoundNumber};
use zk::ProofData;

use crate::types::{LedgerCall, OnChainRound, TransactionId, TransactionStatus};

// ============================================================================
// Error Types
// ============================================================================

/// Transport layer errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Backend-specific error: {0}")]
    BackendError(String),
}

/// Round contract errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Round not found on ledger: {0}")]
    RoundNotFound(RoundNumber),

    #[error("Transaction {0} did not create a round")]
    NoRoundCreated(TransactionId),

    #[error("Transport error: {0}")]
    TransportError(#[from] TransportError),

    #[error("Invalid ledger data: {0}")]
    InvalidData(String),

    /// The transaction was submitted but its outcome could not be read back.
    #[error("Transaction {tx} could not be confirmed: {source}")]
    Unconfirmed {
        tx: TransactionId,
        #[source]
        source: TransportError,
    },
}

// ============================================================================
// Layer 0: Pure Infrastructure
// ============================================================================

/// Pure ledger infrastructure layer.
///
/// Submits contract calls and reports on transactions without any knowledge
/// of what a round is.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Submit a contract call. Returns as soon as the transaction is accepted.
    async fn submit_transaction(&self, call: LedgerCall) -> Result<TransactionId, TransportError>;

    /// Query transaction status.
    async fn query_transaction(
        &self,
        tx_id: &TransactionId,
    ) -> Result<TransactionStatus, TransportError>;

    /// Health check: verify connection to the ledger.
    async fn health_check(&self) -> Result<(), TransportError>;
}

// ============================================================================
// Layer 1: Round Domain
// ============================================================================

/// Round contract interface.
///
/// Write methods only submit; confirmation is the caller's concern.
#[async_trait]
pub trait RoundLedger: LedgerTransport {
    async fn new_round(
        &self,
        commitment: Commitment,
        proof: ProofData,
        prize: Prize,
        username: Option<String>,
    ) -> Result<TransactionId, LedgerError> {
        let call = LedgerCall::NewRound {
            commitment,
            proof,
            prize,
            username,
        };
        Ok(self.submit_transaction(call).await?)
    }

    async fn shout(
        &self,
        round: RoundNumber,
        phrase: String,
        recipient: Identity,
    ) -> Result<TransactionId, LedgerError> {
        let call = LedgerCall::Shout {
            round,
            phrase,
            recipient,
        };
        Ok(self.submit_transaction(call).await?)
    }

    async fn fund_prize(
        &self,
        round: RoundNumber,
        amount: Prize,
    ) -> Result<TransactionId, LedgerError> {
        Ok(self
            .submit_transaction(LedgerCall::FundPrize { round, amount })
            .await?)
    }

    /// Read a round from contract storage.
    async fn get_round(&self, round: RoundNumber) -> Result<OnChainRound, LedgerError>;

    /// Round number emitted by a confirmed `newRound` transaction.
    async fn created_round(&self, tx_id: &TransactionId) -> Result<RoundNumber, LedgerError>;

    /// Number of rounds created so far.
    async fn round_count(&self) -> Result<u64, LedgerError>;
}

// ============================================================================
// Layer 2: Composite Trait
// ============================================================================

/// Complete ledger interface used by the consistency coordinator.
pub trait WordLedger: RoundLedger + Send + Sync {
    /// Get the ledger name (e.g., "Ethereum", "InMemory").
    fn name(&self) -> &str;

    /// Get the network name (e.g., "mainnet", "sepolia", "local").
    fn network(&self) -> &str;
}
