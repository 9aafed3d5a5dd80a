//! Ledger abstraction layer for The Word.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: WordLedger (composite trait, name + network)
//!          └── RoundLedger
//!
//! Layer 1: RoundLedger (newRound / shout / fundPrize, round reads)
//!
//! Layer 0: LedgerTransport (submit + query transactions)
//! ```
//!
//! The contract call methods on `RoundLedger` only submit. Awaiting
//! confirmation, re-querying after a timeout and mirroring the result into the
//! round store belong to the runtime's `LedgerCoordinator`.
//!
//! # Usage
//!
//! ```ignore
//! use ledger_core::{RoundLedger, WordLedger};
//!
//! async fn open(ledger: &dyn WordLedger, commitment: Commitment, proof: ProofData) {
//!     let tx = ledger.new_round(commitment, proof, Prize::ZERO, None).await?;
//!     let status = ledger.query_transaction(&tx).await?;
//! }
//! ```

pub mod traits;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use traits::{LedgerError, LedgerTransport, RoundLedger, TransportError, WordLedger};
pub use types::{LedgerCall, OnChainRound, TransactionId, TransactionStatus};

#[cfg(any(test, feature = "mock"))]
pub use mock::InMemoryLedger;
