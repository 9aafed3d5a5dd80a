//! In-memory ledger emulating the round contract.
//!
//! Contract rules are enforced at submission time the way the deployed
//! contract enforces them during execution: proofs are re-verified with the
//! configured engine, shouts re-derive the commitment from the revealed
//! phrase, and the prize is credited to the recipient. A rejected call still
//! yields a transaction id whose status is `Failed`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use word_core::{FieldElement, Identity, RoundNumber, encode_phrase, encode_username};
use zk::{ProofEngine, PublicSignals};

use crate::traits::{LedgerError, LedgerTransport, RoundLedger, TransportError, WordLedger};
use crate::types::{LedgerCall, OnChainRound, TransactionId, TransactionStatus};

#[derive(Debug)]
struct TxRecord {
    outcome: TransactionStatus,
    pending_queries: usize,
    created_round: Option<RoundNumber>,
}

#[derive(Default)]
struct LedgerState {
    rounds: BTreeMap<RoundNumber, OnChainRound>,
    transactions: HashMap<TransactionId, TxRecord>,
    balances: HashMap<Identity, u128>,
    block_height: u64,
    tx_counter: u64,
    fail_next_submission: Option<String>,
    pending_queries: usize,
    failing_queries: usize,
    reachable: bool,
}

/// Mock ledger for tests and local development.
///
/// Cloning shares state, so a test can keep a handle for failure injection
/// while the coordinator owns another.
#[derive(Clone)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
    engine: Arc<dyn ProofEngine>,
}

impl InMemoryLedger {
    pub fn new(engine: Arc<dyn ProofEngine>) -> Self {
        let state = LedgerState {
            reachable: true,
            ..LedgerState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            engine,
        }
    }

    /// Reject the next submission at the transport level with `reason`.
    pub fn fail_next_submission(&self, reason: impl Into<String>) {
        self.lock().fail_next_submission = Some(reason.into());
    }

    /// Report every later transaction as pending for its first `queries` status queries.
    pub fn set_pending_queries(&self, queries: usize) {
        self.lock().pending_queries = queries;
    }

    /// Fail the next `queries` status queries at the transport level.
    pub fn fail_next_queries(&self, queries: usize) {
        self.lock().failing_queries = queries;
    }

    /// Simulate losing the connection to the node.
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    /// Prize credited to `identity` by successful shouts.
    pub fn balance_of(&self, identity: &Identity) -> u128 {
        self.lock().balances.get(identity).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn username_element(username: Option<&str>) -> Result<Option<FieldElement>, String> {
        username
            .map(encode_username)
            .transpose()
            .map_err(|e| e.to_string())
    }

    /// Execute a call against contract storage, returning the created round if any.
    fn execute(
        &self,
        state: &mut LedgerState,
        call: &LedgerCall,
    ) -> Result<Option<RoundNumber>, String> {
        match call {
            LedgerCall::NewRound {
                commitment,
                proof,
                prize,
                username,
            } => {
                let username = Self::username_element(username.as_deref())?;
                let signals = PublicSignals::new(*commitment, username);
                let valid = self
                    .engine
                    .verify(proof, &signals)
                    .map_err(|e| e.to_string())?;
                if !valid {
                    return Err("Invalid proof".to_string());
                }

                let round = RoundNumber(state.rounds.len() as u64 + 1);
                state.rounds.insert(
                    round,
                    OnChainRound {
                        round,
                        commitment: *commitment,
                        prize: *prize,
                        active: true,
                        shouter: None,
                        phrase: None,
                    },
                );
                Ok(Some(round))
            }

            LedgerCall::Shout {
                round,
                phrase,
                recipient,
            } => {
                let encoded = encode_phrase(phrase).map_err(|e| e.to_string())?;
                let derived = self
                    .engine
                    .commit(&encoded)
                    .map_err(|e| e.to_string())?;

                let record = state
                    .rounds
                    .get_mut(round)
                    .filter(|record| record.active)
                    .ok_or_else(|| "Round is not active".to_string())?;
                if record.commitment != derived {
                    return Err("Invalid secret phrase".to_string());
                }

                record.active = false;
                record.shouter = Some(recipient.clone());
                record.phrase = Some(phrase.clone());
                let payout = record.prize.amount();
                let balance = state.balances.entry(recipient.clone()).or_default();
                *balance = balance.saturating_add(payout);
                Ok(None)
            }

            LedgerCall::FundPrize { round, amount } => {
                let record = state
                    .rounds
                    .get_mut(round)
                    .filter(|record| record.active)
                    .ok_or_else(|| "Round is not active".to_string())?;
                record.prize = record.prize.saturating_add(*amount);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl LedgerTransport for InMemoryLedger {
    async fn submit_transaction(&self, call: LedgerCall) -> Result<TransactionId, TransportError> {
        let mut state = self.lock();
        if !state.reachable {
            return Err(TransportError::NetworkError("ledger unreachable".to_string()));
        }
        if let Some(reason) = state.fail_next_submission.take() {
            tracing::debug!(method = call.method(), %reason, "Injected submission failure");
            return Err(TransportError::TransactionFailed(reason));
        }

        state.tx_counter += 1;
        let tx_id = TransactionId::from_bytes(state.tx_counter.to_be_bytes().to_vec());

        let (outcome, created_round) = match self.execute(&mut state, &call) {
            Ok(created_round) => {
                state.block_height += 1;
                (
                    TransactionStatus::Confirmed {
                        block_height: state.block_height,
                    },
                    created_round,
                )
            }
            Err(error) => {
                tracing::debug!(method = call.method(), %error, "Contract call reverted");
                (TransactionStatus::Failed { error }, None)
            }
        };

        let pending_queries = state.pending_queries;
        state.transactions.insert(
            tx_id.clone(),
            TxRecord {
                outcome,
                pending_queries,
                created_round,
            },
        );
        Ok(tx_id)
    }

    async fn query_transaction(
        &self,
        tx_id: &TransactionId,
    ) -> Result<TransactionStatus, TransportError> {
        let mut state = self.lock();
        if !state.reachable {
            return Err(TransportError::NetworkError("ledger unreachable".to_string()));
        }
        if state.failing_queries > 0 {
            state.failing_queries -= 1;
            return Err(TransportError::NetworkError("connection reset".to_string()));
        }
        let record = state
            .transactions
            .get_mut(tx_id)
            .ok_or_else(|| TransportError::TransactionNotFound(tx_id.clone()))?;

        if record.pending_queries > 0 {
            record.pending_queries -= 1;
            return Ok(TransactionStatus::Pending);
        }
        Ok(record.outcome.clone())
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        if self.lock().reachable {
            Ok(())
        } else {
            Err(TransportError::NetworkError("ledger unreachable".to_string()))
        }
    }
}

#[async_trait]
impl RoundLedger for InMemoryLedger {
    async fn get_round(&self, round: RoundNumber) -> Result<OnChainRound, LedgerError> {
        self.lock()
            .rounds
            .get(&round)
            .cloned()
            .ok_or(LedgerError::RoundNotFound(round))
    }

    async fn created_round(&self, tx_id: &TransactionId) -> Result<RoundNumber, LedgerError> {
        let state = self.lock();
        let record = state
            .transactions
            .get(tx_id)
            .ok_or_else(|| TransportError::TransactionNotFound(tx_id.clone()))?;
        match (&record.outcome, record.created_round) {
            (TransactionStatus::Confirmed { .. }, Some(round)) => Ok(round),
            _ => Err(LedgerError::NoRoundCreated(tx_id.clone())),
        }
    }

    async fn round_count(&self) -> Result<u64, LedgerError> {
        Ok(self.lock().rounds.len() as u64)
    }
}

impl WordLedger for InMemoryLedger {
    fn name(&self) -> &str {
        "InMemory"
    }

    fn network(&self) -> &str {
        "local"
    }
}
