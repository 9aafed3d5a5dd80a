//! Keeps the round store consistent with the ledger.
//!
//! The ledger is the system of record when mirroring is enabled: every write
//! is submitted and confirmed there first, and only then mirrored into the
//! store by the caller. A failed or unconfirmed transaction leaves the store
//! untouched. Nothing is retried automatically.

use std::sync::Arc;
use std::time::Duration;

use ledger_core::{
    LedgerError, LedgerTransport, OnChainRound, RoundLedger, TransactionId, TransactionStatus,
    TransportError, WordLedger,
};
use tokio::time;
use tracing::{debug, info, warn};
use word_core::{Commitment, Identity, Prize, Round, RoundNumber};
use zk::ProofData;

use crate::api::{Result, RoundError};
use crate::config::RuntimeConfig;

/// Outcome of comparing a stored round with its ledger counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Consistent,
    /// The ledger has progressed past the store (e.g. a shout confirmed
    /// after its local finalisation failed).
    LedgerAhead { detail: String },
    /// The two disagree in a way that no later mirroring can explain.
    Diverged { detail: String },
}

#[derive(Clone)]
pub struct LedgerCoordinator {
    ledger: Arc<dyn WordLedger>,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl LedgerCoordinator {
    pub fn new(ledger: Arc<dyn WordLedger>, config: &RuntimeConfig) -> Self {
        Self {
            ledger,
            confirm_timeout: config.ledger_confirm_timeout,
            poll_interval: config.ledger_poll_interval,
        }
    }

    pub fn ledger(&self) -> &dyn WordLedger {
        self.ledger.as_ref()
    }

    /// Submit `newRound`, await confirmation and read back the emitted number.
    pub async fn create_round(
        &self,
        commitment: Commitment,
        proof: ProofData,
        prize: Prize,
        username: Option<String>,
    ) -> Result<(RoundNumber, TransactionId)> {
        let tx = self
            .ledger
            .new_round(commitment, proof, prize, username)
            .await?;
        info!(%tx, ledger = self.ledger.name(), "Submitted newRound");

        self.await_confirmation(&tx).await?;
        let round = self.ledger.created_round(&tx).await?;
        info!(%tx, %round, "newRound confirmed");
        Ok((round, tx))
    }

    pub async fn shout(
        &self,
        round: RoundNumber,
        phrase: String,
        recipient: Identity,
    ) -> Result<TransactionId> {
        let tx = self.ledger.shout(round, phrase, recipient).await?;
        info!(%tx, %round, "Submitted shout");

        self.await_confirmation(&tx).await?;
        Ok(tx)
    }

    pub async fn fund_prize(&self, round: RoundNumber, amount: Prize) -> Result<TransactionId> {
        let tx = self.ledger.fund_prize(round, amount).await?;
        info!(%tx, %round, %amount, "Submitted fundPrize");

        self.await_confirmation(&tx).await?;
        Ok(tx)
    }

    /// Poll until the transaction settles or the confirmation window closes,
    /// then re-query once before giving up. A transport error while polling
    /// is treated like an elapsed window.
    async fn await_confirmation(&self, tx: &TransactionId) -> Result<()> {
        let status = match time::timeout(self.confirm_timeout, self.poll_until_settled(tx)).await
        {
            Ok(Ok(status)) => status,
            Ok(Err(error)) => {
                warn!(%tx, %error, "Polling failed, re-querying once");
                self.requery(tx).await?
            }
            Err(_) => {
                warn!(%tx, timeout = ?self.confirm_timeout, "Confirmation window elapsed, re-querying once");
                self.requery(tx).await?
            }
        };

        match status {
            TransactionStatus::Confirmed { block_height } => {
                debug!(%tx, block_height, "Transaction confirmed");
                Ok(())
            }
            TransactionStatus::Failed { error } => {
                warn!(%tx, %error, "Transaction failed on ledger");
                Err(RoundError::LedgerRejected { reason: error })
            }
            TransactionStatus::Pending => Err(RoundError::LedgerTimeout { tx: tx.to_hex() }),
        }
    }

    async fn poll_until_settled(
        &self,
        tx: &TransactionId,
    ) -> std::result::Result<TransactionStatus, TransportError> {
        loop {
            let status = self.ledger.query_transaction(tx).await?;
            if !status.is_pending() {
                return Ok(status);
            }
            debug!(%tx, "Transaction pending");
            time::sleep(self.poll_interval).await;
        }
    }

    async fn requery(&self, tx: &TransactionId) -> Result<TransactionStatus> {
        self.ledger
            .query_transaction(tx)
            .await
            .map_err(|source| {
                RoundError::from(LedgerError::Unconfirmed {
                    tx: tx.clone(),
                    source,
                })
            })
    }

    /// Whether the ledger reports `round` as closed. A failed lookup counts
    /// as open.
    pub async fn is_closed(&self, round: RoundNumber) -> bool {
        matches!(self.ledger.get_round(round).await, Ok(on_chain) if !on_chain.active)
    }

    /// Compare a stored round with the ledger. Never mutates either side.
    pub async fn reconcile(&self, local: &Round) -> Result<Reconciliation> {
        let on_chain = match self.ledger.get_round(local.round).await {
            Ok(on_chain) => on_chain,
            Err(LedgerError::RoundNotFound(round)) => {
                return Ok(Reconciliation::Diverged {
                    detail: format!("round {round} is missing on the ledger"),
                });
            }
            Err(err) => return Err(err.into()),
        };
        Ok(compare(local, &on_chain))
    }
}

fn compare(local: &Round, on_chain: &OnChainRound) -> Reconciliation {
    if local.commitment != on_chain.commitment {
        return Reconciliation::Diverged {
            detail: format!(
                "commitment {} on ledger, {} in store",
                on_chain.commitment, local.commitment
            ),
        };
    }

    match (local.active, on_chain.active) {
        (true, false) => {
            return Reconciliation::LedgerAhead {
                detail: "round closed on ledger but active in store".to_string(),
            };
        }
        (false, true) => {
            return Reconciliation::Diverged {
                detail: "round closed in store but active on ledger".to_string(),
            };
        }
        (false, false) if local.phrase != on_chain.phrase => {
            return Reconciliation::Diverged {
                detail: "revealed phrases differ".to_string(),
            };
        }
        _ => {}
    }

    if on_chain.prize > local.prize {
        Reconciliation::LedgerAhead {
            detail: format!("prize {} on ledger, {} in store", on_chain.prize, local.prize),
        }
    } else if on_chain.prize < local.prize {
        Reconciliation::Diverged {
            detail: format!("prize {} on ledger, {} in store", on_chain.prize, local.prize),
        }
    } else {
        Reconciliation::Consistent
    }
}
