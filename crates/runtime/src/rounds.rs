//! Round state machine.
//!
//! ```text
//!   create ──▶ Active ──shout──▶ Shouted (terminal)
//!                │  ▲
//!                └──┘ whisper / fund
//! ```
//!
//! Each operation reads the persisted round, validates, then writes through a
//! conditional repository update. Repository calls run on the blocking pool
//! since stores may hit the disk. Shouts and fundings hold a per-round lock
//! from the active check until the store is updated, so two of them never
//! race to the ledger for the same round.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task;
use tracing::{info, warn};
use word_core::{
    Commitment, Identity, Prize, ProtocolConfig, Round, RoundNumber, UserActivity,
    ValidationError,
};
use zk::{ProofData, PublicSignals};

use crate::api::{
    CreateRound, ProofCheck, ProofTarget, Result, RoundCreated, RoundError, RoundShouted, Shout,
    SortedRounds, Whisper,
};
use crate::config::RuntimeConfig;
use crate::coordinator::{LedgerCoordinator, Reconciliation};
use crate::gateway::ProofGateway;
use crate::repository::{self, RepositoryError, RoundRepository, UpdateOutcome};

/// Errors raised while assembling a [`RoundService`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("round service requires a repository")]
    MissingRepository,

    #[error("round service requires a proof gateway")]
    MissingGateway,

    #[error("ledger mirroring is enabled but no ledger coordinator was provided")]
    MissingLedger,

    #[error("gateway username binding ({gateway}) differs from protocol ({protocol})")]
    BindingMismatch { gateway: bool, protocol: bool },
}

/// One async lock per round that has seen a closing or funding write.
#[derive(Default)]
struct RoundLocks {
    locks: StdMutex<HashMap<RoundNumber, Arc<Mutex<()>>>>,
}

impl RoundLocks {
    async fn acquire(&self, round: RoundNumber) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.entry(round).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[derive(Clone)]
pub struct RoundService {
    protocol: ProtocolConfig,
    config: RuntimeConfig,
    repository: Arc<dyn RoundRepository>,
    gateway: ProofGateway,
    coordinator: Option<LedgerCoordinator>,
    round_locks: Arc<RoundLocks>,
}

#[derive(Default)]
pub struct RoundServiceBuilder {
    protocol: ProtocolConfig,
    config: RuntimeConfig,
    repository: Option<Arc<dyn RoundRepository>>,
    gateway: Option<ProofGateway>,
    coordinator: Option<LedgerCoordinator>,
}

impl RoundServiceBuilder {
    pub fn protocol(mut self, protocol: ProtocolConfig) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn repository(mut self, repository: Arc<dyn RoundRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn gateway(mut self, gateway: ProofGateway) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn coordinator(mut self, coordinator: LedgerCoordinator) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    pub fn build(self) -> std::result::Result<RoundService, BuildError> {
        let repository = self.repository.ok_or(BuildError::MissingRepository)?;
        let gateway = self.gateway.ok_or(BuildError::MissingGateway)?;

        if gateway.binds_username() != self.protocol.username_binding {
            return Err(BuildError::BindingMismatch {
                gateway: gateway.binds_username(),
                protocol: self.protocol.username_binding,
            });
        }

        let coordinator = if self.protocol.ledger_mirroring {
            Some(self.coordinator.ok_or(BuildError::MissingLedger)?)
        } else {
            None
        };

        Ok(RoundService {
            protocol: self.protocol,
            config: self.config,
            repository,
            gateway,
            coordinator,
            round_locks: Arc::default(),
        })
    }
}

impl RoundService {
    pub fn builder() -> RoundServiceBuilder {
        RoundServiceBuilder::default()
    }

    pub fn protocol(&self) -> &ProtocolConfig {
        &self.protocol
    }

    pub fn gateway(&self) -> &ProofGateway {
        &self.gateway
    }

    pub async fn create_round(&self, request: CreateRound) -> Result<RoundCreated> {
        if !self.config.creation_enabled {
            return Err(RoundError::CreationDisabled);
        }
        if request.hint.trim().is_empty() {
            return Err(ValidationError::EmptyHint.into());
        }
        let username = self
            .gateway
            .username_element(request.username.as_deref())?;

        let signals = PublicSignals::new(request.commitment, username);
        if !self.gateway.verify(request.proof.clone(), signals).await? {
            warn!(commitment = %request.commitment, "Rejected round creation with invalid proof");
            return Err(RoundError::InvalidProof);
        }

        let (number, tx) = match &self.coordinator {
            Some(coordinator) => {
                let username = self.bound_username(request.username);
                let (number, tx) = coordinator
                    .create_round(request.commitment, request.proof, request.prize, username)
                    .await?;
                (number, Some(tx))
            }
            None => (self.storage(|repo| repo.next_round_number()).await?, None),
        };

        let mut round = Round::open(
            number,
            request.commitment,
            request.hint,
            request.prize,
            request.creator,
        );
        if let Some(tx) = &tx {
            round = round.with_creation_tx(tx.to_hex());
        }
        let round = self
            .storage(move |repo| repo.insert(&round).map(|()| round))
            .await?;

        info!(round = %number, commitment = %round.commitment, prize = %round.prize, "Round created");
        Ok(RoundCreated { round: number, tx })
    }

    /// Accept a proof of knowledge for an active round. Under username
    /// binding the proof must carry the caller's own username, whoever
    /// created the round.
    pub async fn whisper(&self, request: Whisper) -> Result<()> {
        let round = self.active_round(request.round).await?;
        let username = self
            .gateway
            .username_element(request.username.as_deref())?;

        let signals = PublicSignals::new(round.commitment, username);
        if !self.gateway.verify(request.proof, signals).await? {
            warn!(round = %request.round, identity = %request.identity, "Rejected whisper with invalid proof");
            return Err(RoundError::InvalidProof);
        }

        if round.has_whispered(&request.identity) {
            return Err(RoundError::AlreadyWhispered(request.round));
        }

        let number = request.round;
        let identity = request.identity.clone();
        match self
            .storage(move |repo| repo.append_whisperer(number, &identity))
            .await?
        {
            UpdateOutcome::Applied => {
                info!(round = %request.round, identity = %request.identity, "Whisper accepted");
                Ok(())
            }
            outcome => Err(outcome_error(outcome, request.round)),
        }
    }

    /// Reveal the phrase and close the round. The phrase alone must hash to
    /// the round's commitment.
    pub async fn shout(&self, request: Shout) -> Result<RoundShouted> {
        let _guard = self.round_locks.acquire(request.round).await;
        let round = self.active_round(request.round).await?;

        let derived = self.gateway.commit_phrase(&request.phrase).await?;
        if derived != round.commitment {
            warn!(round = %request.round, identity = %request.identity, "Rejected shout with wrong phrase");
            return Err(RoundError::InvalidSecret);
        }

        let tx = match &self.coordinator {
            Some(coordinator) => {
                let submitted = coordinator
                    .shout(
                        request.round,
                        request.phrase.clone(),
                        request.identity.clone(),
                    )
                    .await;
                Some(self.closed_on_ledger(coordinator, request.round, submitted).await?)
            }
            None => None,
        };

        let Shout {
            round: number,
            phrase,
            identity,
        } = request;
        let shouter = identity.clone();
        match self
            .storage(move |repo| repo.finalize(number, &shouter, &phrase))
            .await?
        {
            UpdateOutcome::Applied => {
                info!(round = %number, shouter = %identity, "Round shouted");
                Ok(RoundShouted { round: number, tx })
            }
            outcome => Err(outcome_error(outcome, number)),
        }
    }

    /// Add to the prize of an active round, returning the new total.
    pub async fn fund_prize(&self, round: RoundNumber, amount: Prize) -> Result<Prize> {
        if amount == Prize::ZERO {
            return Err(ValidationError::Malformed {
                field: "prize",
                reason: "amount must be positive".to_string(),
            }
            .into());
        }
        let _guard = self.round_locks.acquire(round).await;
        self.active_round(round).await?;

        if let Some(coordinator) = &self.coordinator {
            let submitted = coordinator.fund_prize(round, amount).await;
            self.closed_on_ledger(coordinator, round, submitted).await?;
        }

        match self.storage(move |repo| repo.add_prize(round, amount)).await? {
            UpdateOutcome::Applied => {
                let total = self.get_round(round).await?.prize;
                info!(%round, %amount, %total, "Prize funded");
                Ok(total)
            }
            outcome => Err(outcome_error(outcome, round)),
        }
    }

    pub async fn get_round(&self, round: RoundNumber) -> Result<Round> {
        self.storage(move |repo| repo.load(round))
            .await?
            .ok_or(RoundError::RoundNotFound(round))
    }

    pub async fn list_rounds(&self) -> Result<Vec<Round>> {
        self.storage(|repo| repo.list()).await
    }

    /// Verify a proof without touching any round.
    pub async fn check_proof(
        &self,
        target: ProofTarget,
        proof: ProofData,
        username: Option<&str>,
    ) -> Result<ProofCheck> {
        let (commitment, shouted) = match target {
            ProofTarget::Round(number) => {
                let round = self.get_round(number).await?;
                (round.commitment, !round.active)
            }
            ProofTarget::Commitment(commitment) => {
                (commitment, self.is_commitment_shouted(commitment).await?)
            }
        };

        let username = self.gateway.username_element(username)?;
        let ok = self
            .gateway
            .verify(proof, PublicSignals::new(commitment, username))
            .await?;
        Ok(ProofCheck { ok, shouted })
    }

    pub async fn user_activity(&self, identity: &Identity) -> Result<UserActivity> {
        Ok(UserActivity::collect(identity, &self.list_rounds().await?))
    }

    pub async fn sorted_rounds(&self, identity: &Identity) -> Result<SortedRounds> {
        let (whispered, not_whispered) = self
            .list_rounds()
            .await?
            .into_iter()
            .partition(|round| round.has_whispered(identity));
        Ok(SortedRounds {
            whispered,
            not_whispered,
        })
    }

    /// Compare a stored round with the ledger. `None` when mirroring is off.
    pub async fn reconcile(&self, round: RoundNumber) -> Result<Option<Reconciliation>> {
        let Some(coordinator) = &self.coordinator else {
            return Ok(None);
        };
        let local = self.get_round(round).await?;
        coordinator.reconcile(&local).await.map(Some)
    }

    async fn active_round(&self, number: RoundNumber) -> Result<Round> {
        let round = self.get_round(number).await?;
        if !round.active {
            return Err(RoundError::RoundNotActive(number));
        }
        Ok(round)
    }

    async fn is_commitment_shouted(&self, commitment: Commitment) -> Result<bool> {
        Ok(self
            .list_rounds()
            .await?
            .iter()
            .any(|round| round.commitment == commitment && !round.active))
    }

    /// A ledger revert on a round the ledger already closed means another
    /// writer won the race; report it as the state error it is.
    async fn closed_on_ledger<T>(
        &self,
        coordinator: &LedgerCoordinator,
        round: RoundNumber,
        submitted: Result<T>,
    ) -> Result<T> {
        match submitted {
            Err(RoundError::LedgerRejected { reason }) if coordinator.is_closed(round).await => {
                warn!(%round, %reason, "Ledger rejected a write to a closed round");
                Err(RoundError::RoundNotActive(round))
            }
            other => other,
        }
    }

    /// The username forwarded to the ledger, present only under binding.
    fn bound_username(&self, username: Option<String>) -> Option<String> {
        username.filter(|_| self.protocol.username_binding)
    }

    /// Run a repository call on the blocking pool.
    async fn storage<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RoundRepository) -> repository::Result<T> + Send + 'static,
    {
        let repository = Arc::clone(&self.repository);
        task::spawn_blocking(move || op(repository.as_ref()))
            .await
            .map_err(|join| RepositoryError::TaskFailed(join.to_string()))?
            .map_err(RoundError::from)
    }
}

fn outcome_error(outcome: UpdateOutcome, round: RoundNumber) -> RoundError {
    match outcome {
        UpdateOutcome::NotFound => RoundError::RoundNotFound(round),
        UpdateOutcome::Inactive => RoundError::RoundNotActive(round),
        UpdateOutcome::AlreadyPresent => RoundError::AlreadyWhispered(round),
        UpdateOutcome::Applied => unreachable!("applied updates are not errors"),
    }
}
