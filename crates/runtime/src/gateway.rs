//! Async gateway to the proving engine.
//!
//! Engine calls are CPU-bound and may take seconds, so they run on tokio's
//! blocking pool under a timeout. The engine itself is built lazily, exactly
//! once, by an injected loader (typically reading Groth16 keys from disk) and
//! then shared immutably.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::task;
use tokio::time;
use tracing::{debug, error, info};
use word_core::{
    Commitment, FieldElement, PhraseElements, ValidationError, encode_phrase, encode_username,
};
use zk::{ProofData, ProofEngine, ProofError, PublicSignals};

use crate::api::{Result, RoundError};

type Loader = dyn Fn() -> std::result::Result<Arc<dyn ProofEngine>, ProofError> + Send + Sync;

/// Initialise-once holder for the shared engine instance.
pub struct EngineHandle {
    cell: OnceCell<Arc<dyn ProofEngine>>,
    loader: Arc<Loader>,
}

impl EngineHandle {
    /// Defer engine construction to the first call that needs it.
    ///
    /// A failing loader is retried on the next call.
    pub fn lazy<F>(loader: F) -> Self
    where
        F: Fn() -> std::result::Result<Arc<dyn ProofEngine>, ProofError> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            loader: Arc::new(loader),
        }
    }

    /// Wrap an engine that is already built.
    pub fn ready(engine: Arc<dyn ProofEngine>) -> Self {
        let loaded = engine.clone();
        Self {
            cell: OnceCell::new_with(Some(engine)),
            loader: Arc::new(move || Ok(loaded.clone())),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    async fn get(&self, timeout: Duration) -> Result<Arc<dyn ProofEngine>> {
        self.cell
            .get_or_try_init(|| async {
                debug!("Initialising proving engine");
                let loader = self.loader.clone();
                let engine = run_blocking(timeout, move || loader()).await?;
                info!(backend = %engine.backend(), binds_username = engine.binds_username(), "Proving engine ready");
                Ok(engine)
            })
            .await
            .cloned()
    }
}

/// Async facade over the engine: encoding, commitments, proofs and checks.
#[derive(Clone)]
pub struct ProofGateway {
    engine: Arc<EngineHandle>,
    timeout: Duration,
    username_binding: bool,
}

impl ProofGateway {
    /// `username_binding` must match the engine's circuit; a mismatch makes
    /// the prover unavailable rather than silently checking the wrong signals.
    pub fn new(engine: EngineHandle, timeout: Duration, username_binding: bool) -> Self {
        Self {
            engine: Arc::new(engine),
            timeout,
            username_binding,
        }
    }

    pub const fn binds_username(&self) -> bool {
        self.username_binding
    }

    pub async fn engine(&self) -> Result<Arc<dyn ProofEngine>> {
        let engine = self.engine.get(self.timeout).await?;
        if engine.binds_username() != self.username_binding {
            error!(
                engine = engine.binds_username(),
                configured = self.username_binding,
                "Engine circuit and protocol disagree on username binding"
            );
            return Err(RoundError::ProverUnavailable(
                "engine username binding does not match the protocol configuration".to_string(),
            ));
        }
        Ok(engine)
    }

    /// Encode a username for the circuit when binding is on.
    ///
    /// A missing username is a validation error under binding; without
    /// binding any supplied username is ignored.
    pub fn username_element(&self, username: Option<&str>) -> Result<Option<FieldElement>> {
        if !self.username_binding {
            return Ok(None);
        }
        let username = username.ok_or(ValidationError::MissingUsername)?;
        Ok(Some(encode_username(username).map_err(ValidationError::from)?))
    }

    pub async fn commit(&self, phrase: PhraseElements) -> Result<Commitment> {
        self.run(move |engine| engine.commit(&phrase)).await
    }

    /// Encode `phrase` and commit to it. The commitment never depends on who
    /// asks, so any player can shout a phrase another player created.
    pub async fn commit_phrase(&self, phrase: &str) -> Result<Commitment> {
        let elements = encode_phrase(phrase).map_err(ValidationError::from)?;
        self.commit(elements).await
    }

    /// Encode `phrase` and prove knowledge of it.
    pub async fn prove(
        &self,
        phrase: &str,
        username: Option<&str>,
    ) -> Result<(ProofData, Commitment)> {
        let elements = encode_phrase(phrase).map_err(ValidationError::from)?;
        let username = self.username_element(username)?;
        self.run(move |engine| engine.prove(&elements, username))
            .await
    }

    pub async fn verify(&self, proof: ProofData, signals: PublicSignals) -> Result<bool> {
        self.run(move |engine| engine.verify(&proof, &signals))
            .await
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn ProofEngine) -> std::result::Result<T, ProofError> + Send + 'static,
    {
        let engine = self.engine().await?;
        run_blocking(self.timeout, move || op(engine.as_ref())).await
    }
}

async fn run_blocking<T, F>(timeout: Duration, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> std::result::Result<T, ProofError> + Send + 'static,
{
    match time::timeout(timeout, task::spawn_blocking(op)).await {
        Err(_) => {
            error!(?timeout, "Proving engine call timed out");
            Err(RoundError::ProverUnavailable(format!(
                "engine call exceeded {}ms",
                timeout.as_millis()
            )))
        }
        Ok(Err(join)) => {
            error!(error = %join, "Proving engine task failed");
            Err(RoundError::ProverUnavailable(format!("engine task failed: {join}")))
        }
        Ok(Ok(result)) => result.map_err(map_proof_error),
    }
}

fn map_proof_error(err: ProofError) -> RoundError {
    match err {
        ProofError::ProverUnavailable(reason) => RoundError::ProverUnavailable(reason),
        ProofError::MissingUsername => ValidationError::MissingUsername.into(),
        ProofError::UnexpectedUsername => ValidationError::Malformed {
            field: "username",
            reason: err.to_string(),
        }
        .into(),
        other => RoundError::ProofGenerationFailed(other.to_string()),
    }
}
