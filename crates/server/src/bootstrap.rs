//! Assembles the round service from [`ServerConfig`].

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use runtime::{
    EngineHandle, FileRoundRepository, InMemoryRoundRepository, LedgerCoordinator, ProofGateway,
    RoundRepository, RoundService,
};
use zk::{Groth16Engine, ProofBackend, ProofEngine, ProofError};

use crate::auth::{InMemorySessionStore, NonceRegistry, resolver_for};
use crate::config::ServerConfig;
use crate::routes::AppState;

/// Build the application state: repository, engine, optional ledger and the
/// configured identity scheme.
pub fn build_state(config: &ServerConfig) -> Result<AppState> {
    let repository: Arc<dyn RoundRepository> = match &config.data_path {
        Some(path) => Arc::new(
            FileRoundRepository::open(path)
                .with_context(|| format!("Failed to open round store {}", path.display()))?,
        ),
        None => {
            tracing::warn!("THE_WORD_DATA not set; rounds are kept in memory only");
            Arc::new(InMemoryRoundRepository::new())
        }
    };

    let binding = config.protocol.username_binding;
    let loader = engine_loader(config)?;

    let mut builder = RoundService::builder()
        .protocol(config.protocol)
        .config(config.runtime.clone())
        .repository(repository);

    let handle = if config.protocol.ledger_mirroring {
        // The ledger re-verifies proofs, so the engine is needed up front.
        let engine = loader().map_err(|e| anyhow!("Failed to load proving engine: {e}"))?;
        builder = builder.coordinator(ledger_coordinator(config, engine.clone())?);
        EngineHandle::ready(engine)
    } else {
        EngineHandle::lazy(loader)
    };

    let gateway = ProofGateway::new(handle, config.runtime.prover_timeout, binding);
    let service = builder.gateway(gateway).build()?;

    let sessions = Arc::new(InMemorySessionStore::new());
    let nonces = Arc::new(NonceRegistry::default());
    let identity = resolver_for(config.protocol.identity_scheme, sessions, nonces.clone());

    tracing::info!(
        backend = %config.backend,
        username_binding = binding,
        ledger_mirroring = config.protocol.ledger_mirroring,
        identity_scheme = %config.protocol.identity_scheme,
        "Round service assembled"
    );
    Ok(AppState::new(service, identity, nonces))
}

type Loader = Box<dyn Fn() -> Result<Arc<dyn ProofEngine>, ProofError> + Send + Sync>;

fn engine_loader(config: &ServerConfig) -> Result<Loader> {
    let binding = config.protocol.username_binding;
    match config.backend {
        ProofBackend::Groth16 => {
            let path: PathBuf = config
                .keys_path
                .clone()
                .context("THE_WORD_KEYS must point to a keys file for the groth16 backend")?;
            Ok(Box::new(move || {
                let engine = Groth16Engine::load(&path, binding)?;
                Ok(Arc::new(engine) as Arc<dyn ProofEngine>)
            }))
        }
        ProofBackend::Stub => stub_loader(binding),
    }
}

#[cfg(feature = "stub")]
fn stub_loader(binding: bool) -> Result<Loader> {
    tracing::warn!("Using the stub proving engine; proofs are not zero-knowledge");
    Ok(Box::new(move || {
        Ok(Arc::new(zk::StubEngine::new(binding)) as Arc<dyn ProofEngine>)
    }))
}

#[cfg(not(feature = "stub"))]
fn stub_loader(_binding: bool) -> Result<Loader> {
    anyhow::bail!("PROOF_BACKEND=stub requires the `stub` feature")
}

#[cfg(feature = "mock")]
fn ledger_coordinator(
    config: &ServerConfig,
    engine: Arc<dyn ProofEngine>,
) -> Result<LedgerCoordinator> {
    tracing::warn!("Mirroring rounds on the in-memory ledger; ledger state is lost on restart");
    let ledger = Arc::new(ledger_core::InMemoryLedger::new(engine));
    Ok(LedgerCoordinator::new(ledger, &config.runtime))
}

#[cfg(not(feature = "mock"))]
fn ledger_coordinator(
    _config: &ServerConfig,
    _engine: Arc<dyn ProofEngine>,
) -> Result<LedgerCoordinator> {
    anyhow::bail!("LEDGER_MIRRORING=true requires the `mock` feature (no other ledger is built in)")
}
