//! Round orchestration for The Word.
//!
//! This crate wires the proving engine, the round repository and, when
//! mirroring is enabled, the ledger into one state machine. Front ends embed
//! [`RoundService`] and never talk to the engine or ledger directly.
//!
//! Modules are organized by responsibility:
//! - [`rounds`] hosts the state machine and its builder
//! - [`api`] exposes request/response types and the error taxonomy
//! - [`gateway`] runs engine calls off the async executor
//! - [`coordinator`] keeps the store consistent with the ledger
//! - [`repository`] provides the in-memory and file-backed round stores
//! - [`config`] holds runtime switches and timeouts
pub mod api;
pub mod config;
pub mod coordinator;
pub mod gateway;
pub mod repository;
pub mod rounds;

pub use api::{
    CreateRound, ErrorKind, ProofCheck, ProofTarget, Result, RoundCreated, RoundError,
    RoundShouted, Shout, SortedRounds, Whisper,
};
pub use config::RuntimeConfig;
pub use coordinator::{LedgerCoordinator, Reconciliation};
pub use gateway::{EngineHandle, ProofGateway};
pub use repository::{
    FileRoundRepository, InMemoryRoundRepository, RepositoryError, RoundRepository, UpdateOutcome,
};
pub use rounds::{BuildError, RoundService, RoundServiceBuilder};
