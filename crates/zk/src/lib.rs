//! Phrase commitments and zero-knowledge proofs of phrase knowledge.
//!
//! This crate provides a single engine interface, [`ProofEngine`], with two
//! implementations:
//! - **Groth16** (always available): Arkworks circuit proving that a private
//!   phrase vector hashes, under Poseidon, to a public commitment
//! - **Stub** (feature `stub`): instant proofs for fast development iteration
//!
//! Engines are synchronous. Async callers run them on a blocking pool (see the
//! `runtime` crate's gateway).
//!
//! # Examples
//!
//! ```toml
//! # Real proofs only
//! zk = { workspace = true }
//!
//! # Also expose the stub engine
//! zk = { workspace = true, features = ["stub"] }
//! ```

pub mod bundle;
pub mod circuit;
pub mod engine;
pub mod prover;

pub use bundle::ProofBundle;
pub use circuit::commitment::commit_phrase;
pub use circuit::groth16::Groth16Keys;
pub use engine::Groth16Engine;
pub use prover::{ProofBackend, ProofData, ProofEngine, ProofError, PublicSignals};

#[cfg(feature = "stub")]
pub use prover::StubEngine;
