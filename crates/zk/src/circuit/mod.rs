//! Arkworks circuit backend.
//!
//! ```text
//! phrase ──encode──▶ PhraseElements ──Poseidon──▶ Commitment
//!                          │                          │
//!                       witness                  public input
//!                          └──── PhraseCommitmentCircuit ────▶ Groth16 proof
//! ```
//!
//! - `commitment`: native Poseidon hashing and field conversions
//! - `phrase`: the R1CS circuit proving preimage knowledge
//! - `groth16`: keys, proving and verification on BN254

pub mod commitment;
pub mod groth16;
pub mod phrase;

pub use phrase::PhraseCommitmentCircuit;
