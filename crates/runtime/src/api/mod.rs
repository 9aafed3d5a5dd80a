//! Public API surface of the runtime crate.
//!
//! Request and response types for round operations live in [`requests`];
//! [`errors`] carries the error taxonomy shared by every operation.
mod errors;
mod requests;

pub use errors::{ErrorKind, RepositoryError, Result, RoundError};
pub use requests::{
    CreateRound, ProofCheck, ProofTarget, RoundCreated, RoundShouted, Shout, SortedRounds, Whisper,
};
