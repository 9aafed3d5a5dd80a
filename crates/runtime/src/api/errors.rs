//! Unified error types surfaced by the round operations.
//!
//! Every failure belongs to one [`ErrorKind`]. Validation and state errors
//! are raised before any write; proof errors abort before any write;
//! infrastructure errors are surfaced as-is and never retried here.
use std::fmt;

use ledger_core::{LedgerError, TransportError};
use thiserror::Error;
use word_core::{RoundNumber, ValidationError};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RoundError>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Proof,
    State,
    Infrastructure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Proof => "proof",
            ErrorKind::State => "state",
            ErrorKind::Infrastructure => "infrastructure",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Error)]
pub enum RoundError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("round creation is disabled")]
    CreationDisabled,

    #[error("proof does not verify against the public signals")]
    InvalidProof,

    #[error("phrase does not match the round commitment")]
    InvalidSecret,

    #[error("round {0} not found")]
    RoundNotFound(RoundNumber),

    #[error("round {0} is not active")]
    RoundNotActive(RoundNumber),

    #[error("already whispered to round {0}")]
    AlreadyWhispered(RoundNumber),

    #[error("prover unavailable: {0}")]
    ProverUnavailable(String),

    #[error("proof generation failed: {0}")]
    ProofGenerationFailed(String),

    #[error("ledger transaction {tx} was not confirmed in time")]
    LedgerTimeout { tx: String },

    #[error("ledger rejected the transaction: {reason}")]
    LedgerRejected { reason: String },

    #[error(transparent)]
    Ledger(LedgerError),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl RoundError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::CreationDisabled => ErrorKind::Validation,
            Self::InvalidProof | Self::InvalidSecret => ErrorKind::Proof,
            Self::RoundNotFound(_) | Self::RoundNotActive(_) | Self::AlreadyWhispered(_) => {
                ErrorKind::State
            }
            Self::ProverUnavailable(_)
            | Self::ProofGenerationFailed(_)
            | Self::LedgerTimeout { .. }
            | Self::LedgerRejected { .. }
            | Self::Ledger(_)
            | Self::Storage(_) => ErrorKind::Infrastructure,
        }
    }

    /// Machine-stable reason string, used as the `error` field of HTTP bodies.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.reason(),
            Self::CreationDisabled => "CreationDisabled",
            Self::InvalidProof => "InvalidProof",
            Self::InvalidSecret => "InvalidSecret",
            Self::RoundNotFound(_) => "RoundNotFound",
            Self::RoundNotActive(_) => "RoundNotActive",
            Self::AlreadyWhispered(_) => "AlreadyWhispered",
            Self::ProverUnavailable(_) => "ProverUnavailable",
            Self::ProofGenerationFailed(_) => "ProofGenerationFailed",
            Self::LedgerTimeout { .. } => "LedgerTimeout",
            Self::LedgerRejected { .. } => "LedgerRejected",
            Self::Ledger(_) => "LedgerError",
            Self::Storage(_) => "StorageError",
        }
    }
}

impl From<LedgerError> for RoundError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::TransportError(TransportError::TransactionFailed(reason)) => {
                Self::LedgerRejected { reason }
            }
            other => Self::Ledger(other),
        }
    }
}
