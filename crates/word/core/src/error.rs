//! Validation errors raised before any side effect happens.
//!
//! Everything in this module describes malformed *input*: a phrase that does
//! not fit the circuit, a field element outside BN254, an empty hint. These
//! are always reported back to the caller and never retried.

use thiserror::Error;

use crate::round::RoundNumber;

/// A value could not be represented as a BN254 field element.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("value is not below the BN254 scalar field modulus")]
    OutOfRange,

    #[error("value is {0} bytes wide, a field element holds at most 32")]
    TooWide(usize),

    #[error("invalid hex field element: {0:?}")]
    InvalidHex(String),
}

/// Phrase or username could not be encoded into circuit inputs.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("phrase is {len} bytes long, must be <= {max} bytes")]
    PhraseTooLong { len: usize, max: usize },

    #[error("username is {len} bytes long, must be <= {max} bytes")]
    UsernameTooLong { len: usize, max: usize },

    #[error("{field} must not contain NUL characters")]
    InvalidCharacter { field: &'static str },

    #[error("username must not be empty")]
    EmptyUsername,
}

impl EncodingError {
    /// Machine-stable reason string.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::PhraseTooLong { .. } => "PhraseTooLong",
            Self::UsernameTooLong { .. } => "UsernameTooLong",
            Self::InvalidCharacter { .. } => "InvalidCharacter",
            Self::EmptyUsername => "EmptyUsername",
        }
    }
}

/// Any input rejected before touching the engine, the store or the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("invalid {field}: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: FieldError,
    },

    #[error("hint must not be empty")]
    EmptyHint,

    #[error("a username is required when username binding is enabled")]
    MissingUsername,

    #[error("invalid {field}: {reason}")]
    Malformed { field: &'static str, reason: String },

    #[error("round {round} is inconsistent: {reason}")]
    InconsistentRound { round: RoundNumber, reason: String },
}

impl ValidationError {
    /// Machine-stable reason string.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Encoding(err) => err.reason(),
            Self::Field { .. } => "InvalidFieldElement",
            Self::EmptyHint => "EmptyHint",
            Self::MissingUsername => "MissingUsername",
            Self::Malformed { .. } => "MalformedInput",
            Self::InconsistentRound { .. } => "InconsistentRound",
        }
    }
}
