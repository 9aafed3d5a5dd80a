//! Engine interface for phrase commitments and proofs.
//!
//! Defines the common interface implemented by all proving engines.

use core::fmt;

use word_core::{Commitment, FieldElement, PhraseElements};

use crate::circuit::commitment;

/// ZK proof data container.
///
/// Contains serialized proof bytes and backend identifier. On the wire the
/// bytes are a `0x`-prefixed hex string.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProofData {
    #[serde(with = "hex_bytes")]
    pub bytes: Vec<u8>,
    pub backend: ProofBackend,
}

/// Identifies which engine generated a proof.
///
/// Variants exist regardless of enabled features so that proofs from any
/// engine deserialize everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofBackend {
    Groth16,
    Stub,
}

impl ProofBackend {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Groth16 => "groth16",
            Self::Stub => "stub",
        }
    }
}

impl fmt::Display for ProofBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ProofBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groth16" | "arkworks" => Ok(Self::Groth16),
            "stub" => Ok(Self::Stub),
            other => Err(format!(
                "invalid proof backend: {other}. Must be groth16 or stub"
            )),
        }
    }
}

/// Public inputs of the phrase circuit.
///
/// The flattened order is `[commitment]` or `[commitment, username]`; this is
/// the only place that order is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicSignals {
    pub commitment: Commitment,
    pub username: Option<FieldElement>,
}

impl PublicSignals {
    pub const fn new(commitment: Commitment, username: Option<FieldElement>) -> Self {
        Self {
            commitment,
            username,
        }
    }

    pub fn to_vec(&self) -> Vec<FieldElement> {
        let mut signals = Vec::with_capacity(2);
        signals.push(self.commitment.element());
        signals.extend(self.username);
        signals
    }

    /// Rebuild typed signals from their flattened form.
    ///
    /// Returns `None` unless the slice holds one or two elements.
    pub fn from_slice(signals: &[FieldElement]) -> Option<Self> {
        match signals {
            [commitment] => Some(Self::new(Commitment(*commitment), None)),
            [commitment, username] => Some(Self::new(Commitment(*commitment), Some(*username))),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        1 + usize::from(self.username.is_some())
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Errors that can occur during commitment, proof generation or verification.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("proving engine unavailable: {0}")]
    ProverUnavailable(String),

    #[error("circuit proof generation failed: {0}")]
    CircuitProofError(String),

    #[error("this engine binds usernames; a username is required")]
    MissingUsername,

    #[error("this engine does not bind usernames; unexpected username")]
    UnexpectedUsername,

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Engine interface shared by every proof system.
///
/// Rejections are never errors: `verify` returns `Ok(false)` for a wrong
/// proof, a proof from another backend, or public signals whose cardinality
/// does not match the circuit. `Err` is reserved for engine failures.
pub trait ProofEngine: Send + Sync {
    fn backend(&self) -> ProofBackend;

    /// Whether the circuit carries the username as a second public signal.
    fn binds_username(&self) -> bool;

    /// Poseidon commitment over the phrase vector.
    fn commit(&self, phrase: &PhraseElements) -> Result<Commitment, ProofError> {
        commitment::commit_phrase(phrase)
    }

    /// Prove knowledge of `phrase`, returning the proof and the commitment it
    /// proves against. When bound, `username` becomes the second public
    /// signal; it never changes the commitment.
    fn prove(
        &self,
        phrase: &PhraseElements,
        username: Option<FieldElement>,
    ) -> Result<(ProofData, Commitment), ProofError>;

    fn verify(&self, proof: &ProofData, signals: &PublicSignals) -> Result<bool, ProofError>;
}

/// Check that a username is present exactly when the circuit binds one.
pub(crate) fn expect_username(
    binds_username: bool,
    username: Option<FieldElement>,
) -> Result<Option<FieldElement>, ProofError> {
    match (binds_username, username) {
        (true, None) => Err(ProofError::MissingUsername),
        (false, Some(_)) => Err(ProofError::UnexpectedUsername),
        (_, username) => Ok(username),
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .unwrap_or(&raw);
        hex::decode(digits).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Stub Engine
// ============================================================================

#[cfg(feature = "stub")]
const STUB_MAGIC: &[u8; 4] = b"stub";

/// Stub engine for testing and development.
///
/// Commitments are the real Poseidon commitments. Proofs are the magic bytes
/// `stub` followed by the public signals, so a proof made for one phrase still
/// fails against another phrase's commitment.
///
/// **Warning**: Anyone can forge these proofs - do not use in production.
#[cfg(feature = "stub")]
#[derive(Debug, Clone, Copy)]
pub struct StubEngine {
    binds_username: bool,
}

#[cfg(feature = "stub")]
impl StubEngine {
    pub const fn new(binds_username: bool) -> Self {
        Self { binds_username }
    }

    fn encode(signals: &PublicSignals) -> Vec<u8> {
        let mut bytes = STUB_MAGIC.to_vec();
        for element in signals.to_vec() {
            bytes.extend_from_slice(element.as_bytes());
        }
        bytes
    }
}

#[cfg(feature = "stub")]
impl ProofEngine for StubEngine {
    fn backend(&self) -> ProofBackend {
        ProofBackend::Stub
    }

    fn binds_username(&self) -> bool {
        self.binds_username
    }

    fn prove(
        &self,
        phrase: &PhraseElements,
        username: Option<FieldElement>,
    ) -> Result<(ProofData, Commitment), ProofError> {
        let username = expect_username(self.binds_username, username)?;
        let commitment = self.commit(phrase)?;
        let signals = PublicSignals::new(commitment, username);
        let proof = ProofData {
            bytes: Self::encode(&signals),
            backend: ProofBackend::Stub,
        };
        Ok((proof, commitment))
    }

    fn verify(&self, proof: &ProofData, signals: &PublicSignals) -> Result<bool, ProofError> {
        if proof.backend != ProofBackend::Stub
            || signals.username.is_some() != self.binds_username
        {
            return Ok(false);
        }
        Ok(proof.bytes == Self::encode(signals))
    }
}
