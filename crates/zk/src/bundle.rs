//! Proof bundle files exchanged between `prove` and `verify`.
//!
//! ```json
//! {
//!   "proof": { "bytes": "0x…", "backend": "groth16" },
//!   "publicSignals": ["0x…"]
//! }
//! ```
//!
//! Bundles are written pretty-printed with a trailing newline, so reading a
//! bundle and writing it back reproduces the file byte for byte.

use std::fs;
use std::path::Path;

use word_core::FieldElement;

use crate::prover::{ProofData, ProofError, PublicSignals};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    pub proof: ProofData,
    pub public_signals: Vec<FieldElement>,
}

impl ProofBundle {
    pub fn new(proof: ProofData, signals: &PublicSignals) -> Self {
        Self {
            proof,
            public_signals: signals.to_vec(),
        }
    }

    /// Typed signals, or `None` when the bundle carries neither one nor two.
    pub fn signals(&self) -> Option<PublicSignals> {
        PublicSignals::from_slice(&self.public_signals)
    }

    pub fn to_json(&self) -> Result<String, ProofError> {
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| ProofError::SerializationError(e.to_string()))?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json(json: &str) -> Result<Self, ProofError> {
        serde_json::from_str(json).map_err(|e| ProofError::SerializationError(e.to_string()))
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), ProofError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, ProofError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}
