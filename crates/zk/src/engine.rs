//! Groth16 engine over the phrase commitment circuit.

use std::fs;
use std::path::Path;

use ark_bn254::{Bn254, Fr as Fp254};
use ark_groth16::PreparedVerifyingKey;
use ark_std::rand::RngCore;
use rand::rngs::OsRng;
use word_core::{Commitment, FieldElement, PHRASE_ELEMENTS, PhraseElements};

use crate::circuit::PhraseCommitmentCircuit;
use crate::circuit::commitment::{self, to_field};
use crate::circuit::groth16::{self, Groth16Keys};
use crate::prover::{
    ProofBackend, ProofData, ProofEngine, ProofError, PublicSignals, expect_username,
};

/// Real proving engine. Keys are loaded once and shared immutably.
pub struct Groth16Engine {
    keys: Groth16Keys,
    pvk: PreparedVerifyingKey<Bn254>,
    binds_username: bool,
}

impl Groth16Engine {
    /// Wrap existing keys, inferring username binding from their public input count.
    pub fn from_keys(keys: Groth16Keys) -> Result<Self, ProofError> {
        let binds_username = match keys.num_public_inputs() {
            1 => false,
            2 => true,
            other => {
                return Err(ProofError::ProverUnavailable(format!(
                    "keys expect {other} public inputs; the phrase circuit has 1 or 2"
                )));
            }
        };
        let pvk = groth16::prepare_verifying_key(&keys.verifying_key);
        Ok(Self {
            keys,
            pvk,
            binds_username,
        })
    }

    /// Run a circuit-specific setup and return an engine over fresh keys.
    pub fn setup<R: RngCore>(binds_username: bool, rng: &mut R) -> Result<Self, ProofError> {
        tracing::info!(binds_username, "Running Groth16 setup for the phrase circuit");
        let keys = Groth16Keys::generate(PhraseCommitmentCircuit::dummy(binds_username), rng)?;
        Self::from_keys(keys)
    }

    /// Load keys written by [`Groth16Engine::save`].
    ///
    /// Any failure to read or decode the file, or keys built for the other
    /// binding mode, makes the prover unavailable.
    pub fn load(path: impl AsRef<Path>, binds_username: bool) -> Result<Self, ProofError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            ProofError::ProverUnavailable(format!("cannot read keys {}: {e}", path.display()))
        })?;
        let keys = Groth16Keys::from_bytes(&bytes).map_err(|e| {
            ProofError::ProverUnavailable(format!("cannot decode keys {}: {e}", path.display()))
        })?;
        let engine = Self::from_keys(keys)?;

        if engine.binds_username != binds_username {
            return Err(ProofError::ProverUnavailable(format!(
                "keys {} were generated with username binding {}, expected {}",
                path.display(),
                engine.binds_username,
                binds_username
            )));
        }

        tracing::info!(path = %path.display(), binds_username, "Loaded Groth16 keys");
        Ok(engine)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProofError> {
        fs::write(path, self.keys.to_bytes()?)?;
        Ok(())
    }

    pub fn keys(&self) -> &Groth16Keys {
        &self.keys
    }

    fn public_inputs(signals: &PublicSignals) -> Vec<Fp254> {
        signals.to_vec().iter().map(to_field).collect()
    }
}

impl ProofEngine for Groth16Engine {
    fn backend(&self) -> ProofBackend {
        ProofBackend::Groth16
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
        let commitment = commitment::commit_phrase(phrase)?;

        let mut witness = [Fp254::from(0u64); PHRASE_ELEMENTS];
        for (slot, element) in witness.iter_mut().zip(phrase.iter()) {
            *slot = to_field(element);
        }
        let circuit = PhraseCommitmentCircuit::new(
            witness,
            to_field(&commitment.element()),
            username.as_ref().map(to_field),
        );

        let proof = groth16::prove(circuit, &self.keys, &mut OsRng)?;
        let bytes = groth16::serialize_proof(&proof)?;
        tracing::debug!(%commitment, size = bytes.len(), "Generated Groth16 proof");

        Ok((
            ProofData {
                bytes,
                backend: ProofBackend::Groth16,
            },
            commitment,
        ))
    }

    fn verify(&self, proof: &ProofData, signals: &PublicSignals) -> Result<bool, ProofError> {
        if proof.backend != ProofBackend::Groth16 {
            tracing::debug!(backend = %proof.backend, "Rejecting proof from another backend");
            return Ok(false);
        }
        if signals.username.is_some() != self.binds_username {
            tracing::debug!(
                signals = signals.len(),
                binds_username = self.binds_username,
                "Rejecting public signals with the wrong cardinality"
            );
            return Ok(false);
        }

        let Ok(decoded) = groth16::deserialize_proof(&proof.bytes) else {
            tracing::debug!("Rejecting malformed Groth16 proof bytes");
            return Ok(false);
        };

        match groth16::verify_with_prepared_vk(&decoded, &Self::public_inputs(signals), &self.pvk)
        {
            Ok(valid) => Ok(valid),
            Err(err) => {
                tracing::debug!(error = %err, "Groth16 verifier rejected the inputs");
                Ok(false)
            }
        }
    }
}
