//! Groth16 proving and verification on BN254 curve.

use ark_bn254::{Bn254, Fr as Fp254};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_relations::r1cs::ConstraintSynthesizer;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::RngCore;

use crate::ProofError;

const PK_LEN_BYTES: usize = 8;

/// Groth16 proving and verifying keys.
///
/// Generated by a circuit-specific setup. Whoever ran the setup can forge
/// proofs, so production keys must come from a ceremony or a trusted party.
#[derive(Clone)]
pub struct Groth16Keys {
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
}

impl Groth16Keys {
    /// Generate keys from a shape-only circuit instance.
    pub fn generate<C, R>(circuit: C, rng: &mut R) -> Result<Self, ProofError>
    where
        C: ConstraintSynthesizer<Fp254>,
        R: RngCore,
    {
        let params = Groth16::<Bn254>::generate_random_parameters_with_reduction(circuit, rng)
            .map_err(|e| {
                ProofError::CircuitProofError(format!("Groth16 key generation failed: {:?}", e))
            })?;

        Ok(Self {
            verifying_key: params.vk.clone(),
            proving_key: params,
        })
    }

    /// Number of public inputs the keys were generated for.
    pub fn num_public_inputs(&self) -> usize {
        self.verifying_key.gamma_abc_g1.len().saturating_sub(1)
    }

    /// Serialize both keys to bytes.
    ///
    /// Format: [pk_len (8 bytes LE)][pk_bytes][vk_bytes], both compressed.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProofError> {
        let mut pk_bytes = Vec::new();
        self.proving_key
            .serialize_compressed(&mut pk_bytes)
            .map_err(|e| ProofError::SerializationError(e.to_string()))?;
        let mut vk_bytes = Vec::new();
        self.verifying_key
            .serialize_compressed(&mut vk_bytes)
            .map_err(|e| ProofError::SerializationError(e.to_string()))?;

        let mut bytes = Vec::with_capacity(PK_LEN_BYTES + pk_bytes.len() + vk_bytes.len());
        bytes.extend_from_slice(&(pk_bytes.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&pk_bytes);
        bytes.extend_from_slice(&vk_bytes);

        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofError> {
        let (len_prefix, rest) = bytes.split_at_checked(PK_LEN_BYTES).ok_or_else(|| {
            ProofError::SerializationError("Invalid key bytes: too short".to_string())
        })?;

        let mut len_bytes = [0u8; PK_LEN_BYTES];
        len_bytes.copy_from_slice(len_prefix);
        let pk_len = usize::try_from(u64::from_le_bytes(len_bytes)).map_err(|_| {
            ProofError::SerializationError("Invalid key bytes: pk length overflow".to_string())
        })?;

        let (pk_bytes, vk_bytes) = rest.split_at_checked(pk_len).ok_or_else(|| {
            ProofError::SerializationError("Invalid key bytes: pk too short".to_string())
        })?;

        let proving_key = ProvingKey::<Bn254>::deserialize_compressed(pk_bytes)
            .map_err(|e| ProofError::SerializationError(e.to_string()))?;
        let verifying_key = VerifyingKey::<Bn254>::deserialize_compressed(vk_bytes)
            .map_err(|e| ProofError::SerializationError(e.to_string()))?;

        Ok(Self {
            proving_key,
            verifying_key,
        })
    }
}

/// Generate a Groth16 proof for a circuit carrying its witness.
pub fn prove<C, R>(circuit: C, keys: &Groth16Keys, rng: &mut R) -> Result<Proof<Bn254>, ProofError>
where
    C: ConstraintSynthesizer<Fp254>,
    R: RngCore,
{
    Groth16::<Bn254>::create_random_proof_with_reduction(circuit, &keys.proving_key, rng)
        .map_err(|e| ProofError::CircuitProofError(format!("Groth16 proving failed: {:?}", e)))
}

pub fn prepare_verifying_key(vk: &VerifyingKey<Bn254>) -> PreparedVerifyingKey<Bn254> {
    ark_groth16::prepare_verifying_key(vk)
}

/// Verify a proof using a prepared verifying key.
pub fn verify_with_prepared_vk(
    proof: &Proof<Bn254>,
    public_inputs: &[Fp254],
    pvk: &PreparedVerifyingKey<Bn254>,
) -> Result<bool, ProofError> {
    Groth16::<Bn254>::verify_proof(pvk, proof, public_inputs)
        .map_err(|e| ProofError::CircuitProofError(format!("Groth16 verification failed: {:?}", e)))
}

pub fn serialize_proof(proof: &Proof<Bn254>) -> Result<Vec<u8>, ProofError> {
    let mut bytes = Vec::new();
    proof
        .serialize_compressed(&mut bytes)
        .map_err(|e| ProofError::SerializationError(e.to_string()))?;
    Ok(bytes)
}

pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ProofError> {
    Proof::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ProofError::SerializationError(e.to_string()))
}
