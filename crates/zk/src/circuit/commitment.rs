//! Poseidon commitments over BN254 field elements.
//!
//! # Performance
//!
//! Uses a globally cached Poseidon config (OnceLock). Round constants and the
//! MDS matrix are derived once on first use; every hash then builds a fresh
//! sponge over the shared config.
//!
//! # Security Parameters
//!
//! - Field: BN254 (254-bit prime)
//! - Rate 2, capacity 1, alpha 5
//! - Full rounds: 8
//! - Partial rounds: 57
//!
//! # Consistency with Circuit
//!
//! [`commit_phrase`] must absorb exactly what `PhraseCommitmentCircuit`
//! absorbs in-circuit: the six phrase elements in one absorb call. A bound
//! username is a separate public input and never enters the hash.

use std::sync::OnceLock;

use ark_bn254::Fr as Fp254;
use ark_crypto_primitives::sponge::{
    CryptographicSponge,
    poseidon::{PoseidonConfig, PoseidonSponge, find_poseidon_ark_and_mds},
};
use ark_ff::{BigInteger, PrimeField};
use word_core::{Commitment, FieldElement, PhraseElements};

use crate::ProofError;

static POSEIDON_CONFIG: OnceLock<PoseidonConfig<Fp254>> = OnceLock::new();

/// Get cached Poseidon config (8/57 rounds, rate 2).
pub fn get_poseidon_config() -> &'static PoseidonConfig<Fp254> {
    POSEIDON_CONFIG.get_or_init(|| {
        let (ark, mds) = find_poseidon_ark_and_mds::<Fp254>(254, 2, 8, 57, 0);
        PoseidonConfig::new(8, 57, 5, mds, ark, 2, 1)
    })
}

/// Lift a canonical field element into the arkworks scalar field.
///
/// `FieldElement` is always below the modulus, so no reduction happens.
pub fn to_field(element: &FieldElement) -> Fp254 {
    Fp254::from_be_bytes_mod_order(element.as_bytes())
}

pub fn from_field(value: Fp254) -> Result<FieldElement, ProofError> {
    let bytes = value.into_bigint().to_bytes_be();
    FieldElement::from_be_slice(&bytes)
        .map_err(|e| ProofError::SerializationError(format!("field element: {e}")))
}

/// The exact absorb sequence shared by the native hash and the circuit.
pub fn absorb_sequence(phrase: &PhraseElements) -> Vec<Fp254> {
    phrase.iter().map(to_field).collect()
}

pub fn hash_many(inputs: &[Fp254]) -> Result<Fp254, ProofError> {
    if inputs.is_empty() {
        return Err(ProofError::CircuitProofError(
            "Poseidon needs at least one input".to_string(),
        ));
    }
    let mut sponge = PoseidonSponge::<Fp254>::new(get_poseidon_config());
    sponge.absorb(&inputs.to_vec());
    sponge
        .squeeze_field_elements::<Fp254>(1)
        .first()
        .copied()
        .ok_or_else(|| ProofError::CircuitProofError("Poseidon squeeze failed".to_string()))
}

/// Commitment to a phrase. Independent of who proves knowledge of it.
pub fn commit_phrase(phrase: &PhraseElements) -> Result<Commitment, ProofError> {
    let digest = hash_many(&absorb_sequence(phrase))?;
    from_field(digest).map(Commitment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use word_core::encode_phrase;

    #[test]
    fn commitment_is_deterministic() {
        let phrase = encode_phrase("hunter2").unwrap();
        assert_eq!(
            commit_phrase(&phrase).unwrap(),
            commit_phrase(&phrase).unwrap()
        );
    }

    #[test]
    fn distinct_phrases_commit_differently() {
        let a = commit_phrase(&encode_phrase("hunter2").unwrap()).unwrap();
        let b = commit_phrase(&encode_phrase("hunter3").unwrap()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn commitment_hashes_the_six_phrase_elements() {
        let phrase = encode_phrase("hunter2").unwrap();
        let digest = hash_many(&absorb_sequence(&phrase)).unwrap();
        assert_eq!(absorb_sequence(&phrase).len(), 6);
        assert_eq!(commit_phrase(&phrase).unwrap(), Commitment(from_field(digest).unwrap()));
    }

    #[test]
    fn field_conversion_round_trips() {
        let element = FieldElement::from_hex(
            "0x30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000000",
        )
        .unwrap();
        assert_eq!(from_field(to_field(&element)).unwrap(), element);
        assert_eq!(to_field(&FieldElement::from_u64(42)), Fp254::from(42u64));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(hash_many(&[]).is_err());
    }
}
