//! R1CS circuit proving knowledge of a committed phrase.

use ark_bn254::Fr as Fp254;
use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::FieldVar;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use word_core::PHRASE_ELEMENTS;

use super::commitment::get_poseidon_config;

/// Public inputs: `commitment`, then `username` when bound.
/// Witness: the six phrase elements.
/// Constraints: `Poseidon(phrase) == commitment`, plus `username² == u²`
/// over a witnessed square so the username input is fixed by the proof.
#[derive(Clone)]
pub struct PhraseCommitmentCircuit {
    pub phrase: Option<[Fp254; PHRASE_ELEMENTS]>,
    pub commitment: Option<Fp254>,
    pub username: Option<Fp254>,
    pub binds_username: bool,
}

impl PhraseCommitmentCircuit {
    pub fn new(
        phrase: [Fp254; PHRASE_ELEMENTS],
        commitment: Fp254,
        username: Option<Fp254>,
    ) -> Self {
        Self {
            phrase: Some(phrase),
            commitment: Some(commitment),
            username,
            binds_username: username.is_some(),
        }
    }

    /// Shape-only instance for key generation.
    pub fn dummy(binds_username: bool) -> Self {
        Self {
            phrase: None,
            commitment: None,
            username: None,
            binds_username,
        }
    }
}

impl ConstraintSynthesizer<Fp254> for PhraseCommitmentCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fp254>) -> Result<(), SynthesisError> {
        let commitment_var = FpVar::new_input(cs.clone(), || {
            self.commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;

        if self.binds_username {
            let username_var = FpVar::new_input(cs.clone(), || {
                self.username.ok_or(SynthesisError::AssignmentMissing)
            })?;
            let squared = FpVar::new_witness(cs.clone(), || {
                self.username
                    .map(|username| username * username)
                    .ok_or(SynthesisError::AssignmentMissing)
            })?;
            username_var.mul_equals(&username_var, &squared)?;
        }

        let mut absorbed = Vec::with_capacity(PHRASE_ELEMENTS);
        for index in 0..PHRASE_ELEMENTS {
            absorbed.push(FpVar::new_witness(cs.clone(), || {
                self.phrase
                    .map(|phrase| phrase[index])
                    .ok_or(SynthesisError::AssignmentMissing)
            })?);
        }

        let mut sponge = PoseidonSpongeVar::new(cs, get_poseidon_config());
        sponge.absorb(&absorbed)?;
        let digest = sponge
            .squeeze_field_elements(1)?
            .into_iter()
            .next()
            .ok_or(SynthesisError::Unsatisfiable)?;

        digest.enforce_equal(&commitment_var)?;

        Ok(())
    }
}
