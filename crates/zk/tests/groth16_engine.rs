//! End-to-end tests for the Groth16 phrase engine.

use std::sync::OnceLock;

use ark_std::test_rng;
use word_core::{encode_phrase, encode_username};
use zk::{
    Groth16Engine, ProofBackend, ProofBundle, ProofData, ProofEngine, ProofError, PublicSignals,
};

fn engine() -> &'static Groth16Engine {
    static ENGINE: OnceLock<Groth16Engine> = OnceLock::new();
    ENGINE.get_or_init(|| Groth16Engine::setup(false, &mut test_rng()).expect("setup"))
}

fn bound_engine() -> &'static Groth16Engine {
    static ENGINE: OnceLock<Groth16Engine> = OnceLock::new();
    ENGINE.get_or_init(|| Groth16Engine::setup(true, &mut test_rng()).expect("setup"))
}

#[test]
fn proof_verifies_against_its_commitment() {
    let engine = engine();
    let phrase = encode_phrase("hunter2").unwrap();

    let (proof, commitment) = engine.prove(&phrase, None).unwrap();
    assert_eq!(proof.backend, ProofBackend::Groth16);
    assert_eq!(commitment, engine.commit(&phrase).unwrap());
    assert!(
        engine
            .verify(&proof, &PublicSignals::new(commitment, None))
            .unwrap()
    );
}

#[test]
fn proof_for_one_phrase_fails_against_another_commitment() {
    let engine = engine();
    let (proof, _) = engine
        .prove(&encode_phrase("hunter2").unwrap(), None)
        .unwrap();
    let other = engine
        .commit(&encode_phrase("hunter3").unwrap())
        .unwrap();

    assert!(!engine.verify(&proof, &PublicSignals::new(other, None)).unwrap());
}

#[test]
fn wrong_cardinality_is_a_rejection_not_an_error() {
    let engine = engine();
    let (proof, commitment) = engine
        .prove(&encode_phrase("hunter2").unwrap(), None)
        .unwrap();
    let username = encode_username("alice").unwrap();

    assert!(
        !engine
            .verify(&proof, &PublicSignals::new(commitment, Some(username)))
            .unwrap()
    );
}

#[test]
fn foreign_and_malformed_proofs_are_rejected() {
    let engine = engine();
    let commitment = engine
        .commit(&encode_phrase("hunter2").unwrap())
        .unwrap();
    let signals = PublicSignals::new(commitment, None);

    let stub = ProofData {
        bytes: vec![0xde, 0xad],
        backend: ProofBackend::Stub,
    };
    let garbage = ProofData {
        bytes: vec![0u8; 7],
        backend: ProofBackend::Groth16,
    };
    assert!(!engine.verify(&stub, &signals).unwrap());
    assert!(!engine.verify(&garbage, &signals).unwrap());
}

#[test]
fn username_binding_ties_proof_to_username() {
    let engine = bound_engine();
    let phrase = encode_phrase("hunter2").unwrap();
    let alice = encode_username("alice").unwrap();
    let bob = encode_username("bob").unwrap();

    let (proof, commitment) = engine.prove(&phrase, Some(alice)).unwrap();
    assert!(
        engine
            .verify(&proof, &PublicSignals::new(commitment, Some(alice)))
            .unwrap()
    );
    assert!(
        !engine
            .verify(&proof, &PublicSignals::new(commitment, Some(bob)))
            .unwrap()
    );
    assert!(matches!(
        engine.prove(&phrase, None),
        Err(ProofError::MissingUsername)
    ));

    // Bob proves the same phrase against the same commitment.
    let (bob_proof, bob_commitment) = engine.prove(&phrase, Some(bob)).unwrap();
    assert_eq!(bob_commitment, commitment);
    assert_eq!(commitment, engine.commit(&phrase).unwrap());
    assert!(
        engine
            .verify(&bob_proof, &PublicSignals::new(commitment, Some(bob)))
            .unwrap()
    );
}

#[test]
fn keys_survive_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("phrase.keys");
    engine().save(&path).unwrap();

    let loaded = Groth16Engine::load(&path, false).unwrap();
    let phrase = encode_phrase("correct horse battery staple").unwrap();
    let (proof, commitment) = loaded.prove(&phrase, None).unwrap();
    assert!(
        engine()
            .verify(&proof, &PublicSignals::new(commitment, None))
            .unwrap()
    );

    assert!(matches!(
        Groth16Engine::load(&path, true),
        Err(ProofError::ProverUnavailable(_))
    ));
}

#[test]
fn missing_or_corrupt_keys_make_the_prover_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.keys");
    assert!(matches!(
        Groth16Engine::load(&missing, false),
        Err(ProofError::ProverUnavailable(_))
    ));

    let corrupt = dir.path().join("corrupt.keys");
    std::fs::write(&corrupt, [1u8, 2, 3]).unwrap();
    assert!(matches!(
        Groth16Engine::load(&corrupt, false),
        Err(ProofError::ProverUnavailable(_))
    ));
}

#[test]
fn bundle_carries_everything_needed_to_verify() {
    let engine = engine();
    let (proof, commitment) = engine
        .prove(&encode_phrase("hunter2").unwrap(), None)
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("proof.json");
    ProofBundle::new(proof, &PublicSignals::new(commitment, None))
        .write(&path)
        .unwrap();

    let bundle = ProofBundle::read(&path).unwrap();
    let signals = bundle.signals().unwrap();
    assert_eq!(signals.commitment, commitment);
    assert!(engine.verify(&bundle.proof, &signals).unwrap());
}
