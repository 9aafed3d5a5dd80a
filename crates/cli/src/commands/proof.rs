//! Key generation and local proofs.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use console::style;
use rand::rngs::OsRng;
use word_core::{Commitment, encode_phrase};
use zk::{Groth16Engine, ProofBundle, ProofData, PublicSignals};

use super::phrase::username_element;
use crate::settings::Settings;

/// Generate Groth16 proving and verifying keys
///
/// Keys are written to `--keys` (or `THE_WORD_KEYS`).
#[derive(Debug, Parser)]
pub struct Setup {
    /// Generate keys for the username-bound circuit
    #[arg(long)]
    bind_username: bool,
}

impl Setup {
    pub fn execute(&self, settings: &Settings) -> Result<()> {
        let keys = settings
            .keys
            .as_ref()
            .context("setup needs --keys <path> (or THE_WORD_KEYS)")?;

        println!("{} Running circuit setup...", style("→").cyan());
        let engine = Groth16Engine::setup(self.bind_username, &mut OsRng)?;
        engine
            .save(keys)
            .with_context(|| format!("Failed to write keys to {}", keys.display()))?;

        println!(
            "{} Keys written to {} (username binding: {})",
            style("✓").green(),
            keys.display(),
            self.bind_username
        );
        println!("Export them with: export THE_WORD_KEYS={}", keys.display());
        Ok(())
    }
}

/// Prove knowledge of a phrase and write a proof bundle
#[derive(Debug, Parser)]
pub struct Prove {
    /// The phrase
    phrase: String,

    /// Bind the proof to this username
    #[arg(short, long)]
    username: Option<String>,

    /// Output file for the proof bundle
    #[arg(short, long, default_value = "the-word-proof.json")]
    out: PathBuf,
}

impl Prove {
    pub fn execute(&self, settings: &Settings) -> Result<()> {
        let (proof, commitment) = prove(settings, &self.phrase, self.username.as_deref())?;
        let signals = PublicSignals::new(commitment, username_element(self.username.as_deref())?);

        ProofBundle::new(proof, &signals)
            .write(&self.out)
            .with_context(|| format!("Failed to write {}", self.out.display()))?;

        println!("{} Proof written to {}", style("✓").green(), self.out.display());
        println!("Commitment: {commitment}");
        Ok(())
    }
}

/// Verify a proof bundle locally
#[derive(Debug, Parser)]
pub struct Verify {
    /// Proof bundle written by `prove`
    bundle: PathBuf,

    /// Check against this commitment instead of the bundle's own
    #[arg(short, long)]
    commitment: Option<Commitment>,
}

impl Verify {
    pub fn execute(&self, settings: &Settings) -> Result<()> {
        let bundle = ProofBundle::read(&self.bundle)
            .with_context(|| format!("Failed to read {}", self.bundle.display()))?;
        let mut signals = bundle
            .signals()
            .ok_or_else(|| anyhow!("{} has no usable public signals", self.bundle.display()))?;
        if let Some(commitment) = self.commitment {
            signals.commitment = commitment;
        }

        let engine = settings.engine(signals.username.is_some())?;
        if engine.verify(&bundle.proof, &signals)? {
            println!("{} Proof is valid for {}", style("✓").green(), signals.commitment);
            Ok(())
        } else {
            Err(anyhow!("proof does not match {}", signals.commitment))
        }
    }
}

/// Prove `phrase` with the configured engine.
pub(crate) fn prove(
    settings: &Settings,
    phrase: &str,
    username: Option<&str>,
) -> Result<(ProofData, Commitment)> {
    let elements = encode_phrase(phrase)?;
    let username = username_element(username)?;
    let engine = settings.engine(username.is_some())?;
    Ok(engine.prove(&elements, username)?)
}
