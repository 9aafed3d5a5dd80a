//! Options shared by every command.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use k256::ecdsa::SigningKey;
use word_server::auth::wallet::{address_of, sign_personal_message, signing_key_from_hex};
use zk::{Groth16Engine, ProofBackend, ProofEngine};

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Base URL of The Word server
    #[arg(
        long,
        env = "THE_WORD_API_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    pub api_url: String,

    /// Groth16 keys file used for local proofs
    #[arg(long, env = "THE_WORD_KEYS", global = true)]
    pub keys: Option<PathBuf>,

    /// Proving backend for local proofs (groth16 or stub)
    #[arg(long, env = "PROOF_BACKEND", default_value = "groth16", global = true)]
    pub backend: ProofBackend,

    /// Hex secp256k1 key used to sign server requests
    #[arg(long, env = "THE_WORD_PRIVATE_KEY", hide_env_values = true, global = true)]
    pub private_key: Option<String>,
}

impl Settings {
    /// Engine for local proving. Keys generated with username binding only
    /// load when `binds_username` is set, and vice versa.
    pub fn engine(&self, binds_username: bool) -> Result<Box<dyn ProofEngine>> {
        match self.backend {
            ProofBackend::Groth16 => {
                let path = self
                    .keys
                    .as_ref()
                    .context("Set THE_WORD_KEYS (or --keys) to a file written by `the-word setup`")?;
                Ok(Box::new(Groth16Engine::load(path, binds_username)?))
            }
            ProofBackend::Stub => stub_engine(binds_username),
        }
    }

    /// Wallet used to sign requests, if a private key is configured.
    pub fn wallet(&self) -> Result<Option<Wallet>> {
        self.private_key
            .as_deref()
            .map(|hex| {
                signing_key_from_hex(hex)
                    .map(Wallet::new)
                    .map_err(|e| anyhow!("THE_WORD_PRIVATE_KEY: {e}"))
            })
            .transpose()
    }
}

#[cfg(feature = "stub")]
fn stub_engine(binds_username: bool) -> Result<Box<dyn ProofEngine>> {
    Ok(Box::new(zk::StubEngine::new(binds_username)))
}

#[cfg(not(feature = "stub"))]
fn stub_engine(_binds_username: bool) -> Result<Box<dyn ProofEngine>> {
    anyhow::bail!("PROOF_BACKEND=stub requires the `stub` feature")
}

/// Wallet credentials as they appear in request bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub address: String,
    pub signature: String,
    pub message: String,
}

pub struct Wallet {
    key: SigningKey,
    address: String,
}

impl Wallet {
    pub fn new(key: SigningKey) -> Self {
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn sign(&self, message: impl Into<String>) -> Result<Credentials> {
        let message = message.into();
        let signature = sign_personal_message(&self.key, &message)?;
        Ok(Credentials {
            address: self.address.clone(),
            signature,
            message,
        })
    }
}
