//! Commands that change rounds on the server: create, whisper and shout.
//!
//! Proofs are generated locally, so `create` and `whisper` need the same
//! backend (and keys) as the server. Requests are signed with
//! `THE_WORD_PRIVATE_KEY` when it is set, each over a fresh server nonce.

use anyhow::Result;
use clap::Parser;
use console::style;
use word_core::{Prize, RoundNumber};
use word_server::api::{CreateRequest, ShoutRequest, WhisperRequest};

use super::proof::prove;
use crate::client::ApiClient;
use crate::settings::{Credentials, Settings};

/// Open a new round for a phrase
#[derive(Debug, Parser)]
pub struct Create {
    /// The secret phrase
    phrase: String,

    /// Hint shown to players
    hint: String,

    /// Your username, when the server binds proofs to usernames
    #[arg(short, long)]
    username: Option<String>,

    /// Initial prize
    #[arg(short, long, default_value_t = 0)]
    prize: u128,
}

impl Create {
    pub async fn execute(&self, settings: &Settings) -> Result<()> {
        let (proof, commitment) = prove(settings, &self.phrase, self.username.as_deref())?;
        let client = ApiClient::new(&settings.api_url);
        let wallet = settings.wallet()?;
        let credentials = client
            .credentials(wallet.as_ref(), &format!("the-word:create:{commitment}"))
            .await?;
        let (address, signature, message) = split(credentials);

        let receipt = client
            .create(&CreateRequest {
                commitment,
                username: self.username.clone(),
                proof,
                hint: self.hint.clone(),
                prize: Prize(self.prize),
                address,
                signature,
                message,
            })
            .await?;

        println!("{} Round {} created", style("✓").green(), receipt.round);
        println!("Commitment: {commitment}");
        if let Some(tx) = receipt.tx_hash {
            println!("Transaction: {tx}");
        }
        Ok(())
    }
}

/// Prove you know a round's phrase without revealing it
#[derive(Debug, Parser)]
pub struct Whisper {
    /// Round number
    round: RoundNumber,

    /// Your guess
    phrase: String,

    /// Your username, when the server binds proofs to usernames
    #[arg(short, long)]
    username: Option<String>,
}

impl Whisper {
    pub async fn execute(&self, settings: &Settings) -> Result<()> {
        let (proof, _) = prove(settings, &self.phrase, self.username.as_deref())?;
        let client = ApiClient::new(&settings.api_url);
        let wallet = settings.wallet()?;
        let credentials = client
            .credentials(wallet.as_ref(), &format!("the-word:whisper:{}", self.round))
            .await?;
        let (address, signature, message) = split(credentials);

        client
            .whisper(&WhisperRequest {
                round: self.round,
                proof,
                username: self.username.clone(),
                address,
                signature,
                message,
            })
            .await?;

        println!("{} Whispered in round {}", style("✓").green(), self.round);
        Ok(())
    }
}

/// Reveal a round's phrase and close it
#[derive(Debug, Parser)]
pub struct Shout {
    /// Round number
    round: RoundNumber,

    /// The phrase
    phrase: String,
}

impl Shout {
    pub async fn execute(&self, settings: &Settings) -> Result<()> {
        let client = ApiClient::new(&settings.api_url);
        let wallet = settings.wallet()?;
        let credentials = client
            .credentials(wallet.as_ref(), &format!("the-word:shout:{}", self.round))
            .await?;
        let (address, signature, message) = split(credentials);

        let receipt = client
            .shout(&ShoutRequest {
                round: self.round,
                secret: self.phrase.clone(),
                address,
                signature,
                message,
            })
            .await?;

        println!("{} Round {} shouted", style("✓").green(), receipt.round);
        if let Some(tx) = receipt.tx_hash {
            println!("Transaction: {tx}");
        }
        Ok(())
    }
}

fn split(credentials: Option<Credentials>) -> (Option<String>, Option<String>, Option<String>) {
    match credentials {
        Some(c) => (Some(c.address), Some(c.signature), Some(c.message)),
        None => (None, None, None),
    }
}
