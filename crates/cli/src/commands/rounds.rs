//! Read-only server queries.

use anyhow::Result;
use clap::Parser;
use console::style;
use word_core::RoundNumber;
use word_server::api::{RoundSummary, RoundView};

use crate::client::ApiClient;
use crate::settings::Settings;

/// Show one round
#[derive(Debug, Parser)]
pub struct Get {
    /// Round number
    round: RoundNumber,
}

impl Get {
    pub async fn execute(&self, settings: &Settings) -> Result<()> {
        let round = ApiClient::new(&settings.api_url).get_round(self.round).await?;
        print_round(&round);
        Ok(())
    }
}

/// List all rounds
#[derive(Debug, Parser)]
pub struct Rounds {}

impl Rounds {
    pub async fn execute(&self, settings: &Settings) -> Result<()> {
        let client = ApiClient::new(&settings.api_url);
        let wallet = settings.wallet()?;
        let credentials = client
            .credentials(wallet.as_ref(), "the-word:rounds")
            .await?;
        let rounds = client.list_rounds(credentials.as_ref()).await?;

        if rounds.is_empty() {
            println!("No rounds yet");
        }
        for round in &rounds {
            println!("{}", summary_line(round));
        }
        Ok(())
    }
}

fn status(active: bool) -> String {
    if active {
        style("active").green().to_string()
    } else {
        style("closed").dim().to_string()
    }
}

fn print_round(round: &RoundView) {
    println!("{} {}", style(format!("Round {}", round.round)).bold(), status(round.active));
    println!("  Hint:       {}", round.hint);
    println!("  Commitment: {}", round.commitment);
    println!("  Prize:      {}", round.prize);
    println!("  Whispers:   {}", round.num_whispers);
    for whisperer in &round.whisperers {
        println!("    - {whisperer}");
    }
    if let Some(secret) = &round.secret {
        println!("  Secret:     {secret}");
    }
    if let Some(shouter) = &round.shouter {
        println!("  Shouted by: {shouter}");
    }
}

fn summary_line(round: &RoundSummary) -> String {
    let mut line = format!(
        "#{:<4} {:<8} prize {:<8} whispers {:<4} {}",
        round.round,
        status(round.active),
        round.prize,
        round.num_whispers,
        round.hint
    );
    if round.whispered == Some(true) {
        line.push_str(" [whispered]");
    }
    if round.shouted == Some(true) {
        line.push_str(" [shouted]");
    }
    line
}
