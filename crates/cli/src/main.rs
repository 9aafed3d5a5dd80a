//! `the-word`: command-line client for The Word.
//!
//! ```bash
//! the-word setup --keys keys.bin
//! export THE_WORD_KEYS=keys.bin
//! the-word create "hunter2" "a classic password"
//! the-word whisper 1 "hunter2"
//! the-word shout 1 "hunter2"
//! ```

mod client;
mod commands;
mod settings;

use anyhow::Result;
use clap::Parser;
use commands::{Create, Encode, Get, Hash, Prove, Rounds, Setup, Shout, Verify, Whisper};
use console::style;
use settings::Settings;

/// Command-line client for The Word
#[derive(Parser)]
#[command(name = "the-word")]
#[command(about = "Commit to secret phrases and prove you know them", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Encode a phrase into field elements
    Encode(Encode),

    /// Commit to a phrase
    Hash(Hash),

    /// Generate Groth16 keys
    Setup(Setup),

    /// Write a proof bundle for a phrase
    Prove(Prove),

    /// Verify a proof bundle
    Verify(Verify),

    /// Show a round
    Get(Get),

    /// List rounds
    Rounds(Rounds),

    /// Create a round
    Create(Create),

    /// Whisper a proof of knowledge
    Whisper(Whisper),

    /// Shout the phrase and close the round
    Shout(Shout),
}

impl Command {
    async fn execute(&self, settings: &Settings) -> Result<()> {
        match self {
            Command::Encode(cmd) => cmd.execute(),
            Command::Hash(cmd) => cmd.execute(),
            Command::Setup(cmd) => cmd.execute(settings),
            Command::Prove(cmd) => cmd.execute(settings),
            Command::Verify(cmd) => cmd.execute(settings),
            Command::Get(cmd) => cmd.execute(settings).await,
            Command::Rounds(cmd) => cmd.execute(settings).await,
            Command::Create(cmd) => cmd.execute(settings).await,
            Command::Whisper(cmd) => cmd.execute(settings).await,
            Command::Shout(cmd) => cmd.execute(settings).await,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if it exists (for THE_WORD_* variables)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = cli.command.execute(&cli.settings).await {
        eprintln!("{} {err:#}", style("ERROR:").red().bold());
        std::process::exit(1);
    }
}
