//! Progression engine driver.
//!
//! Loads the content tables, starts the session runtime and replays
//! scripted sessions, or inspects saved characters.
//! Run with: `cargo run -p progression-cli -- <command>`

mod commands;
mod dirs;
mod scenario;

use anyhow::Result;
use clap::Parser;
use commands::{Inspect, Replay};

/// Player attribute and progression engine tools
#[derive(Parser)]
#[command(name = "progression")]
#[command(about = "Replay scripted sessions against the progression engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Replay a RON scenario and log every notification
    Replay(Replay),

    /// Read and inspect a saved character
    Inspect(Inspect),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (for PLAYER_DATA_DIR, RUST_LOG, ...)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Replay(cmd) => cmd.execute().await,
        Command::Inspect(cmd) => cmd.execute(),
    }
}
