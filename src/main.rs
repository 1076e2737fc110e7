// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (RUST_LOG controls the level, default "info")
// 2. Parse command-line arguments using clap
// 3. Start the chosen front-end: terminal prompt or HTTP server
// 4. Exit with proper code (0 = success, 1 = session ended on a failed page,
//    2 = error, e.g. the server could not bind)
//
// Both front-ends are thin: the real work lives in scrape/ (page -> image
// URLs) and download/ (image URLs -> files).
// =============================================================================

mod cli;
mod config;
mod download;
mod error;
mod scrape;
mod server;
mod terminal;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use server::Server;
use terminal::{SessionEnd, TerminalSession};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    // Logs go to stderr so prompts and --json output stay clean on stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    if let Some(config) = cli.command.server_config() {
        Server::new(config)?.run().await?;
        return Ok(0);
    }

    match cli.command.terminal_config() {
        Some(config) => run_terminal(config).await,
        None => Ok(0),
    }
}

async fn run_terminal(config: config::TerminalConfig) -> Result<i32> {
    let cancel = CancellationToken::new();

    // Ctrl-C stops in-flight downloads instead of killing the process
    // mid-write; a second Ctrl-C exits immediately
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling downloads");
            on_interrupt.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    let session = TerminalSession::new(config, cancel)?;
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    let end = session.run(stdin, &mut stdout).await?;
    info!(reason = ?end, "terminal session ended");

    Ok(match end {
        SessionEnd::FetchFailed => 1,
        SessionEnd::Quit | SessionEnd::InputClosed | SessionEnd::Interrupted => 0,
    })
}
