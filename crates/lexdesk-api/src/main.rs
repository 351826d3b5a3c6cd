//! LexDesk CLI entry point.
//!
//! Binary name: `lexdesk`
//!
//! Parses CLI arguments, opens the slot database and stores, then dispatches
//! to the appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use lexdesk_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut options = TracingOptions::from_verbosity(cli.verbose);
    if cli.quiet && cli.verbose == 0 {
        options.default_directive = "error".to_string();
    }
    options.json = cli.log_json;
    options.enable_otel = cli.otel;
    init_tracing(&options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;

    match cli.command {
        Commands::Client { action } => {
            cli::client::handle_client_command(action, &state, cli.json).await
        }
        Commands::Message { action } => {
            cli::message::handle_message_command(action, &state, cli.json).await
        }
        Commands::Chat { action } => cli::chat::handle_chat_command(action, &state, cli.json).await,
        Commands::Status => cli::status::status(&state, cli.json).await,
    }
}
