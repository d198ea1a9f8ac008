mod cli;
mod commands;
mod config;
mod hearts;
mod model;
mod notify;
mod predict;
mod render;
mod scheduler;
mod storage;
mod tracker;
mod ui;
mod widgets;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let command = args.command.unwrap_or(cli::Command::Tui);
    init_tracing(matches!(command, cli::Command::Tui));
    match command {
        cli::Command::Init => commands::init(),
        cli::Command::Cycle { action } => commands::cycle(action).await,
        cli::Command::Journal { action } => commands::journal(action).await,
        cli::Command::Reminder { action } => commands::reminder(action).await,
        cli::Command::Notify { action } => commands::notify(action).await,
        cli::Command::Faq => commands::faq(),
        cli::Command::Contact {
            name,
            email,
            message,
        } => commands::contact(name, email, message),
        cli::Command::Tui => commands::tui().await,
    }
}

/// Logs go to stderr, which the TUI shares with its alternate screen, so the
/// TUI stays silent unless RUST_LOG asks otherwise.
fn init_tracing(tui: bool) {
    let default = if tui { "off" } else { "bloom=warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .init();
}
