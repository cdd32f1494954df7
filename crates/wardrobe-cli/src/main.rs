//! Wardrobe CLI - talk to the outfit assistant and manage your wardrobe
//! from the terminal.

mod app;
mod commands;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use commands::{Command, USAGE};

/// Global flag: keep the session in memory for this run only
const EPHEMERAL_FLAG: &str = "--ephemeral";

/// Remove every occurrence of `flag`, returning whether it was present
fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|arg| arg != flag);
    args.len() != before
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // RUST_LOG controls the level (e.g. RUST_LOG=wardrobe_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let ephemeral = take_flag(&mut args, EPHEMERAL_FLAG);
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::from(2));
        }
    };
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(ExitCode::SUCCESS);
    }

    let mut app = App::new(ephemeral)?;
    info!(api_url = %app.api.base_url(), "Wardrobe CLI starting");

    if let Err(e) = app.run(command.clone()).await {
        eprintln!("{}: {}", command.failure_title(), app.describe_error(&command, &e));
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
