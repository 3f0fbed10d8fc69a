// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sunwell`: the thin CLI surface over the Sunwell core. Two commands —
//! `run` and `review` — plus the exit-code contract from spec §6. Every
//! other surface (desktop UI, HTTP/SSE server, project discovery) is out
//! of scope for this binary.

mod color;
mod commands;
mod exit_error;

use clap::{Parser, Subcommand};
use commands::{review, run};
use exit_error::ExitError;

#[derive(Debug, Parser)]
#[command(name = "sunwell", version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")), styles = color::styles())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a goal to completion, escalation, or cancellation.
    Run(run::RunArgs),
    /// Resume a pending recovery state by goal hash.
    Review(review::ReviewArgs),
}

#[tokio::main]
async fn main() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(std::io::stderr)).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => run::execute(args).await,
        Command::Review(args) => review::execute(args).await,
    };

    let code = match result {
        Ok(code) => code,
        Err(ExitError { code, message }) => {
            eprintln!("sunwell: {message}");
            code
        }
    };
    std::process::exit(code);
}
