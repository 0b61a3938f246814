// src/bin/ttbuild.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use ttbuild::{
    cli::{Cli, Commands, handlers},
    constants::{EXIT_FAILURE, EXIT_SUCCESS, LOG_ENV},
};

/// Sets up logging, parses arguments, dispatches to the handler and turns
/// its result into the exit code.
fn main() {
    init_logging();

    // Usage errors exit with 1 like every other failure; help and version
    // requests exit with 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() {
                EXIT_FAILURE
            } else {
                EXIT_SUCCESS
            });
        }
    };

    match run_cli(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}

/// `TTBUILD_LOG` takes precedence over `RUST_LOG`; the default level is `warn`.
fn init_logging() {
    let filter = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());
    env_logger::Builder::new()
        .parse_filters(&filter)
        .target(env_logger::Target::Stderr)
        .init();
}

fn run_cli(cli: Cli) -> Result<i32> {
    log::debug!("CLI args parsed: {:?}", cli);

    match cli.command {
        Commands::Transform(args) => handlers::transform::handle(args, &cli.globals),
        Commands::Clean(args) => handlers::clean::handle(args, &cli.globals),
    }
}
