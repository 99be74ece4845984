//! `sim_repo` entry point
//!
//! Parses the command line, initializes logging, and dispatches to the
//! command handlers.

use clap::{CommandFactory, Parser};

use esm_sim_repo::cli::{Cli, Commands};
use esm_sim_repo::commands;
use esm_sim_repo::CommandError;

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CommandError> {
    let config = cli.repository_config();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::List { kind } => commands::list(&config, kind.as_deref()),
        Commands::Show { expid } => commands::show(&config, &expid),
        Commands::Params { expid } => commands::params(&config, &expid),
        Commands::Catalog { expid } => commands::catalog(&config, expid.as_deref()),
        Commands::Check => {
            if commands::check(&config)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Summary { json } => commands::summary(&config, json),
        Commands::Export { format, output } => {
            commands::export(&config, &format, output).map(|_| ())
        }
        Commands::Watch { interval } => commands::watch(&config, interval),
    }
}
