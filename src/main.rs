use clap::Parser;
use colored::*;
use std::process;
use taxomerge::cli::{Cli, Commands};
use taxomerge::TaxomergeError;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);

        // Use appropriate exit codes based on error type
        let exit_code = match e.downcast_ref::<TaxomergeError>() {
            Some(TaxomergeError::Configuration(_)) => 2,
            Some(TaxomergeError::Io(_)) | Some(TaxomergeError::NotFound(_)) => 3,
            Some(TaxomergeError::Parse(_)) | Some(TaxomergeError::InvalidInput(_)) => 4,
            Some(TaxomergeError::Structure(_)) => 5,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

/// TAXOMERGE_LOG wins; otherwise the configured level, raised by each `-v`
fn init_logging(cli: &Cli) {
    let configured = cli
        .config
        .as_deref()
        .and_then(|path| taxomerge::load_config(path).ok())
        .map(|config| config.logging.level)
        .unwrap_or_else(|| "info".to_string());
    let level = match cli.verbose {
        0 => configured,
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TAXOMERGE_LOG").unwrap_or_else(|_| EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Merge(args) => taxomerge::cli::commands::merge::run(args, cli.config),
        Commands::Conflict(args) => taxomerge::cli::commands::conflict::run(args, cli.config),
    }
}
