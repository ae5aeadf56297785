//! Docket CLI - extract legal events from documents into a five-column table.

use clap::Parser;
use docket_cli::commands;
use docket_cli::{Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> docket_cli::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so exports on stdout stay clean
    let default_filter = if cli.verbose { "docket=debug" } else { "docket=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(cli.config.as_deref())?;
    let formatter = Formatter::new(!cli.no_color);

    match cli.command {
        Command::Extract(args) => commands::execute_extract(args, config, &formatter)?,
        Command::Providers => commands::execute_providers(&config, &formatter)?,
    }

    Ok(())
}
