//! CLI entry point.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use nativelib_cli::{Cli, CliError, dispatch};

fn init_tracing(verbose: bool) {
    // RUST_LOG wins over --verbose.
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    // Load environment variables before clap reads `env = ...` fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        if let Err(err) = Cli::command().print_help() {
            eprintln!("{err}");
        }
        return;
    };

    if let Err(err) = dispatch(command, cli.json) {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }
}
