//! Command-line adapter for `nativelib-core`.
//!
//! Parses arguments, builds a loader configuration from flags, the
//! environment and `.env`, and dispatches to one handler per subcommand.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by main.rs only
use dotenvy as _;
use tracing_subscriber as _;

pub mod args;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use args::{LibraryArgs, TreeArgs};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;

/// Run one subcommand.
pub fn dispatch(command: Commands, as_json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Platform { platform } => handlers::platform::execute(platform.as_deref(), as_json),
        Commands::Tree(args) => handlers::tree::execute(&args, as_json),
        Commands::Load {
            library,
            all,
            no_install,
        } => handlers::load::execute(&library, all, no_install, as_json),
        Commands::Extract { library, resource } => {
            handlers::extract::execute(&library, &resource, as_json)
        }
    }
}
