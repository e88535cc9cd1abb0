//! Main commands enum and primary subcommands.

use clap::Subcommand;

use nativelib_core::PLATFORM_ENV;

use crate::args::{LibraryArgs, TreeArgs};

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the platform tag and shared library extension
    Platform {
        /// Use this <os>-<arch> tag instead of probing the host
        #[arg(long, env = PLATFORM_ENV)]
        platform: Option<String>,
    },

    /// Print the dependency tree of a manifest
    Tree(TreeArgs),

    /// Load the primary library, or the whole tree, into this process
    Load {
        #[command(flatten)]
        library: LibraryArgs,
        /// Load every library in the manifest, dependencies first
        #[arg(long)]
        all: bool,
        /// Do not extract bundled copies when the library is missing
        #[arg(long)]
        no_install: bool,
    },

    /// Copy one bundled resource into the extraction directory
    Extract {
        #[command(flatten)]
        library: LibraryArgs,
        /// Resource name, e.g. "libshogun.so.19" or "lddtree.txt"
        resource: String,
    },
}
