//! Resolution and loading of bundled native shared libraries.
//!
//! An application ships, per platform, a dependency manifest (`lddtree.txt`)
//! and the library files it names. At runtime [`NativeLibraryLoader`]:
//!
//! 1. identifies the platform (`linux-x86_64`, `osx-aarch64`, ...)
//! 2. parses the manifest for `{name}-{platform}` into a [`DependencyTree`]
//! 3. prefers copies already installed on the host, extracting bundled copies
//!    into a private versioned directory otherwise
//! 4. loads the primary library, or the whole tree dependencies-first
//!
//! The dynamic linker and the resource source are ports
//! ([`DynamicLinker`], [`ResourceBundle`]) so everything above them runs
//! without native payloads.
#![deny(unused_crate_dependencies)]

pub mod bundle;
pub mod config;
pub mod error;
pub mod extract;
pub mod linker;
pub mod loader;
pub mod locate;
pub mod manifest;
pub mod platform;

#[cfg(test)]
mod test_utils;

pub use bundle::{DirectoryBundle, ResourceBundle, StaticBundle, resource_path};
pub use config::{
    DEFAULT_SYSTEM_PREFIX, LoaderConfig, PACKAGE_PREFIX_ENV, PLATFORM_ENV, TARGET_DIR_ENV,
};
pub use error::{LoaderError, LoaderResult};
pub use extract::{ExtractError, Extraction, ResourceExtractor};
pub use linker::{DynamicLinker, LinkerError, SystemLinker};
pub use loader::{
    AttemptFailureReason, FailedNode, LoadAttemptFailure, LoadReport, LoadState, LoadStrategy,
    LoadedLibrary, LoadedNode, LoaderBuilder, NativeLibraryLoader, NodeLoadFailure,
    NodeResolution, ResolutionTable,
};
pub use locate::{LibraryLocator, LocateResult};
pub use manifest::{
    DependencyTree, DependencyTreeNode, MANIFEST_RESOURCE, ManifestError, ManifestParser, NodeId,
    format_tree,
};
pub use platform::{Os, PlatformError, PlatformTag};
