//! CLI-specific error types and mappings.
//!
//! Maps `LoaderError` onto exit codes and user-facing messages.

use nativelib_core::{ExtractError, LoaderError, PlatformError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// A manifest could not be parsed.
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    /// An input file or bundled resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Nothing is bundled for this platform.
    #[error("{0}")]
    Unsupported(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// The dynamic linker rejected every load strategy.
    #[error("Load error: {0}")]
    Load(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error (any failure not mapped to a `CliError`)
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Arguments(_) => 2,    // EX_USAGE
            Self::Manifest(_) => 65,    // EX_DATAERR
            Self::NotFound(_) => 66,    // EX_NOINPUT
            Self::Unsupported(_) => 69, // EX_UNAVAILABLE
            Self::Load(_) => 71,        // EX_OSERR
            Self::Io(_) => 74,          // EX_IOERR
        }
    }
}

impl From<LoaderError> for CliError {
    fn from(err: LoaderError) -> Self {
        match err {
            LoaderError::Manifest(manifest_err) => Self::Manifest(manifest_err.to_string()),
            LoaderError::Platform(platform_err) => platform_err.into(),
            LoaderError::UnsupportedPlatform { .. } => Self::Unsupported(err.to_string()),
            LoaderError::Extraction(extract_err) => extract_err.into(),
            LoaderError::PrimaryLoadFailure { ref failure, .. } => {
                Self::Load(format!("{err}: {failure}"))
            }
            LoaderError::Resource { .. } => Self::Io(err.to_string()),
        }
    }
}

impl From<PlatformError> for CliError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::InvalidTag(_) => Self::Arguments(err.to_string()),
            PlatformError::Unsupported(_) => Self::Unsupported(err.to_string()),
        }
    }
}

impl From<ExtractError> for CliError {
    fn from(err: ExtractError) -> Self {
        Self::Io(err.to_string())
    }
}
