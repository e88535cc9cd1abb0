//! Aggregate error type for the loader.

use std::io;

use thiserror::Error;

use crate::extract::ExtractError;
use crate::loader::NodeLoadFailure;
use crate::manifest::ManifestError;
use crate::platform::PlatformError;

/// Errors surfaced by [`NativeLibraryLoader`](crate::NativeLibraryLoader).
///
/// Failures of individual load attempts never appear here on their own; they
/// are collected per node and only become an error when the primary library
/// cannot be loaded at all.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// No manifest is bundled for the platform.
    #[error("Unsupported platform {platform}: no bundled manifest at {resource}")]
    UnsupportedPlatform { platform: String, resource: String },

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    /// Every strategy failed for the primary library.
    ///
    /// `extraction_error` holds the reason its bundled copy could not be
    /// extracted, when installation was attempted and failed.
    #[error("Failed to load primary library {library}{}", extraction_note(.extraction_error))]
    PrimaryLoadFailure {
        library: String,
        #[source]
        failure: NodeLoadFailure,
        extraction_error: Option<String>,
    },

    #[error("Failed to read bundled resource {resource}: {source}")]
    Resource {
        resource: String,
        #[source]
        source: io::Error,
    },
}

#[allow(clippy::ref_option)]
fn extraction_note(extraction_error: &Option<String>) -> String {
    extraction_error
        .as_ref()
        .map(|err| format!(" (extraction failed: {err})"))
        .unwrap_or_default()
}

pub type LoaderResult<T> = Result<T, LoaderError>;
