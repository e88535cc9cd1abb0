//! Extraction of bundled libraries into a private, versioned directory.
//!
//! Layout: `{target_root}/{library}-{version}/{resource}`. A copy happens only
//! when forced, or when the target is missing or empty, so repeated loads in
//! one process (and concurrent processes) reuse the first good copy.
//!
//! Payloads are streamed into a temporary file next to the target and renamed
//! into place, so an interrupted copy never leaves a truncated library behind.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::bundle::{ResourceBundle, resource_path};

/// Errors raised while extracting a bundled payload.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The bundle reported the payload but could not read it.
    #[error("Failed to read bundled resource {resource}: {source}")]
    Read {
        resource: String,
        #[source]
        source: io::Error,
    },

    /// Writing the extracted copy failed.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The copy finished but the target is still missing or empty.
    #[error("Extracted file {path} is missing or empty")]
    Unusable { path: PathBuf },
}

/// What [`ResourceExtractor::ensure_extracted`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The payload was copied to the path.
    Copied(PathBuf),
    /// A usable copy already existed at the path.
    Reused(PathBuf),
    /// The bundle does not carry this resource.
    NotBundled,
}

impl Extraction {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Copied(path) | Self::Reused(path) => Some(path),
            Self::NotBundled => None,
        }
    }
}

/// Copies payloads from a [`ResourceBundle`] into the extraction directory.
pub struct ResourceExtractor<'a> {
    bundle: &'a dyn ResourceBundle,
    target_root: PathBuf,
    library_name: &'a str,
    version: &'a str,
}

impl<'a> ResourceExtractor<'a> {
    pub fn new(
        bundle: &'a dyn ResourceBundle,
        target_root: impl Into<PathBuf>,
        library_name: &'a str,
        version: &'a str,
    ) -> Self {
        Self {
            bundle,
            target_root: target_root.into(),
            library_name,
            version,
        }
    }

    /// `{target_root}/{library}-{version}`
    pub fn target_dir(&self) -> PathBuf {
        self.target_root
            .join(format!("{}-{}", self.library_name, self.version))
    }

    /// Where `resource` is (or would be) extracted.
    pub fn target_path(&self, resource: &str) -> PathBuf {
        self.target_dir().join(resource.trim())
    }

    /// Make sure a usable copy of `{platform_name}/{resource}` exists on disk.
    pub fn ensure_extracted(
        &self,
        platform_name: &str,
        resource: &str,
        force_copy: bool,
    ) -> Result<Extraction, ExtractError> {
        let bundled = resource_path(platform_name, resource);
        let payload = self
            .bundle
            .open(&bundled)
            .map_err(|source| ExtractError::Read {
                resource: bundled.clone(),
                source,
            })?;
        let Some(mut payload) = payload else {
            debug!(resource = %bundled, "Resource is not bundled");
            return Ok(Extraction::NotBundled);
        };

        let target = self.target_path(resource);
        let copied = force_copy || !is_usable(&target);
        if copied {
            copy_payload(&mut payload, &target, &bundled)?;
            info!(resource = %bundled, path = %target.display(), "Extracted bundled library");
        }

        if !is_usable(&target) {
            return Err(ExtractError::Unusable { path: target });
        }

        Ok(if copied {
            Extraction::Copied(target)
        } else {
            Extraction::Reused(target)
        })
    }
}

/// A target is usable when it is a non-empty regular file.
fn is_usable(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|metadata| metadata.is_file() && metadata.len() > 0)
}

fn copy_payload(payload: &mut dyn Read, target: &Path, resource: &str) -> Result<(), ExtractError> {
    let write_error = |source: io::Error| ExtractError::Write {
        path: target.to_path_buf(),
        source,
    };

    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(write_error)?;

    let mut staged = NamedTempFile::new_in(dir).map_err(write_error)?;
    io::copy(payload, staged.as_file_mut()).map_err(|source| ExtractError::Read {
        resource: resource.to_string(),
        source,
    })?;
    staged.as_file().sync_all().map_err(write_error)?;
    set_owner_read_write(staged.path()).map_err(write_error)?;
    staged
        .persist(target)
        .map_err(|err| write_error(err.error))?;
    Ok(())
}

#[cfg(unix)]
fn set_owner_read_write(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o600);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn set_owner_read_write(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(false);
    fs::set_permissions(path, perms)
}
