//! Host presence checks.
//!
//! A library counts as installed when its manifest path (or a path resolved
//! earlier) is a regular file, or when a depth-first search of the host library
//! directories finds a file whose name ends with the expected file name.
//! Host copies win over bundled ones so package-manager upgrades are honored.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::manifest::DependencyTreeNode;

/// Outcome of a presence check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum LocateResult {
    /// The resolved path or the manifest path exists.
    AtHint(PathBuf),
    /// Found by searching the host directories.
    Found(PathBuf),
    NotFound,
}

impl LocateResult {
    pub const fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::AtHint(path) | Self::Found(path) => Some(path),
            Self::NotFound => None,
        }
    }
}

/// Searches an ordered list of host directories for one file name.
#[derive(Debug, Clone)]
pub struct LibraryLocator {
    search_dirs: Vec<PathBuf>,
    file_suffix: String,
}

impl LibraryLocator {
    pub fn new(search_dirs: Vec<PathBuf>, file_suffix: impl Into<String>) -> Self {
        Self {
            search_dirs,
            file_suffix: file_suffix.into(),
        }
    }

    pub fn file_suffix(&self) -> &str {
        &self.file_suffix
    }

    /// Check `node`, preferring `resolved` over the manifest path.
    pub fn locate(&self, node: &DependencyTreeNode, resolved: Option<&Path>) -> LocateResult {
        let hint = Path::new(node.path_hint());
        let candidates = resolved.into_iter().chain(Some(hint));
        for candidate in candidates {
            if !candidate.as_os_str().is_empty() && candidate.is_file() {
                return LocateResult::AtHint(candidate.to_path_buf());
            }
        }

        match self.find_file() {
            Some(path) => {
                info!(
                    library = %node.short_name(),
                    path = %path.display(),
                    "Using host library"
                );
                LocateResult::Found(path)
            }
            None => LocateResult::NotFound,
        }
    }

    /// First matching file across all search directories.
    pub fn find_file(&self) -> Option<PathBuf> {
        self.search_dirs.iter().find_map(|dir| {
            debug!(dir = %dir.display(), suffix = %self.file_suffix, "Searching for library");
            self.find_in(dir, true)
        })
    }

    /// Symbolic links are followed only for the search roots themselves.
    fn find_in(&self, path: &Path, follow_links: bool) -> Option<PathBuf> {
        let metadata = if follow_links {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        };
        let metadata = match metadata {
            Ok(metadata) => metadata,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Skipping unreadable path");
                return None;
            }
        };

        if metadata.is_dir() {
            let entries = match fs::read_dir(path) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "Skipping unreadable directory");
                    return None;
                }
            };
            // Sorted so repeated searches pick the same file.
            let mut children: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .collect();
            children.sort();
            children.iter().find_map(|child| self.find_in(child, false))
        } else if self.matches(path) && path.is_file() {
            Some(path.to_path_buf())
        } else {
            None
        }
    }

    fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(&self.file_suffix))
    }
}
