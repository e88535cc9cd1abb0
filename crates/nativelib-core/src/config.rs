//! Loader configuration.
//!
//! Resolution order for every overridable location:
//! 1. Explicit value set on [`LoaderConfig`] (CLI flag or builder)
//! 2. Environment variable
//! 3. Built-in default

use std::env;
use std::path::{Path, PathBuf};

/// Overrides the directory bundled libraries are extracted into.
pub const TARGET_DIR_ENV: &str = "DYNAMIC_LIBRARY_PATH";

/// Package-manager prefix whose `lib` directory is searched first.
pub const PACKAGE_PREFIX_ENV: &str = "CONDA_PREFIX";

/// Forces the platform tag instead of probing the host.
pub const PLATFORM_ENV: &str = "NATIVELIB_PLATFORM";

/// Paths under this prefix belong to the system, not to the application.
pub const DEFAULT_SYSTEM_PREFIX: &str = "/usr";

/// Settings shared by every stage of resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Root for extracted copies. `None` means the process temp directory.
    pub target_dir: Option<PathBuf>,
    /// Package-manager prefix (e.g. a conda environment).
    pub package_prefix: Option<PathBuf>,
    /// `<os>-<arch>` tag used instead of the probed host platform.
    pub platform_override: Option<String>,
    /// Extract bundled copies when the primary library is missing on the host.
    pub install_enabled: bool,
    /// Re-copy bundled payloads even when a usable copy exists.
    pub force_copy: bool,
    /// Host directories searched, in order, after the package prefix.
    pub search_dirs: Vec<PathBuf>,
    pub system_prefix: PathBuf,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            target_dir: None,
            package_prefix: None,
            platform_override: None,
            install_enabled: false,
            force_copy: false,
            search_dirs: default_search_dirs(),
            system_prefix: PathBuf::from(DEFAULT_SYSTEM_PREFIX),
        }
    }
}

impl LoaderConfig {
    /// Defaults overlaid with the environment.
    pub fn from_env() -> Self {
        Self {
            target_dir: env_path(TARGET_DIR_ENV),
            package_prefix: env_path(PACKAGE_PREFIX_ENV),
            platform_override: env_value(PLATFORM_ENV),
            ..Self::default()
        }
    }

    /// Directory that holds the `{name}-{version}` extraction folders.
    pub fn target_root(&self) -> PathBuf {
        self.target_dir.clone().unwrap_or_else(env::temp_dir)
    }

    /// Directories to search for an installed library, in priority order.
    pub fn host_search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::with_capacity(self.search_dirs.len() + 1);
        if let Some(prefix) = &self.package_prefix {
            dirs.push(prefix.join("lib"));
        }
        dirs.extend(self.search_dirs.iter().cloned());
        dirs
    }

    /// True when `path` lives under the system prefix.
    pub fn is_system_path(&self, path: &str) -> bool {
        !path.is_empty() && Path::new(path).starts_with(&self.system_prefix)
    }
}

fn default_search_dirs() -> Vec<PathBuf> {
    if cfg!(unix) {
        ["/usr/local/opt", "/usr/local/lib", "/usr/lib", "/usr"]
            .into_iter()
            .map(PathBuf::from)
            .collect()
    } else {
        Vec::new()
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_value(key).map(PathBuf::from)
}
