//! Shared argument groups.
//!
//! Every flag maps onto a [`LoaderConfig`] field; flags backed by an
//! environment variable fall back to it, then to the built-in default.

use std::path::PathBuf;

use clap::Args;

use nativelib_core::{
    DEFAULT_SYSTEM_PREFIX, DirectoryBundle, LoaderConfig, NativeLibraryLoader, PACKAGE_PREFIX_ENV,
    PLATFORM_ENV, TARGET_DIR_ENV,
};

use crate::error::CliError;

/// Where the bundled resources live and how to resolve them.
#[derive(Args, Debug, Clone)]
pub struct LibraryArgs {
    /// Directory holding one `{name}-{os}-{arch}` folder per platform
    #[arg(short = 'r', long, env = "NATIVELIB_RESOURCES")]
    pub resources: PathBuf,

    /// Library family name (e.g. "shogun")
    #[arg(short = 'n', long)]
    pub name: String,

    /// Library version, keys the extraction directory
    #[arg(long = "lib-version", default_value = "0")]
    pub lib_version: String,

    /// Use this <os>-<arch> tag instead of probing the host
    #[arg(long, env = PLATFORM_ENV)]
    pub platform: Option<String>,

    /// Extract into this directory instead of the temp directory
    #[arg(long, env = TARGET_DIR_ENV)]
    pub target_dir: Option<PathBuf>,

    /// Package-manager prefix whose lib directory is searched first
    #[arg(long, env = PACKAGE_PREFIX_ENV)]
    pub package_prefix: Option<PathBuf>,

    /// Host directory to search (repeatable; replaces the defaults)
    #[arg(long = "search-dir")]
    pub search_dirs: Vec<PathBuf>,

    /// Paths under this prefix are treated as system libraries
    #[arg(long, default_value = DEFAULT_SYSTEM_PREFIX)]
    pub system_prefix: PathBuf,

    /// Re-copy bundled libraries even if a copy exists
    #[arg(long)]
    pub force_copy: bool,

    /// Skip manifest lines without a separator instead of failing
    #[arg(long)]
    pub lenient: bool,
}

impl LibraryArgs {
    pub fn config(&self, install: bool) -> LoaderConfig {
        let defaults = LoaderConfig::default();
        LoaderConfig {
            target_dir: self.target_dir.clone(),
            package_prefix: self.package_prefix.clone(),
            platform_override: self.platform.clone(),
            install_enabled: install,
            force_copy: self.force_copy,
            search_dirs: if self.search_dirs.is_empty() {
                defaults.search_dirs
            } else {
                self.search_dirs.clone()
            },
            system_prefix: self.system_prefix.clone(),
        }
    }

    pub fn build_loader(&self, install: bool) -> Result<NativeLibraryLoader, CliError> {
        if !self.resources.is_dir() {
            return Err(CliError::NotFound(format!(
                "resource directory {} does not exist",
                self.resources.display()
            )));
        }

        let loader = NativeLibraryLoader::builder(
            self.name.clone(),
            self.lib_version.clone(),
            DirectoryBundle::new(&self.resources),
        )
        .config(self.config(install))
        .lenient_manifest(self.lenient)
        .build()?;
        Ok(loader)
    }
}

/// Arguments of the `tree` command: a manifest file, or a bundle.
#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    /// Read this manifest file directly
    #[arg(long, conflicts_with_all = ["resources", "name"])]
    pub manifest: Option<PathBuf>,

    /// Directory holding one `{name}-{os}-{arch}` folder per platform
    #[arg(short = 'r', long, requires = "name")]
    pub resources: Option<PathBuf>,

    /// Library family name (e.g. "shogun")
    #[arg(short = 'n', long, requires = "resources")]
    pub name: Option<String>,

    /// Use this <os>-<arch> tag instead of probing the host
    #[arg(long, env = PLATFORM_ENV)]
    pub platform: Option<String>,

    /// Skip manifest lines without a separator instead of failing
    #[arg(long)]
    pub lenient: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> LibraryArgs {
        LibraryArgs {
            resources: PathBuf::from("/opt/app/native"),
            name: "demo".to_string(),
            lib_version: "1.0".to_string(),
            platform: Some("linux-x86_64".to_string()),
            target_dir: Some(PathBuf::from("/tmp/nativelib")),
            package_prefix: None,
            search_dirs: Vec::new(),
            system_prefix: PathBuf::from(DEFAULT_SYSTEM_PREFIX),
            force_copy: true,
            lenient: false,
        }
    }

    #[test]
    fn config_keeps_default_search_dirs() {
        let config = args().config(true);
        assert!(config.install_enabled);
        assert!(config.force_copy);
        assert_eq!(config.search_dirs, LoaderConfig::default().search_dirs);
        assert_eq!(config.platform_override.as_deref(), Some("linux-x86_64"));
    }

    #[test]
    fn explicit_search_dirs_replace_defaults() {
        let mut args = args();
        args.search_dirs = vec![PathBuf::from("/srv/lib")];
        assert_eq!(args.config(false).search_dirs, vec![PathBuf::from("/srv/lib")]);
    }

    #[test]
    fn missing_resource_dir_is_not_found() {
        let mut args = args();
        args.resources = PathBuf::from("/nonexistent/nativelib/resources");
        let err = args.build_loader(false).err().unwrap();
        assert!(matches!(err, CliError::NotFound(_)));
    }
}
