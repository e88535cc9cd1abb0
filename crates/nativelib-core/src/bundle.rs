//! Bundled resource access.
//!
//! Resources are addressed as `{platform}/{resource}`, where `platform` is the
//! platform-specific name (`shogun-linux-x86_64`) and `resource` is either the
//! manifest (`lddtree.txt`) or a library file name.
//!
//! How the payloads get into the application is not our concern: the core
//! only sees the [`ResourceBundle`] trait. Two adapters ship with it:
//! - [`DirectoryBundle`] reads from a resource root on disk
//! - [`StaticBundle`] serves byte slices compiled into the binary

use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

/// Address of `resource` inside the bundle for `platform_name`.
pub fn resource_path(platform_name: &str, resource: &str) -> String {
    format!("{}/{}", platform_name.trim(), resource.trim())
}

/// Read access to payloads bundled with the application.
pub trait ResourceBundle: Send + Sync {
    /// Open the payload at `path`. `Ok(None)` means it is not bundled.
    fn open(&self, path: &str) -> io::Result<Option<Box<dyn Read + '_>>>;

    /// Read a bundled text resource.
    fn read_to_string(&self, path: &str) -> io::Result<Option<String>> {
        let Some(mut reader) = self.open(path)? else {
            return Ok(None);
        };
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Some(text))
    }
}

/// Resources stored below a directory, one sub-directory per platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryBundle {
    root: PathBuf,
}

impl DirectoryBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a resource path onto the root, refusing anything that escapes it.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
            .then(|| self.root.join(relative))
    }
}

impl ResourceBundle for DirectoryBundle {
    fn open(&self, path: &str) -> io::Result<Option<Box<dyn Read + '_>>> {
        let Some(file_path) = self.resolve(path) else {
            return Ok(None);
        };
        if !file_path.is_file() {
            return Ok(None);
        }
        match File::open(&file_path) {
            Ok(file) => Ok(Some(Box::new(file))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Resources compiled into the binary, e.g. with `include_bytes!`.
///
/// ```ignore
/// static RESOURCES: &[(&str, &[u8])] = &[
///     ("shogun-linux-x86_64/lddtree.txt", include_bytes!("../native/linux/lddtree.txt")),
///     ("shogun-linux-x86_64/libshogun.so", include_bytes!("../native/linux/libshogun.so")),
/// ];
/// let bundle = StaticBundle::new(RESOURCES);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StaticBundle {
    entries: &'static [(&'static str, &'static [u8])],
}

impl StaticBundle {
    pub const fn new(entries: &'static [(&'static str, &'static [u8])]) -> Self {
        Self { entries }
    }
}

impl ResourceBundle for StaticBundle {
    fn open(&self, path: &str) -> io::Result<Option<Box<dyn Read + '_>>> {
        let path = path.trim_start_matches('/');
        Ok(self
            .entries
            .iter()
            .find(|(name, _)| *name == path)
            .map(|(_, bytes)| Box::new(*bytes) as Box<dyn Read>))
    }
}
