//! Dynamic linker port.
//!
//! The loader never talks to `dlopen`/`LoadLibrary` directly; it goes through
//! [`DynamicLinker`] so resolution can be exercised without native payloads.
//! [`SystemLinker`] is the production adapter built on `libloading`.
//!
//! Loading is process-global and irreversible: every handle the system linker
//! opens is parked in a process-wide registry and never closed.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};

use libloading::Library;
use thiserror::Error;

/// A single rejected load request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct LinkerError(String);

impl LinkerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Port to the platform's dynamic linker.
#[cfg_attr(test, mockall::automock)]
pub trait DynamicLinker {
    /// Load the library at an explicit path.
    fn load_path(&mut self, path: &Path) -> Result<(), LinkerError>;

    /// Load a library file name through the linker's own search path.
    fn load_name(&mut self, file_name: &str) -> Result<(), LinkerError>;
}

/// Loads libraries into the current process with `libloading`.
///
/// On Unix the libraries are opened with `RTLD_NOW | RTLD_GLOBAL` so symbols
/// of a dependency loaded first are visible to the dependents loaded after it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLinker;

impl SystemLinker {
    pub const fn new() -> Self {
        Self
    }

    /// Number of handles opened by this process so far.
    pub fn loaded_count() -> usize {
        registry()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl DynamicLinker for SystemLinker {
    fn load_path(&mut self, path: &Path) -> Result<(), LinkerError> {
        retain(open(path.as_os_str())?);
        Ok(())
    }

    fn load_name(&mut self, file_name: &str) -> Result<(), LinkerError> {
        retain(open(OsStr::new(file_name))?);
        Ok(())
    }
}

fn registry() -> &'static Mutex<Vec<Library>> {
    static LOADED: OnceLock<Mutex<Vec<Library>>> = OnceLock::new();
    LOADED.get_or_init(|| Mutex::new(Vec::new()))
}

fn retain(library: Library) {
    registry()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(library);
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn open(target: &OsStr) -> Result<Library, LinkerError> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};

    // SAFETY: running a library's initializers is the purpose of this call.
    // Which libraries may be loaded is decided by the bundled manifest.
    let library = unsafe { UnixLibrary::open(Some(target), RTLD_NOW | RTLD_GLOBAL) };
    library
        .map(Library::from)
        .map_err(|err| LinkerError::new(err.to_string()))
}

#[cfg(not(unix))]
#[allow(unsafe_code)]
fn open(target: &OsStr) -> Result<Library, LinkerError> {
    // SAFETY: see the Unix variant.
    let library = unsafe { Library::new(target) };
    library.map_err(|err| LinkerError::new(err.to_string()))
}
