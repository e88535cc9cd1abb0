//! Platform identification.
//!
//! Normalizes the host OS and architecture into the small vocabulary used to
//! address bundled resources (`linux-x86_64`, `osx-aarch64`, ...) and maps each
//! OS family onto its shared-library naming conventions.
//!
//! # Design
//!
//! - `Os` is a closed enumeration; every naming rule matches on it exhaustively
//! - Host probing happens once per process (`PlatformTag::current`)
//! - An explicit tag string bypasses probing entirely (`PlatformTag::resolve`)

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors raised while identifying the platform or applying its naming rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The OS has no known shared-library conventions.
    #[error("Unsupported platform: no shared library conventions for OS '{0}'")]
    Unsupported(String),

    /// A platform tag override could not be split into OS and architecture.
    #[error("Invalid platform tag '{0}': expected <os>-<arch>")]
    InvalidTag(String),
}

/// Normalized operating system family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
    /// Any other OS, keeping its lower-cased name for resource addressing.
    Unsupported(String),
}

impl Os {
    /// Normalize a raw OS name (`"Mac OS X"`, `"macos"`, `"Linux"`, ...).
    pub fn normalize(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        if lower.starts_with("mac") || lower == "osx" {
            Self::MacOs
        } else if lower == "linux" {
            Self::Linux
        } else if lower.starts_with("windows") {
            Self::Windows
        } else {
            Self::Unsupported(lower)
        }
    }

    /// Token used in platform tags and resource paths.
    pub fn token(&self) -> &str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "osx",
            Self::Windows => "windows",
            Self::Unsupported(raw) => raw,
        }
    }

    /// Shared-library file extension, without the leading dot.
    pub fn dynamic_library_extension(&self) -> Result<&'static str, PlatformError> {
        match self {
            Self::Linux => Ok("so"),
            Self::MacOs => Ok("dylib"),
            Self::Windows => Ok("dll"),
            Self::Unsupported(raw) => Err(PlatformError::Unsupported(raw.clone())),
        }
    }

    /// Conventional file name of the library called `name` (`libfoo.so`, `foo.dll`).
    pub fn canonical_file_name(&self, name: &str) -> Result<String, PlatformError> {
        let ext = self.dynamic_library_extension()?;
        Ok(match self {
            Self::Linux | Self::MacOs => format!("lib{name}.{ext}"),
            Self::Windows | Self::Unsupported(_) => format!("{name}.{ext}"),
        })
    }

    /// Bare library name used for a short-name load.
    ///
    /// Unix-like families strip the `lib` prefix and the extension
    /// (`libfoo.so.1` -> `foo`, `libfoo.1.dylib` -> `foo.1`). Names without the
    /// `lib` prefix and all other families pass through unchanged.
    pub fn bare_library_name(&self, file_name: &str) -> String {
        let Some(stem) = file_name.strip_prefix("lib") else {
            return file_name.to_string();
        };
        match self {
            Self::Linux => match stem.find(".so") {
                Some(pos) => stem[..pos].to_string(),
                None => stem.to_string(),
            },
            Self::MacOs => match stem.rfind('.') {
                Some(pos) => stem[..pos].to_string(),
                None => stem.to_string(),
            },
            Self::Windows | Self::Unsupported(_) => file_name.to_string(),
        }
    }

    /// File name handed to the dynamic linker's own search for a bare name.
    pub fn system_library_file(&self, bare: &str) -> Result<String, PlatformError> {
        match self {
            Self::Linux | Self::MacOs => self.canonical_file_name(bare),
            Self::Windows => {
                if bare.to_lowercase().ends_with(".dll") {
                    Ok(bare.to_string())
                } else {
                    self.canonical_file_name(bare)
                }
            }
            Self::Unsupported(raw) => Err(PlatformError::Unsupported(raw.clone())),
        }
    }

    /// File name requested from the linker for a short-name load of `short_name`.
    ///
    /// Names that lose nothing to [`Os::bare_library_name`] but already carry
    /// an extension (`ld-linux.so.2`, `foo.dll`) are requested as written.
    pub fn short_name_file(&self, short_name: &str) -> Result<String, PlatformError> {
        let bare = self.bare_library_name(short_name);
        if let Self::Unsupported(raw) = self {
            return Err(PlatformError::Unsupported(raw.clone()));
        }
        if bare == short_name && short_name.contains('.') {
            return Ok(short_name.to_string());
        }
        self.system_library_file(&bare)
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Normalize an architecture alias (`amd64` -> `x86_64`).
pub fn normalize_arch(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    if lower == "amd64" {
        "x86_64".to_string()
    } else {
        lower
    }
}

/// Normalized `{os, arch}` pair selecting manifests and bundled payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformTag {
    os: Os,
    arch: String,
}

impl PlatformTag {
    /// Build a tag from raw, unnormalized OS and architecture names.
    pub fn from_parts(os: &str, arch: &str) -> Self {
        Self {
            os: Os::normalize(os),
            arch: normalize_arch(arch),
        }
    }

    /// Probe the host. Prefer [`PlatformTag::current`], which caches the result.
    pub fn detect() -> Self {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// The host platform, probed on first use and cached for the process.
    pub fn current() -> &'static Self {
        static CURRENT: OnceLock<PlatformTag> = OnceLock::new();
        CURRENT.get_or_init(Self::detect)
    }

    /// Use `override_tag` when given, otherwise the cached host platform.
    pub fn resolve(override_tag: Option<&str>) -> Result<Self, PlatformError> {
        match override_tag {
            Some(tag) => tag.parse(),
            None => Ok(Self::current().clone()),
        }
    }

    pub fn os(&self) -> &Os {
        &self.os
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn dynamic_library_extension(&self) -> Result<&'static str, PlatformError> {
        self.os.dynamic_library_extension()
    }
}

impl FromStr for PlatformTag {
    type Err = PlatformError;

    /// Parse `<os>-<arch>`; both halves are normalized.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('-') {
            Some((os, arch)) if !os.is_empty() && !arch.is_empty() => {
                Ok(Self::from_parts(os, arch))
            }
            _ => Err(PlatformError::InvalidTag(s.to_string())),
        }
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

impl Serialize for PlatformTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amd64_normalizes_to_x86_64() {
        assert_eq!(normalize_arch("amd64"), "x86_64");
        assert_eq!(normalize_arch("AArch64"), "aarch64");
    }

    #[test]
    fn mac_prefixed_names_normalize_to_osx() {
        assert_eq!(Os::normalize("Mac OS X"), Os::MacOs);
        assert_eq!(Os::normalize("macos"), Os::MacOs);
        assert_eq!(Os::MacOs.token(), "osx");
    }

    #[test]
    fn unknown_os_passes_through_lower_cased() {
        let os = Os::normalize("FreeBSD");
        assert_eq!(os, Os::Unsupported("freebsd".to_string()));
        assert_eq!(os.token(), "freebsd");
        assert!(matches!(
            os.dynamic_library_extension(),
            Err(PlatformError::Unsupported(name)) if name == "freebsd"
        ));
    }

    #[test]
    fn extension_per_family() {
        assert_eq!(Os::Linux.dynamic_library_extension().unwrap(), "so");
        assert_eq!(Os::MacOs.dynamic_library_extension().unwrap(), "dylib");
        assert_eq!(Os::Windows.dynamic_library_extension().unwrap(), "dll");
    }

    #[test]
    fn tag_round_trips_through_display() {
        let tag = PlatformTag::from_parts("Linux", "amd64");
        assert_eq!(tag.to_string(), "linux-x86_64");
        assert_eq!("linux-x86_64".parse::<PlatformTag>().unwrap(), tag);
    }

    #[test]
    fn invalid_tag_is_rejected() {
        assert!(matches!(
            "linux".parse::<PlatformTag>(),
            Err(PlatformError::InvalidTag(_))
        ));
        assert!("-x86_64".parse::<PlatformTag>().is_err());
    }

    #[test]
    fn override_bypasses_probing() {
        let tag = PlatformTag::resolve(Some("osx-aarch64")).unwrap();
        assert_eq!(tag.os(), &Os::MacOs);
        assert_eq!(tag.arch(), "aarch64");
    }

    #[test]
    fn current_is_memoized() {
        assert!(std::ptr::eq(PlatformTag::current(), PlatformTag::current()));
        assert_eq!(PlatformTag::resolve(None).unwrap(), *PlatformTag::current());
    }

    #[test]
    fn bare_names_follow_family_rules() {
        assert_eq!(Os::Linux.bare_library_name("libfoo.so"), "foo");
        assert_eq!(Os::Linux.bare_library_name("libfoo.so.19"), "foo");
        assert_eq!(Os::MacOs.bare_library_name("libfoo.1.dylib"), "foo.1");
        assert_eq!(Os::Linux.bare_library_name("ld-linux.so.2"), "ld-linux.so.2");
        assert_eq!(Os::Windows.bare_library_name("libfoo.dll"), "libfoo.dll");
    }

    #[test]
    fn system_file_names() {
        assert_eq!(Os::Linux.system_library_file("foo").unwrap(), "libfoo.so");
        assert_eq!(Os::MacOs.system_library_file("foo").unwrap(), "libfoo.dylib");
        assert_eq!(Os::Windows.system_library_file("foo.dll").unwrap(), "foo.dll");
        assert_eq!(Os::Windows.system_library_file("foo").unwrap(), "foo.dll");
        assert!(Os::Unsupported("plan9".into()).system_library_file("foo").is_err());
    }

    #[test]
    fn short_name_files() {
        assert_eq!(Os::Linux.short_name_file("libfoo.so.19").unwrap(), "libfoo.so");
        assert_eq!(Os::Linux.short_name_file("ld-linux.so.2").unwrap(), "ld-linux.so.2");
        assert_eq!(Os::MacOs.short_name_file("libfoo.dylib").unwrap(), "libfoo.dylib");
        assert_eq!(Os::Windows.short_name_file("foo").unwrap(), "foo.dll");
        assert_eq!(Os::Windows.short_name_file("foo.dll").unwrap(), "foo.dll");
        assert!(Os::Unsupported("plan9".into()).short_name_file("libfoo.so").is_err());
    }
}
