//! The loader facade.
//!
//! A [`NativeLibraryLoader`] is built once per library family and version. It
//! reads the bundled manifest for the resolved platform, then loads the
//! primary library (fatal on failure) or the whole tree (best effort).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::attempt::{AttemptPlan, LoadedLibrary, NodeLoadFailure};
use super::state::{LoadState, NodeResolution, ResolutionTable};
use crate::bundle::{ResourceBundle, resource_path};
use crate::config::LoaderConfig;
use crate::error::{LoaderError, LoaderResult};
use crate::extract::{ExtractError, Extraction, ResourceExtractor};
use crate::linker::{DynamicLinker, SystemLinker};
use crate::locate::{LibraryLocator, LocateResult};
use crate::manifest::{DependencyTree, MANIFEST_RESOURCE, ManifestError, ManifestParser, NodeId};
use crate::platform::{PlatformError, PlatformTag};

/// A library that was loaded by [`NativeLibraryLoader::load_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedNode {
    pub library: String,
    #[serde(flatten)]
    pub outcome: LoadedLibrary,
}

/// A library that could not be loaded by [`NativeLibraryLoader::load_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedNode {
    pub library: String,
    pub failure: NodeLoadFailure,
}

/// Outcome of a best-effort load of the whole tree, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub loaded: Vec<LoadedNode>,
    pub failed: Vec<FailedNode>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Resolves, extracts and loads one bundled native library family.
///
/// # Example
///
/// ```rust,ignore
/// let bundle = DirectoryBundle::new("resources/native");
/// let mut loader = NativeLibraryLoader::builder("shogun", "6.1.3", bundle)
///     .install(true)
///     .build()?;
/// loader.load_primary()?;
/// ```
pub struct NativeLibraryLoader<L = SystemLinker> {
    name: String,
    version: String,
    platform: PlatformTag,
    platform_specific_name: String,
    config: LoaderConfig,
    bundle: Box<dyn ResourceBundle>,
    linker: L,
    tree: DependencyTree,
    resolution: ResolutionTable,
}

impl NativeLibraryLoader {
    /// Start a builder with default configuration and the system linker.
    pub fn builder(
        name: impl Into<String>,
        version: impl Into<String>,
        bundle: impl ResourceBundle + 'static,
    ) -> LoaderBuilder {
        LoaderBuilder {
            name: name.into(),
            version: version.into(),
            bundle: Box::new(bundle),
            config: LoaderConfig::default(),
            lenient_manifest: false,
            linker: SystemLinker::new(),
        }
    }

    /// Loader configured from the environment, with installation disabled.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        bundle: impl ResourceBundle + 'static,
    ) -> LoaderResult<Self> {
        Self::builder(name, version, bundle)
            .config(LoaderConfig::from_env())
            .build()
    }
}

impl<L: DynamicLinker> NativeLibraryLoader<L> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn platform(&self) -> &PlatformTag {
        &self.platform
    }

    /// `{name}-{os}-{arch}`, the directory holding this platform's resources.
    pub fn platform_specific_name(&self) -> &str {
        &self.platform_specific_name
    }

    pub fn dynamic_library_extension(&self) -> Result<&'static str, PlatformError> {
        self.platform.dynamic_library_extension()
    }

    pub fn dependency_tree(&self) -> &DependencyTree {
        &self.tree
    }

    pub fn resolution(&self, id: NodeId) -> Option<&NodeResolution> {
        self.resolution.get(id)
    }

    pub fn resolution_table(&self) -> &ResolutionTable {
        &self.resolution
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub const fn force_copy(&self) -> bool {
        self.config.force_copy
    }

    pub fn set_force_copy(&mut self, force_copy: bool) {
        self.config.force_copy = force_copy;
    }

    pub fn linker(&self) -> &L {
        &self.linker
    }

    /// `{target_root}/{name}-{version}`
    pub fn target_dir(&self) -> PathBuf {
        self.extractor().target_dir()
    }

    /// Look for `id` on the host.
    ///
    /// The primary library is searched by its conventional file name
    /// (`lib{name}.so`), every other node by its short name.
    pub fn locate(&self, id: NodeId) -> LoaderResult<LocateResult> {
        let Some(node) = self.tree.get(id) else {
            return Ok(LocateResult::NotFound);
        };
        let file_suffix = if Some(id) == self.tree.primary() {
            self.platform.os().canonical_file_name(&self.name)?
        } else {
            node.short_name().to_string()
        };
        let locator = LibraryLocator::new(self.config.host_search_dirs(), file_suffix);
        Ok(locator.locate(node, self.resolution.resolved_path(id)))
    }

    /// Record whether `id` is present on the host.
    pub fn check_installed(&mut self, id: NodeId) -> LoaderResult<bool> {
        self.resolution.transition(id, LoadState::CheckInstalled);
        match self.locate(id)? {
            LocateResult::AtHint(path) | LocateResult::Found(path) => {
                self.resolution
                    .update(id, |entry| entry.resolved_path = Some(path));
                self.resolution.transition(id, LoadState::Installed);
                Ok(true)
            }
            LocateResult::NotFound => {
                warn!(library = %self.tree[id].short_name(), "Library not found on host");
                self.resolution.transition(id, LoadState::Missing);
                Ok(false)
            }
        }
    }

    /// Copy the bundled payload for `id` into the extraction directory.
    ///
    /// The outcome is also recorded in the resolution table; a failure here
    /// never stops the other nodes from being processed.
    pub fn extract_node(&mut self, id: NodeId) -> Result<Extraction, ExtractError> {
        let resource = self.tree[id].short_name().to_string();
        self.resolution.transition(id, LoadState::Extracting);

        let outcome = self.extract_resource(&resource);

        match &outcome {
            Ok(Extraction::Copied(path) | Extraction::Reused(path)) => {
                let path = path.clone();
                self.resolution
                    .update(id, |entry| entry.extracted_path = Some(path));
                self.resolution.transition(id, LoadState::Extracted);
            }
            Ok(Extraction::NotBundled) => {
                debug!(library = %resource, "No bundled copy to extract");
                self.resolution.update(id, |entry| {
                    entry.extraction_error = Some("resource is not bundled".to_string());
                });
                self.resolution.transition(id, LoadState::ExtractFailed);
            }
            Err(err) => {
                warn!(library = %resource, error = %err, "Extraction failed");
                let message = err.to_string();
                self.resolution
                    .update(id, |entry| entry.extraction_error = Some(message));
                self.resolution.transition(id, LoadState::ExtractFailed);
            }
        }
        outcome
    }

    /// Copy any bundled resource of this platform into the extraction directory.
    pub fn extract_resource(&self, resource: &str) -> Result<Extraction, ExtractError> {
        self.extractor().ensure_extracted(
            &self.platform_specific_name,
            resource,
            self.config.force_copy,
        )
    }

    /// Load the primary library, extracting bundled copies if it is missing.
    pub fn load(&mut self) -> LoaderResult<LoadedLibrary> {
        self.load_with(true)
    }

    /// Load the primary library using the configured install flag.
    pub fn load_primary(&mut self) -> LoaderResult<LoadedLibrary> {
        self.load_with(self.config.install_enabled)
    }

    /// Load the primary library.
    ///
    /// When it is missing on the host and `install` is set, every node under
    /// the system prefix is extracted first so the extracted strategy can
    /// find both the primary and its system dependencies.
    pub fn load_with(&mut self, install: bool) -> LoaderResult<LoadedLibrary> {
        let primary = self.tree.primary().ok_or(ManifestError::Empty)?;

        if !self.check_installed(primary)? && install {
            for id in self.tree.libraries() {
                if self.config.is_system_path(self.tree[id].path_hint()) {
                    // Recorded in the resolution table.
                    let _ = self.extract_node(id);
                }
            }
        }

        self.load_one(primary)
            .map_err(|failure| LoaderError::PrimaryLoadFailure {
                library: self.tree[primary].short_name().to_string(),
                failure,
                extraction_error: self
                    .resolution
                    .get(primary)
                    .and_then(|entry| entry.extraction_error.clone()),
            })
    }

    /// Load every library, dependencies before their dependents.
    ///
    /// Never fails: each node's outcome lands in the returned report.
    pub fn load_all(&mut self) -> LoadReport {
        let mut report = LoadReport::default();

        for id in self.tree.post_order() {
            if self.config.install_enabled {
                self.install_if_missing(id);
            }

            let library = self.tree[id].short_name().to_string();
            match self.load_one(id) {
                Ok(outcome) => report.loaded.push(LoadedNode { library, outcome }),
                Err(failure) => report.failed.push(FailedNode { library, failure }),
            }
        }

        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "Finished loading dependency tree"
        );
        report
    }

    /// Try the load strategies for one node and return the outcome.
    pub fn load_one(&mut self, id: NodeId) -> Result<LoadedLibrary, NodeLoadFailure> {
        let Some(node) = self.tree.get(id).filter(|node| !node.is_root()) else {
            return Err(NodeLoadFailure::default());
        };

        self.resolution.transition(id, LoadState::LoadAttempt);
        info!(library = %node.short_name(), "Loading library");

        let path = self
            .resolution
            .resolved_path(id)
            .map_or_else(|| PathBuf::from(node.path_hint()), Path::to_path_buf);
        let extracted = self
            .config
            .is_system_path(node.path_hint())
            .then(|| self.extracted_path(id));

        let plan = AttemptPlan {
            node,
            path: &path,
            extracted,
            os: self.platform.os(),
        };
        let outcome = plan.run(&mut self.linker);

        match &outcome {
            Ok(loaded) => {
                info!(
                    library = %node.short_name(),
                    strategy = %loaded.strategy,
                    target = %loaded.target,
                    "Loaded library"
                );
                self.resolution.transition(id, LoadState::Loaded);
            }
            Err(failure) => {
                warn!(library = %node.short_name(), error = %failure, "Failed to load library");
                let failure = failure.clone();
                self.resolution
                    .update(id, |entry| entry.failure = Some(failure));
                self.resolution.transition(id, LoadState::LoadFailed);
            }
        }
        outcome
    }

    fn install_if_missing(&mut self, id: NodeId) {
        match self.check_installed(id) {
            Ok(true) => {}
            Ok(false) => {
                if self.config.is_system_path(self.tree[id].path_hint()) {
                    let _ = self.extract_node(id);
                }
            }
            Err(err) => {
                debug!(library = %self.tree[id].short_name(), error = %err, "Presence check failed");
            }
        }
    }

    /// Where the extracted copy of `id` lives, whether or not it exists yet.
    fn extracted_path(&self, id: NodeId) -> PathBuf {
        self.resolution
            .get(id)
            .and_then(|entry| entry.extracted_path.clone())
            .unwrap_or_else(|| self.extractor().target_path(self.tree[id].short_name()))
    }

    fn extractor(&self) -> ResourceExtractor<'_> {
        ResourceExtractor::new(
            self.bundle.as_ref(),
            self.config.target_root(),
            &self.name,
            &self.version,
        )
    }
}

impl<L> fmt::Display for NativeLibraryLoader<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.platform_specific_name)
    }
}

/// Builder for [`NativeLibraryLoader`].
pub struct LoaderBuilder<L = SystemLinker> {
    name: String,
    version: String,
    bundle: Box<dyn ResourceBundle>,
    config: LoaderConfig,
    lenient_manifest: bool,
    linker: L,
}

impl<L: DynamicLinker> LoaderBuilder<L> {
    /// Replace the whole configuration.
    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Extract bundled copies when the primary library is missing.
    pub fn install(mut self, enabled: bool) -> Self {
        self.config.install_enabled = enabled;
        self
    }

    pub fn force_copy(mut self, enabled: bool) -> Self {
        self.config.force_copy = enabled;
        self
    }

    /// Use `tag` (`<os>-<arch>`) instead of the host platform.
    pub fn platform(mut self, tag: impl Into<String>) -> Self {
        self.config.platform_override = Some(tag.into());
        self
    }

    pub fn target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.target_dir = Some(dir.into());
        self
    }

    /// Skip manifest lines without a separator instead of rejecting them.
    pub fn lenient_manifest(mut self, lenient: bool) -> Self {
        self.lenient_manifest = lenient;
        self
    }

    /// Swap the dynamic linker.
    pub fn linker<M: DynamicLinker>(self, linker: M) -> LoaderBuilder<M> {
        LoaderBuilder {
            name: self.name,
            version: self.version,
            bundle: self.bundle,
            config: self.config,
            lenient_manifest: self.lenient_manifest,
            linker,
        }
    }

    /// Resolve the platform and parse its bundled manifest.
    pub fn build(self) -> LoaderResult<NativeLibraryLoader<L>> {
        let platform = PlatformTag::resolve(self.config.platform_override.as_deref())?;
        let platform_specific_name = format!("{}-{platform}", self.name);
        let manifest = resource_path(&platform_specific_name, MANIFEST_RESOURCE);

        let text = self
            .bundle
            .read_to_string(&manifest)
            .map_err(|source| LoaderError::Resource {
                resource: manifest.clone(),
                source,
            })?
            .ok_or_else(|| LoaderError::UnsupportedPlatform {
                platform: platform.to_string(),
                resource: manifest.clone(),
            })?;

        let parser = if self.lenient_manifest {
            ManifestParser::lenient()
        } else {
            ManifestParser::new()
        };
        let tree = parser.parse_str(&text)?;
        debug!(
            manifest = %manifest,
            libraries = tree.libraries().len(),
            "Parsed dependency manifest"
        );

        Ok(NativeLibraryLoader {
            resolution: ResolutionTable::new(tree.len()),
            name: self.name,
            version: self.version,
            platform,
            platform_specific_name,
            config: self.config,
            bundle: self.bundle,
            linker: self.linker,
            tree,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{DirectoryBundle, StaticBundle};
    use crate::linker::{LinkerError, MockDynamicLinker};
    use crate::loader::{AttemptFailureReason, LoadStrategy};
    use mockall::Sequence;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const PLATFORM: &str = "linux-x86_64";

    static MISSING_HOST: &[(&str, &[u8])] = &[(
        "demo-linux-x86_64/lddtree.txt",
        b"libdemo.so => /opt/nativelib-test/libdemo.so\n    libdep.so => /opt/nativelib-test/libdep.so (*)\n",
    )];

    fn isolated_config(target: &Path) -> LoaderConfig {
        LoaderConfig {
            target_dir: Some(target.to_path_buf()),
            search_dirs: Vec::new(),
            ..LoaderConfig::default()
        }
    }

    fn system_bundle() -> (TempDir, DirectoryBundle) {
        let dir = tempdir().unwrap();
        let platform_dir = dir.path().join("demo-linux-x86_64");
        fs::create_dir_all(&platform_dir).unwrap();
        fs::write(
            platform_dir.join("lddtree.txt"),
            "libdemo.so => /usr/lib/nativelib-test/libdemo.so\n    libdep.so => /usr/lib/nativelib-test/libdep.so\n",
        )
        .unwrap();
        fs::write(platform_dir.join("libdemo.so"), b"demo-payload").unwrap();
        fs::write(platform_dir.join("libdep.so"), b"dep-payload").unwrap();
        let bundle = DirectoryBundle::new(dir.path());
        (dir, bundle)
    }

    #[test]
    fn build_reads_platform_manifest() {
        let loader = NativeLibraryLoader::builder("demo", "1.0", StaticBundle::new(MISSING_HOST))
            .platform(PLATFORM)
            .linker(MockDynamicLinker::new())
            .build()
            .unwrap();

        assert_eq!(loader.platform_specific_name(), "demo-linux-x86_64");
        assert_eq!(loader.to_string(), "demo-linux-x86_64");
        assert_eq!(loader.dynamic_library_extension().unwrap(), "so");
        assert_eq!(loader.dependency_tree().libraries().len(), 2);
        assert!(!loader.config().install_enabled);
    }

    #[test]
    fn missing_manifest_is_unsupported_platform() {
        let result = NativeLibraryLoader::builder("demo", "1.0", StaticBundle::new(MISSING_HOST))
            .platform("windows-x86_64")
            .build();

        assert!(matches!(
            result,
            Err(LoaderError::UnsupportedPlatform { ref resource, .. })
                if resource == "demo-windows-x86_64/lddtree.txt"
        ));
    }

    #[test]
    fn invalid_platform_override_is_rejected() {
        let result = NativeLibraryLoader::builder("demo", "1.0", StaticBundle::new(MISSING_HOST))
            .platform("linux")
            .build();
        assert!(matches!(
            result,
            Err(LoaderError::Platform(PlatformError::InvalidTag(_)))
        ));
    }

    #[test]
    fn malformed_manifest_fails_build() {
        static BAD: &[(&str, &[u8])] = &[("demo-linux-x86_64/lddtree.txt", b"libdemo.so\n")];
        let strict = NativeLibraryLoader::builder("demo", "1.0", StaticBundle::new(BAD))
            .platform(PLATFORM)
            .build();
        assert!(matches!(
            strict,
            Err(LoaderError::Manifest(ManifestError::Malformed { line_number: 1, .. }))
        ));

        let lenient = NativeLibraryLoader::builder("demo", "1.0", StaticBundle::new(BAD))
            .platform(PLATFORM)
            .lenient_manifest(true)
            .build()
            .unwrap();
        assert!(lenient.dependency_tree().is_empty());
    }

    #[test]
    fn empty_manifest_fails_on_load() {
        static EMPTY: &[(&str, &[u8])] = &[("demo-linux-x86_64/lddtree.txt", b"// nothing\n")];
        let target = tempdir().unwrap();
        let mut loader = NativeLibraryLoader::builder("demo", "1.0", StaticBundle::new(EMPTY))
            .config(isolated_config(target.path()))
            .platform(PLATFORM)
            .linker(MockDynamicLinker::new())
            .build()
            .unwrap();

        assert!(matches!(
            loader.load(),
            Err(LoaderError::Manifest(ManifestError::Empty))
        ));
    }

    #[test]
    fn primary_failure_is_fatal_and_carries_last_attempt() {
        let target = tempdir().unwrap();
        let mut linker = MockDynamicLinker::new();
        linker.expect_load_path().never();
        linker
            .expect_load_name()
            .withf(|name| name.to_string() == "libdemo.so")
            .times(1)
            .returning(|_| Err(LinkerError::new("libdemo.so: cannot open shared object file")));

        let mut loader = NativeLibraryLoader::builder("demo", "1.0", StaticBundle::new(MISSING_HOST))
            .config(isolated_config(target.path()))
            .platform(PLATFORM)
            .linker(linker)
            .build()
            .unwrap();

        let err = loader.load_primary().unwrap_err();
        let LoaderError::PrimaryLoadFailure { library, failure, .. } = err else {
            panic!("expected a primary load failure");
        };
        assert_eq!(library, "libdemo.so");
        let last = failure.last().unwrap();
        assert_eq!(last.strategy, LoadStrategy::ShortName);
        assert!(matches!(last.reason, AttemptFailureReason::Linker(_)));

        let primary = loader.dependency_tree().primary().unwrap();
        assert_eq!(loader.resolution_table().state(primary), LoadState::LoadFailed);
        assert!(loader.resolution(primary).unwrap().failure.is_some());
    }

    #[test]
    fn primary_failure_reports_the_linker_error_over_later_skips() {
        let host = tempdir().unwrap();
        let garbage = host.path().join("libdemo.so");
        fs::write(&garbage, b"not an elf").unwrap();
        let bundle_dir = tempdir().unwrap();
        let platform_dir = bundle_dir.path().join("demo-linux-x86_64");
        fs::create_dir_all(&platform_dir).unwrap();
        fs::write(
            platform_dir.join("lddtree.txt"),
            format!("libdemo.so => {} (*)\n", garbage.display()),
        )
        .unwrap();

        let target = tempdir().unwrap();
        let mut linker = MockDynamicLinker::new();
        linker
            .expect_load_path()
            .times(1)
            .returning(|_| Err(LinkerError::new("invalid ELF header")));
        linker.expect_load_name().never();

        let mut loader =
            NativeLibraryLoader::builder("demo", "1.0", DirectoryBundle::new(bundle_dir.path()))
                .config(isolated_config(target.path()))
                .platform(PLATFORM)
                .linker(linker)
                .build()
                .unwrap();

        let err = loader.load_primary().unwrap_err();
        let LoaderError::PrimaryLoadFailure { failure, .. } = &err else {
            panic!("expected a primary load failure");
        };
        assert_eq!(failure.last().unwrap().reason, AttemptFailureReason::ShortNameDisabled);
        assert_eq!(failure.cause().unwrap().strategy, LoadStrategy::Direct);
        assert!(failure.to_string().contains("invalid ELF header"));

        let mut chain = Vec::new();
        let mut source: Option<&dyn std::error::Error> = Some(&err);
        while let Some(current) = source {
            chain.push(current.to_string());
            source = current.source();
        }
        assert!(
            chain.iter().any(|message| message.contains("invalid ELF header")),
            "chain: {chain:?}"
        );
    }

    #[test]
    fn primary_failure_includes_extraction_error() {
        static UNBUNDLED: &[(&str, &[u8])] = &[(
            "demo-linux-x86_64/lddtree.txt",
            b"libdemo.so => /usr/lib/nativelib-test/libdemo.so\n",
        )];
        let target = tempdir().unwrap();
        let mut linker = MockDynamicLinker::new();
        linker.expect_load_path().never();
        linker
            .expect_load_name()
            .returning(|_| Err(LinkerError::new("cannot open shared object file")));

        let mut loader = NativeLibraryLoader::builder("demo", "1.0", StaticBundle::new(UNBUNDLED))
            .config(isolated_config(target.path()))
            .platform(PLATFORM)
            .linker(linker)
            .build()
            .unwrap();

        let err = loader.load().unwrap_err();
        assert!(matches!(
            &err,
            LoaderError::PrimaryLoadFailure { extraction_error: Some(message), .. }
                if message.contains("not bundled")
        ));
        assert!(err.to_string().contains("extraction failed: resource is not bundled"));
    }

    #[test]
    fn install_extracts_system_libraries_before_loading() {
        let (_bundle_dir, bundle) = system_bundle();
        let target = tempdir().unwrap();
        let mut linker = MockDynamicLinker::new();
        linker
            .expect_load_path()
            .withf(|path| path.ends_with("demo-2.0/libdemo.so"))
            .times(1)
            .returning(|_| Ok(()));
        linker.expect_load_name().never();

        let mut loader = NativeLibraryLoader::builder("demo", "2.0", bundle)
            .config(isolated_config(target.path()))
            .platform(PLATFORM)
            .linker(linker)
            .build()
            .unwrap();

        let loaded = loader.load().unwrap();
        assert_eq!(loaded.strategy, LoadStrategy::Extracted);

        let tree = loader.dependency_tree();
        let primary = tree.primary().unwrap();
        let dep = tree.find("libdep.so").unwrap();
        assert_eq!(loader.resolution_table().state(primary), LoadState::Loaded);
        assert_eq!(loader.resolution_table().state(dep), LoadState::Extracted);
        assert_eq!(
            fs::read(loader.target_dir().join("libdep.so")).unwrap(),
            b"dep-payload"
        );
    }

    #[test]
    fn load_without_install_skips_extraction() {
        let (_bundle_dir, bundle) = system_bundle();
        let target = tempdir().unwrap();
        let mut linker = MockDynamicLinker::new();
        linker.expect_load_path().never();
        linker
            .expect_load_name()
            .returning(|_| Err(LinkerError::new("not found")));

        let mut loader = NativeLibraryLoader::builder("demo", "2.0", bundle)
            .config(isolated_config(target.path()))
            .platform(PLATFORM)
            .linker(linker)
            .build()
            .unwrap();

        assert!(loader.load_with(false).is_err());
        assert!(!loader.target_dir().exists());
    }

    #[test]
    fn load_all_loads_dependencies_first() {
        let (_bundle_dir, bundle) = system_bundle();
        let target = tempdir().unwrap();
        let mut seq = Sequence::new();
        let mut linker = MockDynamicLinker::new();
        linker
            .expect_load_path()
            .withf(|path| path.ends_with("libdep.so"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        linker
            .expect_load_path()
            .withf(|path| path.ends_with("libdemo.so"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut loader = NativeLibraryLoader::builder("demo", "2.0", bundle)
            .config(isolated_config(target.path()))
            .platform(PLATFORM)
            .install(true)
            .linker(linker)
            .build()
            .unwrap();

        let report = loader.load_all();
        assert!(report.is_complete());
        let order: Vec<_> = report.loaded.iter().map(|node| node.library.as_str()).collect();
        assert_eq!(order, vec!["libdep.so", "libdemo.so"]);
    }

    #[test]
    fn load_all_never_raises() {
        let target = tempdir().unwrap();
        let mut linker = MockDynamicLinker::new();
        linker
            .expect_load_name()
            .returning(|_| Err(LinkerError::new("not found")));

        let mut loader = NativeLibraryLoader::builder("demo", "1.0", StaticBundle::new(MISSING_HOST))
            .config(isolated_config(target.path()))
            .platform(PLATFORM)
            .linker(linker)
            .build()
            .unwrap();

        let report = loader.load_all();
        assert!(report.loaded.is_empty());
        let failed: Vec<_> = report.failed.iter().map(|node| node.library.as_str()).collect();
        assert_eq!(failed, vec!["libdep.so", "libdemo.so"]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failed"][0]["library"], "libdep.so");
    }

    #[test]
    fn load_one_on_root_is_an_empty_failure() {
        let mut loader = NativeLibraryLoader::builder("demo", "1.0", StaticBundle::new(MISSING_HOST))
            .platform(PLATFORM)
            .linker(MockDynamicLinker::new())
            .build()
            .unwrap();

        let root = loader.dependency_tree().root();
        let failure = loader.load_one(root).unwrap_err();
        assert!(failure.attempts().is_empty());
    }

    #[test]
    fn extract_resource_copies_any_bundled_file() {
        let (_bundle_dir, bundle) = system_bundle();
        let target = tempdir().unwrap();
        let loader = NativeLibraryLoader::builder("demo", "2.0", bundle)
            .config(isolated_config(target.path()))
            .platform(PLATFORM)
            .linker(MockDynamicLinker::new())
            .build()
            .unwrap();

        let manifest = loader.extract_resource(MANIFEST_RESOURCE).unwrap();
        assert_eq!(
            manifest,
            Extraction::Copied(target.path().join("demo-2.0").join(MANIFEST_RESOURCE))
        );
        assert_eq!(
            loader.extract_resource("libabsent.so").unwrap(),
            Extraction::NotBundled
        );
    }

    #[test]
    fn force_copy_is_mutable() {
        let mut loader = NativeLibraryLoader::builder("demo", "1.0", StaticBundle::new(MISSING_HOST))
            .platform(PLATFORM)
            .force_copy(true)
            .linker(MockDynamicLinker::new())
            .build()
            .unwrap();

        assert!(loader.force_copy());
        loader.set_force_copy(false);
        assert!(!loader.force_copy());
    }
}
