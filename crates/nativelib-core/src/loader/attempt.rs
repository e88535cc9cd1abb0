//! The three load strategies and their typed outcomes.
//!
//! Each strategy yields an [`AttemptResult`]; the sequence stops at the first
//! `Ok`. A failed attempt is a value, never an early return, so one strategy
//! cannot abort the others.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::linker::DynamicLinker;
use crate::manifest::DependencyTreeNode;
use crate::platform::Os;

/// How a load was attempted, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStrategy {
    /// The resolved or manifest path.
    Direct,
    /// The copy in the extraction directory.
    Extracted,
    /// The bare name, through the linker's search path.
    ShortName,
}

impl LoadStrategy {
    pub const ORDER: [Self; 3] = [Self::Direct, Self::Extracted, Self::ShortName];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Extracted => "extracted",
            Self::ShortName => "short-name",
        }
    }
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one attempt did not load anything.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AttemptFailureReason {
    #[error("file does not exist")]
    FileMissing,

    #[error("not a system library, no extracted copy applies")]
    NotSystemPath,

    #[error("short-name load disabled by the manifest")]
    ShortNameDisabled,

    #[error("{0}")]
    Unsupported(String),

    #[error("{0}")]
    Linker(String),
}

impl AttemptFailureReason {
    /// True when the strategy was not applicable, as opposed to a linker error.
    pub const fn is_skip(&self) -> bool {
        !matches!(self, Self::Linker(_))
    }
}

/// Failure of a single strategy for a single node.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{strategy} load of '{target}' failed: {reason}")]
pub struct LoadAttemptFailure {
    pub strategy: LoadStrategy,
    pub target: String,
    pub reason: AttemptFailureReason,
}

/// Every strategy failed for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeLoadFailure {
    attempts: Vec<LoadAttemptFailure>,
}

impl NodeLoadFailure {
    pub(crate) const fn new(attempts: Vec<LoadAttemptFailure>) -> Self {
        Self { attempts }
    }

    /// Attempts in the order they were made.
    pub fn attempts(&self) -> &[LoadAttemptFailure] {
        &self.attempts
    }

    pub fn first(&self) -> Option<&LoadAttemptFailure> {
        self.attempts.first()
    }

    pub fn last(&self) -> Option<&LoadAttemptFailure> {
        self.attempts.last()
    }

    /// The last attempt the linker actually rejected, else the last attempt.
    pub fn cause(&self) -> Option<&LoadAttemptFailure> {
        self.attempts
            .iter()
            .rev()
            .find(|attempt| !attempt.reason.is_skip())
            .or_else(|| self.last())
    }
}

impl fmt::Display for NodeLoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cause() {
            Some(cause) => write!(
                f,
                "all {} load attempts failed, cause: {cause}",
                self.attempts.len()
            ),
            None => f.write_str("no load strategy applies"),
        }
    }
}

impl std::error::Error for NodeLoadFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause()
            .map(|attempt| attempt as &(dyn std::error::Error + 'static))
    }
}

/// A successful load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedLibrary {
    pub strategy: LoadStrategy,
    pub target: String,
}

pub type AttemptResult = Result<LoadedLibrary, LoadAttemptFailure>;

/// Inputs for the strategy sequence of one node.
pub(crate) struct AttemptPlan<'a> {
    pub node: &'a DependencyTreeNode,
    /// Resolved path when known, else the manifest path.
    pub path: &'a Path,
    /// Extraction target, present only for system libraries.
    pub extracted: Option<PathBuf>,
    pub os: &'a Os,
}

impl AttemptPlan<'_> {
    /// Try every strategy in order until one loads the library.
    pub(crate) fn run(
        &self,
        linker: &mut dyn DynamicLinker,
    ) -> Result<LoadedLibrary, NodeLoadFailure> {
        let mut attempts = Vec::with_capacity(LoadStrategy::ORDER.len() + 1);
        for strategy in LoadStrategy::ORDER {
            let outcome = match strategy {
                LoadStrategy::Direct => load_file(strategy, self.path, linker),
                LoadStrategy::Extracted => self.load_extracted(linker),
                LoadStrategy::ShortName => self.load_short_name(linker, &mut attempts),
            };
            match outcome {
                Ok(loaded) => return Ok(loaded),
                Err(failure) => attempts.push(self.logged(failure)),
            }
        }
        Err(NodeLoadFailure::new(attempts))
    }

    fn logged(&self, failure: LoadAttemptFailure) -> LoadAttemptFailure {
        if failure.reason.is_skip() {
            debug!(library = %self.node.short_name(), %failure, "Skipping load strategy");
        } else {
            warn!(library = %self.node.short_name(), %failure, "Load attempt failed");
        }
        failure
    }

    fn load_extracted(&self, linker: &mut dyn DynamicLinker) -> AttemptResult {
        match &self.extracted {
            Some(copy) => load_file(LoadStrategy::Extracted, copy, linker),
            None => Err(LoadAttemptFailure {
                strategy: LoadStrategy::Extracted,
                target: self.path.display().to_string(),
                reason: AttemptFailureReason::NotSystemPath,
            }),
        }
    }

    /// Ask the linker for the conventional file name of the bare library,
    /// then for the manifest name as written (`libm.so.6`), since unversioned
    /// names usually only exist with development packages.
    ///
    /// Every rejected request but the last is pushed onto `attempts`; the last
    /// one is returned.
    fn load_short_name(
        &self,
        linker: &mut dyn DynamicLinker,
        attempts: &mut Vec<LoadAttemptFailure>,
    ) -> AttemptResult {
        let strategy = LoadStrategy::ShortName;
        let short_name = self.node.short_name();
        let fail = |target: &str, reason| LoadAttemptFailure {
            strategy,
            target: target.to_string(),
            reason,
        };

        if !self.node.supports_short_name_load() {
            return Err(fail(short_name, AttemptFailureReason::ShortNameDisabled));
        }

        let mapped = self
            .os
            .short_name_file(short_name)
            .map_err(|err| fail(short_name, AttemptFailureReason::Unsupported(err.to_string())))?;

        let mut candidates = vec![mapped];
        if candidates[0] != short_name {
            candidates.push(short_name.to_string());
        }

        let mut rejected = None;
        for file_name in candidates {
            if let Some(previous) = rejected.take() {
                attempts.push(self.logged(previous));
            }
            match linker.load_name(&file_name) {
                Ok(()) => {
                    return Ok(LoadedLibrary {
                        strategy,
                        target: file_name,
                    });
                }
                Err(err) => {
                    rejected = Some(fail(&file_name, AttemptFailureReason::Linker(err.to_string())));
                }
            }
        }
        Err(rejected.unwrap_or_else(|| fail(short_name, AttemptFailureReason::FileMissing)))
    }
}

/// Load `path` only when it is an existing file, so a same-named library from
/// elsewhere is never picked up by accident.
fn load_file(strategy: LoadStrategy, path: &Path, linker: &mut dyn DynamicLinker) -> AttemptResult {
    let target = path.display().to_string();
    if path.as_os_str().is_empty() || !path.is_file() {
        return Err(LoadAttemptFailure {
            strategy,
            target,
            reason: AttemptFailureReason::FileMissing,
        });
    }

    match linker.load_path(path) {
        Ok(()) => Ok(LoadedLibrary { strategy, target }),
        Err(err) => Err(LoadAttemptFailure {
            strategy,
            target,
            reason: AttemptFailureReason::Linker(err.to_string()),
        }),
    }
}
