//! Per-node resolution state.
//!
//! ```text
//! NotChecked -> CheckInstalled -> Installed
//!                              -> Missing -> Extracting -> Extracted
//!                                                       -> ExtractFailed
//! (any of the above) -> LoadAttempt -> Loaded | LoadFailed
//! ```
//!
//! The dependency tree itself never changes; everything learned while
//! resolving is recorded here, indexed by [`NodeId`].

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::trace;

use super::attempt::NodeLoadFailure;
use crate::manifest::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    NotChecked,
    CheckInstalled,
    Installed,
    Missing,
    Extracting,
    Extracted,
    ExtractFailed,
    LoadAttempt,
    Loaded,
    LoadFailed,
}

impl LoadState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::LoadFailed)
    }
}

/// Everything recorded about one node.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeResolution {
    pub state: LoadState,
    /// Host file chosen by the locator; overrides the manifest path.
    pub resolved_path: Option<PathBuf>,
    pub extracted_path: Option<PathBuf>,
    pub extraction_error: Option<String>,
    pub failure: Option<NodeLoadFailure>,
}

/// Side table of [`NodeResolution`] values, one per tree node.
#[derive(Debug, Clone, Default)]
pub struct ResolutionTable {
    entries: Vec<NodeResolution>,
}

impl ResolutionTable {
    pub fn new(len: usize) -> Self {
        Self {
            entries: vec![NodeResolution::default(); len],
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeResolution> {
        self.entries.get(id.index())
    }

    pub fn state(&self, id: NodeId) -> LoadState {
        self.get(id).map_or(LoadState::NotChecked, |entry| entry.state)
    }

    pub fn resolved_path(&self, id: NodeId) -> Option<&Path> {
        self.get(id).and_then(|entry| entry.resolved_path.as_deref())
    }

    pub(crate) fn transition(&mut self, id: NodeId, state: LoadState) {
        if let Some(entry) = self.entries.get_mut(id.index()) {
            trace!(node = id.index(), from = ?entry.state, to = ?state, "State transition");
            entry.state = state;
        }
    }

    pub(crate) fn update(&mut self, id: NodeId, apply: impl FnOnce(&mut NodeResolution)) {
        if let Some(entry) = self.entries.get_mut(id.index()) {
            apply(entry);
        }
    }
}
