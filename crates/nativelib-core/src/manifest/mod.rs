//! Dependency manifests: parsing, the resulting tree, and its rendering.

mod display;
mod parser;
mod tree;

pub use display::format_tree;
pub use parser::{ManifestError, ManifestParser, NO_SHORT_NAME_MARKER, SEPARATOR, parse};
pub use tree::{DependencyTree, DependencyTreeNode, NodeId};

/// Resource name of the manifest inside each platform directory.
pub const MANIFEST_RESOURCE: &str = "lddtree.txt";
