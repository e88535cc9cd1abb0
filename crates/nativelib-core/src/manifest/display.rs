//! Human-readable rendering of a dependency tree.
//!
//! ```text
//! libroot.so => /opt/libroot.so
//! ├── libdep.so => /usr/lib/libdep.so
//! │   └── libz.so.1 => /usr/lib/libz.so.1 (no short-name load)
//! └── libm.so.6 => /lib/libm.so.6
//!
//! 4 libraries
//! ```

use std::fmt::Write;

use super::tree::{DependencyTree, NodeId};

/// Format the tree below the synthetic root.
pub fn format_tree(tree: &DependencyTree) -> String {
    let mut out = String::new();

    for id in tree[tree.root()].children() {
        push_entry(&mut out, tree, *id);
        push_children(&mut out, tree, *id, "");
    }

    let count = tree.libraries().len();
    let noun = if count == 1 { "library" } else { "libraries" };
    let _ = write!(out, "\n{count} {noun}\n");
    out
}

fn push_children(out: &mut String, tree: &DependencyTree, id: NodeId, prefix: &str) {
    let children = tree[id].children();
    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        let connector = if is_last { "└── " } else { "├── " };
        out.push_str(prefix);
        out.push_str(connector);
        push_entry(out, tree, *child);

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };
        push_children(out, tree, *child, &child_prefix);
    }
}

fn push_entry(out: &mut String, tree: &DependencyTree, id: NodeId) {
    let node = &tree[id];
    let marker = if node.supports_short_name_load() {
        ""
    } else {
        " (no short-name load)"
    };
    let _ = writeln!(
        out,
        "{} => {}{marker}",
        node.short_name(),
        node.path_hint()
    );
}
