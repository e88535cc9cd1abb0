//! Arena-backed dependency tree.
//!
//! Nodes are stored in manifest order and addressed by [`NodeId`]. Index 0 is
//! always the synthetic root, which anchors the parse and is never loaded.
//! The tree is immutable once the parser returns it; per-node resolution state
//! lives in a separate table keyed by `NodeId`.

use std::ops::Index;

use serde::Serialize;

/// Stable handle to a node inside one [`DependencyTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// The synthetic root.
    pub const ROOT: Self = Self(0);

    pub const fn index(self) -> usize {
        self.0
    }
}

/// One library entry from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyTreeNode {
    short_name: String,
    path_hint: String,
    supports_short_name_load: bool,
    depth: usize,
    #[serde(skip)]
    parent: Option<NodeId>,
    #[serde(skip)]
    children: Vec<NodeId>,
}

impl DependencyTreeNode {
    /// Logical name as written before the separator (usually a soname).
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Path written after the separator. Empty for the synthetic root.
    pub fn path_hint(&self) -> &str {
        &self.path_hint
    }

    /// False when the manifest marked this entry as unsafe to resolve by name.
    pub const fn supports_short_name_load(&self) -> bool {
        self.supports_short_name_load
    }

    /// Number of edges from the synthetic root.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in manifest order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// The parsed manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTree {
    nodes: Vec<DependencyTreeNode>,
}

impl DependencyTree {
    /// A tree holding only the synthetic root.
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![DependencyTreeNode {
                short_name: String::new(),
                path_hint: String::new(),
                supports_short_name_load: false,
                depth: 0,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Append a node under `parent`.
    pub(crate) fn attach(
        &mut self,
        parent: NodeId,
        short_name: impl Into<String>,
        path_hint: impl Into<String>,
        supports_short_name_load: bool,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(DependencyTreeNode {
            short_name: short_name.into(),
            path_hint: path_hint.into(),
            supports_short_name_load,
            depth,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&DependencyTreeNode> {
        self.nodes.get(id.0)
    }

    /// The library the application links against: the first non-root node.
    pub fn primary(&self) -> Option<NodeId> {
        self.nodes[NodeId::ROOT.0].children.first().copied()
    }

    /// Total node count, including the synthetic root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the manifest declared no libraries.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Every node in pre-order, starting with the synthetic root.
    pub fn all_tree_nodes(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self[id].children.iter().rev().copied());
        }
        order
    }

    /// Library nodes in pre-order (the synthetic root excluded).
    pub fn libraries(&self) -> Vec<NodeId> {
        self.all_tree_nodes().into_iter().skip(1).collect()
    }

    /// Library nodes in post-order: every dependency before its dependents.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(NodeId::ROOT, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                if id != NodeId::ROOT {
                    order.push(id);
                }
                continue;
            }
            stack.push((id, true));
            stack.extend(self[id].children.iter().rev().map(|child| (*child, false)));
        }
        order
    }

    /// First node, in pre-order, whose short name is `short_name`.
    pub fn find(&self, short_name: &str) -> Option<NodeId> {
        self.libraries()
            .into_iter()
            .find(|id| self[*id].short_name == short_name)
    }
}

impl Index<NodeId> for DependencyTree {
    type Output = DependencyTreeNode;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}
