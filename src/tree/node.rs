// Arena node types for the archive tree.
//
// Nodes live in a `Tree` arena and refer to each other through `NodeId`
// handles. Children vectors hold the owning edges; the parent field is a
// plain back-link used for upward navigation and ownership checks.

use std::fmt;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Handle to a node stored in a [`Tree`](super::Tree).
///
/// A handle carries the generation of the arena slot it was issued for, so
/// a handle to a deleted node never resolves to a node that later reuses
/// the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot index (stable for the lifetime of the node).
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Payload of a node: a directory-like branch or a file-like leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Ordered children. Order is the serialization order.
    Branch { children: Vec<NodeId> },
    /// File contents. May be empty.
    Leaf { contents: Vec<u8> },
}

/// A named node in the archive tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn branch(name: String) -> Self {
        Self {
            name,
            parent: None,
            kind: NodeKind::Branch {
                children: Vec::new(),
            },
        }
    }

    pub(crate) fn leaf(name: String, contents: Vec<u8>) -> Self {
        Self {
            name,
            parent: None,
            kind: NodeKind::Leaf { contents },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning branch, or `None` for the root and for detached subtrees.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_branch(&self) -> bool {
        matches!(self.kind, NodeKind::Branch { .. })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Children in order. Leaves have none.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Branch { children } => children,
            NodeKind::Leaf { .. } => &[],
        }
    }

    /// File contents, or `None` for a branch.
    pub fn contents(&self) -> Option<&[u8]> {
        match &self.kind {
            NodeKind::Leaf { contents } => Some(contents),
            NodeKind::Branch { .. } => None,
        }
    }

    /// True when both nodes are of the same variant.
    pub(crate) fn same_kind(&self, other: &Node) -> bool {
        self.is_branch() == other.is_branch()
    }
}
