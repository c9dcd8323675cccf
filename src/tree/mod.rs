// Ordered archive tree with path addressing.
//
// The tree is an arena of `Node`s addressed by generation-checked `NodeId`
// handles. Each branch owns its ordered children; children point back at
// their branch with a non-owning handle. Child order is the order the
// archive codec serializes in, so every operation preserves it.
//
// - `node`: `Node`, `NodeKind`, `NodeId`
// - `path`: `/`-delimited path helpers and name validation

mod node;
pub mod path;

pub use node::{Node, NodeId, NodeKind};

use thiserror::Error;

/// Name given to the root branch of a new tree. Never serialized.
pub const ROOT_NAME: &str = "root";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Caller misuse of the tree API. Distinct from malformed archive data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("invalid node name {0:?}: names must be non-empty and contain no '/'")]
    InvalidName(String),
    #[error("stale or unknown node handle")]
    StaleNode,
    #[error("{0:?} is already attached to a parent; detach it first")]
    AlreadyAttached(String),
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild { parent: String, child: String },
    #[error("{0:?} is not a directory")]
    NotABranch(String),
    #[error("{0:?} is not a file")]
    NotALeaf(String),
    #[error("the root cannot be attached, detached, moved or deleted")]
    RootImmutable,
    #[error("placing {0:?} there would make it its own ancestor")]
    CycleDetected(String),
    #[error("no such file or directory: {0:?}")]
    NotFound(String),
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-backed tree of branches (directories) and leaves (files).
///
/// Nodes created with [`new_branch`](Self::new_branch) or
/// [`new_leaf`](Self::new_leaf) start detached; only nodes reachable from
/// [`root`](Self::root) are part of the archive.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    live: usize,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding only an empty root branch.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::branch(ROOT_NAME.to_string())),
            }],
            free: Vec::new(),
            root: NodeId::new(0, 0),
            live: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, attached or detached, including the root.
    pub fn node_count(&self) -> usize {
        self.live
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    /// Resolve a handle, failing with [`TreeError::StaleNode`].
    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).ok_or(TreeError::StaleNode)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.get_mut(id).ok_or(TreeError::StaleNode)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(index, 0)
    }

    fn release(&mut self, id: NodeId) -> Option<Node> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(node)
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Allocate a detached, empty branch.
    pub fn new_branch(&mut self, name: impl Into<String>) -> Result<NodeId, TreeError> {
        let name = name.into();
        path::validate_name(&name)?;
        Ok(self.alloc(Node::branch(name)))
    }

    /// Allocate a detached leaf holding `contents`.
    pub fn new_leaf(
        &mut self,
        name: impl Into<String>,
        contents: impl Into<Vec<u8>>,
    ) -> Result<NodeId, TreeError> {
        let name = name.into();
        path::validate_name(&name)?;
        Ok(self.alloc(Node::leaf(name, contents.into())))
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn name(&self, id: NodeId) -> Result<&str, TreeError> {
        Ok(self.node(id)?.name())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        Ok(self.node(id)?.parent())
    }

    pub fn is_branch(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_branch)
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_leaf)
    }

    /// Ordered children of a branch.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], TreeError> {
        let node = self.node(id)?;
        match &node.kind {
            NodeKind::Branch { children } => Ok(children),
            NodeKind::Leaf { .. } => Err(TreeError::NotABranch(node.name.clone())),
        }
    }

    /// Contents of a leaf.
    pub fn contents(&self, id: NodeId) -> Result<&[u8], TreeError> {
        let node = self.node(id)?;
        node.contents()
            .ok_or_else(|| TreeError::NotALeaf(node.name.clone()))
    }

    pub fn contents_mut(&mut self, id: NodeId) -> Result<&mut Vec<u8>, TreeError> {
        let node = self.node_mut(id)?;
        match &mut node.kind {
            NodeKind::Leaf { contents } => Ok(contents),
            NodeKind::Branch { .. } => Err(TreeError::NotALeaf(node.name.clone())),
        }
    }

    pub fn set_contents(
        &mut self,
        id: NodeId,
        contents: impl Into<Vec<u8>>,
    ) -> Result<(), TreeError> {
        *self.contents_mut(id)? = contents.into();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Resolve `path` relative to `start`.
    ///
    /// Intermediate segments only match branches; the final segment matches
    /// either kind. The first child with a matching name wins. An empty path
    /// resolves to `start`.
    pub fn find(&self, start: NodeId, path: &str) -> Option<NodeId> {
        self.resolve(start, path, |_| true)
    }

    /// Like [`find`](Self::find), but the final segment must be a branch.
    pub fn find_branch(&self, start: NodeId, path: &str) -> Option<NodeId> {
        self.resolve(start, path, Node::is_branch)
    }

    /// Like [`find`](Self::find), but the final segment must be a leaf.
    pub fn find_leaf(&self, start: NodeId, path: &str) -> Option<NodeId> {
        self.resolve(start, path, Node::is_leaf)
    }

    fn resolve<F>(&self, start: NodeId, path: &str, accept: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        let start_node = self.get(start)?;
        let mut segments = path::segments(path);
        let Some(last) = segments.next_back() else {
            return accept(start_node).then_some(start);
        };
        let mut current = start;
        for segment in segments {
            current = self.child_named(current, segment, Node::is_branch)?;
        }
        self.child_named(current, last, accept)
    }

    fn child_named<F>(&self, parent: NodeId, name: &str, accept: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        self.get(parent)?
            .children()
            .iter()
            .copied()
            .find(|&c| self.get(c).is_some_and(|n| n.name == name && accept(n)))
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.get(node).and_then(Node::parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Append `child` to `parent`'s children.
    ///
    /// The child must be detached; attaching it somewhere else first
    /// requires [`remove_child`](Self::remove_child) or
    /// [`detach`](Self::detach).
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if child == self.root {
            return Err(TreeError::RootImmutable);
        }
        let child_node = self.node(child)?;
        if child_node.parent.is_some() {
            return Err(TreeError::AlreadyAttached(child_node.name.clone()));
        }
        let parent_node = self.node(parent)?;
        if !parent_node.is_branch() {
            return Err(TreeError::NotABranch(parent_node.name.clone()));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::CycleDetected(self.node(child)?.name.clone()));
        }

        if let NodeKind::Branch { children } = &mut self.node_mut(parent)?.kind {
            children.push(child);
        }
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach `child` from `parent`, handing the subtree back to the caller.
    ///
    /// Removal is by identity, so duplicate names are unaffected.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, TreeError> {
        let child_node = self.node(child)?;
        if child_node.parent != Some(parent) {
            return Err(TreeError::NotAChild {
                parent: self.get(parent).map(|n| n.name.clone()).unwrap_or_default(),
                child: child_node.name.clone(),
            });
        }

        if let NodeKind::Branch { children } = &mut self.node_mut(parent)?.kind
            && let Some(pos) = children.iter().position(|&c| c == child)
        {
            children.remove(pos);
        }
        self.node_mut(child)?.parent = None;
        Ok(child)
    }

    /// Detach `node` from whatever branch owns it. Detached nodes are
    /// returned unchanged.
    pub fn detach(&mut self, node: NodeId) -> Result<NodeId, TreeError> {
        if node == self.root {
            return Err(TreeError::RootImmutable);
        }
        match self.node(node)?.parent {
            Some(parent) => self.remove_child(parent, node),
            None => Ok(node),
        }
    }

    /// Detach `node` and free it together with its whole subtree.
    pub fn delete(&mut self, node: NodeId) -> Result<(), TreeError> {
        self.detach(node)?;
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.release(id)
                && let NodeKind::Branch { children } = removed.kind
            {
                stack.extend(children);
            }
        }
        Ok(())
    }

    pub fn rename(&mut self, node: NodeId, new_name: impl Into<String>) -> Result<(), TreeError> {
        let new_name = new_name.into();
        path::validate_name(&new_name)?;
        self.node_mut(node)?.name = new_name;
        Ok(())
    }

    /// Return the branch named `name` under `parent`, creating it if absent.
    pub fn branch_or_create(&mut self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        if let Some(existing) = self.child_named(parent, name, Node::is_branch) {
            return Ok(existing);
        }
        let branch = self.new_branch(name)?;
        self.add_child(parent, branch)?;
        Ok(branch)
    }

    /// Store `contents` in the leaf named `name` under `parent`, creating
    /// the leaf if absent.
    pub fn put_leaf(
        &mut self,
        parent: NodeId,
        name: &str,
        contents: impl Into<Vec<u8>>,
    ) -> Result<NodeId, TreeError> {
        if let Some(existing) = self.child_named(parent, name, Node::is_leaf) {
            self.set_contents(existing, contents)?;
            return Ok(existing);
        }
        let leaf = self.new_leaf(name, contents)?;
        self.add_child(parent, leaf)?;
        Ok(leaf)
    }

    /// Move `node` to `new_parent_path` (relative to the root) under
    /// `new_name`.
    ///
    /// Missing branches along the path are created; a file with the same
    /// name as a segment does not stand in for a branch. A node of the same kind
    /// already using `new_name` in the target branch is deleted first. The
    /// whole move is validated before anything changes, so a failed move
    /// leaves the tree untouched.
    pub fn move_node(
        &mut self,
        node: NodeId,
        new_parent_path: &str,
        new_name: &str,
    ) -> Result<(), TreeError> {
        path::validate_name(new_name)?;
        if node == self.root {
            return Err(TreeError::RootImmutable);
        }

        let segments: Vec<&str> = path::segments(new_parent_path).collect();
        let mut existing = Some(self.root);
        for segment in &segments {
            let Some(current) = existing else { break };
            match self.child_named(current, segment, Node::is_branch) {
                Some(next) if self.is_ancestor_or_self(node, next) => {
                    return Err(TreeError::CycleDetected(self.node(node)?.name.clone()));
                }
                Some(next) => existing = Some(next),
                None => existing = None,
            }
        }

        self.detach(node)?;
        let mut parent = self.root;
        for segment in segments {
            parent = self.branch_or_create(parent, segment)?;
        }

        let moving = self.node(node)?;
        let occupant = self.child_named(parent, new_name, |n| n.same_kind(moving));
        if let Some(evicted) = occupant {
            log::debug!("move: replacing existing {new_name:?}");
            self.delete(evicted)?;
        }

        self.node_mut(node)?.name = new_name.to_string();
        self.add_child(parent, node)
    }

    // -----------------------------------------------------------------------
    // Traversal
    // -----------------------------------------------------------------------

    /// Depth-first, pre-order walk of everything below `start`, in child
    /// order. Yields `(depth, id)` with direct children at depth 0.
    pub fn walk(&self, start: NodeId) -> Walk<'_> {
        let stack = self
            .get(start)
            .map(|n| n.children().iter().rev().map(|&c| (0, c)).collect())
            .unwrap_or_default();
        Walk { tree: self, stack }
    }

    /// Number of leaves anywhere below `branch`.
    pub fn leaf_count(&self, branch: NodeId) -> usize {
        self.walk(branch).filter(|&(_, id)| self.is_leaf(id)).count()
    }

    /// `/`-joined path from the root to `node`. The root itself is `""`.
    ///
    /// For a detached subtree the path starts at the subtree's top node.
    pub fn path_of(&self, node: NodeId) -> Result<String, TreeError> {
        let mut names = Vec::new();
        let mut current = node;
        loop {
            let n = self.node(current)?;
            match n.parent {
                Some(parent) => {
                    names.push(n.name.as_str());
                    current = parent;
                }
                None => {
                    if current != self.root {
                        names.push(n.name.as_str());
                    }
                    break;
                }
            }
        }
        names.reverse();
        Ok(names.join("/"))
    }
}

/// Iterator returned by [`Tree::walk`].
pub struct Walk<'a> {
    tree: &'a Tree,
    stack: Vec<(usize, NodeId)>,
}

impl Iterator for Walk<'_> {
    type Item = (usize, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.stack.pop()?;
        if let Some(node) = self.tree.get(id) {
            self.stack
                .extend(node.children().iter().rev().map(|&c| (depth + 1, c)));
        }
        Some((depth, id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
