//! Lowering of property declarations for a Java-like language.
//!
//! The crate takes a syntax tree produced by an external parser, rewrites every property
//! declaration into a backing field, an observer field and a pair of accessor methods
//! ([`lower`](lower::lower)), prints the result with the original layout preserved
//! ([`print`](print::print)), and then patches uses of the property name that the external compiler
//! complains about into accessor calls ([`Resolver`](resolve::Resolver)). The [`driver`] module
//! ties these together.

use std::collections::VecDeque;
use std::mem;
use std::ops::{Index, IndexMut};

use slotmap::{SecondaryMap, SlotMap, new_key_type};
use thiserror::Error;

pub mod ast;
pub mod build;
pub mod driver;
pub mod loc;
pub mod lower;
pub mod naming;
pub mod observer;
pub mod print;
pub mod resolve;
pub mod subst;

#[cfg(feature = "serde")]
mod serialize;

#[cfg(feature = "serde")]
pub use serialize::TreeView;

use ast::{CompilationUnit, Node, NodeKind};
use loc::{Loc, Pos};

new_key_type! {
    pub struct NodeId;
}

/// Any error the tree passes can produce.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error(transparent)]
    Subst(#[from] subst::SubstError),

    #[error(transparent)]
    Lower(#[from] lower::LowerError),

    #[error(transparent)]
    Resolve(#[from] resolve::ResolveError),
}

/// The syntax tree of a single compilation unit.
///
/// Nodes are stored in an arena and refer to each other by [`NodeId`]. The tree keeps every
/// node's `parent` link in sync with the child slots of its kind for the operations defined here;
/// code that edits [`NodeKind`]s directly through [`get_mut`](Self::get_mut) is responsible for
/// calling [`adopt`](Self::adopt) afterwards.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a tree consisting of an empty compilation unit.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert_with_key(|id| Node {
            id,
            parent: None,
            loc: Loc::Synthetic,
            kind: CompilationUnit::default().into(),
        });

        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the root compilation unit, or `None` if the root was removed or its kind replaced.
    pub fn unit(&self) -> Option<&CompilationUnit> {
        match &self.nodes.get(self.root)?.kind {
            NodeKind::CompilationUnit(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn unit_mut(&mut self) -> Option<&mut CompilationUnit> {
        match &mut self.nodes.get_mut(self.root)?.kind {
            NodeKind::CompilationUnit(unit) => Some(unit),
            _ => None,
        }
    }

    /// Allocates a new node and makes it the parent of every child its kind refers to.
    pub fn add(&mut self, loc: impl Into<Loc>, kind: impl Into<NodeKind>) -> NodeId {
        let loc = loc.into();
        let kind = kind.into();
        let id = self.nodes.insert_with_key(|id| Node {
            id,
            parent: None,
            loc,
            kind,
        });
        self.adopt(id);

        id
    }

    /// Sets the parent link of every child of `id` to `id`.
    pub fn adopt(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };

        for child in node.kind.children() {
            if let Some(child) = self.nodes.get_mut(child) {
                child.parent = Some(id);
            }
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    /// Returns the direct children of `id` in source order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(id)
            .map(|node| node.kind.children())
            .unwrap_or_default()
    }

    /// Returns `id` and all nodes below it in preorder.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = vec![];
        let mut stack = vec![id];

        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };

            result.push(id);
            stack.extend(node.kind.children().into_iter().rev());
        }

        result
    }

    /// Returns the ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.parent(id);

        std::iter::from_fn(move || {
            let id = next?;
            next = self.parent(id);

            Some(id)
        })
    }

    /// Returns `true` if `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|ancestor| ancestor == self.root)
    }

    /// Deallocates a single node without touching its children.
    ///
    /// The children keep pointing at the removed node until they are moved elsewhere.
    pub fn discard(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(id)
    }

    /// Deallocates `id` and everything below it.
    pub fn remove(&mut self, id: NodeId) {
        for id in self.descendants(id) {
            self.nodes.remove(id);
        }
    }

    /// Takes the kind of `id` out of the tree, leaving [`NodeKind::Dummy`] in its place.
    pub fn take_kind(&mut self, id: NodeId) -> Option<NodeKind> {
        Some(mem::take(&mut self.nodes.get_mut(id)?.kind))
    }

    /// Copies the subtree rooted at `id`, returning the id of the detached copy.
    pub fn deep_clone(&mut self, id: NodeId) -> Option<NodeId> {
        let node = self.nodes.get(id)?;
        let loc = node.loc;
        let mut kind = node.kind.clone();

        for slot in kind.slots_mut() {
            match slot {
                ast::SlotMut::One(child) => *child = self.deep_clone(*child)?,

                ast::SlotMut::Many(children) => {
                    for child in children.iter_mut() {
                        *child = self.deep_clone(*child)?;
                    }
                }
            }
        }

        Some(self.add(loc, kind))
    }

    /// Replaces the location of every node in the subtree with [`Loc::Synthetic`].
    pub fn erase_locs(&mut self, id: NodeId) {
        for id in self.descendants(id) {
            let node = &mut self.nodes[id];
            node.loc = Loc::Synthetic;

            for loc in node.kind.inner_locs_mut() {
                *loc = Loc::Synthetic;
            }
        }
    }

    /// Moves every location in the subtree by the given line and column deltas.
    pub fn shift(&mut self, id: NodeId, lines: i64, cols: i64) {
        for id in self.descendants(id) {
            let node = &mut self.nodes[id];
            node.loc = node.loc.shifted(lines, cols);

            for loc in node.kind.inner_locs_mut() {
                *loc = loc.shifted(lines, cols);
            }
        }
    }

    /// Moves every position strictly after `pos` down by `lines`, except inside the `skip`
    /// subtree.
    ///
    /// A span that straddles `pos` only has its end moved.
    pub fn shift_lines_after(&mut self, pos: Pos, lines: i64, skip: NodeId) {
        if lines == 0 {
            return;
        }

        let skipped: SecondaryMap<NodeId, ()> =
            self.descendants(skip).into_iter().map(|id| (id, ())).collect();
        let shift = |loc: &mut Loc| {
            if let Loc::Span(span) = loc {
                if span.begin > pos {
                    span.begin = span.begin.shifted(lines, 0);
                }

                if span.end > pos {
                    span.end = span.end.shifted(lines, 0);
                }
            }
        };

        for (id, node) in &mut self.nodes {
            if skipped.contains_key(id) {
                continue;
            }

            shift(&mut node.loc);

            for loc in node.kind.inner_locs_mut() {
                shift(loc);
            }
        }
    }

    /// Checks that every node reachable from the root has its parent link pointing at the node
    /// holding it. Returns the offending nodes.
    pub fn check_parents(&self) -> Vec<NodeId> {
        let mut offending = vec![];
        let mut queue = VecDeque::from([self.root]);

        if self.parent(self.root).is_some() {
            offending.push(self.root);
        }

        while let Some(id) = queue.pop_front() {
            for child in self.children(id) {
                match self.nodes.get(child) {
                    Some(node) if node.parent == Some(id) => queue.push_back(child),
                    Some(_) => {
                        offending.push(child);
                        queue.push_back(child);
                    }
                    None => offending.push(child),
                }
            }
        }

        offending
    }

    /// Iterates over all allocated nodes, attached or not.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

impl IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }
}
