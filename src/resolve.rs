//! Turning ambiguous member accesses into accessor calls.
//!
//! After lowering, `obj.name` no longer refers to anything when `name` was a property, and the
//! external compiler reports an unknown member at the position of the `name` token. The
//! [`Resolver`] maps each such diagnostic back to the access it talks about and rewrites it:
//!
//! - a read `obj.name` becomes `obj.getName()`;
//! - a write `obj.name = v` becomes `obj.setName(v)`, replacing the whole assignment;
//! - a compound write `obj.name += v` becomes `obj.setName(obj.getName() + v)`.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use crate::ast::{AssignExpr, BinaryExpr, FieldAccess, Ident, MethodCall, NodeKind, ParenExpr};
use crate::loc::{Loc, Pos};
use crate::naming::{getter_name, setter_name};
use crate::print::Layout;
use crate::subst::{SubstError, substitute};
use crate::{NodeId, Tree};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(transparent)]
    Subst(#[from] SubstError),

    #[error("node {0:?} is not attached to a parent")]
    Orphan(NodeId),
}

type Result<T, E = ResolveError> = std::result::Result<T, E>;

/// The accesses of a single tree that may still need rewriting.
#[derive(Debug, Default, Clone)]
pub struct Resolver {
    accesses: Vec<NodeId>,
    properties: BTreeSet<String>,
}

impl Resolver {
    /// Keeps the accesses among `accesses` whose member is one of `properties`.
    pub fn new(
        tree: &Tree,
        accesses: impl IntoIterator<Item = NodeId>,
        properties: &BTreeSet<String>,
    ) -> Self {
        let accesses = accesses
            .into_iter()
            .filter(|&id| member_of(tree, id).is_some_and(|member| properties.contains(member)))
            .collect();

        Self {
            accesses,
            properties: properties.clone(),
        }
    }

    /// The accesses that haven't been rewritten yet.
    pub fn pending(&self) -> &[NodeId] {
        &self.accesses
    }

    pub fn is_empty(&self) -> bool {
        self.accesses.is_empty()
    }

    /// Rewrites the access whose member name starts at `at`. Returns `false` if there is none.
    ///
    /// An access matches when its scope ends exactly one separator column before `at`. The scope's
    /// end is taken from `layout` when given (it should be the layout of the text the diagnostic
    /// was reported for), and from the node's own span otherwise.
    pub fn resolve(&mut self, tree: &mut Tree, layout: Option<&Layout>, at: Pos) -> Result<bool> {
        let Some(idx) = self
            .accesses
            .iter()
            .position(|&access| self.matches(tree, layout, access, at))
        else {
            return Ok(false);
        };

        let access = self.accesses.remove(idx);
        let NodeKind::FieldAccess(FieldAccess { scope, member }) = tree[access].kind.clone() else {
            return Ok(false);
        };
        let parent = tree.parent(access).ok_or(ResolveError::Orphan(access))?;
        let loc = tree[access].loc;

        let assignment = match &tree[parent].kind {
            NodeKind::Assign(assign) if assign.target == access => Some(assign.clone()),
            _ => None,
        };

        match assignment {
            Some(AssignExpr { op, value, .. }) => {
                let grandparent = tree.parent(parent).ok_or(ResolveError::Orphan(parent))?;

                let arg = match op.binary_op() {
                    Some(op) => {
                        let current = self.getter_copy(tree, scope, &member.name)?;
                        let right = if tree[value].kind.needs_parens_as_operand() {
                            tree.add(Loc::Synthetic, ParenExpr { inner: value })
                        } else {
                            value
                        };

                        tree.add(
                            Loc::Synthetic,
                            BinaryExpr {
                                left: current,
                                op,
                                right,
                            },
                        )
                    }

                    None => value,
                };

                let call = tree.add(
                    loc,
                    MethodCall {
                        scope: Some(scope),
                        name: Ident::synthetic(setter_name(&member.name)),
                        args: vec![arg],
                    },
                );

                substitute(tree, grandparent, parent, call)?;
                tree.discard(parent);
                debug!(%at, member = %member.name, "rewrote write into a setter call");
            }

            None => {
                let call = tree.add(
                    loc,
                    MethodCall {
                        scope: Some(scope),
                        name: Ident::synthetic(getter_name(&member.name)),
                        args: vec![],
                    },
                );

                substitute(tree, parent, access, call)?;
                debug!(%at, member = %member.name, "rewrote read into a getter call");
            }
        }

        tree.discard(access);

        Ok(true)
    }

    fn matches(&self, tree: &Tree, layout: Option<&Layout>, access: NodeId, at: Pos) -> bool {
        let Some(NodeKind::FieldAccess(FieldAccess { scope, .. })) =
            tree.get(access).map(|node| &node.kind)
        else {
            return false;
        };

        let end = layout
            .and_then(|layout| layout.get(*scope))
            .map(|span| span.end)
            .or_else(|| tree.get(*scope)?.loc.end());

        end.is_some_and(|end| end.line == at.line && end.col + 1 == at.col)
            && tree.is_attached(access)
    }

    /// Builds `scope.getName()` over a copy of `scope`, so no node ends up with two parents.
    ///
    /// Ambiguous accesses inside the copy are tracked like the original ones.
    fn getter_copy(&mut self, tree: &mut Tree, scope: NodeId, member: &str) -> Result<NodeId> {
        let copy = tree.deep_clone(scope).ok_or(ResolveError::Orphan(scope))?;
        tree.erase_locs(copy);

        for id in tree.descendants(copy) {
            if member_of(tree, id).is_some_and(|member| self.properties.contains(member)) {
                self.accesses.push(id);
            }
        }

        Ok(tree.add(
            Loc::Synthetic,
            MethodCall {
                scope: Some(copy),
                name: Ident::synthetic(getter_name(member)),
                args: vec![],
            },
        ))
    }
}

fn member_of(tree: &Tree, id: NodeId) -> Option<&str> {
    match &tree.get(id)?.kind {
        NodeKind::FieldAccess(access) => Some(&access.member.name),
        _ => None,
    }
}
