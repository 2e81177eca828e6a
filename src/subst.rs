//! Replacing one child of a node with another.

use thiserror::Error;

use crate::ast::SlotMut;
use crate::{NodeId, Tree};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubstError {
    #[error("node {old:?} is not a child of {parent:?}")]
    NotFound { parent: NodeId, old: NodeId },

    #[error("node {0:?} is not in the tree")]
    Detached(NodeId),
}

type Result<T, E = SubstError> = std::result::Result<T, E>;

/// Replaces `old` with `new` in whichever child slot of `parent` holds it.
///
/// Works the same for single-valued and sequence slots, including the annotation slot every
/// declaration carries in its modifiers. On success `new` is a child of `parent` and `old` is
/// left detached: its `parent` link is cleared but the node itself stays allocated, so the caller
/// may move its children elsewhere or discard it.
pub fn substitute(tree: &mut Tree, parent: NodeId, old: NodeId, new: NodeId) -> Result<()> {
    if !tree.contains(new) {
        return Err(SubstError::Detached(new));
    }

    let node = tree.get_mut(parent).ok_or(SubstError::Detached(parent))?;
    let mut replaced = false;

    'slots: for slot in node.kind.slots_mut() {
        match slot {
            SlotMut::One(child) if *child == old => {
                *child = new;
                replaced = true;

                break 'slots;
            }

            SlotMut::One(_) => {}

            SlotMut::Many(children) => {
                if let Some(child) = children.iter_mut().find(|child| **child == old) {
                    *child = new;
                    replaced = true;

                    break 'slots;
                }
            }
        }
    }

    if !replaced {
        return Err(SubstError::NotFound { parent, old });
    }

    tree[new].parent = Some(parent);

    if let Some(old) = tree.get_mut(old) {
        old.parent = None;
    }

    Ok(())
}

/// Replaces `old` with `new` in the slot of `old`'s own parent.
pub fn replace(tree: &mut Tree, old: NodeId, new: NodeId) -> Result<()> {
    let parent = tree.parent(old).ok_or(SubstError::Detached(old))?;

    substitute(tree, parent, old, new)
}
