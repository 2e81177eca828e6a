//! Implements [`Serialize`][serde::Serialize] for trees.

use serde::Serialize;
use serde::ser::{SerializeSeq, SerializeStruct};

use crate::{NodeId, Tree};

/// A subtree viewed as nested `{ kind, loc, label, children }` records.
#[derive(Debug, Clone, Copy)]
pub struct TreeView<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl Tree {
    /// Returns a serializable view of the subtree rooted at `id`.
    pub fn view(&self, id: NodeId) -> TreeView<'_> {
        TreeView { tree: self, id }
    }
}

struct Children<'a>(TreeView<'a>);

impl Serialize for Children<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let children = self.0.tree.children(self.0.id);
        let mut seq = serializer.serialize_seq(Some(children.len()))?;

        for id in children {
            seq.serialize_element(&self.0.tree.view(id))?;
        }

        seq.end()
    }
}

impl Serialize for TreeView<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let node = self.tree.get(self.id).ok_or_else(|| {
            <S::Error as serde::ser::Error>::custom(format!("node {:?} is not in the tree", self.id))
        })?;

        let mut state = serializer.serialize_struct("Node", 4)?;
        state.serialize_field("kind", node.kind.name())?;
        state.serialize_field("loc", &node.loc)?;
        state.serialize_field("label", &node.kind.label())?;
        state.serialize_field("children", &Children(*self))?;

        state.end()
    }
}
