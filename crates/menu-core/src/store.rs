//! In-session menu state.

use tracing::debug;

use crate::error::EditError;
use crate::model::MenuTree;

/// Holds the tree the presentation layer renders.
///
/// Edits replace the tree with the result of an operation from [`crate::ops`];
/// remote pushes replace it wholesale.
#[derive(Debug, Clone, Default)]
pub struct MenuStore {
    tree: MenuTree,
    unsaved: bool,
}

impl MenuStore {
    pub fn new(tree: MenuTree) -> Self {
        Self { tree, unsaved: false }
    }

    pub fn tree(&self) -> &MenuTree {
        &self.tree
    }

    /// True when a local edit has been applied since the last replace or save.
    pub fn has_unsaved_edits(&self) -> bool {
        self.unsaved
    }

    /// Swaps in a whole new tree, dropping any local edits.
    pub fn replace(&mut self, tree: MenuTree) {
        self.tree = tree;
        self.unsaved = false;
    }

    pub fn apply<F>(&mut self, op: F) -> Result<(), EditError>
    where
        F: FnOnce(&MenuTree) -> Result<MenuTree, EditError>,
    {
        let next = op(&self.tree)?;
        if next != self.tree {
            self.tree = next;
            self.unsaved = true;
        } else {
            debug!("Edit left the menu unchanged");
        }
        Ok(())
    }

    pub fn mark_saved(&mut self) {
        self.unsaved = false;
    }
}
