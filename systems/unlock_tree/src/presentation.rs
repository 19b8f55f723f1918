use std::collections::{HashMap, HashSet};

use crate::{NodeId, UnlockChoiceTree};

/// Offer slot of a child node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChildSlot {
    /// Candidate shown first.
    First,
    /// Candidate shown second.
    Second,
}

impl ChildSlot {
    /// Position of the slot in a node's child array.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    /// Slot with the provided one-based number, as shown to players.
    #[must_use]
    pub const fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            _ => None,
        }
    }
}

/// Transient display state kept beside an [`UnlockChoiceTree`].
///
/// Clearing or changing it never touches the tree's structure.
#[derive(Clone, Debug, Default)]
pub struct PresentationState {
    expanded: HashSet<NodeId>,
    selected: HashMap<NodeId, ChildSlot>,
}

impl PresentationState {
    /// Creates state with nothing expanded or selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports whether `node` is shown expanded.
    #[must_use]
    pub fn is_expanded(&self, node: NodeId) -> bool {
        self.expanded.contains(&node)
    }

    /// Shows or hides the children of `node`.
    pub fn set_expanded(&mut self, node: NodeId, expanded: bool) {
        if expanded {
            let _ = self.expanded.insert(node);
        } else {
            let _ = self.expanded.remove(&node);
        }
    }

    /// Slot of the child currently selected below `node`.
    #[must_use]
    pub fn selected_child(&self, node: NodeId) -> Option<ChildSlot> {
        self.selected.get(&node).copied()
    }

    /// Clears expansion and selection on `node` and every created descendant.
    pub fn collapse_subtree(&mut self, tree: &UnlockChoiceTree, node: NodeId) {
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            let _ = self.expanded.remove(&id);
            let _ = self.selected.remove(&id);
            if let Some(current) = tree.node(id) {
                pending.extend(current.children().into_iter().flatten());
            }
        }
    }

    /// Selects the child in `slot` below `node`, returning it.
    ///
    /// Switching to a different child collapses the subtree first so the
    /// previously followed branch no longer shows. Returns `None` when the
    /// node has no child in that slot.
    pub fn select_child(
        &mut self,
        tree: &UnlockChoiceTree,
        node: NodeId,
        slot: ChildSlot,
    ) -> Option<NodeId> {
        let child = tree.node(node)?.children()[slot.index()]?;
        if self.selected_child(node) != Some(slot) {
            self.collapse_subtree(tree, node);
            let _ = self.selected.insert(node, slot);
        }
        Some(child)
    }

    /// Nodes from the root following each selected child.
    #[must_use]
    pub fn selection_path(&self, tree: &UnlockChoiceTree) -> Vec<NodeId> {
        let mut path = vec![tree.root()];
        let mut current = tree.root();
        while let Some(slot) = self.selected_child(current) {
            let Some(child) = tree
                .node(current)
                .and_then(|node| node.children()[slot.index()])
            else {
                break;
            };
            path.push(child);
            current = child;
        }
        path
    }
}
