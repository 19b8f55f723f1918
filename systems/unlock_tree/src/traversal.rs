use seed_scanner_core::{Selection, StreamSource};
use seed_scanner_system_effects::BranchMetrics;

use crate::{ChoiceTreeBuilder, Expansion, NodeId, UnlockChoiceNode, UnlockChoiceTree};

/// Summary of a leaf reached while walking the tree up to a day limit.
#[derive(Clone, Debug, PartialEq)]
pub struct LeafRow {
    node: NodeId,
    day: i32,
    selection: Selection,
    metrics: BranchMetrics,
}

impl LeafRow {
    fn from_node(id: NodeId, node: &UnlockChoiceNode) -> Self {
        Self {
            node: id,
            day: node.day(),
            selection: node.selection().clone(),
            metrics: node.metrics().clone(),
        }
    }

    /// Node the row describes.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Day of the leaf node.
    #[must_use]
    pub const fn day(&self) -> i32 {
        self.day
    }

    /// Unlocks selected on the path to the leaf, in path order.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Metrics of the leaf's branch.
    #[must_use]
    pub fn metrics(&self) -> &BranchMetrics {
        &self.metrics
    }
}

/// Lazy depth-first, pre-order walk over the leaves below a node.
///
/// A node is a leaf when it is terminal or when its children are offered
/// after the day limit. Nodes are expanded as the walk reaches them, so only
/// the part of the tree that is actually visited is ever built. While
/// walking, the iterator records the day of every visited node for the
/// column header of an export.
pub struct LeafRows<'t, 'b, 'c, S> {
    tree: &'t mut UnlockChoiceTree,
    builder: &'b ChoiceTreeBuilder<'c, S>,
    stack: Vec<NodeId>,
    day_limit: i32,
    header_days: Vec<i32>,
}

impl<'t, 'b, 'c, S: StreamSource> LeafRows<'t, 'b, 'c, S> {
    pub(crate) fn new(
        tree: &'t mut UnlockChoiceTree,
        builder: &'b ChoiceTreeBuilder<'c, S>,
        node: NodeId,
        day_limit: i32,
    ) -> Self {
        Self {
            tree,
            builder,
            stack: vec![node],
            day_limit,
            header_days: Vec::new(),
        }
    }

    /// Column days seen so far: one entry per unlock of the first node, then
    /// each newly encountered day.
    #[must_use]
    pub fn header_days(&self) -> &[i32] {
        &self.header_days
    }
}

fn record_day(header_days: &mut Vec<i32>, node: &UnlockChoiceNode) {
    if header_days.is_empty() {
        header_days.extend(std::iter::repeat(node.day()).take(node.selection().len()));
    } else if !header_days.contains(&node.day()) {
        header_days.push(node.day());
    }
}

impl<S: StreamSource> Iterator for LeafRows<'_, '_, '_, S> {
    type Item = LeafRow;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let expansion = match self.builder.expand(self.tree, id) {
                Ok(expansion) => expansion,
                Err(error) => {
                    tracing::warn!(%error, "skipping node during traversal");
                    continue;
                }
            };

            let Some(node) = self.tree.node(id) else {
                continue;
            };
            record_day(&mut self.header_days, node);

            match expansion {
                Expansion::Branched { day, children } if day <= self.day_limit => {
                    self.stack.extend(children.iter().rev().flatten().copied());
                }
                Expansion::Branched { .. } | Expansion::Terminal | Expansion::Pending => {
                    return Some(LeafRow::from_node(id, node));
                }
            }
        }
        None
    }
}
