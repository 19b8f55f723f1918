#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Lazily expanded tree of the unlock choices a seeded run will offer.
//!
//! The tree is a pure domain structure: an arena of [`UnlockChoiceNode`]s
//! owned by [`UnlockChoiceTree`] and grown on demand by a
//! [`ChoiceTreeBuilder`], which replays the host's unlock draws through a
//! [`StreamSource`]. Expansion is idempotent and every node's metrics are
//! computed once when the node is created. Transient display state lives in
//! [`PresentationState`], keyed by [`NodeId`], so nothing in this module
//! depends on how the tree is shown.

mod presentation;
mod report;
mod traversal;

use std::fmt;

use seed_scanner_core::{
    ContentCatalog, NestedStream, Seed, SeededStream, Selection, SettingId, StreamSource,
    SubcontextKey, UnlockId, UnlockPackId, UnlockRequest, DEFAULT_LOOKAHEAD_DAYS, START_DAY,
    UNLOCK_SUBCONTEXT_INDEX,
};
use seed_scanner_system_effects::{BranchMetrics, EffectAggregator};
use thiserror::Error;

pub use presentation::{ChildSlot, PresentationState};
pub use report::{
    excluded_disclaimer, format_percentage, node_label, CsvReport, ReportHeader,
    EXCLUDED_DISCLAIMER_PREFIX,
};
pub use traversal::{LeafRow, LeafRows};

/// Identifier of a node inside an [`UnlockChoiceTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates an identifier from its arena index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Arena index of the node.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Expansion state of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expansion {
    /// The node has not been expanded yet.
    Pending,
    /// The next offer was found; children share its day.
    Branched {
        /// Day on which the children are offered.
        day: i32,
        /// Children in offer slot order.
        children: [Option<NodeId>; 2],
    },
    /// No offer exists within the lookahead window.
    Terminal,
}

/// Errors raised while working with an [`UnlockChoiceTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The identifier does not name a node of the tree.
    #[error("node {0} does not belong to this tree")]
    UnknownNode(NodeId),
}

/// Starting conditions of a scanned run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunStart {
    /// Seed of the run.
    pub seed: Seed,
    /// Restaurant setting of the run.
    pub setting: SettingId,
    /// Dish the run starts with.
    pub starting_dish: UnlockId,
    /// Franchise tier used for unlock eligibility.
    pub tier: u32,
}

impl RunStart {
    /// Creates starting conditions at franchise tier zero.
    #[must_use]
    pub fn new(seed: Seed, setting: SettingId, starting_dish: UnlockId) -> Self {
        Self {
            seed,
            setting,
            starting_dish,
            tier: 0,
        }
    }
}

/// One reachable unlock event, or the synthetic root describing the start.
#[derive(Clone, Debug, PartialEq)]
pub struct UnlockChoiceNode {
    unlock: Option<UnlockId>,
    name: String,
    day: i32,
    selection: Selection,
    metrics: BranchMetrics,
    parent: Option<NodeId>,
    expansion: Expansion,
}

impl UnlockChoiceNode {
    /// Unlock chosen at this node; `None` for the root.
    #[must_use]
    pub const fn unlock(&self) -> Option<UnlockId> {
        self.unlock
    }

    /// Display name of the node.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Day on which the unlock is offered, [`START_DAY`] for the root.
    #[must_use]
    pub const fn day(&self) -> i32 {
        self.day
    }

    /// Every unlock selected on the path to this node, in path order.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Metrics derived from the selection when the node was created.
    #[must_use]
    pub fn metrics(&self) -> &BranchMetrics {
        &self.metrics
    }

    /// Parent of the node; `None` for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Current expansion state.
    #[must_use]
    pub const fn expansion(&self) -> Expansion {
        self.expansion
    }

    /// Children in slot order; empty unless the node has branched.
    #[must_use]
    pub const fn children(&self) -> [Option<NodeId>; 2] {
        match self.expansion {
            Expansion::Branched { children, .. } => children,
            Expansion::Pending | Expansion::Terminal => [None, None],
        }
    }

    /// Reports whether the node is the synthetic root.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Arena owning every node discovered for a single run.
#[derive(Clone, Debug)]
pub struct UnlockChoiceTree {
    start: RunStart,
    unlock_pack: Option<UnlockPackId>,
    total_rerolls: u32,
    nodes: Vec<UnlockChoiceNode>,
}

impl UnlockChoiceTree {
    /// Creates a tree holding only the root for `start`.
    ///
    /// The root selects the starting dish plus the setting's starting unlock
    /// when present. The unlock pack is the setting's own pack, falling back
    /// to the catalog default. Unknown settings behave like settings without
    /// a starting unlock or pack.
    #[must_use]
    pub fn new_root(catalog: &dyn ContentCatalog, start: RunStart) -> Self {
        let setting = catalog.setting(start.setting);
        if setting.is_none() {
            tracing::warn!(setting = start.setting.get(), "unknown setting, using defaults");
        }

        let mut selection = Selection::from_ids([start.starting_dish]);
        if let Some(unlock) = setting.and_then(|setting| setting.starting_unlock) {
            selection = selection.with(unlock);
        }

        let unlock_pack = setting
            .and_then(|setting| setting.unlock_pack)
            .and_then(|id| catalog.unlock_pack(id))
            .or_else(|| catalog.default_unlock_pack())
            .map(|pack| pack.id);

        let root = UnlockChoiceNode {
            unlock: None,
            name: start.seed.to_string(),
            day: START_DAY,
            metrics: EffectAggregator::new(catalog).aggregate(&selection, START_DAY),
            selection,
            parent: None,
            expansion: Expansion::Pending,
        };

        Self {
            start,
            unlock_pack,
            total_rerolls: 0,
            nodes: vec![root],
        }
    }

    /// Starting conditions of the run.
    #[must_use]
    pub fn start(&self) -> &RunStart {
        &self.start
    }

    /// Seed of the run.
    #[must_use]
    pub fn seed(&self) -> &Seed {
        &self.start.seed
    }

    /// Unlock pack the run draws offers from, if one could be resolved.
    #[must_use]
    pub const fn unlock_pack(&self) -> Option<UnlockPackId> {
        self.unlock_pack
    }

    /// Identifier of the root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&UnlockChoiceNode> {
        self.nodes.get(id.index())
    }

    /// Number of nodes created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`; the root exists from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of shop rerolls the player plans per day.
    #[must_use]
    pub const fn total_rerolls(&self) -> u32 {
        self.total_rerolls
    }

    /// Records the planned number of shop rerolls.
    ///
    /// Branches that were already expanded are kept as they are.
    pub fn set_total_rerolls(&mut self, rerolls: u32) {
        self.total_rerolls = rerolls;
    }

    fn push_child(&mut self, node: UnlockChoiceNode) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    fn set_expansion(&mut self, id: NodeId, expansion: Expansion) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.expansion = expansion;
        }
    }
}

/// Expands tree nodes by replaying the host's unlock draws.
pub struct ChoiceTreeBuilder<'c, S> {
    catalog: &'c dyn ContentCatalog,
    streams: S,
    lookahead_days: u32,
}

impl<S: fmt::Debug> fmt::Debug for ChoiceTreeBuilder<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChoiceTreeBuilder")
            .field("streams", &self.streams)
            .field("lookahead_days", &self.lookahead_days)
            .finish_non_exhaustive()
    }
}

impl<'c, S: StreamSource> ChoiceTreeBuilder<'c, S> {
    /// Creates a builder scanning [`DEFAULT_LOOKAHEAD_DAYS`] days ahead.
    #[must_use]
    pub fn new(catalog: &'c dyn ContentCatalog, streams: S) -> Self {
        Self {
            catalog,
            streams,
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
        }
    }

    /// Overrides the number of days scanned after a node.
    #[must_use]
    pub fn with_lookahead(mut self, days: u32) -> Self {
        self.lookahead_days = days;
        self
    }

    /// Number of days scanned after a node.
    #[must_use]
    pub const fn lookahead_days(&self) -> u32 {
        self.lookahead_days
    }

    /// Catalog used to resolve unlock names and effects.
    #[must_use]
    pub fn catalog(&self) -> &'c dyn ContentCatalog {
        self.catalog
    }

    /// Expands `id`, returning its expansion state.
    ///
    /// Days after the node are scanned in increasing order; the first day
    /// with one or two candidates becomes the children's day. Nodes that were
    /// already expanded are returned unchanged.
    pub fn expand(&self, tree: &mut UnlockChoiceTree, id: NodeId) -> Result<Expansion, TreeError> {
        let node = tree.node(id).ok_or(TreeError::UnknownNode(id))?;
        if node.expansion != Expansion::Pending {
            return Ok(node.expansion);
        }

        let origin_day = node.day;
        let selection = node.selection.clone();

        let Some(pack) = tree.unlock_pack.and_then(|pack| self.catalog.unlock_pack(pack)) else {
            tracing::warn!(node = %id, "no unlock pack available, node is terminal");
            tree.set_expansion(id, Expansion::Terminal);
            return Ok(Expansion::Terminal);
        };

        for offset in 1..=self.lookahead_days {
            let Some(day) = i32::try_from(offset)
                .ok()
                .and_then(|offset| origin_day.checked_add(offset))
            else {
                break;
            };

            let options = {
                let key = SubcontextKey::unlocks(tree.seed(), day);
                let mut stream = self.streams.open_subcontext(&key);
                let mut nested = stream.open_nested(UNLOCK_SUBCONTEXT_INDEX);
                nested.draw_unlock_options(pack, &selection, UnlockRequest::new(day, tree.start.tier))
            };

            if options.is_empty() {
                continue;
            }

            let mut children = [None, None];
            for (slot, candidate) in options.slots().into_iter().enumerate() {
                let Some(unlock) = candidate else {
                    continue;
                };
                if selection.contains(unlock) {
                    tracing::warn!(
                        node = %id,
                        unlock = unlock.get(),
                        day,
                        "offer repeats an unlock already selected, ignoring it"
                    );
                    continue;
                }
                children[slot] = Some(self.create_child(tree, id, &selection, unlock, day));
            }

            if children.iter().all(Option::is_none) {
                continue;
            }

            let expansion = Expansion::Branched { day, children };
            tracing::debug!(node = %id, day, ?children, "expanded unlock choice");
            tree.set_expansion(id, expansion);
            return Ok(expansion);
        }

        tracing::debug!(
            node = %id,
            lookahead = self.lookahead_days,
            "no unlock offer within lookahead window"
        );
        tree.set_expansion(id, Expansion::Terminal);
        Ok(Expansion::Terminal)
    }

    /// Iterates the leaves below `node` up to `day_limit`, expanding on demand.
    pub fn leaf_rows<'t, 'b>(
        &'b self,
        tree: &'t mut UnlockChoiceTree,
        node: NodeId,
        day_limit: i32,
    ) -> LeafRows<'t, 'b, 'c, S> {
        LeafRows::new(tree, self, node, day_limit)
    }

    /// Distinct known unlocks selected by the leaves below `node`, in first-seen order.
    pub fn unlocks_up_to_day(
        &self,
        tree: &mut UnlockChoiceTree,
        node: NodeId,
        day_limit: i32,
    ) -> Vec<UnlockId> {
        let mut unlocks: Vec<UnlockId> = Vec::new();
        for row in self.leaf_rows(tree, node, day_limit) {
            for id in row.selection().iter() {
                if self.catalog.unlock(id).is_some() && !unlocks.contains(&id) {
                    unlocks.push(id);
                }
            }
        }
        unlocks
    }

    fn create_child(
        &self,
        tree: &mut UnlockChoiceTree,
        parent: NodeId,
        selection: &Selection,
        unlock: UnlockId,
        day: i32,
    ) -> NodeId {
        let selection = selection.with(unlock);
        let metrics = EffectAggregator::new(self.catalog).aggregate(&selection, day);
        tree.push_child(UnlockChoiceNode {
            unlock: Some(unlock),
            name: self.catalog.unlock_name(unlock),
            day,
            selection,
            metrics,
            parent: Some(parent),
            expansion: Expansion::Pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_display_with_hash_prefix() {
        assert_eq!(NodeId::new(3).to_string(), "#3");
        assert_eq!(NodeId::new(3).get(), 3);
    }

    #[test]
    fn pending_nodes_have_no_children() {
        let node = UnlockChoiceNode {
            unlock: None,
            name: String::new(),
            day: START_DAY,
            selection: Selection::new(),
            metrics: BranchMetrics::neutral(),
            parent: None,
            expansion: Expansion::Pending,
        };
        assert_eq!(node.children(), [None, None]);
        assert!(node.is_root());
    }
}
