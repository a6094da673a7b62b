//! `PointerSubgraph` (spec §3.2): one procedure's worth of [`PSNode`]s.

use super::node::PSNodeId;
use rustc_hash::FxHashSet;

/// A procedure in the pointer graph: a root `ENTRY` node, the set of
/// `RETURN` nodes that exit it, an optional collector node for variadic
/// arguments, and a cache of non-trivial SCCs computed on demand (spec
/// §4.2's loop detection).
#[derive(Debug, Clone)]
pub struct PointerSubgraph {
    pub entry: PSNodeId,
    pub returns: Vec<PSNodeId>,
    pub vararg_collector: Option<PSNodeId>,
    /// All node ids belonging to this subgraph, in insertion order.
    pub nodes: Vec<PSNodeId>,
    /// Populated by [`PointerSubgraph::set_loop_nodes`] once SCCs have
    /// been computed; a node in this set is not a singleton instance
    /// (spec §4.2's strong-update discipline).
    on_loop: FxHashSet<PSNodeId>,
    loops_computed: bool,
}

impl PointerSubgraph {
    pub fn new(entry: PSNodeId) -> Self {
        PointerSubgraph {
            entry,
            returns: Vec::new(),
            vararg_collector: None,
            nodes: vec![entry],
            on_loop: FxHashSet::default(),
            loops_computed: false,
        }
    }

    pub fn add_node(&mut self, id: PSNodeId) {
        self.nodes.push(id);
    }

    pub fn add_return(&mut self, id: PSNodeId) {
        self.returns.push(id);
    }

    pub fn set_loop_nodes(&mut self, on_loop: FxHashSet<PSNodeId>) {
        self.on_loop = on_loop;
        self.loops_computed = true;
    }

    pub fn loops_computed(&self) -> bool {
        self.loops_computed
    }

    /// Whether `id` belongs to a non-trivial SCC (or a size-1 SCC with a
    /// self-loop), per spec §4.2's loop-detection rule. Panics in debug
    /// builds if loops have not yet been computed for this subgraph, since
    /// callers (the solver's strong-update check) must not silently treat
    /// stale information as "not on loop".
    pub fn is_on_loop(&self, id: PSNodeId) -> bool {
        debug_assert!(
            self.loops_computed,
            "loop detection must run before querying is_on_loop"
        );
        self.on_loop.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_subgraph_contains_only_entry() {
        let sg = PointerSubgraph::new(PSNodeId(0));
        assert_eq!(sg.nodes, vec![PSNodeId(0)]);
        assert!(sg.returns.is_empty());
    }

    #[test]
    fn loop_membership_reflects_computed_set() {
        let mut sg = PointerSubgraph::new(PSNodeId(0));
        sg.add_node(PSNodeId(1));
        let mut on_loop = FxHashSet::default();
        on_loop.insert(PSNodeId(1));
        sg.set_loop_nodes(on_loop);
        assert!(sg.is_on_loop(PSNodeId(1)));
        assert!(!sg.is_on_loop(PSNodeId(0)));
    }
}
