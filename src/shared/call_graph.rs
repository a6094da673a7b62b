//! `GenericCallGraph<V>` (spec §3.3): a directed graph over opaque call
//! targets, populated incrementally as the pointer analysis discovers
//! function-pointer resolutions. Shared between the pointer graph's call
//! graph and the read-write graph's analogous caller/callee tracking (spec
//! §3.4). Grounded on `ProgramDependenceGraph`'s storage shape
//! (`features/pdg/infrastructure/pdg.rs`): a `petgraph::DiGraph` alongside a
//! `HashMap<key, NodeIndex>` for lookup by caller-assigned key.

use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use std::hash::Hash;

/// A directed graph over opaque values `V` (spec §3.3). Has no edges
/// implied by any other structure; callers add edges explicitly as they
/// are discovered.
#[derive(Debug, Clone)]
pub struct GenericCallGraph<V> {
    graph: DiGraph<V, ()>,
    index: FxHashMap<V, NodeIndex>,
    /// SCC representative per node, recomputed on demand by
    /// [`GenericCallGraph::recompute_sccs`]; `None` until first computed.
    scc_rep: FxHashMap<V, u32>,
}

impl<V: Eq + Hash + Clone> Default for GenericCallGraph<V> {
    fn default() -> Self {
        GenericCallGraph {
            graph: DiGraph::new(),
            index: FxHashMap::default(),
            scc_rep: FxHashMap::default(),
        }
    }
}

impl<V: Eq + Hash + Clone> GenericCallGraph<V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_insert(&mut self, v: &V) -> NodeIndex {
        if let Some(&idx) = self.index.get(v) {
            return idx;
        }
        let idx = self.graph.add_node(v.clone());
        self.index.insert(v.clone(), idx);
        idx
    }

    /// Records that `a` calls `b`. Idempotent: calling twice with the same
    /// pair adds no duplicate edge.
    pub fn add_call(&mut self, a: V, b: V) {
        let ai = self.get_or_insert(&a);
        let bi = self.get_or_insert(&b);
        if !self.graph.contains_edge(ai, bi) {
            self.graph.add_edge(ai, bi, ());
        }
    }

    /// Whether `v` has been registered as a node (as a caller, callee, or
    /// via an explicit `ensure_node`).
    pub fn get(&self, v: &V) -> bool {
        self.index.contains_key(v)
    }

    pub fn ensure_node(&mut self, v: &V) {
        self.get_or_insert(v);
    }

    pub fn callees(&self, v: &V) -> Vec<V> {
        match self.index.get(v) {
            Some(&idx) => self
                .graph
                .neighbors_directed(idx, petgraph::Direction::Outgoing)
                .map(|n| self.graph[n].clone())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn callers(&self, v: &V) -> Vec<V> {
        match self.index.get(v) {
            Some(&idx) => self
                .graph
                .neighbors_directed(idx, petgraph::Direction::Incoming)
                .map(|n| self.graph[n].clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Recomputes the SCC id of every node (spec §3.3: "an SCC id on each
    /// node"), using petgraph's Tarjan implementation.
    pub fn recompute_sccs(&mut self) {
        self.scc_rep.clear();
        let sccs = petgraph::algo::tarjan_scc(&self.graph);
        for (rep_id, component) in sccs.into_iter().enumerate() {
            for node in component {
                self.scc_rep.insert(self.graph[node].clone(), rep_id as u32);
            }
        }
    }

    /// The SCC id of `v` as of the last [`Self::recompute_sccs`] call, or
    /// `None` if it was never computed or `v` is unknown.
    pub fn scc_id(&self, v: &V) -> Option<u32> {
        self.scc_rep.get(v).copied()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_call_is_idempotent() {
        let mut g: GenericCallGraph<u32> = GenericCallGraph::new();
        g.add_call(1, 2);
        g.add_call(1, 2);
        assert_eq!(g.callees(&1), vec![2]);
        assert_eq!(g.callers(&2), vec![1]);
    }

    #[test]
    fn recompute_sccs_groups_cycle() {
        let mut g: GenericCallGraph<u32> = GenericCallGraph::new();
        g.add_call(1, 2);
        g.add_call(2, 1);
        g.add_call(1, 3);
        g.recompute_sccs();
        assert_eq!(g.scc_id(&1), g.scc_id(&2));
        assert_ne!(g.scc_id(&1), g.scc_id(&3));
    }
}
