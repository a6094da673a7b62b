//! [`BlockGraph`] and [`CDFunction`]: the block-level CFG and per-procedure
//! membership NTSCD's interprocedural extension consumes (spec §4.5),
//! grounded in `examples/original_source/lib/llvm/ControlDependence/legacy/NTSCD.cpp`'s
//! `Block`/`Function` model — here expressed as a flat, generic graph
//! rather than a `Block`/`Function` class pair, since a call block's
//! `callees()`/`joins()` and a block's `isCallReturn()` are the only pieces
//! of per-block interprocedural state NTSCD actually reads.

use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

/// The interprocedural block graph (spec §4.5): successor/predecessor
/// edges plus the call-site/call-return/join annotations NTSCD's second
/// pass reads. Populated explicitly by the caller, the same way
/// [`crate::features::pointer_graph::infrastructure::PointerGraph`] and
/// [`crate::features::read_write_graph::ReadWriteGraph`] are.
#[derive(Debug, Clone, Default)]
pub struct BlockGraph<K: Eq + Hash + Clone> {
    successors: FxHashMap<K, Vec<K>>,
    predecessors: FxHashMap<K, Vec<K>>,
    /// Blocks that are the designated "call-return" successor of some call
    /// block (`isCallReturn()` in the original).
    call_return: FxHashSet<K>,
    /// Call block -> callee entry keys (`node->callees()`).
    callees: FxHashMap<K, Vec<K>>,
    /// Call block -> joined-thread entry keys (`node->joins()`).
    joins: FxHashMap<K, Vec<K>>,
}

impl<K: Eq + Hash + Clone> BlockGraph<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_block(&mut self, k: &K) {
        self.successors.entry(k.clone()).or_default();
        self.predecessors.entry(k.clone()).or_default();
    }

    pub fn add_edge(&mut self, from: K, to: K) {
        self.ensure_block(&from);
        self.ensure_block(&to);
        self.successors.get_mut(&from).unwrap().push(to.clone());
        self.predecessors.get_mut(&to).unwrap().push(from);
    }

    pub fn mark_call_return(&mut self, block: K) {
        self.ensure_block(&block);
        self.call_return.insert(block);
    }

    pub fn is_call_return(&self, block: &K) -> bool {
        self.call_return.contains(block)
    }

    pub fn set_callees(&mut self, call_block: K, callee_entries: Vec<K>) {
        self.ensure_block(&call_block);
        self.callees.insert(call_block, callee_entries);
    }

    pub fn set_joins(&mut self, call_block: K, join_entries: Vec<K>) {
        self.ensure_block(&call_block);
        self.joins.insert(call_block, join_entries);
    }

    pub fn callees(&self, block: &K) -> &[K] {
        self.callees.get(block).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn joins(&self, block: &K) -> &[K] {
        self.joins.get(block).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_callees_or_joins(&self, block: &K) -> bool {
        !self.callees(block).is_empty() || !self.joins(block).is_empty()
    }

    pub fn successors(&self, block: &K) -> &[K] {
        self.successors.get(block).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn predecessors(&self, block: &K) -> &[K] {
        self.predecessors.get(block).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One procedure's block membership (spec §4.5): entry, the set of exit
/// blocks (a procedure may have several early-return blocks), and every
/// block belonging to it, plus the subset that are call-return blocks
/// (NTSCD's second interprocedural loop iterates these directly, mirroring
/// `function->callReturnNodes()`).
#[derive(Debug, Clone)]
pub struct CDFunction<K> {
    pub entry: K,
    pub exits: Vec<K>,
    pub blocks: Vec<K>,
    pub call_return_blocks: Vec<K>,
}

impl<K: Clone> CDFunction<K> {
    pub fn new(entry: K) -> Self {
        CDFunction {
            blocks: vec![entry.clone()],
            entry,
            exits: Vec::new(),
            call_return_blocks: Vec::new(),
        }
    }

    pub fn add_block(&mut self, block: K) {
        self.blocks.push(block);
    }

    pub fn add_exit(&mut self, block: K) {
        self.exits.push(block);
    }

    pub fn add_call_return_block(&mut self, block: K) {
        self.call_return_blocks.push(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_mirrored_both_directions() {
        let mut g: BlockGraph<u32> = BlockGraph::new();
        g.add_edge(1, 2);
        assert_eq!(g.successors(&1), &[2]);
        assert_eq!(g.predecessors(&2), &[1]);
    }

    #[test]
    fn callees_default_to_empty_slice() {
        let g: BlockGraph<u32> = BlockGraph::new();
        assert!(g.callees(&1).is_empty());
        assert!(!g.has_callees_or_joins(&1));
    }
}
