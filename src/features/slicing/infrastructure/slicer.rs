//! The mark/sweep [`Slicer`] (spec §4.7), grounded directly in
//! `examples/original_source/src/analysis/Slicing.h`'s `WalkAndMark` (mark
//! phase) and `Slicer::slice`/`sliceBBlocks`/`sliceNodes` (sweep phase).

use crate::features::sdg::domain::{DGBBlockId, DGNodeId, DependenceGraphId};
use crate::features::sdg::infrastructure::SystemDependenceGraph;
use crate::features::slicing::domain::SlicerStatistics;
use crate::shared::{CoreError, CoreResult};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

pub struct Slicer {
    next_slice_id: u32,
}

impl Slicer {
    pub fn new() -> Self {
        Slicer { next_slice_id: 0 }
    }

    /// Mark phase (spec §4.7): backward BFS from `criterion` along reverse
    /// control-dependence, reverse memory-dependence, and reverse use
    /// edges, tagging every visited [`DGNode`](crate::features::sdg::domain::DGNode)
    /// (and its containing block and owning dependence graph) with the
    /// slice id. Entering a procedure through one of its formal-parameter
    /// nodes re-enqueues that procedure's entry node, so every call site
    /// referencing it is conservatively marked too (`WalkAndMark`'s "mark
    /// the new DG's entry node" step).
    ///
    /// `slice_id` lets a caller continue an existing slice (useful when
    /// slicing from several criteria into one combined slice); `None`
    /// allocates a fresh id.
    pub fn mark(
        &mut self,
        sdg: &mut SystemDependenceGraph,
        criterion: DGNodeId,
        slice_id: Option<u32>,
    ) -> CoreResult<u32> {
        if sdg.node(criterion).is_none() {
            return Err(CoreError::UnknownCriterion(format!("{criterion}")));
        }

        let sl_id = slice_id.unwrap_or_else(|| {
            self.next_slice_id += 1;
            self.next_slice_id
        });

        let mut worklist: VecDeque<DGNodeId> = VecDeque::new();
        let mut enqueued: FxHashSet<DGNodeId> = FxHashSet::default();
        worklist.push_back(criterion);
        enqueued.insert(criterion);

        while let Some(n) = worklist.pop_front() {
            let Some(node) = sdg.node(n) else { continue };
            let control_deps: Vec<DGNodeId> = node.control_deps.iter().copied().collect();
            let mem_deps: Vec<DGNodeId> = node.mem_deps.iter().copied().collect();
            let uses: Vec<DGNodeId> = node.uses.iter().copied().collect();
            let bblock = node.bblock;
            let owner = node.owner;
            let is_formal_parameter = node.is_formal_parameter;

            sdg.set_node_slice(n, sl_id);
            if let Some(b) = bblock {
                sdg.set_block_slice(b, sl_id);
            }
            sdg.set_graph_slice(owner, sl_id);

            if is_formal_parameter {
                if let Some(entry) = sdg.entry_node(owner) {
                    if enqueued.insert(entry) {
                        worklist.push_back(entry);
                    }
                }
            }

            for preds in [control_deps, mem_deps, uses] {
                for p in preds {
                    if enqueued.insert(p) {
                        worklist.push_back(p);
                    }
                }
            }
        }

        Ok(sl_id)
    }

    /// Sweep phase (spec §4.7): removes from `graph` (and, recursively,
    /// every procedure reachable through a retained call node) everything
    /// not tagged `slice_id`. Blocks are isolated-then-removed first
    /// (`sliceBBlocks`), then any remaining untagged node is force-removed
    /// (`sliceNodes`) — a retained call node's callees are visited exactly
    /// once each, via `visited`.
    pub fn slice(
        &self,
        sdg: &mut SystemDependenceGraph,
        graph: DependenceGraphId,
        slice_id: u32,
    ) -> CoreResult<SlicerStatistics> {
        let mut stats = SlicerStatistics::default();
        let mut visited: FxHashSet<DependenceGraphId> = FxHashSet::default();
        self.slice_graph(sdg, graph, slice_id, &mut visited, &mut stats)?;
        Ok(stats)
    }

    fn slice_graph(
        &self,
        sdg: &mut SystemDependenceGraph,
        graph: DependenceGraphId,
        slice_id: u32,
        visited: &mut FxHashSet<DependenceGraphId>,
        stats: &mut SlicerStatistics,
    ) -> CoreResult<()> {
        if !visited.insert(graph) {
            return Ok(());
        }

        let blocks: Vec<DGBBlockId> = sdg.graph(graph).map(|g| g.blocks.clone()).unwrap_or_default();
        for b in blocks {
            let outcome = match sdg.block(b) {
                Some(blk) => Some((blk.slice_id == slice_id, blk.nodes.len() as u64)),
                None => None,
            };
            let Some((keep, size)) = outcome else { continue };
            if !keep {
                stats.nodes_total += size;
                stats.nodes_removed += size;
                stats.blocks_removed += 1;
                sdg.remove_block(b)?;
            }
        }

        let nodes: Vec<DGNodeId> = sdg.graph(graph).map(|g| g.nodes.clone()).unwrap_or_default();
        for n in nodes {
            let outcome = match sdg.node(n) {
                Some(node) => Some((node.slice_id == slice_id, node.callees.clone())),
                None => None,
            };
            let Some((keep, callees)) = outcome else { continue };

            if !keep {
                stats.nodes_total += 1;
                sdg.force_remove_node(n)?;
                stats.nodes_removed += 1;
                continue;
            }

            for callee in callees {
                self.slice_graph(sdg, callee, slice_id, visited, stats)?;
            }
        }

        Ok(())
    }
}

impl Default for Slicer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::sdg::domain::DGNodeKind;

    /// Spec §8.2 scenario 7: a slicing criterion at a later statement that
    /// uses `x` must keep the assignment to `x` and drop an unrelated
    /// assignment to `y`.
    #[test]
    fn slice_keeps_only_the_def_reaching_the_criterion() {
        let mut sdg = SystemDependenceGraph::new(0);
        let g = sdg.create_graph("f").unwrap();
        let entry = sdg.create_block(g).unwrap();
        let def_x = sdg.create_node(g, Some(entry), DGNodeKind::Instruction).unwrap();
        let def_y = sdg.create_node(g, Some(entry), DGNodeKind::Instruction).unwrap();
        let criterion = sdg.create_node(g, Some(entry), DGNodeKind::Instruction).unwrap();
        sdg.add_memory_dep(criterion, def_x).unwrap();

        let mut slicer = Slicer::new();
        let slice_id = slicer.mark(&mut sdg, criterion, None).unwrap();
        let stats = slicer.slice(&mut sdg, g, slice_id).unwrap();

        assert!(sdg.node(def_x).is_some());
        assert!(sdg.node(criterion).is_some());
        assert!(sdg.node(def_y).is_none());
        assert_eq!(stats.nodes_removed, 1);
    }

    #[test]
    fn unknown_criterion_is_rejected() {
        let mut sdg = SystemDependenceGraph::new(0);
        let mut slicer = Slicer::new();
        assert!(slicer.mark(&mut sdg, DGNodeId(999), None).is_err());
    }

    /// Entering a callee through a formal parameter re-enqueues the
    /// callee's entry node, conservatively keeping the whole call site
    /// reachable in the slice.
    #[test]
    fn formal_parameter_pulls_in_callee_entry() {
        let mut sdg = SystemDependenceGraph::new(0);
        let g = sdg.create_graph("callee").unwrap();
        let entry = sdg.create_block(g).unwrap();
        let marker = sdg.create_node(g, Some(entry), DGNodeKind::Instruction).unwrap();
        let pair = sdg.create_argument_pair(g, true).unwrap();
        sdg.add_uses(pair.output, pair.input).unwrap();

        let mut slicer = Slicer::new();
        let slice_id = slicer.mark(&mut sdg, pair.output, None).unwrap();

        assert_eq!(sdg.node(marker).unwrap().slice_id, slice_id);
    }
}
