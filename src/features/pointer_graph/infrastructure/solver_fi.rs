//! The flow-insensitive pointer analysis solver (spec §4.2,
//! `PointerAnalysisFI`): classical Andersen-style inclusion-based analysis.
//! Unlike [`super::solver_fs`], there is exactly one global memory map
//! (loads and stores at every program point read/write the same state),
//! every update is weak, and node order/control flow is irrelevant — only
//! data dependence (operands) drives the fixpoint. Grounded in the same
//! constraint-worklist shape as the Andersen pass, generalized from a
//! single-valued constraint graph to this crate's richer `PSNodeKind` set.

use crate::features::pointer_graph::domain::{PSNodeId, PSNodeKind};
use crate::features::pointer_graph::infrastructure::builder::PointerGraph;
use crate::features::pointer_graph::ports::PointerAnalysisResult;
use crate::shared::{diagnostics, BitPointsToSet, LocationId, Offset, Pointer, PointsToSet};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

fn loc_of(id: PSNodeId) -> LocationId {
    LocationId(id.0)
}

pub struct PointerAnalysisFiResult {
    points_to: FxHashMap<PSNodeId, BitPointsToSet>,
}

impl PointerAnalysisResult for PointerAnalysisFiResult {
    fn points_to(&self, node: PSNodeId) -> BitPointsToSet {
        self.points_to.get(&node).cloned().unwrap_or_default()
    }
}

/// A flattened `target -> points-to set stored at any offset` map, ignoring
/// intervals entirely (spec §4.2: "FI treats the whole allocation as one
/// cell; no field sensitivity"). GEP is a no-op pass-through in FI mode,
/// matching the same widening-of-precision tradeoff.
#[derive(Default)]
struct GlobalMemory {
    by_target: FxHashMap<LocationId, BitPointsToSet>,
}

impl GlobalMemory {
    fn store(&mut self, target: LocationId, values: &BitPointsToSet) -> bool {
        self.by_target.entry(target).or_default().union_with(values)
    }

    fn load(&self, target: LocationId) -> BitPointsToSet {
        self.by_target.get(&target).cloned().unwrap_or_default()
    }
}

/// Runs the Andersen-style worklist to a fixpoint. `max_iterations` bounds
/// total node-processing steps (spec §7); nodes still dirty past the cap
/// are conservatively widened to `UNKNOWN`. Takes the graph mutably because,
/// like the FS solver, a `CALL_FUNCPTR` whose operand's points-to set grows
/// to include a new function dynamically wires that function's subgraph
/// into the call graph and CFG (spec §4.2's "Call-graph discovery").
pub fn solve(graph: &mut PointerGraph, max_iterations: u32) -> PointerAnalysisFiResult {
    let all_nodes = graph.live_node_ids();
    let mut points_to: FxHashMap<PSNodeId, BitPointsToSet> =
        all_nodes.iter().map(|&id| (id, BitPointsToSet::default())).collect();
    let mut memory = GlobalMemory::default();

    let mut worklist: VecDeque<PSNodeId> = all_nodes.iter().copied().collect();
    let mut queued: FxHashSet<PSNodeId> = all_nodes.iter().copied().collect();

    let mut iterations: u32 = 0;
    let mut widened = false;

    while let Some(node_id) = worklist.pop_front() {
        queued.remove(&node_id);
        iterations += 1;
        if iterations > max_iterations {
            if !widened {
                diagnostics::widen_to_unknown("pointer_analysis_fi", "iteration cap exceeded");
                widened = true;
            }
            points_to.entry(node_id).or_default().insert(Pointer::unknown(loc_of(node_id)));
            continue;
        }

        let mem_changed = apply_memory_effect(graph, node_id, &points_to, &mut memory);
        let call_graph_changed = discover_call_funcptr(graph, node_id, &points_to);
        let new_pts = transfer(graph, node_id, &points_to, &memory);

        let entry = points_to.entry(node_id).or_default();
        let pts_changed = entry.union_with(&new_pts);

        if pts_changed || mem_changed || call_graph_changed {
            // Data dependence alone drives FI: re-enqueue users (and, for a
            // memory-changing node, every LOAD currently in the graph, since
            // FI has no points-to-driven use-def chains on memory).
            let users = graph.node(node_id).map(|n| n.users.clone()).unwrap_or_default();
            for u in users {
                if queued.insert(u) {
                    worklist.push_back(u);
                }
            }
            if mem_changed {
                for &load_id in &all_nodes {
                    if graph.node(load_id).map(|n| n.kind) == Some(PSNodeKind::Load) && queued.insert(load_id) {
                        worklist.push_back(load_id);
                    }
                }
            }
            if call_graph_changed {
                // The newly connected callee's entry/returns are now live
                // CFG successors/predecessors of this call site; re-enqueue
                // this node's (now larger) successor set and its paired
                // CALL_RETURN so the new edges get walked at least once.
                for succ in graph.node(node_id).map(|n| n.successors.clone()).unwrap_or_default() {
                    if queued.insert(succ) {
                        worklist.push_back(succ);
                    }
                }
                if let Some(paired) = graph.node(node_id).and_then(|n| n.data.paired_node) {
                    if queued.insert(paired) {
                        worklist.push_back(paired);
                    }
                }
            }
        }
    }

    PointerAnalysisFiResult { points_to }
}

/// FI's analogue of the FS solver's `call_funcptr_effect` (spec §4.2's
/// "Call-graph discovery"): wires any not-yet-seen callee found in the
/// `CALL_FUNCPTR` operand's current points-to set into the call graph/CFG.
fn discover_call_funcptr(
    graph: &mut PointerGraph,
    node_id: PSNodeId,
    points_to: &FxHashMap<PSNodeId, BitPointsToSet>,
) -> bool {
    if graph.node(node_id).map(|n| n.kind) != Some(PSNodeKind::CallFuncPtr) {
        return false;
    }
    let pts = subject_pts(graph, node_id, points_to);
    let mut connected = false;
    for loc in pts.locations() {
        let function_node = PSNodeId(loc.0);
        if let Some(entry) = graph.function_entry(function_node) {
            if matches!(graph.connect_call_site(node_id, entry), Ok(true)) {
                connected = true;
            }
        }
    }
    connected
}

fn subject_pts(
    graph: &PointerGraph,
    node_id: PSNodeId,
    points_to: &FxHashMap<PSNodeId, BitPointsToSet>,
) -> BitPointsToSet {
    graph
        .node(node_id)
        .and_then(|n| n.data.subject.or_else(|| n.operands.first().copied()))
        .and_then(|op| points_to.get(&op))
        .cloned()
        .unwrap_or_default()
}

fn transfer(
    graph: &PointerGraph,
    node_id: PSNodeId,
    points_to: &FxHashMap<PSNodeId, BitPointsToSet>,
    memory: &GlobalMemory,
) -> BitPointsToSet {
    let kind = match graph.node(node_id) {
        Some(n) => n.kind,
        None => return BitPointsToSet::default(),
    };

    match kind {
        PSNodeKind::Alloc | PSNodeKind::Global | PSNodeKind::Function => {
            let mut s = BitPointsToSet::default();
            s.insert(Pointer::new(loc_of(node_id), Offset::new(0)));
            s
        }
        PSNodeKind::Constant => {
            let mut s = BitPointsToSet::default();
            if let Some((target, off)) = graph.node(node_id).and_then(|n| n.data.constant) {
                s.insert(Pointer::new(loc_of(target), off));
            }
            s
        }
        // FI drops field sensitivity: GEP and CAST simply forward the base
        // pointer's target set (spec §4.2's FI/FS comparison).
        PSNodeKind::Gep | PSNodeKind::Cast | PSNodeKind::Return => subject_pts(graph, node_id, points_to),
        PSNodeKind::Phi => {
            let mut s = BitPointsToSet::default();
            let operands = graph.node(node_id).map(|n| n.operands.clone()).unwrap_or_default();
            for op in operands {
                if let Some(p) = points_to.get(&op) {
                    s.union_with(p);
                }
            }
            s
        }
        PSNodeKind::Load => {
            let base = subject_pts(graph, node_id, points_to);
            let mut out = BitPointsToSet::default();
            for loc in base.locations() {
                out.union_with(&memory.load(loc));
            }
            out
        }
        PSNodeKind::CallReturn => {
            let preds = graph.node(node_id).map(|n| n.predecessors.clone()).unwrap_or_default();
            let mut out = BitPointsToSet::default();
            for p in preds {
                if graph.node(p).map(|n| n.kind) == Some(PSNodeKind::Return) {
                    if let Some(v) = points_to.get(&p) {
                        out.union_with(v);
                    }
                }
            }
            out
        }
        _ => BitPointsToSet::default(),
    }
}

/// FI's memory-write side effect: every `STORE`/`MEMCPY` is an unconditional
/// weak union into the global per-target map (spec §4.2: "FI never strong
/// updates"). Returns whether the global memory changed.
fn apply_memory_effect(
    graph: &PointerGraph,
    node_id: PSNodeId,
    points_to: &FxHashMap<PSNodeId, BitPointsToSet>,
    memory: &mut GlobalMemory,
) -> bool {
    let kind = match graph.node(node_id) {
        Some(n) => n.kind,
        None => return false,
    };

    match kind {
        PSNodeKind::Store => {
            let dest = subject_pts(graph, node_id, points_to);
            let value = graph
                .node(node_id)
                .and_then(|n| n.operands.first().copied())
                .and_then(|op| points_to.get(&op))
                .cloned()
                .unwrap_or_default();
            let mut changed = false;
            for loc in dest.locations() {
                changed |= memory.store(loc, &value);
            }
            changed
        }
        PSNodeKind::Memcpy => {
            let dest = subject_pts(graph, node_id, points_to);
            let src = graph
                .node(node_id)
                .and_then(|n| n.operands.first().copied())
                .and_then(|op| points_to.get(&op))
                .cloned()
                .unwrap_or_default();
            let mut changed = false;
            for src_loc in src.locations() {
                let copied = memory.load(src_loc);
                for dest_loc in dest.locations() {
                    changed |= memory.store(dest_loc, &copied);
                }
            }
            changed
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::pointer_graph::infrastructure::builder::PointerGraph;

    fn link(graph: &mut PointerGraph, a: PSNodeId, b: PSNodeId) {
        graph.add_cfg_edge(a, b).unwrap();
    }

    #[test]
    fn store_then_load_direct() {
        let mut g = PointerGraph::new();
        let a = g.create(PSNodeKind::Alloc);
        let b = g.create(PSNodeKind::Alloc);
        let store = g.create(PSNodeKind::Store);
        g.node_mut(store).unwrap().data.subject = Some(b);
        g.add_operand(store, a).unwrap();
        let load = g.create(PSNodeKind::Load);
        g.node_mut(load).unwrap().data.subject = Some(b);

        link(&mut g, a, b);
        link(&mut g, b, store);
        link(&mut g, store, load);
        g.create_subgraph(a, None).unwrap();

        let result = solve(&mut g, 1000);
        let l_pts = result.points_to(load);
        assert!(l_pts.contains(Pointer::new(loc_of(a), Offset::new(0))));
    }

    #[test]
    fn fi_merges_all_stores_unlike_fs_strong_update() {
        // Unlike the FS test of the same shape, FI must NOT distinguish
        // the first store from the second: both contribute to the same
        // merged points-to set for every load.
        let mut g = PointerGraph::new();
        let a = g.create(PSNodeKind::Alloc);
        let b = g.create(PSNodeKind::Alloc);
        let c = g.create(PSNodeKind::Alloc);

        let store1 = g.create(PSNodeKind::Store);
        g.node_mut(store1).unwrap().data.subject = Some(b);
        g.add_operand(store1, a).unwrap();

        let store2 = g.create(PSNodeKind::Store);
        g.node_mut(store2).unwrap().data.subject = Some(b);
        g.add_operand(store2, c).unwrap();

        let load = g.create(PSNodeKind::Load);
        g.node_mut(load).unwrap().data.subject = Some(b);

        link(&mut g, a, b);
        link(&mut g, b, c);
        link(&mut g, c, store1);
        link(&mut g, store1, store2);
        link(&mut g, store2, load);
        g.create_subgraph(a, None).unwrap();

        let result = solve(&mut g, 1000);
        let l_pts = result.points_to(load);
        assert!(l_pts.contains(Pointer::new(loc_of(a), Offset::new(0))));
        assert!(l_pts.contains(Pointer::new(loc_of(c), Offset::new(0))));
    }
}
