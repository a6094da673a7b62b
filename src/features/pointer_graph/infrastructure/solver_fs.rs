//! The flow-sensitive pointer analysis solver (spec §4.2, `PointerAnalysisFS`
//! and, when `track_invalidation` is set, `PointerAnalysisFS+Inv`).
//!
//! A worklist fixpoint over a finite lattice: a `transfer` function
//! dispatched on node kind, with state keyed by node id, and a worklist
//! that requeues successors whenever a transfer changes state (the same
//! shape as `features/points_to/infrastructure/flow_sensitive_solver.rs`'s
//! `FlowSensitivePTA`). We additionally own a per-node [`MemoryMap`] (owned
//! when the node "needs merge", aliased to the sole predecessor's
//! otherwise, per spec §4.2), which that solver does not need since it is
//! not field- and memory-sensitive in the same way.

use super::memory_map::MemoryMap;
use crate::features::pointer_graph::domain::{PSNodeId, PSNodeKind};
use crate::features::pointer_graph::infrastructure::builder::PointerGraph;
use crate::features::pointer_graph::infrastructure::scc::detect_loop_nodes;
use crate::features::pointer_graph::ports::PointerAnalysisResult;
use crate::shared::{diagnostics, BitPointsToSet, Interval, LocationId, Offset, Pointer, PointsToSet};
use rustc_hash::{FxHashMap, FxHashSet as HashSet};
use std::collections::VecDeque;

fn loc_of(id: PSNodeId) -> LocationId {
    LocationId(id.0)
}

pub struct PointerAnalysisFsResult {
    points_to: FxHashMap<PSNodeId, BitPointsToSet>,
}

impl PointerAnalysisResult for PointerAnalysisFsResult {
    fn points_to(&self, node: PSNodeId) -> BitPointsToSet {
        self.points_to.get(&node).cloned().unwrap_or_default()
    }
}

/// Runs the flow-sensitive solver to a fixpoint (or until `max_iterations`
/// node-processing steps have been spent, at which point any node still on
/// the worklist is conservatively widened to `UNKNOWN`, per spec §7).
///
/// `track_invalidation` selects `PointerAnalysisFS+Inv` (spec §9's "free
/// semantics on weak updates" open question): `FREE`/`INVALIDATE_*` become
/// memory-changing operations that actually invalidate memory, rather than
/// no-ops.
pub fn solve(graph: &mut PointerGraph, track_invalidation: bool, max_iterations: u32) -> PointerAnalysisFsResult {
    compute_loop_info(graph);

    let all_nodes = graph.live_node_ids();
    let mut worklist: VecDeque<PSNodeId> = all_nodes.iter().copied().collect();
    let mut queued: HashSet<PSNodeId> = all_nodes.iter().copied().collect();

    let mut iterations: u32 = 0;
    let mut widened = false;

    while let Some(node_id) = worklist.pop_front() {
        queued.remove(&node_id);
        iterations += 1;
        if iterations > max_iterations {
            if !widened {
                diagnostics::widen_to_unknown("pointer_analysis_fs", "iteration cap exceeded");
                widened = true;
            }
            widen_remaining(graph, node_id);
            continue;
        }

        before_processed(graph, node_id);
        let pts_changed = apply_transfer(graph, node_id, track_invalidation);
        let mm_changed = after_processed(graph, node_id, track_invalidation);

        if pts_changed || mm_changed {
            let successors = graph.node(node_id).map(|n| n.successors.clone()).unwrap_or_default();
            for succ in successors {
                if queued.insert(succ) {
                    worklist.push_back(succ);
                }
            }
            requeue_special_successors(graph, node_id, &mut worklist, &mut queued);
        }
    }

    let points_to = all_nodes
        .iter()
        .filter_map(|&id| graph.node(id).map(|n| (id, n.points_to.clone())))
        .collect();

    PointerAnalysisFsResult { points_to }
}

/// `beforeProcessed`: ensure `node` has a memory map to read/write
/// (spec §4.2). Owning nodes get a fresh-or-retained owned map seeded from
/// the union of predecessor maps; sharing nodes alias their sole
/// predecessor.
fn before_processed(graph: &mut PointerGraph, node_id: PSNodeId) {
    let (needs_merge, preds) = match graph.node(node_id) {
        Some(n) => (n.needs_merge(false), n.predecessors.clone()),
        None => return,
    };
    // track_invalidation widens which kinds "need merge"; re-check with it.
    let needs_merge = needs_merge || graph.node(node_id).map(|n| n.changes_memory(true)).unwrap_or(false);

    if needs_merge {
        let mut merged = MemoryMap::new();
        for p in &preds {
            if let Some(pred_mm) = graph.memory_map(*p) {
                merged.merge_from(pred_mm);
            }
        }
        let owned = graph.memory_map_mut_owned(node_id);
        *owned = merged;
    } else if let Some(&sole) = preds.first() {
        graph.alias_memory_map(node_id, sole);
    } else {
        // Root with no predecessors and not flagged as needing merge
        // cannot happen (needs_merge is true whenever predecessors.len() != 1),
        // but guard defensively.
        graph.memory_map_mut_owned(node_id);
    }
}

/// The semantic effect of processing `node_id` on its own `points_to` set
/// (spec §4.2's table, "Effect on ptsTo(self)" column). Returns whether
/// `points_to` changed.
fn apply_transfer(graph: &mut PointerGraph, node_id: PSNodeId, track_invalidation: bool) -> bool {
    let kind = match graph.node(node_id) {
        Some(n) => n.kind,
        None => return false,
    };

    let new_pts = match kind {
        PSNodeKind::Alloc | PSNodeKind::Global => {
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
        PSNodeKind::Cast => operand_pts(graph, node_id, subject_of(graph, node_id)),
        PSNodeKind::Phi => {
            let mut s = BitPointsToSet::default();
            let operands = graph.node(node_id).map(|n| n.operands.clone()).unwrap_or_default();
            for op in operands {
                s.union_with(&graph.node(op).map(|n| n.points_to.clone()).unwrap_or_default());
            }
            s
        }
        PSNodeKind::Gep => gep_transfer(graph, node_id),
        PSNodeKind::Load => load_transfer(graph, node_id),
        PSNodeKind::Return => operand_pts(graph, node_id, subject_of(graph, node_id)),
        PSNodeKind::CallReturn => call_return_transfer(graph, node_id),
        PSNodeKind::Function => {
            let mut s = BitPointsToSet::default();
            s.insert(Pointer::new(loc_of(node_id), Offset::new(0)));
            s
        }
        // Action nodes with no pointer value of their own.
        PSNodeKind::Store
        | PSNodeKind::Memcpy
        | PSNodeKind::Free
        | PSNodeKind::InvalidateLocals
        | PSNodeKind::InvalidateObject
        | PSNodeKind::CallFuncPtr
        | PSNodeKind::Call
        | PSNodeKind::Entry
        | PSNodeKind::Noop
        | PSNodeKind::Fork
        | PSNodeKind::Join => BitPointsToSet::default(),
    };

    let _ = track_invalidation;
    let old = graph.node(node_id).map(|n| n.points_to.clone()).unwrap_or_default();
    let changed = new_pts.len() != old.len() || new_pts.iter().any(|p| !old.contains(p));
    if changed {
        if let Some(n) = graph.node_mut(node_id) {
            n.points_to = new_pts;
        }
    }
    changed
}

fn subject_of(graph: &PointerGraph, node_id: PSNodeId) -> Option<PSNodeId> {
    graph.node(node_id).and_then(|n| n.data.subject)
}

fn operand_pts(graph: &PointerGraph, node_id: PSNodeId, subject: Option<PSNodeId>) -> BitPointsToSet {
    subject
        .or_else(|| graph.node(node_id).and_then(|n| n.operands.first().copied()))
        .and_then(|op| graph.node(op))
        .map(|n| n.points_to.clone())
        .unwrap_or_default()
}

fn gep_transfer(graph: &mut PointerGraph, node_id: PSNodeId) -> BitPointsToSet {
    let (base, off) = match graph.node(node_id) {
        Some(n) => (n.data.subject, n.data.gep_offset),
        None => return BitPointsToSet::default(),
    };
    let base_pts = operand_pts(graph, node_id, base);
    let mut out = BitPointsToSet::default();
    for p in base_pts.iter() {
        let new_offset = match (p.offset.value(), off.value()) {
            (Some(o), Some(d)) => {
                let sum = o.checked_add(d);
                match sum {
                    Some(v) => match exceeds_declared_size(graph, p.location, v) {
                        true => {
                            diagnostics::widen_to_unknown("gep", "offset exceeds declared size");
                            Offset::UNKNOWN
                        }
                        false => Offset::new(v),
                    },
                    None => Offset::UNKNOWN,
                }
            }
            _ => Offset::UNKNOWN,
        };
        out.insert(Pointer::new(p.location, new_offset));
    }
    out
}

fn exceeds_declared_size(graph: &PointerGraph, location: LocationId, offset: u64) -> bool {
    graph
        .node(PSNodeId(location.0))
        .and_then(|n| n.data.alloc_size)
        .map(|size| offset >= size)
        .unwrap_or(false)
}

fn load_transfer(graph: &mut PointerGraph, node_id: PSNodeId) -> BitPointsToSet {
    let subject = subject_of(graph, node_id);
    let width = graph.node(node_id).map(|n| n.data.access_width).unwrap_or(Offset::UNKNOWN);
    let base_pts = operand_pts(graph, node_id, subject);

    let mut out = BitPointsToSet::default();
    let mm = graph.memory_map(node_id).cloned().unwrap_or_default();
    for p in base_pts.iter() {
        let interval = Interval::from_offset_len(p.offset, width);
        for v in mm.load(p.location, interval) {
            out.insert(v);
        }
        if !mm.uncovered(p.location, interval).is_empty() {
            diagnostics::widen_to_unknown("load", "incomplete memory-map coverage");
            out.insert(Pointer::unknown(p.location));
        }
    }
    out
}

fn call_return_transfer(graph: &PointerGraph, node_id: PSNodeId) -> BitPointsToSet {
    let preds = graph.node(node_id).map(|n| n.predecessors.clone()).unwrap_or_default();
    let mut out = BitPointsToSet::default();
    for p in preds {
        if graph.node(p).map(|n| n.kind) == Some(PSNodeKind::Return) {
            out.union_with(&graph.node(p).map(|n| n.points_to.clone()).unwrap_or_default());
        }
    }
    out
}

/// `afterProcessed`'s memory-map mutation: the effect of `STORE`, `MEMCPY`,
/// `FREE`, `INVALIDATE_*` on the node's (now owned) memory map. Returns
/// whether the map changed.
fn after_processed(graph: &mut PointerGraph, node_id: PSNodeId, track_invalidation: bool) -> bool {
    let kind = match graph.node(node_id) {
        Some(n) => n.kind,
        None => return false,
    };

    match kind {
        PSNodeKind::Store => store_effect(graph, node_id),
        PSNodeKind::Memcpy => memcpy_effect(graph, node_id),
        PSNodeKind::Free if track_invalidation => free_effect(graph, node_id),
        PSNodeKind::InvalidateObject if track_invalidation => invalidate_object_effect(graph, node_id),
        PSNodeKind::InvalidateLocals if track_invalidation => invalidate_locals_effect(graph, node_id),
        PSNodeKind::CallFuncPtr => call_funcptr_effect(graph, node_id),
        _ => false,
    }
}

/// Spec §4.2's "Call-graph discovery": for every function `F` the
/// `CALL_FUNCPTR`'s operand may point to, wire `F`'s subgraph into the
/// call graph and the CFG if this is the first time `F` has been observed
/// at this call site, then re-trigger loop computation (a newly connected
/// callee can turn a previously loop-free allocation into one reached
/// through recursion).
fn call_funcptr_effect(graph: &mut PointerGraph, node_id: PSNodeId) -> bool {
    let subject = subject_of(graph, node_id);
    let pts = operand_pts(graph, node_id, subject);

    let mut newly_connected = false;
    for p in pts.iter() {
        let function_node = PSNodeId(p.location.0);
        if let Some(entry) = graph.function_entry(function_node) {
            match graph.connect_call_site(node_id, entry) {
                Ok(true) => newly_connected = true,
                Ok(false) => {}
                Err(_) => {
                    diagnostics::widen_to_unknown("call_funcptr", "failed to connect call site");
                }
            }
        }
    }
    if newly_connected {
        compute_loop_info(graph);
    }
    newly_connected
}

fn store_effect(graph: &mut PointerGraph, node_id: PSNodeId) -> bool {
    let (dest_subject, value_operand, width) = match graph.node(node_id) {
        Some(n) => (n.data.subject, n.operands.first().copied(), n.data.access_width),
        None => return false,
    };
    let dest_pts = operand_pts(graph, node_id, dest_subject);
    let value_pts = value_operand
        .and_then(|op| graph.node(op))
        .map(|n| n.points_to.iter())
        .unwrap_or_default();

    let strong = is_strong_update_target(graph, &dest_pts);

    let mut changed = false;
    let owner = node_id;
    for p in dest_pts.iter() {
        let interval = Interval::from_offset_len(p.offset, width);
        let mm = graph.memory_map_mut_owned(owner);
        changed |= mm.store(p.location, interval, value_pts.iter().copied(), strong);
    }
    if strong {
        diagnostics::strong_update("store", &format!("{node_id}"));
    } else {
        diagnostics::weak_update("store", &format!("{node_id}"));
    }
    changed
}

/// Spec §4.2's strong-update discipline: singleton, concrete offset,
/// non-sentinel target, not on a loop.
fn is_strong_update_target(graph: &PointerGraph, dest_pts: &BitPointsToSet) -> bool {
    if dest_pts.len() != 1 {
        return false;
    }
    let p = dest_pts.iter()[0];
    if p.offset.is_unknown() {
        return false;
    }
    if p.location == graph.singletons.null_location()
        || p.location == graph.singletons.unknown_memory_location()
        || p.location == graph.singletons.invalidated_location()
    {
        return false;
    }
    !is_on_loop(graph, p.location)
}

fn is_on_loop(graph: &PointerGraph, location: LocationId) -> bool {
    let node_id = PSNodeId(location.0);
    for sg in owning_subgraphs(graph) {
        if let Some(sg) = graph.subgraph(sg) {
            if sg.nodes.contains(&node_id) && sg.loops_computed() {
                return sg.is_on_loop(node_id);
            }
        }
    }
    false
}

fn owning_subgraphs(graph: &PointerGraph) -> Vec<PSNodeId> {
    // Subgraph roots are tracked externally via PointerGraph::subgraph();
    // PointerGraph does not expose an iterator, so `compute_loop_info`
    // records roots it has already visited in a side table instead. This
    // helper is only reachable after `compute_loop_info` has run, which
    // stashes roots there.
    graph.known_subgraph_roots()
}

/// Spec §4.2's MEMCPY row: "copy memory-map entries, clipped to len;
/// respect zero-initialized source (yields NULL for uncovered bytes)".
/// Each covered sub-range of the source is copied at its own shifted
/// offset rather than flattened into one union over the whole destination
/// range, so field sensitivity survives a memcpy of a pointer table (spec
/// §8.2 scenario 4) even when more than one distinct pointer is copied.
fn memcpy_effect(graph: &mut PointerGraph, node_id: PSNodeId) -> bool {
    let (dst_subject, src_operand, len) = match graph.node(node_id) {
        Some(n) => (n.data.subject, n.operands.first().copied(), n.data.memcpy_len),
        None => return false,
    };
    let dst_pts = operand_pts(graph, node_id, dst_subject);
    let src_pts = src_operand
        .and_then(|op| graph.node(op))
        .map(|n| n.points_to.iter())
        .unwrap_or_default();
    let null = Pointer::new(graph.singletons.null_location(), Offset::new(0));

    let mut changed = false;
    for d in dst_pts.iter() {
        let dest_interval = Interval::from_offset_len(d.offset, len);
        for s in &src_pts {
            let src_interval = Interval::from_offset_len(s.offset, len);
            let mm_snapshot = graph.memory_map(node_id).cloned().unwrap_or_default();

            if s.offset.is_unknown() || d.offset.is_unknown() {
                // Symbolic base offset on either side: a byte-range shift
                // is not representable, so fall back to the flattened
                // whole-range copy (still widened to NULL where the source
                // has no recorded write at all).
                let copied = mm_snapshot.load(s.location, src_interval);
                let mm = graph.memory_map_mut_owned(node_id);
                changed |= mm.store(d.location, dest_interval, copied, false);
                if !mm_snapshot.uncovered(s.location, src_interval).is_empty() {
                    let mm = graph.memory_map_mut_owned(node_id);
                    changed |= mm.store(d.location, dest_interval, std::iter::once(null), false);
                }
                continue;
            }

            for (src_range, values) in mm_snapshot.load_ranges(s.location, src_interval) {
                if let Some(shifted) = shift_interval(src_range, s.offset, d.offset) {
                    let mm = graph.memory_map_mut_owned(node_id);
                    changed |= mm.store(d.location, shifted, values, false);
                }
            }
            for gap in mm_snapshot.uncovered(s.location, src_interval) {
                if let Some(shifted) = shift_interval(gap, s.offset, d.offset) {
                    let mm = graph.memory_map_mut_owned(node_id);
                    changed |= mm.store(d.location, shifted, std::iter::once(null), false);
                }
            }
        }
    }
    changed
}

/// Shifts a sub-interval of the source range (itself anchored at
/// `src_offset`) to the corresponding sub-interval of the destination range
/// anchored at `dst_offset`. `None` if either anchor is `UNKNOWN` (callers
/// are expected to have already taken the flattened fallback path in that
/// case).
fn shift_interval(range: Interval, src_offset: Offset, dst_offset: Offset) -> Option<Interval> {
    let src_o = src_offset.value()? as i128;
    let dst_o = dst_offset.value()? as i128;
    let delta = dst_o - src_o;
    let start = range.start.value()? as i128;
    let new_start = Offset::new((start + delta).max(0) as u64);
    let new_end = match range.end.value() {
        Some(end) => Offset::new(((end as i128) + delta).max(0) as u64),
        None => Offset::UNKNOWN,
    };
    Some(Interval::new(new_start, new_end))
}

fn free_effect(graph: &mut PointerGraph, node_id: PSNodeId) -> bool {
    let subject = subject_of(graph, node_id);
    let pts = operand_pts(graph, node_id, subject);
    let strong = is_strong_update_target(graph, &pts);
    let invalidated = Pointer::new(graph.singletons.invalidated_location(), Offset::new(0));
    let mut changed = false;
    for p in pts.iter() {
        let mm = graph.memory_map_mut_owned(node_id);
        changed |= mm.invalidate_references_to(p.location, invalidated, strong);
    }
    changed
}

fn invalidate_object_effect(graph: &mut PointerGraph, node_id: PSNodeId) -> bool {
    let subject = subject_of(graph, node_id);
    let pts = operand_pts(graph, node_id, subject);
    let invalidated = Pointer::new(graph.singletons.invalidated_location(), Offset::new(0));
    let mut changed = false;
    for p in pts.iter() {
        let mm = graph.memory_map_mut_owned(node_id);
        // spec §4.2: INVALIDATE_OBJECT is "like FREE but unconditional" -> always strong.
        changed |= mm.invalidate_references_to(p.location, invalidated, true);
    }
    changed
}

/// Spec §4.2's `INVALIDATE_LOCALS` row: "replace every pointer to a local of
/// the current procedure by `INVALIDATED`" — unconditional, like
/// `INVALIDATE_OBJECT`, but scoped to every `ALLOC` belonging to `node_id`'s
/// own [`PointerSubgraph`] rather than to a single operand's points-to set.
fn invalidate_locals_effect(graph: &mut PointerGraph, node_id: PSNodeId) -> bool {
    let invalidated = Pointer::new(graph.singletons.invalidated_location(), Offset::new(0));
    let mut changed = false;
    for local in locals_of_owning_subgraph(graph, node_id) {
        let mm = graph.memory_map_mut_owned(node_id);
        changed |= mm.invalidate_references_to(local, invalidated, true);
    }
    changed
}

/// Every `ALLOC` node belonging to the [`PointerSubgraph`](crate::features::pointer_graph::domain::PointerSubgraph)
/// that owns `node_id`, as abstract memory locations — the "locals of the
/// current procedure" `INVALIDATE_LOCALS` invalidates.
fn locals_of_owning_subgraph(graph: &PointerGraph, node_id: PSNodeId) -> Vec<LocationId> {
    for root in owning_subgraphs(graph) {
        let Some(sg) = graph.subgraph(root) else { continue };
        if !sg.nodes.contains(&node_id) {
            continue;
        }
        return sg
            .nodes
            .iter()
            .filter(|&&n| graph.node(n).map(|nd| nd.kind) == Some(PSNodeKind::Alloc))
            .map(|&n| loc_of(n))
            .collect();
    }
    Vec::new()
}

fn requeue_special_successors(
    graph: &PointerGraph,
    node_id: PSNodeId,
    worklist: &mut VecDeque<PSNodeId>,
    queued: &mut HashSet<PSNodeId>,
) {
    let kind = graph.node(node_id).map(|n| n.kind);
    match kind {
        Some(PSNodeKind::Entry) => {
            // All callers of this subgraph's entry re-check their CALL_RETURN.
            for caller in graph.call_graph.callers(&node_id) {
                if queued.insert(caller) {
                    worklist.push_back(caller);
                }
            }
        }
        Some(PSNodeKind::Return) => {
            for succ in graph.node(node_id).map(|n| n.successors.clone()).unwrap_or_default() {
                if graph.node(succ).map(|n| n.kind) == Some(PSNodeKind::CallReturn) && queued.insert(succ) {
                    worklist.push_back(succ);
                }
            }
        }
        // A newly connected indirect call site may have just gained a CFG
        // edge from the callee's return node(s) to its paired CALL_RETURN
        // (`PointerGraph::connect_call_site`); that CALL_RETURN must
        // re-merge even though its own state hasn't changed yet.
        Some(PSNodeKind::CallFuncPtr) => {
            if let Some(paired) = graph.node(node_id).and_then(|n| n.data.paired_node) {
                if queued.insert(paired) {
                    worklist.push_back(paired);
                }
            }
        }
        _ => {}
    }
}

fn widen_remaining(graph: &mut PointerGraph, node_id: PSNodeId) {
    if let Some(n) = graph.node_mut(node_id) {
        n.points_to.insert(Pointer::unknown(LocationId(n.id.0)));
    }
}

fn compute_loop_info(graph: &mut PointerGraph) {
    let roots = graph.known_subgraph_roots();
    for root in roots {
        let node_ids = match graph.subgraph(root) {
            Some(sg) => sg.nodes.clone(),
            None => continue,
        };
        let on_loop = detect_loop_nodes(&node_ids, |n| {
            graph.node(n).map(|node| node.successors.clone()).unwrap_or_default()
        });
        if let Some(sg) = graph.subgraph_mut(root) {
            sg.set_loop_nodes(on_loop);
        }
    }
}
