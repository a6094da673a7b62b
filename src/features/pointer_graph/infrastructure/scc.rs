//! Loop detection via strongly-connected components (spec §4.2: "Each
//! subgraph computes SCCs of its PSNodes on demand; nodes with SCC size >1,
//! or size-1 SCCs with a self-loop, are flagged as on-loop").
//!
//! Grounded directly on the Tarjan implementation in
//! `examples/josongsong-semantica-codegraph/features/points_to/infrastructure/scc_detector.rs`,
//! adapted from its `u32`-keyed constraint-variable graph to `PSNodeId`-keyed
//! CFG edges.

use crate::features::pointer_graph::domain::PSNodeId;
use rustc_hash::{FxHashMap, FxHashSet};

/// The set of node ids that are "on loop": members of a non-trivial SCC, or
/// a singleton SCC with a self-loop edge.
pub fn detect_loop_nodes(nodes: &[PSNodeId], successors: impl Fn(PSNodeId) -> Vec<PSNodeId>) -> FxHashSet<PSNodeId> {
    let mut self_loops: FxHashSet<PSNodeId> = FxHashSet::default();
    for &n in nodes {
        if successors(n).contains(&n) {
            self_loops.insert(n);
        }
    }

    let sccs = tarjan_scc(nodes, &successors);

    let mut on_loop = FxHashSet::default();
    for scc in sccs {
        let is_cycle = scc.len() > 1 || (scc.len() == 1 && self_loops.contains(&scc[0]));
        if is_cycle {
            on_loop.extend(scc);
        }
    }
    on_loop
}

fn tarjan_scc(
    nodes: &[PSNodeId],
    successors: &impl Fn(PSNodeId) -> Vec<PSNodeId>,
) -> Vec<Vec<PSNodeId>> {
    struct State {
        index: FxHashMap<PSNodeId, u32>,
        lowlink: FxHashMap<PSNodeId, u32>,
        on_stack: FxHashSet<PSNodeId>,
        stack: Vec<PSNodeId>,
        next_index: u32,
        sccs: Vec<Vec<PSNodeId>>,
    }

    fn strongconnect(
        v: PSNodeId,
        state: &mut State,
        successors: &impl Fn(PSNodeId) -> Vec<PSNodeId>,
    ) {
        state.index.insert(v, state.next_index);
        state.lowlink.insert(v, state.next_index);
        state.next_index += 1;
        state.stack.push(v);
        state.on_stack.insert(v);

        for w in successors(v) {
            if !state.index.contains_key(&w) {
                strongconnect(w, state, successors);
                let w_low = state.lowlink[&w];
                let v_low = state.lowlink[&v];
                state.lowlink.insert(v, v_low.min(w_low));
            } else if state.on_stack.contains(&w) {
                let w_idx = state.index[&w];
                let v_low = state.lowlink[&v];
                state.lowlink.insert(v, v_low.min(w_idx));
            }
        }

        if state.lowlink[&v] == state.index[&v] {
            let mut component = Vec::new();
            loop {
                let w = state.stack.pop().unwrap();
                state.on_stack.remove(&w);
                component.push(w);
                if w == v {
                    break;
                }
            }
            state.sccs.push(component);
        }
    }

    let mut state = State {
        index: FxHashMap::default(),
        lowlink: FxHashMap::default(),
        on_stack: FxHashSet::default(),
        stack: Vec::new(),
        next_index: 0,
        sccs: Vec::new(),
    };

    for &n in nodes {
        if !state.index.contains_key(&n) {
            strongconnect(n, &mut state, successors);
        }
    }

    state.sccs
}
