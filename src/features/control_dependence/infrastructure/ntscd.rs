//! The NTSCD solver (spec §4.5), grounded directly in
//! `examples/original_source/lib/llvm/ControlDependence/legacy/NTSCD.cpp`:
//! the same "paint a node's predecessors red as their out-degree counters
//! hit zero" fixpoint, re-architected as an explicit worklist instead of
//! `visitInitialNode`/`visit`'s mutual recursion (no unbounded recursion
//! depth on deep predecessor chains).

use crate::features::control_dependence::domain::{BlockGraph, CDFunction};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::hash::Hash;

/// `b` is control-dependent on `x` iff some-but-not-all of `x`'s
/// successors can reach `b` without passing through `x` again (spec
/// §4.5's red/non-red successor split). Stored as `b -> {x, ...}`.
#[derive(Debug, Clone, Default)]
pub struct ControlDependence<K: Eq + Hash + Clone> {
    dependencies: FxHashMap<K, FxHashSet<K>>,
}

impl<K: Eq + Hash + Clone> ControlDependence<K> {
    /// The blocks `block` is control-dependent on (spec §6.1's
    /// `getDependencies(block)`). Empty if `block` is control-dependent on
    /// nothing (e.g. it post-dominates the entry).
    pub fn dependencies(&self, block: &K) -> FxHashSet<K> {
        self.dependencies.get(block).cloned().unwrap_or_default()
    }

    fn add(&mut self, dependent: K, on: K) {
        self.dependencies.entry(dependent).or_default().insert(on);
    }
}

/// Runs NTSCD over every function in `functions` (spec §6.1's
/// `compute(function?)`, run eagerly for the whole program here since this
/// crate has no on-demand mode). `interprocedural` gates the second pass
/// (spec §4.5's call/join extension); intraprocedural-only analyses (a
/// single function body, or a `Fast` preset run) can skip it.
pub fn compute<K: Eq + Hash + Clone>(
    graph: &BlockGraph<K>,
    functions: &[CDFunction<K>],
    interprocedural: bool,
) -> ControlDependence<K> {
    let mut cd = ControlDependence::default();
    for function in functions {
        compute_intraprocedural(graph, function, &mut cd);
    }
    if interprocedural {
        let exits_by_entry: FxHashMap<K, Vec<K>> =
            functions.iter().map(|f| (f.entry.clone(), f.exits.clone())).collect();
        for function in functions {
            compute_interprocedural(graph, function, &exits_by_entry, &mut cd);
        }
    }
    cd
}

/// Spec §4.5 steps 1-4, run once per block `b` of `function`
/// (`computeIntraprocDependencies`/`visitInitialNode` in the original).
fn compute_intraprocedural<K: Eq + Hash + Clone>(
    graph: &BlockGraph<K>,
    function: &CDFunction<K>,
    cd: &mut ControlDependence<K>,
) {
    for b in &function.blocks {
        // out_degree[x] counts x's successors not yet proven to reach `b`;
        // it reaches zero exactly when every path out of x passes through
        // `b`, at which point x is painted red.
        let mut out_degree: FxHashMap<K, usize> = function
            .blocks
            .iter()
            .map(|x| (x.clone(), graph.successors(x).len()))
            .collect();
        let mut red: FxHashSet<K> = FxHashSet::default();
        red.insert(b.clone());

        let mut worklist: VecDeque<K> = graph.predecessors(b).iter().cloned().collect();
        while let Some(x) = worklist.pop_front() {
            let Some(count) = out_degree.get_mut(&x) else { continue };
            if *count == 0 {
                continue;
            }
            *count -= 1;
            if *count == 0 {
                red.insert(x.clone());
                for pred in graph.predecessors(&x) {
                    worklist.push_back(pred.clone());
                }
            }
        }

        for x in &function.blocks {
            let succs = graph.successors(x);
            if succs.is_empty() {
                continue;
            }
            let red_count = succs.iter().filter(|s| red.contains(*s)).count();
            if red_count > 0 && red_count < succs.len() {
                cd.add(b.clone(), x.clone());
            }
        }
    }
}

/// Spec §4.5's interprocedural extension (`computeInterprocDependencies`):
/// a call-return block depends on every exit block of whatever it may
/// call or join, and every block reachable from a call-return block
/// inside its own procedure is (transitively) control-dependent on it.
fn compute_interprocedural<K: Eq + Hash + Clone>(
    graph: &BlockGraph<K>,
    function: &CDFunction<K>,
    exits_by_entry: &FxHashMap<K, Vec<K>>,
    cd: &mut ControlDependence<K>,
) {
    for b in &function.blocks {
        if !graph.has_callees_or_joins(b) {
            continue;
        }
        let Some(call_return) = graph.successors(b).iter().find(|s| graph.is_call_return(s)) else {
            continue;
        };
        for callee_entry in graph.callees(b).iter().chain(graph.joins(b).iter()) {
            if let Some(exits) = exits_by_entry.get(callee_entry) {
                for exit in exits {
                    cd.add(call_return.clone(), exit.clone());
                }
            }
        }
    }

    for cr in &function.call_return_blocks {
        let mut visited: FxHashSet<K> = FxHashSet::default();
        visited.insert(cr.clone());
        let mut worklist: VecDeque<K> = VecDeque::new();
        for s in graph.successors(cr) {
            if visited.insert(s.clone()) {
                worklist.push_back(s.clone());
            }
        }
        while let Some(cur) = worklist.pop_front() {
            cd.add(cur.clone(), cr.clone());
            for s in graph.successors(&cur) {
                if visited.insert(s.clone()) {
                    worklist.push_back(s.clone());
                }
            }
        }
    }
}
