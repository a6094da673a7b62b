//! `ReachingDefinitionsAnalysis` (spec §4.4, §6.1): a worklist fixpoint over
//! `in(n)`/`out(n)` [`DefinitionsMap`]s, one pair per [`RWNode`].

use crate::features::read_write_graph::{ReadWriteGraph, RWNodeId};
use crate::features::reaching_definitions::domain::DefinitionsMap;
use crate::shared::Interval;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// A reserved id standing for "this byte range may have been written before
/// the analyzed program started, or by code outside the analyzed module"
/// (spec §4.4's query-time sentinel for `uncovered` sub-intervals of a use).
pub const EXTERNAL_OR_INITIAL: RWNodeId = RWNodeId(u32::MAX);

pub struct ReachingDefinitionsAnalysis {
    in_maps: FxHashMap<RWNodeId, DefinitionsMap>,
    out_maps: FxHashMap<RWNodeId, DefinitionsMap>,
}

impl ReachingDefinitionsAnalysis {
    pub fn new() -> Self {
        ReachingDefinitionsAnalysis {
            in_maps: FxHashMap::default(),
            out_maps: FxHashMap::default(),
        }
    }

    /// Runs the fixpoint to completion (spec §4.4's monotone lattice
    /// guarantees termination: finite target set × disjunctive partition ×
    /// finite RWNode set).
    pub fn run(&mut self, rwg: &ReadWriteGraph, all_nodes: &[RWNodeId]) {
        let mut worklist: VecDeque<RWNodeId> = all_nodes.iter().copied().collect();
        let mut queued: FxHashSet<RWNodeId> = all_nodes.iter().copied().collect();

        while let Some(id) = worklist.pop_front() {
            queued.remove(&id);
            let node = match rwg.node(id) {
                Some(n) => n,
                None => continue,
            };

            let mut merged = DefinitionsMap::new();
            for &pred in &node.predecessors {
                if let Some(out) = self.out_maps.get(&pred) {
                    merged.merge_from(out);
                }
            }
            self.in_maps.insert(id, merged.clone());

            let mut out = merged;
            for def in &node.def_sites {
                let interval = Interval::from_offset_len(def.offset, def.len);
                let must_def = def.offset.value().is_some() && def.len.value().is_some();
                if must_def {
                    out.update(def.target, interval, id);
                } else {
                    out.add(def.target, interval, id);
                }
            }

            let changed = self.out_maps.get(&id).map(|prev| prev != &out).unwrap_or(true);

            if changed {
                self.out_maps.insert(id, out);
                for &succ in &node.successors {
                    if queued.insert(succ) {
                        worklist.push_back(succ);
                    }
                }
            }
        }
    }

    /// `getReachingDefinitions(n, useSite u)`: `in(n).gather(u)`, plus the
    /// [`EXTERNAL_OR_INITIAL`] sentinel for any uncovered sub-range (spec
    /// §4.4's query contract).
    pub fn reaching_definitions_at(&self, node: RWNodeId, use_site: crate::features::read_write_graph::UseSite) -> FxHashSet<RWNodeId> {
        let in_map = match self.in_maps.get(&node) {
            Some(m) => m,
            None => return [EXTERNAL_OR_INITIAL].into_iter().collect(),
        };
        let interval = Interval::from_offset_len(use_site.offset, use_site.len);
        let mut out = in_map.gather(use_site.target, interval);
        if !in_map.uncovered(use_site.target, interval).is_empty() {
            out.insert(EXTERNAL_OR_INITIAL);
        }
        out
    }

    /// The union of reaching definitions over every use-site of `node`
    /// (spec §6.1's unparameterized `getReachingDefinitions(node)`
    /// overload).
    pub fn reaching_definitions(&self, rwg: &ReadWriteGraph, node: RWNodeId) -> FxHashSet<RWNodeId> {
        let mut out = FxHashSet::default();
        if let Some(n) = rwg.node(node) {
            for use_site in &n.use_sites {
                out.extend(self.reaching_definitions_at(node, *use_site));
            }
        }
        out
    }
}

impl Default for ReachingDefinitionsAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::read_write_graph::{DefSite, RWNodeKind, UseSite};
    use crate::shared::{LocationId, Offset};

    #[test]
    fn reaching_defs_over_disjoint_ranges() {
        let mut rwg = ReadWriteGraph::new(LocationId(u32::MAX));
        let target = LocationId(0);

        let s1 = rwg.create_node(RWNodeKind::Store);
        rwg.node_mut(s1).unwrap().def_sites.push(DefSite::new(target, Offset::new(0), Offset::new(4)));
        let s2 = rwg.create_node(RWNodeKind::Store);
        rwg.node_mut(s2).unwrap().def_sites.push(DefSite::new(target, Offset::new(4), Offset::new(4)));
        let u = rwg.create_node(RWNodeKind::Load);
        rwg.node_mut(u).unwrap().use_sites.push(UseSite::new(target, Offset::new(3), Offset::new(2)));

        rwg.add_cfg_edge(s1, s2).unwrap();
        rwg.add_cfg_edge(s2, u).unwrap();

        let mut rda = ReachingDefinitionsAnalysis::new();
        rda.run(&rwg, &[s1, s2, u]);

        let got = rda.reaching_definitions(&rwg, u);
        assert_eq!(got, [s1, s2].into_iter().collect());
    }

    #[test]
    fn uncovered_use_yields_external_sentinel() {
        let mut rwg = ReadWriteGraph::new(LocationId(u32::MAX));
        let target = LocationId(0);
        let u = rwg.create_node(RWNodeKind::Load);
        rwg.node_mut(u).unwrap().use_sites.push(UseSite::new(target, Offset::new(0), Offset::new(4)));

        let mut rda = ReachingDefinitionsAnalysis::new();
        rda.run(&rwg, &[u]);

        let got = rda.reaching_definitions(&rwg, u);
        assert!(got.contains(&EXTERNAL_OR_INITIAL));
    }
}
