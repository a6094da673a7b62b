//! `DefinitionsMap<Node>` (spec §4.4): "for memory object `target` over
//! bytes `[a,b]`, the set of RWNodes that wrote last." A thin wrapper over a
//! per-target [`DisjunctiveIntervalMap`], grounded directly in
//! `original_source`'s `DefinitionsMap<NodeT>` (`ADT::DisjunctiveIntervalMap<
//! NodeT*>` keyed by memory object).

use crate::features::read_write_graph::RWNodeId;
use crate::shared::{DisjunctiveIntervalMap, Interval, LocationId};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionsMap {
    by_target: FxHashMap<LocationId, DisjunctiveIntervalMap<RWNodeId>>,
}

impl DefinitionsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weak update: unions `writer` into `[target, interval]` without
    /// displacing whatever was already recorded there.
    pub fn add(&mut self, target: LocationId, interval: Interval, writer: RWNodeId) -> bool {
        self.by_target.entry(target).or_default().add(interval, writer)
    }

    /// Strong (must-def) update: replaces the writer set at
    /// `[target, interval]` with `{writer}` (spec §4.4's transfer function,
    /// step 2).
    pub fn update(&mut self, target: LocationId, interval: Interval, writer: RWNodeId) -> bool {
        self.by_target.entry(target).or_default().update(interval, writer)
    }

    pub fn gather(&self, target: LocationId, interval: Interval) -> rustc_hash::FxHashSet<RWNodeId> {
        match self.by_target.get(&target) {
            Some(dim) => dim.gather(interval),
            None => rustc_hash::FxHashSet::default(),
        }
    }

    pub fn uncovered(&self, target: LocationId, interval: Interval) -> Vec<Interval> {
        match self.by_target.get(&target) {
            Some(dim) => dim.uncovered(interval),
            None => vec![interval],
        }
    }

    /// Pointwise union of `self` with `other` (spec §4.4 step 1's `merge`).
    /// Returns whether `self` changed.
    pub fn merge_from(&mut self, other: &DefinitionsMap) -> bool {
        let mut changed = false;
        for (target, dim) in &other.by_target {
            let mine = self.by_target.entry(*target).or_default();
            for (interval, writers) in dim.iter() {
                changed |= mine.add_values(*interval, writers.iter().copied());
            }
        }
        changed
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Offset;

    #[test]
    fn disjoint_ranges_both_reach_an_overlapping_query() {
        let mut dm = DefinitionsMap::new();
        let target = LocationId(0);
        dm.add(target, Interval::new(Offset::new(0), Offset::new(3)), RWNodeId(1));
        dm.add(target, Interval::new(Offset::new(4), Offset::new(7)), RWNodeId(2));

        let got = dm.gather(target, Interval::new(Offset::new(3), Offset::new(4)));
        assert_eq!(got, [RWNodeId(1), RWNodeId(2)].into_iter().collect());
    }

    #[test]
    fn strong_update_replaces_prior_writers() {
        let mut dm = DefinitionsMap::new();
        let target = LocationId(0);
        dm.add(target, Interval::single(Offset::new(0)), RWNodeId(1));
        dm.update(target, Interval::single(Offset::new(0)), RWNodeId(2));
        assert_eq!(
            dm.gather(target, Interval::single(Offset::new(0))),
            [RWNodeId(2)].into_iter().collect()
        );
    }

    #[test]
    fn merge_unions_distinct_targets() {
        let mut a = DefinitionsMap::new();
        a.add(LocationId(0), Interval::single(Offset::new(0)), RWNodeId(1));
        let mut b = DefinitionsMap::new();
        b.add(LocationId(1), Interval::single(Offset::new(0)), RWNodeId(2));
        assert!(a.merge_from(&b));
        assert_eq!(
            a.gather(LocationId(1), Interval::single(Offset::new(0))),
            [RWNodeId(2)].into_iter().collect()
        );
    }
}
