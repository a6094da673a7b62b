//! The per-node memory map `MM: target -> DisjunctiveIntervalMap<offset,
//! PointsToSet>` of spec §4.2. Reuses the same
//! [`DisjunctiveIntervalMap`](crate::shared::DisjunctiveIntervalMap) the
//! reaching-definitions analysis uses for its `DefinitionsMap`, matching
//! `original_source`'s `DefinitionsMap<NodeT>` being a thin wrapper over the
//! same `ADT::DisjunctiveIntervalMap` — here keyed by abstract location,
//! with `Pointer` as the value type so a `gather` over an interval directly
//! yields the points-to set stored there.

use crate::shared::{DisjunctiveIntervalMap, Interval, LocationId, Pointer};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Default)]
pub struct MemoryMap {
    by_target: FxHashMap<LocationId, DisjunctiveIntervalMap<Pointer>>,
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `values` into `[target, interval]`. `strong` selects
    /// replace-semantics (spec §4.2's strong-update discipline) vs.
    /// union-semantics (weak update). Returns whether anything changed.
    pub fn store(
        &mut self,
        target: LocationId,
        interval: Interval,
        values: impl IntoIterator<Item = Pointer>,
        strong: bool,
    ) -> bool {
        let dim = self.by_target.entry(target).or_default();
        if strong {
            dim.update_values(interval, values)
        } else {
            dim.add_values(interval, values)
        }
    }

    /// Reads the union of pointer values stored anywhere in
    /// `[target, interval]`.
    pub fn load(&self, target: LocationId, interval: Interval) -> FxHashSet<Pointer> {
        match self.by_target.get(&target) {
            Some(dim) => dim.gather(interval),
            None => FxHashSet::default(),
        }
    }

    /// The covered sub-ranges of `[target, interval]`, each clipped to
    /// `interval` and paired with its stored value set (spec §4.2's MEMCPY
    /// row: "copy memory-map entries, clipped to len" — preserves the
    /// offset structure a flattened [`Self::load`] would destroy).
    pub fn load_ranges(&self, target: LocationId, interval: Interval) -> Vec<(Interval, FxHashSet<Pointer>)> {
        match self.by_target.get(&target) {
            Some(dim) => dim.ranges_in(interval),
            None => Vec::new(),
        }
    }

    /// Sub-ranges of `[target, interval]` with no recorded write at all
    /// (spec §4.2's "UNKNOWN if coverage incomplete" rule for `LOAD`).
    pub fn uncovered(&self, target: LocationId, interval: Interval) -> Vec<Interval> {
        match self.by_target.get(&target) {
            Some(dim) => dim.uncovered(interval),
            None => vec![interval],
        }
    }

    /// Unions every entry of `other` into `self` (the merge step of spec
    /// §4.2's "a merging node owns its MM... merge predecessor MMs").
    /// Returns whether anything changed.
    pub fn merge_from(&mut self, other: &MemoryMap) -> bool {
        let mut changed = false;
        for (target, dim) in &other.by_target {
            let mine = self.by_target.entry(*target).or_default();
            for (interval, values) in dim.iter() {
                changed |= mine.add_values(*interval, values.iter().copied());
            }
        }
        changed
    }

    /// Replaces every stored pointer whose `location == stale` with
    /// `replacement`, across every target's memory map (spec §4.2's
    /// `FREE`/`INVALIDATE_OBJECT`/`INVALIDATE_LOCALS`: "replace every
    /// pointer with `p.target` by `INVALIDATED`"). `strong` selects
    /// whether the replacement is a strong (replacing) or weak (unioning)
    /// update at each touched interval.
    pub fn invalidate_references_to(
        &mut self,
        stale: LocationId,
        replacement: Pointer,
        strong: bool,
    ) -> bool {
        let mut changed = false;
        for dim in self.by_target.values_mut() {
            let touched: Vec<Interval> = dim
                .iter()
                .filter(|(_, values)| values.iter().any(|p| p.location == stale))
                .map(|(interval, _)| *interval)
                .collect();
            for interval in touched {
                if strong {
                    changed |= dim.update(interval, replacement);
                } else {
                    changed |= dim.add(interval, replacement);
                }
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

    fn ptr(loc: u32, off: u64) -> Pointer {
        Pointer::new(LocationId(loc), Offset::new(off))
    }

    #[test]
    fn store_then_load_roundtrips() {
        let mut mm = MemoryMap::new();
        mm.store(LocationId(0), Interval::single(Offset::new(0)), [ptr(1, 0)], false);
        let got = mm.load(LocationId(0), Interval::single(Offset::new(0)));
        assert_eq!(got, [ptr(1, 0)].into_iter().collect());
    }

    #[test]
    fn strong_store_replaces_weak_store_unions() {
        let mut mm = MemoryMap::new();
        let at = Interval::single(Offset::new(0));
        mm.store(LocationId(0), at, [ptr(1, 0)], false);
        mm.store(LocationId(0), at, [ptr(2, 0)], false);
        assert_eq!(mm.load(LocationId(0), at).len(), 2);

        mm.store(LocationId(0), at, [ptr(3, 0)], true);
        assert_eq!(mm.load(LocationId(0), at), [ptr(3, 0)].into_iter().collect());
    }

    #[test]
    fn merge_from_unions_targets() {
        let mut a = MemoryMap::new();
        a.store(LocationId(0), Interval::single(Offset::new(0)), [ptr(1, 0)], false);
        let mut b = MemoryMap::new();
        b.store(LocationId(0), Interval::single(Offset::new(0)), [ptr(2, 0)], false);
        assert!(a.merge_from(&b));
        assert_eq!(a.load(LocationId(0), Interval::single(Offset::new(0))).len(), 2);
    }

    #[test]
    fn load_ranges_keeps_distinct_offsets_separate() {
        let mut mm = MemoryMap::new();
        mm.store(LocationId(0), Interval::single(Offset::new(0)), [ptr(1, 0)], false);
        mm.store(LocationId(0), Interval::single(Offset::new(8)), [ptr(2, 0)], false);
        let ranges = mm.load_ranges(LocationId(0), Interval::new(Offset::new(0), Offset::new(15)));
        assert_eq!(ranges.len(), 2);
        assert!(ranges
            .iter()
            .any(|(iv, vals)| *iv == Interval::single(Offset::new(0)) && vals.contains(&ptr(1, 0))));
        assert!(ranges
            .iter()
            .any(|(iv, vals)| *iv == Interval::single(Offset::new(8)) && vals.contains(&ptr(2, 0))));
    }

    #[test]
    fn invalidate_replaces_matching_references_only() {
        let mut mm = MemoryMap::new();
        let at = Interval::single(Offset::new(0));
        mm.store(LocationId(0), at, [ptr(5, 0), ptr(6, 0)], false);
        let invalidated = ptr(999, 0);
        assert!(mm.invalidate_references_to(LocationId(5), invalidated, false));
        let got = mm.load(LocationId(0), at);
        assert!(got.contains(&invalidated));
        assert!(got.contains(&ptr(6, 0)));
    }
}
