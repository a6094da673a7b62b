//! Disjunctive interval map (spec §3.1, §4.1).
//!
//! Maps pairwise-disjunctive [`Interval`]s to sets of values. Used both as
//! the per-target memory map of the pointer analysis (`offset -> PointsToSet`)
//! and, unchanged, as the `DefinitionsMap` of the reaching-definitions
//! analysis (`offset -> set<RWNodeId>`) — grounded in `original_source`'s
//! `DefinitionsMap<NodeT>`, which is itself a thin wrapper around exactly
//! this structure (`include/dg/MemorySSA/DefinitionsMap.h`).

use super::offset::Interval;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::hash::Hash;

/// A mapping from pairwise-disjunctive intervals to sets of `V`.
///
/// Invariant (checked in `debug_assert`s): for any two distinct keys `a`
/// and `b` with `a < b`, `a.end < b.start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisjunctiveIntervalMap<V: Eq + Hash> {
    entries: BTreeMap<Interval, FxHashSet<V>>,
}

impl<V> Default for DisjunctiveIntervalMap<V> {
    fn default() -> Self {
        DisjunctiveIntervalMap {
            entries: BTreeMap::new(),
        }
    }
}

impl<V: Eq + Hash + Clone> DisjunctiveIntervalMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert `val` into every interval overlapping `interval`, splitting
    /// existing intervals at `interval`'s boundaries and creating fresh
    /// intervals for any uncovered sub-range. Returns whether anything
    /// changed.
    pub fn add(&mut self, interval: Interval, val: V) -> bool {
        self.add_all_values(interval, std::iter::once(val))
    }

    /// Same as [`add`](Self::add) for a batch of values.
    pub fn add_values(&mut self, interval: Interval, vals: impl IntoIterator<Item = V>) -> bool {
        self.add_all_values(interval, vals)
    }

    fn add_all_values(&mut self, interval: Interval, vals: impl IntoIterator<Item = V>) -> bool {
        let vals: FxHashSet<V> = vals.into_iter().collect();
        self.splice(interval, &vals, false)
    }

    /// Strong update: every interval overlapping `interval` has its value
    /// set *replaced* by `{val}` rather than unioned.
    pub fn update(&mut self, interval: Interval, val: V) -> bool {
        let vals: FxHashSet<V> = std::iter::once(val).collect();
        self.splice(interval, &vals, true)
    }

    pub fn update_values(&mut self, interval: Interval, vals: impl IntoIterator<Item = V>) -> bool {
        let vals: FxHashSet<V> = vals.into_iter().collect();
        self.splice(interval, &vals, true)
    }

    /// Union `val` into every *existing* interval. Creates no new intervals.
    pub fn add_all(&mut self, val: V) -> bool {
        let mut changed = false;
        for set in self.entries.values_mut() {
            changed |= set.insert(val.clone());
        }
        changed
    }

    /// Union of the value sets of every interval overlapping `interval`.
    pub fn gather(&self, interval: Interval) -> FxHashSet<V> {
        let mut out = FxHashSet::default();
        for (k, v) in &self.entries {
            if k.overlaps(interval) {
                out.extend(v.iter().cloned());
            }
        }
        out
    }

    /// True iff some key overlaps `interval`.
    pub fn overlaps(&self, interval: Interval) -> bool {
        self.entries.keys().any(|k| k.overlaps(interval))
    }

    /// True iff every byte of `interval` is covered by some key
    /// (equivalently, `uncovered(interval)` is empty).
    pub fn overlaps_full(&self, interval: Interval) -> bool {
        self.uncovered(interval).is_empty()
    }

    /// The maximal sub-intervals of `interval` not covered by any key, in
    /// left-to-right order.
    pub fn uncovered(&self, interval: Interval) -> Vec<Interval> {
        let covering: Vec<Interval> = self
            .entries
            .keys()
            .filter(|k| k.overlaps(interval))
            .copied()
            .collect();
        gaps(interval, &covering)
    }

    /// The covered sub-intervals of `query`, each clipped to `query`'s own
    /// bounds and paired with its stored value set, in left-to-right order.
    /// Complements [`uncovered`](Self::uncovered): together `ranges_in(q)`
    /// and `uncovered(q)` partition `q` exactly.
    pub fn ranges_in(&self, query: Interval) -> Vec<(Interval, FxHashSet<V>)> {
        let mut out: Vec<(Interval, FxHashSet<V>)> = self
            .entries
            .iter()
            .filter(|(k, _)| k.overlaps(query))
            .map(|(k, v)| {
                let start = k.effective_start().max(query.effective_start());
                let end = k.effective_end().min(query.effective_end());
                (clamp_interval(start, end), v.clone())
            })
            .collect();
        out.sort_by_key(|(iv, _)| iv.effective_start());
        out
    }

    /// Interval-wise set intersection: for every pair of overlapping
    /// entries, the overlap region maps to the intersection of the two
    /// value sets.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut out = Self::new();
        for (ka, va) in &self.entries {
            for (kb, vb) in &other.entries {
                if !ka.overlaps(*kb) {
                    continue;
                }
                let start = ka.effective_start().max(kb.effective_start());
                let end = ka.effective_end().min(kb.effective_end());
                let overlap = clamp_interval(start, end);
                let common: FxHashSet<V> = va.intersection(vb).cloned().collect();
                out.entries.insert(overlap, common);
            }
        }
        out
    }

    /// Splits existing intervals at `interval`'s boundaries, then unions or
    /// replaces (per `is_update`) the value set of each resulting overlap,
    /// and finally fills any uncovered sub-range of `interval` with `vals`.
    fn splice(&mut self, interval: Interval, vals: &FxHashSet<V>, is_update: bool) -> bool {
        let overlapping: Vec<(Interval, FxHashSet<V>)> = self
            .entries
            .iter()
            .filter(|(k, _)| k.overlaps(interval))
            .map(|(k, v)| (*k, v.clone()))
            .collect();

        for (k, _) in &overlapping {
            self.entries.remove(k);
        }

        let mut changed = false;
        let mut middles: Vec<Interval> = Vec::with_capacity(overlapping.len());

        for (e, old_vals) in overlapping {
            if e.effective_start() < interval.effective_start() {
                let left = clamp_interval(e.effective_start(), interval.effective_start() - 1);
                self.entries.insert(left, old_vals.clone());
            }
            if e.effective_end() > interval.effective_end() {
                let right = clamp_interval(interval.effective_end() + 1, e.effective_end());
                self.entries.insert(right, old_vals.clone());
            }

            let mid_start = e.effective_start().max(interval.effective_start());
            let mid_end = e.effective_end().min(interval.effective_end());
            let middle = clamp_interval(mid_start, mid_end);

            let new_set = if is_update {
                if vals != &old_vals {
                    changed = true;
                }
                vals.clone()
            } else {
                let mut merged = old_vals.clone();
                let before = merged.len();
                merged.extend(vals.iter().cloned());
                if merged.len() != before {
                    changed = true;
                }
                merged
            };
            self.entries.insert(middle, new_set);
            middles.push(middle);
        }

        for gap in gaps(interval, &middles) {
            self.entries.insert(gap, vals.clone());
            changed = true;
        }

        debug_assert!(self.check_disjunctive());
        changed
    }

    fn check_disjunctive(&self) -> bool {
        let mut prev: Option<Interval> = None;
        for k in self.entries.keys() {
            if let Some(p) = prev {
                if p.effective_end() >= k.effective_start() {
                    return false;
                }
            }
            prev = Some(*k);
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Interval, &FxHashSet<V>)> {
        self.entries.iter()
    }
}

/// Construct an [`Interval`] from raw `u128` bounds produced by arithmetic
/// over [`Interval::effective_start`]/[`Interval::effective_end`], mapping
/// `u128::MAX` back to [`super::offset::Offset::UNKNOWN`].
fn clamp_interval(start: u128, end: u128) -> Interval {
    use super::offset::Offset;
    let s = Offset::new(start as u64);
    let e = if end >= u128::MAX {
        Offset::UNKNOWN
    } else {
        Offset::new(end as u64)
    };
    Interval::new(s, e)
}

/// The maximal sub-intervals of `query` not covered by any interval in
/// `covering` (which need not be sorted, but must be pairwise disjunctive).
fn gaps(query: Interval, covering: &[Interval]) -> Vec<Interval> {
    let mut sorted: Vec<Interval> = covering
        .iter()
        .filter(|c| c.overlaps(query))
        .copied()
        .collect();
    sorted.sort_by_key(|i| i.effective_start());

    let mut out = Vec::new();
    let mut cursor = query.effective_start();
    let query_end = query.effective_end();

    for c in sorted {
        let c_start = c.effective_start().max(query.effective_start());
        let c_end = c.effective_end().min(query_end);
        if c_start > cursor {
            out.push(clamp_interval(cursor, c_start - 1));
        }
        cursor = cursor.max(c_end + 1);
        if cursor > query_end {
            break;
        }
    }
    if cursor <= query_end {
        out.push(clamp_interval(cursor, query_end));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::offset::Offset;

    fn iv(s: u64, e: u64) -> Interval {
        Interval::new(Offset::new(s), Offset::new(e))
    }

    #[test]
    fn add_then_gather() {
        let mut m = DisjunctiveIntervalMap::new();
        assert!(m.add(iv(0, 3), "a"));
        assert!(m.add(iv(4, 7), "b"));
        assert_eq!(m.gather(iv(2, 5)), ["a", "b"].into_iter().collect());
    }

    #[test]
    fn add_splits_overlapping_interval() {
        let mut m = DisjunctiveIntervalMap::new();
        m.add(iv(0, 15), "a");
        m.add(iv(4, 8), "b");
        // [0,3] -> {a}, [4,8] -> {a,b}, [9,15] -> {a}
        assert_eq!(m.gather(iv(0, 3)), ["a"].into_iter().collect());
        assert_eq!(m.gather(iv(4, 8)), ["a", "b"].into_iter().collect());
        assert_eq!(m.gather(iv(9, 15)), ["a"].into_iter().collect());
    }

    #[test]
    fn update_is_strong() {
        let mut m = DisjunctiveIntervalMap::new();
        m.add(iv(0, 10), "a");
        m.update(iv(2, 4), "b");
        assert_eq!(m.gather(iv(2, 4)), ["b"].into_iter().collect());
        assert_eq!(m.gather(iv(0, 1)), ["a"].into_iter().collect());
        assert_eq!(m.gather(iv(5, 10)), ["a"].into_iter().collect());
    }

    #[test]
    fn uncovered_and_overlaps_full_duality() {
        let mut m = DisjunctiveIntervalMap::new();
        m.add(iv(0, 3), "a");
        m.add(iv(6, 9), "b");
        assert_eq!(m.uncovered(iv(0, 9)), vec![iv(4, 5)]);
        assert!(!m.overlaps_full(iv(0, 9)));
        m.add(iv(4, 5), "c");
        assert!(m.overlaps_full(iv(0, 9)));
        assert!(m.uncovered(iv(0, 9)).is_empty());
    }

    #[test]
    fn whole_object_interval_covers_any_concrete_query() {
        let mut m: DisjunctiveIntervalMap<&str> = DisjunctiveIntervalMap::new();
        m.add(Interval::whole_object(), "x");
        assert!(m.overlaps_full(iv(100, 200)));
        assert_eq!(m.gather(iv(100, 200)), ["x"].into_iter().collect());
    }

    #[test]
    fn add_all_touches_only_existing_intervals() {
        let mut m = DisjunctiveIntervalMap::new();
        m.add(iv(0, 3), "a");
        m.add(iv(10, 13), "b");
        m.add_all("z");
        assert_eq!(m.gather(iv(0, 3)), ["a", "z"].into_iter().collect());
        assert_eq!(m.gather(iv(10, 13)), ["b", "z"].into_iter().collect());
        // no interval was created at e.g. [4,9]
        assert!(!m.overlaps(iv(4, 9)));
    }

    #[test]
    fn ranges_in_and_uncovered_partition_the_query() {
        let mut m = DisjunctiveIntervalMap::new();
        m.add(iv(0, 3), "a");
        m.add(iv(8, 9), "b");
        let ranges = m.ranges_in(iv(0, 9));
        assert_eq!(ranges, vec![(iv(0, 3), ["a"].into_iter().collect()), (iv(8, 9), ["b"].into_iter().collect())]);
        assert_eq!(m.uncovered(iv(0, 9)), vec![iv(4, 7)]);
    }

    #[test]
    fn intersection_combines_overlap_regions() {
        let mut a = DisjunctiveIntervalMap::new();
        a.add(iv(0, 9), "a");
        a.add(iv(0, 9), "shared");
        let mut b = DisjunctiveIntervalMap::new();
        b.add(iv(5, 14), "b");
        b.add(iv(5, 14), "shared");

        let inter = a.intersection(&b);
        assert_eq!(inter.gather(iv(5, 9)), ["shared"].into_iter().collect());
    }

    #[test]
    fn invariant_disjunctive_after_random_adds() {
        let mut m = DisjunctiveIntervalMap::new();
        let ops: &[(u64, u64, &str)] = &[
            (0, 10, "a"),
            (3, 6, "b"),
            (5, 8, "c"),
            (0, 0, "d"),
            (100, 100, "e"),
        ];
        for (s, e, v) in ops {
            m.add(iv(*s, *e), *v);
        }
        assert!(m.check_disjunctive());
    }
}
