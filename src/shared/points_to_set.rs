//! The `PointsToSet` abstraction (spec §3.2, §9 re-architecture note).
//!
//! The original exposes several interchangeable points-to set
//! implementations (`include/dg/PointerAnalysis/PointsToSets/*`); per spec
//! §9 we collapse this to a single trait with one default implementation
//! backed by [`SparseBitmap`], grounded in
//! `examples/josongsong-semantica-codegraph/features/points_to/infrastructure/sparse_bitmap.rs`.

use super::offset::Offset;
use super::sparse_bitmap::SparseBitmap;
use rustc_hash::FxHashMap;
use std::fmt;

/// Dense integer id of an abstract memory location (spec §3.2's
/// "location"): one per allocation site, global, or stack object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationId(pub u32);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loc{}", self.0)
    }
}

/// A `(location, offset)` pair a pointer may reference, per spec §3.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pointer {
    pub location: LocationId,
    pub offset: Offset,
}

impl Pointer {
    pub fn new(location: LocationId, offset: Offset) -> Self {
        Pointer { location, offset }
    }

    pub fn unknown(location: LocationId) -> Self {
        Pointer {
            location,
            offset: Offset::UNKNOWN,
        }
    }
}

/// A set of [`Pointer`]s a pointer variable may hold, exposed behind a
/// trait so the solver (§4.2) does not depend on the concrete
/// representation.
pub trait PointsToSet: Default + Clone {
    /// Insert `ptr`. Returns whether the set changed.
    fn insert(&mut self, ptr: Pointer) -> bool;

    /// `self = self ∪ other`. Returns whether `self` changed.
    fn union_with(&mut self, other: &Self) -> bool;

    fn contains(&self, ptr: Pointer) -> bool;

    fn is_empty(&self) -> bool;

    fn len(&self) -> usize;

    /// All locations referenced by this set, regardless of offset.
    fn locations(&self) -> Vec<LocationId>;

    fn iter(&self) -> Vec<Pointer>;
}

/// Default [`PointsToSet`] implementation: one [`SparseBitmap`] of offsets
/// per referenced location, mirroring the per-variable `SparseBitmap` of ids
/// in `examples/josongsong-semantica-codegraph/features/points_to/infrastructure/sparse_bitmap.rs`
/// but keyed on (location, offset) pairs. An offset of `Offset::UNKNOWN` is
/// stored as `u32::MAX` inside the bitmap for the corresponding location,
/// matching that Andersen solver's field-bit-packing convention for its
/// `field_location` ids.
#[derive(Debug, Clone, Default)]
pub struct BitPointsToSet {
    by_location: FxHashMap<LocationId, SparseBitmap>,
}

const UNKNOWN_OFFSET_BIT: u32 = u32::MAX;

fn offset_bit(offset: Offset) -> u32 {
    match offset.value() {
        Some(v) if v < u32::MAX as u64 => v as u32,
        _ => UNKNOWN_OFFSET_BIT,
    }
}

fn bit_offset(bit: u32) -> Offset {
    if bit == UNKNOWN_OFFSET_BIT {
        Offset::UNKNOWN
    } else {
        Offset::new(bit as u64)
    }
}

impl PointsToSet for BitPointsToSet {
    fn insert(&mut self, ptr: Pointer) -> bool {
        self.by_location
            .entry(ptr.location)
            .or_default()
            .insert(offset_bit(ptr.offset))
    }

    fn union_with(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for (loc, bits) in &other.by_location {
            changed |= self.by_location.entry(*loc).or_default().union_with(bits);
        }
        changed
    }

    fn contains(&self, ptr: Pointer) -> bool {
        self.by_location
            .get(&ptr.location)
            .is_some_and(|b| b.contains(offset_bit(ptr.offset)))
    }

    fn is_empty(&self) -> bool {
        self.by_location.values().all(|b| b.is_empty())
    }

    fn len(&self) -> usize {
        self.by_location.values().map(|b| b.len()).sum()
    }

    fn locations(&self) -> Vec<LocationId> {
        self.by_location
            .iter()
            .filter(|(_, b)| !b.is_empty())
            .map(|(loc, _)| *loc)
            .collect()
    }

    fn iter(&self) -> Vec<Pointer> {
        let mut out = Vec::new();
        for (loc, bits) in &self.by_location {
            let mut bits = bits.clone();
            for bit in bits.iter() {
                out.push(Pointer::new(*loc, bit_offset(bit)));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_contains_roundtrip() {
        let mut s = BitPointsToSet::default();
        let p = Pointer::new(LocationId(3), Offset::new(8));
        assert!(s.insert(p));
        assert!(!s.insert(p));
        assert!(s.contains(p));
        assert!(!s.contains(Pointer::new(LocationId(3), Offset::new(9))));
    }

    #[test]
    fn unknown_offset_is_distinct_bit() {
        let mut s = BitPointsToSet::default();
        s.insert(Pointer::unknown(LocationId(1)));
        s.insert(Pointer::new(LocationId(1), Offset::new(0)));
        assert_eq!(s.len(), 2);
        assert!(s.contains(Pointer::unknown(LocationId(1))));
    }

    #[test]
    fn union_with_merges_both_locations() {
        let mut a = BitPointsToSet::default();
        a.insert(Pointer::new(LocationId(1), Offset::new(0)));
        let mut b = BitPointsToSet::default();
        b.insert(Pointer::new(LocationId(2), Offset::new(0)));
        assert!(a.union_with(&b));
        assert_eq!(a.locations().len(), 2);
    }
}
