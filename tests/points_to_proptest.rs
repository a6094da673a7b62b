//! Universal invariants of `BitPointsToSet` (spec §8.1): regardless of which
//! `(location, offset)` pairs were inserted, membership, size, and the
//! derived `locations()` view all stay consistent with one another.

use quickcheck_macros::quickcheck;
use sdg_slicer::shared::{BitPointsToSet, LocationId, Offset, Pointer, PointsToSet};
use std::collections::HashSet;

fn build(items: &[(u8, u16)]) -> (BitPointsToSet, HashSet<(u8, u16)>) {
    let mut set = BitPointsToSet::default();
    let mut unique = HashSet::new();
    for &(loc, off) in items {
        set.insert(Pointer::new(LocationId(loc as u32), Offset::new(off as u64)));
        unique.insert((loc, off));
    }
    (set, unique)
}

#[quickcheck]
fn every_inserted_pointer_is_contained(items: Vec<(u8, u16)>) -> bool {
    let (set, unique) = build(&items);
    unique
        .iter()
        .all(|&(loc, off)| set.contains(Pointer::new(LocationId(loc as u32), Offset::new(off as u64))))
}

#[quickcheck]
fn len_matches_unique_pointer_count(items: Vec<(u8, u16)>) -> bool {
    let (set, unique) = build(&items);
    set.len() == unique.len()
}

#[quickcheck]
fn locations_matches_unique_location_set(items: Vec<(u8, u16)>) -> bool {
    let (set, unique) = build(&items);
    let expected: HashSet<u8> = unique.iter().map(|&(loc, _)| loc).collect();
    let got: HashSet<u8> = set.locations().into_iter().map(|l| l.0 as u8).collect();
    got == expected
}

#[quickcheck]
fn iter_roundtrips_through_contains(items: Vec<(u8, u16)>) -> bool {
    let (set, _) = build(&items);
    set.iter().into_iter().all(|p| set.contains(p))
}

#[quickcheck]
fn union_with_is_a_superset_of_both_inputs(a_items: Vec<(u8, u16)>, b_items: Vec<(u8, u16)>) -> bool {
    let (mut a, a_unique) = build(&a_items);
    let (b, b_unique) = build(&b_items);
    a.union_with(&b);
    a_unique
        .iter()
        .chain(b_unique.iter())
        .all(|&(loc, off)| a.contains(Pointer::new(LocationId(loc as u32), Offset::new(off as u64))))
}

#[quickcheck]
fn union_with_is_idempotent(items: Vec<(u8, u16)>) -> bool {
    let (mut a, _) = build(&items);
    let snapshot = a.clone();
    let changed = a.union_with(&snapshot);
    !changed && a.len() == snapshot.len()
}

#[quickcheck]
fn unknown_offset_never_collides_with_a_concrete_one(loc: u8) -> bool {
    let mut set = BitPointsToSet::default();
    set.insert(Pointer::unknown(LocationId(loc as u32)));
    !set.contains(Pointer::new(LocationId(loc as u32), Offset::new(0)))
}

#[quickcheck]
fn contains_is_false_for_a_pointer_never_inserted(items: Vec<(u8, u16)>, probe_loc: u8, probe_off: u16) -> bool {
    let (set, unique) = build(&items);
    if unique.contains(&(probe_loc, probe_off)) {
        return true;
    }
    !set.contains(Pointer::new(LocationId(probe_loc as u32), Offset::new(probe_off as u64)))
}
