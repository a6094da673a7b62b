//! Sparse bitmap over dense `u32` ids, with deferred sorting.
//!
//! Grounded on
//! `examples/josongsong-semantica-codegraph/features/points_to/infrastructure/sparse_bitmap.rs`:
//! a sorted `Vec<u32>` as primary storage plus an unsorted `pending` buffer
//! so inserts are O(1) amortized and sorting happens once per batch instead
//! of per element. We keep the hybrid deferred-sort design but drop that
//! file's dense/bitvec fallback path (spec §9 calls for a single, simple
//! `PointsToSet` representation, not a size-adaptive hybrid).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const PENDING_BUFFER_THRESHOLD: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SparseBitmap {
    elements: Vec<u32>,
    #[serde(skip)]
    pending: Vec<u32>,
    #[serde(skip)]
    dirty: bool,
}

impl SparseBitmap {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn singleton(element: u32) -> Self {
        Self {
            elements: vec![element],
            pending: Vec::new(),
            dirty: false,
        }
    }

    pub fn from_iter(iter: impl IntoIterator<Item = u32>) -> Self {
        let mut elements: Vec<u32> = iter.into_iter().collect();
        elements.sort_unstable();
        elements.dedup();
        Self {
            elements,
            pending: Vec::new(),
            dirty: false,
        }
    }

    #[inline]
    fn consolidate(&mut self) {
        if !self.dirty || self.pending.is_empty() {
            self.dirty = false;
            return;
        }
        self.pending.sort_unstable();
        self.pending.dedup();

        if self.elements.is_empty() {
            std::mem::swap(&mut self.elements, &mut self.pending);
        } else {
            let mut merged = Vec::with_capacity(self.elements.len() + self.pending.len());
            let mut i = 0;
            let mut j = 0;
            while i < self.elements.len() && j < self.pending.len() {
                match self.elements[i].cmp(&self.pending[j]) {
                    Ordering::Less => {
                        merged.push(self.elements[i]);
                        i += 1;
                    }
                    Ordering::Greater => {
                        merged.push(self.pending[j]);
                        j += 1;
                    }
                    Ordering::Equal => {
                        merged.push(self.elements[i]);
                        i += 1;
                        j += 1;
                    }
                }
            }
            merged.extend_from_slice(&self.elements[i..]);
            merged.extend_from_slice(&self.pending[j..]);
            self.elements = merged;
            self.pending.clear();
        }
        self.dirty = false;
    }

    #[inline]
    fn maybe_consolidate(&mut self) {
        if self.pending.len() >= PENDING_BUFFER_THRESHOLD {
            self.consolidate();
        }
    }

    /// Returns true if the element was not already present.
    #[inline]
    pub fn insert(&mut self, element: u32) -> bool {
        if !self.dirty && self.elements.binary_search(&element).is_ok() {
            return false;
        }
        if self.pending.contains(&element) {
            return false;
        }
        self.pending.push(element);
        self.dirty = true;
        self.maybe_consolidate();
        true
    }

    #[inline]
    pub fn contains(&self, element: u32) -> bool {
        if self.pending.contains(&element) {
            return true;
        }
        self.elements.binary_search(&element).is_ok()
    }

    pub fn len(&self) -> usize {
        if self.dirty {
            let mut count = self.elements.len();
            for &p in &self.pending {
                if self.elements.binary_search(&p).is_err() {
                    count += 1;
                }
            }
            count
        } else {
            self.elements.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.pending.is_empty()
    }

    /// Consolidates and returns the sorted, deduplicated elements.
    pub fn iter(&mut self) -> impl Iterator<Item = u32> + '_ {
        self.consolidate();
        self.elements.iter().copied()
    }

    /// `self = self ∪ other`. Returns whether `self` changed.
    pub fn union_with(&mut self, other: &SparseBitmap) -> bool {
        if other.is_empty() {
            return false;
        }
        self.consolidate();
        let before = self.elements.len();
        let other_elements = other.snapshot_sorted();

        if self.elements.is_empty() {
            self.elements = other_elements;
            return self.elements.len() != before;
        }

        let mut result = Vec::with_capacity(self.elements.len() + other_elements.len());
        let mut i = 0;
        let mut j = 0;
        while i < self.elements.len() && j < other_elements.len() {
            match self.elements[i].cmp(&other_elements[j]) {
                Ordering::Less => {
                    result.push(self.elements[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    result.push(other_elements[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    result.push(self.elements[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        result.extend_from_slice(&self.elements[i..]);
        result.extend_from_slice(&other_elements[j..]);
        self.elements = result;
        self.elements.len() != before
    }

    pub fn intersects(&self, other: &SparseBitmap) -> bool {
        let a = self.snapshot_sorted();
        let b = other.snapshot_sorted();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => return true,
            }
        }
        false
    }

    fn snapshot_sorted(&self) -> Vec<u32> {
        if !self.dirty {
            return self.elements.clone();
        }
        let mut combined: Vec<u32> = self.elements.iter().chain(self.pending.iter()).copied().collect();
        combined.sort_unstable();
        combined.dedup();
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_contains() {
        let mut b = SparseBitmap::new();
        assert!(b.insert(5));
        assert!(!b.insert(5));
        assert!(b.contains(5));
        assert!(!b.contains(6));
    }

    #[test]
    fn union_merges_sorted() {
        let mut a = SparseBitmap::from_iter([1, 3, 5]);
        let b = SparseBitmap::from_iter([2, 3, 4]);
        assert!(a.union_with(&b));
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn deferred_insert_batch_then_consolidate() {
        let mut b = SparseBitmap::new();
        for i in (0..32).rev() {
            b.insert(i);
        }
        assert_eq!(b.iter().collect::<Vec<_>>(), (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn intersects_detects_shared_element() {
        let a = SparseBitmap::from_iter([1, 2, 3]);
        let b = SparseBitmap::from_iter([10, 3, 20]);
        let c = SparseBitmap::from_iter([100]);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
