//! `DGBBlock` (spec §3.5, §9): a basic block of the System Dependence
//! Graph. CFG predecessor/successor edges live here (not on `DGNode`), so
//! the isolate-then-remove sweep of spec §4.7 can splice a removed block's
//! predecessors directly onto its successors, grounded directly in
//! `examples/original_source/include/dg/BBlock.h`'s `isolate()`.

use super::graph::DependenceGraphId;
use super::node::DGNodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DGBBlockId(pub u32);

#[derive(Debug, Clone)]
pub struct DGBBlock {
    pub id: DGBBlockId,
    pub owner: DependenceGraphId,
    pub nodes: Vec<DGNodeId>,
    pub predecessors: Vec<DGBBlockId>,
    pub successors: Vec<DGBBlockId>,
    /// Slice membership tag (spec §4.7); `0` means unmarked.
    pub slice_id: u32,
}

impl DGBBlock {
    pub fn new(id: DGBBlockId, owner: DependenceGraphId) -> Self {
        DGBBlock {
            id,
            owner,
            nodes: Vec::new(),
            predecessors: Vec::new(),
            successors: Vec::new(),
            slice_id: 0,
        }
    }

    pub fn push(&mut self, n: DGNodeId) {
        self.nodes.push(n);
    }

    pub fn first(&self) -> Option<DGNodeId> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<DGNodeId> {
        self.nodes.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_last_track_push_order() {
        let mut b = DGBBlock::new(DGBBlockId(0), DependenceGraphId(0));
        b.push(DGNodeId(1));
        b.push(DGNodeId(2));
        assert_eq!(b.first(), Some(DGNodeId(1)));
        assert_eq!(b.last(), Some(DGNodeId(2)));
    }
}
