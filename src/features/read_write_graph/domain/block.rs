//! Basic blocks and per-procedure subgraphs of the read-write graph (spec
//! §3.4): a thin structural layer mirroring
//! [`crate::features::pointer_graph::domain::subgraph::PointerSubgraph`].

use super::node::RWNodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RWBBlockId(pub u32);

#[derive(Debug, Clone, Default)]
pub struct RWBBlock {
    pub nodes: Vec<RWNodeId>,
}

impl RWBBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: RWNodeId) {
        self.nodes.push(node);
    }

    pub fn first(&self) -> Option<RWNodeId> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<RWNodeId> {
        self.nodes.last().copied()
    }
}

/// A procedure's CFG of blocks (spec §3.4): entry block, the set of exit
/// (return) blocks, and the full node/block membership used by the
/// reaching-definitions worklist's per-subgraph reverse-postorder pass.
#[derive(Debug, Clone)]
pub struct RWSubgraph {
    pub entry: RWBBlockId,
    pub exits: Vec<RWBBlockId>,
    pub blocks: Vec<RWBBlockId>,
}

impl RWSubgraph {
    pub fn new(entry: RWBBlockId) -> Self {
        RWSubgraph {
            entry,
            exits: Vec::new(),
            blocks: vec![entry],
        }
    }

    pub fn add_block(&mut self, id: RWBBlockId) {
        self.blocks.push(id);
    }

    pub fn add_exit(&mut self, id: RWBBlockId) {
        self.exits.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_first_last_track_push_order() {
        let mut b = RWBBlock::new();
        b.push(RWNodeId(0));
        b.push(RWNodeId(1));
        assert_eq!(b.first(), Some(RWNodeId(0)));
        assert_eq!(b.last(), Some(RWNodeId(1)));
    }
}
