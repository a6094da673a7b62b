//! Pointer-subgraph node model (spec §3.2, §9).
//!
//! The original expresses each node kind as a C++ subclass of `PSNode`
//! (`PSNodeAlloc`, `PSNodeCall`, ...). Per spec §9 we collapse this into a
//! tagged variant: one `PSNode` struct carrying a `PSNodeKind` discriminant
//! and a `PSNodeData` payload enum, the way
//! `examples/josongsong-semantica-codegraph/features/points_to/domain/constraint.rs`
//! represents `Constraint { kind: ConstraintKind, ... }` rather than a class
//! hierarchy per constraint kind.

use crate::shared::{BitPointsToSet, Offset};

/// Dense id of a [`PSNode`], stable for the node's lifetime (spec §9: ids
/// never get reused or renumbered; `remove` only clears the arena slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PSNodeId(pub u32);

impl std::fmt::Display for PSNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ps{}", self.0)
    }
}

/// The fixed set of pointer-subgraph node kinds (spec §3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PSNodeKind {
    Alloc,
    Global,
    Load,
    Store,
    Gep,
    Phi,
    Cast,
    Constant,
    Function,
    Call,
    CallFuncPtr,
    CallReturn,
    Return,
    Entry,
    Noop,
    Memcpy,
    Free,
    InvalidateLocals,
    InvalidateObject,
    Fork,
    Join,
}

/// Per-kind payload. Only the fields a given kind actually needs are
/// populated; operands shared by every kind (CFG predecessors/successors,
/// the generic operand list) live directly on [`PSNode`].
#[derive(Debug, Clone, Default)]
pub struct PSNodeData {
    /// Declared size in bytes of an `ALLOC`/`GLOBAL` target, or `None` if
    /// unknown (spec §4.2's "size overflow" widening consults this).
    pub alloc_size: Option<u64>,
    /// The constant `(target, offset)` pair for a `CONSTANT` node.
    pub constant: Option<(PSNodeId, Offset)>,
    /// The additive offset operand of a `GEP` node.
    pub gep_offset: Offset,
    /// The byte length operand of a `MEMCPY`, or `UNKNOWN`.
    pub memcpy_len: Offset,
    /// Access width in bytes of a `LOAD`/`STORE`, or `UNKNOWN`.
    pub access_width: Offset,
    /// For `CALL`/`CALL_FUNCPTR`/`CALL_RETURN`: the id of the paired node
    /// (spec §3.2).
    pub paired_node: Option<PSNodeId>,
    /// For `CALL_FUNCPTR`: the operand holding the function-pointer value.
    /// For other kinds carrying exactly one "subject" operand (`LOAD`,
    /// `STORE`'s destination, `FREE`, `INVALIDATE_OBJECT`, `CAST`), reused
    /// for that operand's id.
    pub subject: Option<PSNodeId>,
}

/// A node of the pointer subgraph (spec §3.2).
#[derive(Debug, Clone)]
pub struct PSNode {
    pub id: PSNodeId,
    pub kind: PSNodeKind,
    pub data: PSNodeData,
    /// Other PSNodes this node reads (the generic operand list; `STORE`'s
    /// value operand, `PHI`'s incoming values, `CALL_FUNCPTR`'s argument
    /// operands, etc. beyond what `data` names directly).
    pub operands: Vec<PSNodeId>,
    /// Reverse of `operands`: everyone who reads this node.
    pub users: Vec<PSNodeId>,
    /// CFG predecessors within the owning subgraph.
    pub predecessors: Vec<PSNodeId>,
    /// CFG successors within the owning subgraph.
    pub successors: Vec<PSNodeId>,
    /// The node's current points-to solution.
    pub points_to: BitPointsToSet,
}

impl PSNode {
    pub fn new(id: PSNodeId, kind: PSNodeKind) -> Self {
        PSNode {
            id,
            kind,
            data: PSNodeData::default(),
            operands: Vec::new(),
            users: Vec::new(),
            predecessors: Vec::new(),
            successors: Vec::new(),
            points_to: BitPointsToSet::default(),
        }
    }

    /// A node is fully isolated iff it has no successors, predecessors,
    /// operands, or users (spec §3.2's `remove` precondition).
    pub fn is_isolated(&self) -> bool {
        self.operands.is_empty()
            && self.users.is_empty()
            && self.predecessors.is_empty()
            && self.successors.is_empty()
    }

    /// Whether this node's processing can change its owning subgraph's
    /// memory map, and therefore must own (rather than alias) that map
    /// (spec §4.2's "needs merge" rule, restricted to the memory-changing
    /// part).
    pub fn changes_memory(&self, track_invalidation: bool) -> bool {
        matches!(
            self.kind,
            PSNodeKind::Store | PSNodeKind::Memcpy | PSNodeKind::CallFuncPtr
        ) || (track_invalidation
            && matches!(
                self.kind,
                PSNodeKind::Free
                    | PSNodeKind::InvalidateLocals
                    | PSNodeKind::InvalidateObject
            ))
    }

    /// A node "needs merge" (owns its own memory map rather than aliasing
    /// its sole predecessor's) iff it has more than one predecessor, is a
    /// root (no predecessors), is a `CALL_RETURN`, or can itself change the
    /// memory map (spec §4.2).
    pub fn needs_merge(&self, track_invalidation: bool) -> bool {
        self.predecessors.len() != 1
            || self.kind == PSNodeKind::CallReturn
            || self.changes_memory(track_invalidation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_node_is_isolated() {
        let n = PSNode::new(PSNodeId(0), PSNodeKind::Alloc);
        assert!(n.is_isolated());
    }

    #[test]
    fn store_changes_memory_regardless_of_inv_flag() {
        let n = PSNode::new(PSNodeId(0), PSNodeKind::Store);
        assert!(n.changes_memory(false));
        assert!(n.changes_memory(true));
    }

    #[test]
    fn free_only_changes_memory_when_tracking_invalidation() {
        let n = PSNode::new(PSNodeId(0), PSNodeKind::Free);
        assert!(!n.changes_memory(false));
        assert!(n.changes_memory(true));
    }

    #[test]
    fn root_with_no_predecessors_needs_merge() {
        let n = PSNode::new(PSNodeId(0), PSNodeKind::Entry);
        assert!(n.needs_merge(false));
    }

    #[test]
    fn single_predecessor_passthrough_node_shares_mm() {
        let mut n = PSNode::new(PSNodeId(1), PSNodeKind::Cast);
        n.predecessors.push(PSNodeId(0));
        assert!(!n.needs_merge(false));
    }
}
