//! Read-write graph node model (spec §3.4): one [`RWNode`] per IR
//! instruction with a memory effect, carrying the [`DefSite`]/[`UseSite`]
//! sets the reaching-definitions analysis consumes. Arena-identified the
//! same way [`crate::features::pointer_graph::domain::PSNodeId`] is (spec
//! §9's re-architecture note applies equally here).

use crate::shared::{LocationId, Offset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RWNodeId(pub u32);

impl std::fmt::Display for RWNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rw{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RWNodeKind {
    Alloc,
    Load,
    Store,
    Call,
    CallReturn,
    Phi,
    Intrinsic,
    Noop,
}

/// An abstract memory write or read: `(target, offset, length)` (spec §3.4,
/// GLOSSARY). `DefSite` and `UseSite` are the same shape; kept as distinct
/// types so the solver's `def_sites`/`use_sites` fields cannot be confused
/// at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefSite {
    pub target: LocationId,
    pub offset: Offset,
    pub len: Offset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UseSite {
    pub target: LocationId,
    pub offset: Offset,
    pub len: Offset,
}

impl DefSite {
    pub fn new(target: LocationId, offset: Offset, len: Offset) -> Self {
        DefSite { target, offset, len }
    }
}

impl UseSite {
    pub fn new(target: LocationId, offset: Offset, len: Offset) -> Self {
        UseSite { target, offset, len }
    }
}

/// A single instruction's memory effect (spec §3.4). `operands`/`users`
/// carry the *top-level* (register/SSA-value) use-def relation the SDG's
/// direct use-edges are taken from (spec §4.6 step 3) — distinct from
/// `def_sites`/`use_sites`, which describe the instruction's indirect
/// (memory) effect.
#[derive(Debug, Clone)]
pub struct RWNode {
    pub id: RWNodeId,
    pub kind: RWNodeKind,
    pub def_sites: Vec<DefSite>,
    pub use_sites: Vec<UseSite>,
    pub operands: Vec<RWNodeId>,
    pub users: Vec<RWNodeId>,
    pub predecessors: Vec<RWNodeId>,
    pub successors: Vec<RWNodeId>,
}

impl RWNode {
    pub fn new(id: RWNodeId, kind: RWNodeKind) -> Self {
        RWNode {
            id,
            kind,
            def_sites: Vec::new(),
            use_sites: Vec::new(),
            operands: Vec::new(),
            users: Vec::new(),
            predecessors: Vec::new(),
            successors: Vec::new(),
        }
    }

    pub fn is_isolated(&self) -> bool {
        self.operands.is_empty()
            && self.users.is_empty()
            && self.predecessors.is_empty()
            && self.successors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_node_has_no_sites() {
        let n = RWNode::new(RWNodeId(0), RWNodeKind::Load);
        assert!(n.def_sites.is_empty());
        assert!(n.use_sites.is_empty());
        assert!(n.is_isolated());
    }
}
