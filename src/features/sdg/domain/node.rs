//! System Dependence Graph node model (spec §3.5): one [`DGNode`] per
//! instruction/argument/call/artificial element, carrying the three
//! forward+reverse edge-set pairs of `DepDGElement` (`examples/original_source/
//! include/dg/SystemDependenceGraph/DepDGElement.h`). Arena-identified the
//! same way `PSNode`/`RWNode` are (spec §9's re-architecture note).

use super::block::DGBBlockId;
use super::graph::DependenceGraphId;
use super::parameters::DGParameters;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DGNodeId(pub u32);

impl std::fmt::Display for DGNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dg{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DGNodeKind {
    /// A direct translation of one IR instruction's memory/value effect.
    Instruction,
    /// One half of a formal or actual parameter pair (spec §3.5's
    /// `DGArgumentPair`).
    Argument,
    /// A call site; carries `callees`/`actual_parameters`.
    Call,
    /// A node with no IR counterpart (a formal's in/out pair, a return or
    /// vararg collector) — `DGParameters`'s artificial nodes.
    Artificial,
}

/// A node of the System Dependence Graph (spec §3.5). `uses`/`users` is the
/// direct use-def edge pair, `mem_deps`/`rev_mem_deps` the memory-dependence
/// pair (from reaching definitions), `control_deps`/`controls` the
/// control-dependence pair (from NTSCD) — each pair is always mirrored, per
/// `DepDGElement`'s invariant that every setter updates both directions
/// atomically.
#[derive(Debug, Clone)]
pub struct DGNode {
    pub id: DGNodeId,
    pub kind: DGNodeKind,
    pub owner: DependenceGraphId,
    pub bblock: Option<DGBBlockId>,

    pub uses: FxHashSet<DGNodeId>,
    pub users: FxHashSet<DGNodeId>,
    pub mem_deps: FxHashSet<DGNodeId>,
    pub rev_mem_deps: FxHashSet<DGNodeId>,
    pub control_deps: FxHashSet<DGNodeId>,
    pub controls: FxHashSet<DGNodeId>,

    /// For `Call` nodes: the dependence graphs this call site may invoke
    /// (spec §4.6 step 6 — more than one target when the call graph
    /// resolved it to several candidates).
    pub callees: Vec<DependenceGraphId>,
    /// For `Call` nodes: its actual-parameter pairs (spec §3.5's
    /// `DGActualParameters`).
    pub actual_parameters: Option<DGParameters>,

    /// Whether this node is one half of a *formal* parameter pair, a
    /// return, or a vararg collector of its owning graph (as opposed to an
    /// actual-parameter node at a call site). Slicing's mark phase
    /// re-enqueues the owner's entry node only for these (spec §4.7: "so
    /// every call site referencing this procedure is also marked").
    pub is_formal_parameter: bool,

    /// Slice membership tag (spec §4.7); `0` means unmarked.
    pub slice_id: u32,
}

impl DGNode {
    pub fn new(id: DGNodeId, kind: DGNodeKind, owner: DependenceGraphId) -> Self {
        DGNode {
            id,
            kind,
            owner,
            bblock: None,
            uses: FxHashSet::default(),
            users: FxHashSet::default(),
            mem_deps: FxHashSet::default(),
            rev_mem_deps: FxHashSet::default(),
            control_deps: FxHashSet::default(),
            controls: FxHashSet::default(),
            callees: Vec::new(),
            actual_parameters: None,
            is_formal_parameter: false,
            slice_id: 0,
        }
    }

    /// Whether this node carries any incident edge of any kind (spec
    /// §4.7's removal precondition: a node with live operands, users,
    /// memory deps, or control deps cannot be removed).
    pub fn has_incident_edges(&self) -> bool {
        !self.uses.is_empty()
            || !self.users.is_empty()
            || !self.mem_deps.is_empty()
            || !self.rev_mem_deps.is_empty()
            || !self.control_deps.is_empty()
            || !self.controls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_node_has_no_incident_edges() {
        let n = DGNode::new(DGNodeId(0), DGNodeKind::Instruction, DependenceGraphId(0));
        assert!(!n.has_incident_edges());
        assert!(!n.is_formal_parameter);
    }
}
