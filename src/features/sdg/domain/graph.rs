//! `DependenceGraph` (spec §3.5): one procedure's nodes, bblocks, and
//! formal parameters, owned by a top-level `SystemDependenceGraph` arena.

use super::block::DGBBlockId;
use super::node::DGNodeId;
use super::parameters::DGParameters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DependenceGraphId(pub u32);

impl std::fmt::Display for DependenceGraphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dg-fn{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct DependenceGraph {
    pub id: DependenceGraphId,
    pub function_name: String,
    pub entry_block: Option<DGBBlockId>,
    pub blocks: Vec<DGBBlockId>,
    pub nodes: Vec<DGNodeId>,
    pub formal_parameters: DGParameters,
    pub is_variadic: bool,
    /// Slice membership tag (spec §4.7); `0` means unmarked.
    pub slice_id: u32,
}

impl DependenceGraph {
    pub fn new(id: DependenceGraphId, function_name: String) -> Self {
        DependenceGraph {
            id,
            function_name,
            entry_block: None,
            blocks: Vec::new(),
            nodes: Vec::new(),
            formal_parameters: DGParameters::new(),
            is_variadic: false,
            slice_id: 0,
        }
    }
}
