//! System Dependence Graph construction (spec §3.5, §4.6): one
//! `DependenceGraph` per procedure, assembled from the read-write graph
//! plus the pointer, reaching-definitions, and control-dependence results
//! computed over it, and the top-level `SystemDependenceGraph` arena that
//! owns every procedure's nodes and blocks.

pub mod domain;
pub mod infrastructure;

pub use domain::{
    DGArgumentPair, DGBBlock, DGBBlockId, DGNode, DGNodeId, DGNodeKind, DGParameters,
    DependenceGraph, DependenceGraphId,
};
pub use infrastructure::{assemble, CallSite, FunctionInput, SystemDependenceGraph};
