//! Pointer subgraph construction and points-to analysis (spec §3.2, §4.2).
//!
//! Feature-first layout: [`domain`] holds the node/subgraph/call-graph
//! types, [`infrastructure`] holds the builder and the two solver variants,
//! [`ports`] holds the trait downstream features consume results through.
//! There is no `application` layer: this feature has no orchestration
//! beyond "build a graph, then run one of two solvers over it", which the
//! public functions in `infrastructure` already express directly.

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{GenericCallGraph, PSNode, PSNodeData, PSNodeId, PSNodeKind, PointerSubgraph};
pub use infrastructure::{solve_fi, solve_fs, MemoryMap, PointerGraph, Singletons};
pub use ports::PointerAnalysisResult;
