//! The Read-Write Graph: per-instruction memory-effect nodes built from the
//! IR plus pointer-analysis results (spec §3.4, §4.3).

pub mod domain;
pub mod infrastructure;

pub use domain::{DefSite, RWBBlock, RWBBlockId, RWNode, RWNodeId, RWNodeKind, RWSubgraph, UseSite};
pub use infrastructure::ReadWriteGraph;
