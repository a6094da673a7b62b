pub mod node;
pub mod subgraph;

pub use crate::shared::GenericCallGraph;
pub use node::{PSNode, PSNodeData, PSNodeId, PSNodeKind};
pub use subgraph::PointerSubgraph;
