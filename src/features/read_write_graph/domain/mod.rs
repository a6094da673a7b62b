pub mod block;
pub mod node;

pub use block::{RWBBlock, RWBBlockId, RWSubgraph};
pub use node::{DefSite, RWNode, RWNodeId, RWNodeKind, UseSite};
