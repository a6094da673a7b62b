//! Builders and solvers for the pointer subgraph (spec §4.2).

pub mod builder;
pub mod memory_map;
pub mod scc;
pub mod solver_fi;
pub mod solver_fs;

pub use builder::{PointerGraph, Singletons};
pub use memory_map::MemoryMap;
pub use solver_fi::{solve as solve_fi, PointerAnalysisFiResult};
pub use solver_fs::{solve as solve_fs, PointerAnalysisFsResult};
