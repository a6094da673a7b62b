//! Mark/sweep backward slicing over an assembled [`SystemDependenceGraph`]
//! (spec §3.5's closing stage, §4.7).
//!
//! [`SystemDependenceGraph`]: crate::features::sdg::SystemDependenceGraph

pub mod domain;
pub mod infrastructure;

pub use domain::SlicerStatistics;
pub use infrastructure::Slicer;
