//! Reaching-definitions / memory-SSA analysis (spec §3.4's `DefinitionsMap`,
//! §4.4's worklist solver).

pub mod domain;
pub mod infrastructure;

pub use domain::DefinitionsMap;
pub use infrastructure::{ReachingDefinitionsAnalysis, EXTERNAL_OR_INITIAL};
