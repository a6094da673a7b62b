//! The reaching-definitions worklist solver (spec §4.4).

pub mod rda;

pub use rda::{ReachingDefinitionsAnalysis, EXTERNAL_OR_INITIAL};
