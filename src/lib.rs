//! System Dependence Graph construction and program slicing over a typed,
//! SSA-style low-level IR.
//!
//! Feature-first layout:
//!
//! - `shared/`   : cross-feature ADTs (disjunctive interval map, points-to
//!                 set, sparse bitvector, dominator tree, call graph, the
//!                 crate-wide error type and diagnostics sink).
//! - `features/` : the six pipeline stages, pointer graph through slicing,
//!                 each its own `domain` + `infrastructure` (+ `ports`)
//!                 vertical slice.
//! - `config/`   : analysis configuration (pointer-analysis variant,
//!                 iteration caps, summary memoization), presets, YAML.
//!
//! There is no on-disk bitcode parsing and no DOT/graph pretty-printing in
//! this crate: per spec §1, those are the IR-specific front end's job. The
//! pipeline here starts from [`features::pointer_graph::PointerGraph`] and
//! [`features::read_write_graph::ReadWriteGraph`] builder calls a front end
//! makes directly.

#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

/// Shared ADTs and utilities (spec §3.1, §9).
pub mod shared;

/// The six pipeline-stage features (spec §2, §4).
pub mod features;

/// Analysis configuration (pointer-analysis variant, iteration caps,
/// summary memoization).
pub mod config;

pub use config::{AnalysisConfig, PointerAnalysisKind};
pub use shared::{CoreError, CoreResult};

pub use features::control_dependence::{compute as compute_control_dependence, BlockGraph, CDFunction, ControlDependence};
pub use features::pointer_graph::{solve_fi, solve_fs, PointerAnalysisResult, PointerGraph};
pub use features::reaching_definitions::{ReachingDefinitionsAnalysis, EXTERNAL_OR_INITIAL};
pub use features::read_write_graph::ReadWriteGraph;
pub use features::sdg::{assemble, CallSite, FunctionInput, SystemDependenceGraph};
pub use features::slicing::domain::SlicerStatistics;
pub use features::slicing::infrastructure::Slicer;
