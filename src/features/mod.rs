//! Feature-first vertical slices of the analysis pipeline (spec §2's
//! component list), each laid out as `domain` (owned data model) plus
//! `infrastructure` (builders, solvers) and, where the feature has one, a
//! `ports` module for the trait its results are consumed through.
//!
//! Pipeline order (each stage's `infrastructure` consumes the previous
//! stage's public types):
//!
//! `pointer_graph` → `read_write_graph` → `reaching_definitions` →
//! `control_dependence` → `sdg` → `slicing`.

pub mod control_dependence;
pub mod pointer_graph;
pub mod reaching_definitions;
pub mod read_write_graph;
pub mod sdg;
pub mod slicing;
