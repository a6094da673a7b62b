//! Control-dependence analysis (spec §3.5, §4.5): NTSCD over an
//! interprocedural block graph.

pub mod domain;
pub mod infrastructure;

pub use domain::{BlockGraph, CDFunction};
pub use infrastructure::{compute, ControlDependence};
