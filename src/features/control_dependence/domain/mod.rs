//! The interprocedural block graph NTSCD runs over (spec §4.5), plus the
//! minimal per-function membership NTSCD's interprocedural extension needs
//! (entry, exits, call-return blocks).
//!
//! Generic over the block key `K`, the same way
//! [`crate::shared::GenericCallGraph`] is generic over call targets: this
//! crate's own pipeline keys blocks by [`crate::features::read_write_graph::RWBBlockId`]
//! directly, so control dependence does not need its own parallel id space
//! or a bidirectional mapping table back to the read-write graph's blocks.

pub mod block_graph;

pub use block_graph::{BlockGraph, CDFunction};
