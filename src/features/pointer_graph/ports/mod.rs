//! The consumer-facing result port of the pointer analysis (spec §6.1):
//! `PointerAnalysis: getPointsTo(node) -> PointsToSet`. Both the FI and FS
//! solvers produce a value implementing this trait so downstream features
//! (the read-write graph builder, §4.3) do not need to know which variant
//! ran.

use crate::features::pointer_graph::domain::PSNodeId;
use crate::shared::BitPointsToSet;

pub trait PointerAnalysisResult {
    fn points_to(&self, node: PSNodeId) -> BitPointsToSet;
}
