//! `ReadWriteGraph`: the builder and sole owner of every [`RWNode`] and
//! [`RWBBlock`] (spec §3.4, §3.6), plus the per-instruction-kind
//! DefSite/UseSite construction rules of spec §4.3. Arena-owned the same
//! way [`crate::features::pointer_graph::infrastructure::builder::PointerGraph`]
//! is.

use super::intrinsics::is_pure_memory_safe;
use crate::features::pointer_graph::domain::PSNodeId;
use crate::features::pointer_graph::ports::PointerAnalysisResult;
use crate::features::read_write_graph::domain::{
    DefSite, RWBBlock, RWBBlockId, RWNode, RWNodeId, RWNodeKind, RWSubgraph, UseSite,
};
use crate::shared::{CoreError, CoreResult, GenericCallGraph, Interval, LocationId, Offset};
use rustc_hash::FxHashMap;

pub struct ReadWriteGraph {
    arena: Vec<Option<RWNode>>,
    blocks: Vec<Option<RWBBlock>>,
    subgraphs: FxHashMap<RWBBlockId, RWSubgraph>,
    pub call_graph: GenericCallGraph<RWNodeId>,
    /// The `UNKNOWN_MEMORY` abstract location DefSites/UseSites widen to
    /// when a call has no summary (spec §4.3).
    pub unknown_memory: LocationId,
}

impl ReadWriteGraph {
    pub fn new(unknown_memory: LocationId) -> Self {
        ReadWriteGraph {
            arena: Vec::new(),
            blocks: Vec::new(),
            subgraphs: FxHashMap::default(),
            call_graph: GenericCallGraph::new(),
            unknown_memory,
        }
    }

    pub fn create_node(&mut self, kind: RWNodeKind) -> RWNodeId {
        let id = RWNodeId(self.arena.len() as u32);
        self.arena.push(Some(RWNode::new(id, kind)));
        id
    }

    pub fn node(&self, id: RWNodeId) -> Option<&RWNode> {
        self.arena.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn node_mut(&mut self, id: RWNodeId) -> Option<&mut RWNode> {
        self.arena.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    pub fn create_block(&mut self) -> RWBBlockId {
        let id = RWBBlockId(self.blocks.len() as u32);
        self.blocks.push(Some(RWBBlock::new()));
        id
    }

    pub fn block(&self, id: RWBBlockId) -> Option<&RWBBlock> {
        self.blocks.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn block_mut(&mut self, id: RWBBlockId) -> Option<&mut RWBBlock> {
        self.blocks.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    pub fn push_to_block(&mut self, block: RWBBlockId, node: RWNodeId) -> CoreResult<()> {
        self.block_mut(block)
            .ok_or_else(|| CoreError::BuilderPrecondition(format!("no such block {}", block.0)))?
            .push(node);
        Ok(())
    }

    pub fn create_subgraph(&mut self, entry: RWBBlockId) -> RWBBlockId {
        self.subgraphs.insert(entry, RWSubgraph::new(entry));
        entry
    }

    pub fn subgraph(&self, entry: RWBBlockId) -> Option<&RWSubgraph> {
        self.subgraphs.get(&entry)
    }

    pub fn subgraph_mut(&mut self, entry: RWBBlockId) -> Option<&mut RWSubgraph> {
        self.subgraphs.get_mut(&entry)
    }

    pub fn add_cfg_edge(&mut self, from: RWNodeId, to: RWNodeId) -> CoreResult<()> {
        self.require_live(from)?;
        self.require_live(to)?;
        if let Some(n) = self.node_mut(from) {
            n.successors.push(to);
        }
        if let Some(n) = self.node_mut(to) {
            n.predecessors.push(from);
        }
        Ok(())
    }

    /// Direct (top-level SSA) use edge: `user` uses `operand`'s value (spec
    /// §4.6 step 3's source relation).
    pub fn add_operand(&mut self, user: RWNodeId, operand: RWNodeId) -> CoreResult<()> {
        self.require_live(user)?;
        self.require_live(operand)?;
        if let Some(n) = self.node_mut(user) {
            n.operands.push(operand);
        }
        if let Some(n) = self.node_mut(operand) {
            n.users.push(user);
        }
        Ok(())
    }

    fn require_live(&self, id: RWNodeId) -> CoreResult<()> {
        if self.node(id).is_none() {
            return Err(CoreError::BuilderPrecondition(format!(
                "reference to removed or nonexistent node {id}"
            )));
        }
        Ok(())
    }

    pub fn remove(&mut self, id: RWNodeId) -> CoreResult<()> {
        let node = self
            .node(id)
            .ok_or_else(|| CoreError::BuilderPrecondition(format!("node {id} already removed")))?;
        if !node.is_isolated() {
            return Err(CoreError::BuilderPrecondition(format!(
                "cannot remove node {id}: still has operands, users, or CFG edges"
            )));
        }
        self.arena[id.0 as usize] = None;
        Ok(())
    }

    /// `load p`: one UseSite per `(t,o) ∈ ptsTo(p)`, width from `access_width`
    /// (spec §4.3).
    pub fn build_load_sites(
        &mut self,
        node: RWNodeId,
        pointer: PSNodeId,
        access_width: Offset,
        pta: &dyn PointerAnalysisResult,
    ) -> CoreResult<()> {
        let pts = pta.points_to(pointer);
        let n = self
            .node_mut(node)
            .ok_or_else(|| CoreError::BuilderPrecondition(format!("no such node {node}")))?;
        for p in pts.iter() {
            n.use_sites.push(UseSite::new(p.location, p.offset, access_width));
        }
        Ok(())
    }

    /// `store v, p`: one DefSite per `(t,o) ∈ ptsTo(p)` (spec §4.3).
    pub fn build_store_sites(
        &mut self,
        node: RWNodeId,
        pointer: PSNodeId,
        access_width: Offset,
        pta: &dyn PointerAnalysisResult,
    ) -> CoreResult<()> {
        let pts = pta.points_to(pointer);
        let n = self
            .node_mut(node)
            .ok_or_else(|| CoreError::BuilderPrecondition(format!("no such node {node}")))?;
        for p in pts.iter() {
            n.def_sites.push(DefSite::new(p.location, p.offset, access_width));
        }
        Ok(())
    }

    /// `memcpy dst, src, n`: DefSite per dest pointer, UseSite per src
    /// pointer, both over `[offset, offset+n)` (`UNKNOWN` length if `n` is
    /// symbolic) (spec §4.3).
    pub fn build_memcpy_sites(
        &mut self,
        node: RWNodeId,
        dst: PSNodeId,
        src: PSNodeId,
        len: Offset,
        pta: &dyn PointerAnalysisResult,
    ) -> CoreResult<()> {
        let dst_pts = pta.points_to(dst);
        let src_pts = pta.points_to(src);
        let n = self
            .node_mut(node)
            .ok_or_else(|| CoreError::BuilderPrecondition(format!("no such node {node}")))?;
        for p in dst_pts.iter() {
            n.def_sites.push(DefSite::new(p.location, p.offset, len));
        }
        for p in src_pts.iter() {
            n.use_sites.push(UseSite::new(p.location, p.offset, len));
        }
        Ok(())
    }

    /// `free p`: one DefSite `(t, 0, UNKNOWN)` per `(t,_) ∈ ptsTo(p)` (spec
    /// §4.3 — `free` invalidates the whole object, so the offset is pinned
    /// to 0 regardless of which offset of `p` was freed).
    pub fn build_free_sites(
        &mut self,
        node: RWNodeId,
        pointer: PSNodeId,
        pta: &dyn PointerAnalysisResult,
    ) -> CoreResult<()> {
        let pts = pta.points_to(pointer);
        let n = self
            .node_mut(node)
            .ok_or_else(|| CoreError::BuilderPrecondition(format!("no such node {node}")))?;
        for p in pts.iter() {
            n.def_sites.push(DefSite::new(p.location, Offset::new(0), Offset::UNKNOWN));
        }
        Ok(())
    }

    /// An external call with no summary, unless `callee_name` is one of the
    /// fixed pure/memory-safe intrinsics (spec §4.3): one `UNKNOWN_MEMORY`
    /// DefSite and one `UNKNOWN_MEMORY` UseSite, covering the whole object.
    pub fn build_external_call_sites(&mut self, node: RWNodeId, callee_name: &str) -> CoreResult<()> {
        if is_pure_memory_safe(callee_name) {
            return Ok(());
        }
        let unknown_memory = self.unknown_memory;
        let n = self
            .node_mut(node)
            .ok_or_else(|| CoreError::BuilderPrecondition(format!("no such node {node}")))?;
        n.def_sites
            .push(DefSite::new(unknown_memory, Offset::new(0), Offset::UNKNOWN));
        n.use_sites
            .push(UseSite::new(unknown_memory, Offset::new(0), Offset::UNKNOWN));
        Ok(())
    }
}

/// `(offset, len)` normalized to the [`Interval`] the reaching-definitions
/// analysis queries with (spec §4.1's UNKNOWN semantics, reused here since
/// DefSite/UseSite follow the same normalization as memory-map intervals).
pub fn site_interval(offset: Offset, len: Offset) -> Interval {
    Interval::from_offset_len(offset, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{BitPointsToSet, Pointer, PointsToSet};

    struct FakePta(FxHashMap<PSNodeId, BitPointsToSet>);
    impl PointerAnalysisResult for FakePta {
        fn points_to(&self, node: PSNodeId) -> BitPointsToSet {
            self.0.get(&node).cloned().unwrap_or_default()
        }
    }

    #[test]
    fn load_site_construction_matches_points_to() {
        let mut rwg = ReadWriteGraph::new(LocationId(u32::MAX));
        let mut map = FxHashMap::default();
        let mut pts = BitPointsToSet::default();
        pts.insert(Pointer::new(LocationId(7), Offset::new(2)));
        map.insert(PSNodeId(3), pts);
        let pta = FakePta(map);

        let load = rwg.create_node(RWNodeKind::Load);
        rwg.build_load_sites(load, PSNodeId(3), Offset::new(4), &pta).unwrap();
        let n = rwg.node(load).unwrap();
        assert_eq!(n.use_sites.len(), 1);
        assert_eq!(n.use_sites[0].target, LocationId(7));
        assert_eq!(n.use_sites[0].offset, Offset::new(2));
    }

    #[test]
    fn external_call_without_summary_widens_to_unknown_memory() {
        let mut rwg = ReadWriteGraph::new(LocationId(999));
        let call = rwg.create_node(RWNodeKind::Call);
        rwg.build_external_call_sites(call, "opaque_vendor_fn").unwrap();
        let n = rwg.node(call).unwrap();
        assert_eq!(n.def_sites.len(), 1);
        assert_eq!(n.def_sites[0].target, LocationId(999));
        assert_eq!(n.use_sites.len(), 1);
    }

    #[test]
    fn pure_intrinsic_call_gets_no_sites() {
        let mut rwg = ReadWriteGraph::new(LocationId(999));
        let call = rwg.create_node(RWNodeKind::Call);
        rwg.build_external_call_sites(call, "lifetime_end").unwrap();
        let n = rwg.node(call).unwrap();
        assert!(n.def_sites.is_empty());
        assert!(n.use_sites.is_empty());
    }

    #[test]
    fn free_site_pins_offset_to_zero() {
        let mut rwg = ReadWriteGraph::new(LocationId(u32::MAX));
        let mut map = FxHashMap::default();
        let mut pts = BitPointsToSet::default();
        pts.insert(Pointer::new(LocationId(5), Offset::new(8)));
        map.insert(PSNodeId(1), pts);
        let pta = FakePta(map);

        let free = rwg.create_node(RWNodeKind::Intrinsic);
        rwg.build_free_sites(free, PSNodeId(1), &pta).unwrap();
        let n = rwg.node(free).unwrap();
        assert_eq!(n.def_sites[0].offset, Offset::new(0));
        assert!(n.def_sites[0].len.is_unknown());
    }
}
