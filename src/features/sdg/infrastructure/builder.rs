//! `SystemDependenceGraph`: the builder and sole owner of every
//! [`DGNode`]/[`DGBBlock`]/[`DependenceGraph`] (spec §3.5, §3.6), plus the
//! edge operations and isolate-then-remove primitives spec §4.7's slicer
//! drives. Arena-owned the same way
//! [`crate::features::pointer_graph::infrastructure::PointerGraph`] is.

use crate::features::sdg::domain::{
    DGArgumentPair, DGBBlock, DGBBlockId, DGNode, DGNodeId, DGNodeKind, DependenceGraph,
    DependenceGraphId,
};
use crate::shared::{CoreError, CoreResult};
use lru::LruCache;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::num::NonZeroUsize;

pub struct SystemDependenceGraph {
    node_arena: Vec<Option<DGNode>>,
    block_arena: Vec<Option<DGBBlock>>,
    graph_arena: Vec<Option<DependenceGraph>>,
    by_function: FxHashMap<String, DependenceGraphId>,
    /// Memoized intra-procedural reachability for summary-edge computation
    /// (spec §4.6 step 7), keyed by `(callee, from, to)`. `None` when
    /// `AnalysisConfig::memoize_summaries` is unset.
    summary_cache: Option<LruCache<(DependenceGraphId, DGNodeId, DGNodeId), bool>>,
}

impl SystemDependenceGraph {
    pub fn new(summary_cache_capacity: usize) -> Self {
        SystemDependenceGraph {
            node_arena: Vec::new(),
            block_arena: Vec::new(),
            graph_arena: Vec::new(),
            by_function: FxHashMap::default(),
            summary_cache: NonZeroUsize::new(summary_cache_capacity).map(LruCache::new),
        }
    }

    // -- dependence graphs (procedures) ----------------------------------

    /// Registers a new procedure. Fatal if `function_name` already has a
    /// [`DependenceGraph`] (spec §3.6: one subgraph per function, duplicate
    /// registration is a builder bug).
    pub fn create_graph(&mut self, function_name: &str) -> CoreResult<DependenceGraphId> {
        if self.by_function.contains_key(function_name) {
            return Err(CoreError::BuilderPrecondition(format!(
                "duplicate dependence graph for function '{function_name}'"
            )));
        }
        let id = DependenceGraphId(self.graph_arena.len() as u32);
        self.graph_arena
            .push(Some(DependenceGraph::new(id, function_name.to_string())));
        self.by_function.insert(function_name.to_string(), id);
        Ok(id)
    }

    pub fn graph(&self, id: DependenceGraphId) -> Option<&DependenceGraph> {
        self.graph_arena.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn graph_mut(&mut self, id: DependenceGraphId) -> Option<&mut DependenceGraph> {
        self.graph_arena.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    pub fn graph_by_function(&self, function_name: &str) -> CoreResult<DependenceGraphId> {
        self.by_function
            .get(function_name)
            .copied()
            .ok_or_else(|| CoreError::UnknownFunction(function_name.to_string()))
    }

    // -- blocks -----------------------------------------------------------

    pub fn create_block(&mut self, owner: DependenceGraphId) -> CoreResult<DGBBlockId> {
        let id = DGBBlockId(self.block_arena.len() as u32);
        self.block_arena.push(Some(DGBBlock::new(id, owner)));
        let g = self
            .graph_mut(owner)
            .ok_or_else(|| CoreError::BuilderPrecondition(format!("no such dependence graph {}", owner.0)))?;
        if g.entry_block.is_none() {
            g.entry_block = Some(id);
        }
        g.blocks.push(id);
        Ok(id)
    }

    pub fn block(&self, id: DGBBlockId) -> Option<&DGBBlock> {
        self.block_arena.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn block_mut(&mut self, id: DGBBlockId) -> Option<&mut DGBBlock> {
        self.block_arena.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    pub fn add_block_edge(&mut self, from: DGBBlockId, to: DGBBlockId) -> CoreResult<()> {
        self.block_mut(from)
            .ok_or_else(|| CoreError::BuilderPrecondition(format!("no such block {}", from.0)))?
            .successors
            .push(to);
        self.block_mut(to)
            .ok_or_else(|| CoreError::BuilderPrecondition(format!("no such block {}", to.0)))?
            .predecessors
            .push(from);
        Ok(())
    }

    // -- nodes --------------------------------------------------------------

    pub fn create_node(
        &mut self,
        owner: DependenceGraphId,
        block: Option<DGBBlockId>,
        kind: DGNodeKind,
    ) -> CoreResult<DGNodeId> {
        let id = DGNodeId(self.node_arena.len() as u32);
        let mut n = DGNode::new(id, kind, owner);
        n.bblock = block;
        self.node_arena.push(Some(n));

        self.graph_mut(owner)
            .ok_or_else(|| CoreError::BuilderPrecondition(format!("no such dependence graph {}", owner.0)))?
            .nodes
            .push(id);
        if let Some(b) = block {
            self.block_mut(b)
                .ok_or_else(|| CoreError::BuilderPrecondition(format!("no such block {}", b.0)))?
                .push(id);
        }
        Ok(id)
    }

    pub fn node(&self, id: DGNodeId) -> Option<&DGNode> {
        self.node_arena.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn node_mut(&mut self, id: DGNodeId) -> Option<&mut DGNode> {
        self.node_arena.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    fn require_live(&self, id: DGNodeId) -> CoreResult<()> {
        if self.node(id).is_none() {
            return Err(CoreError::BuilderPrecondition(format!(
                "reference to removed or nonexistent node {id}"
            )));
        }
        Ok(())
    }

    /// Direct use-def edge (spec §4.6 step 3): `user` uses `operand`'s
    /// value.
    pub fn add_uses(&mut self, user: DGNodeId, operand: DGNodeId) -> CoreResult<()> {
        self.require_live(user)?;
        self.require_live(operand)?;
        self.node_mut(user).unwrap().uses.insert(operand);
        self.node_mut(operand).unwrap().users.insert(user);
        Ok(())
    }

    /// Memory-dependence edge (spec §4.6 step 4): `reader` reads a value
    /// last written by `writer`.
    pub fn add_memory_dep(&mut self, reader: DGNodeId, writer: DGNodeId) -> CoreResult<()> {
        self.require_live(reader)?;
        self.require_live(writer)?;
        self.node_mut(reader).unwrap().mem_deps.insert(writer);
        self.node_mut(writer).unwrap().rev_mem_deps.insert(reader);
        Ok(())
    }

    /// Control-dependence edge (spec §4.6 step 5): `dependent` is
    /// control-dependent on `controller`.
    pub fn add_control_dep(&mut self, dependent: DGNodeId, controller: DGNodeId) -> CoreResult<()> {
        self.require_live(dependent)?;
        self.require_live(controller)?;
        self.node_mut(dependent).unwrap().control_deps.insert(controller);
        self.node_mut(controller).unwrap().controls.insert(dependent);
        Ok(())
    }

    /// Creates one artificial input/output node pair, unattached to any
    /// block (spec §3.5: parameter nodes live outside the ordinary CFG,
    /// the same as in the original's `DGParameters`).
    pub fn create_argument_pair(&mut self, owner: DependenceGraphId, is_formal: bool) -> CoreResult<DGArgumentPair> {
        let input = self.create_node(owner, None, DGNodeKind::Argument)?;
        let output = self.create_node(owner, None, DGNodeKind::Argument)?;
        if is_formal {
            self.node_mut(input).unwrap().is_formal_parameter = true;
            self.node_mut(output).unwrap().is_formal_parameter = true;
        }
        Ok(DGArgumentPair { input, output })
    }

    pub fn create_artificial_node(&mut self, owner: DependenceGraphId, is_formal: bool) -> CoreResult<DGNodeId> {
        let id = self.create_node(owner, None, DGNodeKind::Artificial)?;
        if is_formal {
            self.node_mut(id).unwrap().is_formal_parameter = true;
        }
        Ok(id)
    }

    /// The first node of `owner`'s entry block (spec §4.7: the node the
    /// mark phase re-enqueues when it reaches a formal-parameter node, so
    /// every call site referencing `owner` is conservatively marked too).
    pub fn entry_node(&self, owner: DependenceGraphId) -> Option<DGNodeId> {
        let g = self.graph(owner)?;
        let entry = g.entry_block?;
        self.block(entry)?.first()
    }

    // -- removal (isolate-then-delete, spec §4.7 sweep phase) ------------

    /// Removes a node that already has no incident edges. Fatal otherwise
    /// (spec §4.7's "Error conditions": callers must disconnect a node
    /// before removing it; [`Self::force_remove_node`] does both for the
    /// sweep phase).
    pub fn remove_node(&mut self, id: DGNodeId) -> CoreResult<()> {
        let node = self
            .node(id)
            .ok_or_else(|| CoreError::BuilderPrecondition(format!("node {id} already removed")))?;
        if node.has_incident_edges() {
            return Err(CoreError::BuilderPrecondition(format!(
                "cannot remove node {id}: still has use, memory, or control edges"
            )));
        }
        let owner = node.owner;
        let bblock = node.bblock;
        self.node_arena[id.0 as usize] = None;
        if let Some(g) = self.graph_mut(owner) {
            g.nodes.retain(|x| *x != id);
        }
        if let Some(b) = bblock {
            if let Some(blk) = self.block_mut(b) {
                blk.nodes.retain(|x| *x != id);
            }
        }
        Ok(())
    }

    fn disconnect_node(&mut self, id: DGNodeId) {
        let (uses, users, mem_deps, rev_mem_deps, control_deps, controls) = match self.node(id) {
            Some(n) => (
                n.uses.clone(),
                n.users.clone(),
                n.mem_deps.clone(),
                n.rev_mem_deps.clone(),
                n.control_deps.clone(),
                n.controls.clone(),
            ),
            None => return,
        };
        for o in &uses {
            if let Some(n) = self.node_mut(*o) {
                n.users.remove(&id);
            }
        }
        for u in &users {
            if let Some(n) = self.node_mut(*u) {
                n.uses.remove(&id);
            }
        }
        for w in &mem_deps {
            if let Some(n) = self.node_mut(*w) {
                n.rev_mem_deps.remove(&id);
            }
        }
        for r in &rev_mem_deps {
            if let Some(n) = self.node_mut(*r) {
                n.mem_deps.remove(&id);
            }
        }
        for c in &control_deps {
            if let Some(n) = self.node_mut(*c) {
                n.controls.remove(&id);
            }
        }
        for c in &controls {
            if let Some(n) = self.node_mut(*c) {
                n.control_deps.remove(&id);
            }
        }
        if let Some(n) = self.node_mut(id) {
            n.uses.clear();
            n.users.clear();
            n.mem_deps.clear();
            n.rev_mem_deps.clear();
            n.control_deps.clear();
            n.controls.clear();
        }
    }

    /// Severs every incident edge, then removes the node. Used by the
    /// sweep phase, which (unlike ordinary builder callers) does not
    /// maintain the isolation precondition itself.
    pub fn force_remove_node(&mut self, id: DGNodeId) -> CoreResult<()> {
        self.disconnect_node(id);
        self.remove_node(id)
    }

    /// Reconnects every predecessor of `id` directly to every successor of
    /// `id`, explicitly skipping a self-loop (spec §9, grounded in
    /// `BBlock::isolate`'s `if (succ.target != this)` check), then clears
    /// `id`'s own edge lists.
    fn isolate_block(&mut self, id: DGBBlockId) {
        let (preds, succs) = match self.block(id) {
            Some(b) => (b.predecessors.clone(), b.successors.clone()),
            None => return,
        };
        for p in &preds {
            if *p == id {
                continue;
            }
            if let Some(pb) = self.block_mut(*p) {
                pb.successors.retain(|s| *s != id);
                for s in &succs {
                    if *s != id && !pb.successors.contains(s) {
                        pb.successors.push(*s);
                    }
                }
            }
        }
        for s in &succs {
            if *s == id {
                continue;
            }
            if let Some(sb) = self.block_mut(*s) {
                sb.predecessors.retain(|p| *p != id);
                for p in &preds {
                    if *p != id && !sb.predecessors.contains(p) {
                        sb.predecessors.push(*p);
                    }
                }
            }
        }
        if let Some(b) = self.block_mut(id) {
            b.predecessors.clear();
            b.successors.clear();
        }
    }

    /// Isolates `id` (splicing its predecessors onto its successors) and
    /// then force-removes every node it still contains, finally dropping
    /// the block itself from its owning graph (spec §4.7 sweep phase,
    /// grounded in `BBlock::remove(with_nodes=true)`).
    pub fn remove_block(&mut self, id: DGBBlockId) -> CoreResult<()> {
        self.isolate_block(id);
        let (nodes, owner) = match self.block(id) {
            Some(b) => (b.nodes.clone(), b.owner),
            None => return Ok(()),
        };
        for n in nodes {
            self.force_remove_node(n)?;
        }
        self.block_arena[id.0 as usize] = None;
        if let Some(g) = self.graph_mut(owner) {
            g.blocks.retain(|x| *x != id);
            if g.entry_block == Some(id) {
                g.entry_block = None;
            }
        }
        Ok(())
    }

    // -- slice tagging (written by the slicer's mark phase) --------------

    pub fn set_node_slice(&mut self, id: DGNodeId, slice_id: u32) {
        if let Some(n) = self.node_mut(id) {
            n.slice_id = slice_id;
        }
    }

    pub fn set_block_slice(&mut self, id: DGBBlockId, slice_id: u32) {
        if let Some(b) = self.block_mut(id) {
            b.slice_id = slice_id;
        }
    }

    pub fn set_graph_slice(&mut self, id: DependenceGraphId, slice_id: u32) {
        if let Some(g) = self.graph_mut(id) {
            g.slice_id = slice_id;
        }
    }

    // -- summary-edge reachability (spec §4.6 step 7) ---------------------

    /// Whether `to` is reachable from `from` through intra-procedural
    /// use/memory/control edges, restricted to nodes owned by `owner`
    /// (spec §4.6 step 7: "memoized per-callee reachability between a
    /// formal-in and a formal-out node"). Memoized when the cache was
    /// constructed with nonzero capacity.
    pub fn summary_reachable(&mut self, owner: DependenceGraphId, from: DGNodeId, to: DGNodeId) -> bool {
        let key = (owner, from, to);
        if let Some(cache) = self.summary_cache.as_mut() {
            if let Some(&hit) = cache.get(&key) {
                return hit;
            }
        }

        let mut visited = std::collections::HashSet::new();
        let mut worklist = VecDeque::new();
        worklist.push_back(from);
        visited.insert(from);
        let mut found = false;
        while let Some(cur) = worklist.pop_front() {
            if cur == to {
                found = true;
                break;
            }
            let Some(node) = self.node(cur) else { continue };
            if node.owner != owner {
                continue;
            }
            for next in node.users.iter().chain(node.rev_mem_deps.iter()).chain(node.controls.iter()) {
                if visited.insert(*next) {
                    worklist.push_back(*next);
                }
            }
        }

        if let Some(cache) = self.summary_cache.as_mut() {
            cache.put(key, found);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_function_registration_is_fatal() {
        let mut sdg = SystemDependenceGraph::new(0);
        sdg.create_graph("f").unwrap();
        assert!(sdg.create_graph("f").is_err());
    }

    #[test]
    fn removing_node_with_edges_is_fatal() {
        let mut sdg = SystemDependenceGraph::new(0);
        let g = sdg.create_graph("f").unwrap();
        let b = sdg.create_block(g).unwrap();
        let a = sdg.create_node(g, Some(b), DGNodeKind::Instruction).unwrap();
        let c = sdg.create_node(g, Some(b), DGNodeKind::Instruction).unwrap();
        sdg.add_uses(a, c).unwrap();
        assert!(sdg.remove_node(a).is_err());
        sdg.force_remove_node(a).unwrap();
        assert!(sdg.node(a).is_none());
        assert!(sdg.node(c).unwrap().users.is_empty());
    }

    #[test]
    fn isolate_block_reconnects_predecessors_to_successors() {
        let mut sdg = SystemDependenceGraph::new(0);
        let g = sdg.create_graph("f").unwrap();
        let b0 = sdg.create_block(g).unwrap();
        let b1 = sdg.create_block(g).unwrap();
        let b2 = sdg.create_block(g).unwrap();
        sdg.add_block_edge(b0, b1).unwrap();
        sdg.add_block_edge(b1, b2).unwrap();

        sdg.remove_block(b1).unwrap();

        assert_eq!(sdg.block(b0).unwrap().successors, vec![b2]);
        assert_eq!(sdg.block(b2).unwrap().predecessors, vec![b0]);
        assert!(sdg.block(b1).is_none());
    }

    #[test]
    fn isolate_block_suppresses_self_loop() {
        let mut sdg = SystemDependenceGraph::new(0);
        let g = sdg.create_graph("f").unwrap();
        let b0 = sdg.create_block(g).unwrap();
        let loop_block = sdg.create_block(g).unwrap();
        sdg.add_block_edge(b0, loop_block).unwrap();
        sdg.add_block_edge(loop_block, loop_block).unwrap();

        sdg.remove_block(loop_block).unwrap();

        // b0 should not gain a self-loop-turned-dangling edge to the
        // removed block, nor a spurious edge to itself.
        assert!(sdg.block(b0).unwrap().successors.is_empty());
    }

    #[test]
    fn summary_reachable_follows_use_edges() {
        let mut sdg = SystemDependenceGraph::new(16);
        let g = sdg.create_graph("f").unwrap();
        let b = sdg.create_block(g).unwrap();
        let formal_in = sdg.create_node(g, Some(b), DGNodeKind::Argument).unwrap();
        let mid = sdg.create_node(g, Some(b), DGNodeKind::Instruction).unwrap();
        let formal_out = sdg.create_node(g, Some(b), DGNodeKind::Argument).unwrap();
        sdg.add_uses(mid, formal_in).unwrap();
        sdg.add_uses(formal_out, mid).unwrap();

        assert!(sdg.summary_reachable(g, formal_in, formal_out));
    }
}
