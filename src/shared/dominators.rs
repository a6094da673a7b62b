//! Dominator-tree construction (spec §9: "re-architect as an internal
//! utility over the per-subgraph CFG; needed only for reverse-postorder
//! ordering and not for correctness").
//!
//! The original delegates to its host IR's dominator facility; we compute
//! it ourselves using the iterative Cooper/Harvey/Kennedy algorithm, which
//! converges to the same tree as Lengauer–Tarjan but is far simpler to get
//! right without relying on the external IR. It is only ever consulted for
//! the reverse-postorder numbering the flow-sensitive solver (§4.2) uses as
//! its worklist order; solver results never depend on the order, so a
//! bug here could only cost iterations, never soundness.

use rustc_hash::FxHashMap;

/// Dense node index into a per-subgraph CFG, as assigned by the caller
/// (typically a `RWBBlock`/basic-block id).
pub type NodeIndex = u32;

/// The dominator tree of a single-entry CFG: for every reachable node
/// other than `entry`, its immediate dominator.
pub struct Dominators {
    entry: NodeIndex,
    idom: FxHashMap<NodeIndex, NodeIndex>,
    rpo: Vec<NodeIndex>,
}

impl Dominators {
    /// Computes the dominator tree of the CFG given by `entry` and
    /// `successors` (a lookup from node to its successor node list).
    /// Nodes unreachable from `entry` are absent from the result.
    pub fn compute(entry: NodeIndex, successors: impl Fn(NodeIndex) -> Vec<NodeIndex>) -> Self {
        let rpo = reverse_postorder(entry, &successors);
        let rpo_index: FxHashMap<NodeIndex, usize> =
            rpo.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        let predecessors = build_predecessors(&rpo, &successors);

        let mut idom: FxHashMap<NodeIndex, NodeIndex> = FxHashMap::default();
        idom.insert(entry, entry);

        let mut changed = true;
        while changed {
            changed = false;
            // Skip index 0 (entry) — it has no real idom.
            for &node in rpo.iter().skip(1) {
                let preds = match predecessors.get(&node) {
                    Some(p) => p,
                    None => continue,
                };
                let mut new_idom: Option<NodeIndex> = None;
                for &p in preds {
                    if !idom.contains_key(&p) {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => p,
                        Some(cur) => intersect(cur, p, &idom, &rpo_index),
                    });
                }
                if let Some(new_idom) = new_idom {
                    if idom.get(&node) != Some(&new_idom) {
                        idom.insert(node, new_idom);
                        changed = true;
                    }
                }
            }
        }

        Dominators { entry, idom, rpo }
    }

    /// The immediate dominator of `node`, or `None` if `node` is the entry
    /// or unreachable.
    pub fn immediate_dominator(&self, node: NodeIndex) -> Option<NodeIndex> {
        if node == self.entry {
            return None;
        }
        self.idom.get(&node).copied()
    }

    /// `a` dominates `b` (reflexively: every node dominates itself).
    pub fn dominates(&self, a: NodeIndex, b: NodeIndex) -> bool {
        if a == b {
            return true;
        }
        let mut cur = b;
        while let Some(&idom) = self.idom.get(&cur) {
            if idom == cur {
                break;
            }
            if idom == a {
                return true;
            }
            cur = idom;
        }
        false
    }

    /// Reverse-postorder numbering of the reachable nodes, entry first.
    /// This is the ordering the flow-sensitive solver's worklist uses.
    pub fn reverse_postorder(&self) -> &[NodeIndex] {
        &self.rpo
    }
}

fn intersect(
    a: NodeIndex,
    b: NodeIndex,
    idom: &FxHashMap<NodeIndex, NodeIndex>,
    rpo_index: &FxHashMap<NodeIndex, usize>,
) -> NodeIndex {
    let mut finger1 = a;
    let mut finger2 = b;
    while finger1 != finger2 {
        while rpo_index[&finger1] > rpo_index[&finger2] {
            finger1 = idom[&finger1];
        }
        while rpo_index[&finger2] > rpo_index[&finger1] {
            finger2 = idom[&finger2];
        }
    }
    finger1
}

fn reverse_postorder(
    entry: NodeIndex,
    successors: &impl Fn(NodeIndex) -> Vec<NodeIndex>,
) -> Vec<NodeIndex> {
    let mut visited = rustc_hash::FxHashSet::default();
    let mut postorder = Vec::new();
    let mut stack: Vec<(NodeIndex, usize)> = vec![(entry, 0)];
    visited.insert(entry);

    while let Some((node, next_child)) = stack.pop() {
        let succs = successors(node);
        if next_child < succs.len() {
            let child = succs[next_child];
            stack.push((node, next_child + 1));
            if visited.insert(child) {
                stack.push((child, 0));
            }
        } else {
            postorder.push(node);
        }
    }

    postorder.reverse();
    postorder
}

fn build_predecessors(
    rpo: &[NodeIndex],
    successors: &impl Fn(NodeIndex) -> Vec<NodeIndex>,
) -> FxHashMap<NodeIndex, Vec<NodeIndex>> {
    let mut preds: FxHashMap<NodeIndex, Vec<NodeIndex>> = FxHashMap::default();
    for &node in rpo {
        for succ in successors(node) {
            preds.entry(succ).or_default().push(node);
        }
    }
    preds
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ```text
    /// 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3
    /// ```
    fn diamond(n: NodeIndex) -> Vec<NodeIndex> {
        match n {
            0 => vec![1, 2],
            1 => vec![3],
            2 => vec![3],
            _ => vec![],
        }
    }

    #[test]
    fn diamond_join_dominated_by_entry() {
        let dom = Dominators::compute(0, diamond);
        assert_eq!(dom.immediate_dominator(1), Some(0));
        assert_eq!(dom.immediate_dominator(2), Some(0));
        assert_eq!(dom.immediate_dominator(3), Some(0));
        assert!(dom.dominates(0, 3));
        assert!(!dom.dominates(1, 3));
        assert!(!dom.dominates(2, 3));
    }

    #[test]
    fn linear_chain_each_dominates_next() {
        let succ = |n: NodeIndex| if n < 3 { vec![n + 1] } else { vec![] };
        let dom = Dominators::compute(0, succ);
        assert_eq!(dom.immediate_dominator(1), Some(0));
        assert_eq!(dom.immediate_dominator(2), Some(1));
        assert_eq!(dom.immediate_dominator(3), Some(2));
        assert!(dom.dominates(0, 3));
    }

    #[test]
    fn reverse_postorder_places_entry_first() {
        let dom = Dominators::compute(0, diamond);
        assert_eq!(dom.reverse_postorder()[0], 0);
    }

    #[test]
    fn loop_back_edge_does_not_change_idom_of_header() {
        // 0 -> 1 -> 2 -> 1 (back edge), 2 -> 3
        let succ = |n: NodeIndex| match n {
            0 => vec![1],
            1 => vec![2],
            2 => vec![1, 3],
            _ => vec![],
        };
        let dom = Dominators::compute(0, succ);
        assert_eq!(dom.immediate_dominator(1), Some(0));
        assert_eq!(dom.immediate_dominator(2), Some(1));
        assert_eq!(dom.immediate_dominator(3), Some(2));
    }
}
