//! `DGArgumentPair`/`DGParameters` (spec §3.5): the artificial input/output
//! node pair representing one formal or actual parameter, and their owning
//! container — grounded in `examples/original_source/include/dg/
//! SystemDependenceGraph/DGParameters.h`. `DGFormalParameters` and
//! `DGActualParameters` in the original differ only in which element owns
//! the container (a `DependenceGraph` vs. a call `DGNode`); the shape is
//! identical, so a single [`DGParameters`] type serves both here.

use super::node::DGNodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DGArgumentPair {
    pub input: DGNodeId,
    pub output: DGNodeId,
}

#[derive(Debug, Clone, Default)]
pub struct DGParameters {
    pub pairs: Vec<DGArgumentPair>,
    pub return_node: Option<DGNodeId>,
    pub noreturn_node: Option<DGNodeId>,
    /// Only set for a variadic function's formal parameters, or a variadic
    /// call's actual parameters.
    pub vararg: Option<DGNodeId>,
}

impl DGParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pair: DGArgumentPair) {
        self.pairs.push(pair);
    }

    pub fn parameters_num(&self) -> usize {
        self.pairs.len()
    }

    pub fn get(&self, index: usize) -> Option<&DGArgumentPair> {
        self.pairs.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_parameters_have_no_pairs() {
        let p = DGParameters::new();
        assert_eq!(p.parameters_num(), 0);
        assert!(p.get(0).is_none());
    }
}
