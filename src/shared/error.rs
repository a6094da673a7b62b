//! Crate-wide error type (spec §7).
//!
//! Most of spec §7's "error kind" table is handled by local recovery and
//! reported through [`super::diagnostics`] rather than propagated as
//! `Err` — widening to `UNKNOWN`, recording an unresolved pointer, and
//! skipping an out-of-scope construct are all expected outcomes of normal
//! analysis, not failures. [`CoreError`] is reserved for violations of a
//! builder precondition: a bug in the caller, not a property of the input
//! program. A `thiserror`-derived enum with one `#[error(...)]` per variant,
//! matching `config::error::ConfigError`'s shape.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// An edge or node operation was attempted against a builder in a state
    /// that does not support it: referencing a node that was already
    /// removed, registering a second subgraph for a function that already
    /// has one, or removing a node that still has incident edges.
    #[error("builder precondition violated: {0}")]
    BuilderPrecondition(String),

    /// A caller asked for the subgraph of a function that was never
    /// registered with the pointer/read-write/control-dependence graph
    /// builders.
    #[error("no subgraph registered for function '{0}'")]
    UnknownFunction(String),

    /// A slicing criterion referenced a node id that does not exist in the
    /// System Dependence Graph being sliced.
    #[error("slicing criterion node {0:?} does not exist in this graph")]
    UnknownCriterion(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
