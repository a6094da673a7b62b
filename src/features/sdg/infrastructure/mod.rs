//! The System Dependence Graph builder and assembly pass (spec §3.5, §4.6).

pub mod assembly;
pub mod builder;

pub use assembly::{assemble, CallSite, FunctionInput};
pub use builder::SystemDependenceGraph;
