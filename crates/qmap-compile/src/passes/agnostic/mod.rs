//! Target-agnostic compilation passes.
//!
//! These passes rewrite the DAG without consulting the coupling map, so
//! they can run before or after routing. They never increase the gate count.

pub mod optimization;

pub use optimization::{CancelCX, Optimize1qGates};
