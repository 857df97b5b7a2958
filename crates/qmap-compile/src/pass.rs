//! The pass abstraction the pipeline is built from.

use qmap_ir::CircuitDag;

use crate::error::CompileResult;
use crate::property::PropertySet;

/// Whether a pass rewrites the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Only publishes results (such as a layout) into the property set.
    Analysis,
    /// Rewrites the DAG in place.
    Transformation,
}

/// One step of the compilation pipeline.
///
/// A pass sees the DAG and the shared [`PropertySet`]. Passes that depend
/// on a coupling map or a layout read them from the property set and return
/// a [`CompileError`](crate::CompileError) when they are missing.
pub trait Pass: Send + Sync {
    /// Name shown in logs and in [`PassManager::pass_names`](crate::PassManager::pass_names).
    fn name(&self) -> &str;

    fn kind(&self) -> PassKind;

    /// Run on `dag`. An error aborts compilation of the circuit.
    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()>;

    /// Skip condition, checked by the pass manager before `run`.
    fn should_run(&self, _dag: &CircuitDag, _properties: &PropertySet) -> bool {
        true
    }
}
