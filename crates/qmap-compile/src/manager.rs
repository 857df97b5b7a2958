//! Pass manager and the builder for the routing pipeline.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use qmap_ir::CircuitDag;

use crate::coupling::CouplingMap;
use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::{
    BasisTranslation, CancelCX, DirectionMapper, Optimize1qGates, SetLayout, SwapMapper,
};
use crate::property::{BasisGates, Layout, PropertySet};

/// An ordered list of passes run against one DAG.
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Names of the passes, in execution order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run every pass in order, stopping at the first error.
    #[instrument(skip(self, dag, properties))]
    pub fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        info!(
            "Running {} passes on {} qubits, {} ops",
            self.passes.len(),
            dag.num_qubits(),
            dag.num_ops()
        );

        for pass in &self.passes {
            if !pass.should_run(dag, properties) {
                debug!("{}: skipped", pass.name());
                continue;
            }
            pass.run(dag, properties)?;
            debug!("{}: {} ops, depth {}", pass.name(), dag.num_ops(), dag.depth());
        }

        info!("Pipeline finished: {} ops, depth {}", dag.num_ops(), dag.depth());

        Ok(())
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the standard routing pipeline.
///
/// ```text
/// BasisTranslation -> [SetLayout -> SwapMapper -> DirectionMapper] -> CancelCX -> Optimize1qGates
/// ```
///
/// The bracketed passes are only added when a coupling map is configured.
pub struct PassManagerBuilder {
    /// Target properties.
    properties: PropertySet,
    /// Fixed initial layout, if any.
    initial_layout: Option<Layout>,
    /// Seed for the swap search.
    seed: u64,
    /// Swap search trials per layer.
    trials: usize,
    /// Per-trial swap limit, when overridden.
    swap_cap: Option<usize>,
}

impl PassManagerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            properties: PropertySet::new(),
            initial_layout: None,
            seed: 0,
            trials: SwapMapper::DEFAULT_TRIALS,
            swap_cap: None,
        }
    }

    /// Set the target properties.
    #[must_use]
    pub fn with_properties(mut self, properties: PropertySet) -> Self {
        self.properties = properties;
        self
    }

    /// Set the device coupling map.
    #[must_use]
    pub fn with_coupling_map(mut self, coupling_map: impl Into<Arc<CouplingMap>>) -> Self {
        self.properties.coupling_map = Some(coupling_map.into());
        self
    }

    /// Set the basis gates.
    #[must_use]
    pub fn with_basis_gates(mut self, basis_gates: BasisGates) -> Self {
        self.properties.basis_gates = Some(basis_gates);
        self
    }

    /// Use a fixed initial layout instead of computing one.
    #[must_use]
    pub fn with_initial_layout(mut self, layout: Layout) -> Self {
        self.initial_layout = Some(layout);
        self
    }

    /// Seed the swap search.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of swap search trials per layer.
    #[must_use]
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Limit the swaps a single routing trial may insert.
    #[must_use]
    pub fn with_swap_cap(mut self, cap: usize) -> Self {
        self.swap_cap = Some(cap);
        self
    }

    /// Build the pass manager and return it with the properties.
    pub fn build(self) -> (PassManager, PropertySet) {
        let mut pm = PassManager::new();

        pm.add_pass(BasisTranslation);

        if self.properties.coupling_map.is_some() {
            pm.add_pass(match self.initial_layout {
                Some(layout) => SetLayout::with_layout(layout),
                None => SetLayout::new(),
            });
            let mut mapper = SwapMapper::new(self.seed).with_trials(self.trials);
            if let Some(cap) = self.swap_cap {
                mapper = mapper.with_swap_cap(cap);
            }
            pm.add_pass(mapper);
            pm.add_pass(DirectionMapper);
        }

        pm.add_pass(CancelCX::new());
        pm.add_pass(Optimize1qGates::new());

        (pm, self.properties)
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmap_ir::{Circuit, QubitId};

    #[test]
    fn test_empty_pass_manager() {
        let pm = PassManager::new();
        assert!(pm.is_empty());
        assert_eq!(pm.len(), 0);
    }

    #[test]
    fn test_pass_manager_run() {
        let pm = PassManager::new();
        let mut props = PropertySet::new();

        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();

        let mut dag = circuit.into_dag();
        pm.run(&mut dag, &mut props).unwrap();

        assert_eq!(dag.num_ops(), 2);
    }

    #[test]
    fn test_builder_without_coupling_map() {
        let (pm, props) = PassManagerBuilder::new().build();
        assert_eq!(
            pm.pass_names(),
            vec!["BasisTranslation", "CancelCX", "Optimize1qGates"]
        );
        assert!(props.coupling_map.is_none());
    }

    #[test]
    fn test_builder_with_coupling_map() {
        let (pm, props) = PassManagerBuilder::new()
            .with_coupling_map(CouplingMap::linear(5))
            .with_basis_gates(BasisGates::default())
            .with_seed(7)
            .build();

        assert_eq!(
            pm.pass_names(),
            vec![
                "BasisTranslation",
                "SetLayout",
                "SwapMapper",
                "DirectionMapper",
                "CancelCX",
                "Optimize1qGates"
            ]
        );
        assert!(props.coupling_map.is_some());
        assert!(props.basis_gates.is_some());
    }

    #[test]
    fn test_pipeline_routes_bell_on_reversed_edge() {
        let (pm, mut props) = PassManagerBuilder::new()
            .with_coupling_map(CouplingMap::from_edges(2, [(1, 0)]).unwrap())
            .with_initial_layout(Layout::trivial(2))
            .build();

        let mut dag = Circuit::bell().unwrap().into_dag();
        pm.run(&mut dag, &mut props).unwrap();

        let cx: Vec<_> = dag
            .topological_ops()
            .filter(|(_, inst)| inst.is_cx())
            .map(|(_, inst)| (inst.qubits[0].0, inst.qubits[1].0))
            .collect();
        assert_eq!(cx, vec![(1, 0)]);
        dag.verify_integrity().unwrap();
    }
}
