//! Compiler driver.
//!
//! [`Compiler`] owns validated [`CompileOptions`] and turns circuits into
//! [`CompiledCircuit`] bundles by running the standard pipeline built by
//! [`PassManagerBuilder`]. Batches are compiled in parallel; the coupling
//! map is shared read-only between workers and everything else is owned
//! per circuit.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, instrument};

use qmap_ir::{Circuit, Register};

use crate::bundle::{CompileStats, CompiledBatch, CompiledCircuit};
use crate::coupling::CouplingMap;
use crate::error::{CompileError, CompileResult};
use crate::manager::PassManagerBuilder;
use crate::passes::{InitialLayout, SwapMapper, SwapSequence};
use crate::property::{BasisGates, Layout};

/// Everything a compilation may be configured with.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    coupling_map: Option<Arc<CouplingMap>>,
    initial_layout: Option<Layout>,
    basis_gates: BasisGates,
    seed: Option<u64>,
    trials: usize,
    swap_cap: Option<usize>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            coupling_map: None,
            initial_layout: None,
            basis_gates: BasisGates::default(),
            seed: None,
            trials: SwapMapper::DEFAULT_TRIALS,
            swap_cap: None,
        }
    }
}

impl CompileOptions {
    /// Options for all-to-all hardware with the default basis.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route for a device with this coupling map.
    #[must_use]
    pub fn with_coupling_map(mut self, coupling_map: impl Into<Arc<CouplingMap>>) -> Self {
        self.coupling_map = Some(coupling_map.into());
        self
    }

    /// Start routing from this layout instead of computing one.
    #[must_use]
    pub fn with_initial_layout(mut self, layout: Layout) -> Self {
        self.initial_layout = Some(layout);
        self
    }

    /// Target basis.
    #[must_use]
    pub fn with_basis_gates(mut self, basis_gates: BasisGates) -> Self {
        self.basis_gates = basis_gates;
        self
    }

    /// Fix the swap search seed. Without one, each compilation draws a
    /// fresh seed and reports it in its bundle.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Swap search trials per layer.
    #[must_use]
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials.max(1);
        self
    }

    /// Limit the swaps one routing trial may insert. Raising it relaxes
    /// the search after a routing failure.
    #[must_use]
    pub fn with_swap_cap(mut self, cap: usize) -> Self {
        self.swap_cap = Some(cap);
        self
    }

    /// The coupling map, if any.
    pub fn coupling_map(&self) -> Option<&Arc<CouplingMap>> {
        self.coupling_map.as_ref()
    }

    /// The caller's initial layout, if any.
    pub fn initial_layout(&self) -> Option<&Layout> {
        self.initial_layout.as_ref()
    }

    /// The target basis.
    pub fn basis_gates(&self) -> &BasisGates {
        &self.basis_gates
    }

    /// The fixed seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Swap search trials per layer.
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// The per-trial swap limit, if overridden.
    pub fn swap_cap(&self) -> Option<usize> {
        self.swap_cap
    }

    fn validate(&self) -> CompileResult<()> {
        self.basis_gates.validate()?;

        let Some(layout) = &self.initial_layout else {
            return Ok(());
        };
        let Some(coupling_map) = &self.coupling_map else {
            return Err(CompileError::InvalidLayout(
                "an initial layout needs a coupling map".into(),
            ));
        };
        if let Some((logical, physical)) = layout
            .iter()
            .find(|&(_, p)| p >= coupling_map.num_qubits())
        {
            return Err(CompileError::InvalidLayout(format!(
                "{logical} is placed on physical qubit {physical}, but the device has {}",
                coupling_map.num_qubits()
            )));
        }
        Ok(())
    }
}

/// Compiles circuits with one fixed configuration.
///
/// ```
/// use qmap_compile::{CompileOptions, Compiler, CouplingMap};
/// use qmap_ir::Circuit;
///
/// let compiler = Compiler::new(
///     CompileOptions::new()
///         .with_coupling_map(CouplingMap::linear(3))
///         .with_seed(11),
/// )
/// .unwrap();
///
/// let compiled = compiler.compile(Circuit::ghz(3).unwrap()).unwrap();
/// assert_eq!(compiled.seed(), 11);
/// assert!(compiled.qasm().unwrap().starts_with("OPENQASM 2.0;"));
/// ```
#[derive(Debug, Clone)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Validate the options and create a compiler.
    pub fn new(options: CompileOptions) -> CompileResult<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// The options this compiler runs with.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile one circuit.
    #[instrument(skip(self, circuit), fields(circuit = %circuit.name()))]
    #[allow(clippy::cast_possible_truncation)]
    pub fn compile(&self, circuit: Circuit) -> CompileResult<CompiledCircuit> {
        let seed = self.options.seed.unwrap_or_else(rand::random);
        let name = circuit.name().to_string();
        let qregs = circuit.qregs().to_vec();
        let cregs = circuit.cregs().to_vec();
        let ops_before = circuit.dag().num_ops();

        let mut builder = PassManagerBuilder::new()
            .with_basis_gates(self.options.basis_gates.clone())
            .with_seed(seed)
            .with_trials(self.options.trials);
        if let Some(coupling_map) = &self.options.coupling_map {
            builder = builder.with_coupling_map(Arc::clone(coupling_map));
        }
        if let Some(layout) = &self.options.initial_layout {
            builder = builder.with_initial_layout(layout.clone());
        }
        if let Some(cap) = self.options.swap_cap {
            builder = builder.with_swap_cap(cap);
        }
        let (pm, mut props) = builder.build();

        let mut dag = circuit.into_dag();
        pm.run(&mut dag, &mut props)?;
        dag.verify_integrity()?;

        let (circuit, initial_layout, final_layout) = match &self.options.coupling_map {
            Some(coupling_map) => {
                let initial = props
                    .remove::<InitialLayout>()
                    .map(|l| l.0)
                    .ok_or(CompileError::MissingLayout)?;
                let last = props.layout.take().ok_or(CompileError::MissingLayout)?;
                let physical = vec![Register::new("q", coupling_map.num_qubits())];
                let circuit = Circuit::from_dag_with_registers(&name, dag, physical, cregs)?;
                (circuit, initial, last)
            }
            None => {
                let identity = Layout::trivial(dag.num_qubits() as u32);
                let circuit = Circuit::from_dag_with_registers(&name, dag, qregs, cregs)?;
                (circuit, identity.clone(), identity)
            }
        };

        let swaps = props.remove::<SwapSequence>().unwrap_or_default().0;
        let stats = CompileStats::measure(&circuit, ops_before, swaps.len());
        info!(
            "Compiled '{}': {} -> {} ops, {} swaps, seed {}",
            name, stats.ops_before, stats.ops_after, stats.swaps, seed
        );

        Ok(CompiledCircuit {
            circuit,
            initial_layout,
            final_layout,
            basis_gates: self.options.basis_gates.clone(),
            coupling_map: self.options.coupling_map.clone(),
            seed,
            swaps,
            stats,
        })
    }

    /// Compile independent circuits in parallel.
    ///
    /// Each circuit succeeds or fails on its own; the batch keeps the
    /// request order.
    pub fn compile_batch(&self, circuits: Vec<Circuit>) -> CompiledBatch {
        info!("Compiling batch of {} circuits", circuits.len());
        let entries = circuits
            .into_par_iter()
            .map(|circuit| {
                let name = circuit.name().to_string();
                (name, self.compile(circuit))
            })
            .collect();
        CompiledBatch::new(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmap_ir::QubitId;

    #[test]
    fn test_default_options() {
        let options = CompileOptions::new();
        assert!(options.coupling_map().is_none());
        assert_eq!(options.trials(), SwapMapper::DEFAULT_TRIALS);
        assert_eq!(options.basis_gates(), &BasisGates::default());
    }

    #[test]
    fn test_invalid_basis_rejected() {
        let options = CompileOptions::new().with_basis_gates(BasisGates::new(["u3"]));
        assert!(matches!(
            Compiler::new(options),
            Err(CompileError::InvalidBasis(_))
        ));
    }

    #[test]
    fn test_layout_without_coupling_map_rejected() {
        let options = CompileOptions::new().with_initial_layout(Layout::trivial(2));
        assert!(matches!(
            Compiler::new(options),
            Err(CompileError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_layout_outside_device_rejected() {
        let options = CompileOptions::new()
            .with_coupling_map(CouplingMap::linear(3))
            .with_initial_layout(Layout::from_physical(&[0, 5]).unwrap());
        assert!(matches!(
            Compiler::new(options),
            Err(CompileError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_no_coupling_map_keeps_registers_and_identity_layout() {
        let mut circuit = Circuit::new("regs");
        let a = circuit.add_qreg("a", 1).unwrap();
        let b = circuit.add_qreg("b", 1).unwrap();
        circuit.cx(a[0], b[0]).unwrap();

        let compiler = Compiler::new(CompileOptions::new().with_seed(1)).unwrap();
        let compiled = compiler.compile(circuit).unwrap();

        assert_eq!(compiled.circuit().qregs().len(), 2);
        assert_eq!(compiled.final_layout(), &Layout::trivial(2));
        assert_eq!(compiled.final_layout().get_physical(QubitId(1)), Some(1));
        assert!(compiled.swaps().is_empty());
        assert!(compiled.coupling_map().is_none());
    }

    #[test]
    fn test_random_seed_is_reported() {
        let compiler = Compiler::new(CompileOptions::new()).unwrap();
        let compiled = compiler.compile(Circuit::bell().unwrap()).unwrap();
        assert_eq!(compiled.config().seed, compiled.seed());
    }

    #[test]
    fn test_exhausted_swap_cap_is_a_routing_error() {
        let mut circuit = Circuit::with_size("far", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        let options = CompileOptions::new()
            .with_coupling_map(CouplingMap::linear(3))
            .with_initial_layout(Layout::trivial(3))
            .with_seed(4);

        let strict = Compiler::new(options.clone().with_swap_cap(0)).unwrap();
        let err = strict.compile(circuit.clone()).unwrap_err();
        assert!(matches!(err, CompileError::RoutingFailed { layer: 0, .. }));
        assert_eq!(err.category(), crate::error::ErrorCategory::Routing);

        let relaxed = Compiler::new(options.with_swap_cap(2)).unwrap();
        assert_eq!(relaxed.compile(circuit).unwrap().swaps().len(), 1);
    }

    #[test]
    fn test_routed_circuit_spans_device() {
        let compiler = Compiler::new(
            CompileOptions::new()
                .with_coupling_map(CouplingMap::linear(5))
                .with_seed(3),
        )
        .unwrap();
        let compiled = compiler.compile(Circuit::bell().unwrap()).unwrap();
        assert_eq!(compiled.circuit().num_qubits(), 5);
        assert_eq!(compiled.circuit().qregs()[0].name, "q");
        assert_eq!(compiled.initial_layout().len(), 2);
    }
}
