//! Compiled program bundles.
//!
//! A [`CompiledCircuit`] is what one compilation produces. Its contents are
//! only reachable through accessors. A [`CompiledBatch`] holds the results
//! of compiling several circuits together, keyed by circuit name in request
//! order.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use qmap_ir::Circuit;

use crate::coupling::CouplingMap;
use crate::error::{CompileError, CompileResult};
use crate::executor::{Counts, ExecutionError, Executor};
use crate::passes::SwapRecord;
use crate::property::{BasisGates, Layout};

/// Size measurements taken around a compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileStats {
    /// Operations in the input circuit.
    pub ops_before: usize,
    /// Operations in the compiled circuit.
    pub ops_after: usize,
    /// Depth of the compiled circuit.
    pub depth: usize,
    /// CX gates in the compiled circuit.
    pub cx_count: usize,
    /// Swaps inserted by routing.
    pub swaps: usize,
}

impl CompileStats {
    pub(crate) fn measure(circuit: &Circuit, ops_before: usize, swaps: usize) -> Self {
        let dag = circuit.dag();
        Self {
            ops_before,
            ops_after: dag.num_ops(),
            depth: dag.depth(),
            cx_count: dag.count_ops().get("cx").copied().unwrap_or(0),
            swaps,
        }
    }
}

/// The resolved configuration of one compiled circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitConfig {
    /// Basis the circuit was compiled to.
    pub basis_gates: BasisGates,
    /// Device coupling map, `None` for all-to-all compilation.
    pub coupling_map: Option<CouplingMap>,
    /// Layout after routing, `None` when nothing was routed.
    pub layout: Option<Layout>,
    /// Seed that drove the swap search.
    pub seed: u64,
}

/// The result of compiling one circuit.
#[derive(Debug, Clone)]
pub struct CompiledCircuit {
    pub(crate) circuit: Circuit,
    pub(crate) initial_layout: Layout,
    pub(crate) final_layout: Layout,
    pub(crate) basis_gates: BasisGates,
    pub(crate) coupling_map: Option<Arc<CouplingMap>>,
    pub(crate) seed: u64,
    pub(crate) swaps: Vec<SwapRecord>,
    pub(crate) stats: CompileStats,
}

impl CompiledCircuit {
    /// The rewritten circuit. With a coupling map its qubits are the
    /// device's physical qubits.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Name of the compiled circuit.
    pub fn name(&self) -> &str {
        self.circuit.name()
    }

    /// Layout routing started from.
    pub fn initial_layout(&self) -> &Layout {
        &self.initial_layout
    }

    /// Layout after routing; where each logical qubit ends up.
    pub fn final_layout(&self) -> &Layout {
        &self.final_layout
    }

    /// Basis the circuit was compiled to.
    pub fn basis_gates(&self) -> &BasisGates {
        &self.basis_gates
    }

    /// Device coupling map, if the circuit was routed.
    pub fn coupling_map(&self) -> Option<&CouplingMap> {
        self.coupling_map.as_deref()
    }

    /// Seed that drove the swap search.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Swaps inserted by routing, in circuit order.
    pub fn swaps(&self) -> &[SwapRecord] {
        &self.swaps
    }

    /// Size measurements.
    pub fn stats(&self) -> &CompileStats {
        &self.stats
    }

    /// OpenQASM 2.0 text of the compiled circuit.
    pub fn qasm(&self) -> CompileResult<String> {
        Ok(qmap_qasm::emit(&self.circuit)?)
    }

    /// The resolved configuration.
    pub fn config(&self) -> CircuitConfig {
        CircuitConfig {
            basis_gates: self.basis_gates.clone(),
            coupling_map: self.coupling_map.as_deref().cloned(),
            layout: self.coupling_map.is_some().then(|| self.final_layout.clone()),
            seed: self.seed,
        }
    }

    /// Human-readable summary of the configuration and result. The format
    /// is for people and may change.
    pub fn diagnostics(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "circuit: {}", self.name());
        let _ = writeln!(out, "  seed: {}", self.seed);
        let _ = writeln!(out, "  basis: {}", self.basis_gates.gates().join(", "));
        match &self.coupling_map {
            Some(map) => {
                let edges: Vec<String> = map
                    .edges()
                    .iter()
                    .map(|(c, t)| format!("{c}->{t}"))
                    .collect();
                let _ = writeln!(
                    out,
                    "  coupling map: {} qubits, edges {}",
                    map.num_qubits(),
                    edges.join(" ")
                );
            }
            None => {
                let _ = writeln!(out, "  coupling map: none (all-to-all)");
            }
        }
        let _ = writeln!(out, "  initial layout: {}", format_layout(&self.initial_layout));
        let _ = writeln!(out, "  final layout: {}", format_layout(&self.final_layout));

        let swaps: Vec<String> = self
            .swaps
            .iter()
            .map(|s| format!("{}<->{}@{}", s.physical.0, s.physical.1, s.layer))
            .collect();
        if swaps.is_empty() {
            let _ = writeln!(out, "  swaps: 0");
        } else {
            let _ = writeln!(out, "  swaps: {} ({})", swaps.len(), swaps.join(" "));
        }
        let _ = writeln!(
            out,
            "  ops: {} -> {}, depth {}, cx {}",
            self.stats.ops_before, self.stats.ops_after, self.stats.depth, self.stats.cx_count
        );
        out
    }
}

fn format_layout(layout: &Layout) -> String {
    let pairs: Vec<String> = layout.iter().map(|(l, p)| format!("{l}->{p}")).collect();
    pairs.join(" ")
}

/// Results of compiling several circuits together.
#[derive(Debug)]
pub struct CompiledBatch {
    entries: Vec<(String, CompileResult<CompiledCircuit>)>,
}

impl CompiledBatch {
    pub(crate) fn new(entries: Vec<(String, CompileResult<CompiledCircuit>)>) -> Self {
        Self { entries }
    }

    /// Circuit names in request order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// The compilation result for `name`. With duplicate names the first
    /// entry wins.
    pub fn result(&self, name: &str) -> Option<&CompileResult<CompiledCircuit>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, result)| result)
    }

    /// The compiled circuit for `name`, if it compiled.
    pub fn get(&self, name: &str) -> Option<&CompiledCircuit> {
        self.result(name).and_then(|r| r.as_ref().ok())
    }

    /// OpenQASM text for `name`. `None` if the name is unknown or the
    /// circuit failed to compile; see [`result`](Self::result) for the error.
    pub fn qasm(&self, name: &str) -> Option<CompileResult<String>> {
        self.get(name).map(CompiledCircuit::qasm)
    }

    /// Resolved configuration for `name`.
    pub fn config(&self, name: &str) -> Option<CircuitConfig> {
        self.get(name).map(CompiledCircuit::config)
    }

    /// Diagnostic text for `name`, describing the failure if it did not
    /// compile.
    pub fn diagnostics(&self, name: &str) -> Option<String> {
        self.result(name).map(|result| match result {
            Ok(compiled) => compiled.diagnostics(),
            Err(e) => format!("circuit: {name}\n  compilation failed: {e}\n"),
        })
    }

    /// Iterate over `(name, result)` in request order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CompileResult<CompiledCircuit>)> {
        self.entries.iter().map(|(name, r)| (name.as_str(), r))
    }

    /// Circuits that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &CompileError)> {
        self.iter()
            .filter_map(|(name, r)| r.as_ref().err().map(|e| (name, e)))
    }

    /// Number of circuits in the batch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every compiled circuit on `executor`.
    ///
    /// Circuits that failed to compile are reported as
    /// [`ExecutionError::NotCompiled`]. Counts that do not add up to
    /// `shots` are rejected.
    pub fn execute<E: Executor + ?Sized>(
        &self,
        executor: &E,
        shots: u64,
    ) -> Vec<(String, Result<Counts, ExecutionError>)> {
        self.iter()
            .map(|(name, result)| {
                let outcome = match result {
                    Ok(compiled) => executor
                        .execute(compiled, shots)
                        .and_then(|counts| crate::executor::check_shots(counts, shots)),
                    Err(_) => Err(ExecutionError::NotCompiled {
                        name: name.to_string(),
                    }),
                };
                (name.to_string(), outcome)
            })
            .collect()
    }
}
