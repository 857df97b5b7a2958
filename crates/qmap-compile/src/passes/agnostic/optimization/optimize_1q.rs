//! Single-qubit gate fusion.

use tracing::debug;

use qmap_ir::{CircuitDag, Instruction, NodeIndex, QubitId, StandardGate, WireId};

use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::{BasisGates, PropertySet};
use crate::unitary::{EPSILON, Unitary2x2};

/// Single-qubit gate optimization pass.
///
/// Merges each maximal run of single-qubit gates on a wire into one gate
/// from the `u1`/`u2`/`u3` family. The product of the run is brought to
/// the form `e^{ig} u3(theta, phi, lambda)`, the phase is dropped, and the
/// cheapest gate the basis allows is emitted: `u1` when `theta` is zero,
/// `u2` when it is `pi/2`, otherwise `u3`.
///
/// Runs that multiply to the identity are removed outright. A lone gate is
/// left as it is unless it is the identity.
#[derive(Debug, Default)]
pub struct Optimize1qGates;

/// A run of fusable gates on one wire.
struct Run {
    qubit: QubitId,
    nodes: Vec<NodeIndex>,
    product: Unitary2x2,
}

impl Optimize1qGates {
    /// Create a new 1q gate optimizer.
    pub fn new() -> Self {
        Self
    }

    /// Find runs of consecutive single-qubit gates on each wire.
    ///
    /// Two-qubit gates, measurements and barriers end a run. Only runs that
    /// will change the circuit are returned.
    fn find_1q_runs(dag: &CircuitDag) -> Vec<Run> {
        let mut runs = Vec::new();

        for qubit in dag.qubits() {
            let mut current: Vec<NodeIndex> = Vec::new();
            let mut product = Unitary2x2::identity();

            for node in dag.wire_ops(WireId::Qubit(qubit)) {
                let unitary = dag
                    .get_instruction(node)
                    .filter(|inst| inst.is_single_qubit_gate())
                    .and_then(Instruction::as_gate)
                    .and_then(Unitary2x2::from_gate);

                if let Some(u) = unitary {
                    current.push(node);
                    product = u * product;
                    continue;
                }
                Self::close_run(&mut runs, qubit, &mut current, &mut product);
            }
            Self::close_run(&mut runs, qubit, &mut current, &mut product);
        }

        runs
    }

    fn close_run(
        runs: &mut Vec<Run>,
        qubit: QubitId,
        current: &mut Vec<NodeIndex>,
        product: &mut Unitary2x2,
    ) {
        let nodes = std::mem::take(current);
        let unitary = std::mem::replace(product, Unitary2x2::identity());
        if nodes.len() >= 2 || (nodes.len() == 1 && unitary.is_identity()) {
            runs.push(Run {
                qubit,
                nodes,
                product: unitary,
            });
        }
    }
}

/// Express a unitary as one native gate, or nothing for the identity.
pub(crate) fn synthesize(unitary: &Unitary2x2, basis: &BasisGates) -> Option<StandardGate> {
    if unitary.is_identity() {
        return None;
    }
    let (theta, phi, lambda) = unitary.to_u3();

    if theta.abs() < EPSILON && basis.contains("u1") {
        return Some(StandardGate::U1(Unitary2x2::normalize_angle(phi + lambda)));
    }
    if (theta - std::f64::consts::FRAC_PI_2).abs() < EPSILON && basis.contains("u2") {
        return Some(StandardGate::U2(phi, lambda));
    }
    Some(StandardGate::U3(theta, phi, lambda))
}

impl Pass for Optimize1qGates {
    fn name(&self) -> &'static str {
        "Optimize1qGates"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let basis = properties.basis_gates.clone().unwrap_or_default();
        let runs = Self::find_1q_runs(dag);

        let mut removed = 0;
        for run in &runs {
            let Some((&first, rest)) = run.nodes.split_first() else {
                continue;
            };
            // Runs are disjoint, and the stable graph only reuses the slots
            // freed here, so the nodes of later runs stay valid.
            let replacement = synthesize(&run.product, &basis)
                .map(|gate| Instruction::single_qubit_gate(gate, run.qubit));
            removed += run.nodes.len() - usize::from(replacement.is_some());
            dag.substitute_node(first, replacement)?;
            for &node in rest {
                dag.remove_op(node)?;
            }
        }

        debug!("Fused {} runs, {} gates removed", runs.len(), removed);
        Ok(())
    }
}
