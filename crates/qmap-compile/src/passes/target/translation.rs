//! Basis translation (unrolling) to the `u1`/`u2`/`u3`/`cx` family.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use qmap_ir::{CircuitDag, Instruction, QubitId, StandardGate};

use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::{BasisGates, PropertySet};

/// Basis translation pass.
///
/// Rewrites every gate into the native family: single-qubit gates become
/// one `u1`, `u2` or `u3`, `cz` becomes a CX conjugated by Hadamards on the
/// target, and `swap` becomes three CX. Gates already in the basis are left
/// alone. An `id` gate is dropped when the basis has no `id`.
///
/// Without basis gates in the property set the default basis is used.
pub struct BasisTranslation;

impl Pass for BasisTranslation {
    fn name(&self) -> &'static str {
        "BasisTranslation"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let basis = properties.basis_gates.clone().unwrap_or_default();

        // Rebuild in topological order so replacements land where the
        // original gate was.
        let mut new_dag = CircuitDag::new();
        for qubit in dag.qubits().collect::<Vec<_>>() {
            new_dag.add_qubit(qubit);
        }
        for clbit in dag.clbits().collect::<Vec<_>>() {
            new_dag.add_clbit(clbit);
        }
        new_dag.set_level(dag.level());

        for (_, inst) in dag.topological_ops() {
            match inst.as_gate() {
                Some(gate) if !basis.contains(gate.name()) => {
                    for replacement in unroll(*gate, &inst.qubits, &basis) {
                        new_dag.apply(replacement)?;
                    }
                }
                _ => {
                    new_dag.apply(inst.clone())?;
                }
            }
        }

        *dag = new_dag;
        Ok(())
    }
}

/// Expand one gate into native instructions.
fn unroll(gate: StandardGate, qubits: &[QubitId], basis: &BasisGates) -> Vec<Instruction> {
    let one = |g: StandardGate| Instruction::single_qubit_gate(native_1q(g, basis), qubits[0]);

    match gate {
        StandardGate::I => {
            if basis.contains("id") {
                vec![Instruction::single_qubit_gate(StandardGate::I, qubits[0])]
            } else {
                vec![]
            }
        }
        StandardGate::X => vec![one(StandardGate::U3(PI, 0.0, PI))],
        StandardGate::Y => vec![one(StandardGate::U3(PI, FRAC_PI_2, FRAC_PI_2))],
        StandardGate::Z => vec![one(StandardGate::U1(PI))],
        StandardGate::H => vec![one(StandardGate::U2(0.0, PI))],
        StandardGate::S => vec![one(StandardGate::U1(FRAC_PI_2))],
        StandardGate::Sdg => vec![one(StandardGate::U1(-FRAC_PI_2))],
        StandardGate::T => vec![one(StandardGate::U1(FRAC_PI_4))],
        StandardGate::Tdg => vec![one(StandardGate::U1(-FRAC_PI_4))],
        StandardGate::Rx(theta) => vec![one(StandardGate::U3(theta, -FRAC_PI_2, FRAC_PI_2))],
        StandardGate::Ry(theta) => vec![one(StandardGate::U3(theta, 0.0, 0.0))],
        StandardGate::Rz(theta) => vec![one(StandardGate::U1(theta))],
        StandardGate::U1(_) | StandardGate::U2(_, _) | StandardGate::U3(_, _, _) => {
            vec![one(gate)]
        }
        StandardGate::CX => vec![cx(qubits[0], qubits[1])],
        StandardGate::CZ => {
            let h = native_1q(StandardGate::U2(0.0, PI), basis);
            vec![
                Instruction::single_qubit_gate(h, qubits[1]),
                cx(qubits[0], qubits[1]),
                Instruction::single_qubit_gate(h, qubits[1]),
            ]
        }
        StandardGate::Swap => swap_as_cx(qubits[0], qubits[1]),
    }
}

fn cx(control: QubitId, target: QubitId) -> Instruction {
    Instruction::two_qubit_gate(StandardGate::CX, control, target)
}

/// Three alternating CX gates, the native form of a swap.
pub(crate) fn swap_as_cx(a: QubitId, b: QubitId) -> Vec<Instruction> {
    vec![cx(a, b), cx(b, a), cx(a, b)]
}

/// Re-express `u1`/`u2` as `u3` when the basis lacks them.
pub(crate) fn native_1q(gate: StandardGate, basis: &BasisGates) -> StandardGate {
    match gate {
        StandardGate::U1(lambda) if !basis.contains("u1") => StandardGate::U3(0.0, 0.0, lambda),
        StandardGate::U2(phi, lambda) if !basis.contains("u2") => {
            StandardGate::U3(FRAC_PI_2, phi, lambda)
        }
        other => other,
    }
}
