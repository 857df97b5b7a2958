//! CX orientation fix-up.

use std::f64::consts::PI;

use tracing::debug;

use qmap_ir::{CircuitDag, CircuitLevel, Instruction, QubitId, StandardGate};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::passes::target::translation::native_1q;
use crate::property::PropertySet;

/// Direction mapper pass.
///
/// A routed CX whose `(control, target)` pair only exists in the coupling
/// map as `(target, control)` is flipped with Hadamards on both qubits,
/// written as `u2(0, pi)`:
///
/// ```text
/// cx a,b  =  u2 a; u2 b; cx b,a; u2 a; u2 b
/// ```
///
/// A CX on a pair with no coupling in either direction is an error.
pub struct DirectionMapper;

impl Pass for DirectionMapper {
    fn name(&self) -> &'static str {
        "DirectionMapper"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let coupling_map = properties
            .coupling_map
            .clone()
            .ok_or(CompileError::MissingCouplingMap)?;
        let basis = properties.basis_gates.clone().unwrap_or_default();
        let h = native_1q(StandardGate::U2(0.0, PI), &basis);

        let cx_nodes: Vec<_> = dag
            .op_nodes()
            .filter(|(_, inst)| inst.is_cx())
            .map(|(node, inst)| (node, inst.qubits[0], inst.qubits[1]))
            .collect();

        let mut flipped = 0;
        for (node, control, target) in cx_nodes {
            let (c, t) = (control.0, target.0);
            if coupling_map.has_edge(c, t) {
                continue;
            }
            if !coupling_map.has_edge(t, c) {
                return Err(CompileError::UnsupportedConnection {
                    control: c,
                    target: t,
                });
            }
            dag.substitute_node(node, reversed_cx(control, target, h))?;
            flipped += 1;
        }

        debug!("Flipped {} CX gates", flipped);
        Ok(())
    }

    fn should_run(&self, dag: &CircuitDag, properties: &PropertySet) -> bool {
        properties.coupling_map.is_some() && dag.level() == CircuitLevel::Physical
    }
}

fn reversed_cx(control: QubitId, target: QubitId, h: StandardGate) -> Vec<Instruction> {
    vec![
        Instruction::single_qubit_gate(h, control),
        Instruction::single_qubit_gate(h, target),
        Instruction::two_qubit_gate(StandardGate::CX, target, control),
        Instruction::single_qubit_gate(h, control),
        Instruction::single_qubit_gate(h, target),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupling::CouplingMap;
    use crate::property::BasisGates;

    fn physical_dag(n: u32, gates: &[(u32, u32)]) -> CircuitDag {
        let mut dag = CircuitDag::new();
        for q in 0..n {
            dag.add_qubit(QubitId(q));
        }
        dag.set_level(CircuitLevel::Physical);
        for &(c, t) in gates {
            dag.apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(c),
                QubitId(t),
            ))
            .unwrap();
        }
        dag
    }

    fn cx_pairs(dag: &CircuitDag) -> Vec<(u32, u32)> {
        dag.topological_ops()
            .filter(|(_, i)| i.is_cx())
            .map(|(_, i)| (i.qubits[0].0, i.qubits[1].0))
            .collect()
    }

    #[test]
    fn test_forward_cx_untouched() {
        let mut dag = physical_dag(2, &[(0, 1)]);
        let mut props = PropertySet::new().with_target(CouplingMap::linear(2), BasisGates::default());
        DirectionMapper.run(&mut dag, &mut props).unwrap();
        assert_eq!(dag.num_ops(), 1);
    }

    #[test]
    fn test_reversed_cx_is_flipped() {
        let mut dag = physical_dag(2, &[(1, 0)]);
        let mut props = PropertySet::new().with_target(CouplingMap::linear(2), BasisGates::default());
        DirectionMapper.run(&mut dag, &mut props).unwrap();

        assert_eq!(dag.num_ops(), 5);
        assert_eq!(dag.count_ops().get("u2"), Some(&4));
        assert_eq!(cx_pairs(&dag), vec![(0, 1)]);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_flip_keeps_position() {
        let mut dag = physical_dag(3, &[(0, 1), (2, 1), (1, 2)]);
        let map = CouplingMap::from_edges(3, [(0, 1), (1, 2)]).unwrap();
        let mut props = PropertySet::new().with_target(map, BasisGates::default());
        DirectionMapper.run(&mut dag, &mut props).unwrap();
        assert_eq!(cx_pairs(&dag), vec![(0, 1), (1, 2), (1, 2)]);
    }

    #[test]
    fn test_uncoupled_pair_is_an_error() {
        let mut dag = physical_dag(3, &[(0, 2)]);
        let mut props = PropertySet::new().with_target(CouplingMap::linear(3), BasisGates::default());
        assert!(matches!(
            DirectionMapper.run(&mut dag, &mut props),
            Err(CompileError::UnsupportedConnection {
                control: 0,
                target: 2
            })
        ));
    }

    #[test]
    fn test_skipped_for_logical_circuits() {
        let dag = CircuitDag::new();
        let props = PropertySet::new().with_target(CouplingMap::linear(2), BasisGates::default());
        assert!(!DirectionMapper.should_run(&dag, &props));
    }
}
