//! Serializable circuit descriptions.
//!
//! A [`CircuitDescription`] is the plain-data form of a [`Circuit`]: register
//! declarations plus an ordered operation list whose operands are
//! `(register, index)` pairs. It is what the command-line front end reads.
//!
//! ```json
//! {
//!   "name": "bell",
//!   "qregs": [{ "name": "q", "size": 2 }],
//!   "cregs": [{ "name": "c", "size": 2 }],
//!   "ops": [
//!     { "gate": "h", "qubits": [["q", 0]] },
//!     { "gate": "cx", "qubits": [["q", 0], ["q", 1]] },
//!     { "gate": "measure", "qubits": [["q", 0]], "clbits": [["c", 0]] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::circuit::Circuit;
use crate::error::IrResult;
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::Register;

/// A `(register, index)` operand.
pub type BitRef = (String, u32);

/// One operation of a [`CircuitDescription`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpDescription {
    /// Gate name, or `measure` / `barrier`.
    pub gate: String,
    /// Angle parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<f64>,
    /// Qubit operands, control first.
    pub qubits: Vec<BitRef>,
    /// Classical operands (measure only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clbits: Vec<BitRef>,
}

/// Plain-data circuit description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitDescription {
    /// Circuit name; used as the key in compiled batches.
    pub name: String,
    /// Quantum register declarations.
    #[serde(default)]
    pub qregs: Vec<Register>,
    /// Classical register declarations.
    #[serde(default)]
    pub cregs: Vec<Register>,
    /// Operations in program order.
    #[serde(default)]
    pub ops: Vec<OpDescription>,
}

impl CircuitDescription {
    /// Parse a single description from JSON.
    pub fn from_json(json: &str) -> IrResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the circuit.
    pub fn to_circuit(&self) -> IrResult<Circuit> {
        let mut circuit = Circuit::new(&self.name);
        for reg in &self.qregs {
            circuit.add_qreg(&reg.name, reg.size)?;
        }
        for reg in &self.cregs {
            circuit.add_creg(&reg.name, reg.size)?;
        }

        for op in &self.ops {
            let qubits = op
                .qubits
                .iter()
                .map(|(reg, idx)| circuit.qubit(reg, *idx))
                .collect::<IrResult<Vec<_>>>()?;
            let clbits = op
                .clbits
                .iter()
                .map(|(reg, idx)| circuit.clbit(reg, *idx))
                .collect::<IrResult<Vec<_>>>()?;

            let kind = match op.gate.as_str() {
                "measure" => InstructionKind::Measure,
                "barrier" => InstructionKind::Barrier,
                name => InstructionKind::Gate(StandardGate::from_name(name, &op.params)?),
            };
            circuit.apply(Instruction {
                kind,
                qubits,
                clbits,
            })?;
        }
        Ok(circuit)
    }

    /// Describe an existing circuit, operations in topological order.
    pub fn from_circuit(circuit: &Circuit) -> Self {
        let qubit_ref = |q: &crate::qubit::QubitId| -> BitRef {
            let qubit = &circuit.qubits()[q.0 as usize];
            (qubit.register.clone(), qubit.index)
        };
        let clbit_ref = |c: &crate::qubit::ClbitId| -> BitRef {
            let clbit = &circuit.clbits()[c.0 as usize];
            (clbit.register.clone(), clbit.index)
        };

        let ops = circuit
            .dag()
            .topological_ops()
            .map(|(_, inst)| OpDescription {
                gate: inst.name().to_string(),
                params: inst.as_gate().map(StandardGate::params).unwrap_or_default(),
                qubits: inst.qubits.iter().map(qubit_ref).collect(),
                clbits: inst.clbits.iter().map(clbit_ref).collect(),
            })
            .collect();

        Self {
            name: circuit.name().to_string(),
            qregs: circuit.qregs().to_vec(),
            cregs: circuit.cregs().to_vec(),
            ops,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IrError;
    use crate::qubit::QubitId;

    const BELL: &str = r#"{
        "name": "bell",
        "qregs": [{ "name": "q", "size": 2 }],
        "cregs": [{ "name": "c", "size": 2 }],
        "ops": [
            { "gate": "h", "qubits": [["q", 0]] },
            { "gate": "cx", "qubits": [["q", 0], ["q", 1]] },
            { "gate": "measure", "qubits": [["q", 0]], "clbits": [["c", 0]] },
            { "gate": "measure", "qubits": [["q", 1]], "clbits": [["c", 1]] }
        ]
    }"#;

    #[test]
    fn test_parse_bell() {
        let desc = CircuitDescription::from_json(BELL).unwrap();
        let circuit = desc.to_circuit().unwrap();
        assert_eq!(circuit.name(), "bell");
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.dag().num_ops(), 4);
        assert_eq!(circuit.depth(), 3);
    }

    #[test]
    fn test_describe_circuit() {
        let circuit = CircuitDescription::from_json(BELL)
            .unwrap()
            .to_circuit()
            .unwrap();
        let desc = CircuitDescription::from_circuit(&circuit);
        assert_eq!(desc.ops[1].gate, "cx");
        assert_eq!(
            desc.ops[1].qubits,
            vec![("q".to_string(), 0), ("q".to_string(), 1)]
        );
    }

    #[test]
    fn test_unknown_register_operand() {
        let json = r#"{
            "name": "bad",
            "qregs": [{ "name": "q", "size": 1 }],
            "ops": [{ "gate": "x", "qubits": [["r", 0]] }]
        }"#;
        let result = CircuitDescription::from_json(json).unwrap().to_circuit();
        assert!(matches!(result, Err(IrError::UnknownRegister(_))));
    }

    #[test]
    fn test_params_are_passed() {
        let json = r#"{
            "name": "rot",
            "qregs": [{ "name": "q", "size": 1 }],
            "ops": [{ "gate": "u3", "params": [0.1, 0.2, 0.3], "qubits": [["q", 0]] }]
        }"#;
        let circuit = CircuitDescription::from_json(json)
            .unwrap()
            .to_circuit()
            .unwrap();
        let (_, inst) = circuit.dag().topological_ops().next().unwrap();
        assert_eq!(inst.as_gate(), Some(&StandardGate::U3(0.1, 0.2, 0.3)));
        assert_eq!(inst.qubits, vec![QubitId(0)]);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            CircuitDescription::from_json("{ not json"),
            Err(IrError::Json(_))
        ));
    }
}
