//! QASM 2.0 emitter for serializing circuits.

use std::f64::consts::PI;

use qmap_ir::{Circuit, ClbitId, Instruction, InstructionKind, QubitId};

use crate::error::{EmitError, EmitResult};

/// Emit a circuit as `OPENQASM 2.0` source.
pub fn emit(circuit: &Circuit) -> EmitResult<String> {
    let mut emitter = Emitter::new(circuit);
    emitter.emit_circuit()?;
    Ok(emitter.output)
}

/// Format an angle, writing small multiples of `pi` symbolically.
///
/// Anything else uses the shortest decimal form that parses back to the
/// same `f64`.
pub fn format_angle(value: f64) -> String {
    const TOLERANCE: f64 = 1e-12;
    if value.abs() < TOLERANCE {
        return "0".into();
    }
    for denom in [1.0, 2.0, 4.0, 8.0] {
        let multiple = value * denom / PI;
        let rounded = multiple.round();
        if rounded != 0.0 && rounded.abs() <= 8.0 && (multiple - rounded).abs() < TOLERANCE {
            let sign = if rounded < 0.0 { "-" } else { "" };
            let numer = rounded.abs();
            let head = if numer == 1.0 {
                "pi".to_string()
            } else {
                format!("{numer}*pi")
            };
            return if denom == 1.0 {
                format!("{sign}{head}")
            } else {
                format!("{sign}{head}/{denom}")
            };
        }
    }
    format!("{value}")
}

struct Emitter<'a> {
    circuit: &'a Circuit,
    output: String,
}

impl<'a> Emitter<'a> {
    fn new(circuit: &'a Circuit) -> Self {
        Self {
            circuit,
            output: String::new(),
        }
    }

    fn emit_circuit(&mut self) -> EmitResult<()> {
        self.writeln("OPENQASM 2.0;");
        self.writeln("include \"qelib1.inc\";");

        for reg in self.circuit.qregs() {
            self.writeln(&format!("qreg {}[{}];", reg.name, reg.size));
        }
        for reg in self.circuit.cregs() {
            self.writeln(&format!("creg {}[{}];", reg.name, reg.size));
        }

        for (_, instruction) in self.circuit.dag().topological_ops() {
            self.emit_instruction(instruction)?;
        }
        Ok(())
    }

    fn emit_instruction(&mut self, instruction: &Instruction) -> EmitResult<()> {
        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let params = gate.params();
                if params.iter().any(|p| !p.is_finite()) {
                    return Err(EmitError::NonFiniteParameter {
                        gate: gate.name().to_string(),
                    });
                }
                let qubits = self.qubit_list(&instruction.qubits)?;
                if params.is_empty() {
                    self.writeln(&format!("{} {qubits};", gate.name()));
                } else {
                    let params = params
                        .iter()
                        .map(|&p| format_angle(p))
                        .collect::<Vec<_>>()
                        .join(",");
                    self.writeln(&format!("{}({params}) {qubits};", gate.name()));
                }
            }

            InstructionKind::Measure => {
                if instruction.qubits.len() != instruction.clbits.len() {
                    return Err(EmitError::MeasureArity {
                        qubits: instruction.qubits.len(),
                        clbits: instruction.clbits.len(),
                    });
                }
                for (&q, &c) in instruction.qubits.iter().zip(&instruction.clbits) {
                    let line = format!("measure {} -> {};", self.qubit(q)?, self.clbit(c)?);
                    self.writeln(&line);
                }
            }

            InstructionKind::Barrier => {
                let qubits = self.qubit_list(&instruction.qubits)?;
                self.writeln(&format!("barrier {qubits};"));
            }
        }
        Ok(())
    }

    fn qubit(&self, id: QubitId) -> EmitResult<String> {
        self.circuit
            .qubits()
            .get(id.0 as usize)
            .map(ToString::to_string)
            .ok_or(EmitError::UnboundQubit(id))
    }

    fn clbit(&self, id: ClbitId) -> EmitResult<String> {
        self.circuit
            .clbits()
            .get(id.0 as usize)
            .map(ToString::to_string)
            .ok_or(EmitError::UnboundClbit(id))
    }

    fn qubit_list(&self, qubits: &[QubitId]) -> EmitResult<String> {
        Ok(qubits
            .iter()
            .map(|&q| self.qubit(q))
            .collect::<EmitResult<Vec<_>>>()?
            .join(","))
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}
