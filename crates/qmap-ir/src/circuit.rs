//! High-level circuit builder API.

use crate::dag::{CircuitDag, NodeIndex};
use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::Instruction;
use crate::qubit::{Clbit, ClbitId, Qubit, QubitId, Register};

/// A quantum circuit: named registers plus the DAG of operations on them.
///
/// Qubits are numbered densely in register declaration order, so the
/// first qubit of the second register follows the last qubit of the first.
#[derive(Debug, Clone)]
pub struct Circuit {
    name: String,
    qregs: Vec<Register>,
    cregs: Vec<Register>,
    qubits: Vec<Qubit>,
    clbits: Vec<Clbit>,
    dag: CircuitDag,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qregs: vec![],
            cregs: vec![],
            qubits: vec![],
            clbits: vec![],
            dag: CircuitDag::new(),
        }
    }

    /// Create a circuit with one quantum register `q` and one classical
    /// register `c` of the given sizes.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        if num_qubits > 0 {
            circuit.push_qreg(Register::new("q", num_qubits));
        }
        if num_clbits > 0 {
            circuit.push_creg(Register::new("c", num_clbits));
        }
        circuit
    }

    #[allow(clippy::cast_possible_truncation)]
    fn push_qreg(&mut self, register: Register) -> Vec<QubitId> {
        let ids: Vec<_> = (0..register.size)
            .map(|i| {
                let id = QubitId(self.qubits.len() as u32);
                self.qubits.push(Qubit::new(id, &register.name, i));
                self.dag.add_qubit(id);
                id
            })
            .collect();
        self.qregs.push(register);
        ids
    }

    #[allow(clippy::cast_possible_truncation)]
    fn push_creg(&mut self, register: Register) -> Vec<ClbitId> {
        let ids: Vec<_> = (0..register.size)
            .map(|i| {
                let id = ClbitId(self.clbits.len() as u32);
                self.clbits.push(Clbit::new(id, &register.name, i));
                self.dag.add_clbit(id);
                id
            })
            .collect();
        self.cregs.push(register);
        ids
    }

    /// Declare a quantum register.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> IrResult<Vec<QubitId>> {
        let name = name.into();
        if self.qregs.iter().any(|r| r.name == name) {
            return Err(IrError::DuplicateRegister(name));
        }
        Ok(self.push_qreg(Register::new(name, size)))
    }

    /// Declare a classical register.
    pub fn add_creg(&mut self, name: impl Into<String>, size: u32) -> IrResult<Vec<ClbitId>> {
        let name = name.into();
        if self.cregs.iter().any(|r| r.name == name) {
            return Err(IrError::DuplicateRegister(name));
        }
        Ok(self.push_creg(Register::new(name, size)))
    }

    /// Resolve a `(register, index)` qubit reference.
    pub fn qubit(&self, register: &str, index: u32) -> IrResult<QubitId> {
        lookup(&self.qregs, register, index).map(QubitId)
    }

    /// Resolve a `(register, index)` classical bit reference.
    pub fn clbit(&self, register: &str, index: u32) -> IrResult<ClbitId> {
        lookup(&self.cregs, register, index).map(ClbitId)
    }

    fn gate(&mut self, gate: StandardGate, qubits: &[QubitId]) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::gate(gate, qubits.iter().copied()))?;
        Ok(self)
    }

    /// Append an arbitrary instruction.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        self.dag.apply(instruction)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply identity gate.
    pub fn id(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::I, &[qubit])
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::H, &[qubit])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::X, &[qubit])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Y, &[qubit])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Z, &[qubit])
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::S, &[qubit])
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Sdg, &[qubit])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::T, &[qubit])
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Tdg, &[qubit])
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Rx(theta), &[qubit])
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Ry(theta), &[qubit])
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Rz(theta), &[qubit])
    }

    /// Apply u1(λ).
    pub fn u1(&mut self, lambda: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::U1(lambda), &[qubit])
    }

    /// Apply u2(φ, λ).
    pub fn u2(&mut self, phi: f64, lambda: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::U2(phi, lambda), &[qubit])
    }

    /// Apply u3(θ, φ, λ).
    pub fn u3(&mut self, theta: f64, phi: f64, lambda: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::U3(theta, phi, lambda), &[qubit])
    }

    // =========================================================================
    // Two-qubit gates
    // =========================================================================

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CX, &[control, target])
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CZ, &[control, target])
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Swap, &[q1, q2])
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::measure(qubit, clbit))?;
        Ok(self)
    }

    /// Apply a barrier to specified qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::barrier(qubits))?;
        Ok(self)
    }

    /// Apply a barrier to all qubits.
    pub fn barrier_all(&mut self) -> IrResult<&mut Self> {
        let qubits: Vec<_> = self.qubits.iter().map(|q| q.id).collect();
        self.barrier(qubits)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the circuit.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Get the circuit depth.
    pub fn depth(&self) -> usize {
        self.dag.depth()
    }

    /// Quantum register declarations.
    pub fn qregs(&self) -> &[Register] {
        &self.qregs
    }

    /// Classical register declarations.
    pub fn cregs(&self) -> &[Register] {
        &self.cregs
    }

    /// Get the qubits in the circuit.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// Get the classical bits in the circuit.
    pub fn clbits(&self) -> &[Clbit] {
        &self.clbits
    }

    /// Get a reference to the underlying DAG.
    pub fn dag(&self) -> &CircuitDag {
        &self.dag
    }

    /// Get a mutable reference to the underlying DAG.
    pub fn dag_mut(&mut self) -> &mut CircuitDag {
        &mut self.dag
    }

    /// Consume the circuit and return the DAG.
    pub fn into_dag(self) -> CircuitDag {
        self.dag
    }

    /// Create a circuit from a DAG with default `q` and `c` registers.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_dag(dag: CircuitDag) -> Self {
        let qregs = vec![Register::new("q", dag.num_qubits() as u32)];
        let cregs = vec![Register::new("c", dag.num_clbits() as u32)];
        let mut circuit = Self::new("circuit");
        circuit.assign_registers(qregs, cregs);
        circuit.dag = dag;
        circuit
    }

    /// Create a circuit from a DAG and explicit register declarations.
    ///
    /// The register sizes must add up to the DAG's wire counts.
    pub fn from_dag_with_registers(
        name: impl Into<String>,
        dag: CircuitDag,
        qregs: Vec<Register>,
        cregs: Vec<Register>,
    ) -> IrResult<Self> {
        let declared_q: usize = qregs.iter().map(|r| r.size as usize).sum();
        if declared_q != dag.num_qubits() {
            return Err(IrError::RegisterSizeMismatch {
                kind: "quantum",
                declared: declared_q,
                actual: dag.num_qubits(),
            });
        }
        let declared_c: usize = cregs.iter().map(|r| r.size as usize).sum();
        if declared_c != dag.num_clbits() {
            return Err(IrError::RegisterSizeMismatch {
                kind: "classical",
                declared: declared_c,
                actual: dag.num_clbits(),
            });
        }

        let mut circuit = Self::new(name);
        circuit.assign_registers(qregs, cregs);
        circuit.dag = dag;
        Ok(circuit)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn assign_registers(&mut self, qregs: Vec<Register>, cregs: Vec<Register>) {
        for reg in &qregs {
            for i in 0..reg.size {
                let id = QubitId(self.qubits.len() as u32);
                self.qubits.push(Qubit::new(id, &reg.name, i));
            }
        }
        for reg in &cregs {
            for i in 0..reg.size {
                let id = ClbitId(self.clbits.len() as u32);
                self.clbits.push(Clbit::new(id, &reg.name, i));
            }
        }
        self.qregs = qregs.into_iter().filter(|r| r.size > 0).collect();
        self.cregs = cregs.into_iter().filter(|r| r.size > 0).collect();
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        circuit
            .h(QubitId(0))?
            .cx(QubitId(0), QubitId(1))?
            .measure(QubitId(0), ClbitId(0))?
            .measure(QubitId(1), ClbitId(1))?;
        Ok(circuit)
    }

    /// Create a GHZ state circuit with a CX chain along qubit order.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("ghz", n, n);
        if n == 0 {
            return Ok(circuit);
        }
        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        for i in 0..n {
            circuit.measure(QubitId(i), ClbitId(i))?;
        }
        Ok(circuit)
    }
}

/// Dense offset of `(register, index)` within a register list.
fn lookup(registers: &[Register], register: &str, index: u32) -> IrResult<u32> {
    let mut offset = 0;
    for reg in registers {
        if reg.name == register {
            if index >= reg.size {
                return Err(IrError::RegisterIndexOutOfRange {
                    register: register.to_string(),
                    index,
                    size: reg.size,
                });
            }
            return Ok(offset + index);
        }
        offset += reg.size;
    }
    Err(IrError::UnknownRegister(register.to_string()))
}
