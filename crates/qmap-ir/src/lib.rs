//! Circuit intermediate representation for the qmap compiler.
//!
//! This crate provides the data structures every compiler pass works on:
//! register-addressed qubits, a small standard gate set with bound angles,
//! and a DAG of operations in which each wire is a totally ordered path.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`] dense ids, resolved
//!   from `(register, index)` references through [`Circuit::qubit`]
//! - **Gates**: [`StandardGate`], including the `u1`/`u2`/`u3` native family
//! - **Instructions**: [`Instruction`] combining a gate, measure or barrier with
//!   its operands
//! - **DAG**: [`CircuitDag`] with per-wire predecessor and successor queries and
//!   in-place node substitution
//! - **Circuit**: [`Circuit`] builder that owns registers and the DAG
//! - **Descriptions**: [`CircuitDescription`], the JSON form of a circuit
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qmap_ir::{Circuit, QubitId, ClbitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure(QubitId(0), ClbitId(0)).unwrap();
//! circuit.measure(QubitId(1), ClbitId(1)).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `id` | 1 | Identity |
//! | `x`, `y`, `z` | 1 | Pauli gates |
//! | `h` | 1 | Hadamard gate |
//! | `s`, `sdg`, `t`, `tdg` | 1 | Phase gates |
//! | `rx`, `ry`, `rz` | 1 | Rotation gates |
//! | `u1`, `u2`, `u3` | 1 | Native single-qubit family |
//! | `cx` | 2 | Controlled-NOT |
//! | `cz` | 2 | Controlled-Z |
//! | `swap` | 2 | SWAP gate |

pub mod circuit;
pub mod dag;
pub mod description;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use dag::{CircuitDag, CircuitLevel, DagEdge, DagNode, NodeIndex, WireId};
pub use description::{BitRef, CircuitDescription, OpDescription};
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{Clbit, ClbitId, Qubit, QubitId, Register};
