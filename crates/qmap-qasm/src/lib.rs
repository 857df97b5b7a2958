//! `OpenQASM` 2.0 output for qmap circuits.
//!
//! Compiled circuits are handed to execution backends as `OPENQASM 2.0`
//! text using the `qelib1.inc` gate library. Register declarations follow
//! the circuit's own registers, so a physical circuit produced by the
//! compiler is written against a single `q` register whose indices are
//! device qubits.
//!
//! # Example
//!
//! ```rust
//! use qmap_ir::Circuit;
//! use qmap_qasm::emit;
//!
//! let circuit = Circuit::bell().unwrap();
//! let qasm = emit(&circuit).unwrap();
//! assert!(qasm.starts_with("OPENQASM 2.0;"));
//! assert!(qasm.contains("qreg q[2];"));
//! assert!(qasm.contains("cx q[0],q[1];"));
//! ```

pub mod emitter;
pub mod error;

pub use emitter::{emit, format_angle};
pub use error::{EmitError, EmitResult};
