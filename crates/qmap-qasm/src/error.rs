//! Error types for QASM emission.

use qmap_ir::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur while emitting a circuit.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum EmitError {
    /// An operand has no register binding in the circuit.
    #[error("Qubit {0} is not bound to any register")]
    UnboundQubit(QubitId),

    /// A classical operand has no register binding in the circuit.
    #[error("Classical bit {0} is not bound to any register")]
    UnboundClbit(ClbitId),

    /// Measurement without a matching classical bit.
    #[error("Measurement on {qubits} qubit(s) writes {clbits} classical bit(s)")]
    MeasureArity { qubits: usize, clbits: usize },

    /// Angle is NaN or infinite.
    #[error("Gate '{gate}' has a non-finite parameter")]
    NonFiniteParameter { gate: String },
}

/// Result type for emission.
pub type EmitResult<T> = Result<T, EmitError>;
