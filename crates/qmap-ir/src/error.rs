//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit not found in circuit.
    #[error("Qubit {qubit} not found in circuit{}", format_gate_context(.gate_name))]
    QubitNotFound {
        /// The qubit that was not found.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Classical bit not found in circuit.
    #[error("Classical bit {clbit} not found in circuit{}", format_gate_context(.gate_name))]
    ClbitNotFound {
        /// The classical bit that was not found.
        clbit: ClbitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Invalid DAG structure.
    #[error("Invalid DAG structure: {0}")]
    InvalidDag(String),

    /// Node index does not refer to an operation.
    #[error("Invalid node index")]
    InvalidNode,

    /// Gate requires a different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Gate requires a different number of parameters.
    #[error("Gate '{gate_name}' takes {expected} parameters, got {got}")]
    ParameterCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of parameters.
        expected: usize,
        /// Actual number of parameters provided.
        got: usize,
    },

    /// Gate name is not part of the standard gate set.
    #[error("Unknown gate '{0}'")]
    UnknownGate(String),

    /// Duplicate qubit in operation.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Register name is not declared.
    #[error("Unknown register '{0}'")]
    UnknownRegister(String),

    /// Register declared twice.
    #[error("Register '{0}' is already declared")]
    DuplicateRegister(String),

    /// Index past the end of a register.
    #[error("Index {index} out of range for register '{register}' of size {size}")]
    RegisterIndexOutOfRange {
        /// Register name.
        register: String,
        /// Requested index.
        index: u32,
        /// Declared size.
        size: u32,
    },

    /// Register sizes do not add up to the wires of a DAG.
    #[error("Registers declare {declared} {kind} wires but the DAG has {actual}")]
    RegisterSizeMismatch {
        /// "quantum" or "classical".
        kind: &'static str,
        /// Sum of register sizes.
        declared: usize,
        /// Wires present in the DAG.
        actual: usize,
    },

    /// Malformed JSON circuit description.
    #[error("Invalid circuit description: {0}")]
    Json(#[from] serde_json::Error),
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
