//! Error types for the compilation crate.

use qmap_ir::QubitId;
use thiserror::Error;

/// Errors that can occur during compilation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] qmap_ir::IrError),

    /// The physical qubits occupied by the layout are not connected.
    #[error("Layout occupies physical qubits {physical:?}, which are not connected in the coupling map")]
    LayoutDisconnected { physical: Vec<u32> },

    /// A circuit qubit has no physical assignment.
    #[error("Layout does not place logical qubit {qubit}")]
    LayoutIncomplete { qubit: QubitId },

    /// Circuit too large for target.
    #[error("Circuit requires {required} qubits but target only has {available}")]
    CircuitTooLarge { required: usize, available: u32 },

    /// Every randomized trial hit its swap cap.
    #[error("Routing failed for layer {layer}: no trial satisfied it within {trials} trials")]
    RoutingFailed { layer: usize, trials: usize },

    /// A CX acts on a pair with no coupling in either direction.
    #[error("CX between physical qubits {control} and {target} has no coupling in either direction")]
    UnsupportedConnection { control: u32, target: u32 },

    /// Malformed coupling map.
    #[error("Invalid coupling map: {0}")]
    InvalidCouplingMap(String),

    /// Malformed initial layout.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Unusable basis gate list.
    #[error("Invalid basis: {0}")]
    InvalidBasis(String),

    /// Missing coupling map for a pass that needs one.
    #[error("Missing coupling map for routing")]
    MissingCouplingMap,

    /// Missing layout for routing.
    #[error("Missing layout for routing")]
    MissingLayout,

    /// The compiled circuit could not be rendered as QASM.
    #[error("QASM emission failed: {0}")]
    Emit(#[from] qmap_qasm::EmitError),
}

/// Coarse classification of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Layout could not be established.
    Layout,
    /// Swap search gave up.
    Routing,
    /// Coupling graph cannot realize a CX.
    UnsupportedConnection,
    /// Inputs to the compiler were malformed.
    Configuration,
}

impl CompileError {
    /// The category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::LayoutDisconnected { .. }
            | Self::LayoutIncomplete { .. }
            | Self::CircuitTooLarge { .. } => ErrorCategory::Layout,
            Self::RoutingFailed { .. } => ErrorCategory::Routing,
            Self::UnsupportedConnection { .. } => ErrorCategory::UnsupportedConnection,
            Self::Ir(_)
            | Self::InvalidCouplingMap(_)
            | Self::InvalidLayout(_)
            | Self::InvalidBasis(_)
            | Self::MissingCouplingMap
            | Self::MissingLayout
            | Self::Emit(_) => ErrorCategory::Configuration,
        }
    }
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
