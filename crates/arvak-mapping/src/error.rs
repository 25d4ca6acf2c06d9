//! Error types for qubit routing.

use arvak_ir::{IrError, UnitId};
use thiserror::Error;

/// Errors that can occur while routing a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RoutingError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    /// A qubit must be placed but no node can host it.
    #[error("Unable to assign physical qubit to {unit}: {reason}")]
    Unlabellable {
        /// The qubit that could not be placed.
        unit: UnitId,
        /// Why no node was available.
        reason: String,
    },

    /// A routing method was constructed with parameters it cannot work with.
    #[error("Invalid routing method configuration: {0}")]
    InvalidConfig(String),

    /// The boundary is stuck: no ranked method applies.
    #[error("No routing method applies at the current boundary: {0}")]
    NoApplicableMethod(String),

    /// More qubits than the architecture has nodes.
    #[error("Circuit requires {required} qubits but architecture only has {available} nodes")]
    CircuitTooLarge {
        /// Quantum wires in the circuit.
        required: usize,
        /// Nodes in the architecture.
        available: usize,
    },

    /// Caller-supplied unit maps do not cover the circuit.
    #[error("Invalid unit maps: {0}")]
    InvalidMaps(String),

    /// A node does not exist in the architecture.
    #[error("Node {0} not found in architecture")]
    UnknownNode(UnitId),
}

/// Result type for routing operations.
pub type RoutingResult<T> = Result<T, RoutingError>;
