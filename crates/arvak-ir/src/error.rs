//! Error types for the IR crate.

use crate::qubit::UnitId;
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Unit (qubit, node or bit) not found in circuit.
    #[error("Unit {unit} not found in circuit{}", format_gate_context(.gate_name))]
    UnitNotFound {
        /// The unit that was not found.
        unit: UnitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Unit already present in circuit.
    #[error("Unit {0} already exists in circuit")]
    UnitExists(UnitId),

    /// Invalid DAG structure.
    #[error("Invalid DAG structure: {0}")]
    InvalidDag(String),

    /// Invalid node index.
    #[error("Invalid node index")]
    InvalidNode,

    /// Instruction contents are not acceptable.
    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),

    /// Gate requires different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Duplicate unit in operation.
    #[error("Duplicate unit {unit} in operation{}", format_gate_context(.gate_name))]
    DuplicateUnit {
        /// The duplicate unit.
        unit: UnitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },
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
