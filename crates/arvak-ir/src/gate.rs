//! Quantum gate types.

use serde::{Deserialize, Serialize};

/// Single-qubit Pauli basis, used to describe commutation on a gate port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity: commutes with everything.
    I,
    /// X basis.
    X,
    /// Y basis.
    Y,
    /// Z basis.
    Z,
}

/// Standard gates with known semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),
    /// Phase gate.
    P(f64),

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// SWAP gate.
    Swap,
    /// Controlled rotation around Z.
    CRz(f64),
    /// Controlled phase gate.
    CP(f64),
    /// ZZ rotation gate.
    RZZ(f64),

    // Three-qubit gates
    /// Toffoli gate (CCX).
    CCX,
    /// Fredkin gate (CSWAP).
    CSwap,
    /// CX between the first and last qubit, executed through the middle one.
    ///
    /// The middle qubit is left unchanged. Routing inserts this in place of a
    /// CX whose qubits sit two edges apart.
    Bridge,
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::CH => "ch",
            StandardGate::Swap => "swap",
            StandardGate::CRz(_) => "crz",
            StandardGate::CP(_) => "cp",
            StandardGate::RZZ(_) => "rzz",
            StandardGate::CCX => "ccx",
            StandardGate::CSwap => "cswap",
            StandardGate::Bridge => "bridge",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::SX
            | StandardGate::SXdg
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_)
            | StandardGate::P(_) => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::CRz(_)
            | StandardGate::CP(_)
            | StandardGate::RZZ(_) => 2,

            StandardGate::CCX | StandardGate::CSwap | StandardGate::Bridge => 3,
        }
    }

    /// Check if exchanging the qubits of this gate leaves it unchanged.
    ///
    /// Symmetric gates can run on a directed edge in either orientation.
    pub fn is_symmetric(&self) -> bool {
        matches!(
            self,
            StandardGate::CZ | StandardGate::Swap | StandardGate::CP(_) | StandardGate::RZZ(_)
        ) || self.num_qubits() == 1
    }

    /// The Pauli basis this gate commutes with on the given port, if any.
    pub fn commuting_basis(&self, port: usize) -> Option<Pauli> {
        match self {
            StandardGate::I => Some(Pauli::I),
            StandardGate::X | StandardGate::SX | StandardGate::SXdg | StandardGate::Rx(_) => {
                Some(Pauli::X)
            }
            StandardGate::Y | StandardGate::Ry(_) => Some(Pauli::Y),
            StandardGate::Z
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::Rz(_)
            | StandardGate::P(_) => Some(Pauli::Z),
            StandardGate::H | StandardGate::Swap => None,
            StandardGate::CZ | StandardGate::CRz(_) | StandardGate::CP(_) | StandardGate::RZZ(_) => {
                Some(Pauli::Z)
            }
            StandardGate::CX => match port {
                0 => Some(Pauli::Z),
                _ => Some(Pauli::X),
            },
            StandardGate::CY => match port {
                0 => Some(Pauli::Z),
                _ => Some(Pauli::Y),
            },
            StandardGate::CH | StandardGate::CSwap => match port {
                0 => Some(Pauli::Z),
                _ => None,
            },
            StandardGate::CCX => match port {
                0 | 1 => Some(Pauli::Z),
                _ => Some(Pauli::X),
            },
            StandardGate::Bridge => match port {
                0 => Some(Pauli::Z),
                1 => Some(Pauli::I),
                _ => Some(Pauli::X),
            },
        }
    }

    /// Check whether this gate, on `port`, commutes with an operation whose
    /// commuting basis is `basis`.
    pub fn commutes_with_basis(&self, basis: Option<Pauli>, port: usize) -> bool {
        let Some(other) = basis else {
            return false;
        };
        match self.commuting_basis(port) {
            Some(mine) => mine == other || mine == Pauli::I || other == Pauli::I,
            None => false,
        }
    }
}

/// A gate with associated metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// The gate itself.
    pub standard: StandardGate,
    /// Optional label for the gate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Gate {
    /// Create a new gate from a standard gate.
    pub fn standard(gate: StandardGate) -> Self {
        Self {
            standard: gate,
            label: None,
        }
    }

    /// Add a label to the gate.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the name of this gate.
    pub fn name(&self) -> &str {
        self.standard.name()
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.standard.num_qubits()
    }

    /// The underlying standard gate.
    #[inline]
    pub fn as_standard(&self) -> &StandardGate {
        &self.standard
    }

    /// Check if this gate is symmetric in its qubits.
    pub fn is_symmetric(&self) -> bool {
        self.standard.is_symmetric()
    }

    /// The Pauli basis this gate commutes with on `port`.
    pub fn commuting_basis(&self, port: usize) -> Option<Pauli> {
        self.standard.commuting_basis(port)
    }

    /// See [`StandardGate::commutes_with_basis`].
    pub fn commutes_with_basis(&self, basis: Option<Pauli>, port: usize) -> bool {
        self.standard.commutes_with_basis(basis, port)
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::standard(gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_standard_gate_properties() {
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert_eq!(StandardGate::CCX.num_qubits(), 3);
        assert_eq!(StandardGate::Bridge.num_qubits(), 3);
        assert_eq!(StandardGate::Bridge.name(), "bridge");
    }

    #[test]
    fn test_symmetry() {
        assert!(StandardGate::CZ.is_symmetric());
        assert!(StandardGate::Swap.is_symmetric());
        assert!(StandardGate::CP(PI).is_symmetric());
        assert!(!StandardGate::CX.is_symmetric());
        assert!(!StandardGate::CRz(PI).is_symmetric());
    }

    #[test]
    fn test_commuting_basis() {
        assert_eq!(StandardGate::CX.commuting_basis(0), Some(Pauli::Z));
        assert_eq!(StandardGate::CX.commuting_basis(1), Some(Pauli::X));
        assert_eq!(StandardGate::H.commuting_basis(0), None);

        // Rz on the control of a CX commutes, on the target it does not.
        let rz = StandardGate::Rz(0.3);
        assert!(rz.commutes_with_basis(StandardGate::CX.commuting_basis(0), 0));
        assert!(!rz.commutes_with_basis(StandardGate::CX.commuting_basis(1), 0));

        // Identity commutes with anything that has a basis.
        assert!(StandardGate::I.commutes_with_basis(Some(Pauli::X), 0));
        assert!(!StandardGate::I.commutes_with_basis(None, 0));
    }

    #[test]
    fn test_gate_creation() {
        let h = Gate::standard(StandardGate::H);
        assert_eq!(h.name(), "h");
        assert_eq!(h.num_qubits(), 1);
        assert!(h.label.is_none());

        let h_labeled = Gate::standard(StandardGate::H).with_label("my_hadamard");
        assert_eq!(h_labeled.label, Some("my_hadamard".to_string()));

        let cz = Gate::from(StandardGate::CZ);
        assert!(cz.is_symmetric());
        assert_eq!(cz.as_standard(), &StandardGate::CZ);
    }
}
