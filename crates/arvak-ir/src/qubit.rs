//! Unit identifiers: logical qubits, physical nodes and classical bits.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a logical qubit wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

/// Identifier for a physical site on a device.
///
/// A logical qubit that has been placed on the device is renamed to the
/// node that hosts it, so the same identifier also labels circuit wires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Node(pub u32);

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<u32> for Node {
    fn from(id: u32) -> Self {
        Node(id)
    }
}

/// Identifier for a classical bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClbitId(pub u32);

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for ClbitId {
    fn from(id: u32) -> Self {
        ClbitId(id)
    }
}

/// Any unit that can label a wire of a circuit.
///
/// Ordering puts logical qubits first, then nodes, then bits. Routing relies
/// on this order being total and stable for deterministic decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitId {
    /// A logical qubit that has not been placed.
    Qubit(QubitId),
    /// A physical node (a placed qubit or an ancilla).
    Node(Node),
    /// A classical bit.
    Bit(ClbitId),
}

impl UnitId {
    /// Check if this unit carries quantum data.
    #[inline]
    pub fn is_quantum(&self) -> bool {
        !matches!(self, UnitId::Bit(_))
    }

    /// Get the node if this unit is a node.
    #[inline]
    pub fn as_node(&self) -> Option<Node> {
        match self {
            UnitId::Node(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the bit if this unit is a classical bit.
    #[inline]
    pub fn as_bit(&self) -> Option<ClbitId> {
        match self {
            UnitId::Bit(c) => Some(*c),
            _ => None,
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitId::Qubit(q) => write!(f, "{q}"),
            UnitId::Node(n) => write!(f, "{n}"),
            UnitId::Bit(c) => write!(f, "{c}"),
        }
    }
}

impl From<QubitId> for UnitId {
    fn from(q: QubitId) -> Self {
        UnitId::Qubit(q)
    }
}

impl From<Node> for UnitId {
    fn from(n: Node) -> Self {
        UnitId::Node(n)
    }
}

impl From<ClbitId> for UnitId {
    fn from(c: ClbitId) -> Self {
        UnitId::Bit(c)
    }
}
