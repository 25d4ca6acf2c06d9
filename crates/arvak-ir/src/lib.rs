//! Arvak Circuit Intermediate Representation
//!
//! This crate provides the circuit data structures that the Arvak qubit
//! router reads and rewrites.
//!
//! # Overview
//!
//! The circuit IR uses a DAG (Directed Acyclic Graph) representation internally.
//! Every wire is labelled by a [`UnitId`]: a logical qubit before placement, a
//! physical [`Node`] after placement, or a classical bit. Routing renames wires
//! in place, so the same graph moves from the logical to the physical level.
//! The high-level [`Circuit`] API provides a builder for logical circuits.
//!
//! # Core Components
//!
//! - **Units**: [`QubitId`], [`Node`], [`ClbitId`] and the wire label [`UnitId`]
//! - **Gates**: [`StandardGate`] for built-in gates (H, X, CX, BRIDGE, etc.)
//! - **Instructions**: [`Instruction`] combining operations with their operands,
//!   including [`CircuitBox`] and [`PhasePolyBox`] composites
//! - **DAG**: [`CircuitDag`] with stable indices and wire-level editing
//! - **Circuit**: [`Circuit`] high-level builder API
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use arvak_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3);
//! ```
//!
//! # Example: Walking the Circuit Layer by Layer
//!
//! ```rust
//! use arvak_ir::{Boundary, Circuit, QubitId};
//!
//! let circuit = Circuit::ghz(3).unwrap();
//! let dag = circuit.dag();
//! let boundary: Boundary = dag
//!     .units()
//!     .filter_map(|u| dag.input_node(u).map(|n| (u, n)))
//!     .collect();
//!
//! let cut = dag.next_cut(&boundary);
//! assert_eq!(cut.slice.len(), 1); // the leading H
//! ```

pub mod circuit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use dag::{Boundary, CircuitDag, CircuitLevel, Cut, DagEdge, DagNode, NodeIndex};
pub use error::{IrError, IrResult};
pub use gate::{Gate, Pauli, StandardGate};
pub use instruction::{
    CircuitBox, ClassicalCondition, Instruction, InstructionKind, PhasePolyBox,
};
pub use qubit::{ClbitId, Node, QubitId, UnitId};
