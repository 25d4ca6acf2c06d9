//! Arvak Qubit Routing
//!
//! This crate places the logical qubits of a circuit on the nodes of a
//! device's coupling graph and inserts the operations needed so that every
//! multi-qubit operation acts on coupled nodes.
//!
//! # Overview
//!
//! Routing walks a [`MappingFrontier`] through the circuit DAG. The frontier
//! keeps, per wire, the last operation known to satisfy the
//! [`Architecture`]; the [`MappingManager`] advances it as far as possible
//! and then asks a ranked list of [`RoutingMethod`]s to unblock it. Methods
//! rewrite the circuit in place (SWAPs, BRIDGEs, relabelling, box
//! decomposition, gate reordering, resynthesis) while the frontier keeps the
//! [`UnitMaps`] from logical qubits to nodes up to date.
//!
//! # Routing Methods
//!
//! - [`LexiLabellingMethod`]: places unplaced qubits near their partners
//! - [`LexiRouteRoutingMethod`]: lexicographic SWAP/BRIDGE selection with
//!   lookahead
//! - [`MultiGateReorderRoutingMethod`]: commutes already-valid gates to the
//!   boundary
//! - [`BoxDecompositionRoutingMethod`]: expands boxes one level
//! - [`AASLabellingMethod`] / [`AASRouteRoutingMethod`]: architecture-aware
//!   synthesis of phase polynomial boxes
//! - [`RoutingMethodCircuit`]: user-supplied transformations of the region
//!   after the boundary
//!
//! # Example
//!
//! ```rust
//! use arvak_ir::Circuit;
//! use arvak_mapping::{
//!     check_permutation, default_routing_methods, Architecture, MappingManager, UnitMaps,
//! };
//!
//! let mut dag = Circuit::ghz(4).unwrap().into_dag();
//! let manager = MappingManager::new(Architecture::linear(4));
//! let mut maps = UnitMaps::new();
//! manager
//!     .route_circuit_with_maps(&mut dag, &default_routing_methods(), &mut maps, true)
//!     .unwrap();
//!
//! assert!(check_permutation(&dag, &maps));
//! assert_eq!(maps.final_map().len(), 4);
//! ```

pub mod aas;
pub mod architecture;
pub mod box_decomposition;
pub mod circuit_method;
pub mod error;
pub mod frontier;
pub mod lexi_route;
pub mod manager;
pub mod multi_gate_reorder;
pub mod routing_method;
pub mod unit_maps;

pub use aas::{AASLabellingMethod, AASRouteRoutingMethod};
pub use architecture::Architecture;
pub use box_decomposition::BoxDecompositionRoutingMethod;
pub use circuit_method::{CircuitRouting, CircuitRoutingFn, RoutingMethodCircuit};
pub use error::{RoutingError, RoutingResult};
pub use frontier::{FrontierSubcircuit, Interaction, MappingFrontier};
pub use lexi_route::{LexiLabellingMethod, LexiRoute, LexiRouteRoutingMethod};
pub use manager::MappingManager;
pub use multi_gate_reorder::{MultiGateReorder, MultiGateReorderRoutingMethod};
pub use routing_method::{
    CNotSynthType, Relabelling, RoutingMethod, RoutingMethodDescriptor, RoutingMethodPtr,
    default_routing_methods,
};
pub use unit_maps::{UnitBimap, UnitMaps, check_permutation};
