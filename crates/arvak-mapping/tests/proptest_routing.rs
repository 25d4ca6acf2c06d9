//! Property-based tests for routing random circuits.
//!
//! Tests that every routed circuit satisfies the architecture, that SWAPs
//! explain the final placement and that routing only adds SWAPs (or turns a
//! CX into a BRIDGE) without losing any of the original operations.

use arvak_ir::{Circuit, CircuitDag, QubitId, StandardGate, UnitId};
use arvak_mapping::{
    Architecture, MappingFrontier, MappingManager, UnitMaps, check_permutation,
    default_routing_methods,
};
use proptest::prelude::*;

/// Gate operations that can be applied to a circuit.
#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    X(u32),
    Rz(f64, u32),
    CX(u32, u32),
    CZ(u32, u32),
}

impl GateOp {
    fn apply(self, circuit: &mut Circuit) {
        match self {
            GateOp::H(q) => {
                let _ = circuit.h(QubitId(q));
            }
            GateOp::X(q) => {
                let _ = circuit.x(QubitId(q));
            }
            GateOp::Rz(theta, q) => {
                let _ = circuit.rz(theta, QubitId(q));
            }
            GateOp::CX(q1, q2) => {
                let _ = circuit.cx(QubitId(q1), QubitId(q2));
            }
            GateOp::CZ(q1, q2) => {
                let _ = circuit.cz(QubitId(q1), QubitId(q2));
            }
        }
    }
}

/// Generate a pair of distinct qubits.
fn arb_pair(num_qubits: u32) -> impl Strategy<Value = (u32, u32)> {
    (0..num_qubits, 1..num_qubits).prop_map(move |(a, d)| (a, (a + d) % num_qubits))
}

/// Generate a random gate operation for a circuit with at least two qubits.
fn arb_gate_op(num_qubits: u32) -> impl Strategy<Value = GateOp> {
    prop_oneof![
        1 => (0..num_qubits).prop_map(GateOp::H),
        1 => (0..num_qubits).prop_map(GateOp::X),
        1 => (-3.0_f64..3.0, 0..num_qubits).prop_map(|(t, q)| GateOp::Rz(t, q)),
        3 => arb_pair(num_qubits).prop_map(|(a, b)| GateOp::CX(a, b)),
        2 => arb_pair(num_qubits).prop_map(|(a, b)| GateOp::CZ(a, b)),
    ]
}

/// Generate a random circuit on `num_qubits` qubits with 1-25 gates.
fn arb_circuit(num_qubits: u32) -> impl Strategy<Value = Circuit> {
    prop::collection::vec(arb_gate_op(num_qubits), 1..=25).prop_map(move |ops| {
        let mut circuit = Circuit::with_size("random", num_qubits, 0);
        for op in ops {
            op.apply(&mut circuit);
        }
        circuit
    })
}

/// Generate an architecture with `num_nodes` nodes.
fn arb_architecture(num_nodes: u32) -> impl Strategy<Value = Architecture> {
    prop_oneof![
        Just(Architecture::linear(num_nodes)),
        Just(Architecture::ring(num_nodes)),
    ]
}

/// Generate a circuit together with an architecture at least as large.
fn arb_routing_case() -> impl Strategy<Value = (Circuit, Architecture)> {
    (2_u32..=6)
        .prop_flat_map(|num_qubits| (Just(num_qubits), 0_u32..=2))
        .prop_flat_map(|(num_qubits, spare)| {
            let num_nodes = (num_qubits + spare).max(3);
            (arb_circuit(num_qubits), arb_architecture(num_nodes))
        })
}

fn count_swaps(dag: &CircuitDag) -> usize {
    dag.topological_ops()
        .filter(|(_, inst)| inst.is_standard(&StandardGate::Swap))
        .count()
}

fn route(circuit: Circuit, arch: &Architecture) -> (CircuitDag, UnitMaps) {
    let mut dag = circuit.into_dag();
    let mut maps = UnitMaps::new();
    MappingManager::new(arch.clone())
        .route_circuit_with_maps(&mut dag, &default_routing_methods(), &mut maps, true)
        .unwrap();
    (dag, maps)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn routed_circuits_satisfy_architecture((circuit, arch) in arb_routing_case()) {
        let (dag, _) = route(circuit, &arch);
        for (_, inst) in dag.topological_ops() {
            prop_assert!(
                MappingFrontier::valid_boundary_operation(&arch, inst),
                "{} on {:?}", inst.name(), inst.qubits
            );
        }
    }

    #[test]
    fn swaps_explain_final_placement((circuit, arch) in arb_routing_case()) {
        let (dag, maps) = route(circuit, &arch);
        prop_assert!(check_permutation(&dag, &maps));
    }

    #[test]
    fn final_map_is_total((circuit, arch) in arb_routing_case()) {
        let num_qubits = circuit.num_qubits() as u32;
        let (dag, maps) = route(circuit, &arch);
        for i in 0..num_qubits {
            let q = UnitId::from(QubitId(i));
            prop_assert!(maps.initial().get(q).is_some_and(|n| n.as_node().is_some()));
            prop_assert!(maps.final_map().get(q).is_some_and(|n| n.as_node().is_some()));
        }
        prop_assert!(dag.qubits().all(|u| u.as_node().is_some()));
    }

    #[test]
    fn routing_only_adds_swaps((circuit, arch) in arb_routing_case()) {
        let original = circuit.dag().num_ops();
        let (dag, _) = route(circuit, &arch);
        prop_assert_eq!(dag.num_ops() - count_swaps(&dag), original);
    }
}
