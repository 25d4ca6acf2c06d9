//! The routing control loop.

use std::collections::BTreeMap;

use tracing::{debug, info, instrument};

use arvak_ir::{CircuitDag, CircuitLevel, StandardGate, UnitId};

use crate::architecture::Architecture;
use crate::error::{RoutingError, RoutingResult};
use crate::frontier::MappingFrontier;
use crate::routing_method::{RoutingMethodDescriptor, RoutingMethodPtr};
use crate::unit_maps::UnitMaps;

/// Routes circuits onto one architecture with a ranked list of methods.
#[derive(Debug, Clone)]
pub struct MappingManager {
    architecture: Architecture,
}

fn count_swaps(circuit: &CircuitDag) -> usize {
    circuit
        .topological_ops()
        .filter(|(_, inst)| inst.is_standard(&StandardGate::Swap))
        .count()
}

/// Labelling methods only name wires; they do not count as modifying the
/// circuit's operations.
fn is_labelling(descriptor: &RoutingMethodDescriptor) -> bool {
    matches!(
        descriptor,
        RoutingMethodDescriptor::LexiLabellingMethod | RoutingMethodDescriptor::AasLabellingMethod
    )
}

impl MappingManager {
    /// Create a manager for `architecture`.
    pub fn new(architecture: Architecture) -> Self {
        Self { architecture }
    }

    /// The target architecture.
    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    /// Route `circuit` in place with fresh unit maps, labelling isolated
    /// qubits.
    ///
    /// Returns whether any operation was inserted or rewritten.
    pub fn route_circuit(
        &self,
        circuit: &mut CircuitDag,
        methods: &[RoutingMethodPtr],
    ) -> RoutingResult<bool> {
        let mut maps = UnitMaps::new();
        self.route_circuit_with_maps(circuit, methods, &mut maps, true)
    }

    /// Route `circuit` in place, recording placement in `maps`.
    ///
    /// Each step advances the boundary over every operation the
    /// architecture already allows, then gives the first method in `methods`
    /// whose check passes and which changes something a turn. Routing fails
    /// with [`RoutingError::NoApplicableMethod`] once no method makes
    /// progress. With `label_isolated_qubits`, qubits the methods never
    /// placed are given nodes afterwards, so the maps cover every qubit.
    #[instrument(skip(self, circuit, methods, maps))]
    pub fn route_circuit_with_maps(
        &self,
        circuit: &mut CircuitDag,
        methods: &[RoutingMethodPtr],
        maps: &mut UnitMaps,
        label_isolated_qubits: bool,
    ) -> RoutingResult<bool> {
        let num_qubits = circuit.num_qubits();
        let num_nodes = self.architecture.n_nodes();
        if num_qubits > num_nodes {
            return Err(RoutingError::CircuitTooLarge {
                required: num_qubits,
                available: num_nodes,
            });
        }
        info!(
            "Routing circuit with {} qubits onto {} nodes using {} methods",
            num_qubits,
            num_nodes,
            methods.len()
        );
        let swaps_before = count_swaps(circuit);

        let mut modified = false;
        {
            let mut frontier = if maps.is_empty() {
                MappingFrontier::new(circuit, maps)
            } else {
                MappingFrontier::with_maps(circuit, maps)?
            };

            loop {
                frontier.advance_frontier_boundary(&self.architecture);
                if frontier.is_finished() {
                    break;
                }

                let mut applied = false;
                for method in methods {
                    if !method.check_method(&frontier, &self.architecture) {
                        continue;
                    }
                    debug!("Running routing method: {}", method.name());
                    let (changed, relabelling) =
                        method.routing_method(&mut frontier, &self.architecture)?;
                    if !relabelling.is_empty() {
                        frontier.update_bimaps(&relabelling);
                    }
                    if changed {
                        modified |= !is_labelling(&method.descriptor());
                        applied = true;
                        break;
                    }
                    debug!("Routing method {} made no change", method.name());
                }

                if !applied {
                    let stuck: Vec<String> = frontier
                        .boundary_operations()
                        .into_iter()
                        .filter_map(|op| frontier.circuit().get_instruction(op))
                        .map(|inst| format!("{}{:?}", inst.name(), inst.qubits))
                        .collect();
                    return Err(RoutingError::NoApplicableMethod(format!(
                        "no routing method applies to boundary operations [{}]",
                        stuck.join(", ")
                    )));
                }
            }

            if label_isolated_qubits {
                self.label_isolated_qubits(&mut frontier)?;
            }
        }

        circuit.set_level(CircuitLevel::Physical);
        let inserted = count_swaps(circuit).saturating_sub(swaps_before);
        info!(
            "Routing completed, inserted swaps: {}, ops: {}",
            inserted,
            circuit.num_ops()
        );
        Ok(modified)
    }

    /// Give every qubit still without a node a free node, or failing that an
    /// ancilla's node.
    fn label_isolated_qubits(&self, frontier: &mut MappingFrontier<'_>) -> RoutingResult<()> {
        let unplaced: Vec<UnitId> = frontier
            .circuit()
            .qubits()
            .filter(|&q| !MappingFrontier::is_placed(q, &self.architecture))
            .collect();

        for unit in unplaced {
            let free = self
                .architecture
                .nodes()
                .iter()
                .copied()
                .find(|&n| !frontier.circuit().contains_unit(UnitId::Node(n)));
            if let Some(node) = free {
                frontier.rename_units(&BTreeMap::from([(unit, UnitId::Node(node))]))?;
                debug!("labelled isolated {unit} as {node}");
                continue;
            }
            let ancilla = frontier.ancilla_nodes().iter().next().copied();
            match ancilla {
                Some(node) => frontier.merge_ancilla(unit, node)?,
                None => {
                    return Err(RoutingError::Unlabellable {
                        unit,
                        reason: "no free node or ancilla left for isolated qubit".into(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use arvak_ir::{Circuit, Node, QubitId};

    use crate::box_decomposition::BoxDecompositionRoutingMethod;
    use crate::circuit_method::{CircuitRouting, RoutingMethodCircuit};
    use crate::lexi_route::{LexiLabellingMethod, LexiRouteRoutingMethod};
    use crate::routing_method::default_routing_methods;
    use crate::unit_maps::check_permutation;

    #[test]
    fn test_too_large_circuit_rejected() {
        let manager = MappingManager::new(Architecture::linear(2));
        let mut dag = Circuit::with_size("wide", 3, 0).into_dag();
        let err = manager.route_circuit(&mut dag, &default_routing_methods());
        assert!(matches!(
            err,
            Err(RoutingError::CircuitTooLarge {
                required: 3,
                available: 2
            })
        ));
    }

    #[test]
    fn test_isolated_qubits_labelled() {
        let manager = MappingManager::new(Architecture::linear(3));
        let mut circuit = Circuit::with_size("isolated", 3, 0);
        circuit.h(QubitId(2)).unwrap();
        let mut dag = circuit.into_dag();

        let mut maps = UnitMaps::new();
        let modified = manager
            .route_circuit_with_maps(&mut dag, &default_routing_methods(), &mut maps, true)
            .unwrap();
        assert!(!modified);
        assert_eq!(maps.initial().len(), 3);
        assert!(dag.qubits().all(|q| q.as_node().is_some()));
        assert_eq!(dag.level(), CircuitLevel::Physical);
    }

    #[test]
    fn test_isolated_qubits_left_alone() {
        let manager = MappingManager::new(Architecture::linear(3));
        let mut dag = Circuit::with_size("isolated", 2, 0).into_dag();
        let mut maps = UnitMaps::new();
        manager
            .route_circuit_with_maps(&mut dag, &default_routing_methods(), &mut maps, false)
            .unwrap();
        assert!(dag.qubits().all(|q| q.as_node().is_none()));
    }

    #[test]
    fn test_routes_long_range_cx_on_line() {
        let manager = MappingManager::new(Architecture::linear(4));
        let mut circuit = Circuit::with_size("long", 4, 0);
        circuit
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .cx(QubitId(1), QubitId(2))
            .unwrap()
            .cx(QubitId(2), QubitId(3))
            .unwrap()
            .cx(QubitId(0), QubitId(3))
            .unwrap();
        let mut dag = circuit.into_dag();
        let mut maps = UnitMaps::new();
        let modified = manager
            .route_circuit_with_maps(&mut dag, &default_routing_methods(), &mut maps, true)
            .unwrap();
        assert!(modified);
        assert!(check_permutation(&dag, &maps));
        for (_, inst) in dag.topological_ops() {
            if inst.num_qubits() == 2 {
                let a = inst.qubits[0].as_node().unwrap();
                let b = inst.qubits[1].as_node().unwrap();
                assert_eq!(manager.architecture().get_distance(a, b), Some(1));
            }
        }
    }

    #[test]
    fn test_no_method_is_an_error() {
        let manager = MappingManager::new(Architecture::linear(3));
        let mut circuit = Circuit::with_size("stuck", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        let mut dag = circuit.into_dag();
        let methods: Vec<RoutingMethodPtr> = vec![Arc::new(BoxDecompositionRoutingMethod)];
        let err = manager.route_circuit(&mut dag, &methods);
        assert!(matches!(err, Err(RoutingError::NoApplicableMethod(_))));
    }

    #[test]
    fn test_placed_valid_circuit_untouched() {
        let manager = MappingManager::new(Architecture::linear(3));
        let mut dag = CircuitDag::new();
        for i in 0..3 {
            dag.add_node(Node(i));
        }
        dag.apply(arvak_ir::Instruction::two_qubit_gate(
            StandardGate::CX,
            Node(0),
            Node(1),
        ))
        .unwrap();
        let methods: Vec<RoutingMethodPtr> = vec![
            Arc::new(LexiLabellingMethod),
            Arc::new(LexiRouteRoutingMethod::default()),
        ];
        assert!(!manager.route_circuit(&mut dag, &methods).unwrap());
        assert_eq!(dag.num_ops(), 1);
    }

    /// Places q0, q1 on n0, n2 and routes cx(q0, q1) through n1.
    fn place_and_route_through_middle(region: &CircuitDag, _arch: &Architecture) -> CircuitRouting {
        let initial = BTreeMap::from([
            (QubitId(0).into(), Node(0).into()),
            (QubitId(1).into(), Node(2).into()),
        ]);
        if region.num_ops() != 1 {
            return (false, CircuitDag::new(), initial, BTreeMap::new());
        }
        let mut replacement = CircuitDag::new();
        for i in 0..3 {
            replacement.add_node(Node(i));
        }
        replacement
            .apply(arvak_ir::Instruction::two_qubit_gate(StandardGate::Swap, Node(1), Node(2)))
            .unwrap();
        replacement
            .apply(arvak_ir::Instruction::two_qubit_gate(StandardGate::CX, Node(0), Node(1)))
            .unwrap();
        let final_perm = BTreeMap::from([
            (Node(1).into(), Node(2).into()),
            (Node(2).into(), Node(1).into()),
        ]);
        (true, replacement, initial, final_perm)
    }

    #[test]
    fn test_circuit_method_relabelling_reaches_caller_maps() {
        let manager = MappingManager::new(Architecture::linear(3));
        let mut circuit = Circuit::with_size("pair", 2, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let mut dag = circuit.into_dag();
        let methods: Vec<RoutingMethodPtr> =
            vec![Arc::new(RoutingMethodCircuit::new(place_and_route_through_middle, 10, 10))];

        let mut maps = UnitMaps::new();
        let modified = manager
            .route_circuit_with_maps(&mut dag, &methods, &mut maps, true)
            .unwrap();

        assert!(modified);
        let q0 = UnitId::from(QubitId(0));
        let q1 = UnitId::from(QubitId(1));
        assert_eq!(maps.initial().get(q0), Some(Node(0).into()));
        assert_eq!(maps.initial().get(q1), Some(Node(2).into()));
        assert_eq!(maps.final_map().get(q0), Some(Node(0).into()));
        assert_eq!(maps.final_map().get(q1), Some(Node(1).into()));
        assert!(!maps.final_map().contains_right(q0));
        assert!(!maps.final_map().contains_right(q1));
        assert!(check_permutation(&dag, &maps));
        assert_eq!(dag.num_ops(), 2);
    }

    /// n0 and n2 hold data and need a SWAP through the empty n1; q0 is
    /// idle.
    fn routed_around_idle_qubit() -> CircuitDag {
        let mut dag = CircuitDag::new();
        dag.add_node(Node(0));
        dag.add_node(Node(2));
        dag.add_qubit(QubitId(0));
        dag.apply(arvak_ir::Instruction::two_qubit_gate(StandardGate::CZ, Node(0), Node(2)))
            .unwrap();
        dag
    }

    #[test]
    fn test_isolated_qubit_takes_free_node_before_ancilla() {
        let manager = MappingManager::new(Architecture::linear(4));
        let mut dag = routed_around_idle_qubit();
        let mut maps = UnitMaps::new();
        assert!(
            manager
                .route_circuit_with_maps(&mut dag, &default_routing_methods(), &mut maps, true)
                .unwrap()
        );

        let q0 = UnitId::from(QubitId(0));
        assert_eq!(maps.initial().get(q0), Some(Node(3).into()));
        assert_eq!(maps.final_map().get(q0), Some(Node(3).into()));
        // The ancilla brought in by the SWAP keeps its own wire.
        assert_eq!(dag.num_qubits(), 4);
        assert!(check_permutation(&dag, &maps));
    }

    #[test]
    fn test_isolated_qubit_merged_into_ancilla() {
        let manager = MappingManager::new(Architecture::linear(3));
        let mut dag = routed_around_idle_qubit();
        let mut maps = UnitMaps::new();
        assert!(
            manager
                .route_circuit_with_maps(&mut dag, &default_routing_methods(), &mut maps, true)
                .unwrap()
        );

        let q0 = UnitId::from(QubitId(0));
        assert_eq!(maps.initial().get(q0), Some(Node(1).into()));
        assert_ne!(maps.final_map().get(q0), Some(Node(1).into()));
        assert!(!maps.initial().contains(Node(1).into()));
        assert_eq!(dag.num_qubits(), 3);
        assert!(dag.qubits().all(|q| q.as_node().is_some()));
        assert!(check_permutation(&dag, &maps));
    }
}
