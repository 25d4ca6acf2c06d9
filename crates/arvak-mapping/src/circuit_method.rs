//! A routing method backed by a user-supplied circuit transformation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use arvak_ir::{CircuitDag, UnitId};

use crate::architecture::Architecture;
use crate::error::RoutingResult;
use crate::frontier::MappingFrontier;
use crate::routing_method::{Relabelling, RoutingMethod, RoutingMethodDescriptor};

/// Result of a circuit transformation: whether it accepted the region, the
/// replacement, the renaming applied before it and the permutation it leaves
/// behind.
pub type CircuitRouting = (bool, CircuitDag, BTreeMap<UnitId, UnitId>, BTreeMap<UnitId, UnitId>);

/// The transformation applied to the region after the boundary.
pub type CircuitRoutingFn = dyn Fn(&CircuitDag, &Architecture) -> CircuitRouting + Send + Sync;

/// Routes the next few cuts with an arbitrary function.
///
/// The function sees the region after the boundary as a standalone circuit
/// and may replace it wholesale. The replacement is written on the renamed
/// units; nodes it uses that have no wire yet become ancillas. The renaming
/// is returned as the relabelling for the caller to merge into its maps.
#[derive(Clone)]
pub struct RoutingMethodCircuit {
    route: Arc<CircuitRoutingFn>,
    max_size: usize,
    max_depth: usize,
}

impl RoutingMethodCircuit {
    /// Wrap `route`, handing it at most `max_size` operations from at most
    /// `max_depth` cuts.
    pub fn new<F>(route: F, max_size: usize, max_depth: usize) -> Self
    where
        F: Fn(&CircuitDag, &Architecture) -> CircuitRouting + Send + Sync + 'static,
    {
        Self {
            route: Arc::new(route),
            max_size,
            max_depth,
        }
    }

    /// Maximum number of operations handed to the function.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Maximum number of cuts handed to the function.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl fmt::Debug for RoutingMethodCircuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingMethodCircuit")
            .field("max_size", &self.max_size)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

impl RoutingMethod for RoutingMethodCircuit {
    fn name(&self) -> &'static str {
        "RoutingMethod"
    }

    fn check_method(&self, frontier: &MappingFrontier<'_>, _architecture: &Architecture) -> bool {
        frontier
            .get_frontier_subcircuit(self.max_depth, self.max_size)
            .is_ok()
    }

    fn routing_method(
        &self,
        frontier: &mut MappingFrontier<'_>,
        architecture: &Architecture,
    ) -> RoutingResult<(bool, Relabelling)> {
        let region = frontier.get_frontier_subcircuit(self.max_depth, self.max_size)?;
        let (accepted, replacement, initial, final_perm) = (self.route)(&region.circuit, architecture);
        if !accepted {
            return Ok((false, Relabelling::new()));
        }
        debug!(
            "replacing {} operations with {}",
            region.nodes.len(),
            replacement.num_ops()
        );
        let relabelling =
            frontier.substitute_subcircuit(&region, &replacement, &initial, &final_perm)?;
        Ok((true, relabelling))
    }

    fn descriptor(&self) -> RoutingMethodDescriptor {
        RoutingMethodDescriptor::RoutingMethod
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arvak_ir::{Instruction, Node, QubitId, StandardGate};

    use crate::unit_maps::UnitMaps;

    fn n(i: u32) -> UnitId {
        Node(i).into()
    }

    /// Places q0, q1 on n0, n2 and routes cx(n0, n2) by swapping n1 and n2
    /// first.
    fn swap_then_cx(region: &CircuitDag, _arch: &Architecture) -> CircuitRouting {
        let initial = BTreeMap::from([(QubitId(0).into(), n(0)), (QubitId(1).into(), n(2))]);
        if region.num_ops() != 1 {
            return (false, CircuitDag::new(), initial, BTreeMap::new());
        }
        let mut replacement = CircuitDag::new();
        for i in 0..3 {
            replacement.add_node(Node(i));
        }
        replacement
            .apply(Instruction::two_qubit_gate(StandardGate::Swap, Node(1), Node(2)))
            .unwrap();
        replacement
            .apply(Instruction::two_qubit_gate(StandardGate::CX, Node(0), Node(1)))
            .unwrap();
        let final_perm = BTreeMap::from([(n(1), n(2)), (n(2), n(1))]);
        (true, replacement, initial, final_perm)
    }

    #[test]
    fn test_function_replaces_region() {
        let arch = Architecture::linear(3);
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));
        dag.apply(Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1)))
            .unwrap();

        let mut maps = UnitMaps::new();
        let mut frontier = MappingFrontier::new(&mut dag, &mut maps);
        let method = RoutingMethodCircuit::new(swap_then_cx, 10, 10);
        assert!(method.check_method(&frontier, &arch));

        let (modified, relabel) = method.routing_method(&mut frontier, &arch).unwrap();
        assert!(modified);
        assert_eq!(
            relabel,
            BTreeMap::from([(QubitId(0).into(), n(0)), (QubitId(1).into(), n(2))])
        );
        assert!(frontier.ancilla_nodes().contains(&Node(2)));

        frontier.update_bimaps(&relabel);
        assert_eq!(frontier.maps().initial().get(QubitId(1).into()), Some(n(2)));
        assert_eq!(frontier.maps().final_map().get(QubitId(1).into()), Some(n(1)));

        frontier.advance_frontier_boundary(&arch);
        assert!(frontier.is_finished());
        assert_eq!(dag.num_ops(), 2);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_declined_region_is_untouched() {
        let arch = Architecture::linear(3);
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));
        dag.apply(Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1)))
            .unwrap();
        dag.apply(Instruction::two_qubit_gate(StandardGate::CX, QubitId(1), QubitId(0)))
            .unwrap();

        let mut maps = UnitMaps::new();
        let mut frontier = MappingFrontier::new(&mut dag, &mut maps);
        let method = RoutingMethodCircuit::new(swap_then_cx, 10, 10);
        let (modified, _) = method.routing_method(&mut frontier, &arch).unwrap();
        assert!(!modified);
        assert_eq!(dag.num_ops(), 2);
        assert_eq!(method.descriptor(), RoutingMethodDescriptor::RoutingMethod);
    }
}
