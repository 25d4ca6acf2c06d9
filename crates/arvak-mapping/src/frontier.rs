//! The boundary between the routed prefix and the unrouted suffix of a
//! circuit.
//!
//! A [`MappingFrontier`] borrows the circuit and the caller's [`UnitMaps`] for
//! a routing session. Every wire has a position in the linear boundary: the
//! last vertex on that wire known to satisfy the architecture. Routing
//! methods mutate the circuit only through the frontier, which keeps the
//! boundary, the maps and the set of ancilla nodes consistent.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use arvak_ir::{
    Boundary, CircuitDag, Instruction, InstructionKind, Node, NodeIndex, StandardGate, UnitId,
};

use crate::architecture::Architecture;
use crate::error::{RoutingError, RoutingResult};
use crate::unit_maps::UnitMaps;

/// A pair of units that a two-qubit operation wants adjacent.
pub type Interaction = (UnitId, UnitId);

/// A region of the circuit right after the boundary, copied out.
#[derive(Debug, Clone)]
pub struct FrontierSubcircuit {
    /// Vertices of the region in the original circuit, in causal order.
    pub nodes: Vec<NodeIndex>,
    /// The region as a standalone circuit on the same units.
    pub circuit: CircuitDag,
}

/// Mutable routing state over a borrowed circuit.
#[derive(Debug)]
pub struct MappingFrontier<'a> {
    circuit: &'a mut CircuitDag,
    maps: &'a mut UnitMaps,
    linear_boundary: Boundary,
    ancilla_nodes: BTreeSet<Node>,
}

impl<'a> MappingFrontier<'a> {
    /// Start a session with the boundary at the circuit's inputs.
    ///
    /// Quantum wires missing from `maps` are added to both maps as
    /// identities.
    pub fn new(circuit: &'a mut CircuitDag, maps: &'a mut UnitMaps) -> Self {
        for unit in circuit.qubits().collect::<Vec<_>>() {
            if !maps.final_map().contains_right(unit) {
                maps.add_identity(unit);
            }
        }
        let linear_boundary = circuit
            .units()
            .filter_map(|u| circuit.input_node(u).map(|n| (u, n)))
            .collect();
        Self {
            circuit,
            maps,
            linear_boundary,
            ancilla_nodes: BTreeSet::new(),
        }
    }

    /// Start a session with caller-supplied maps, which must already label
    /// every quantum wire of the circuit in both maps.
    pub fn with_maps(circuit: &'a mut CircuitDag, maps: &'a mut UnitMaps) -> RoutingResult<Self> {
        for unit in circuit.qubits() {
            if !maps.initial().contains_right(unit) || !maps.final_map().contains_right(unit) {
                return Err(RoutingError::InvalidMaps(format!(
                    "circuit wire {unit} is not a value of both the initial and final maps"
                )));
            }
        }
        Ok(Self::new(circuit, maps))
    }

    /// The circuit being routed.
    pub fn circuit(&self) -> &CircuitDag {
        self.circuit
    }

    /// Mutable access to the circuit.
    ///
    /// Edits must leave every boundary vertex in place; prefer the frontier's
    /// own mutators.
    pub fn circuit_mut(&mut self) -> &mut CircuitDag {
        self.circuit
    }

    /// The unit maps being updated.
    pub fn maps(&self) -> &UnitMaps {
        self.maps
    }

    /// Nodes that currently host an ancilla rather than a logical qubit.
    pub fn ancilla_nodes(&self) -> &BTreeSet<Node> {
        &self.ancilla_nodes
    }

    /// The current boundary.
    pub fn linear_boundary(&self) -> &Boundary {
        &self.linear_boundary
    }

    /// Restore a boundary obtained from [`linear_boundary`](Self::linear_boundary).
    pub fn set_linear_boundary(&mut self, boundary: Boundary) {
        self.linear_boundary = boundary;
    }

    /// The first unprocessed vertex on `unit`'s wire.
    pub fn boundary_successor(&self, unit: UnitId) -> Option<NodeIndex> {
        let pos = *self.linear_boundary.get(&unit)?;
        self.circuit.wire_successor(pos, unit)
    }

    /// Check that every quantum wire of `node` sits at the boundary.
    ///
    /// Classical wires are ignored: a conditional gate can be routed before
    /// the bits it reads are settled.
    pub fn is_quantum_ready(&self, node: NodeIndex) -> bool {
        let Some(inst) = self.circuit.get_instruction(node) else {
            return false;
        };
        inst.qubits.iter().all(|&u| {
            self.linear_boundary
                .get(&u)
                .is_some_and(|&b| self.circuit.wire_predecessor(node, u) == Some(b))
        })
    }

    /// Operations whose quantum wires all sit at the boundary, without
    /// duplicates, in unit order of their first wire.
    pub fn boundary_operations(&self) -> Vec<NodeIndex> {
        let mut seen = FxHashSet::default();
        let mut ops = vec![];
        for &unit in self.linear_boundary.keys().filter(|u| u.is_quantum()) {
            if let Some(next) = self.boundary_successor(unit) {
                if seen.insert(next) && self.is_quantum_ready(next) {
                    ops.push(next);
                }
            }
        }
        ops
    }

    /// Check if a placed unit is on the architecture.
    pub fn is_placed(unit: UnitId, architecture: &Architecture) -> bool {
        unit.as_node().is_some_and(|n| architecture.node_exists(n))
    }

    /// Check whether `inst` may run at the boundary as it stands.
    ///
    /// Single-qubit, classical and barrier operations are always valid.
    /// Two-qubit operations need placed qubits on an edge; on a directed
    /// architecture the edge must point from the first to the second qubit
    /// unless the gate is symmetric. A three-qubit operation is only valid
    /// as a BRIDGE along two edges of an undirected architecture. Boxes are
    /// never valid: they must be decomposed or resynthesised first.
    pub fn valid_boundary_operation(architecture: &Architecture, inst: &Instruction) -> bool {
        match &inst.kind {
            InstructionKind::CircBox(_) | InstructionKind::PhasePolyBox(_) => return false,
            InstructionKind::Barrier => return true,
            _ => {}
        }
        let nodes: Option<Vec<Node>> = inst.qubits.iter().map(UnitId::as_node).collect();
        match inst.qubits.len() {
            0 | 1 => true,
            2 => {
                let Some(nodes) = nodes else {
                    return false;
                };
                let (a, b) = (nodes[0], nodes[1]);
                if architecture.get_distance(a, b) != Some(1) {
                    return false;
                }
                let symmetric = inst.as_gate().is_some_and(|g| g.is_symmetric());
                architecture.edge_exists(a, b) || (symmetric && architecture.edge_exists(b, a))
            }
            3 => {
                let Some(nodes) = nodes else {
                    return false;
                };
                inst.is_standard(&StandardGate::Bridge)
                    && !architecture.is_directed()
                    && architecture.get_distance(nodes[0], nodes[1]) == Some(1)
                    && architecture.get_distance(nodes[1], nodes[2]) == Some(1)
            }
            _ => false,
        }
    }

    /// Move the boundary across every operation that already satisfies the
    /// architecture, one cut at a time.
    pub fn advance_frontier_boundary(&mut self, architecture: &Architecture) {
        loop {
            let cut = self.circuit.next_cut(&self.linear_boundary);
            let mut advanced = false;
            for node in cut.slice {
                let Some(inst) = self.circuit.get_instruction(node) else {
                    continue;
                };
                if Self::valid_boundary_operation(architecture, inst) {
                    for wire in inst.wires() {
                        self.linear_boundary.insert(wire, node);
                    }
                    advanced = true;
                }
            }
            if !advanced {
                break;
            }
        }
    }

    /// Check if the boundary has reached the end of every wire.
    pub fn is_finished(&self) -> bool {
        self.linear_boundary.iter().all(|(&unit, &pos)| {
            self.circuit
                .wire_successor(pos, unit)
                .is_none_or(|next| self.circuit.node(next).is_some_and(|n| n.is_output()))
        })
    }

    /// Layers of two-qubit interactions ahead of the boundary.
    ///
    /// Layer 0 holds the two-qubit operations ready at the boundary. Each
    /// following layer is found by hypothetically passing the previous one
    /// plus any single-qubit operations and barriers that become ready.
    /// Boxes and larger operations stop their wires. At most `max_layers`
    /// layers are returned.
    pub fn interaction_layers(&self, max_layers: usize) -> Vec<Vec<Interaction>> {
        let mut scratch: Boundary = self
            .linear_boundary
            .iter()
            .filter(|(u, _)| u.is_quantum())
            .map(|(&u, &n)| (u, n))
            .collect();
        let mut layers = vec![];

        while layers.len() < max_layers {
            loop {
                let passable: Vec<NodeIndex> = self
                    .scratch_ready(&scratch)
                    .into_iter()
                    .filter(|&n| {
                        self.circuit
                            .get_instruction(n)
                            .is_some_and(|i| i.is_barrier() || (i.num_qubits() <= 1 && !i.is_box()))
                    })
                    .collect();
                if passable.is_empty() {
                    break;
                }
                self.pass_scratch(&mut scratch, &passable);
            }

            let two_qubit: Vec<NodeIndex> = self
                .scratch_ready(&scratch)
                .into_iter()
                .filter(|&n| {
                    self.circuit
                        .get_instruction(n)
                        .is_some_and(|i| i.num_qubits() == 2 && !i.is_box() && !i.is_barrier())
                })
                .collect();
            if two_qubit.is_empty() {
                break;
            }
            let layer = two_qubit
                .iter()
                .filter_map(|&n| self.circuit.get_instruction(n))
                .map(|i| (i.qubits[0], i.qubits[1]))
                .collect();
            layers.push(layer);
            self.pass_scratch(&mut scratch, &two_qubit);
        }
        trace!("computed {} interaction layers", layers.len());
        layers
    }

    fn scratch_ready(&self, scratch: &Boundary) -> Vec<NodeIndex> {
        let mut seen = FxHashSet::default();
        let mut ready = vec![];
        for (&unit, &pos) in scratch {
            let Some(next) = self.circuit.wire_successor(pos, unit) else {
                continue;
            };
            if !seen.insert(next) {
                continue;
            }
            let Some(inst) = self.circuit.get_instruction(next) else {
                continue;
            };
            let all_ready = inst.qubits.iter().all(|&u| {
                scratch
                    .get(&u)
                    .is_some_and(|&b| self.circuit.wire_predecessor(next, u) == Some(b))
            });
            if all_ready {
                ready.push(next);
            }
        }
        ready
    }

    fn pass_scratch(&self, scratch: &mut Boundary, nodes: &[NodeIndex]) {
        for &node in nodes {
            if let Some(inst) = self.circuit.get_instruction(node) {
                for &q in &inst.qubits {
                    scratch.insert(q, node);
                }
            }
        }
    }

    /// Insert a SWAP on two nodes at the boundary.
    ///
    /// Everything after the boundary on one wire moves to the other, the
    /// final map is transposed, and an ancilla mark follows its data.
    /// Returns false, without touching anything, if either node is not at
    /// the boundary or if the SWAP would undo the SWAP right before it.
    pub fn add_swap(&mut self, a: Node, b: Node) -> RoutingResult<bool> {
        let (ua, ub) = (UnitId::Node(a), UnitId::Node(b));
        let (Some(&pa), Some(&pb)) = (self.linear_boundary.get(&ua), self.linear_boundary.get(&ub))
        else {
            return Ok(false);
        };
        if a == b {
            return Ok(false);
        }
        if pa == pb
            && self
                .circuit
                .get_instruction(pa)
                .is_some_and(|i| i.is_standard(&StandardGate::Swap))
        {
            return Ok(false);
        }

        let swap = self
            .circuit
            .insert_after(Instruction::two_qubit_gate(StandardGate::Swap, a, b), &[pa, pb])?;
        let fronts = Boundary::from([(ua, swap), (ub, swap)]);
        let perm = BTreeMap::from([(ua, ub), (ub, ua)]);
        self.circuit.permute_wires_after(&fronts, &perm)?;

        let a_ancilla = self.ancilla_nodes.contains(&a);
        let b_ancilla = self.ancilla_nodes.contains(&b);
        if a_ancilla != b_ancilla {
            let (from, to) = if a_ancilla { (a, b) } else { (b, a) };
            self.ancilla_nodes.remove(&from);
            self.ancilla_nodes.insert(to);
        }

        self.maps.transpose_final(ua, ub);
        self.linear_boundary.insert(ua, swap);
        self.linear_boundary.insert(ub, swap);
        debug!("inserted swap({a}, {b})");
        Ok(true)
    }

    /// Replace the CX at the boundary between `control` and `target` with a
    /// BRIDGE through `central`, keeping its condition.
    ///
    /// # Panics
    ///
    /// Panics if `control` and `target` do not share a ready CX or if
    /// `central` is not at the boundary.
    pub fn add_bridge(&mut self, control: Node, central: Node, target: Node) -> RoutingResult<()> {
        let (uc, um, ut) = (
            UnitId::Node(control),
            UnitId::Node(central),
            UnitId::Node(target),
        );
        let cx = self.boundary_successor(uc);
        let cx = match cx {
            Some(cx)
                if self.is_quantum_ready(cx)
                    && self.circuit.get_instruction(cx).is_some_and(|i| {
                        i.is_standard(&StandardGate::CX) && i.qubits == [uc, ut]
                    }) =>
            {
                cx
            }
            _ => panic!("no ready cx({control}, {target}) at the boundary"),
        };
        assert!(
            self.linear_boundary.contains_key(&um),
            "bridge centre {central} is not at the boundary"
        );

        let condition = self
            .circuit
            .get_instruction(cx)
            .and_then(|i| i.condition.clone());
        let mut preds = vec![
            self.linear_boundary[&uc],
            self.linear_boundary[&um],
            self.linear_boundary[&ut],
        ];
        if let Some(cond) = &condition {
            for &bit in &cond.bits {
                let pred = self
                    .circuit
                    .wire_predecessor(cx, UnitId::Bit(bit))
                    .ok_or(RoutingError::UnknownNode(UnitId::Bit(bit)))?;
                preds.push(pred);
            }
        }

        self.circuit.remove_op(cx)?;
        let mut bridge = Instruction::gate(StandardGate::Bridge, [control, central, target]);
        bridge.condition = condition;
        self.circuit.insert_after(bridge, &preds)?;
        debug!("inserted bridge({control}, {central}, {target})");
        Ok(())
    }

    /// Bring a free node into the circuit as an ancilla wire.
    ///
    /// # Panics
    ///
    /// Panics if the node already has a wire.
    pub fn add_ancilla(&mut self, node: Node) {
        let unit = UnitId::Node(node);
        assert!(
            self.circuit.add_unit(unit),
            "node {node} already has a wire in the circuit"
        );
        if let Some(input) = self.circuit.input_node(unit) {
            self.linear_boundary.insert(unit, input);
        }
        self.ancilla_nodes.insert(node);
        self.maps.add_identity(unit);
        trace!("added ancilla {node}");
    }

    /// Give the ancilla on `ancilla` to the unplaced qubit `merge`.
    ///
    /// The qubit's operations are spliced after the ancilla's history, its
    /// wire takes the node's name, and the ancilla bookkeeping is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `ancilla` is not an ancilla node or `merge` has no wire.
    pub fn merge_ancilla(&mut self, merge: UnitId, ancilla: Node) -> RoutingResult<()> {
        assert!(
            self.ancilla_nodes.contains(&ancilla),
            "{ancilla} is not an ancilla node"
        );
        let anc = UnitId::Node(ancilla);
        let merge_in = self.circuit.input_node(merge);
        assert!(merge_in.is_some(), "{merge} has no wire in the circuit");
        let merge_pos = self.linear_boundary[&merge];
        let anc_pos = self.linear_boundary[&anc];

        self.circuit.merge_wire_into(anc, merge)?;

        self.ancilla_nodes.remove(&ancilla);
        self.linear_boundary.remove(&anc);
        self.linear_boundary.remove(&merge);
        let pos = if Some(merge_pos) == merge_in {
            anc_pos
        } else {
            merge_pos
        };
        self.linear_boundary.insert(anc, pos);
        self.maps.merge_ancilla(merge, anc);
        debug!("merged {merge} into ancilla {ancilla}");
        Ok(())
    }

    /// Rename wires in the circuit and in the boundary.
    ///
    /// Returns the renamings that took effect, leaving out identities and
    /// units without a wire.
    pub fn update_linear_boundary_uids(
        &mut self,
        relabel: &BTreeMap<UnitId, UnitId>,
    ) -> RoutingResult<BTreeMap<UnitId, UnitId>> {
        let relabel: BTreeMap<UnitId, UnitId> = relabel
            .iter()
            .filter(|(from, to)| from != to && self.linear_boundary.contains_key(from))
            .map(|(&f, &t)| (f, t))
            .collect();
        if relabel.is_empty() {
            return Ok(relabel);
        }
        self.circuit.rename_units(&relabel)?;
        let moved: Vec<_> = relabel
            .iter()
            .filter_map(|(from, &to)| self.linear_boundary.get(from).map(|&pos| (to, pos)))
            .collect();
        for from in relabel.keys() {
            self.linear_boundary.remove(from);
        }
        self.linear_boundary.extend(moved);
        Ok(relabel)
    }

    /// Rename labels in both unit maps.
    pub fn update_bimaps(&mut self, relabel: &BTreeMap<UnitId, UnitId>) {
        self.maps.update_bimaps(relabel);
    }

    /// Rename wires everywhere: circuit, boundary and maps.
    pub fn rename_units(&mut self, relabel: &BTreeMap<UnitId, UnitId>) -> RoutingResult<()> {
        self.update_linear_boundary_uids(relabel)?;
        self.update_bimaps(relabel);
        Ok(())
    }

    /// The original unit whose data is on circuit wire `unit` now.
    pub fn get_qubit_from_circuit_uid(&self, unit: UnitId) -> Option<UnitId> {
        self.maps.final_map().get_left(unit)
    }

    /// Copy out up to `max_depth` cuts after the boundary, stopping before
    /// the region would exceed `max_size` operations.
    pub fn get_frontier_subcircuit(
        &self,
        max_depth: usize,
        max_size: usize,
    ) -> RoutingResult<FrontierSubcircuit> {
        let mut scratch = self.linear_boundary.clone();
        let mut nodes = vec![];
        for _ in 0..max_depth {
            let cut = self.circuit.next_cut(&scratch);
            if cut.slice.is_empty() || nodes.len() + cut.slice.len() > max_size {
                break;
            }
            nodes.extend(cut.slice);
            scratch = cut.frontier;
        }
        if nodes.is_empty() {
            return Err(RoutingError::NoApplicableMethod(
                "frontier subcircuit is empty".into(),
            ));
        }

        let mut circuit = CircuitDag::new();
        for &node in &nodes {
            if let Some(inst) = self.circuit.get_instruction(node) {
                for wire in inst.wires() {
                    circuit.add_unit(wire);
                }
            }
        }
        for &node in &nodes {
            if let Some(inst) = self.circuit.get_instruction(node) {
                circuit.apply(inst.clone())?;
            }
        }
        Ok(FrontierSubcircuit { nodes, circuit })
    }

    /// Replace a region obtained from
    /// [`get_frontier_subcircuit`](Self::get_frontier_subcircuit).
    ///
    /// `initial` renames circuit wires before the replacement (placing
    /// qubits); `replacement` is written on the renamed units; `final_perm`
    /// says on which wire the data of each renamed unit leaves the
    /// replacement and is applied to everything after it. Nodes used by the
    /// replacement that have no wire yet become ancillas.
    ///
    /// The unit maps are not renamed. The renamings that took effect are
    /// returned and must be folded into the maps with
    /// [`update_bimaps`](Self::update_bimaps).
    pub fn substitute_subcircuit(
        &mut self,
        region: &FrontierSubcircuit,
        replacement: &CircuitDag,
        initial: &BTreeMap<UnitId, UnitId>,
        final_perm: &BTreeMap<UnitId, UnitId>,
    ) -> RoutingResult<BTreeMap<UnitId, UnitId>> {
        let renamed = self.update_linear_boundary_uids(initial)?;
        let unrenamed: BTreeMap<UnitId, UnitId> =
            renamed.iter().map(|(&from, &to)| (to, from)).collect();

        for node in replacement.qubits().filter_map(|u| u.as_node()) {
            if !self.circuit.contains_unit(UnitId::Node(node)) {
                self.add_ancilla(node);
            }
        }

        for &node in &region.nodes {
            self.circuit.remove_op(node)?;
        }
        let mut fronts = self.linear_boundary.clone();
        for (_, inst) in replacement.topological_ops() {
            self.circuit.insert_at_fronts(&mut fronts, inst.clone())?;
        }

        let perm: BTreeMap<UnitId, UnitId> = final_perm
            .iter()
            .filter(|(from, to)| from != to)
            .map(|(&f, &t)| (f, t))
            .collect();
        if !perm.is_empty() {
            self.circuit.permute_wires_after(&fronts, &perm)?;
            // The maps still hold the labels from before the renaming.
            let map_perm: BTreeMap<UnitId, UnitId> = perm
                .iter()
                .map(|(from, &to)| (unrenamed.get(from).copied().unwrap_or(*from), to))
                .collect();
            self.maps.permute_final(&map_perm);
            self.ancilla_nodes = self
                .ancilla_nodes
                .iter()
                .map(|&n| {
                    perm.get(&UnitId::Node(n))
                        .and_then(UnitId::as_node)
                        .unwrap_or(n)
                })
                .collect();
        }
        Ok(renamed)
    }

    /// Replace an operation sitting at the boundary on all of its wires with
    /// instructions that may also act on other wires of the boundary.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not ready on every wire.
    pub fn substitute_at_boundary(
        &mut self,
        node: NodeIndex,
        replacement: Vec<Instruction>,
    ) -> RoutingResult<Vec<NodeIndex>> {
        let ready = self.circuit.get_instruction(node).is_some_and(|inst| {
            inst.wires().all(|w| {
                self.linear_boundary
                    .get(&w)
                    .is_some_and(|&b| self.circuit.wire_predecessor(node, w) == Some(b))
            })
        });
        assert!(ready, "operation {node:?} is not at the boundary");

        self.circuit.remove_op(node)?;
        let mut fronts = self.linear_boundary.clone();
        let mut nodes = Vec::with_capacity(replacement.len());
        for inst in replacement {
            nodes.push(self.circuit.insert_at_fronts(&mut fronts, inst)?);
        }
        Ok(nodes)
    }

    /// Replace a single operation right after the boundary.
    pub fn substitute_operation(
        &mut self,
        node: NodeIndex,
        replacement: Vec<Instruction>,
    ) -> RoutingResult<Vec<NodeIndex>> {
        Ok(self.circuit.substitute_op(node, replacement)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arvak_ir::{Circuit, ClbitId, ClassicalCondition, QubitId};

    fn n(i: u32) -> UnitId {
        Node(i).into()
    }

    /// Circuit already placed on nodes `0..width`.
    fn placed(width: u32, build: impl FnOnce(&mut CircuitDag)) -> CircuitDag {
        let mut dag = CircuitDag::new();
        for i in 0..width {
            dag.add_node(Node(i));
        }
        build(&mut dag);
        dag
    }

    fn cx(a: u32, b: u32) -> Instruction {
        Instruction::two_qubit_gate(StandardGate::CX, Node(a), Node(b))
    }

    #[test]
    fn test_advance_stops_at_invalid_gate() {
        let arch = Architecture::linear(4);
        let mut dag = placed(4, |d| {
            d.apply(cx(0, 1)).unwrap();
            d.apply(cx(1, 3)).unwrap();
            d.apply(cx(2, 3)).unwrap();
        });
        let mut maps = UnitMaps::new();
        let mut frontier = MappingFrontier::new(&mut dag, &mut maps);
        frontier.advance_frontier_boundary(&arch);

        let ops = frontier.boundary_operations();
        assert_eq!(ops.len(), 1);
        let inst = frontier.circuit().get_instruction(ops[0]).unwrap();
        assert_eq!(inst.qubits, vec![n(1), n(3)]);
        assert!(!frontier.is_finished());
    }

    #[test]
    fn test_advance_is_idempotent() {
        let arch = Architecture::linear(3);
        let mut dag = placed(3, |d| {
            d.apply(cx(0, 2)).unwrap();
        });
        let mut maps = UnitMaps::new();
        let mut frontier = MappingFrontier::new(&mut dag, &mut maps);
        frontier.advance_frontier_boundary(&arch);
        let first = frontier.linear_boundary().clone();
        frontier.advance_frontier_boundary(&arch);
        assert_eq!(&first, frontier.linear_boundary());
    }

    #[test]
    fn test_valid_boundary_operation_rules() {
        let arch = Architecture::linear(3);
        let directed = Architecture::directed([(0, 1), (1, 2)]);

        assert!(MappingFrontier::valid_boundary_operation(&arch, &cx(1, 0)));
        assert!(!MappingFrontier::valid_boundary_operation(&arch, &cx(0, 2)));
        assert!(!MappingFrontier::valid_boundary_operation(&directed, &cx(1, 0)));
        assert!(MappingFrontier::valid_boundary_operation(
            &directed,
            &Instruction::two_qubit_gate(StandardGate::CZ, Node(1), Node(0))
        ));

        let bridge = Instruction::gate(StandardGate::Bridge, [Node(0), Node(1), Node(2)]);
        assert!(MappingFrontier::valid_boundary_operation(&arch, &bridge));
        assert!(!MappingFrontier::valid_boundary_operation(&directed, &bridge));

        let unplaced = Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1));
        assert!(!MappingFrontier::valid_boundary_operation(&arch, &unplaced));
        let single = Instruction::single_qubit_gate(StandardGate::H, QubitId(0));
        assert!(MappingFrontier::valid_boundary_operation(&arch, &single));
    }

    #[test]
    fn test_add_swap_moves_suffix_and_final_map() {
        let arch = Architecture::linear(3);
        let mut dag = placed(3, |d| {
            d.apply(cx(0, 2)).unwrap();
        });
        let mut maps = UnitMaps::new();
        let mut frontier = MappingFrontier::new(&mut dag, &mut maps);
        frontier.advance_frontier_boundary(&arch);

        assert!(frontier.add_swap(Node(1), Node(2)).unwrap());
        frontier.advance_frontier_boundary(&arch);
        assert!(frontier.is_finished());
        assert_eq!(frontier.maps().final_map().get(n(2)), Some(n(1)));
        assert_eq!(frontier.maps().initial().get(n(2)), Some(n(2)));

        let cmds: Vec<_> = dag
            .topological_ops()
            .map(|(_, i)| (i.name().to_string(), i.qubits.clone()))
            .collect();
        assert_eq!(
            cmds,
            vec![
                ("swap".to_string(), vec![n(1), n(2)]),
                ("cx".to_string(), vec![n(0), n(1)]),
            ]
        );
    }

    #[test]
    fn test_add_swap_rejects_repeat_and_missing() {
        let arch = Architecture::linear(4);
        let mut dag = placed(3, |d| {
            d.apply(cx(0, 2)).unwrap();
        });
        let mut maps = UnitMaps::new();
        let mut frontier = MappingFrontier::new(&mut dag, &mut maps);
        frontier.advance_frontier_boundary(&arch);

        assert!(!frontier.add_swap(Node(2), Node(3)).unwrap());
        assert!(frontier.add_swap(Node(1), Node(2)).unwrap());
        assert!(!frontier.add_swap(Node(2), Node(1)).unwrap());
    }

    #[test]
    fn test_add_bridge_keeps_condition() {
        let arch = Architecture::linear(3);
        let mut dag = placed(3, |d| {
            d.add_clbit(ClbitId(0));
            d.apply(cx(0, 2).with_condition(ClassicalCondition::new([ClbitId(0)], 1)))
                .unwrap();
        });
        let mut maps = UnitMaps::new();
        let mut frontier = MappingFrontier::new(&mut dag, &mut maps);
        frontier.advance_frontier_boundary(&arch);
        frontier.add_bridge(Node(0), Node(1), Node(2)).unwrap();
        frontier.advance_frontier_boundary(&arch);
        assert!(frontier.is_finished());

        let (_, bridge) = dag.topological_ops().next().unwrap();
        assert!(bridge.is_standard(&StandardGate::Bridge));
        assert_eq!(bridge.qubits, vec![n(0), n(1), n(2)]);
        assert!(bridge.condition.is_some());
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_ancilla_follows_swap_and_merges() {
        let arch = Architecture::linear(3);
        let mut dag = placed(2, |d| {
            d.add_qubit(QubitId(9));
            d.apply(Instruction::single_qubit_gate(StandardGate::X, QubitId(9)))
                .unwrap();
        });
        let mut maps = UnitMaps::new();
        let mut frontier = MappingFrontier::new(&mut dag, &mut maps);
        frontier.advance_frontier_boundary(&arch);

        frontier.add_ancilla(Node(2));
        assert!(frontier.add_swap(Node(1), Node(2)).unwrap());
        assert!(frontier.ancilla_nodes().contains(&Node(1)));

        frontier
            .merge_ancilla(UnitId::Qubit(QubitId(9)), Node(1))
            .unwrap();
        assert!(frontier.ancilla_nodes().is_empty());
        assert_eq!(
            frontier.maps().initial().get(UnitId::Qubit(QubitId(9))),
            Some(n(2))
        );
        assert_eq!(
            frontier.maps().final_map().get(UnitId::Qubit(QubitId(9))),
            Some(n(1))
        );
        frontier.advance_frontier_boundary(&arch);
        assert!(frontier.is_finished());
        dag.verify_integrity().unwrap();
        assert_eq!(dag.num_qubits(), 3);
    }

    #[test]
    fn test_with_maps_rejects_uncovered_circuit() {
        let mut dag = Circuit::with_size("c", 2, 0).into_dag();
        let mut maps = UnitMaps::identity([UnitId::Qubit(QubitId(0))]);
        let result = MappingFrontier::with_maps(&mut dag, &mut maps);
        assert!(matches!(result, Err(RoutingError::InvalidMaps(_))));
    }

    #[test]
    fn test_rename_units_places_qubit() {
        let mut circuit = Circuit::with_size("c", 2, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let mut dag = circuit.into_dag();
        let mut maps = UnitMaps::new();
        let mut frontier = MappingFrontier::new(&mut dag, &mut maps);

        let relabel = BTreeMap::from([
            (UnitId::Qubit(QubitId(0)), n(4)),
            (UnitId::Qubit(QubitId(1)), n(5)),
        ]);
        frontier.rename_units(&relabel).unwrap();
        assert!(frontier.linear_boundary().contains_key(&n(4)));
        assert_eq!(
            frontier.get_qubit_from_circuit_uid(n(5)),
            Some(UnitId::Qubit(QubitId(1)))
        );
    }

    #[test]
    fn test_interaction_layers_skip_single_qubit_gates() {
        let arch = Architecture::linear(4);
        let mut dag = placed(4, |d| {
            d.apply(cx(0, 2)).unwrap();
            d.apply(Instruction::single_qubit_gate(StandardGate::H, Node(2)))
                .unwrap();
            d.apply(cx(2, 3)).unwrap();
            d.apply(cx(1, 3)).unwrap();
        });
        let mut maps = UnitMaps::new();
        let mut frontier = MappingFrontier::new(&mut dag, &mut maps);
        frontier.advance_frontier_boundary(&arch);

        let layers = frontier.interaction_layers(5);
        assert_eq!(
            layers,
            vec![vec![(n(0), n(2))], vec![(n(2), n(3))], vec![(n(1), n(3))]]
        );
        assert_eq!(frontier.interaction_layers(1).len(), 1);
    }

    #[test]
    fn test_frontier_subcircuit_bounds() {
        let mut dag = placed(3, |d| {
            d.apply(cx(0, 2)).unwrap();
            d.apply(cx(1, 2)).unwrap();
            d.apply(cx(0, 1)).unwrap();
        });
        let mut maps = UnitMaps::new();
        let frontier = MappingFrontier::new(&mut dag, &mut maps);

        let sub = frontier.get_frontier_subcircuit(2, 10).unwrap();
        assert_eq!(sub.nodes.len(), 2);
        assert_eq!(sub.circuit.num_ops(), 2);

        let sub = frontier.get_frontier_subcircuit(5, 1).unwrap();
        assert_eq!(sub.nodes.len(), 1);
        assert!(frontier.get_frontier_subcircuit(0, 10).is_err());
    }
}
