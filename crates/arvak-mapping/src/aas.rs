//! Architecture-aware synthesis of phase polynomial boxes.
//!
//! Instead of routing the gates of a [`PhasePolyBox`](arvak_ir::PhasePolyBox)
//! with SWAPs, the box is rebuilt on the device: every CX between distant
//! nodes is replaced by a nearest-neighbour construction along a shortest
//! path, CXs against a directed edge are turned around with Hadamards, and
//! identical CX pairs that end up next to each other cancel.

use std::collections::BTreeMap;

use tracing::debug;

use arvak_ir::{Instruction, InstructionKind, Node, NodeIndex, StandardGate, UnitId};

use crate::architecture::Architecture;
use crate::error::{RoutingError, RoutingResult};
use crate::frontier::MappingFrontier;
use crate::routing_method::{CNotSynthType, Relabelling, RoutingMethod, RoutingMethodDescriptor};

fn boundary_phase_poly_boxes(frontier: &MappingFrontier<'_>) -> Vec<NodeIndex> {
    frontier
        .boundary_operations()
        .into_iter()
        .filter(|&op| {
            frontier.circuit().get_instruction(op).is_some_and(|i| {
                matches!(i.kind, InstructionKind::PhasePolyBox(_)) && i.condition.is_none()
            })
        })
        .collect()
}

fn all_placed(architecture: &Architecture, inst: &Instruction) -> bool {
    inst.qubits
        .iter()
        .all(|q| q.as_node().is_some_and(|n| architecture.node_exists(n)))
}

/// Places the unplaced qubits of phase polynomial boxes at the boundary on
/// the first free nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AASLabellingMethod;

impl RoutingMethod for AASLabellingMethod {
    fn name(&self) -> &'static str {
        "AASLabellingMethod"
    }

    fn check_method(&self, frontier: &MappingFrontier<'_>, architecture: &Architecture) -> bool {
        boundary_phase_poly_boxes(frontier).into_iter().any(|op| {
            frontier
                .circuit()
                .get_instruction(op)
                .is_some_and(|i| !all_placed(architecture, i))
        })
    }

    fn routing_method(
        &self,
        frontier: &mut MappingFrontier<'_>,
        architecture: &Architecture,
    ) -> RoutingResult<(bool, Relabelling)> {
        let mut unplaced = vec![];
        for op in boundary_phase_poly_boxes(frontier) {
            if let Some(inst) = frontier.circuit().get_instruction(op) {
                for &q in &inst.qubits {
                    let placed = q.as_node().is_some_and(|n| architecture.node_exists(n));
                    if !placed && !unplaced.contains(&q) {
                        unplaced.push(q);
                    }
                }
            }
        }

        for &unit in &unplaced {
            let free = architecture
                .nodes()
                .iter()
                .copied()
                .find(|&n| !frontier.circuit().contains_unit(UnitId::Node(n)))
                .ok_or_else(|| RoutingError::Unlabellable {
                    unit,
                    reason: "no free node for phase polynomial box".into(),
                })?;
            frontier.rename_units(&BTreeMap::from([(unit, UnitId::Node(free))]))?;
            debug!("labelled {unit} as {free}");
        }
        Ok((!unplaced.is_empty(), Relabelling::new()))
    }

    fn descriptor(&self) -> RoutingMethodDescriptor {
        RoutingMethodDescriptor::AasLabellingMethod
    }
}

/// Resynthesises fully placed phase polynomial boxes at the boundary for
/// the architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AASRouteRoutingMethod {
    lookahead: usize,
    synth: CNotSynthType,
}

impl AASRouteRoutingMethod {
    /// Create the method.
    ///
    /// `lookahead` is the number of following gates searched for a CX to
    /// cancel against; it must be positive.
    pub fn new(lookahead: usize, synth: CNotSynthType) -> RoutingResult<Self> {
        if lookahead == 0 {
            return Err(RoutingError::InvalidConfig(
                "AAS lookahead must be at least 1".into(),
            ));
        }
        Ok(Self { lookahead, synth })
    }
}

impl RoutingMethod for AASRouteRoutingMethod {
    fn name(&self) -> &'static str {
        "AASRouteRoutingMethod"
    }

    fn check_method(&self, frontier: &MappingFrontier<'_>, architecture: &Architecture) -> bool {
        boundary_phase_poly_boxes(frontier).into_iter().any(|op| {
            frontier
                .circuit()
                .get_instruction(op)
                .is_some_and(|i| all_placed(architecture, i))
        })
    }

    fn routing_method(
        &self,
        frontier: &mut MappingFrontier<'_>,
        architecture: &Architecture,
    ) -> RoutingResult<(bool, Relabelling)> {
        let mut modified = false;
        for op in boundary_phase_poly_boxes(frontier) {
            let Some(inst) = frontier.circuit().get_instruction(op) else {
                continue;
            };
            if !all_placed(architecture, inst) {
                continue;
            }
            let InstructionKind::PhasePolyBox(ppb) = &inst.kind else {
                continue;
            };
            let gates = ppb.decompose(&inst.qubits)?;
            let synthesised = synthesise(architecture, &gates, self.synth, self.lookahead)?;

            for q in synthesised.iter().flat_map(|i| i.qubits.iter()) {
                if let Some(node) = q.as_node() {
                    if !frontier.circuit().contains_unit(*q) {
                        frontier.add_ancilla(node);
                    }
                }
            }
            debug!(
                "synthesised phase polynomial box of {} gates into {}",
                gates.len(),
                synthesised.len()
            );
            frontier.substitute_at_boundary(op, synthesised)?;
            modified = true;
        }
        Ok((modified, Relabelling::new()))
    }

    fn descriptor(&self) -> RoutingMethodDescriptor {
        RoutingMethodDescriptor::AasRouteRoutingMethod {
            aaslookahead: self.lookahead,
            cnotsynthtype: self.synth,
        }
    }
}

/// Rebuild `gates` with nearest-neighbour CXs only.
pub fn synthesise(
    architecture: &Architecture,
    gates: &[Instruction],
    synth: CNotSynthType,
    lookahead: usize,
) -> RoutingResult<Vec<Instruction>> {
    let mut out = Vec::with_capacity(gates.len());
    for gate in gates {
        if gate.is_standard(&StandardGate::CX) {
            let control = node_of(gate.qubits[0])?;
            let target = node_of(gate.qubits[1])?;
            long_range_cx(architecture, control, target, synth, &mut out)?;
        } else {
            out.push(gate.clone());
        }
    }
    cancel_cx_pairs(&mut out, lookahead);
    Ok(out)
}

fn node_of(unit: UnitId) -> RoutingResult<Node> {
    unit.as_node().ok_or(RoutingError::UnknownNode(unit))
}

fn long_range_cx(
    architecture: &Architecture,
    control: Node,
    target: Node,
    synth: CNotSynthType,
    out: &mut Vec<Instruction>,
) -> RoutingResult<()> {
    let path = architecture
        .get_path(control, target)
        .ok_or(RoutingError::UnknownNode(UnitId::Node(target)))?;
    let k = path.len() - 1;
    if k <= 1 {
        adjacent_cx(architecture, control, target, out);
        return Ok(());
    }

    match synth {
        CNotSynthType::Swap => {
            for w in path[..k].windows(2) {
                out.push(Instruction::two_qubit_gate(StandardGate::Swap, w[0], w[1]));
            }
            adjacent_cx(architecture, path[k - 1], path[k], out);
            for w in path[..k].windows(2).rev() {
                out.push(Instruction::two_qubit_gate(StandardGate::Swap, w[0], w[1]));
            }
        }
        CNotSynthType::HamPath => {
            // Carry the parity of p0..p(k-1) onto the target, then that of
            // p1..p(k-1), restoring the path in between.
            for start in [0, 1] {
                let ladder = &path[start..k];
                for w in ladder.windows(2) {
                    adjacent_cx(architecture, w[0], w[1], out);
                }
                adjacent_cx(architecture, path[k - 1], path[k], out);
                for w in ladder.windows(2).rev() {
                    adjacent_cx(architecture, w[0], w[1], out);
                }
            }
        }
        CNotSynthType::Rec => recursive_cx(architecture, &path, out),
    }
    Ok(())
}

/// CX(a, c) = CX(a, b) CX(b, c) CX(a, b) CX(b, c), splitting at the middle
/// of the path.
fn recursive_cx(architecture: &Architecture, path: &[Node], out: &mut Vec<Instruction>) {
    if path.len() <= 2 {
        adjacent_cx(architecture, path[0], path[path.len() - 1], out);
        return;
    }
    let mid = path.len() / 2;
    for _ in 0..2 {
        recursive_cx(architecture, &path[..=mid], out);
        recursive_cx(architecture, &path[mid..], out);
    }
}

fn adjacent_cx(architecture: &Architecture, control: Node, target: Node, out: &mut Vec<Instruction>) {
    if architecture.is_directed() && !architecture.edge_exists(control, target) {
        let hadamards = [
            Instruction::single_qubit_gate(StandardGate::H, control),
            Instruction::single_qubit_gate(StandardGate::H, target),
        ];
        out.extend(hadamards.clone());
        out.push(Instruction::two_qubit_gate(StandardGate::CX, target, control));
        out.extend(hadamards);
    } else {
        out.push(Instruction::two_qubit_gate(StandardGate::CX, control, target));
    }
}

/// Cancel identical CX pairs with nothing on their qubits in between, when
/// the second is at most `window` gates after the first.
fn cancel_cx_pairs(gates: &mut Vec<Instruction>, window: usize) {
    let mut i = 0;
    while i < gates.len() {
        let mut partner = None;
        if gates[i].is_standard(&StandardGate::CX) {
            let end = gates.len().min(i + 1 + window);
            for j in i + 1..end {
                if gates[j].qubits.iter().any(|q| gates[i].qubits.contains(q)) {
                    if gates[j] == gates[i] {
                        partner = Some(j);
                    }
                    break;
                }
            }
        }
        match partner {
            Some(j) => {
                gates.remove(j);
                gates.remove(i);
                i = i.saturating_sub(window);
            }
            None => i += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arvak_ir::{CircuitDag, PhasePolyBox, QubitId};

    use crate::unit_maps::UnitMaps;

    /// Apply the CX/SWAP part of `gates` to a bit assignment.
    fn simulate(gates: &[Instruction], bits: &mut BTreeMap<UnitId, bool>) {
        for g in gates {
            let (a, b) = (g.qubits[0], g.qubits[1]);
            if g.is_standard(&StandardGate::CX) {
                let c = bits[&a];
                *bits.get_mut(&b).unwrap() ^= c;
            } else if g.is_standard(&StandardGate::Swap) {
                let (x, y) = (bits[&a], bits[&b]);
                bits.insert(a, y);
                bits.insert(b, x);
            }
        }
    }

    fn cx(a: u32, b: u32) -> Instruction {
        Instruction::two_qubit_gate(StandardGate::CX, Node(a), Node(b))
    }

    #[test]
    fn test_zero_lookahead_rejected() {
        let err = AASRouteRoutingMethod::new(0, CNotSynthType::Rec);
        assert!(matches!(err, Err(RoutingError::InvalidConfig(_))));
    }

    #[test]
    fn test_long_range_cx_is_exact() {
        let arch = Architecture::linear(5);
        for synth in [CNotSynthType::Swap, CNotSynthType::HamPath, CNotSynthType::Rec] {
            let out = synthesise(&arch, &[cx(0, 4)], synth, 1).unwrap();
            assert!(out.iter().all(|g| {
                let a = g.qubits[0].as_node().unwrap();
                let b = g.qubits[1].as_node().unwrap();
                arch.get_distance(a, b) == Some(1)
            }));

            for input in 0u32..32 {
                let unit = |i: u32| UnitId::Node(Node(i));
                let mut bits: BTreeMap<UnitId, bool> =
                    (0..5).map(|i| (unit(i), input >> i & 1 == 1)).collect();
                let mut expected = bits.clone();
                *expected.get_mut(&unit(4)).unwrap() ^= bits[&unit(0)];
                simulate(&out, &mut bits);
                assert_eq!(bits, expected, "{synth:?} on input {input:05b}");
            }
        }
    }

    #[test]
    fn test_reversed_edge_uses_hadamards() {
        let arch = Architecture::directed([(1, 0)]);
        let out = synthesise(&arch, &[cx(0, 1)], CNotSynthType::Rec, 1).unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(out[2].qubits, vec![UnitId::from(Node(1)), UnitId::from(Node(0))]);
        assert_eq!(
            out.iter().filter(|g| g.is_standard(&StandardGate::H)).count(),
            4
        );
    }

    #[test]
    fn test_adjacent_pairs_cancel() {
        let arch = Architecture::linear(2);
        let out = synthesise(&arch, &[cx(0, 1), cx(0, 1)], CNotSynthType::Rec, 1).unwrap();
        assert!(out.is_empty());

        let rz = Instruction::single_qubit_gate(StandardGate::Rz(0.5), Node(1));
        let out = synthesise(&arch, &[cx(0, 1), rz, cx(0, 1)], CNotSynthType::Rec, 4).unwrap();
        assert_eq!(out.len(), 3);
    }

    fn box_circuit(nodes: [UnitId; 2]) -> CircuitDag {
        let ppb = PhasePolyBox::new(
            2,
            vec![
                Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1)),
                Instruction::single_qubit_gate(StandardGate::Rz(0.25), QubitId(1)),
            ],
        )
        .unwrap();
        let mut dag = CircuitDag::new();
        for unit in nodes {
            dag.add_unit(unit);
        }
        dag.apply(Instruction::phase_poly_box(ppb, nodes)).unwrap();
        dag
    }

    #[test]
    fn test_route_box_adds_path_ancilla() {
        let arch = Architecture::linear(3);
        let mut dag = box_circuit([Node(0).into(), Node(2).into()]);
        let mut maps = UnitMaps::new();
        let mut frontier = MappingFrontier::new(&mut dag, &mut maps);
        frontier.advance_frontier_boundary(&arch);

        let method = AASRouteRoutingMethod::new(1, CNotSynthType::HamPath).unwrap();
        assert!(method.check_method(&frontier, &arch));
        let (modified, _) = method.routing_method(&mut frontier, &arch).unwrap();
        assert!(modified);
        assert!(frontier.ancilla_nodes().contains(&Node(1)));

        frontier.advance_frontier_boundary(&arch);
        assert!(frontier.is_finished());
        assert_eq!(dag.num_ops(), 5);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_labelling_places_box_qubits() {
        let arch = Architecture::linear(3);
        let mut dag = box_circuit([QubitId(0).into(), QubitId(1).into()]);
        let mut maps = UnitMaps::new();
        let mut frontier = MappingFrontier::new(&mut dag, &mut maps);

        assert!(AASLabellingMethod.check_method(&frontier, &arch));
        let route = AASRouteRoutingMethod::new(1, CNotSynthType::Rec).unwrap();
        assert!(!route.check_method(&frontier, &arch));

        let (modified, _) = AASLabellingMethod.routing_method(&mut frontier, &arch).unwrap();
        assert!(modified);
        assert_eq!(
            frontier.maps().initial().get(QubitId(1).into()),
            Some(Node(1).into())
        );
        assert!(route.check_method(&frontier, &arch));
    }
}
