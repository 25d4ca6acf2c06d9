//! Commutes already-satisfied multi-qubit gates to the routing boundary.
//!
//! A gate a few cuts ahead may already act on adjacent nodes while the ops
//! in front of it do not. If it commutes with everything between it and the
//! boundary, moving it forward lets the boundary pass it without any SWAP.

use tracing::debug;

use arvak_ir::NodeIndex;

use crate::architecture::Architecture;
use crate::error::RoutingResult;
use crate::frontier::MappingFrontier;
use crate::routing_method::{Relabelling, RoutingMethod, RoutingMethodDescriptor};

/// Default number of cuts searched.
pub const DEFAULT_REORDER_DEPTH: usize = 10;
/// Default number of gates searched.
pub const DEFAULT_REORDER_SIZE: usize = 10;

/// Reorders gates ahead of the boundary over one routing step.
#[derive(Debug)]
pub struct MultiGateReorder<'s, 'a> {
    architecture: &'s Architecture,
    frontier: &'s mut MappingFrontier<'a>,
}

/// Whether the gate at `node` is a candidate: an unconditional gate on two
/// or more placed qubits that the architecture already allows.
fn is_candidate(frontier: &MappingFrontier<'_>, architecture: &Architecture, node: NodeIndex) -> bool {
    let Some(inst) = frontier.circuit().get_instruction(node) else {
        return false;
    };
    inst.is_gate()
        && inst.num_qubits() > 1
        && inst.clbits.is_empty()
        && inst.condition.is_none()
        && MappingFrontier::valid_boundary_operation(architecture, inst)
        && !frontier.is_quantum_ready(node)
}

/// Check that the gate at `node` commutes with every op between it and the
/// boundary on each of its wires.
fn commutes_to_front(frontier: &MappingFrontier<'_>, node: NodeIndex) -> bool {
    let circuit = frontier.circuit();
    let Some(inst) = circuit.get_instruction(node) else {
        return false;
    };
    let Some(gate) = inst.as_gate() else {
        return false;
    };

    inst.qubits.iter().enumerate().all(|(port, &wire)| {
        let Some(&stop) = frontier.linear_boundary().get(&wire) else {
            return false;
        };
        let basis = gate.commuting_basis(port);
        let mut current = node;
        loop {
            let Some(pred) = circuit.wire_predecessor(current, wire) else {
                return false;
            };
            if pred == stop {
                return true;
            }
            // Reaching an input means `node` is already behind the boundary.
            let Some(prev) = circuit.get_instruction(pred) else {
                return false;
            };
            let Some(prev_gate) = prev.as_gate() else {
                return false;
            };
            let Some(prev_port) = prev.qubits.iter().position(|&q| q == wire) else {
                return false;
            };
            if prev.condition.is_some() || !prev_gate.commutes_with_basis(basis, prev_port) {
                return false;
            }
            current = pred;
        }
    })
}

impl<'s, 'a> MultiGateReorder<'s, 'a> {
    /// Prepare a reorder over the frontier's current boundary.
    pub fn new(architecture: &'s Architecture, frontier: &'s mut MappingFrontier<'a>) -> Self {
        Self {
            architecture,
            frontier,
        }
    }

    /// Move every commuting, already-valid gate within `max_depth` cuts and
    /// `max_size` gates of the boundary to the front.
    ///
    /// The boundary is restored afterwards; the moved gates sit right after
    /// it. Returns whether any gate moved.
    pub fn solve(&mut self, max_depth: usize, max_size: usize) -> RoutingResult<bool> {
        let saved = self.frontier.linear_boundary().clone();
        let Ok(region) = self.frontier.get_frontier_subcircuit(max_depth, max_size) else {
            return Ok(false);
        };

        let mut moved = 0;
        for &node in &region.nodes {
            if !is_candidate(self.frontier, self.architecture, node)
                || !commutes_to_front(self.frontier, node)
            {
                continue;
            }
            self.move_to_front(node)?;
            moved += 1;
            self.frontier.advance_frontier_boundary(self.architecture);
        }

        self.frontier.set_linear_boundary(saved);
        if moved > 0 {
            debug!("commuted {moved} gates to the boundary");
        }
        Ok(moved > 0)
    }

    fn move_to_front(&mut self, node: NodeIndex) -> RoutingResult<()> {
        let inst = self.frontier.circuit_mut().remove_op(node)?;
        let preds: Vec<NodeIndex> = inst
            .qubits
            .iter()
            .map(|q| self.frontier.linear_boundary()[q])
            .collect();
        self.frontier.circuit_mut().insert_after(inst, &preds)?;
        Ok(())
    }
}

/// Reorders commuting gates that need no routing to the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiGateReorderRoutingMethod {
    max_depth: usize,
    max_size: usize,
}

impl MultiGateReorderRoutingMethod {
    /// Search up to `max_depth` cuts holding at most `max_size` gates.
    pub fn new(max_depth: usize, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
        }
    }

    /// Number of cuts searched.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of gates searched.
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for MultiGateReorderRoutingMethod {
    fn default() -> Self {
        Self::new(DEFAULT_REORDER_DEPTH, DEFAULT_REORDER_SIZE)
    }
}

impl RoutingMethod for MultiGateReorderRoutingMethod {
    fn name(&self) -> &'static str {
        "MultiGateReorderRoutingMethod"
    }

    fn check_method(&self, frontier: &MappingFrontier<'_>, architecture: &Architecture) -> bool {
        frontier
            .get_frontier_subcircuit(self.max_depth, self.max_size)
            .is_ok_and(|region| {
                region.nodes.iter().any(|&node| {
                    is_candidate(frontier, architecture, node) && commutes_to_front(frontier, node)
                })
            })
    }

    fn routing_method(
        &self,
        frontier: &mut MappingFrontier<'_>,
        architecture: &Architecture,
    ) -> RoutingResult<(bool, Relabelling)> {
        let modified =
            MultiGateReorder::new(architecture, frontier).solve(self.max_depth, self.max_size)?;
        Ok((modified, Relabelling::new()))
    }

    fn descriptor(&self) -> RoutingMethodDescriptor {
        RoutingMethodDescriptor::MultiGateReorderRoutingMethod {
            depth: self.max_depth,
            size: self.max_size,
        }
    }
}
