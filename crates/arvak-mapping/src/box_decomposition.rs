//! Expands boxes that reach the routing boundary.

use tracing::debug;

use arvak_ir::{InstructionKind, NodeIndex};

use crate::architecture::Architecture;
use crate::error::RoutingResult;
use crate::frontier::MappingFrontier;
use crate::routing_method::{Relabelling, RoutingMethod, RoutingMethodDescriptor};

/// Decomposes every box at the boundary one level, keeping its condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoxDecompositionRoutingMethod;

fn boundary_boxes(frontier: &MappingFrontier<'_>) -> Vec<NodeIndex> {
    frontier
        .boundary_operations()
        .into_iter()
        .filter(|&op| {
            frontier
                .circuit()
                .get_instruction(op)
                .is_some_and(|i| i.is_box())
        })
        .collect()
}

impl RoutingMethod for BoxDecompositionRoutingMethod {
    fn name(&self) -> &'static str {
        "BoxDecompositionRoutingMethod"
    }

    fn check_method(&self, frontier: &MappingFrontier<'_>, _architecture: &Architecture) -> bool {
        !boundary_boxes(frontier).is_empty()
    }

    fn routing_method(
        &self,
        frontier: &mut MappingFrontier<'_>,
        _architecture: &Architecture,
    ) -> RoutingResult<(bool, Relabelling)> {
        let boxes = boundary_boxes(frontier);
        for &op in &boxes {
            let Some(inst) = frontier.circuit().get_instruction(op) else {
                continue;
            };
            let expanded = match &inst.kind {
                InstructionKind::CircBox(b) => {
                    b.decompose(&inst.qubits, &inst.clbits, inst.condition.as_ref())?
                }
                InstructionKind::PhasePolyBox(b) => {
                    let mut gates = b.decompose(&inst.qubits)?;
                    if let Some(cond) = &inst.condition {
                        for gate in &mut gates {
                            gate.condition = Some(cond.clone());
                        }
                    }
                    gates
                }
                _ => continue,
            };
            debug!("decomposed {} into {} operations", inst.name(), expanded.len());
            frontier.substitute_operation(op, expanded)?;
        }
        Ok((!boxes.is_empty(), Relabelling::new()))
    }

    fn descriptor(&self) -> RoutingMethodDescriptor {
        RoutingMethodDescriptor::BoxDecompositionRoutingMethod
    }
}
