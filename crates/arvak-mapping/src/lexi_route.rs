//! Lexicographic lookahead routing and labelling.
//!
//! At each stuck boundary, [`LexiRoute`] either places unplaced qubits next
//! to their partners ([`solve_labelling`](LexiRoute::solve_labelling)) or
//! inserts the single SWAP or BRIDGE that best reduces interaction
//! distances ([`solve`](LexiRoute::solve)).
//!
//! Candidate SWAPs are ranked by the distances of the interactions they
//! affect, sorted largest first and compared lexicographically: first on
//! the boundary's own interactions, then on each lookahead layer in turn.
//! Remaining ties go to the smallest node pair.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use arvak_ir::{Node, NodeIndex, StandardGate, UnitId};

use crate::architecture::Architecture;
use crate::error::{RoutingError, RoutingResult};
use crate::frontier::MappingFrontier;
use crate::routing_method::{Relabelling, RoutingMethod, RoutingMethodDescriptor};

/// Lookahead used by [`LexiRouteRoutingMethod::default`].
pub const DEFAULT_LEXI_DEPTH: usize = 100;

/// A two-qubit operation waiting at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BoundaryInteraction {
    op: NodeIndex,
    first: UnitId,
    second: UnitId,
}

/// Two-qubit operations (not boxes or barriers) whose qubits are all at the
/// boundary.
fn boundary_interactions(frontier: &MappingFrontier<'_>) -> Vec<BoundaryInteraction> {
    frontier
        .boundary_operations()
        .into_iter()
        .filter_map(|op| {
            let inst = frontier.circuit().get_instruction(op)?;
            (inst.num_qubits() == 2 && !inst.is_box() && !inst.is_barrier()).then(|| {
                BoundaryInteraction {
                    op,
                    first: inst.qubits[0],
                    second: inst.qubits[1],
                }
            })
        })
        .collect()
}

fn placed(architecture: &Architecture, unit: UnitId) -> Option<Node> {
    unit.as_node().filter(|&n| architecture.node_exists(n))
}

fn distance(architecture: &Architecture, a: Node, b: Node) -> u32 {
    architecture.get_distance(a, b).unwrap_or(u32::MAX)
}

/// Distances of `pairs` after exchanging the nodes of `swap`, largest first.
fn cost(architecture: &Architecture, pairs: &[(Node, Node)], swap: Option<(Node, Node)>) -> Vec<u32> {
    let moved = |n: Node| match swap {
        Some((x, y)) if n == x => y,
        Some((x, y)) if n == y => x,
        _ => n,
    };
    let mut costs: Vec<u32> = pairs
        .iter()
        .map(|&(a, b)| distance(architecture, moved(a), moved(b)))
        .collect();
    costs.sort_unstable_by(|a, b| b.cmp(a));
    costs
}

enum Placement {
    Free(Node),
    Ancilla(Node),
}

/// One routing decision over a borrowed frontier.
#[derive(Debug)]
pub struct LexiRoute<'s, 'a> {
    architecture: &'s Architecture,
    frontier: &'s mut MappingFrontier<'a>,
}

impl<'s, 'a> LexiRoute<'s, 'a> {
    /// Prepare a decision for the frontier's current boundary.
    pub fn new(architecture: &'s Architecture, frontier: &'s mut MappingFrontier<'a>) -> Self {
        Self {
            architecture,
            frontier,
        }
    }

    /// Insert one SWAP or BRIDGE, looking ahead up to `max_depth` layers of
    /// interactions.
    ///
    /// Returns false if no boundary interaction between placed qubits needs
    /// routing, or if none could be made to progress.
    pub fn solve(&mut self, max_depth: usize) -> RoutingResult<bool> {
        let arch = self.architecture;
        let current: Vec<(NodeIndex, Node, Node)> = boundary_interactions(self.frontier)
            .into_iter()
            .filter_map(|i| Some((i.op, placed(arch, i.first)?, placed(arch, i.second)?)))
            .collect();
        if current.is_empty() {
            return Ok(false);
        }

        // Adjacent but against the edge direction: exchanging the pair
        // reverses the operation.
        for &(op, a, b) in &current {
            let valid = self
                .frontier
                .circuit()
                .get_instruction(op)
                .is_some_and(|i| MappingFrontier::valid_boundary_operation(arch, i));
            if !valid && arch.get_distance(a, b) == Some(1) && self.insert_swap(a, b)? {
                debug!("reversed {a} -> {b} against edge direction");
                return Ok(true);
            }
        }

        let pairs: Vec<(Node, Node)> = current.iter().map(|&(_, a, b)| (a, b)).collect();
        let distant: Vec<(Node, Node)> = pairs
            .iter()
            .copied()
            .filter(|&(a, b)| distance(arch, a, b) > 1)
            .collect();
        if distant.is_empty() {
            return Ok(false);
        }

        let lookahead: Vec<Vec<(Node, Node)>> = self
            .frontier
            .interaction_layers(max_depth.max(1))
            .into_iter()
            .skip(1)
            .map(|layer| {
                layer
                    .into_iter()
                    .filter_map(|(a, b)| Some((placed(arch, a)?, placed(arch, b)?)))
                    .collect::<Vec<_>>()
            })
            .filter(|layer| !layer.is_empty())
            .collect();

        let identity = cost(arch, &pairs, None);
        let ranked = self.rank_swaps(&pairs, &distant, &lookahead);
        let improving: Vec<(Node, Node)> = ranked
            .iter()
            .filter(|(key, _)| key[0] < identity)
            .map(|&(_, swap)| swap)
            .collect();

        if let Some(&best) = improving.first() {
            if !arch.is_directed() {
                if let Some((control, target)) = self.bridge_over(best, &current, &lookahead) {
                    self.insert_bridge(control, target)?;
                    return Ok(true);
                }
            }
            for (a, b) in improving {
                if self.insert_swap(a, b)? {
                    debug!("chose swap({a}, {b})");
                    return Ok(true);
                }
            }
        }

        // No single SWAP improves the boundary: resolve one interaction
        // outright.
        if !arch.is_directed() {
            let bridgeable = current
                .iter()
                .find(|&&(op, a, b)| distance(arch, a, b) == 2 && self.is_cx(op, a));
            if let Some(&(_, control, target)) = bridgeable {
                self.insert_bridge(control, target)?;
                return Ok(true);
            }
        }
        self.swap_along_path(&distant)
    }

    fn rank_swaps(
        &self,
        pairs: &[(Node, Node)],
        distant: &[(Node, Node)],
        lookahead: &[Vec<(Node, Node)>],
    ) -> Vec<(Vec<Vec<u32>>, (Node, Node))> {
        let arch = self.architecture;
        let mut sites = BTreeSet::new();
        for &(a, b) in distant {
            sites.insert(a);
            sites.insert(b);
            if let Some(path) = arch.get_path(a, b) {
                sites.extend(path);
            }
        }
        let candidates: BTreeSet<(Node, Node)> = sites
            .iter()
            .flat_map(|&n| arch.neighbours(n).into_iter().map(move |m| (n.min(m), n.max(m))))
            .collect();

        let decreasing: Vec<(Node, Node)> = candidates
            .iter()
            .copied()
            .filter(|&swap| {
                pairs.iter().any(|&pair| {
                    cost(arch, &[pair], Some(swap))[0] < distance(arch, pair.0, pair.1)
                })
            })
            .collect();
        let pool = if decreasing.is_empty() {
            candidates.into_iter().collect()
        } else {
            decreasing
        };

        let mut ranked: Vec<(Vec<Vec<u32>>, (Node, Node))> = pool
            .into_iter()
            .map(|swap| {
                let key = std::iter::once(pairs)
                    .chain(lookahead.iter().map(Vec::as_slice))
                    .map(|layer| cost(arch, layer, Some(swap)))
                    .collect();
                (key, swap)
            })
            .collect();
        ranked.sort();
        if let Some((key, swap)) = ranked.first() {
            trace!("best swap {swap:?} costs {key:?}");
        }
        ranked
    }

    fn is_cx(&self, op: NodeIndex, control: Node) -> bool {
        self.frontier.circuit().get_instruction(op).is_some_and(|i| {
            i.is_standard(&StandardGate::CX) && i.qubits[0] == UnitId::Node(control)
        })
    }

    /// Decide whether a BRIDGE should replace `swap`.
    ///
    /// Only considered when exactly one node of the SWAP belongs to a CX
    /// two edges long. The SWAP is kept only if some lookahead layer, the
    /// first one where the two differ, is strictly better with it.
    fn bridge_over(
        &self,
        swap: (Node, Node),
        current: &[(NodeIndex, Node, Node)],
        lookahead: &[Vec<(Node, Node)>],
    ) -> Option<(Node, Node)> {
        let arch = self.architecture;
        let bridgeable: Vec<(Node, Node)> = current
            .iter()
            .filter(|&&(op, a, b)| distance(arch, a, b) == 2 && self.is_cx(op, a))
            .map(|&(_, a, b)| (a, b))
            .collect();
        let touches = |n: Node| bridgeable.iter().find(|&&(a, b)| a == n || b == n).copied();
        let pair = match (touches(swap.0), touches(swap.1)) {
            (Some(pair), None) | (None, Some(pair)) => pair,
            _ => return None,
        };

        for layer in lookahead {
            let with_swap = cost(arch, layer, Some(swap));
            let without = cost(arch, layer, None);
            if with_swap != without {
                return (without < with_swap).then_some(pair);
            }
        }
        Some(pair)
    }

    fn insert_bridge(&mut self, control: Node, target: Node) -> RoutingResult<()> {
        let path = self
            .architecture
            .get_path(control, target)
            .ok_or(RoutingError::UnknownNode(UnitId::Node(target)))?;
        let central = path[1];
        self.ensure_wire(central);
        self.frontier.add_bridge(control, central, target)?;
        debug!("chose bridge({control}, {central}, {target})");
        Ok(())
    }

    fn ensure_wire(&mut self, node: Node) {
        if !self.frontier.circuit().contains_unit(UnitId::Node(node)) {
            self.frontier.add_ancilla(node);
        }
    }

    fn insert_swap(&mut self, a: Node, b: Node) -> RoutingResult<bool> {
        self.ensure_wire(a);
        self.ensure_wire(b);
        self.frontier.add_swap(a, b)
    }

    /// Walk one qubit of the most distant interaction next to its partner.
    fn swap_along_path(&mut self, distant: &[(Node, Node)]) -> RoutingResult<bool> {
        let arch = self.architecture;
        let Some(&(a, b)) = distant
            .iter()
            .filter(|&&(a, b)| arch.get_distance(a, b).is_some())
            .max_by(|&&x, &&y| {
                distance(arch, x.0, x.1)
                    .cmp(&distance(arch, y.0, y.1))
                    .then(y.cmp(&x))
            })
        else {
            return Ok(false);
        };
        let Some(path) = arch.get_path(a, b) else {
            return Ok(false);
        };
        let reversed: Vec<Node> = path.iter().rev().copied().collect();

        for route in [path, reversed] {
            let mut inserted = false;
            for step in route.windows(2).take(route.len() - 2) {
                if !self.insert_swap(step[0], step[1])? {
                    break;
                }
                inserted = true;
            }
            if inserted {
                debug!("walked {a} next to {b}");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Place the unplaced qubits of the boundary's two-qubit operations.
    ///
    /// A qubit whose partner is placed goes to the closest free node, ties
    /// broken by centrality. When both are unplaced, the first goes to the
    /// most central free node (near already placed qubits, if any) and the
    /// second next to it. Ancilla nodes are only reused when no node is
    /// free.
    pub fn solve_labelling(&mut self) -> RoutingResult<bool> {
        let arch = self.architecture;
        let interactions = boundary_interactions(self.frontier);

        let mut unplaced: Vec<UnitId> = vec![];
        for i in &interactions {
            for unit in [i.first, i.second] {
                if placed(arch, unit).is_none() && !unplaced.contains(&unit) {
                    unplaced.push(unit);
                }
            }
        }
        let Some(&first_unplaced) = unplaced.first() else {
            return Ok(false);
        };
        let available = self.free_nodes().len()
            + self
                .frontier
                .ancilla_nodes()
                .iter()
                .filter(|&&n| arch.node_exists(n))
                .count();
        if unplaced.len() > available {
            return Err(RoutingError::Unlabellable {
                unit: first_unplaced,
                reason: format!(
                    "{} qubits need a node but only {available} are free",
                    unplaced.len()
                ),
            });
        }

        let mut labelled: BTreeMap<UnitId, Node> = BTreeMap::new();
        for i in interactions {
            let current = |u: UnitId| labelled.get(&u).copied().or_else(|| placed(arch, u));
            match (current(i.first), current(i.second)) {
                (Some(_), Some(_)) => {}
                (None, None) => {
                    let root = self.root_placement(i.first)?;
                    let first = self.assign(i.first, root)?;
                    labelled.insert(i.first, first);
                    let partner = self.placement_near(i.second, first)?;
                    labelled.insert(i.second, self.assign(i.second, partner)?);
                }
                (Some(anchor), None) => {
                    let placement = self.placement_near(i.second, anchor)?;
                    labelled.insert(i.second, self.assign(i.second, placement)?);
                }
                (None, Some(anchor)) => {
                    let placement = self.placement_near(i.first, anchor)?;
                    labelled.insert(i.first, self.assign(i.first, placement)?);
                }
            }
        }
        Ok(!labelled.is_empty())
    }

    fn free_nodes(&self) -> Vec<Node> {
        let circuit = self.frontier.circuit();
        self.architecture
            .nodes()
            .iter()
            .copied()
            .filter(|&n| !circuit.contains_unit(UnitId::Node(n)))
            .collect()
    }

    fn most_central(&self, nodes: impl IntoIterator<Item = Node>) -> Option<Node> {
        nodes
            .into_iter()
            .min_by_key(|&n| (self.architecture.distance_profile(n), n))
    }

    /// Where to put the first qubit of an interaction with no placed side.
    fn root_placement(&self, unit: UnitId) -> RoutingResult<Placement> {
        let arch = self.architecture;
        let circuit = self.frontier.circuit();
        let roots: Vec<Node> = arch
            .nodes()
            .iter()
            .copied()
            .filter(|&n| circuit.contains_unit(UnitId::Node(n)))
            .collect();
        if roots.is_empty() {
            if let Some(centre) = self.most_central(arch.max_degree_nodes()) {
                return Ok(Placement::Free(centre));
            }
        }

        let free: BTreeSet<Node> = self.free_nodes().into_iter().collect();
        for k in 1..=arch.diameter() {
            let ring = roots
                .iter()
                .flat_map(|&r| arch.nodes_at_distance(r, k))
                .filter(|n| free.contains(n));
            if let Some(node) = self.most_central(ring) {
                return Ok(Placement::Free(node));
            }
        }
        self.fallback_placement(unit, &free, roots.first().copied())
    }

    /// Where to put a qubit whose partner sits on `anchor`.
    fn placement_near(&self, unit: UnitId, anchor: Node) -> RoutingResult<Placement> {
        let arch = self.architecture;
        let free: BTreeSet<Node> = self.free_nodes().into_iter().collect();
        for k in 1..=arch.diameter() {
            let ring = arch
                .nodes_at_distance(anchor, k)
                .into_iter()
                .filter(|n| free.contains(n));
            if let Some(node) = self.most_central(ring) {
                return Ok(Placement::Free(node));
            }
        }
        self.fallback_placement(unit, &free, Some(anchor))
    }

    fn fallback_placement(
        &self,
        unit: UnitId,
        free: &BTreeSet<Node>,
        anchor: Option<Node>,
    ) -> RoutingResult<Placement> {
        if let Some(node) = self.most_central(free.iter().copied()) {
            return Ok(Placement::Free(node));
        }
        let arch = self.architecture;
        self.frontier
            .ancilla_nodes()
            .iter()
            .copied()
            .filter(|&n| arch.node_exists(n))
            .min_by_key(|&n| (anchor.map_or(0, |a| distance(arch, a, n)), n))
            .map(Placement::Ancilla)
            .ok_or_else(|| RoutingError::Unlabellable {
                unit,
                reason: "no free or ancilla node left".into(),
            })
    }

    fn assign(&mut self, unit: UnitId, placement: Placement) -> RoutingResult<Node> {
        match placement {
            Placement::Free(node) => {
                self.frontier
                    .rename_units(&BTreeMap::from([(unit, UnitId::Node(node))]))?;
                debug!("labelled {unit} as {node}");
                Ok(node)
            }
            Placement::Ancilla(node) => {
                self.frontier.merge_ancilla(unit, node)?;
                debug!("labelled {unit} as ancilla {node}");
                Ok(node)
            }
        }
    }
}

/// Places unplaced qubits of boundary interactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexiLabellingMethod;

impl RoutingMethod for LexiLabellingMethod {
    fn name(&self) -> &'static str {
        "LexiLabellingMethod"
    }

    fn check_method(&self, frontier: &MappingFrontier<'_>, architecture: &Architecture) -> bool {
        boundary_interactions(frontier).iter().any(|i| {
            placed(architecture, i.first).is_none() || placed(architecture, i.second).is_none()
        })
    }

    fn routing_method(
        &self,
        frontier: &mut MappingFrontier<'_>,
        architecture: &Architecture,
    ) -> RoutingResult<(bool, Relabelling)> {
        let modified = LexiRoute::new(architecture, frontier).solve_labelling()?;
        Ok((modified, Relabelling::new()))
    }

    fn descriptor(&self) -> RoutingMethodDescriptor {
        RoutingMethodDescriptor::LexiLabellingMethod
    }
}

/// Inserts SWAPs and BRIDGEs for boundary interactions between placed
/// qubits that violate connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexiRouteRoutingMethod {
    depth: usize,
}

impl LexiRouteRoutingMethod {
    /// Create the method with a lookahead of `depth` interaction layers.
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }

    /// The lookahead depth.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Default for LexiRouteRoutingMethod {
    fn default() -> Self {
        Self::new(DEFAULT_LEXI_DEPTH)
    }
}

impl RoutingMethod for LexiRouteRoutingMethod {
    fn name(&self) -> &'static str {
        "LexiRouteRoutingMethod"
    }

    fn check_method(&self, frontier: &MappingFrontier<'_>, architecture: &Architecture) -> bool {
        boundary_interactions(frontier).iter().any(|i| {
            placed(architecture, i.first).is_some()
                && placed(architecture, i.second).is_some()
                && frontier
                    .circuit()
                    .get_instruction(i.op)
                    .is_some_and(|inst| !MappingFrontier::valid_boundary_operation(architecture, inst))
        })
    }

    fn routing_method(
        &self,
        frontier: &mut MappingFrontier<'_>,
        architecture: &Architecture,
    ) -> RoutingResult<(bool, Relabelling)> {
        let modified = LexiRoute::new(architecture, frontier).solve(self.depth)?;
        Ok((modified, Relabelling::new()))
    }

    fn descriptor(&self) -> RoutingMethodDescriptor {
        RoutingMethodDescriptor::LexiRouteRoutingMethod { depth: self.depth }
    }
}
