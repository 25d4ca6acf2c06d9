//! DAG-based circuit representation.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex as PetNodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, Node, QubitId, UnitId};

/// Node index type for the circuit DAG.
///
/// Indices are stable: removing a vertex never renumbers the others, so
/// callers may keep indices across mutations of unrelated vertices.
pub type NodeIndex = PetNodeIndex<u32>;

/// Per-wire position in a circuit: for every unit, the last vertex that is
/// considered processed on that wire.
pub type Boundary = BTreeMap<UnitId, NodeIndex>;

/// A node in the circuit DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DagNode {
    /// Input node for a wire.
    In(UnitId),
    /// Output node for a wire.
    Out(UnitId),
    /// Operation node containing an instruction.
    Op(Instruction),
}

impl DagNode {
    /// Check if this is an output node.
    #[inline]
    pub fn is_output(&self) -> bool {
        matches!(self, DagNode::Out(_))
    }

    /// Check if this is an operation node.
    #[inline]
    pub fn is_op(&self) -> bool {
        matches!(self, DagNode::Op(_))
    }

    /// Get the instruction if this is an operation node.
    #[inline]
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// An edge in the circuit DAG, labelled by the wire it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagEdge {
    /// The wire this edge represents.
    pub wire: UnitId,
}

/// The abstraction level of a circuit in the compilation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CircuitLevel {
    /// Logical level: qubits are abstract, no physical mapping applied.
    #[default]
    Logical,
    /// Physical level: every multi-qubit operation respects the device.
    Physical,
}

/// One causal layer of a circuit, as returned by [`CircuitDag::next_cut`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    /// Operations whose every wire sits at the input boundary.
    pub slice: Vec<NodeIndex>,
    /// The boundary after passing every operation in `slice`.
    pub frontier: Boundary,
}

/// DAG-based circuit representation.
///
/// The circuit is represented as a directed acyclic graph where:
/// - Nodes are either input nodes, output nodes, or operation nodes
/// - Edges carry the unit of the wire they belong to
/// - Each wire runs from exactly one input node to one output node
/// - An operation has one incoming and one outgoing edge per wire it touches
#[derive(Debug, Clone)]
pub struct CircuitDag {
    /// The underlying graph.
    graph: StableDiGraph<DagNode, DagEdge, u32>,
    /// Map from unit to its input node.
    inputs: BTreeMap<UnitId, NodeIndex>,
    /// Map from unit to its output node.
    outputs: BTreeMap<UnitId, NodeIndex>,
    /// Abstraction level of the circuit.
    level: CircuitLevel,
}

impl CircuitDag {
    /// Create a new empty circuit DAG.
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::default(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            level: CircuitLevel::Logical,
        }
    }

    /// Add a wire for `unit`. Returns false if the unit already exists.
    pub fn add_unit(&mut self, unit: UnitId) -> bool {
        if self.inputs.contains_key(&unit) {
            return false;
        }
        let in_node = self.graph.add_node(DagNode::In(unit));
        let out_node = self.graph.add_node(DagNode::Out(unit));
        self.graph.add_edge(in_node, out_node, DagEdge { wire: unit });
        self.inputs.insert(unit, in_node);
        self.outputs.insert(unit, out_node);
        true
    }

    /// Add a logical qubit to the circuit.
    pub fn add_qubit(&mut self, qubit: QubitId) {
        self.add_unit(UnitId::Qubit(qubit));
    }

    /// Add a physical node wire to the circuit.
    pub fn add_node(&mut self, node: Node) {
        self.add_unit(UnitId::Node(node));
    }

    /// Add a classical bit to the circuit.
    pub fn add_clbit(&mut self, clbit: ClbitId) {
        self.add_unit(UnitId::Bit(clbit));
    }

    /// Check that an instruction may be placed on this circuit.
    #[allow(clippy::cast_possible_truncation)]
    fn validate(&self, instruction: &Instruction) -> IrResult<()> {
        let gate_name = match &instruction.kind {
            InstructionKind::Gate(gate) => Some(gate.name().to_string()),
            _ => None,
        };

        let expected = match &instruction.kind {
            InstructionKind::Gate(gate) => Some(gate.num_qubits() as usize),
            InstructionKind::CircBox(b) => Some(b.num_qubits as usize),
            InstructionKind::PhasePolyBox(b) => Some(b.num_qubits as usize),
            InstructionKind::Measure | InstructionKind::Reset => Some(1),
            InstructionKind::Barrier => None,
        };
        if let Some(expected) = expected {
            let got = instruction.qubits.len();
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: instruction.name().to_string(),
                    expected: expected as u32,
                    got: got as u32,
                });
            }
        }

        for (i, unit) in instruction.wires().enumerate() {
            let in_qubit_slot = i < instruction.qubits.len();
            if in_qubit_slot != unit.is_quantum() || !self.inputs.contains_key(&unit) {
                return Err(IrError::UnitNotFound {
                    unit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for unit in instruction.wires() {
            if !seen.insert(unit) {
                return Err(IrError::DuplicateUnit {
                    unit,
                    gate_name: gate_name.clone(),
                });
            }
        }
        Ok(())
    }

    /// The outgoing edge of `node` on `wire`.
    fn out_edge(&self, node: NodeIndex, wire: UnitId) -> Option<(EdgeIndex<u32>, NodeIndex)> {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .find(|e| e.weight().wire == wire)
            .map(|e| (e.id(), e.target()))
    }

    /// Put `op` between `pred` and its current successor on `wire`.
    fn splice_after(&mut self, op: NodeIndex, wire: UnitId, pred: NodeIndex) -> IrResult<()> {
        let (eid, succ) = self.out_edge(pred, wire).ok_or_else(|| {
            IrError::InvalidDag(format!("node {pred:?} has no outgoing edge on wire {wire}"))
        })?;
        self.graph.remove_edge(eid);
        self.graph.add_edge(pred, op, DagEdge { wire });
        self.graph.add_edge(op, succ, DagEdge { wire });
        Ok(())
    }

    /// Apply an instruction at the end of the circuit.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        self.validate(&instruction)?;
        let mut preds = Vec::with_capacity(instruction.qubits.len());
        for unit in instruction.wires() {
            let out = self.outputs[&unit];
            let pred = self.wire_predecessor(out, unit).ok_or_else(|| {
                IrError::InvalidDag(format!("output of wire {unit} has no predecessor"))
            })?;
            preds.push(pred);
        }
        self.place(instruction, &preds)
    }

    /// Insert an instruction directly after the given vertices.
    ///
    /// `preds[i]` is the vertex after which the instruction goes on its
    /// `i`-th wire, in [`Instruction::wires`] order.
    pub fn insert_after(
        &mut self,
        instruction: Instruction,
        preds: &[NodeIndex],
    ) -> IrResult<NodeIndex> {
        self.validate(&instruction)?;
        let wires: Vec<UnitId> = instruction.wires().collect();
        if wires.len() != preds.len() {
            return Err(IrError::InvalidDag(format!(
                "'{}' touches {} wires but {} insertion points were given",
                instruction.name(),
                wires.len(),
                preds.len()
            )));
        }
        for (&wire, &pred) in wires.iter().zip(preds) {
            if self.out_edge(pred, wire).is_none() {
                return Err(IrError::InvalidDag(format!(
                    "node {pred:?} is not on wire {wire}"
                )));
            }
        }
        self.place(instruction, preds)
    }

    fn place(&mut self, instruction: Instruction, preds: &[NodeIndex]) -> IrResult<NodeIndex> {
        let wires: Vec<UnitId> = instruction.wires().collect();
        let op_node = self.graph.add_node(DagNode::Op(instruction));
        for (&wire, &pred) in wires.iter().zip(preds) {
            self.splice_after(op_node, wire, pred)?;
        }
        Ok(op_node)
    }

    /// Insert an instruction after the per-wire positions in `fronts`, then
    /// advance those positions to the new vertex.
    pub fn insert_at_fronts(
        &mut self,
        fronts: &mut Boundary,
        instruction: Instruction,
    ) -> IrResult<NodeIndex> {
        let wires: Vec<UnitId> = instruction.wires().collect();
        let mut preds = Vec::with_capacity(wires.len());
        for wire in &wires {
            let pred = fronts.get(wire).copied().ok_or(IrError::UnitNotFound {
                unit: *wire,
                gate_name: Some(instruction.name().to_string()),
            })?;
            preds.push(pred);
        }
        let node = self.insert_after(instruction, &preds)?;
        for wire in wires {
            fronts.insert(wire, node);
        }
        Ok(node)
    }

    /// The next vertex after `node` on `wire`.
    #[inline]
    pub fn wire_successor(&self, node: NodeIndex, wire: UnitId) -> Option<NodeIndex> {
        self.out_edge(node, wire).map(|(_, target)| target)
    }

    /// The vertex before `node` on `wire`.
    #[inline]
    pub fn wire_predecessor(&self, node: NodeIndex, wire: UnitId) -> Option<NodeIndex> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .find(|e| e.weight().wire == wire)
            .map(|e| e.source())
    }

    /// Get the input node of a wire.
    #[inline]
    pub fn input_node(&self, unit: UnitId) -> Option<NodeIndex> {
        self.inputs.get(&unit).copied()
    }

    /// Get the output node of a wire.
    #[inline]
    pub fn output_node(&self, unit: UnitId) -> Option<NodeIndex> {
        self.outputs.get(&unit).copied()
    }

    /// Get a vertex.
    #[inline]
    pub fn node(&self, node: NodeIndex) -> Option<&DagNode> {
        self.graph.node_weight(node)
    }

    /// Get an instruction by node index.
    #[inline]
    pub fn get_instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(|n| n.instruction())
    }

    /// Compute the operations that can run right after `boundary`.
    ///
    /// An operation is in the slice when every wire it touches is present in
    /// `boundary` and its predecessor on that wire is the boundary vertex.
    pub fn next_cut(&self, boundary: &Boundary) -> Cut {
        let mut slice = Vec::new();
        let mut checked = FxHashSet::default();
        for (&wire, &pos) in boundary {
            let Some(next) = self.wire_successor(pos, wire) else {
                continue;
            };
            if !checked.insert(next) {
                continue;
            }
            let Some(inst) = self.get_instruction(next) else {
                continue;
            };
            let ready = inst.wires().all(|u| {
                boundary
                    .get(&u)
                    .is_some_and(|&b| self.wire_predecessor(next, u) == Some(b))
            });
            if ready {
                slice.push(next);
            }
        }

        let mut frontier = boundary.clone();
        for &node in &slice {
            if let Some(inst) = self.get_instruction(node) {
                for wire in inst.wires() {
                    frontier.insert(wire, node);
                }
            }
        }
        Cut { slice, frontier }
    }

    /// Remove an operation node, reconnecting each of its wires.
    pub fn remove_op(&mut self, node: NodeIndex) -> IrResult<Instruction> {
        if !self.graph.node_weight(node).ok_or(IrError::InvalidNode)?.is_op() {
            return Err(IrError::InvalidDag(
                "Cannot remove non-operation node".into(),
            ));
        }

        let incoming: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.source(), e.weight().wire))
            .collect();
        let outgoing: FxHashMap<UnitId, NodeIndex> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.weight().wire, e.target()))
            .collect();

        let Some(DagNode::Op(instruction)) = self.graph.remove_node(node) else {
            return Err(IrError::InvalidNode);
        };

        for (pred, wire) in incoming {
            if let Some(&succ) = outgoing.get(&wire) {
                self.graph.add_edge(pred, succ, DagEdge { wire });
            }
        }

        Ok(instruction)
    }

    /// Replace an operation with a sequence of instructions on its wires.
    ///
    /// The replacement is spliced where the operation was, so everything
    /// outside it keeps its causal order.
    pub fn substitute_op(
        &mut self,
        node: NodeIndex,
        replacement: impl IntoIterator<Item = Instruction>,
    ) -> IrResult<Vec<NodeIndex>> {
        let old = self.get_instruction(node).ok_or(IrError::InvalidNode)?;
        let mut fronts = Boundary::new();
        for wire in old.wires() {
            let pred = self
                .wire_predecessor(node, wire)
                .ok_or_else(|| IrError::InvalidDag(format!("wire {wire} is broken")))?;
            fronts.insert(wire, pred);
        }

        let replacement: Vec<Instruction> = replacement.into_iter().collect();
        for inst in &replacement {
            if let Some(stray) = inst.wires().find(|w| !fronts.contains_key(w)) {
                return Err(IrError::InvalidInstruction(format!(
                    "replacement '{}' acts on {stray}, outside the substituted operation",
                    inst.name()
                )));
            }
        }

        self.remove_op(node)?;
        let mut new_nodes = Vec::with_capacity(replacement.len());
        for inst in replacement {
            new_nodes.push(self.insert_at_fronts(&mut fronts, inst)?);
        }
        Ok(new_nodes)
    }

    /// Walk `wire` forward from `start` (exclusive) to its output node,
    /// returning the edges and vertices visited.
    fn walk_wire(&self, start: NodeIndex, wire: UnitId) -> (Vec<EdgeIndex<u32>>, Vec<NodeIndex>) {
        let mut edges = Vec::new();
        let mut nodes = Vec::new();
        let mut current = start;
        while let Some((eid, next)) = self.out_edge(current, wire) {
            edges.push(eid);
            nodes.push(next);
            current = next;
        }
        (edges, nodes)
    }

    fn relabel_node(&mut self, node: NodeIndex, map: &BTreeMap<UnitId, UnitId>) {
        let rename = |u: UnitId| map.get(&u).copied().unwrap_or(u);
        let rename_bit = |c: ClbitId| rename(UnitId::Bit(c)).as_bit().unwrap_or(c);
        match &mut self.graph[node] {
            DagNode::In(u) | DagNode::Out(u) => *u = rename(*u),
            DagNode::Op(inst) => {
                inst.relabel_qubits(rename);
                for c in &mut inst.clbits {
                    *c = rename_bit(*c);
                }
                if let Some(cond) = &mut inst.condition {
                    for c in &mut cond.bits {
                        *c = rename_bit(*c);
                    }
                }
            }
        }
    }

    /// Rename whole wires.
    ///
    /// All renames happen simultaneously, so `map` may exchange two units.
    /// Targets must not collide with units that keep their name.
    pub fn rename_units(&mut self, map: &BTreeMap<UnitId, UnitId>) -> IrResult<()> {
        let map: BTreeMap<UnitId, UnitId> =
            map.iter().filter(|(f, t)| f != t).map(|(&f, &t)| (f, t)).collect();
        let mut targets = BTreeSet::new();
        for (&from, &to) in &map {
            if !self.inputs.contains_key(&from) {
                return Err(IrError::UnitNotFound {
                    unit: from,
                    gate_name: None,
                });
            }
            if from.is_quantum() != to.is_quantum() {
                return Err(IrError::InvalidDag(format!(
                    "cannot rename {from} to {to}: wire types differ"
                )));
            }
            let taken = self.inputs.contains_key(&to) && !map.contains_key(&to);
            if taken || !targets.insert(to) {
                return Err(IrError::UnitExists(to));
            }
        }

        let mut edges = Vec::new();
        let mut nodes = FxHashSet::default();
        for &from in map.keys() {
            let input = self.inputs[&from];
            let (wire_edges, wire_nodes) = self.walk_wire(input, from);
            edges.extend(wire_edges.into_iter().map(|e| (e, map[&from])));
            nodes.insert(input);
            nodes.extend(wire_nodes);
        }

        for (eid, to) in edges {
            self.graph[eid].wire = to;
        }
        for node in nodes {
            self.relabel_node(node, &map);
        }

        let moved: Vec<_> = map
            .iter()
            .map(|(from, &to)| (to, self.inputs[from], self.outputs[from]))
            .collect();
        for from in map.keys() {
            self.inputs.remove(from);
            self.outputs.remove(from);
        }
        for (to, input, output) in moved {
            self.inputs.insert(to, input);
            self.outputs.insert(to, output);
        }
        Ok(())
    }

    /// Move the remainder of each wire `u` in `perm` onto wire `perm[u]`.
    ///
    /// `fronts[u]` is the last vertex on `u` that stays put. Everything after
    /// it, up to and including the output node, is reattached after
    /// `fronts[perm[u]]` and relabelled to `perm[u]`. This is how the effect
    /// of a SWAP (or of a routed region ending in a permutation) is pushed
    /// into the rest of the circuit. `perm` must permute its own keys.
    pub fn permute_wires_after(
        &mut self,
        fronts: &Boundary,
        perm: &BTreeMap<UnitId, UnitId>,
    ) -> IrResult<()> {
        let perm: BTreeMap<UnitId, UnitId> =
            perm.iter().filter(|(f, t)| f != t).map(|(&f, &t)| (f, t)).collect();
        let keys: BTreeSet<UnitId> = perm.keys().copied().collect();
        let values: BTreeSet<UnitId> = perm.values().copied().collect();
        if keys != values {
            return Err(IrError::InvalidDag(
                "wire permutation does not permute its own units".into(),
            ));
        }

        struct Tail {
            from: UnitId,
            to: UnitId,
            cut: EdgeIndex<u32>,
            first: NodeIndex,
            edges: Vec<EdgeIndex<u32>>,
            nodes: Vec<NodeIndex>,
        }

        let mut tails = Vec::with_capacity(perm.len());
        for (&from, &to) in &perm {
            let front = *fronts.get(&from).ok_or(IrError::UnitNotFound {
                unit: from,
                gate_name: None,
            })?;
            let (cut, first) = self.out_edge(front, from).ok_or_else(|| {
                IrError::InvalidDag(format!("node {front:?} is not on wire {from}"))
            })?;
            let (edges, nodes) = self.walk_wire(first, from);
            tails.push(Tail {
                from,
                to,
                cut,
                first,
                edges,
                nodes,
            });
        }

        // Per-vertex renames, so a vertex on two moved tails maps both units.
        let mut node_maps: FxHashMap<NodeIndex, BTreeMap<UnitId, UnitId>> = FxHashMap::default();
        for tail in &tails {
            for &node in std::iter::once(&tail.first).chain(&tail.nodes) {
                node_maps.entry(node).or_default().insert(tail.from, tail.to);
            }
        }

        let mut new_outputs = Vec::with_capacity(tails.len());
        for tail in &tails {
            self.graph.remove_edge(tail.cut);
            for &eid in &tail.edges {
                self.graph[eid].wire = tail.to;
            }
            new_outputs.push((tail.to, self.outputs[&tail.from]));
        }
        for (node, map) in node_maps {
            self.relabel_node(node, &map);
        }
        for tail in &tails {
            let front = fronts[&tail.to];
            self.graph
                .add_edge(front, tail.first, DagEdge { wire: tail.to });
        }
        for (unit, out) in new_outputs {
            self.outputs.insert(unit, out);
        }
        Ok(())
    }

    /// Splice the wire `merge` onto the end of wire `keep`.
    ///
    /// The output node of `keep` and the input node of `merge` disappear;
    /// every operation of `merge` now happens on `keep` after its existing
    /// operations.
    pub fn merge_wire_into(&mut self, keep: UnitId, merge: UnitId) -> IrResult<()> {
        if keep == merge || !keep.is_quantum() || !merge.is_quantum() {
            return Err(IrError::InvalidDag(format!(
                "cannot merge wire {merge} into {keep}"
            )));
        }
        let keep_out = self.output_node(keep).ok_or(IrError::UnitNotFound {
            unit: keep,
            gate_name: None,
        })?;
        let merge_in = self.input_node(merge).ok_or(IrError::UnitNotFound {
            unit: merge,
            gate_name: None,
        })?;
        let keep_last = self
            .wire_predecessor(keep_out, keep)
            .ok_or_else(|| IrError::InvalidDag(format!("wire {keep} is broken")))?;
        let merge_first = self
            .wire_successor(merge_in, merge)
            .ok_or_else(|| IrError::InvalidDag(format!("wire {merge} is broken")))?;
        let merge_out = self.outputs[&merge];

        let (edges, mut nodes) = self.walk_wire(merge_first, merge);
        nodes.push(merge_first);

        self.graph.remove_node(keep_out);
        self.graph.remove_node(merge_in);
        for eid in edges {
            self.graph[eid].wire = keep;
        }
        let map = BTreeMap::from([(merge, keep)]);
        for node in nodes {
            self.relabel_node(node, &map);
        }
        self.graph
            .add_edge(keep_last, merge_first, DagEdge { wire: keep });

        self.inputs.remove(&merge);
        self.outputs.remove(&merge);
        self.outputs.insert(keep, merge_out);
        Ok(())
    }

    /// All vertices in a deterministic topological order.
    ///
    /// Among ready vertices the one with the smallest index goes first, so
    /// operations keep the order in which they were created where causality
    /// allows it.
    fn topo_order(&self) -> Vec<NodeIndex> {
        let mut in_degree: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        let mut ready = BinaryHeap::new();
        for node in self.graph.node_indices() {
            let deg = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .count();
            if deg == 0 {
                ready.push(Reverse(node));
            }
            in_degree.insert(node, deg);
        }

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                if let Some(deg) = in_degree.get_mut(&edge.target()) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(Reverse(edge.target()));
                    }
                }
            }
        }
        order
    }

    /// Iterate over operations in topological order.
    pub fn topological_ops(&self) -> impl Iterator<Item = (NodeIndex, &Instruction)> {
        self.topo_order()
            .into_iter()
            .filter_map(|idx| self.graph[idx].instruction().map(|inst| (idx, inst)))
    }

    /// Get the number of quantum wires (logical qubits and nodes).
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.inputs.keys().filter(|u| u.is_quantum()).count()
    }

    /// Get the number of classical bits.
    #[inline]
    pub fn num_clbits(&self) -> usize {
        self.inputs.len() - self.num_qubits()
    }

    /// Get the number of operations.
    ///
    /// Computed as total nodes minus input and output nodes (2 per wire).
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.graph
            .node_count()
            .saturating_sub(2 * self.inputs.len())
    }

    /// Calculate the circuit depth.
    pub fn depth(&self) -> usize {
        let mut depths: FxHashMap<NodeIndex, usize> =
            FxHashMap::with_capacity_and_hasher(self.graph.node_count(), Default::default());
        let mut max_depth = 0usize;

        for node in self.topo_order() {
            let max_pred_depth = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| depths.get(&e.source()).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);

            let node_depth = if self.graph[node].is_op() {
                max_pred_depth + 1
            } else {
                max_pred_depth
            };

            max_depth = max_depth.max(node_depth);
            depths.insert(node, node_depth);
        }

        max_depth
    }

    /// Iterate over all units, in unit order.
    pub fn units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.inputs.keys().copied()
    }

    /// Iterate over quantum units, in unit order.
    pub fn qubits(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.units().filter(UnitId::is_quantum)
    }

    /// Iterate over classical bits.
    pub fn clbits(&self) -> impl Iterator<Item = ClbitId> + '_ {
        self.units().filter_map(|u| u.as_bit())
    }

    /// Check if the circuit has a wire for `unit`.
    #[inline]
    pub fn contains_unit(&self, unit: UnitId) -> bool {
        self.inputs.contains_key(&unit)
    }

    /// Get the abstraction level of this circuit.
    pub fn level(&self) -> CircuitLevel {
        self.level
    }

    /// Set the abstraction level of this circuit.
    pub fn set_level(&mut self, level: CircuitLevel) {
        self.level = level;
    }

    /// Get a reference to the underlying graph.
    pub fn graph(&self) -> &StableDiGraph<DagNode, DagEdge, u32> {
        &self.graph
    }

    /// Verify the structural integrity of the DAG.
    ///
    /// Checks that:
    /// - The graph is acyclic
    /// - Every wire has an input and an output node carrying its unit
    /// - Each wire forms a path from its input to its output
    /// - Every operation's edges match the wires of its instruction
    pub fn verify_integrity(&self) -> IrResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(IrError::InvalidDag("Graph contains a cycle".into()));
        }

        if self.inputs.len() != self.outputs.len()
            || self.inputs.keys().any(|u| !self.outputs.contains_key(u))
        {
            return Err(IrError::InvalidDag(
                "input and output wires do not match".into(),
            ));
        }

        let max_steps = self.graph.node_count();
        for (&unit, &in_node) in &self.inputs {
            let out_node = self.outputs[&unit];
            if self.graph.node_weight(in_node) != Some(&DagNode::In(unit))
                || self.graph.node_weight(out_node) != Some(&DagNode::Out(unit))
            {
                return Err(IrError::InvalidDag(format!(
                    "boundary nodes of wire {unit} are mislabelled"
                )));
            }

            let mut current = in_node;
            let mut steps = 0;
            while current != out_node {
                current = self.wire_successor(current, unit).ok_or_else(|| {
                    IrError::InvalidDag(format!(
                        "Wire {unit} is broken: no outgoing edge from node {current:?}"
                    ))
                })?;
                steps += 1;
                if steps > max_steps {
                    return Err(IrError::InvalidDag(format!(
                        "Wire {unit} has too many steps (possible infinite loop)"
                    )));
                }
            }
        }

        for node in self.graph.node_indices() {
            let Some(inst) = self.graph[node].instruction() else {
                continue;
            };
            let expected: BTreeSet<UnitId> = inst.wires().collect();
            let incoming: BTreeSet<UnitId> = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| e.weight().wire)
                .collect();
            let outgoing: BTreeSet<UnitId> = self
                .graph
                .edges_directed(node, Direction::Outgoing)
                .map(|e| e.weight().wire)
                .collect();
            if incoming != expected || outgoing != expected {
                return Err(IrError::InvalidDag(format!(
                    "edges of '{}' at {node:?} do not match its operands",
                    inst.name()
                )));
            }
        }

        Ok(())
    }
}

impl Default for CircuitDag {
    fn default() -> Self {
        Self::new()
    }
}
