//! Bookkeeping of where each logical qubit started and where it ended up.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use arvak_ir::{CircuitDag, StandardGate, UnitId};

/// A bijection between original units and the units they are called now.
///
/// Keys ("left") are the units the caller knows; values ("right") are the
/// wire labels in the circuit. Serialized as a list of pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(UnitId, UnitId)>", into = "Vec<(UnitId, UnitId)>")]
pub struct UnitBimap {
    left: BTreeMap<UnitId, UnitId>,
    right: BTreeMap<UnitId, UnitId>,
}

impl UnitBimap {
    /// Create an empty bimap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map every unit to itself.
    pub fn identity(units: impl IntoIterator<Item = UnitId>) -> Self {
        let mut map = Self::new();
        for unit in units {
            map.insert(unit, unit);
        }
        map
    }

    /// Insert a pair, dropping any pair that conflicts with it on either side.
    pub fn insert(&mut self, left: UnitId, right: UnitId) {
        if let Some(old_left) = self.right.get(&right).copied() {
            if old_left != left {
                self.left.remove(&old_left);
            }
        }
        if let Some(old_right) = self.left.get(&left).copied() {
            if old_right != right {
                self.right.remove(&old_right);
            }
        }
        self.left.insert(left, right);
        self.right.insert(right, left);
    }

    /// The current label of an original unit.
    #[inline]
    pub fn get(&self, left: UnitId) -> Option<UnitId> {
        self.left.get(&left).copied()
    }

    /// The original unit now labelled `right`.
    #[inline]
    pub fn get_left(&self, right: UnitId) -> Option<UnitId> {
        self.right.get(&right).copied()
    }

    /// Remove an original unit and its label.
    pub fn remove(&mut self, left: UnitId) -> Option<UnitId> {
        let right = self.left.remove(&left)?;
        self.right.remove(&right);
        Some(right)
    }

    /// Check if an original unit is present.
    pub fn contains(&self, left: UnitId) -> bool {
        self.left.contains_key(&left)
    }

    /// Check if a label is in use.
    pub fn contains_right(&self, right: UnitId) -> bool {
        self.right.contains_key(&right)
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Check if the bimap is empty.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Iterate over `(original, current)` pairs in original order.
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, UnitId)> + '_ {
        self.left.iter().map(|(&l, &r)| (l, r))
    }

    /// Rename labels through `relabel`, all at once.
    pub fn rename_right(&mut self, relabel: &BTreeMap<UnitId, UnitId>) {
        let moved: Vec<_> = relabel
            .iter()
            .filter(|(from, to)| from != to)
            .filter_map(|(from, &to)| self.right.get(from).map(|&left| (left, *from, to)))
            .collect();
        for (_, from, _) in &moved {
            self.right.remove(from);
        }
        for (left, _, to) in moved {
            self.left.insert(left, to);
            self.right.insert(to, left);
        }
    }
}

impl From<Vec<(UnitId, UnitId)>> for UnitBimap {
    fn from(pairs: Vec<(UnitId, UnitId)>) -> Self {
        let mut map = Self::new();
        for (l, r) in pairs {
            map.insert(l, r);
        }
        map
    }
}

impl From<UnitBimap> for Vec<(UnitId, UnitId)> {
    fn from(map: UnitBimap) -> Self {
        map.left.into_iter().collect()
    }
}

/// The initial and final placement of every logical qubit.
///
/// `initial` records the node each qubit starts on and is fixed once the
/// qubit is placed. `final` follows the qubit through every inserted SWAP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMaps {
    initial: UnitBimap,
    #[serde(rename = "final")]
    final_map: UnitBimap,
}

impl UnitMaps {
    /// Create empty maps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create maps sending every unit to itself.
    pub fn identity(units: impl IntoIterator<Item = UnitId> + Clone) -> Self {
        Self {
            initial: UnitBimap::identity(units.clone()),
            final_map: UnitBimap::identity(units),
        }
    }

    /// Where each qubit started.
    pub fn initial(&self) -> &UnitBimap {
        &self.initial
    }

    /// Where each qubit ended up.
    pub fn final_map(&self) -> &UnitBimap {
        &self.final_map
    }

    /// Check if both maps are empty.
    pub fn is_empty(&self) -> bool {
        self.initial.is_empty() && self.final_map.is_empty()
    }

    /// Add `unit` to both maps, mapped to itself.
    pub fn add_identity(&mut self, unit: UnitId) {
        self.initial.insert(unit, unit);
        self.final_map.insert(unit, unit);
    }

    /// Rename circuit labels in both maps, e.g. when a qubit is placed.
    pub fn update_bimaps(&mut self, relabel: &BTreeMap<UnitId, UnitId>) {
        self.initial.rename_right(relabel);
        self.final_map.rename_right(relabel);
    }

    /// Record a SWAP between two labels in the final map.
    pub fn transpose_final(&mut self, a: UnitId, b: UnitId) {
        let perm = BTreeMap::from([(a, b), (b, a)]);
        self.final_map.rename_right(&perm);
    }

    /// Record an arbitrary relocation of labels in the final map.
    pub fn permute_final(&mut self, perm: &BTreeMap<UnitId, UnitId>) {
        self.final_map.rename_right(perm);
    }

    /// Hand the ancilla currently on `node` over to the original unit
    /// `merge`.
    ///
    /// `merge` inherits the ancilla's starting node, ends on `node`, and the
    /// ancilla's own entries disappear.
    pub fn merge_ancilla(&mut self, merge: UnitId, node: UnitId) {
        let ancilla = self.final_map.get_left(node).unwrap_or(node);
        let start = self.initial.get(ancilla).unwrap_or(ancilla);
        self.initial.remove(ancilla);
        self.final_map.remove(ancilla);
        self.initial.remove(merge);
        self.final_map.remove(merge);
        self.initial.insert(merge, start);
        self.final_map.insert(merge, node);
    }
}

/// Check that replaying the SWAPs of a routed circuit carries every qubit
/// from its initial node to its final node.
///
/// Only meaningful when every SWAP in the circuit was inserted by routing.
pub fn check_permutation(circuit: &CircuitDag, maps: &UnitMaps) -> bool {
    // occupant[w] = wire whose starting state is currently on w
    let mut occupant: BTreeMap<UnitId, UnitId> = circuit.qubits().map(|u| (u, u)).collect();
    for (_, inst) in circuit.topological_ops() {
        if inst.is_standard(&StandardGate::Swap) && inst.condition.is_none() {
            let (a, b) = (inst.qubits[0], inst.qubits[1]);
            let (oa, ob) = (occupant.get(&a).copied(), occupant.get(&b).copied());
            if let (Some(oa), Some(ob)) = (oa, ob) {
                occupant.insert(a, ob);
                occupant.insert(b, oa);
            }
        }
    }
    let location: BTreeMap<UnitId, UnitId> = occupant.into_iter().map(|(w, o)| (o, w)).collect();

    maps.initial().iter().all(|(original, start)| {
        let Some(end) = maps.final_map().get(original) else {
            return false;
        };
        match location.get(&start) {
            Some(&found) => found == end,
            // Never entered the circuit: nothing moved it.
            None => start == end,
        }
    })
}
