//! Target device connectivity.
//!
//! An [`Architecture`] is the set of physical [`Node`]s of a device plus the
//! pairs of nodes that can run a two-qubit gate. Edges may be directed, in
//! which case a non-symmetric gate can only run in the edge's orientation.
//! Distances are always measured on the undirected closure of the edges.
//!
//! # Example
//!
//! ```
//! use arvak_ir::Node;
//! use arvak_mapping::Architecture;
//!
//! let arch = Architecture::linear(5);
//! assert_eq!(arch.get_distance(Node(0), Node(4)), Some(4));
//! assert!(arch.edge_exists(Node(1), Node(2)));
//! assert_eq!(arch.get_path(Node(0), Node(2)), Some(vec![Node(0), Node(1), Node(2)]));
//! ```

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use arvak_ir::Node;

const UNREACHABLE: u32 = u32::MAX;

/// Target device coupling graph.
///
/// ## Performance
///
/// On construction, a distance matrix is precomputed using BFS from each
/// node. This enables O(1) [`get_distance`](Self::get_distance) lookups and
/// O(distance) path reconstruction during routing.
///
/// ## Deserialization
///
/// After deserialization, call [`rebuild_caches()`](Self::rebuild_caches) to
/// recompute the adjacency list and distance/predecessor matrices (which are
/// skipped during serialization). Without this call every distance query
/// returns `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Architecture {
    /// Nodes of the device, sorted.
    nodes: Vec<Node>,
    /// Coupled pairs, in the orientation they were given.
    edges: Vec<(Node, Node)>,
    /// Whether edge orientation restricts non-symmetric gates.
    directed: bool,
    /// Position of each node in `nodes`.
    #[serde(skip)]
    index: FxHashMap<Node, usize>,
    /// Oriented edges for O(1) existence checks.
    #[serde(skip)]
    edge_set: FxHashSet<(Node, Node)>,
    /// Undirected adjacency by node position, sorted.
    #[serde(skip)]
    adjacency: Vec<Vec<usize>>,
    /// `dist_matrix[a][b]` is the shortest-path distance, or `u32::MAX`.
    #[serde(skip)]
    dist_matrix: Vec<Vec<u32>>,
    /// `pred_matrix[a][b]` is the node before `b` on a shortest path from `a`.
    #[serde(skip)]
    pred_matrix: Vec<Vec<u32>>,
}

impl Architecture {
    /// Create an empty architecture.
    pub fn new(directed: bool) -> Self {
        Self {
            nodes: vec![],
            edges: vec![],
            directed,
            index: FxHashMap::default(),
            edge_set: FxHashSet::default(),
            adjacency: vec![],
            dist_matrix: vec![],
            pred_matrix: vec![],
        }
    }

    /// Create an undirected architecture from coupled pairs.
    pub fn from_edges(edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        Self::build(false, edges)
    }

    /// Create a directed architecture: `(a, b)` allows CX with control `a`.
    pub fn directed(edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        Self::build(true, edges)
    }

    fn build(directed: bool, edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut arch = Self::new(directed);
        for (a, b) in edges {
            arch.add_edge(Node(a), Node(b));
        }
        arch.rebuild_caches();
        arch
    }

    /// Add an isolated node. Call [`rebuild_caches`](Self::rebuild_caches)
    /// once all nodes and edges are in.
    pub fn add_node(&mut self, node: Node) {
        if let Err(pos) = self.nodes.binary_search(&node) {
            self.nodes.insert(pos, node);
        }
    }

    /// Add an edge, creating its nodes if needed.
    ///
    /// Duplicate edges are ignored; on undirected architectures so are
    /// reversed duplicates. Self-loops are ignored.
    pub fn add_edge(&mut self, a: Node, b: Node) {
        if a == b {
            return;
        }
        self.add_node(a);
        self.add_node(b);
        let duplicate = self
            .edges
            .iter()
            .any(|&e| e == (a, b) || (!self.directed && e == (b, a)));
        if !duplicate {
            self.edges.push((a, b));
        }
    }

    /// Rebuild the lookup tables and distance/predecessor matrices from the
    /// node and edge lists.
    #[allow(clippy::cast_possible_truncation)]
    pub fn rebuild_caches(&mut self) {
        let n = self.nodes.len();
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &node)| (node, i))
            .collect();
        self.edge_set = self.edges.iter().copied().collect();

        self.adjacency = vec![vec![]; n];
        for &(a, b) in &self.edges {
            let (ia, ib) = (self.index[&a], self.index[&b]);
            self.adjacency[ia].push(ib);
            self.adjacency[ib].push(ia);
        }
        for neighbours in &mut self.adjacency {
            neighbours.sort_unstable();
            neighbours.dedup();
        }

        self.dist_matrix = vec![vec![UNREACHABLE; n]; n];
        self.pred_matrix = vec![vec![UNREACHABLE; n]; n];
        for src in 0..n {
            self.dist_matrix[src][src] = 0;
            let mut queue = VecDeque::from([src]);
            while let Some(current) = queue.pop_front() {
                for &nb in &self.adjacency[current] {
                    if self.dist_matrix[src][nb] == UNREACHABLE {
                        self.dist_matrix[src][nb] = self.dist_matrix[src][current] + 1;
                        self.pred_matrix[src][nb] = current as u32;
                        queue.push_back(nb);
                    }
                }
            }
        }
    }

    /// Create a linear architecture (0-1-2-3-...).
    pub fn linear(n: u32) -> Self {
        Self::from_edges((0..n.saturating_sub(1)).map(|i| (i, i + 1)))
    }

    /// Create a ring architecture.
    pub fn ring(n: u32) -> Self {
        let mut edges: Vec<_> = (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect();
        if n > 2 {
            edges.push((n - 1, 0));
        }
        Self::from_edges(edges)
    }

    /// Create a `rows` x `cols` grid; node `r * cols + c` sits at row `r`,
    /// column `c`.
    pub fn grid(rows: u32, cols: u32) -> Self {
        let mut edges = vec![];
        for r in 0..rows {
            for c in 0..cols {
                let id = r * cols + c;
                if c + 1 < cols {
                    edges.push((id, id + 1));
                }
                if r + 1 < rows {
                    edges.push((id, id + cols));
                }
            }
        }
        let mut arch = Self::from_edges(edges);
        if rows * cols == 1 {
            arch.add_node(Node(0));
            arch.rebuild_caches();
        }
        arch
    }

    /// Create a fully connected architecture.
    pub fn fully_connected(n: u32) -> Self {
        let mut arch = Self::from_edges((0..n).flat_map(|i| ((i + 1)..n).map(move |j| (i, j))));
        if n == 1 {
            arch.add_node(Node(0));
            arch.rebuild_caches();
        }
        arch
    }

    /// Create a star topology (node 0 connected to all others).
    pub fn star(n: u32) -> Self {
        Self::from_edges((1..n).map(|i| (0, i)))
    }

    fn position(&self, node: Node) -> Option<usize> {
        self.index.get(&node).copied()
    }

    /// Check if a node belongs to the architecture.
    #[inline]
    pub fn node_exists(&self, node: Node) -> bool {
        self.index.contains_key(&node)
    }

    /// Check if a two-qubit gate with first operand `a` and second operand
    /// `b` can run natively. On undirected architectures orientation is
    /// ignored.
    #[inline]
    pub fn edge_exists(&self, a: Node, b: Node) -> bool {
        self.edge_set.contains(&(a, b)) || (!self.directed && self.edge_set.contains(&(b, a)))
    }

    /// Check if both orientations of an edge are present.
    pub fn bidirectional_edge_exists(&self, a: Node, b: Node) -> bool {
        self.edge_set.contains(&(a, b)) && self.edge_set.contains(&(b, a))
    }

    /// Whether edge orientation matters.
    #[inline]
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Shortest-path distance on the undirected closure of the edges.
    ///
    /// `None` if either node is unknown or the nodes are disconnected.
    #[inline]
    pub fn get_distance(&self, a: Node, b: Node) -> Option<u32> {
        let (ia, ib) = (self.position(a)?, self.position(b)?);
        let d = *self.dist_matrix.get(ia)?.get(ib)?;
        (d != UNREACHABLE).then_some(d)
    }

    /// A shortest path from `a` to `b`, both included.
    pub fn get_path(&self, a: Node, b: Node) -> Option<Vec<Node>> {
        let (ia, ib) = (self.position(a)?, self.position(b)?);
        if *self.dist_matrix.get(ia)?.get(ib)? == UNREACHABLE {
            return None;
        }
        let mut path = vec![b];
        let mut current = ib;
        while current != ia {
            let pred = self.pred_matrix[ia][current];
            if pred == UNREACHABLE {
                return None;
            }
            current = pred as usize;
            path.push(self.nodes[current]);
        }
        path.reverse();
        Some(path)
    }

    /// All nodes exactly `distance` away from `node`, sorted.
    pub fn nodes_at_distance(&self, node: Node, distance: u32) -> Vec<Node> {
        let Some(i) = self.position(node) else {
            return vec![];
        };
        self.nodes
            .iter()
            .enumerate()
            .filter(|&(j, _)| self.dist_matrix[i][j] == distance)
            .map(|(_, &n)| n)
            .collect()
    }

    /// Nodes sharing an edge with `node`, in either orientation, sorted.
    pub fn neighbours(&self, node: Node) -> Vec<Node> {
        self.position(node)
            .and_then(|i| self.adjacency.get(i))
            .map(|adj| adj.iter().map(|&j| self.nodes[j]).collect())
            .unwrap_or_default()
    }

    /// All nodes, sorted.
    pub fn get_all_nodes_vec(&self) -> Vec<Node> {
        self.nodes.clone()
    }

    /// All nodes, sorted, without allocating.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges in their stored orientation.
    pub fn get_all_edges_vec(&self) -> Vec<(Node, Node)> {
        self.edges.clone()
    }

    /// Number of nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Largest finite distance between two nodes.
    pub fn diameter(&self) -> u32 {
        self.dist_matrix
            .iter()
            .flatten()
            .copied()
            .filter(|&d| d != UNREACHABLE)
            .max()
            .unwrap_or(0)
    }

    /// Nodes of maximum degree, sorted.
    pub fn max_degree_nodes(&self) -> Vec<Node> {
        let max = self.adjacency.iter().map(Vec::len).max().unwrap_or(0);
        self.nodes
            .iter()
            .zip(&self.adjacency)
            .filter(|(_, adj)| adj.len() == max)
            .map(|(&n, _)| n)
            .collect()
    }

    /// Distances from `node` to every other node, ascending.
    ///
    /// Comparing profiles lexicographically ranks nodes by centrality: a
    /// smaller profile has more nodes close by.
    pub fn distance_profile(&self, node: Node) -> Vec<u32> {
        let Some(i) = self.position(node) else {
            return vec![];
        };
        let mut profile: Vec<u32> = self.dist_matrix[i]
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &d)| d)
            .collect();
        profile.sort_unstable();
        profile
    }
}
