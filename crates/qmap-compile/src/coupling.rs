//! Device connectivity.
//!
//! A [`CouplingMap`] lists the directed pairs `(control, target)` on which
//! the hardware executes a CX. Connectivity for routing ignores direction;
//! direction only matters when the final CX orientation is fixed up.
//!
//! All-pairs distances and shortest-path predecessors are precomputed with
//! one BFS per qubit on construction, so [`CouplingMap::distance`] is a
//! table lookup. Values are immutable once built and safe to share between
//! threads.
//!
//! # Serialization
//!
//! The serialized form is the adjacency mapping used by configuration
//! files, `{control: [targets...]}`:
//!
//! ```
//! use qmap_compile::CouplingMap;
//!
//! let map: CouplingMap = serde_json::from_str(r#"{"0": [1, 2], "1": [2]}"#).unwrap();
//! assert_eq!(map.num_qubits(), 3);
//! assert!(map.has_edge(0, 1));
//! assert!(!map.has_edge(1, 0));
//! assert!(map.is_connected(1, 0));
//! ```

use std::collections::{BTreeMap, VecDeque};

use petgraph::algo::connected_components;
use petgraph::graphmap::UnGraphMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

const UNREACHABLE: u32 = u32::MAX;

/// Largest device a coupling map may describe. The distance tables are
/// `n × n`, so this bounds construction memory.
pub const MAX_QUBITS: u32 = 4096;

/// Directed coupling graph of a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<u32, Vec<u32>>",
    into = "BTreeMap<u32, Vec<u32>>"
)]
pub struct CouplingMap {
    /// Number of physical qubits.
    num_qubits: u32,
    /// Directed edges, sorted and deduplicated.
    edges: Vec<(u32, u32)>,
    /// Set view of `edges` for direction checks.
    directed: FxHashSet<(u32, u32)>,
    /// Undirected neighbors per qubit, sorted.
    adjacency: Vec<Vec<u32>>,
    /// `dist_matrix[from][to]`, or `UNREACHABLE`.
    dist_matrix: Vec<Vec<u32>>,
    /// `pred_matrix[from][to]` is the hop before `to` on a shortest path.
    pred_matrix: Vec<Vec<u32>>,
}

impl CouplingMap {
    /// Build a coupling map over `num_qubits` qubits from directed edges.
    ///
    /// Duplicate edges are merged. Self-loops and out-of-range endpoints
    /// are rejected.
    pub fn from_edges(
        num_qubits: u32,
        edges: impl IntoIterator<Item = (u32, u32)>,
    ) -> CompileResult<Self> {
        if num_qubits > MAX_QUBITS {
            return Err(CompileError::InvalidCouplingMap(format!(
                "{num_qubits} qubits exceeds the limit of {MAX_QUBITS}"
            )));
        }
        let mut list = Vec::new();
        for (a, b) in edges {
            if a == b {
                return Err(CompileError::InvalidCouplingMap(format!(
                    "self-loop on qubit {a}"
                )));
            }
            if a >= num_qubits || b >= num_qubits {
                return Err(CompileError::InvalidCouplingMap(format!(
                    "edge ({a}, {b}) is outside a {num_qubits}-qubit device"
                )));
            }
            list.push((a, b));
        }
        Ok(Self::build(num_qubits, list))
    }

    /// Build a coupling map from an adjacency mapping `{control: [targets]}`.
    ///
    /// The qubit count is one past the largest index mentioned.
    pub fn from_adjacency(adjacency: &BTreeMap<u32, Vec<u32>>) -> CompileResult<Self> {
        let num_qubits = match adjacency
            .iter()
            .flat_map(|(&c, targets)| std::iter::once(c).chain(targets.iter().copied()))
            .max()
        {
            Some(max) => max.checked_add(1).ok_or_else(|| {
                CompileError::InvalidCouplingMap(format!("qubit index {max} is out of range"))
            })?,
            None => 0,
        };
        let edges = adjacency
            .iter()
            .flat_map(|(&c, targets)| targets.iter().map(move |&t| (c, t)));
        Self::from_edges(num_qubits, edges)
    }

    fn build(num_qubits: u32, mut edges: Vec<(u32, u32)>) -> Self {
        edges.sort_unstable();
        edges.dedup();

        let n = num_qubits as usize;
        let mut adjacency = vec![Vec::new(); n];
        for &(a, b) in &edges {
            adjacency[a as usize].push(b);
            adjacency[b as usize].push(a);
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
            neighbors.dedup();
        }

        let directed = edges.iter().copied().collect();
        let mut map = Self {
            num_qubits,
            edges,
            directed,
            adjacency,
            dist_matrix: Vec::new(),
            pred_matrix: Vec::new(),
        };
        map.precompute_distances();
        map
    }

    /// All-pairs shortest paths over the undirected graph, one BFS per source.
    #[allow(clippy::cast_possible_truncation)]
    fn precompute_distances(&mut self) {
        let n = self.num_qubits as usize;
        self.dist_matrix = vec![vec![UNREACHABLE; n]; n];
        self.pred_matrix = vec![vec![UNREACHABLE; n]; n];

        for src in 0..n {
            self.dist_matrix[src][src] = 0;
            let mut queue = VecDeque::new();
            queue.push_back(src);

            while let Some(cur) = queue.pop_front() {
                for &neighbor in &self.adjacency[cur] {
                    let nb = neighbor as usize;
                    if self.dist_matrix[src][nb] == UNREACHABLE {
                        self.dist_matrix[src][nb] = self.dist_matrix[src][cur] + 1;
                        self.pred_matrix[src][nb] = cur as u32;
                        queue.push_back(nb);
                    }
                }
            }
        }
    }

    // =========================================================================
    // Presets
    // =========================================================================

    /// Linear chain `0 -> 1 -> ... -> n-1`.
    pub fn linear(n: u32) -> Self {
        Self::build(n, (1..n).map(|i| (i - 1, i)).collect())
    }

    /// Star with qubit 0 as the hub, `0 -> i` for every other qubit.
    pub fn star(n: u32) -> Self {
        Self::build(n, (1..n).map(|i| (0, i)).collect())
    }

    /// All-to-all, one direction per pair (low index to high).
    pub fn full(n: u32) -> Self {
        let edges = (0..n)
            .flat_map(|a| (a + 1..n).map(move |b| (a, b)))
            .collect();
        Self::build(n, edges)
    }

    /// The same device with every edge usable in both directions.
    #[must_use]
    pub fn symmetric(&self) -> Self {
        let edges = self
            .edges
            .iter()
            .flat_map(|&(a, b)| [(a, b), (b, a)])
            .collect();
        Self::build(self.num_qubits, edges)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get the number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Directed edges, sorted.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Undirected edges `(a, b)` with `a < b`, sorted.
    pub fn undirected_edges(&self) -> Vec<(u32, u32)> {
        let mut pairs: Vec<_> = self
            .edges
            .iter()
            .map(|&(a, b)| (a.min(b), a.max(b)))
            .collect();
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Whether the hardware runs a CX with this control and target.
    #[inline]
    pub fn has_edge(&self, control: u32, target: u32) -> bool {
        self.directed.contains(&(control, target))
    }

    /// Whether two qubits are coupled in either direction.
    #[inline]
    pub fn is_connected(&self, q1: u32, q2: u32) -> bool {
        self.has_edge(q1, q2) || self.has_edge(q2, q1)
    }

    /// Undirected neighbors of a qubit, sorted.
    pub fn neighbors(&self, qubit: u32) -> &[u32] {
        self.adjacency
            .get(qubit as usize)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of undirected neighbors.
    pub fn degree(&self, qubit: u32) -> usize {
        self.neighbors(qubit).len()
    }

    /// Shortest undirected distance, `None` if unreachable or out of range.
    pub fn distance(&self, from: u32, to: u32) -> Option<u32> {
        let d = *self.dist_matrix.get(from as usize)?.get(to as usize)?;
        (d != UNREACHABLE).then_some(d)
    }

    /// Shortest undirected path from `from` to `to`, both endpoints included.
    pub fn shortest_path(&self, from: u32, to: u32) -> Option<Vec<u32>> {
        self.distance(from, to)?;
        let preds = &self.pred_matrix[from as usize];

        let mut path = vec![to];
        let mut current = to;
        while current != from {
            current = preds[current as usize];
            if current == UNREACHABLE {
                return None;
            }
            path.push(current);
        }
        path.reverse();
        Some(path)
    }

    /// Whether `qubits` form one connected component of the undirected graph
    /// restricted to them. The empty set counts as connected.
    pub fn is_connected_subset(&self, qubits: &[u32]) -> bool {
        if qubits.iter().any(|&q| q >= self.num_qubits) {
            return false;
        }
        let members: FxHashSet<u32> = qubits.iter().copied().collect();
        let mut graph = UnGraphMap::<u32, ()>::new();
        for &q in &members {
            graph.add_node(q);
        }
        for &(a, b) in &self.edges {
            if members.contains(&a) && members.contains(&b) {
                graph.add_edge(a, b, ());
            }
        }
        connected_components(&graph) <= 1
    }

    /// The subgraph induced by `qubits`. Indices are preserved, so qubits
    /// outside the set remain as isolated nodes.
    #[must_use]
    pub fn induced(&self, qubits: &[u32]) -> Self {
        let members: FxHashSet<u32> = qubits.iter().copied().collect();
        let edges = self
            .edges
            .iter()
            .copied()
            .filter(|(a, b)| members.contains(a) && members.contains(b))
            .collect();
        Self::build(self.num_qubits, edges)
    }

    /// Adjacency mapping `{control: [targets]}` with an entry for every qubit.
    pub fn adjacency(&self) -> BTreeMap<u32, Vec<u32>> {
        let mut map: BTreeMap<u32, Vec<u32>> = (0..self.num_qubits).map(|q| (q, vec![])).collect();
        for &(a, b) in &self.edges {
            map.entry(a).or_default().push(b);
        }
        map
    }
}

impl PartialEq for CouplingMap {
    fn eq(&self, other: &Self) -> bool {
        self.num_qubits == other.num_qubits && self.edges == other.edges
    }
}

impl Eq for CouplingMap {}

impl TryFrom<BTreeMap<u32, Vec<u32>>> for CouplingMap {
    type Error = CompileError;

    fn try_from(adjacency: BTreeMap<u32, Vec<u32>>) -> CompileResult<Self> {
        Self::from_adjacency(&adjacency)
    }
}

impl From<CouplingMap> for BTreeMap<u32, Vec<u32>> {
    fn from(map: CouplingMap) -> Self {
        map.adjacency()
    }
}
