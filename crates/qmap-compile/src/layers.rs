//! Partition of a circuit into layers of wire-disjoint operations.
//!
//! A layer is the set of operations whose every predecessor has already
//! been emitted by an earlier layer. Because each wire is a total order,
//! two such operations can never share a wire, so every layer is a
//! parallel slice of the circuit. Concatenating the layers gives a
//! topological order of the DAG.
//!
//! ```
//! use qmap_compile::layers::layers;
//! use qmap_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("c", 3, 0);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.h(QubitId(2)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//!
//! let sizes: Vec<usize> = layers(circuit.dag()).map(|l| l.len()).collect();
//! assert_eq!(sizes, vec![2, 1]);
//! ```

use rustc_hash::FxHashMap;

use qmap_ir::{CircuitDag, NodeIndex, QubitId, WireId};

/// One parallel slice of the circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    nodes: Vec<NodeIndex>,
}

impl Layer {
    /// Operation nodes in this layer, in deterministic order.
    pub fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    /// Number of operations in the layer.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the layer is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Operand pairs of the two-qubit gates in this layer, control first.
    pub fn two_qubit_pairs(&self, dag: &CircuitDag) -> Vec<(QubitId, QubitId)> {
        self.nodes
            .iter()
            .filter_map(|&n| dag.get_instruction(n))
            .filter(|inst| inst.is_two_qubit_gate())
            .map(|inst| (inst.qubits[0], inst.qubits[1]))
            .collect()
    }
}

/// Lazy layer iterator over a DAG.
///
/// The iterator is `Clone`, and calling [`layers`] again restarts it from
/// the first layer.
#[derive(Debug, Clone)]
pub struct Layers<'a> {
    dag: &'a CircuitDag,
    /// Unemitted operation predecessors per node.
    pending: FxHashMap<NodeIndex, usize>,
    /// ASAP depth per node, used to order a layer.
    depth: FxHashMap<NodeIndex, usize>,
    ready: Vec<NodeIndex>,
}

/// Start iterating the layers of `dag`.
pub fn layers(dag: &CircuitDag) -> Layers<'_> {
    let mut pending = FxHashMap::default();
    let mut depth: FxHashMap<NodeIndex, usize> = FxHashMap::default();
    let mut ready = Vec::new();

    for node in dag.topological_order() {
        let Some(inst) = dag.get_instruction(node) else {
            continue;
        };
        let preds: Vec<NodeIndex> = wires_of(inst)
            .filter_map(|w| dag.predecessor_on_wire(node, w))
            .filter(|p| dag.get_instruction(*p).is_some())
            .collect();
        let d = preds.iter().filter_map(|p| depth.get(p)).max().map_or(0, |d| d + 1);
        depth.insert(node, d);
        let mut unique = preds;
        unique.sort_unstable();
        unique.dedup();
        if unique.is_empty() {
            ready.push(node);
        }
        pending.insert(node, unique.len());
    }

    Layers {
        dag,
        pending,
        depth,
        ready,
    }
}

fn wires_of(inst: &qmap_ir::Instruction) -> impl Iterator<Item = WireId> + '_ {
    inst.qubits
        .iter()
        .map(|&q| WireId::Qubit(q))
        .chain(inst.clbits.iter().map(|&c| WireId::Clbit(c)))
}

impl Layers<'_> {
    fn sort_key(&self, node: NodeIndex) -> (usize, u32, NodeIndex) {
        let min_qubit = self
            .dag
            .get_instruction(node)
            .and_then(|inst| inst.qubits.iter().map(|q| q.0).min())
            .unwrap_or(u32::MAX);
        (
            self.depth.get(&node).copied().unwrap_or(0),
            min_qubit,
            node,
        )
    }
}

impl Iterator for Layers<'_> {
    type Item = Layer;

    fn next(&mut self) -> Option<Layer> {
        if self.ready.is_empty() {
            return None;
        }

        let mut nodes = std::mem::take(&mut self.ready);
        nodes.sort_by_key(|&n| self.sort_key(n));

        for &node in &nodes {
            let Some(inst) = self.dag.get_instruction(node) else {
                continue;
            };
            let mut successors: Vec<NodeIndex> = wires_of(inst)
                .filter_map(|w| self.dag.successor_on_wire(node, w))
                .filter(|s| self.dag.get_instruction(*s).is_some())
                .collect();
            successors.sort_unstable();
            successors.dedup();

            for succ in successors {
                if let Some(count) = self.pending.get_mut(&succ) {
                    *count -= 1;
                    if *count == 0 {
                        self.ready.push(succ);
                    }
                }
            }
        }

        Some(Layer { nodes })
    }
}
