//! DAG-based circuit representation.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex as PetNodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// Node index type for the circuit DAG.
///
/// Indices stay valid across removals of other nodes.
pub type NodeIndex = PetNodeIndex<u32>;

/// A node in the circuit DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DagNode {
    /// Input node for a wire.
    In(WireId),
    /// Output node for a wire.
    Out(WireId),
    /// Operation node containing an instruction.
    Op(Instruction),
}

impl DagNode {
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

/// Identifier for a wire in the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireId {
    /// A quantum wire.
    Qubit(QubitId),
    /// A classical wire.
    Clbit(ClbitId),
}

impl From<QubitId> for WireId {
    fn from(q: QubitId) -> Self {
        WireId::Qubit(q)
    }
}

impl From<ClbitId> for WireId {
    fn from(c: ClbitId) -> Self {
        WireId::Clbit(c)
    }
}

/// An edge in the circuit DAG representing a wire segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagEdge {
    /// The wire this edge represents.
    pub wire: WireId,
}

/// The abstraction level of a circuit in the compilation pipeline.
///
/// Circuits start at the `Logical` level and are lowered to the `Physical`
/// level by the swap mapper, after which qubit ids name device qubits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CircuitLevel {
    /// Qubits are abstract program qubits.
    #[default]
    Logical,
    /// Qubits are physical device positions.
    Physical,
}

/// DAG-based circuit representation.
///
/// - Nodes are input nodes, output nodes, or operation nodes
/// - Edges are wire segments (quantum or classical)
/// - Each wire is a single path from its input node to its output node,
///   which gives every operation a total order along each of its wires
///
/// The graph is a `StableDiGraph`, so passes can hold node indices while
/// they remove or substitute other nodes.
#[derive(Debug, Clone, Default)]
pub struct CircuitDag {
    graph: StableDiGraph<DagNode, DagEdge, u32>,
    inputs: FxHashMap<WireId, NodeIndex>,
    outputs: FxHashMap<WireId, NodeIndex>,
    /// Node just before the output node of each wire.
    wire_front: FxHashMap<WireId, NodeIndex>,
    num_qubits: usize,
    num_clbits: usize,
    level: CircuitLevel,
}

impl CircuitDag {
    /// Create a new empty circuit DAG.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a qubit wire. Adding an existing qubit is a no-op.
    pub fn add_qubit(&mut self, qubit: QubitId) {
        if self.add_wire(WireId::Qubit(qubit)) {
            self.num_qubits += 1;
        }
    }

    /// Add a classical bit wire. Adding an existing bit is a no-op.
    pub fn add_clbit(&mut self, clbit: ClbitId) {
        if self.add_wire(WireId::Clbit(clbit)) {
            self.num_clbits += 1;
        }
    }

    fn add_wire(&mut self, wire: WireId) -> bool {
        if self.inputs.contains_key(&wire) {
            return false;
        }
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.inputs.insert(wire, in_node);
        self.outputs.insert(wire, out_node);
        self.wire_front.insert(wire, in_node);
        true
    }

    /// Wires touched by an instruction: its qubits, then its classical bits.
    fn instruction_wires(instruction: &Instruction) -> Vec<WireId> {
        instruction
            .qubits
            .iter()
            .map(|&q| WireId::Qubit(q))
            .chain(instruction.clbits.iter().map(|&c| WireId::Clbit(c)))
            .collect()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn validate(&self, instruction: &Instruction) -> IrResult<()> {
        let gate_name = instruction.is_gate().then(|| instruction.name().to_string());

        let expected = match &instruction.kind {
            InstructionKind::Gate(gate) => Some(gate.num_qubits() as usize),
            InstructionKind::Measure => Some(1),
            InstructionKind::Barrier => None,
        };
        if let Some(expected) = expected {
            if instruction.qubits.len() != expected {
                return Err(IrError::QubitCountMismatch {
                    gate_name: instruction.name().to_string(),
                    expected: expected as u32,
                    got: instruction.qubits.len() as u32,
                });
            }
        }
        if instruction.is_measure() && instruction.clbits.len() != 1 {
            return Err(IrError::InvalidDag(format!(
                "measure needs exactly one classical bit, got {}",
                instruction.clbits.len()
            )));
        }

        for &qubit in &instruction.qubits {
            if !self.inputs.contains_key(&WireId::Qubit(qubit)) {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }
        for &clbit in &instruction.clbits {
            if !self.inputs.contains_key(&WireId::Clbit(clbit)) {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Append an instruction at the end of its wires.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        self.validate(&instruction)?;

        let wires = Self::instruction_wires(&instruction);
        let op_node = self.graph.add_node(DagNode::Op(instruction));

        for wire in wires {
            let out_node = self.outputs[&wire];
            let prev_node = self.wire_front[&wire];

            let (edge, _) = self
                .neighbor_on_wire(prev_node, wire, Direction::Outgoing)
                .filter(|&(_, next)| next == out_node)
                .ok_or_else(|| {
                    IrError::InvalidDag(format!("Missing edge into output of wire {wire:?}"))
                })?;
            self.graph.remove_edge(edge);
            self.graph.add_edge(prev_node, op_node, DagEdge { wire });
            self.graph.add_edge(op_node, out_node, DagEdge { wire });
            self.wire_front.insert(wire, op_node);
        }

        Ok(op_node)
    }

    fn neighbor_on_wire(
        &self,
        node: NodeIndex,
        wire: WireId,
        direction: Direction,
    ) -> Option<(EdgeIndex<u32>, NodeIndex)> {
        self.graph
            .edges_directed(node, direction)
            .find(|e| e.weight().wire == wire)
            .map(|e| match direction {
                Direction::Outgoing => (e.id(), e.target()),
                Direction::Incoming => (e.id(), e.source()),
            })
    }

    /// The node immediately before `node` on `wire` (an op or the wire's input node).
    pub fn predecessor_on_wire(&self, node: NodeIndex, wire: WireId) -> Option<NodeIndex> {
        self.neighbor_on_wire(node, wire, Direction::Incoming)
            .map(|(_, n)| n)
    }

    /// The node immediately after `node` on `wire` (an op or the wire's output node).
    pub fn successor_on_wire(&self, node: NodeIndex, wire: WireId) -> Option<NodeIndex> {
        self.neighbor_on_wire(node, wire, Direction::Outgoing)
            .map(|(_, n)| n)
    }

    /// For every wire through an op node: `(wire, predecessor, successor)`.
    fn wire_links(&self, node: NodeIndex) -> IrResult<Vec<(WireId, NodeIndex, NodeIndex)>> {
        let instruction = self.get_instruction(node).ok_or(IrError::InvalidNode)?;
        Self::instruction_wires(instruction)
            .into_iter()
            .map(|wire| {
                let pred = self.predecessor_on_wire(node, wire);
                let succ = self.successor_on_wire(node, wire);
                match (pred, succ) {
                    (Some(p), Some(s)) => Ok((wire, p, s)),
                    _ => Err(IrError::InvalidDag(format!(
                        "Wire {wire:?} is broken around node {}",
                        node.index()
                    ))),
                }
            })
            .collect()
    }

    /// Node indices in a deterministic topological order.
    ///
    /// Kahn's algorithm; among ready nodes the lowest index goes first.
    pub fn topological_order(&self) -> Vec<NodeIndex> {
        let mut indegree: FxHashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|n| (n, self.graph.edges_directed(n, Direction::Incoming).count()))
            .collect();
        let mut ready: BinaryHeap<Reverse<NodeIndex>> = indegree
            .iter()
            .filter(|&(_, &d)| d == 0)
            .map(|(&n, _)| Reverse(n))
            .collect();

        let mut order = Vec::with_capacity(indegree.len());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                if let Some(d) = indegree.get_mut(&edge.target()) {
                    *d -= 1;
                    if *d == 0 {
                        ready.push(Reverse(edge.target()));
                    }
                }
            }
        }
        order
    }

    /// Iterate over operations in topological order.
    pub fn topological_ops(&self) -> impl Iterator<Item = (NodeIndex, &Instruction)> {
        self.topological_order()
            .into_iter()
            .filter_map(|idx| self.get_instruction(idx).map(|inst| (idx, inst)))
    }

    /// Iterate over operation nodes in index order.
    pub fn op_nodes(&self) -> impl Iterator<Item = (NodeIndex, &Instruction)> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.get_instruction(idx).map(|inst| (idx, inst)))
    }

    /// Operation nodes along one wire, from input to output.
    pub fn wire_ops(&self, wire: WireId) -> Vec<NodeIndex> {
        let mut ops = vec![];
        let Some(&start) = self.inputs.get(&wire) else {
            return ops;
        };
        let mut current = self.successor_on_wire(start, wire);
        while let Some(node) = current {
            if !self.graph[node].is_op() {
                break;
            }
            ops.push(node);
            current = self.successor_on_wire(node, wire);
        }
        ops
    }

    /// Get an instruction by node index.
    #[inline]
    pub fn get_instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(DagNode::instruction)
    }

    /// Get a node by index.
    #[inline]
    pub fn node(&self, node: NodeIndex) -> Option<&DagNode> {
        self.graph.node_weight(node)
    }

    /// Remove an operation node, reconnecting each of its wires.
    pub fn remove_op(&mut self, node: NodeIndex) -> IrResult<Instruction> {
        match self.graph.node_weight(node) {
            Some(DagNode::Op(_)) => {}
            Some(_) => {
                return Err(IrError::InvalidDag(
                    "Cannot remove non-operation node".into(),
                ));
            }
            None => return Err(IrError::InvalidNode),
        }
        let links = self.wire_links(node)?;

        let Some(DagNode::Op(instruction)) = self.graph.remove_node(node) else {
            return Err(IrError::InvalidNode);
        };
        for (wire, pred, succ) in links {
            self.graph.add_edge(pred, succ, DagEdge { wire });
            if self.wire_front.get(&wire) == Some(&node) {
                self.wire_front.insert(wire, pred);
            }
        }
        Ok(instruction)
    }

    /// Replace an operation node, in place, by a sequence of instructions.
    ///
    /// The replacement may only touch the wires of the node it replaces; it
    /// is spliced between the node's predecessors and successors on each
    /// wire. An empty replacement removes the node.
    pub fn substitute_node(
        &mut self,
        node: NodeIndex,
        replacement: impl IntoIterator<Item = Instruction>,
    ) -> IrResult<Vec<NodeIndex>> {
        let replacement: Vec<Instruction> = replacement.into_iter().collect();
        let original = self.get_instruction(node).ok_or(IrError::InvalidNode)?;
        let allowed: FxHashSet<WireId> = Self::instruction_wires(original).into_iter().collect();

        for inst in &replacement {
            self.validate(inst)?;
            if let Some(wire) = Self::instruction_wires(inst)
                .into_iter()
                .find(|w| !allowed.contains(w))
            {
                return Err(IrError::InvalidDag(format!(
                    "Replacement '{}' touches wire {wire:?} outside the substituted node",
                    inst.name()
                )));
            }
        }

        let links = self.wire_links(node)?;
        let front_wires: Vec<WireId> = links
            .iter()
            .filter(|(wire, _, _)| self.wire_front.get(wire) == Some(&node))
            .map(|&(wire, _, _)| wire)
            .collect();
        self.graph.remove_node(node);

        let mut last: FxHashMap<WireId, NodeIndex> =
            links.iter().map(|&(wire, pred, _)| (wire, pred)).collect();
        let mut new_nodes = Vec::with_capacity(replacement.len());
        for inst in replacement {
            let wires = Self::instruction_wires(&inst);
            let idx = self.graph.add_node(DagNode::Op(inst));
            for wire in wires {
                if let Some(prev) = last.insert(wire, idx) {
                    self.graph.add_edge(prev, idx, DagEdge { wire });
                }
            }
            new_nodes.push(idx);
        }

        for (wire, _, succ) in links {
            if let Some(&prev) = last.get(&wire) {
                self.graph.add_edge(prev, succ, DagEdge { wire });
            }
        }
        for wire in front_wires {
            if let Some(&prev) = last.get(&wire) {
                self.wire_front.insert(wire, prev);
            }
        }
        Ok(new_nodes)
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get the number of classical bits.
    #[inline]
    pub fn num_clbits(&self) -> usize {
        self.num_clbits
    }

    /// Get the number of operations.
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.graph
            .node_count()
            .saturating_sub(2 * self.inputs.len())
    }

    /// Operation counts keyed by instruction name.
    pub fn count_ops(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for (_, inst) in self.op_nodes() {
            *counts.entry(inst.name().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Calculate the circuit depth.
    pub fn depth(&self) -> usize {
        let mut depths: FxHashMap<NodeIndex, usize> =
            FxHashMap::with_capacity_and_hasher(self.graph.node_count(), Default::default());
        let mut max_depth = 0usize;

        for node in self.topological_order() {
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

    /// Qubits in ascending order.
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        let mut qubits: Vec<QubitId> = self
            .inputs
            .keys()
            .filter_map(|w| match w {
                WireId::Qubit(q) => Some(*q),
                WireId::Clbit(_) => None,
            })
            .collect();
        qubits.sort_unstable();
        qubits.into_iter()
    }

    /// Classical bits in ascending order.
    pub fn clbits(&self) -> impl Iterator<Item = ClbitId> + '_ {
        let mut clbits: Vec<ClbitId> = self
            .inputs
            .keys()
            .filter_map(|w| match w {
                WireId::Clbit(c) => Some(*c),
                WireId::Qubit(_) => None,
            })
            .collect();
        clbits.sort_unstable();
        clbits.into_iter()
    }

    /// Get the abstraction level of this circuit.
    pub fn level(&self) -> CircuitLevel {
        self.level
    }

    /// Set the abstraction level of this circuit.
    pub fn set_level(&mut self, level: CircuitLevel) {
        self.level = level;
    }

    /// Verify the structural integrity of the DAG.
    ///
    /// Checks that the graph is acyclic, that every wire is one unbroken
    /// path from its input to its output node, and that every operation
    /// node has exactly one incoming and one outgoing edge per operand wire.
    pub fn verify_integrity(&self) -> IrResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(IrError::InvalidDag("Graph contains a cycle".into()));
        }

        for (&wire, &in_node) in &self.inputs {
            let out_node = self.outputs.get(&wire).copied().ok_or_else(|| {
                IrError::InvalidDag(format!("Wire {wire:?} has an In node but no Out node"))
            })?;

            let mut current = in_node;
            let mut steps = 0;
            while current != out_node {
                current = self.successor_on_wire(current, wire).ok_or_else(|| {
                    IrError::InvalidDag(format!(
                        "Wire {wire:?} is broken: no outgoing edge from node {}",
                        current.index()
                    ))
                })?;
                steps += 1;
                if steps > self.graph.node_count() {
                    return Err(IrError::InvalidDag(format!(
                        "Wire {wire:?} does not terminate"
                    )));
                }
            }
        }

        for (node, inst) in self.op_nodes() {
            let wires = Self::instruction_wires(inst);
            let incoming = self.graph.edges_directed(node, Direction::Incoming).count();
            let outgoing = self.graph.edges_directed(node, Direction::Outgoing).count();
            if incoming != wires.len() || outgoing != wires.len() {
                return Err(IrError::InvalidDag(format!(
                    "Operation '{}' at node {} has {incoming} in / {outgoing} out edges for {} wires",
                    inst.name(),
                    node.index(),
                    wires.len()
                )));
            }
        }

        if self.topological_order().len() != self.graph.node_count() {
            return Err(IrError::InvalidDag(
                "Unreachable operation node found in DAG".into(),
            ));
        }

        Ok(())
    }
}
