//! CX cancellation.

use rustc_hash::FxHashSet;
use tracing::debug;

use qmap_ir::{CircuitDag, NodeIndex, WireId};

use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// CX cancellation pass.
///
/// Removes pairs of CX gates with the same control and target that are
/// immediate successors of each other on both wires. Removing a pair can
/// make the gates around it adjacent, so the pass repeats until nothing
/// cancels.
#[derive(Debug, Default)]
pub struct CancelCX;

impl CancelCX {
    /// Create a new CX cancellation pass.
    pub fn new() -> Self {
        Self
    }

    /// Find disjoint pairs of adjacent identical CX gates.
    fn find_cancellable_pairs(dag: &CircuitDag) -> Vec<(NodeIndex, NodeIndex)> {
        let mut pairs = Vec::new();
        let mut claimed: FxHashSet<NodeIndex> = FxHashSet::default();

        for (node, inst) in dag.topological_ops() {
            if !inst.is_cx() || claimed.contains(&node) {
                continue;
            }
            let (control, target) = (WireId::Qubit(inst.qubits[0]), WireId::Qubit(inst.qubits[1]));
            let Some(next) = dag.successor_on_wire(node, control) else {
                continue;
            };
            if dag.successor_on_wire(node, target) != Some(next) || claimed.contains(&next) {
                continue;
            }
            let Some(next_inst) = dag.get_instruction(next) else {
                continue;
            };
            if next_inst.is_cx() && next_inst.qubits == inst.qubits {
                claimed.insert(node);
                claimed.insert(next);
                pairs.push((node, next));
            }
        }
        pairs
    }
}

impl Pass for CancelCX {
    fn name(&self) -> &'static str {
        "CancelCX"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, _properties: &mut PropertySet) -> CompileResult<()> {
        let mut removed = 0;
        loop {
            let pairs = Self::find_cancellable_pairs(dag);
            if pairs.is_empty() {
                break;
            }
            for (first, second) in pairs {
                dag.remove_op(first)?;
                dag.remove_op(second)?;
                removed += 2;
            }
        }
        debug!("Cancelled {} CX gates", removed);
        Ok(())
    }
}
