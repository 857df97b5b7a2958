//! Layout pass for mapping logical qubits to physical qubits.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use tracing::debug;

use qmap_ir::{CircuitDag, QubitId};

use crate::coupling::CouplingMap;
use crate::error::{CompileError, CompileResult};
use crate::layers::layers;
use crate::pass::{Pass, PassKind};
use crate::property::{Layout, PropertySet};

/// The layout chosen before routing, published for callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialLayout(pub Layout);

/// Layout pass.
///
/// Uses the caller's layout when one is given, after checking that it
/// places every circuit qubit on an existing physical qubit and that the
/// occupied physical qubits form a connected region. Otherwise a layout is
/// grown from the first layer of two-qubit gates: each pair is put on a
/// free coupling edge next to the qubits already placed, and the remaining
/// qubits fill free neighbors breadth-first, preferring high degree.
#[derive(Debug, Clone, Default)]
pub struct SetLayout {
    initial: Option<Layout>,
}

impl SetLayout {
    /// Compute a layout automatically.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed layout.
    pub fn with_layout(layout: Layout) -> Self {
        Self {
            initial: Some(layout),
        }
    }
}

impl Pass for SetLayout {
    fn name(&self) -> &'static str {
        "SetLayout"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let coupling_map = properties
            .coupling_map
            .as_ref()
            .ok_or(CompileError::MissingCouplingMap)?;

        let num_logical = dag.num_qubits();
        if num_logical > coupling_map.num_qubits() as usize {
            return Err(CompileError::CircuitTooLarge {
                required: num_logical,
                available: coupling_map.num_qubits(),
            });
        }

        let layout = match &self.initial {
            Some(layout) => layout.clone(),
            None => place_qubits(dag, coupling_map)?,
        };
        check_layout(&layout, dag, coupling_map)?;
        debug!("Initial layout: {:?}", layout.iter().collect::<Vec<_>>());

        properties.insert(InitialLayout(layout.clone()));
        properties.layout = Some(layout);
        Ok(())
    }
}

/// Verify that `layout` covers exactly the circuit's qubits and occupies a
/// connected set of existing physical qubits.
fn check_layout(layout: &Layout, dag: &CircuitDag, coupling_map: &CouplingMap) -> CompileResult<()> {
    for qubit in dag.qubits() {
        if layout.get_physical(qubit).is_none() {
            return Err(CompileError::LayoutIncomplete { qubit });
        }
    }
    let circuit_qubits: FxHashSet<QubitId> = dag.qubits().collect();
    for (logical, physical) in layout.iter() {
        if !circuit_qubits.contains(&logical) {
            return Err(CompileError::InvalidLayout(format!(
                "logical qubit {logical} is not part of the circuit"
            )));
        }
        if physical >= coupling_map.num_qubits() {
            return Err(CompileError::InvalidLayout(format!(
                "physical qubit {physical} does not exist on a {}-qubit device",
                coupling_map.num_qubits()
            )));
        }
    }

    let physical = layout.physical_qubits();
    if !coupling_map.is_connected_subset(&physical) {
        return Err(CompileError::LayoutDisconnected { physical });
    }
    Ok(())
}

/// Grow a connected layout seeded by the first layer of two-qubit gates.
fn place_qubits(dag: &CircuitDag, coupling_map: &CouplingMap) -> CompileResult<Layout> {
    let needed = dag.num_qubits();
    let component_size = component_sizes(coupling_map);
    let mut layout = Layout::new();
    let mut used: FxHashSet<u32> = FxHashSet::default();

    let pairs = layers(dag)
        .map(|layer| layer.two_qubit_pairs(dag))
        .find(|pairs| !pairs.is_empty())
        .unwrap_or_default();

    for (a, b) in pairs {
        let Some((pa, pb)) = best_edge(coupling_map, &used, &component_size, needed) else {
            break;
        };
        layout.add(a, pa);
        layout.add(b, pb);
        used.insert(pa);
        used.insert(pb);
    }

    for qubit in dag.qubits() {
        if layout.get_physical(qubit).is_some() {
            continue;
        }
        let candidates: Vec<u32> = if used.is_empty() {
            (0..coupling_map.num_qubits())
                .filter(|&p| component_size[p as usize] >= needed)
                .collect()
        } else {
            frontier(coupling_map, &used)
        };
        let Some(physical) = candidates
            .into_iter()
            .max_by_key(|&p| (coupling_map.degree(p), std::cmp::Reverse(p)))
        else {
            let mut physical: Vec<u32> = used.into_iter().collect();
            physical.sort_unstable();
            return Err(CompileError::LayoutDisconnected { physical });
        };
        layout.add(qubit, physical);
        used.insert(physical);
    }

    Ok(layout)
}

/// Pick a directed edge with both ends free, touching the placed region
/// when there is one. Ties prefer the higher combined degree, then the
/// lowest edge in sort order.
fn best_edge(
    coupling_map: &CouplingMap,
    used: &FxHashSet<u32>,
    component_size: &[usize],
    needed: usize,
) -> Option<(u32, u32)> {
    let touches = |p: u32| {
        coupling_map
            .neighbors(p)
            .iter()
            .any(|n| used.contains(n))
    };

    coupling_map
        .edges()
        .iter()
        .copied()
        .filter(|(p, q)| !used.contains(p) && !used.contains(q))
        .filter(|&(p, q)| {
            if used.is_empty() {
                component_size[p as usize] >= needed
            } else {
                touches(p) || touches(q)
            }
        })
        .map(|(p, q)| {
            let score = coupling_map.degree(p) + coupling_map.degree(q);
            (score, (p, q))
        })
        .fold(None, |best: Option<(usize, (u32, u32))>, cand| match best {
            Some(b) if b.0 >= cand.0 => Some(b),
            _ => Some(cand),
        })
        .map(|(_, edge)| edge)
}

/// Free physical qubits adjacent to the placed region, sorted.
fn frontier(coupling_map: &CouplingMap, used: &FxHashSet<u32>) -> Vec<u32> {
    let mut free: Vec<u32> = used
        .iter()
        .flat_map(|&p| coupling_map.neighbors(p).iter().copied())
        .filter(|n| !used.contains(n))
        .collect();
    free.sort_unstable();
    free.dedup();
    free
}

/// Size of the undirected connected component containing each qubit.
#[allow(clippy::cast_possible_truncation)]
fn component_sizes(coupling_map: &CouplingMap) -> Vec<usize> {
    let n = coupling_map.num_qubits() as usize;
    let mut sizes = vec![0; n];
    let mut seen = vec![false; n];

    for start in 0..n {
        if seen[start] {
            continue;
        }
        let mut members = Vec::new();
        let mut queue = VecDeque::from([start]);
        seen[start] = true;
        while let Some(cur) = queue.pop_front() {
            members.push(cur);
            for &nb in coupling_map.neighbors(cur as u32) {
                if !seen[nb as usize] {
                    seen[nb as usize] = true;
                    queue.push_back(nb as usize);
                }
            }
        }
        for &m in &members {
            sizes[m] = members.len();
        }
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::BasisGates;
    use qmap_ir::Circuit;

    fn run_layout(circuit: Circuit, map: CouplingMap, pass: SetLayout) -> CompileResult<Layout> {
        let mut dag = circuit.into_dag();
        let mut props = PropertySet::new().with_target(map, BasisGates::default());
        pass.run(&mut dag, &mut props)?;
        assert_eq!(
            props.get::<InitialLayout>().map(|l| &l.0),
            props.layout.as_ref()
        );
        Ok(props.layout.unwrap())
    }

    #[test]
    fn test_fixed_layout_is_kept() {
        let circuit = Circuit::ghz(3).unwrap();
        let layout = Layout::from_physical(&[2, 1, 0]).unwrap();
        let result =
            run_layout(circuit, CouplingMap::linear(4), SetLayout::with_layout(layout.clone()))
                .unwrap();
        assert_eq!(result, layout);
    }

    #[test]
    fn test_circuit_too_large() {
        let circuit = Circuit::ghz(6).unwrap();
        let result = run_layout(circuit, CouplingMap::linear(5), SetLayout::new());
        assert!(matches!(
            result,
            Err(CompileError::CircuitTooLarge {
                required: 6,
                available: 5
            })
        ));
    }

    #[test]
    fn test_incomplete_layout() {
        let circuit = Circuit::ghz(3).unwrap();
        let layout = Layout::from_physical(&[0, 1]).unwrap();
        let result = run_layout(circuit, CouplingMap::linear(4), SetLayout::with_layout(layout));
        assert!(matches!(
            result,
            Err(CompileError::LayoutIncomplete { qubit: QubitId(2) })
        ));
    }

    #[test]
    fn test_disconnected_layout() {
        let circuit = Circuit::ghz(2).unwrap();
        let layout = Layout::from_physical(&[0, 2]).unwrap();
        let result = run_layout(circuit, CouplingMap::linear(4), SetLayout::with_layout(layout));
        assert!(matches!(
            result,
            Err(CompileError::LayoutDisconnected { physical }) if physical == vec![0, 2]
        ));
    }

    #[test]
    fn test_layout_outside_device() {
        let circuit = Circuit::ghz(2).unwrap();
        let layout = Layout::from_physical(&[3, 4]).unwrap();
        let result = run_layout(circuit, CouplingMap::linear(4), SetLayout::with_layout(layout));
        assert!(matches!(result, Err(CompileError::InvalidLayout(_))));
    }

    #[test]
    fn test_auto_layout_places_first_pair_on_edge() {
        let mut circuit = Circuit::with_size("c", 2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(1), QubitId(0)).unwrap();
        let map = CouplingMap::star(5);
        let layout = run_layout(circuit, map.clone(), SetLayout::new()).unwrap();

        let p1 = layout.get_physical(QubitId(1)).unwrap();
        let p0 = layout.get_physical(QubitId(0)).unwrap();
        assert!(map.has_edge(p1, p0));
    }

    #[test]
    fn test_auto_layout_is_connected() {
        let circuit = Circuit::ghz(5).unwrap();
        let map = CouplingMap::from_edges(8, [(0, 1), (1, 2), (2, 3), (3, 4), (5, 6), (6, 7)])
            .unwrap();
        let layout = run_layout(circuit, map.clone(), SetLayout::new()).unwrap();
        assert_eq!(layout.len(), 5);
        assert!(map.is_connected_subset(&layout.physical_qubits()));
    }

    #[test]
    fn test_auto_layout_without_two_qubit_gates() {
        let mut circuit = Circuit::with_size("c", 3, 0);
        circuit.h(QubitId(0)).unwrap();
        let map = CouplingMap::linear(6);
        let layout = run_layout(circuit, map.clone(), SetLayout::new()).unwrap();
        assert_eq!(layout.len(), 3);
        assert!(map.is_connected_subset(&layout.physical_qubits()));
    }
}
