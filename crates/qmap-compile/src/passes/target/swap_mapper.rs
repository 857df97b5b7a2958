//! Randomized swap mapper.
//!
//! The circuit is walked layer by layer. Before a layer is emitted, every
//! two-qubit gate in it must act on coupled physical qubits under the
//! current layout. When that does not hold, a batch of independent trials
//! each build a swap sequence by repeatedly choosing, at random, a swap
//! that lowers the layer cost; swaps with a larger reduction are more
//! likely to be picked. The shortest successful sequence wins and is
//! emitted in front of the layer as CX triples. A layer whose gates can
//! never be adjacent at the same time, such as two disjoint gates on a star,
//! is routed again one operation at a time.
//!
//! Routing is confined to the physical qubits occupied by the layout, so
//! the routed circuit never touches a qubit the layout left free.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use qmap_ir::{CircuitDag, CircuitLevel, ClbitId, NodeIndex, QubitId};

use crate::coupling::CouplingMap;
use crate::error::{CompileError, CompileResult};
use crate::layers::layers;
use crate::pass::{Pass, PassKind};
use crate::passes::target::translation::swap_as_cx;
use crate::property::{Layout, PropertySet};

/// A swap inserted by routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRecord {
    /// Index of the layer the swap was inserted before.
    pub layer: usize,
    /// The two physical qubits exchanged.
    pub physical: (u32, u32),
}

/// Every swap inserted by routing, in circuit order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapSequence(pub Vec<SwapRecord>);

/// Randomized swap mapper pass.
#[derive(Debug, Clone)]
pub struct SwapMapper {
    seed: u64,
    trials: usize,
    swap_cap: Option<usize>,
}

impl SwapMapper {
    /// Trials per layer unless configured otherwise.
    pub const DEFAULT_TRIALS: usize = 20;

    /// Create a mapper whose random choices are driven by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            trials: Self::DEFAULT_TRIALS,
            swap_cap: None,
        }
    }

    /// Set the number of trials per layer (at least one).
    #[must_use]
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials.max(1);
        self
    }

    /// Override the per-trial swap limit, which otherwise is
    /// `max(n², 4)` for `n` occupied physical qubits.
    #[must_use]
    pub fn with_swap_cap(mut self, cap: usize) -> Self {
        self.swap_cap = Some(cap);
        self
    }

    /// Best swap sequence for one layer over `trials` attempts.
    fn search(
        &self,
        region: &CouplingMap,
        candidates: &[(u32, u32)],
        pairs: &[(u32, u32)],
        cap: usize,
        rng: &mut StdRng,
    ) -> Option<Vec<(u32, u32)>> {
        let mut best: Option<Vec<(u32, u32)>> = None;
        for _ in 0..self.trials {
            let Some(swaps) = trial(region, candidates, pairs, cap, rng) else {
                continue;
            };
            if best.as_ref().is_none_or(|b| swaps.len() < b.len()) {
                best = Some(swaps);
            }
            if best.as_ref().is_some_and(|b| b.len() <= 1) {
                break;
            }
        }
        best
    }
}

impl Pass for SwapMapper {
    fn name(&self) -> &'static str {
        "SwapMapper"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let coupling_map = properties
            .coupling_map
            .clone()
            .ok_or(CompileError::MissingCouplingMap)?;
        let layout = properties
            .layout
            .clone()
            .ok_or(CompileError::MissingLayout)?;

        let occupied = layout.physical_qubits();
        if !coupling_map.is_connected_subset(&occupied) {
            return Err(CompileError::LayoutDisconnected { physical: occupied });
        }
        let region = coupling_map.induced(&occupied);

        let mut routed = CircuitDag::new();
        for p in 0..coupling_map.num_qubits() {
            routed.add_qubit(QubitId(p));
        }
        for clbit in dag.clbits().collect::<Vec<ClbitId>>() {
            routed.add_clbit(clbit);
        }
        routed.set_level(CircuitLevel::Physical);

        let mut router = Router {
            mapper: self,
            candidates: region.undirected_edges(),
            cap: self.swap_cap.unwrap_or_else(|| default_swap_cap(occupied.len())),
            region,
            rng: StdRng::seed_from_u64(self.seed),
            layout,
            routed,
            records: Vec::new(),
        };

        for (index, layer) in layers(dag).enumerate() {
            if router.route(dag, index, layer.nodes())? {
                continue;
            }
            // The layer's gates cannot all be adjacent at once, so route
            // them one at a time.
            debug!("Layer {}: routing {} ops serially", index, layer.len());
            for node in layer.nodes() {
                if !router.route(dag, index, std::slice::from_ref(node))? {
                    return Err(CompileError::RoutingFailed {
                        layer: index,
                        trials: self.trials,
                    });
                }
            }
        }

        info!(
            "Routing inserted {} swaps over {} physical qubits",
            router.records.len(),
            occupied.len()
        );

        *dag = router.routed;
        properties.layout = Some(router.layout);
        properties.insert(SwapSequence(router.records));
        Ok(())
    }

    fn should_run(&self, _dag: &CircuitDag, properties: &PropertySet) -> bool {
        properties.coupling_map.is_some()
    }
}

/// Mutable state of one routing run.
struct Router<'a> {
    mapper: &'a SwapMapper,
    region: CouplingMap,
    candidates: Vec<(u32, u32)>,
    cap: usize,
    rng: StdRng,
    layout: Layout,
    routed: CircuitDag,
    records: Vec<SwapRecord>,
}

impl Router<'_> {
    /// Route a group of wire-disjoint nodes: insert swaps until every
    /// two-qubit gate among them is coupled, then emit them on physical
    /// qubits. Returns `false`, emitting nothing, when no trial succeeds.
    fn route(&mut self, dag: &CircuitDag, layer: usize, nodes: &[NodeIndex]) -> CompileResult<bool> {
        let pairs = nodes
            .iter()
            .filter_map(|&n| dag.get_instruction(n))
            .filter(|inst| inst.is_two_qubit_gate())
            .map(|inst| {
                Ok((
                    physical_of(&self.layout, inst.qubits[0])?,
                    physical_of(&self.layout, inst.qubits[1])?,
                ))
            })
            .collect::<CompileResult<Vec<_>>>()?;

        if layer_cost(&self.region, &pairs) != Some(0) {
            let Some(swaps) =
                self.mapper
                    .search(&self.region, &self.candidates, &pairs, self.cap, &mut self.rng)
            else {
                return Ok(false);
            };
            debug!("Layer {}: inserting {} swaps", layer, swaps.len());

            for (a, b) in swaps {
                for inst in swap_as_cx(QubitId(a), QubitId(b)) {
                    self.routed.apply(inst)?;
                }
                self.layout.swap(a, b);
                self.records.push(SwapRecord {
                    layer,
                    physical: (a, b),
                });
            }
        }

        for &node in nodes {
            let Some(inst) = dag.get_instruction(node) else {
                continue;
            };
            let mapped = inst.try_map_qubits(|q| physical_of(&self.layout, q).map(QubitId))?;
            self.routed.apply(mapped)?;
        }
        Ok(true)
    }
}

/// Upper bound on swaps in a single trial.
fn default_swap_cap(occupied: usize) -> usize {
    (occupied * occupied).max(4)
}

fn physical_of(layout: &Layout, qubit: QubitId) -> CompileResult<u32> {
    layout
        .get_physical(qubit)
        .ok_or(CompileError::LayoutIncomplete { qubit })
}

/// Sum over gate operand positions of the hops beyond adjacency.
/// `None` when a pair cannot be brought together at all.
fn layer_cost(region: &CouplingMap, positions: &[(u32, u32)]) -> Option<u32> {
    let mut cost = 0;
    for &(a, b) in positions {
        cost += region.distance(a, b)?.saturating_sub(1);
    }
    Some(cost)
}

/// One randomized attempt at satisfying a layer.
///
/// `pairs` holds the physical qubits of each gate's operands; the trial
/// moves them around and never touches the real layout.
fn trial(
    region: &CouplingMap,
    candidates: &[(u32, u32)],
    pairs: &[(u32, u32)],
    cap: usize,
    rng: &mut StdRng,
) -> Option<Vec<(u32, u32)>> {
    let mut positions: Vec<(u32, u32)> = pairs.to_vec();
    let mut swaps = Vec::new();

    loop {
        let cost = layer_cost(region, &positions)?;
        if cost == 0 {
            return Some(swaps);
        }
        if swaps.len() >= cap {
            return None;
        }

        let mut improving = Vec::new();
        let mut weights = Vec::new();
        for &(a, b) in candidates {
            let moved = apply_swap(&positions, a, b);
            let new_cost = layer_cost(region, &moved)?;
            if new_cost < cost {
                let gain = u64::from(cost - new_cost);
                improving.push((a, b));
                weights.push(gain * gain);
            }
        }

        let choice = if improving.is_empty() {
            step_toward(region, &positions, rng)?
        } else {
            let dist = WeightedIndex::new(&weights).ok()?;
            improving[dist.sample(rng)]
        };

        positions = apply_swap(&positions, choice.0, choice.1);
        swaps.push(choice);
    }
}

/// Operand positions after exchanging physical qubits `a` and `b`.
fn apply_swap(positions: &[(u32, u32)], a: u32, b: u32) -> Vec<(u32, u32)> {
    let relabel = |p: u32| {
        if p == a {
            b
        } else if p == b {
            a
        } else {
            p
        }
    };
    positions
        .iter()
        .map(|&(x, y)| (relabel(x), relabel(y)))
        .collect()
}

/// Fallback move: advance one end of a random unsatisfied gate one hop
/// along a shortest path to its partner.
fn step_toward(
    region: &CouplingMap,
    positions: &[(u32, u32)],
    rng: &mut StdRng,
) -> Option<(u32, u32)> {
    let unsatisfied: Vec<(u32, u32)> = positions
        .iter()
        .copied()
        .filter(|&(a, b)| region.distance(a, b).is_none_or(|d| d > 1))
        .collect();
    if unsatisfied.is_empty() {
        return None;
    }
    let (a, b) = unsatisfied[rng.gen_range(0..unsatisfied.len())];
    let path = region.shortest_path(a, b)?;
    Some((path[0], path[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::BasisGates;
    use qmap_ir::Circuit;

    fn route(circuit: Circuit, map: CouplingMap, layout: Layout, seed: u64) -> (CircuitDag, PropertySet) {
        let mut dag = circuit.into_dag();
        let mut props = PropertySet::new()
            .with_target(map, BasisGates::default())
            .with_layout(layout);
        SwapMapper::new(seed).run(&mut dag, &mut props).unwrap();
        (dag, props)
    }

    fn assert_all_coupled(dag: &CircuitDag, map: &CouplingMap) {
        for (_, inst) in dag.op_nodes() {
            if inst.is_two_qubit_gate() {
                assert!(
                    map.is_connected(inst.qubits[0].0, inst.qubits[1].0),
                    "{:?} is not coupled",
                    inst.qubits
                );
            }
        }
    }

    #[test]
    fn test_no_swaps_when_satisfied() {
        let mut circuit = Circuit::with_size("c", 3, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.cx(QubitId(1), QubitId(2)).unwrap();
        let (dag, props) = route(circuit, CouplingMap::linear(3), Layout::trivial(3), 1);

        assert_eq!(dag.num_ops(), 2);
        assert_eq!(dag.level(), CircuitLevel::Physical);
        assert!(props.get::<SwapSequence>().unwrap().0.is_empty());
        assert_eq!(props.layout, Some(Layout::trivial(3)));
    }

    #[test]
    fn test_chain_needs_one_swap() {
        let mut circuit = Circuit::with_size("c", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        let map = CouplingMap::linear(3);
        let (dag, props) = route(circuit, map.clone(), Layout::trivial(3), 7);

        let swaps = &props.get::<SwapSequence>().unwrap().0;
        assert_eq!(swaps.len(), 1);
        assert_eq!(swaps[0].layer, 0);
        assert_eq!(dag.count_ops().get("cx"), Some(&4));
        assert_all_coupled(&dag, &map);

        let layout = props.layout.unwrap();
        let (p0, p2) = (
            layout.get_physical(QubitId(0)).unwrap(),
            layout.get_physical(QubitId(2)).unwrap(),
        );
        assert!(map.is_connected(p0, p2));
    }

    #[test]
    fn test_star_chain() {
        let mut circuit = Circuit::with_size("c", 4, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.cx(QubitId(1), QubitId(2)).unwrap();
        circuit.cx(QubitId(2), QubitId(3)).unwrap();
        let map = CouplingMap::star(4);
        let (dag, props) = route(circuit, map.clone(), Layout::trivial(4), 42);

        assert_all_coupled(&dag, &map);
        let swaps = props.get::<SwapSequence>().unwrap().0.len();
        assert!(swaps >= 1);
        assert_eq!(dag.count_ops().get("cx"), Some(&(3 + 3 * swaps)));
    }

    #[test]
    fn test_star_layer_routed_serially() {
        // Every star edge uses the hub, so these two gates never fit in one layer.
        let mut circuit = Circuit::with_size("c", 4, 0);
        circuit.cx(QubitId(1), QubitId(2)).unwrap();
        circuit.cx(QubitId(3), QubitId(0)).unwrap();
        let map = CouplingMap::star(4);
        let (dag, props) = route(circuit, map.clone(), Layout::trivial(4), 5);

        assert_all_coupled(&dag, &map);
        let swaps = props.get::<SwapSequence>().unwrap().0.len();
        assert!(swaps >= 1);
        assert_eq!(dag.count_ops().get("cx"), Some(&(2 + 3 * swaps)));
        assert!(props.get::<SwapSequence>().unwrap().0.iter().all(|s| s.layer == 0));
    }

    #[test]
    fn test_routing_stays_in_occupied_region() {
        let mut circuit = Circuit::with_size("c", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        circuit.cx(QubitId(1), QubitId(0)).unwrap();
        let map = CouplingMap::linear(6);
        let layout = Layout::from_physical(&[2, 3, 4]).unwrap();
        let (dag, _) = route(circuit, map.clone(), layout, 3);

        assert_eq!(dag.num_qubits(), 6);
        for (_, inst) in dag.op_nodes() {
            for q in &inst.qubits {
                assert!((2..=4).contains(&q.0), "touched {q}");
            }
        }
        assert_all_coupled(&dag, &map);
    }

    #[test]
    fn test_same_seed_same_result() {
        let build = || {
            let mut circuit = Circuit::with_size("c", 5, 0);
            for (a, b) in [(0, 4), (1, 3), (2, 0), (4, 1), (3, 2)] {
                circuit.cx(QubitId(a), QubitId(b)).unwrap();
            }
            circuit
        };
        let map = CouplingMap::linear(5);
        let (a, pa) = route(build(), map.clone(), Layout::trivial(5), 99);
        let (b, pb) = route(build(), map, Layout::trivial(5), 99);

        assert_eq!(pa.get::<SwapSequence>(), pb.get::<SwapSequence>());
        let ops = |dag: &CircuitDag| -> Vec<(String, Vec<QubitId>)> {
            dag.topological_ops()
                .map(|(_, i)| (i.name().to_string(), i.qubits.clone()))
                .collect()
        };
        assert_eq!(ops(&a), ops(&b));
    }

    #[test]
    fn test_measurements_follow_layout() {
        let mut circuit = Circuit::with_size("c", 2, 1);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.measure(QubitId(1), ClbitId(0)).unwrap();
        let layout = Layout::from_physical(&[2, 0]).unwrap();
        let (dag, _) = route(circuit, CouplingMap::star(3), layout, 0);
        // Physical 2 and 0 are coupled through the hub, no swap needed.
        let measure = dag
            .topological_ops()
            .find(|(_, i)| i.is_measure())
            .map(|(_, i)| i.clone())
            .unwrap();
        assert_eq!(measure.qubits, vec![QubitId(0)]);
        assert_eq!(measure.clbits, vec![ClbitId(0)]);
    }

    #[test]
    fn test_disconnected_layout_rejected() {
        let circuit = Circuit::with_size("c", 2, 0);
        let mut dag = circuit.into_dag();
        let mut props = PropertySet::new()
            .with_target(CouplingMap::linear(4), BasisGates::default())
            .with_layout(Layout::from_physical(&[0, 3]).unwrap());
        assert!(matches!(
            SwapMapper::new(0).run(&mut dag, &mut props),
            Err(CompileError::LayoutDisconnected { .. })
        ));
    }

    #[test]
    fn test_default_swap_cap() {
        assert_eq!(default_swap_cap(1), 4);
        assert_eq!(default_swap_cap(3), 9);
    }

    #[test]
    fn test_zero_swap_cap_fails_routing() {
        let mut circuit = Circuit::with_size("c", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        let mut dag = circuit.into_dag();
        let mut props = PropertySet::new()
            .with_target(CouplingMap::linear(3), BasisGates::default())
            .with_layout(Layout::trivial(3));

        let result = SwapMapper::new(1)
            .with_trials(3)
            .with_swap_cap(0)
            .run(&mut dag, &mut props);
        assert!(matches!(
            result,
            Err(CompileError::RoutingFailed { layer: 0, trials: 3 })
        ));
    }

    #[test]
    fn test_swap_cap_of_one_is_enough_for_a_chain() {
        let mut circuit = Circuit::with_size("c", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        let mut dag = circuit.into_dag();
        let mut props = PropertySet::new()
            .with_target(CouplingMap::linear(3), BasisGates::default())
            .with_layout(Layout::trivial(3));

        SwapMapper::new(1)
            .with_swap_cap(1)
            .run(&mut dag, &mut props)
            .unwrap();
        assert_eq!(props.get::<SwapSequence>().unwrap().0.len(), 1);
    }
}
