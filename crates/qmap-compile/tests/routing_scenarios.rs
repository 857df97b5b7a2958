//! End-to-end compilation scenarios.
//!
//! Each test compiles a small program through [`Compiler`] and checks the
//! routed result against the device it was compiled for.

use std::collections::BTreeMap;

use qmap_compile::{
    CircuitConfig, CompileError, CompileOptions, CompiledCircuit, Compiler, CouplingMap,
    ErrorCategory, Layout,
};
use qmap_ir::{Circuit, ClbitId, QubitId};

/// Helper: count CX gates in a compiled circuit.
fn cx_count(compiled: &CompiledCircuit) -> usize {
    compiled
        .circuit()
        .dag()
        .topological_ops()
        .filter(|(_, inst)| inst.is_cx())
        .count()
}

/// Helper: assert every CX runs on a forward edge of the device.
fn assert_forward_edges(compiled: &CompiledCircuit) {
    let map = compiled.coupling_map().unwrap();
    for (_, inst) in compiled.circuit().dag().topological_ops() {
        if inst.is_cx() {
            let (c, t) = (inst.qubits[0].0, inst.qubits[1].0);
            assert!(map.has_edge(c, t), "cx {c},{t} is not a device edge");
        }
    }
}

fn coupling(adjacency: &[(u32, &[u32])]) -> CouplingMap {
    let map: BTreeMap<u32, Vec<u32>> = adjacency
        .iter()
        .map(|&(c, targets)| (c, targets.to_vec()))
        .collect();
    CouplingMap::from_adjacency(&map).unwrap()
}

fn compiler(options: CompileOptions) -> Compiler {
    Compiler::new(options).unwrap()
}

// ============================================================================
// Documented device scenarios
// ============================================================================

#[test]
fn test_chain_program_on_star_device() {
    let mut circuit = Circuit::with_size("chain", 4, 0);
    circuit.cx(QubitId(0), QubitId(1)).unwrap();
    circuit.cx(QubitId(1), QubitId(2)).unwrap();
    circuit.cx(QubitId(2), QubitId(3)).unwrap();

    let compiled = compiler(
        CompileOptions::new()
            .with_coupling_map(coupling(&[(0, &[1, 2, 3])]))
            .with_seed(1),
    )
    .compile(circuit)
    .unwrap();

    assert!(cx_count(&compiled) >= 5, "got {}", cx_count(&compiled));
    assert!(!compiled.swaps().is_empty());
    assert_forward_edges(&compiled);
}

#[test]
fn test_triangle_device_needs_no_swaps() {
    let mut circuit = Circuit::with_size("tri", 3, 3);
    circuit.h(QubitId(0)).unwrap();
    circuit.cx(QubitId(0), QubitId(1)).unwrap();
    circuit.cx(QubitId(1), QubitId(2)).unwrap();
    circuit.cx(QubitId(2), QubitId(0)).unwrap();
    for q in 0..3 {
        circuit.measure(QubitId(q), ClbitId(q)).unwrap();
    }

    let compiled = compiler(
        CompileOptions::new()
            .with_coupling_map(coupling(&[(0, &[1, 2]), (1, &[2])]))
            .with_initial_layout(Layout::trivial(3))
            .with_seed(1),
    )
    .compile(circuit)
    .unwrap();

    assert_eq!(cx_count(&compiled), 3);
    assert!(compiled.swaps().is_empty());
    assert_eq!(compiled.final_layout(), &Layout::trivial(3));
    assert_forward_edges(&compiled);
}

#[test]
fn test_line_device_inserts_swap_gates() {
    let mut circuit = Circuit::with_size("far", 3, 1);
    circuit.h(QubitId(0)).unwrap();
    circuit.cx(QubitId(0), QubitId(2)).unwrap();
    circuit.measure(QubitId(2), ClbitId(0)).unwrap();

    let unrouted = compiler(CompileOptions::new().with_seed(1))
        .compile(circuit.clone())
        .unwrap();
    let routed = compiler(
        CompileOptions::new()
            .with_coupling_map(coupling(&[(0, &[1]), (1, &[2])]))
            .with_initial_layout(Layout::trivial(3))
            .with_seed(1),
    )
    .compile(circuit)
    .unwrap();

    assert_eq!(cx_count(&unrouted), 1);
    assert_eq!(routed.swaps().len(), 1);
    assert_eq!(cx_count(&routed), 4);
    assert_forward_edges(&routed);
    assert_ne!(routed.final_layout(), &Layout::trivial(3));
}

// ============================================================================
// Pipeline behavior
// ============================================================================

#[test]
fn test_no_coupling_map_preserves_program() {
    let mut circuit = Circuit::with_size("plain", 3, 2);
    circuit.h(QubitId(0)).unwrap();
    circuit.cx(QubitId(0), QubitId(2)).unwrap();
    circuit.cx(QubitId(2), QubitId(1)).unwrap();
    circuit.measure(QubitId(1), ClbitId(0)).unwrap();
    circuit.measure(QubitId(2), ClbitId(1)).unwrap();

    let compiled = compiler(CompileOptions::new().with_seed(4))
        .compile(circuit)
        .unwrap();

    assert_eq!(compiled.final_layout(), &Layout::trivial(3));
    assert_eq!(compiled.initial_layout(), &Layout::trivial(3));
    let cx: Vec<_> = compiled
        .circuit()
        .dag()
        .topological_ops()
        .filter(|(_, inst)| inst.is_cx())
        .map(|(_, inst)| (inst.qubits[0].0, inst.qubits[1].0))
        .collect();
    assert_eq!(cx, vec![(0, 2), (2, 1)]);
    assert_eq!(compiled.circuit().dag().count_ops().get("measure"), Some(&2));
    assert!(compiled.config().layout.is_none());
}

#[test]
fn test_same_seed_same_swaps() {
    let mut circuit = Circuit::with_size("mix", 5, 0);
    for (c, t) in [(0, 4), (1, 3), (4, 2), (0, 3), (2, 1), (3, 4)] {
        circuit.cx(QubitId(c), QubitId(t)).unwrap();
    }
    let options = CompileOptions::new()
        .with_coupling_map(CouplingMap::linear(5))
        .with_initial_layout(Layout::trivial(5))
        .with_seed(2024);

    let first = compiler(options.clone()).compile(circuit.clone()).unwrap();
    let second = compiler(options).compile(circuit).unwrap();

    assert!(!first.swaps().is_empty());
    assert_eq!(first.swaps(), second.swaps());
    assert_eq!(first.qasm().unwrap(), second.qasm().unwrap());
    assert_eq!(first.final_layout(), second.final_layout());
}

#[test]
fn test_measurements_follow_routed_qubits() {
    let mut circuit = Circuit::with_size("measure", 3, 3);
    circuit.cx(QubitId(0), QubitId(2)).unwrap();
    for q in 0..3 {
        circuit.measure(QubitId(q), ClbitId(q)).unwrap();
    }

    let compiled = compiler(
        CompileOptions::new()
            .with_coupling_map(CouplingMap::linear(3))
            .with_initial_layout(Layout::trivial(3))
            .with_seed(8),
    )
    .compile(circuit)
    .unwrap();

    let layout = compiled.final_layout();
    for (_, inst) in compiled.circuit().dag().topological_ops() {
        if inst.is_measure() {
            let logical = QubitId(inst.clbits[0].0);
            assert_eq!(layout.get_physical(logical), Some(inst.qubits[0].0));
        }
    }
}

#[test]
fn test_qasm_declares_physical_register() {
    let compiled = compiler(
        CompileOptions::new()
            .with_coupling_map(CouplingMap::linear(4))
            .with_seed(1),
    )
    .compile(Circuit::bell().unwrap())
    .unwrap();

    let qasm = compiled.qasm().unwrap();
    assert!(qasm.contains("qreg q[4];"));
    assert!(qasm.contains("creg c[2];"));
    assert!(qasm.contains("cx "));
}

#[test]
fn test_config_serializes_adjacency() {
    let compiled = compiler(
        CompileOptions::new()
            .with_coupling_map(CouplingMap::linear(2))
            .with_seed(77),
    )
    .compile(Circuit::bell().unwrap())
    .unwrap();

    let config = compiled.config();
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["seed"], 77);
    assert_eq!(json["coupling_map"]["0"], serde_json::json!([1]));
    assert_eq!(json["basis_gates"], serde_json::json!(["u1", "u2", "u3", "cx", "id"]));

    let back: CircuitConfig = serde_json::from_value(json).unwrap();
    assert_eq!(back, config);
}

// ============================================================================
// Errors and batches
// ============================================================================

#[test]
fn test_disconnected_device_is_a_layout_error() {
    let err = compiler(
        CompileOptions::new()
            .with_coupling_map(coupling(&[(0, &[1]), (2, &[3])]))
            .with_seed(1),
    )
    .compile(Circuit::ghz(3).unwrap())
    .unwrap_err();

    assert!(matches!(err, CompileError::LayoutDisconnected { .. }));
    assert_eq!(err.category(), ErrorCategory::Layout);
}

#[test]
fn test_circuit_larger_than_device() {
    let err = compiler(CompileOptions::new().with_coupling_map(CouplingMap::linear(2)))
        .compile(Circuit::ghz(3).unwrap())
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Layout);
}

#[test]
fn test_batch_reports_each_circuit() {
    let compiler = compiler(
        CompileOptions::new()
            .with_coupling_map(CouplingMap::linear(3))
            .with_seed(6),
    );
    let batch = compiler.compile_batch(vec![
        Circuit::bell().unwrap(),
        Circuit::ghz(4).unwrap(),
        Circuit::ghz(3).unwrap(),
    ]);

    assert_eq!(batch.names(), vec!["bell", "ghz", "ghz"]);
    assert_eq!(batch.len(), 3);
    assert!(batch.qasm("bell").unwrap().is_ok());
    // The first "ghz" is too large for the device and shadows the second.
    assert!(batch.result("ghz").unwrap().is_err());
    assert!(batch.qasm("ghz").is_none());
    assert!(batch.diagnostics("ghz").unwrap().contains("compilation failed"));
    assert_eq!(batch.failures().count(), 1);
    assert!(batch.config("missing").is_none());

    let diagnostics = batch.diagnostics("bell").unwrap();
    assert!(diagnostics.contains("seed: 6"));
    assert!(diagnostics.contains("basis: u1, u2, u3, cx, id"));
}
