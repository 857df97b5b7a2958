//! qmap: a connectivity-aware routing compiler for quantum circuits.
//!
//! This crate rewrites logical circuits so they run on hardware where only
//! some qubit pairs can interact. It places logical qubits on the device,
//! inserts swaps where a two-qubit gate spans uncoupled qubits, fixes the
//! orientation of every CX, and finally cleans up with cancellation and
//! single-qubit fusion.
//!
//! # Architecture
//!
//! ```text
//! Circuit
//!       │
//!       ▼
//! ┌─────────────┐
//! │ PassManager │ ◄── PropertySet (coupling map, basis gates, layout)
//! └─────────────┘
//!       │
//!       ├── BasisTranslation         u1/u2/u3/cx/id
//!       ├── SetLayout                 ┐
//!       ├── SwapMapper                ├ only with a coupling map
//!       ├── DirectionMapper           ┘
//!       ├── CancelCX
//!       └── Optimize1qGates
//!       │
//!       ▼
//! CompiledCircuit (circuit, layouts, basis, seed) ──► OpenQASM 2.0
//! ```
//!
//! # Example: Routing a GHZ circuit
//!
//! ```rust
//! use qmap_compile::{CompileOptions, Compiler, CouplingMap};
//! use qmap_ir::Circuit;
//!
//! let compiler = Compiler::new(
//!     CompileOptions::new()
//!         .with_coupling_map(CouplingMap::star(5))
//!         .with_seed(42),
//! )
//! .unwrap();
//!
//! let compiled = compiler.compile(Circuit::ghz(5).unwrap()).unwrap();
//! let map = compiled.coupling_map().unwrap();
//! for (_, inst) in compiled.circuit().dag().topological_ops() {
//!     if inst.is_cx() {
//!         assert!(map.has_edge(inst.qubits[0].0, inst.qubits[1].0));
//!     }
//! }
//! println!("{}", compiled.qasm().unwrap());
//! ```
//!
//! # Custom Passes
//!
//! Implement the [`Pass`] trait to create custom compilation passes:
//!
//! ```rust
//! use qmap_compile::{Pass, PassKind, PassManager, CompileResult, PropertySet};
//! use qmap_ir::CircuitDag;
//!
//! struct CountOps;
//!
//! impl Pass for CountOps {
//!     fn name(&self) -> &str { "count_ops" }
//!     fn kind(&self) -> PassKind { PassKind::Analysis }
//!
//!     fn run(&self, dag: &mut CircuitDag, props: &mut PropertySet) -> CompileResult<()> {
//!         props.insert(dag.num_ops());
//!         Ok(())
//!     }
//! }
//!
//! let mut pm = PassManager::new();
//! pm.add_pass(CountOps);
//! ```

pub mod bundle;
pub mod coupling;
pub mod driver;
pub mod error;
pub mod executor;
pub mod layers;
pub mod manager;
pub mod pass;
pub mod property;
pub mod unitary;

// Built-in passes
pub mod passes;

pub use bundle::{CircuitConfig, CompileStats, CompiledBatch, CompiledCircuit};
pub use coupling::{CouplingMap, MAX_QUBITS};
pub use driver::{CompileOptions, Compiler};
pub use error::{CompileError, CompileResult, ErrorCategory};
pub use executor::{Counts, ExecutionError, Executor};
pub use layers::{Layer, Layers, layers};
pub use manager::{PassManager, PassManagerBuilder};
pub use pass::{Pass, PassKind};
pub use property::{BasisGates, Layout, PropertySet};
