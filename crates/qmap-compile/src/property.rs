//! `PropertySet` and related types for pass communication.
//!
//! Passes share data through a [`PropertySet`]: the target description
//! (coupling map and basis), the current [`Layout`], and any typed value a
//! pass wants to publish for later passes or for the caller.
//!
//! # Examples
//!
//! ```
//! use qmap_compile::{BasisGates, CouplingMap, PropertySet};
//!
//! let props = PropertySet::new().with_target(CouplingMap::linear(5), BasisGates::default());
//!
//! assert!(props.coupling_map.is_some());
//! assert!(props.basis_gates.as_ref().unwrap().contains("u3"));
//! ```
//!
//! Custom properties are keyed by type:
//!
//! ```
//! use qmap_compile::PropertySet;
//!
//! #[derive(Debug, PartialEq)]
//! struct RemovedGates(usize);
//!
//! let mut props = PropertySet::new();
//! props.insert(RemovedGates(4));
//! assert_eq!(props.get::<RemovedGates>(), Some(&RemovedGates(4)));
//! ```

use std::any::{Any, TypeId};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use qmap_ir::QubitId;

use crate::coupling::CouplingMap;
use crate::error::{CompileError, CompileResult};

/// A bijective mapping from logical qubits to physical qubits.
///
/// Serialized as a list of `[logical, physical]` pairs sorted by logical id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(u32, u32)>", into = "Vec<(u32, u32)>")]
pub struct Layout {
    /// Map from logical qubit to physical qubit index.
    logical_to_physical: FxHashMap<QubitId, u32>,
    /// Map from physical qubit index to logical qubit.
    physical_to_logical: FxHashMap<u32, QubitId>,
}

impl Layout {
    /// Create a new empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a trivial layout (logical qubit i -> physical qubit i).
    pub fn trivial(num_qubits: u32) -> Self {
        let mut layout = Self::new();
        for i in 0..num_qubits {
            layout.add(QubitId(i), i);
        }
        layout
    }

    /// Build a layout from explicit pairs, rejecting any repeated logical or
    /// physical qubit.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (QubitId, u32)>) -> CompileResult<Self> {
        let mut layout = Self::new();
        for (logical, physical) in pairs {
            if layout.logical_to_physical.contains_key(&logical) {
                return Err(CompileError::InvalidLayout(format!(
                    "logical qubit {logical} is placed twice"
                )));
            }
            if let Some(other) = layout.physical_to_logical.get(&physical) {
                return Err(CompileError::InvalidLayout(format!(
                    "physical qubit {physical} is shared by {other} and {logical}"
                )));
            }
            layout.add(logical, physical);
        }
        Ok(layout)
    }

    /// Build a layout where logical qubit `i` sits on `physical[i]`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_physical(physical: &[u32]) -> CompileResult<Self> {
        Self::from_pairs(
            physical
                .iter()
                .enumerate()
                .map(|(i, &p)| (QubitId(i as u32), p)),
        )
    }

    /// Add a mapping from logical to physical qubit.
    ///
    /// Any existing mapping of either qubit is dropped first so both
    /// directions stay consistent.
    pub fn add(&mut self, logical: QubitId, physical: u32) {
        if let Some(old_logical) = self.physical_to_logical.remove(&physical) {
            self.logical_to_physical.remove(&old_logical);
        }
        if let Some(old_physical) = self.logical_to_physical.remove(&logical) {
            self.physical_to_logical.remove(&old_physical);
        }
        self.logical_to_physical.insert(logical, physical);
        self.physical_to_logical.insert(physical, logical);
    }

    /// Get the physical qubit for a logical qubit.
    pub fn get_physical(&self, logical: QubitId) -> Option<u32> {
        self.logical_to_physical.get(&logical).copied()
    }

    /// Get the logical qubit for a physical qubit.
    pub fn get_logical(&self, physical: u32) -> Option<QubitId> {
        self.physical_to_logical.get(&physical).copied()
    }

    /// Exchange the logical qubits held by two physical qubits.
    ///
    /// Either side may be unoccupied, in which case the occupant simply moves.
    pub fn swap(&mut self, p1: u32, p2: u32) {
        let l1 = self.physical_to_logical.remove(&p1);
        let l2 = self.physical_to_logical.remove(&p2);

        if let Some(l1) = l1 {
            self.logical_to_physical.insert(l1, p2);
            self.physical_to_logical.insert(p2, l1);
        }
        if let Some(l2) = l2 {
            self.logical_to_physical.insert(l2, p1);
            self.physical_to_logical.insert(p1, l2);
        }
    }

    /// Get the number of mapped qubits.
    pub fn len(&self) -> usize {
        self.logical_to_physical.len()
    }

    /// Check if the layout is empty.
    pub fn is_empty(&self) -> bool {
        self.logical_to_physical.is_empty()
    }

    /// Iterate over `(logical, physical)` pairs in logical order.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, u32)> + '_ {
        let mut pairs: Vec<_> = self
            .logical_to_physical
            .iter()
            .map(|(&l, &p)| (l, p))
            .collect();
        pairs.sort_unstable();
        pairs.into_iter()
    }

    /// Occupied physical qubits, sorted.
    pub fn physical_qubits(&self) -> Vec<u32> {
        let mut physical: Vec<u32> = self.physical_to_logical.keys().copied().collect();
        physical.sort_unstable();
        physical
    }
}

impl TryFrom<Vec<(u32, u32)>> for Layout {
    type Error = CompileError;

    fn try_from(pairs: Vec<(u32, u32)>) -> CompileResult<Self> {
        Self::from_pairs(pairs.into_iter().map(|(l, p)| (QubitId(l), p)))
    }
}

impl From<Layout> for Vec<(u32, u32)> {
    fn from(layout: Layout) -> Self {
        layout.iter().map(|(l, p)| (l.0, p)).collect()
    }
}

/// Gate names the compiler can target.
pub const SUPPORTED_BASIS: &[&str] = &["u1", "u2", "u3", "cx", "id"];

/// Gates that every basis implicitly contains.
const NON_UNITARY: &[&str] = &["measure", "barrier"];

/// Basis gates for the target device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasisGates {
    /// List of gate names in the basis.
    gates: Vec<String>,
}

impl BasisGates {
    /// Create a new basis gates set.
    pub fn new(gates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            gates: gates.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if a gate is in the basis.
    pub fn contains(&self, gate: &str) -> bool {
        NON_UNITARY.contains(&gate) || self.gates.iter().any(|g| g == gate)
    }

    /// Get the basis gates.
    pub fn gates(&self) -> &[String] {
        &self.gates
    }

    /// Check that the basis can express every compiled circuit.
    ///
    /// `u3` and `cx` are required. Other names must come from
    /// [`SUPPORTED_BASIS`]; `measure` and `barrier` are always accepted.
    pub fn validate(&self) -> CompileResult<()> {
        let mut seen = FxHashSet::default();
        for gate in &self.gates {
            if !SUPPORTED_BASIS.contains(&gate.as_str()) && !NON_UNITARY.contains(&gate.as_str()) {
                return Err(CompileError::InvalidBasis(format!(
                    "gate '{gate}' cannot be targeted; supported gates are {}",
                    SUPPORTED_BASIS.join(", ")
                )));
            }
            if !seen.insert(gate.as_str()) {
                return Err(CompileError::InvalidBasis(format!(
                    "gate '{gate}' is listed twice"
                )));
            }
        }
        for required in ["u3", "cx"] {
            if !self.contains(required) {
                return Err(CompileError::InvalidBasis(format!(
                    "basis must contain '{required}'"
                )));
            }
        }
        Ok(())
    }
}

impl Default for BasisGates {
    /// The `u1, u2, u3, cx, id` basis.
    fn default() -> Self {
        Self::new(SUPPORTED_BASIS.iter().copied())
    }
}

/// Properties shared between compilation passes.
///
/// # Standard Properties
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `layout` | [`Layout`] | Current logical-to-physical mapping |
/// | `coupling_map` | [`CouplingMap`] | Device connectivity, shared read-only |
/// | `basis_gates` | [`BasisGates`] | Native gate set for the target |
///
/// # Custom Properties
///
/// Passes can store arbitrary data using the type-keyed [`insert`](Self::insert)
/// and [`get`](Self::get) methods. Each type can have at most one value stored.
#[derive(Debug, Default)]
pub struct PropertySet {
    /// Qubit layout mapping (logical -> physical).
    ///
    /// Set by the layout pass and advanced by routing.
    pub layout: Option<Layout>,

    /// Target coupling map. Absent when compiling for all-to-all hardware.
    pub coupling_map: Option<Arc<CouplingMap>>,

    /// Target basis gates.
    pub basis_gates: Option<BasisGates>,

    /// Custom properties storage (type-erased).
    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PropertySet {
    /// Create a new empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a property set with target configuration.
    #[must_use]
    pub fn with_target(
        mut self,
        coupling_map: impl Into<Arc<CouplingMap>>,
        basis_gates: BasisGates,
    ) -> Self {
        self.coupling_map = Some(coupling_map.into());
        self.basis_gates = Some(basis_gates);
        self
    }

    /// Set the layout.
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Insert a custom property.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Get a mutable custom property.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.custom
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Remove a custom property.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.custom
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_trivial() {
        let layout = Layout::trivial(5);
        assert_eq!(layout.get_physical(QubitId(0)), Some(0));
        assert_eq!(layout.get_physical(QubitId(4)), Some(4));
        assert_eq!(layout.get_logical(2), Some(QubitId(2)));
    }

    #[test]
    fn test_layout_swap() {
        let mut layout = Layout::trivial(3);
        layout.swap(0, 2);

        assert_eq!(layout.get_physical(QubitId(0)), Some(2));
        assert_eq!(layout.get_physical(QubitId(2)), Some(0));
        assert_eq!(layout.get_logical(0), Some(QubitId(2)));
        assert_eq!(layout.get_logical(2), Some(QubitId(0)));
    }

    #[test]
    fn test_layout_swap_with_free_qubit() {
        let mut layout = Layout::from_physical(&[1]).unwrap();
        layout.swap(1, 3);
        assert_eq!(layout.get_physical(QubitId(0)), Some(3));
        assert_eq!(layout.get_logical(1), None);
        assert_eq!(layout.physical_qubits(), vec![3]);
    }

    #[test]
    fn test_layout_rejects_duplicates() {
        assert!(matches!(
            Layout::from_physical(&[2, 2]),
            Err(CompileError::InvalidLayout(_))
        ));
        assert!(matches!(
            Layout::from_pairs([(QubitId(0), 1), (QubitId(0), 2)]),
            Err(CompileError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_layout_serde() {
        let layout = Layout::from_physical(&[3, 0]).unwrap();
        let json = serde_json::to_string(&layout).unwrap();
        assert_eq!(json, "[[0,3],[1,0]]");
        let back: Layout = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layout);
        assert!(serde_json::from_str::<Layout>("[[0,1],[1,1]]").is_err());
    }

    #[test]
    fn test_basis_gates() {
        let basis = BasisGates::default();
        assert!(basis.contains("u2"));
        assert!(basis.contains("measure"));
        assert!(!basis.contains("h"));
        basis.validate().unwrap();

        BasisGates::new(["u3", "cx"]).validate().unwrap();
        assert!(BasisGates::new(["u1", "u2", "cx"]).validate().is_err());
        assert!(BasisGates::new(["u3", "cx", "h"]).validate().is_err());
        assert!(BasisGates::new(["u3", "cx", "cx"]).validate().is_err());
    }

    #[test]
    #[allow(clippy::items_after_statements)]
    fn test_property_set_custom() {
        let mut props = PropertySet::new();

        #[derive(Debug, PartialEq)]
        struct CustomData(i32);

        props.insert(CustomData(42));
        assert_eq!(props.get::<CustomData>(), Some(&CustomData(42)));

        let removed = props.remove::<CustomData>();
        assert_eq!(removed, Some(CustomData(42)));
        assert_eq!(props.get::<CustomData>(), None);
    }
}
