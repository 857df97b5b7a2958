//! Built-in compilation passes.
//!
//! Passes are organized into two categories:
//! - [`agnostic`]: passes that only look at the DAG structure
//! - [`target`]: passes that need the coupling map or basis gates

pub mod agnostic;
pub mod target;

pub use agnostic::{CancelCX, Optimize1qGates};
pub use target::{
    BasisTranslation, DirectionMapper, InitialLayout, SetLayout, SwapMapper, SwapRecord,
    SwapSequence,
};
