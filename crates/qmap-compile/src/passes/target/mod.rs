//! Target-specific compilation passes.
//!
//! These passes read the coupling map, basis gates and layout from the
//! [`PropertySet`](crate::property::PropertySet) and turn a logical circuit
//! into one the device can run.

pub mod direction;
pub mod layout;
pub mod swap_mapper;
pub mod translation;

pub use direction::DirectionMapper;
pub use layout::{InitialLayout, SetLayout};
pub use swap_mapper::{SwapMapper, SwapRecord, SwapSequence};
pub use translation::BasisTranslation;
