//! Optimization passes.

mod cancel;
mod optimize_1q;


pub use cancel::CancelCX;
pub use optimize_1q::Optimize1qGates;
