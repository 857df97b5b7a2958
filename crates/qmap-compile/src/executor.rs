//! Execution contract for compiled circuits.
//!
//! The compiler does not run circuits itself. Anything that can, a
//! simulator or a device client, implements [`Executor`] and can then be
//! driven over a whole [`CompiledBatch`](crate::CompiledBatch).

use std::collections::BTreeMap;

use thiserror::Error;

use crate::bundle::CompiledCircuit;

/// Measurement outcomes: classical bit-string to number of shots.
pub type Counts = BTreeMap<String, u64>;

/// Errors reported while executing compiled circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecutionError {
    /// The circuit never compiled, so there is nothing to run.
    #[error("circuit '{name}' did not compile")]
    NotCompiled { name: String },

    /// The executor returned counts that do not add up to the request.
    #[error("counts sum to {actual} shots, expected {expected}")]
    ShotMismatch { expected: u64, actual: u64 },

    /// The executor itself failed.
    #[error("execution failed: {0}")]
    Backend(String),
}

/// Something that runs compiled circuits.
pub trait Executor: Send + Sync {
    /// Run `program` for `shots` shots and return the outcome counts.
    fn execute(&self, program: &CompiledCircuit, shots: u64) -> Result<Counts, ExecutionError>;
}

pub(crate) fn check_shots(counts: Counts, shots: u64) -> Result<Counts, ExecutionError> {
    let actual: u64 = counts.values().sum();
    if actual == shots {
        Ok(counts)
    } else {
        Err(ExecutionError::ShotMismatch {
            expected: shots,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompileOptions, Compiler};
    use qmap_ir::Circuit;

    /// Reports every shot as the all-zero outcome.
    struct ZeroExecutor;

    impl Executor for ZeroExecutor {
        fn execute(&self, program: &CompiledCircuit, shots: u64) -> Result<Counts, ExecutionError> {
            let width = program.circuit().num_clbits();
            Ok(Counts::from([("0".repeat(width), shots)]))
        }
    }

    /// Drops one shot.
    struct LossyExecutor;

    impl Executor for LossyExecutor {
        fn execute(&self, _program: &CompiledCircuit, shots: u64) -> Result<Counts, ExecutionError> {
            Ok(Counts::from([("0".to_string(), shots.saturating_sub(1))]))
        }
    }

    #[test]
    fn test_batch_execution() {
        let compiler = Compiler::new(CompileOptions::new().with_seed(5)).unwrap();
        let batch = compiler.compile_batch(vec![Circuit::bell().unwrap(), Circuit::ghz(3).unwrap()]);

        let results = batch.execute(&ZeroExecutor, 100);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "bell");
        assert_eq!(results[0].1.as_ref().unwrap().get("00"), Some(&100));
        assert_eq!(results[1].1.as_ref().unwrap().get("000"), Some(&100));
    }

    #[test]
    fn test_shot_total_checked() {
        let compiler = Compiler::new(CompileOptions::new().with_seed(5)).unwrap();
        let batch = compiler.compile_batch(vec![Circuit::bell().unwrap()]);

        let results = batch.execute(&LossyExecutor, 10);
        assert!(matches!(
            results[0].1,
            Err(ExecutionError::ShotMismatch {
                expected: 10,
                actual: 9
            })
        ));
    }

    #[test]
    fn test_failed_compile_not_executed() {
        let compiler = Compiler::new(
            CompileOptions::new()
                .with_coupling_map(crate::CouplingMap::linear(2))
                .with_seed(5),
        )
        .unwrap();
        let batch = compiler.compile_batch(vec![Circuit::ghz(3).unwrap()]);

        let results = batch.execute(&ZeroExecutor, 10);
        assert!(matches!(
            &results[0].1,
            Err(ExecutionError::NotCompiled { name }) if name == "ghz"
        ));
    }
}
