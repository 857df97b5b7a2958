use proptest::prelude::*;
use qmap_ir::{Circuit, QubitId};
use qmap_qasm::{emit, format_angle};

proptest! {
    #[test]
    fn every_operation_is_one_statement(
        gates in prop::collection::vec((0u32..3, 0u32..3, -6.0f64..6.0), 0..40),
    ) {
        let mut circuit = Circuit::with_size("random", 3, 0);
        for (a, b, angle) in &gates {
            if a == b {
                circuit.u1(*angle, QubitId(*a)).unwrap();
            } else {
                circuit.cx(QubitId(*a), QubitId(*b)).unwrap();
            }
        }

        let qasm = emit(&circuit).unwrap();
        let statements = qasm.lines().filter(|l| l.ends_with(';')).count();
        // Header, include and one register declaration.
        prop_assert_eq!(statements, gates.len() + 3);
    }

    #[test]
    fn decimal_angles_parse_back(value in -10.0f64..10.0) {
        let text = format_angle(value);
        if !text.contains("pi") {
            let parsed: f64 = text.parse().unwrap();
            prop_assert!((parsed - value).abs() < 1e-12);
        }
    }
}
