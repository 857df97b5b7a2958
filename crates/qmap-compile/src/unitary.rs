//! 2x2 unitary matrices for single-qubit gate fusion.
//!
//! Every single-qubit gate is turned into its matrix, runs are multiplied
//! together, and the product is read back as `u3(theta, phi, lambda)` up to
//! a global phase.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use num_complex::Complex64;
use qmap_ir::StandardGate;

/// Tolerance for identity checks and angle classification.
pub const EPSILON: f64 = 1e-9;

/// A 2x2 unitary matrix in row-major order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unitary2x2 {
    /// The matrix elements in row-major order: [[a, b], [c, d]].
    pub data: [Complex64; 4],
}

impl Unitary2x2 {
    /// Create a new 2x2 matrix from its entries.
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { data: [a, b, c, d] }
    }

    /// Create the identity matrix.
    pub fn identity() -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0))
    }

    fn diagonal(a: Complex64, d: Complex64) -> Self {
        let zero = Complex64::new(0.0, 0.0);
        Self::new(a, zero, zero, d)
    }

    /// `diag(1, e^{i lambda})`.
    pub fn u1(lambda: f64) -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0), Complex64::from_polar(1.0, lambda))
    }

    /// `u2(phi, lambda) = u3(pi/2, phi, lambda)`.
    pub fn u2(phi: f64, lambda: f64) -> Self {
        Self::u3(FRAC_PI_2, phi, lambda)
    }

    /// The general single-qubit gate `u3(theta, phi, lambda)`.
    pub fn u3(theta: f64, phi: f64, lambda: f64) -> Self {
        let (s, c) = (theta / 2.0).sin_cos();
        Self::new(
            Complex64::new(c, 0.0),
            -Complex64::from_polar(s, lambda),
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        )
    }

    /// `rz(theta) = diag(e^{-i theta/2}, e^{i theta/2})`.
    pub fn rz(theta: f64) -> Self {
        Self::diagonal(
            Complex64::from_polar(1.0, -theta / 2.0),
            Complex64::from_polar(1.0, theta / 2.0),
        )
    }

    /// Matrix of a single-qubit gate; `None` for multi-qubit gates.
    pub fn from_gate(gate: &StandardGate) -> Option<Self> {
        let i = Complex64::new(0.0, 1.0);
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        let m = match *gate {
            StandardGate::I => Self::identity(),
            StandardGate::X => Self::new(zero, one, one, zero),
            StandardGate::Y => Self::new(zero, -i, i, zero),
            StandardGate::Z => Self::diagonal(one, -one),
            StandardGate::H => Self::u2(0.0, PI),
            StandardGate::S => Self::u1(FRAC_PI_2),
            StandardGate::Sdg => Self::u1(-FRAC_PI_2),
            StandardGate::T => Self::u1(FRAC_PI_4),
            StandardGate::Tdg => Self::u1(-FRAC_PI_4),
            StandardGate::Rx(theta) => {
                let (s, c) = (theta / 2.0).sin_cos();
                Self::new(c.into(), -i * s, -i * s, c.into())
            }
            StandardGate::Ry(theta) => {
                let (s, c) = (theta / 2.0).sin_cos();
                Self::new(c.into(), (-s).into(), s.into(), c.into())
            }
            StandardGate::Rz(theta) => Self::rz(theta),
            StandardGate::U1(lambda) => Self::u1(lambda),
            StandardGate::U2(phi, lambda) => Self::u2(phi, lambda),
            StandardGate::U3(theta, phi, lambda) => Self::u3(theta, phi, lambda),
            StandardGate::CX | StandardGate::CZ | StandardGate::Swap => return None,
        };
        Some(m)
    }

    /// Multiply this matrix by another: `self * other`.
    ///
    /// Applying `other` first and then `self` is `self * other`.
    #[allow(clippy::many_single_char_names)]
    pub fn mul(&self, other: &Self) -> Self {
        let [a, b, c, d] = self.data;
        let [e, f, g, h] = other.data;
        Self::new(a * e + b * g, a * f + b * h, c * e + d * g, c * f + d * h)
    }

    /// Get the conjugate transpose.
    pub fn dagger(&self) -> Self {
        let [a, b, c, d] = self.data;
        Self::new(a.conj(), c.conj(), b.conj(), d.conj())
    }

    /// Whether this is the identity up to global phase.
    pub fn is_identity(&self) -> bool {
        let [a, b, c, d] = self.data;
        b.norm() < EPSILON && c.norm() < EPSILON && (a - d).norm() < EPSILON
    }

    /// Whether two matrices agree up to global phase.
    pub fn approx_eq_up_to_phase(&self, other: &Self, tolerance: f64) -> bool {
        let Some(k) = (0..4).max_by(|&x, &y| self.data[x].norm().total_cmp(&self.data[y].norm()))
        else {
            return false;
        };
        if self.data[k].norm() < tolerance || other.data[k].norm() < tolerance {
            return false;
        }
        let phase = other.data[k] / self.data[k];
        let phase = phase / phase.norm();
        self.data
            .iter()
            .zip(&other.data)
            .all(|(a, b)| (a * phase - b).norm() < tolerance)
    }

    /// Canonical `(theta, phi, lambda)` with `self = e^{i g} u3(theta, phi, lambda)`.
    ///
    /// The global phase is chosen so the `(0,0)` entry is real and
    /// non-negative, or the `(1,0)` entry when `theta = pi`. `theta` lies in
    /// `[0, pi]`; `phi` and `lambda` are normalized to `(-pi, pi]`. When
    /// `theta` is zero only `phi + lambda` is meaningful and `phi` is zero.
    pub fn to_u3(&self) -> (f64, f64, f64) {
        let [a, b, c, d] = self.data;
        let theta = 2.0 * c.norm().atan2(a.norm());

        let phase = if a.norm() > EPSILON { a.arg() } else { c.arg() };
        let rot = Complex64::from_polar(1.0, -phase);
        let (b, c, d) = (b * rot, c * rot, d * rot);

        let (phi, lambda) = if a.norm() <= EPSILON {
            (0.0, (-b).arg())
        } else if c.norm() <= EPSILON {
            (0.0, d.arg())
        } else {
            (c.arg(), (-b).arg())
        };

        (
            theta.clamp(0.0, PI),
            Self::normalize_angle(phi),
            Self::normalize_angle(lambda),
        )
    }

    /// Normalize an angle to `(-pi, pi]`. Non-finite input maps to zero.
    pub fn normalize_angle(angle: f64) -> f64 {
        if !angle.is_finite() {
            return 0.0;
        }
        let a = angle.rem_euclid(2.0 * PI);
        if a > PI { a - 2.0 * PI } else { a }
    }
}

impl Default for Unitary2x2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Unitary2x2 {
    type Output = Self;

    #[allow(clippy::needless_pass_by_value)]
    fn mul(self, rhs: Self) -> Self::Output {
        Unitary2x2::mul(&self, &rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn gate(g: StandardGate) -> Unitary2x2 {
        Unitary2x2::from_gate(&g).unwrap()
    }

    fn assert_u3_roundtrip(u: Unitary2x2) {
        let (theta, phi, lambda) = u.to_u3();
        let rebuilt = Unitary2x2::u3(theta, phi, lambda);
        assert!(
            rebuilt.approx_eq_up_to_phase(&u, 1e-9),
            "u3({theta}, {phi}, {lambda}) does not reproduce {u:?}"
        );
    }

    #[test]
    fn test_identity() {
        assert!(Unitary2x2::identity().is_identity());
        assert!(gate(StandardGate::U1(0.0)).is_identity());
        assert!(gate(StandardGate::Rz(2.0 * PI)).is_identity());
        assert!(!gate(StandardGate::X).is_identity());
    }

    #[test]
    fn test_hadamard_squared() {
        let h = gate(StandardGate::H);
        assert!((h * h).is_identity());
    }

    #[test]
    fn test_pauli_squared() {
        for g in [StandardGate::X, StandardGate::Y, StandardGate::Z] {
            let m = gate(g);
            assert!((m * m).is_identity(), "{} squared", g.name());
        }
    }

    #[test]
    fn test_s_squared_is_z() {
        let s = gate(StandardGate::S);
        assert!((s * s).approx_eq_up_to_phase(&gate(StandardGate::Z), 1e-12));
    }

    #[test]
    fn test_t_tdg_cancel() {
        assert!((gate(StandardGate::T) * gate(StandardGate::Tdg)).is_identity());
    }

    #[test]
    fn test_named_gates_match_u3_forms() {
        let cases = [
            (StandardGate::X, Unitary2x2::u3(PI, 0.0, PI)),
            (StandardGate::Y, Unitary2x2::u3(PI, FRAC_PI_2, FRAC_PI_2)),
            (StandardGate::Z, Unitary2x2::u1(PI)),
            (StandardGate::Rx(0.7), Unitary2x2::u3(0.7, -FRAC_PI_2, FRAC_PI_2)),
            (StandardGate::Ry(0.7), Unitary2x2::u3(0.7, 0.0, 0.0)),
            (StandardGate::Rz(0.7), Unitary2x2::u1(0.7)),
        ];
        for (g, expected) in cases {
            assert!(
                gate(g).approx_eq_up_to_phase(&expected, 1e-12),
                "{}",
                g.name()
            );
        }
    }

    #[test]
    fn test_to_u3_hadamard() {
        let (theta, phi, lambda) = gate(StandardGate::H).to_u3();
        assert!(approx_eq(theta, FRAC_PI_2));
        assert!(approx_eq(phi, 0.0));
        assert!(approx_eq(lambda, PI));
    }

    #[test]
    fn test_to_u3_diagonal() {
        let (theta, phi, lambda) = gate(StandardGate::T).to_u3();
        assert!(approx_eq(theta, 0.0));
        assert!(approx_eq(phi, 0.0));
        assert!(approx_eq(lambda, FRAC_PI_4));
    }

    #[test]
    fn test_to_u3_antidiagonal() {
        let (theta, phi, _) = gate(StandardGate::Y).to_u3();
        assert!(approx_eq(theta, PI));
        assert!(approx_eq(phi, 0.0));
        assert_u3_roundtrip(gate(StandardGate::Y));
    }

    #[test]
    fn test_to_u3_products() {
        let h = gate(StandardGate::H);
        let t = gate(StandardGate::T);
        let rx = gate(StandardGate::Rx(0.3));
        assert_u3_roundtrip(h * t * h);
        assert_u3_roundtrip(rx * t * gate(StandardGate::Ry(1.1)));
        assert_u3_roundtrip(gate(StandardGate::U3(2.0, -3.0, 3.1)));
    }

    #[test]
    fn test_dagger_inverts() {
        let u = gate(StandardGate::U3(0.4, 1.2, -0.8));
        assert!((u * u.dagger()).is_identity());
    }

    #[test]
    fn test_normalize_angle() {
        assert!(approx_eq(Unitary2x2::normalize_angle(3.0 * PI), PI));
        assert!(approx_eq(Unitary2x2::normalize_angle(-PI), PI));
        assert!(approx_eq(Unitary2x2::normalize_angle(-FRAC_PI_2), -FRAC_PI_2));
        assert!(approx_eq(Unitary2x2::normalize_angle(f64::NAN), 0.0));
    }

    #[test]
    fn test_two_qubit_gates_have_no_matrix() {
        assert!(Unitary2x2::from_gate(&StandardGate::CX).is_none());
    }
}
