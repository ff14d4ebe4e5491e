//! Numeric helpers: 2D polynomial monomials and the dense symmetric solve.

pub mod polynomial;
pub mod solve;

pub use polynomial::{monomial_exponents, monomial_image, pol_dof};
pub use solve::solve_normal_equations;

/// Euclidean norm of a sequence of values.
pub fn norm<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Largest absolute value, 0 for an empty sequence.
pub fn max_abs<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().fold(0.0, |acc, v| acc.max(v.abs()))
}
