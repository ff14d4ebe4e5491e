//! Dense solve of the symmetric normal equations `M c = b`.

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// Solve `M c = b` for a symmetric positive semi-definite `M`.
///
/// `M` is first equilibrated with its diagonal (`D M D`, `D = diag(1 / sqrt(M_kk))`)
/// because polynomial terms over pixel coordinates span many orders of magnitude,
/// then factorized with partial-pivoting LU. No regularization is applied: an empty
/// diagonal entry, a non-invertible factorization or a non-finite solution is
/// reported as [`Error::SingularSystem`].
///
/// Equilibration fixes column scale, not the near-collinearity of `1, x, x², ...`
/// over raw pixel coordinates. On large frames with higher polynomial degrees the
/// fitted image stays accurate to ~1e-12 while individual coefficients carry far
/// larger relative error (around 1e-6 at 256x256, degree 2). Compare fitted images,
/// not coefficient tensors, when the frame is large.
pub fn solve_normal_equations(matrix: &DMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>> {
    let dof = rhs.len();
    assert_eq!(matrix.nrows(), dof, "matrix/vector size mismatch");
    assert_eq!(matrix.ncols(), dof, "matrix must be square");

    let singular = || Error::SingularSystem { dof };

    let mut scale = DVector::zeros(dof);
    for k in 0..dof {
        let diag = matrix[(k, k)];
        if !diag.is_finite() || diag <= 0.0 {
            return Err(singular());
        }
        scale[k] = diag.sqrt().recip();
    }

    let scaled = DMatrix::from_fn(dof, dof, |r, c| matrix[(r, c)] * scale[r] * scale[c]);
    let scaled_rhs = rhs.component_mul(&scale);

    let lu = scaled.lu();
    if !lu.is_invertible() {
        return Err(singular());
    }
    let solution = lu.solve(&scaled_rhs).ok_or_else(singular)?;
    let coeffs = solution.component_mul(&scale);

    if coeffs.iter().all(|c| c.is_finite()) {
        Ok(coeffs)
    } else {
        Err(singular())
    }
}
