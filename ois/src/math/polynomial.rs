//! Bivariate polynomial terms `x^p * y^q` with `p + q <= degree`.
//!
//! Terms are ordered by total degree, ties broken by increasing power of `y`:
//!
//! ```text
//! degree 2:  1, x, y, x², xy, y²
//! ```
//!
//! The same ordering is used for background surfaces, for the spatial variation of
//! adaptive kernels and for the modulation of Gaussian kernel components, so a
//! coefficient index always means the same monomial.

/// Number of monomials of total degree `<= degree`: `(d + 1)(d + 2) / 2`.
#[inline]
pub fn pol_dof(degree: usize) -> usize {
    (degree + 1) * (degree + 2) / 2
}

/// `(p, q)` exponent pairs in coefficient order.
pub fn monomial_exponents(degree: usize) -> Vec<(usize, usize)> {
    let mut terms = Vec::with_capacity(pol_dof(degree));
    for total in 0..=degree {
        for q in 0..=total {
            terms.push((total - q, q));
        }
    }
    terms
}

#[inline]
pub fn monomial(x: f64, y: f64, p: usize, q: usize) -> f64 {
    x.powi(p as i32) * y.powi(q as i32)
}

/// Evaluate every monomial of `degree` at `(x, y)` into `out`.
pub fn eval_monomials(degree: usize, x: f64, y: f64, out: &mut [f64]) {
    debug_assert_eq!(out.len(), pol_dof(degree));
    let mut idx = 0;
    for total in 0..=degree {
        for q in 0..=total {
            out[idx] = monomial(x, y, total - q, q);
            idx += 1;
        }
    }
}

/// Row-major `width x height` image of `x^p * y^q` over pixel coordinates.
pub fn monomial_image(width: usize, height: usize, (p, q): (usize, usize)) -> Vec<f64> {
    let xs: Vec<f64> = (0..width).map(|x| (x as f64).powi(p as i32)).collect();
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        let yq = (y as f64).powi(q as i32);
        out.extend(xs.iter().map(|&xp| xp * yq));
    }
    out
}
