//! Normal equations of the kernel + background least-squares fit.
//!
//! With basis images `B_k` (convolved reference images followed by background
//! monomials) and target `T`, the coefficients minimizing
//! `Σ_valid (T - Σ_k c_k B_k)²` solve `M c = b` with
//!
//! ```text
//! M[k, l] = Σ_valid B_k * B_l        b[k] = Σ_valid B_k * T
//! ```
//!
//! Excluded pixels drop out of every sum. `M` is symmetric positive semi-definite;
//! nothing here regularizes it, a degenerate system surfaces from the solve.


use common::{BitBuffer2, Buffer2};
use nalgebra::{DMatrix, DVector};
use num_traits::AsPrimitive;
use rayon::prelude::*;

use crate::basis::Method;
use crate::error::{Error, Result};
use crate::image::{check_mask_shape, promote};
use crate::kernel::KernelShape;
use crate::math::polynomial::{monomial_exponents, monomial_image, pol_dof};
use crate::math::solve_normal_equations;

/// Every basis image of a fit, kept so the fitted image can be rebuilt from the
/// coefficients without convolving again.
#[derive(Debug, Clone)]
pub struct BasisImages {
    width: usize,
    height: usize,
    layout: (usize, usize),
    kernel_terms: Vec<Buffer2<f64>>,
    background_terms: Vec<Buffer2<f64>>,
}

impl BasisImages {
    /// Kernel basis of `method` applied to `reference`, followed by the background
    /// monomials of `background_degree` (none when `None`).
    pub fn build(
        reference: &Buffer2<f64>,
        method: &Method,
        shape: KernelShape,
        background_degree: Option<usize>,
    ) -> Self {
        let (width, height) = (reference.width(), reference.height());
        let kernel_terms = method.basis_images(reference, shape);
        let background_terms = background_degree
            .map(|degree| {
                monomial_exponents(degree)
                    .into_iter()
                    .map(|exponents| {
                        Buffer2::new(width, height, monomial_image(width, height, exponents))
                    })
                    .collect()
            })
            .unwrap_or_default();

        debug_assert_eq!(kernel_terms.len(), method.kernel_dof(shape));
        Self {
            width,
            height,
            layout: method.layout(shape),
            kernel_terms,
            background_terms,
        }
    }

    /// `(stencils, terms per stencil, background terms, pixels)`.
    ///
    /// For the adaptive basis this is `(k², pol_dof, bkg_dof, n·m)`.
    pub fn dims(&self) -> (usize, usize, usize, usize) {
        (
            self.layout.0,
            self.layout.1,
            self.background_terms.len(),
            self.width * self.height,
        )
    }

    #[inline]
    pub fn kernel_dof(&self) -> usize {
        self.kernel_terms.len()
    }

    #[inline]
    pub fn background_dof(&self) -> usize {
        self.background_terms.len()
    }

    #[inline]
    pub fn total_dof(&self) -> usize {
        self.kernel_dof() + self.background_dof()
    }

    pub fn kernel_terms(&self) -> &[Buffer2<f64>] {
        &self.kernel_terms
    }

    pub fn background_terms(&self) -> &[Buffer2<f64>] {
        &self.background_terms
    }

    /// All basis images in coefficient order.
    pub fn iter(&self) -> impl Iterator<Item = &Buffer2<f64>> {
        self.kernel_terms.iter().chain(&self.background_terms)
    }

    /// `Σ_k coeffs[k] * B_k` over kernel and background terms: the fitted image.
    pub fn combine(&self, coeffs: &[f64]) -> Buffer2<f64> {
        assert_eq!(coeffs.len(), self.total_dof(), "coefficient count");
        weighted_sum(self.width, self.height, self.iter().zip(coeffs))
    }

    /// Background surface alone; all zeros when the fit has no background terms.
    pub fn background(&self, coeffs: &[f64]) -> Buffer2<f64> {
        assert_eq!(coeffs.len(), self.total_dof(), "coefficient count");
        let bkg_coeffs = &coeffs[self.kernel_dof()..];
        weighted_sum(
            self.width,
            self.height,
            self.background_terms.iter().zip(bkg_coeffs),
        )
    }
}

fn weighted_sum<'a>(
    width: usize,
    height: usize,
    terms: impl Iterator<Item = (&'a Buffer2<f64>, &'a f64)>,
) -> Buffer2<f64> {
    let mut out = vec![0.0; width * height];
    for (image, &c) in terms {
        for (o, v) in out.iter_mut().zip(image.pixels()) {
            *o += c * v;
        }
    }
    Buffer2::new(width, height, out)
}

/// `M c = b` together with the basis it was built from.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub matrix: DMatrix<f64>,
    pub vector: DVector<f64>,
    pub basis: BasisImages,
}

impl LinearSystem {
    /// Reduce `basis` against `target` over the pixels not set in `excluded`.
    pub fn assemble(target: &Buffer2<f64>, basis: BasisImages, excluded: Option<&BitBuffer2>) -> Self {
        assert_eq!(
            (target.width(), target.height()),
            (basis.width, basis.height),
            "target/basis size mismatch"
        );
        let valid: Vec<usize> = (0..target.len())
            .filter(|&idx| excluded.is_none_or(|m| !m.get(idx)))
            .collect();

        let compress = |image: &Buffer2<f64>| -> Vec<f64> {
            valid.iter().map(|&idx| image.pixels()[idx]).collect()
        };
        let images: Vec<&Buffer2<f64>> = basis.iter().collect();
        let columns: Vec<Vec<f64>> = images.par_iter().map(|image| compress(image)).collect();
        let target_valid = compress(target);

        let dof = columns.len();
        tracing::debug!(dof, valid_pixels = valid.len(), "Assembling normal equations");

        let upper: Vec<Vec<f64>> = (0..dof)
            .into_par_iter()
            .map(|k| (k..dof).map(|l| dot(&columns[k], &columns[l])).collect())
            .collect();
        let mut matrix = DMatrix::zeros(dof, dof);
        for (k, row) in upper.iter().enumerate() {
            for (offset, &value) in row.iter().enumerate() {
                matrix[(k, k + offset)] = value;
                matrix[(k + offset, k)] = value;
            }
        }

        let rhs: Vec<f64> = columns.par_iter().map(|c| dot(c, &target_valid)).collect();

        Self {
            matrix,
            vector: DVector::from_vec(rhs),
            basis,
        }
    }

    #[inline]
    pub fn dof(&self) -> usize {
        self.vector.len()
    }

    /// Coefficients `c` of `M c = b`.
    pub fn solve(&self) -> Result<DVector<f64>> {
        solve_normal_equations(&self.matrix, &self.vector)
    }
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Normal equations for a square adaptive kernel of side `kernel_side` whose taps vary
/// as polynomials of degree `poly_degree`, plus a background of `background_degree`.
///
/// `mask` marks excluded pixels. With `poly_degree == 0` this is the plain Bramich
/// system. The returned [`BasisImages::dims`] is `(k², pol_dof, bkg_dof, n·m)`.
pub fn gen_matrix_system<T: AsPrimitive<f64>>(
    target: &Buffer2<T>,
    reference: &Buffer2<T>,
    mask: Option<&BitBuffer2>,
    kernel_side: usize,
    poly_degree: usize,
    background_degree: Option<usize>,
) -> Result<LinearSystem> {
    let target = promote(target);
    let reference = promote(reference);
    if reference.shape() != target.shape() {
        return Err(Error::ShapeMismatch {
            what: "reference image",
            expected: target.shape(),
            actual: reference.shape(),
        });
    }
    if let Some(mask) = mask {
        check_mask_shape(&target, mask)?;
    }
    let shape = KernelShape::square(kernel_side)?;
    shape.check_fits(target.shape())?;

    let method = Method::AdaptiveBramich { poly_degree };
    let basis = BasisImages::build(&reference, &method, shape, background_degree);
    debug_assert_eq!(basis.kernel_dof(), shape.len() * pol_dof(poly_degree));
    Ok(LinearSystem::assemble(&target, basis, mask))
}
