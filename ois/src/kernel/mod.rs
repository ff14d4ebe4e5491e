//! Kernel shapes and (possibly spatially varying) kernel tensors.
//!
//! A [`Kernel`] is a `(kh, kw, pol_dof)` tensor: the weight at kernel offset `(i, j)`
//! for output pixel `(x, y)` is `Σ_m tensor[i, j, m] * monomial_m(x, y)`, with the
//! monomial order of [`crate::math::polynomial`]. Degree 0 is an ordinary constant
//! kernel. Kernels are applied as correlations centred on `(kh / 2, kw / 2)`:
//!
//! ```text
//! out[y, x] = Σ_{i,j} K(i, j; x, y) * image[y + i - kh/2, x + j - kw/2]
//! ```


use common::Buffer2;
use num_traits::AsPrimitive;

use crate::error::{Error, Result};
use crate::math::polynomial::{eval_monomials, pol_dof};

/// Validated kernel footprint. Both sides are odd.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelShape {
    height: usize,
    width: usize,
}

impl KernelShape {
    pub fn new(height: usize, width: usize) -> Result<Self> {
        if height % 2 == 0 || width % 2 == 0 {
            return Err(Error::EvenSideKernel { height, width });
        }
        Ok(Self { height, width })
    }

    pub fn square(side: usize) -> Result<Self> {
        Self::new(side, side)
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of kernel taps.
    #[inline]
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(cx, cy)` offset of the centre tap.
    #[inline]
    pub fn center(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }

    /// Fail when the kernel does not fit inside a `(height, width)` image region.
    pub fn check_fits(&self, (height, width): (usize, usize)) -> Result<()> {
        if self.height > height || self.width > width {
            return Err(Error::KernelTooLarge {
                kernel: (self.height, self.width),
                image: (height, width),
            });
        }
        Ok(())
    }
}

/// Kernel tensor of shape `(height, width, pol_dof)`, stored row-major with the
/// polynomial axis innermost.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    height: usize,
    width: usize,
    degree: usize,
    coeffs: Vec<f64>,
}

impl Kernel {
    /// Build from `[kh, kw, pol_dof]` and coefficients of any primitive numeric type.
    ///
    /// Other ranks are a shape error; a `pol_dof` that is not `(degree + 1)(degree + 2) / 2`
    /// is a configuration error.
    pub fn from_shape_vec<T: AsPrimitive<f64>>(
        shape: &[usize],
        coeffs: &[T],
        degree: usize,
    ) -> Result<Self> {
        let &[height, width, terms] = shape else {
            return Err(Error::Dimensionality {
                expected: 3,
                shape: shape.to_vec(),
            });
        };
        if terms != pol_dof(degree) {
            return Err(Error::KernelDegreeMismatch {
                pol_dof: terms,
                degree,
                expected: pol_dof(degree),
            });
        }
        let expected = height * width * terms;
        if coeffs.len() != expected {
            return Err(Error::ShapeLength {
                shape: shape.to_vec(),
                expected,
                actual: coeffs.len(),
            });
        }
        Ok(Self {
            height,
            width,
            degree,
            coeffs: coeffs.iter().map(|&c| c.as_()).collect(),
        })
    }

    /// Constant (degree 0) kernel from a `kw x kh` buffer.
    pub fn constant(weights: Buffer2<f64>) -> Self {
        Self {
            height: weights.height(),
            width: weights.width(),
            degree: 0,
            coeffs: weights.into_pixels(),
        }
    }

    pub(crate) fn from_parts(shape: KernelShape, degree: usize, coeffs: Vec<f64>) -> Self {
        assert_eq!(coeffs.len(), shape.len() * pol_dof(degree));
        Self {
            height: shape.height(),
            width: shape.width(),
            degree,
            coeffs,
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    #[inline]
    pub fn pol_dof(&self) -> usize {
        pol_dof(self.degree)
    }

    /// `(kh, kw, pol_dof)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.pol_dof())
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        self.degree == 0
    }

    #[inline]
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Coefficient of monomial `m` at kernel row `i`, column `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize, m: usize) -> f64 {
        let terms = self.pol_dof();
        debug_assert!(i < self.height && j < self.width && m < terms);
        self.coeffs[(i * self.width + j) * terms + m]
    }

    /// Sum of kernel weights at pixel `(x, y)`; the photometric scale factor.
    pub fn sum_at(&self, x: f64, y: f64) -> f64 {
        self.eval(x, y).pixels().iter().sum()
    }

    /// Evaluate the `kw x kh` weights at output pixel `(x, y)`.
    pub fn eval(&self, x: f64, y: f64) -> Buffer2<f64> {
        let terms = self.pol_dof();
        let mut monomials = vec![0.0; terms];
        eval_monomials(self.degree, x, y, &mut monomials);
        let weights = self
            .coeffs
            .chunks_exact(terms)
            .map(|tap| tap.iter().zip(&monomials).map(|(c, m)| c * m).sum())
            .collect();
        Buffer2::new(self.width, self.height, weights)
    }
}

/// Evaluate an adaptive kernel at output row `y`, column `x`.
pub fn eval_adaptive_kernel(kernel: &Kernel, y: usize, x: usize) -> Buffer2<f64> {
    kernel.eval(x as f64, y as f64)
}
