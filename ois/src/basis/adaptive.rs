//! Spatially varying delta-function basis.
//!
//! Each Bramich tap image is multiplied by every monomial `x^p y^q` of output-pixel
//! position, giving `kh * kw * pol_dof` images ordered tap-major, monomial-minor.

use common::Buffer2;
use rayon::prelude::*;

use super::bramich;
use crate::kernel::KernelShape;
use crate::math::polynomial::{monomial_exponents, monomial_image};

pub(super) fn basis_images(
    reference: &Buffer2<f64>,
    shape: KernelShape,
    degree: usize,
) -> Vec<Buffer2<f64>> {
    let (width, height) = (reference.width(), reference.height());
    let monomials: Vec<Vec<f64>> = monomial_exponents(degree)
        .into_iter()
        .map(|exponents| monomial_image(width, height, exponents))
        .collect();

    bramich::basis_images(reference, shape)
        .into_par_iter()
        .flat_map_iter(|tap_image| {
            monomials.iter().map(move |weights| {
                let pixels = tap_image
                    .pixels()
                    .iter()
                    .zip(weights)
                    .map(|(v, w)| v * w)
                    .collect();
                Buffer2::new(width, height, pixels)
            })
        })
        .collect()
}
