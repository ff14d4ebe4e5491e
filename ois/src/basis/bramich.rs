//! Delta-function basis: one shifted copy of the reference per kernel tap.

use common::Buffer2;
use rayon::prelude::*;

use crate::convolution::shifted;
use crate::kernel::KernelShape;

/// Tap `(i, j)` (index `i * kw + j`) maps to `reference[y + i - kh/2, x + j - kw/2]`.
pub(super) fn basis_images(reference: &Buffer2<f64>, shape: KernelShape) -> Vec<Buffer2<f64>> {
    let (cx, cy) = shape.center();
    (0..shape.len())
        .into_par_iter()
        .map(|tap| {
            let (i, j) = (tap / shape.width(), tap % shape.width());
            shifted(reference, j as isize - cx as isize, i as isize - cy as isize)
        })
        .collect()
}
