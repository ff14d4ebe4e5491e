//! Gaussian-modulated-polynomial basis (Alard & Lupton 1998).
//!
//! For each Gaussian component and each monomial `u^p v^q` with `p + q <= mod_poly_degree`
//! the stencil is `gauss(x, y) * u^p * v^q`, where `(u, v)` are kernel-local
//! coordinates measured from the centre tap and the Gaussian is normalized to unit sum.

use common::Buffer2;
use rayon::prelude::*;

use super::GaussianComponent;
use crate::convolution::correlate;
use crate::kernel::{Kernel, KernelShape};
use crate::math::polynomial::{monomial, monomial_exponents};

/// Unit-sum Gaussian envelope of `component` sampled on the kernel grid.
pub fn gaussian_stencil(component: &GaussianComponent, shape: KernelShape) -> Buffer2<f64> {
    let mut stencil = envelope(component, shape);
    let sum: f64 = stencil.pixels().iter().sum();
    for v in stencil.pixels_mut() {
        *v /= sum;
    }
    stencil
}

/// Total weight of the unnormalized envelope over the kernel grid. Zero when the
/// Gaussian sits too far outside the footprint to be sampled.
pub(super) fn envelope_sum(component: &GaussianComponent, shape: KernelShape) -> f64 {
    envelope(component, shape).pixels().iter().sum()
}

fn envelope(component: &GaussianComponent, shape: KernelShape) -> Buffer2<f64> {
    let (cx, cy) = shape.center();
    let (x0, y0) = component.center.unwrap_or((cx as f64, cy as f64));
    Buffer2::from_fn(shape.width(), shape.height(), |x, y| {
        let dx = (x as f64 - x0) / component.sx;
        let dy = (y as f64 - y0) / component.sy;
        (-0.5 * (dx * dx + dy * dy)).exp()
    })
}

/// All modulated stencils, component-major, monomial-minor.
pub(super) fn stencils(gausslist: &[GaussianComponent], shape: KernelShape) -> Vec<Buffer2<f64>> {
    let (cx, cy) = shape.center();
    let mut out = Vec::new();
    for component in gausslist {
        let envelope = gaussian_stencil(component, shape);
        for (p, q) in monomial_exponents(component.mod_poly_degree) {
            out.push(Buffer2::from_fn(shape.width(), shape.height(), |x, y| {
                let u = x as f64 - cx as f64;
                let v = y as f64 - cy as f64;
                envelope[(x, y)] * monomial(u, v, p, q)
            }));
        }
    }
    out
}

pub(super) fn basis_images(
    reference: &Buffer2<f64>,
    shape: KernelShape,
    gausslist: &[GaussianComponent],
) -> Vec<Buffer2<f64>> {
    stencils(gausslist, shape)
        .par_iter()
        .map(|stencil| correlate(reference, stencil))
        .collect()
}

/// `Σ_k coeffs[k] * stencil_k` as a constant kernel.
pub(super) fn kernel(coeffs: &[f64], shape: KernelShape, gausslist: &[GaussianComponent]) -> Kernel {
    let mut weights = vec![0.0; shape.len()];
    for (stencil, &c) in stencils(gausslist, shape).iter().zip(coeffs) {
        for (w, s) in weights.iter_mut().zip(stencil.pixels()) {
            *w += c * s;
        }
    }
    Kernel::from_parts(shape, 0, weights)
}
