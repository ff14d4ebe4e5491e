//! Synthetic data for tests.

#![allow(dead_code)]

use common::{BitBuffer2, Buffer2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::image::MaskedImage;
use crate::kernel::Kernel;
use crate::math::polynomial::{monomial_exponents, monomial_image, pol_dof};

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
/// Respects RUST_LOG env var, defaults to "info".
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Uniform `[0, 1)` pixels.
pub fn random_buffer(width: usize, height: usize, seed: u64) -> Buffer2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Buffer2::from_fn(width, height, |_, _| rng.random::<f64>())
}

/// Reference-like frame: a flat sky plus a handful of Gaussian "stars" and pixel noise.
pub fn star_field(width: usize, height: usize, stars: usize, seed: u64) -> Buffer2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let sources: Vec<(f64, f64, f64, f64)> = (0..stars)
        .map(|_| {
            (
                rng.random_range(0.0..width as f64),
                rng.random_range(0.0..height as f64),
                rng.random_range(50.0..500.0),
                rng.random_range(0.8..2.0),
            )
        })
        .collect();
    Buffer2::from_fn(width, height, |x, y| {
        let sky = 20.0 + rng.random::<f64>();
        sources.iter().fold(sky, |acc, &(sx, sy, flux, sigma)| {
            let r2 = (x as f64 - sx).powi(2) + (y as f64 - sy).powi(2);
            acc + flux * (-0.5 * r2 / (sigma * sigma)).exp()
        })
    })
}

/// Kernel tensor with uniform `[0, 1)` coefficients.
pub fn random_kernel(side: usize, degree: usize, seed: u64) -> Kernel {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let terms = pol_dof(degree);
    let coeffs: Vec<f64> = (0..side * side * terms).map(|_| rng.random()).collect();
    Kernel::from_shape_vec(&[side, side, terms], &coeffs, degree).unwrap()
}

/// `Σ coeffs[k] * monomial_k(x, y)` over the image grid.
pub fn polynomial_surface(width: usize, height: usize, degree: usize, coeffs: &[f64]) -> Buffer2<f64> {
    assert_eq!(coeffs.len(), pol_dof(degree));
    let mut surface = vec![0.0; width * height];
    for (exponents, &c) in monomial_exponents(degree).into_iter().zip(coeffs) {
        for (s, m) in surface.iter_mut().zip(monomial_image(width, height, exponents)) {
            *s += c * m;
        }
    }
    Buffer2::new(width, height, surface)
}

/// Small random background coefficients, scaled so every term stays O(1e-3 * pixel).
pub fn random_background(width: usize, height: usize, degree: usize, seed: u64) -> Buffer2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let scale = width.max(height) as f64;
    let coeffs: Vec<f64> = monomial_exponents(degree)
        .into_iter()
        .map(|(p, q)| rng.random::<f64>() * 1e-1 / scale.powi((p + q) as i32))
        .collect();
    polynomial_surface(width, height, degree, &coeffs)
}

pub fn add(a: &Buffer2<f64>, b: &Buffer2<f64>) -> Buffer2<f64> {
    a.zip_map(b, |x, y| x + y)
}

/// Mask with a square patch and a full-height column band, like a bad region plus a
/// bleed trail.
pub fn patch_and_column_mask(width: usize, height: usize) -> BitBuffer2 {
    let mut mask = BitBuffer2::new_default(width, height);
    mask.fill_rect(width / 10, height / 10, 4, 4, true);
    mask.fill_rect(width / 2, 0, 2, height, true);
    mask
}

/// Mask with a square patch and a full-width row band.
pub fn patch_and_row_mask(width: usize, height: usize) -> BitBuffer2 {
    let mut mask = BitBuffer2::new_default(width, height);
    mask.fill_rect(width * 2 / 3, height / 3, 3, 3, true);
    mask.fill_rect(0, height * 3 / 4, width, 2, true);
    mask
}

pub fn masked(data: Buffer2<f64>, mask: BitBuffer2) -> MaskedImage {
    MaskedImage::with_mask(data, mask).unwrap()
}
