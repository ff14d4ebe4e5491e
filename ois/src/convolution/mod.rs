//! Zero-padded 2D correlation with fixed stencils and with adaptive kernels.
//!
//! Every operation here uses the same border rule: taps that fall outside the image
//! read zero. Basis images for the normal equations are built from these functions,
//! so forward convolution and system building always agree at the edges.


use common::Buffer2;
use num_traits::AsPrimitive;
use rayon::prelude::*;

use crate::image::promote;
use crate::kernel::Kernel;
use crate::math::polynomial::eval_monomials;

/// Rows handed to a rayon task at once.
const ROWS_PER_CHUNK: usize = 8;

/// Image translated so that `out[y, x] = image[y + dy, x + dx]`, zero where that
/// falls outside the image.
pub fn shifted(image: &Buffer2<f64>, dx: isize, dy: isize) -> Buffer2<f64> {
    let (width, height) = (image.width(), image.height());
    let mut out = Buffer2::new_filled(width, height, 0.0);

    let x_lo = (-dx).clamp(0, width as isize) as usize;
    let x_hi = (width as isize - dx).clamp(0, width as isize) as usize;
    if x_lo >= x_hi {
        return out;
    }
    for y in 0..height {
        let sy = y as isize + dy;
        if sy < 0 || sy >= height as isize {
            continue;
        }
        let src = image.row(sy as usize);
        let src_lo = (x_lo as isize + dx) as usize;
        let dst = &mut out.pixels_mut()[y * width..(y + 1) * width];
        dst[x_lo..x_hi].copy_from_slice(&src[src_lo..src_lo + (x_hi - x_lo)]);
    }
    out
}

/// Correlate `image` with a fixed stencil, centred on `(kw / 2, kh / 2)`.
pub fn correlate(image: &Buffer2<f64>, stencil: &Buffer2<f64>) -> Buffer2<f64> {
    let (width, height) = (image.width(), image.height());
    let (cx, cy) = (stencil.width() / 2, stencil.height() / 2);
    if image.is_empty() {
        return image.clone();
    }
    let mut out = vec![0.0; width * height];

    out.par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, chunk)| {
            let y_start = chunk_idx * ROWS_PER_CHUNK;
            for (local_y, out_row) in chunk.chunks_exact_mut(width).enumerate() {
                let y = y_start + local_y;
                for i in 0..stencil.height() {
                    let Some(sy) = offset(y, i, cy, height) else {
                        continue;
                    };
                    let src = image.row(sy);
                    for (j, &weight) in stencil.row(i).iter().enumerate() {
                        if weight == 0.0 {
                            continue;
                        }
                        accumulate_shifted_row(out_row, src, j as isize - cx as isize, weight);
                    }
                }
            }
        });

    Buffer2::new(width, height, out)
}

/// Apply a spatially varying kernel.
///
/// `out[y, x] = Σ_{i,j} K(i, j; x, y) * image[y + i - kh/2, x + j - kw/2]` where the
/// weights `K` are evaluated from the kernel's polynomial coefficients at each
/// output pixel. Non-float images are promoted to `f64` first.
pub fn convolve2d_adaptive<T: AsPrimitive<f64>>(image: &Buffer2<T>, kernel: &Kernel) -> Buffer2<f64> {
    let image = promote(image);
    let (width, height) = (image.width(), image.height());
    let (kh, kw) = (kernel.height(), kernel.width());
    let (cx, cy) = (kw / 2, kh / 2);
    let terms = kernel.pol_dof();
    let degree = kernel.degree();
    if image.is_empty() {
        return image;
    }
    let mut out = vec![0.0; width * height];

    out.par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, chunk)| {
            let mut monomials = vec![0.0; terms];
            let mut weights = vec![0.0; kh * kw];
            let y_start = chunk_idx * ROWS_PER_CHUNK;

            for (local_y, out_row) in chunk.chunks_exact_mut(width).enumerate() {
                let y = y_start + local_y;
                for (x, out_px) in out_row.iter_mut().enumerate() {
                    eval_monomials(degree, x as f64, y as f64, &mut monomials);
                    for (w, tap) in weights.iter_mut().zip(kernel.coeffs().chunks_exact(terms)) {
                        *w = tap.iter().zip(&monomials).map(|(c, m)| c * m).sum();
                    }

                    let mut sum = 0.0;
                    for i in 0..kh {
                        let Some(sy) = offset(y, i, cy, height) else {
                            continue;
                        };
                        let src = image.row(sy);
                        for j in 0..kw {
                            if let Some(sx) = offset(x, j, cx, width) {
                                sum += weights[i * kw + j] * src[sx];
                            }
                        }
                    }
                    *out_px = sum;
                }
            }
        });

    Buffer2::new(width, height, out)
}

/// `pos + tap - center` if it lands inside `0..len`.
#[inline]
fn offset(pos: usize, tap: usize, center: usize, len: usize) -> Option<usize> {
    let p = (pos + tap).checked_sub(center)?;
    (p < len).then_some(p)
}

/// `out[x] += weight * src[x + dx]` for every `x` whose source is in range.
#[inline]
fn accumulate_shifted_row(out: &mut [f64], src: &[f64], dx: isize, weight: f64) {
    let width = out.len() as isize;
    let x_lo = (-dx).clamp(0, width) as usize;
    let x_hi = (width - dx).clamp(0, width) as usize;
    if x_lo >= x_hi {
        return;
    }
    let src_lo = (x_lo as isize + dx) as usize;
    for (o, &s) in out[x_lo..x_hi].iter_mut().zip(&src[src_lo..]) {
        *o += weight * s;
    }
}
