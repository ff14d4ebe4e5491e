//! Optimal image subtraction: fit `image ≈ kernel ⊛ reference + background` and
//! return the residual.
//!
//! # Masks
//!
//! A pixel is left out of the fit when the image masks it, or when the kernel
//! footprint centred on it touches a masked reference pixel. Masked reference
//! pixels are zeroed before the basis is built so their stored values cannot leak
//! into neighbouring valid pixels. The difference and optimal images carry that
//! exclusion mask iff either input is masked; the background never does.
//!
//! # Grids
//!
//! With a grid other than `1x1` every tile is an independent fit: the reference
//! is zero-padded at tile edges, adaptive kernels use tile-local coordinates, and
//! one kernel per tile is returned in row-major tile order.


use common::{BitBuffer2, Buffer2};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::grid::{self, Tile};
use crate::image::MaskedImage;
use crate::kernel::{Kernel, KernelShape};
use crate::system::{BasisImages, LinearSystem};

/// Result of [`optimal_system`].
#[derive(Debug, Clone)]
pub struct Subtraction {
    /// `image - optimal_image`.
    pub difference: MaskedImage,
    /// Reference convolved with the fitted kernel, plus the background.
    pub optimal_image: MaskedImage,
    /// Fitted kernel of every tile, row-major. A `1x1` grid yields exactly one.
    pub kernels: Vec<Kernel>,
    /// Fitted background surface, defined on every pixel.
    pub background: Buffer2<f64>,
}

impl Subtraction {
    /// Kernel of the first tile; the only kernel for a `1x1` grid.
    pub fn kernel(&self) -> &Kernel {
        &self.kernels[0]
    }
}

struct TileFit {
    optimal: Buffer2<f64>,
    background: Buffer2<f64>,
    kernel: Kernel,
}

/// Fit the kernel and background that best map `reference` onto `image`.
///
/// All validation happens before any numeric work: the image shapes must match,
/// the kernel sides must be odd, the method parameters must be valid for the kernel
/// footprint and the kernel must fit inside every grid tile.
pub fn optimal_system(image: &MaskedImage, reference: &MaskedImage, config: &Config) -> Result<Subtraction> {
    if reference.shape() != image.shape() {
        return Err(Error::ShapeMismatch {
            what: "reference image",
            expected: image.shape(),
            actual: reference.shape(),
        });
    }
    let kernel_shape = config.checked_kernel_shape()?;
    config.method.validate()?;
    config.method.check_kernel_shape(kernel_shape)?;
    let tiles = config.grid_shape.tiles(image.shape())?;
    for tile in &tiles {
        kernel_shape.check_fits(tile.shape())?;
    }

    let (height, width) = image.shape();
    tracing::info!(
        width,
        height,
        method = %config.method.kind(),
        kernel = ?config.kernel_shape,
        background_degree = ?config.background_degree,
        tiles = tiles.len(),
        "Fitting optimal subtraction"
    );

    let excluded = excluded_pixels(image, reference, kernel_shape);
    let reference_data = zero_masked(reference);

    let fits = grid::fit_tiles(&tiles, |tile| {
        let target = image.data().crop(tile.x0, tile.y0, tile.width, tile.height);
        let reference = reference_data.crop(tile.x0, tile.y0, tile.width, tile.height);
        let excluded = excluded
            .as_ref()
            .map(|mask| mask.crop(tile.x0, tile.y0, tile.width, tile.height));
        fit_tile(tile, &target, &reference, excluded.as_ref(), kernel_shape, config)
    })?;

    let optimal: Vec<&Buffer2<f64>> = fits.iter().map(|fit| &fit.optimal).collect();
    let optimal = grid::assemble(&tiles, &optimal, width, height);
    let background: Vec<&Buffer2<f64>> = fits.iter().map(|fit| &fit.background).collect();
    let background = grid::assemble(&tiles, &background, width, height);
    let kernels = fits.into_iter().map(|fit| fit.kernel).collect();

    let difference = image.data().zip_map(&optimal, |a, b| a - b);
    let output_mask = if image.is_masked() || reference.is_masked() {
        excluded
    } else {
        None
    };
    let (difference, optimal_image) = match output_mask {
        Some(mask) => (
            MaskedImage::with_mask(difference, mask.clone())?,
            MaskedImage::with_mask(optimal, mask)?,
        ),
        None => (MaskedImage::new(difference), MaskedImage::new(optimal)),
    };

    Ok(Subtraction {
        difference,
        optimal_image,
        kernels,
        background,
    })
}

fn fit_tile(
    tile: &Tile,
    target: &Buffer2<f64>,
    reference: &Buffer2<f64>,
    excluded: Option<&BitBuffer2>,
    kernel_shape: KernelShape,
    config: &Config,
) -> Result<TileFit> {
    let basis = BasisImages::build(
        reference,
        &config.method,
        kernel_shape,
        config.background_degree,
    );
    let system = LinearSystem::assemble(target, basis, excluded);
    tracing::debug!(row = tile.row, col = tile.col, dof = system.dof(), "Solving tile");

    let coeffs = system.solve().inspect_err(|err| {
        tracing::warn!(row = tile.row, col = tile.col, %err, "Tile fit failed");
    })?;
    let coeffs = coeffs.as_slice();
    let basis = &system.basis;
    Ok(TileFit {
        optimal: basis.combine(coeffs),
        background: basis.background(coeffs),
        kernel: config
            .method
            .kernel_from_coeffs(&coeffs[..basis.kernel_dof()], kernel_shape),
    })
}

/// Image mask united with the reference mask grown by the kernel footprint.
fn excluded_pixels(
    image: &MaskedImage,
    reference: &MaskedImage,
    kernel_shape: KernelShape,
) -> Option<BitBuffer2> {
    let (cx, cy) = kernel_shape.center();
    let grown = reference
        .mask()
        .filter(|mask| mask.any())
        .map(|mask| mask.dilate(cx, cy));
    match (image.mask(), grown) {
        (None, grown) => grown,
        (Some(mask), None) => Some(mask.clone()),
        (Some(mask), Some(mut grown)) => {
            grown.union_with(mask);
            Some(grown)
        }
    }
}

/// Pixel values with masked pixels set to zero.
fn zero_masked(image: &MaskedImage) -> Buffer2<f64> {
    let data = image.data();
    match image.mask() {
        Some(mask) if mask.any() => Buffer2::from_fn(data.width(), data.height(), |x, y| {
            if mask.get_xy(x, y) { 0.0 } else { data[(x, y)] }
        }),
        _ => data.clone(),
    }
}
