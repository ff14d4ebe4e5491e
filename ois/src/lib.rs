//! OIS - Optimal image subtraction.
//!
//! Fits a convolution kernel and a smooth background that map a reference frame onto
//! a science frame, then subtracts. Three kernel parameterizations are available:
//! - Bramich: a free grid of kernel weights
//! - Alard-Lupton: Gaussians modulated by polynomials
//! - AdaptiveBramich: kernel weights that vary as polynomials across the field
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ois::prelude::*;
//!
//! let image = MaskedImage::from_shape_vec(&[height, width], &science_pixels)?;
//! let reference = MaskedImage::from_shape_vec(&[height, width], &reference_pixels)?;
//!
//! let config = Config {
//!     method: Method::AdaptiveBramich { poly_degree: 2 },
//!     kernel_shape: (7, 7),
//!     ..Default::default()
//! };
//! let result = optimal_system(&image, &reference, &config)?;
//! println!("residual norm {}", result.difference.norm());
//! ```

pub mod basis;
pub mod config;
pub mod convolution;
pub mod error;
pub mod grid;
pub mod image;
pub mod kernel;
pub mod math;
pub mod subtraction;
pub mod system;

#[cfg(test)]
pub mod testing;

pub mod prelude;

// ============================================================================
// Images and kernels
// ============================================================================

pub use common::{BitBuffer2, Buffer2};
pub use image::MaskedImage;
pub use kernel::{Kernel, KernelShape, eval_adaptive_kernel};

// ============================================================================
// Configuration
// ============================================================================

pub use basis::{GaussianComponent, Method, MethodKind, MethodParams};
pub use config::Config;
pub use grid::GridShape;

// ============================================================================
// Operations
// ============================================================================

pub use convolution::convolve2d_adaptive;
pub use subtraction::{Subtraction, optimal_system};
pub use system::{BasisImages, LinearSystem, gen_matrix_system};

// ============================================================================
// Errors
// ============================================================================

pub use error::{Error, ErrorKind, Result};
