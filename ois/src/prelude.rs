//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use ois::prelude::*;
//! ```

// Inputs
pub use crate::{BitBuffer2, Buffer2, MaskedImage};

// Configuration
pub use crate::{Config, GaussianComponent, GridShape, Method};

// Main API
pub use crate::{Kernel, Subtraction, convolve2d_adaptive, optimal_system};

pub use crate::{Error, ErrorKind, Result};
