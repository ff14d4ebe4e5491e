//! Error types for image subtraction.

use thiserror::Error;

use crate::basis::MethodKind;

pub type Result<T> = std::result::Result<T, Error>;

/// Broad category of an [`Error`], for callers that only care which check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong array rank, mismatched shapes, or a kernel that does not fit the image.
    Shape,
    /// A kernel side length is even.
    EvenSideKernel,
    /// Unknown method, missing or unexpected method parameter, bad numeric setting.
    InvalidConfig,
    /// The normal equations could not be solved.
    Numeric,
}

/// Errors that can occur while building or solving a subtraction.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Expected a {expected}D array, got shape {shape:?}")]
    Dimensionality { expected: usize, shape: Vec<usize> },

    #[error("Shape {shape:?} requires {expected} elements, got {actual}")]
    ShapeLength {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Kernel {kernel:?} does not fit in image region {image:?}")]
    KernelTooLarge {
        kernel: (usize, usize),
        image: (usize, usize),
    },

    #[error("Kernel sides must be odd, got {height}x{width}")]
    EvenSideKernel { height: usize, width: usize },

    #[error("Unknown method '{0}', expected one of Bramich, Alard-Lupton, AdaptiveBramich")]
    UnknownMethod(String),

    #[error("Method {method} requires parameter '{parameter}'")]
    MissingParameter {
        method: MethodKind,
        parameter: &'static str,
    },

    #[error("Method {method} does not accept parameter '{parameter}'")]
    UnexpectedParameter {
        method: MethodKind,
        parameter: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Kernel tensor has {pol_dof} polynomial terms, degree {degree} needs {expected}")]
    KernelDegreeMismatch {
        pol_dof: usize,
        degree: usize,
        expected: usize,
    },

    #[error("Normal equations with {dof} degrees of freedom are singular")]
    SingularSystem { dof: usize },

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yml::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Dimensionality { .. }
            | Error::ShapeLength { .. }
            | Error::ShapeMismatch { .. }
            | Error::KernelTooLarge { .. } => ErrorKind::Shape,
            Error::EvenSideKernel { .. } => ErrorKind::EvenSideKernel,
            Error::UnknownMethod(_)
            | Error::MissingParameter { .. }
            | Error::UnexpectedParameter { .. }
            | Error::InvalidConfig(_)
            | Error::KernelDegreeMismatch { .. }
            | Error::ConfigParse(_) => ErrorKind::InvalidConfig,
            Error::SingularSystem { .. } => ErrorKind::Numeric,
        }
    }
}
