//! Kernel bases: how a reference image expands into the images whose linear
//! combination reproduces `kernel ⊛ reference`.
//!
//! Three bases are supported, selected by [`Method`]:
//!
//! - **Bramich**: one delta function per kernel tap, i.e. a free `kh x kw` grid of weights.
//! - **Alard-Lupton**: Gaussians modulated by polynomials in kernel-local coordinates.
//! - **AdaptiveBramich**: Bramich taps whose weights are polynomials in image
//!   position, so the kernel varies smoothly across the field.
//!
//! Every basis yields its images in a fixed order that matches the coefficient vector.


mod adaptive;
mod alard_lupton;
mod bramich;

pub use alard_lupton::gaussian_stencil;

use common::Buffer2;
use serde::Deserialize;
use strum_macros::{Display, EnumString};

use crate::error::{Error, Result};
use crate::kernel::{Kernel, KernelShape};
use crate::math::polynomial::pol_dof;

/// Method names as accepted by [`Method::from_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum MethodKind {
    #[strum(serialize = "Bramich")]
    Bramich,
    #[strum(serialize = "Alard-Lupton")]
    AlardLupton,
    #[strum(serialize = "AdaptiveBramich")]
    AdaptiveBramich,
}

/// One Gaussian envelope of the Alard-Lupton basis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GaussianComponent {
    /// Standard deviation along x (columns), in pixels.
    pub sx: f64,
    /// Standard deviation along y (rows), in pixels.
    pub sy: f64,
    /// Degree of the modulating polynomial.
    #[serde(alias = "modPolyDeg")]
    pub mod_poly_degree: usize,
    /// `(x, y)` centre in kernel pixel coordinates. `None` centres on the middle tap.
    pub center: Option<(f64, f64)>,
}

impl Default for GaussianComponent {
    fn default() -> Self {
        Self {
            sx: 2.0,
            sy: 2.0,
            mod_poly_degree: 2,
            center: None,
        }
    }
}

impl GaussianComponent {
    pub fn new(sx: f64, sy: f64) -> Self {
        Self {
            sx,
            sy,
            ..Self::default()
        }
    }

    pub fn with_mod_poly_degree(mut self, degree: usize) -> Self {
        self.mod_poly_degree = degree;
        self
    }

    pub fn with_center(mut self, x: f64, y: f64) -> Self {
        self.center = Some((x, y));
        self
    }

    /// Number of basis functions this component contributes.
    pub fn dof(&self) -> usize {
        pol_dof(self.mod_poly_degree)
    }

    fn validate(&self) -> Result<()> {
        if !(self.sx.is_finite() && self.sx > 0.0 && self.sy.is_finite() && self.sy > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "Gaussian widths must be positive, got sx={}, sy={}",
                self.sx, self.sy
            )));
        }
        match self.center {
            Some((x, y)) if !(x.is_finite() && y.is_finite()) => Err(Error::InvalidConfig(
                format!("Gaussian centre must be finite, got ({x}, {y})"),
            )),
            _ => Ok(()),
        }
    }
}

/// Optional method parameters, as they arrive from a caller or a config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodParams {
    pub gausslist: Option<Vec<GaussianComponent>>,
    pub poly_degree: Option<usize>,
}

/// Kernel parameterization used for a fit.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Method {
    #[default]
    Bramich,
    AlardLupton { gausslist: Vec<GaussianComponent> },
    AdaptiveBramich { poly_degree: usize },
}

impl Method {
    /// Resolve a method name and its parameters.
    ///
    /// Each method takes exactly its own parameter: `gausslist` for Alard-Lupton,
    /// `poly_degree` for AdaptiveBramich, nothing for Bramich.
    pub fn from_name(name: &str, params: MethodParams) -> Result<Self> {
        let kind: MethodKind = name
            .parse()
            .map_err(|_| Error::UnknownMethod(name.to_string()))?;
        let MethodParams {
            gausslist,
            poly_degree,
        } = params;

        let unexpected = |parameter| Error::UnexpectedParameter {
            method: kind,
            parameter,
        };
        let missing = |parameter| Error::MissingParameter {
            method: kind,
            parameter,
        };

        let method = match kind {
            MethodKind::Bramich => {
                if gausslist.is_some() {
                    return Err(unexpected("gausslist"));
                }
                if poly_degree.is_some() {
                    return Err(unexpected("poly_degree"));
                }
                Method::Bramich
            }
            MethodKind::AlardLupton => {
                if poly_degree.is_some() {
                    return Err(unexpected("poly_degree"));
                }
                Method::AlardLupton {
                    gausslist: gausslist.ok_or_else(|| missing("gausslist"))?,
                }
            }
            MethodKind::AdaptiveBramich => {
                if gausslist.is_some() {
                    return Err(unexpected("gausslist"));
                }
                Method::AdaptiveBramich {
                    poly_degree: poly_degree.ok_or_else(|| missing("poly_degree"))?,
                }
            }
        };
        method.validate()?;
        Ok(method)
    }

    pub fn kind(&self) -> MethodKind {
        match self {
            Method::Bramich => MethodKind::Bramich,
            Method::AlardLupton { .. } => MethodKind::AlardLupton,
            Method::AdaptiveBramich { .. } => MethodKind::AdaptiveBramich,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Method::Bramich | Method::AdaptiveBramich { .. } => Ok(()),
            Method::AlardLupton { gausslist } => {
                if gausslist.is_empty() {
                    return Err(Error::InvalidConfig(
                        "Alard-Lupton needs at least one Gaussian component".to_string(),
                    ));
                }
                gausslist.iter().try_for_each(GaussianComponent::validate)
            }
        }
    }

    /// Checks that depend on the kernel footprint: every Gaussian envelope must keep
    /// some weight on the kernel grid, or its normalized stencil is undefined.
    pub fn check_kernel_shape(&self, shape: KernelShape) -> Result<()> {
        let Method::AlardLupton { gausslist } = self else {
            return Ok(());
        };
        for component in gausslist {
            let sum = alard_lupton::envelope_sum(component, shape);
            if !(sum.is_finite() && sum > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "Gaussian centred at {:?} with sx={}, sy={} has no weight on a {}x{} kernel",
                    component.center,
                    component.sx,
                    component.sy,
                    shape.height(),
                    shape.width()
                )));
            }
        }
        Ok(())
    }

    /// `(stencils, terms per stencil)`: kernel taps and polynomial terms per tap for the
    /// Bramich bases, Gaussian-polynomial functions and 1 for Alard-Lupton.
    pub fn layout(&self, shape: KernelShape) -> (usize, usize) {
        match self {
            Method::Bramich => (shape.len(), 1),
            Method::AlardLupton { gausslist } => {
                (gausslist.iter().map(GaussianComponent::dof).sum(), 1)
            }
            Method::AdaptiveBramich { poly_degree } => (shape.len(), pol_dof(*poly_degree)),
        }
    }

    /// Kernel degrees of freedom (background excluded).
    pub fn kernel_dof(&self, shape: KernelShape) -> usize {
        let (stencils, terms) = self.layout(shape);
        stencils * terms
    }

    /// Basis images of `reference`, in coefficient order.
    pub fn basis_images(&self, reference: &Buffer2<f64>, shape: KernelShape) -> Vec<Buffer2<f64>> {
        match self {
            Method::Bramich => bramich::basis_images(reference, shape),
            Method::AlardLupton { gausslist } => {
                alard_lupton::basis_images(reference, shape, gausslist)
            }
            Method::AdaptiveBramich { poly_degree } => {
                adaptive::basis_images(reference, shape, *poly_degree)
            }
        }
    }

    /// Fold fitted kernel coefficients back into a kernel tensor.
    pub fn kernel_from_coeffs(&self, coeffs: &[f64], shape: KernelShape) -> Kernel {
        assert_eq!(coeffs.len(), self.kernel_dof(shape), "kernel coefficient count");
        match self {
            Method::Bramich => Kernel::from_parts(shape, 0, coeffs.to_vec()),
            Method::AlardLupton { gausslist } => alard_lupton::kernel(coeffs, shape, gausslist),
            Method::AdaptiveBramich { poly_degree } => {
                Kernel::from_parts(shape, *poly_degree, coeffs.to_vec())
            }
        }
    }
}
