//! Fit configuration.
//!
//! [`Config`] can be built in code (`Config { method, ..Default::default() }`) or read
//! from YAML with [`Config::from_yaml`]:
//!
//! ```yaml
//! kernel_shape: [11, 11]
//! background_degree: 1      # or null for no background
//! method: Alard-Lupton
//! gausslist:
//!   - { sx: 1.5, sy: 1.5, mod_poly_degree: 3 }
//!   - { sx: 4.0, sy: 4.0 }
//! grid_shape: [2, 2]
//! ```

use serde::Deserialize;

use crate::basis::{GaussianComponent, Method, MethodParams};
use crate::error::Result;
use crate::grid::GridShape;
use crate::kernel::KernelShape;

/// Everything [`crate::optimal_system`] needs besides the two images.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `(height, width)` of the kernel. Both sides must be odd.
    pub kernel_shape: (usize, usize),
    /// Degree of the polynomial background, `None` to fit no background.
    pub background_degree: Option<usize>,
    /// Kernel parameterization.
    pub method: Method,
    /// Tiles fitted independently.
    pub grid_shape: GridShape,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kernel_shape: (11, 11),
            background_degree: Some(0),
            method: Method::Bramich,
            grid_shape: GridShape::default(),
        }
    }
}

impl Config {
    /// Check everything that does not depend on the images.
    pub fn validate(&self) -> Result<()> {
        let shape = self.checked_kernel_shape()?;
        self.method.validate()?;
        self.method.check_kernel_shape(shape)
    }

    /// `kernel_shape` as a [`KernelShape`]; fails on an even side.
    pub fn checked_kernel_shape(&self) -> Result<KernelShape> {
        let (height, width) = self.kernel_shape;
        KernelShape::new(height, width)
    }

    /// Parse a YAML document. Missing keys take their [`Default`] values.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: RawConfig = serde_yml::from_str(yaml)?;
        let method = Method::from_name(
            &raw.method,
            MethodParams {
                gausslist: raw.gausslist,
                poly_degree: raw.poly_degree,
            },
        )?;
        let (rows, cols) = raw.grid_shape;
        let config = Self {
            kernel_shape: raw.kernel_shape,
            background_degree: raw.background_degree,
            method,
            grid_shape: GridShape::new(rows, cols)?,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    kernel_shape: (usize, usize),
    background_degree: Option<usize>,
    method: String,
    gausslist: Option<Vec<GaussianComponent>>,
    poly_degree: Option<usize>,
    grid_shape: (usize, usize),
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            kernel_shape: (11, 11),
            background_degree: Some(0),
            method: "Bramich".to_string(),
            gausslist: None,
            poly_degree: None,
            grid_shape: (1, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::MethodKind;
    use crate::error::{Error, ErrorKind};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.kernel_shape, (11, 11));
        assert_eq!(config.background_degree, Some(0));
        assert_eq!(config.method, Method::Bramich);
        assert!(config.grid_shape.is_single());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_gives_defaults() {
        assert_eq!(Config::from_yaml("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_alard_lupton_yaml() {
        let yaml = "\
kernel_shape: [9, 7]
background_degree: 1
method: Alard-Lupton
gausslist:
  - { sx: 1.5, sy: 1.0, mod_poly_degree: 3 }
  - { sx: 4.0, sy: 4.0, center: [3.0, 4.0] }
grid_shape: [2, 3]
";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.kernel_shape, (9, 7));
        assert_eq!(config.background_degree, Some(1));
        assert_eq!(config.grid_shape, GridShape::new(2, 3).unwrap());
        let Method::AlardLupton { gausslist } = &config.method else {
            panic!("expected Alard-Lupton, got {:?}", config.method);
        };
        assert_eq!(gausslist.len(), 2);
        assert_eq!(gausslist[0].mod_poly_degree, 3);
        assert_eq!(gausslist[1].mod_poly_degree, 2);
        assert_eq!(gausslist[1].center, Some((3.0, 4.0)));
    }

    #[test]
    fn test_null_background_degree() {
        let config =
            Config::from_yaml("method: AdaptiveBramich\npoly_degree: 2\nbackground_degree: null\n")
                .unwrap();
        assert_eq!(config.background_degree, None);
        assert_eq!(config.method, Method::AdaptiveBramich { poly_degree: 2 });
    }

    #[test]
    fn test_unknown_method_in_yaml() {
        let err = Config::from_yaml("method: WrongName\n").unwrap_err();
        assert!(matches!(err, Error::UnknownMethod(ref name) if name == "WrongName"));
    }

    #[test]
    fn test_missing_required_parameter_in_yaml() {
        let err = Config::from_yaml("method: AdaptiveBramich\n").unwrap_err();
        assert!(matches!(
            err,
            Error::MissingParameter {
                method: MethodKind::AdaptiveBramich,
                parameter: "poly_degree"
            }
        ));
    }

    #[test]
    fn test_even_kernel_in_yaml() {
        let err = Config::from_yaml("kernel_shape: [10, 11]\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EvenSideKernel);
    }

    #[test]
    fn test_malformed_yaml() {
        let err = Config::from_yaml("kernel_shape: eleven\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
        let err = Config::from_yaml("kernal_shape: [3, 3]\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_gaussian_keys() {
        let yaml = "method: Alard-Lupton\ngausslist:\n  - { sx: 1.0, sy: 1.0, modPolyDeg: 3 }\n";
        let config = Config::from_yaml(yaml).unwrap();
        let Method::AlardLupton { gausslist } = &config.method else {
            panic!("expected Alard-Lupton, got {:?}", config.method);
        };
        assert_eq!(gausslist[0].mod_poly_degree, 3);

        let yaml = "method: Alard-Lupton\ngausslist:\n  - { sx: 1.0, sy: 1.0, mod_poly_deg: 3 }\n";
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)), "{err}");
    }

    #[test]
    fn test_gaussian_outside_kernel_rejected() {
        let yaml = "\
kernel_shape: [5, 5]
method: Alard-Lupton
gausslist:
  - { sx: 1.0, sy: 1.0, center: [1000.0, 1000.0] }
";
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)), "{err}");
    }

    #[test]
    fn test_zero_grid_rejected() {
        let err = Config::from_yaml("grid_shape: [0, 2]\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }
}
