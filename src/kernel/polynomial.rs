//! Polynomial Kernel Implementation
//!
//! The polynomial kernel is defined as:
//! K(x, y) = (γ * <x, y> + r)^d
//!
//! Where:
//! - γ (gamma): scaling factor for the dot product
//! - r (coef0): independent term in the polynomial
//! - d (degree): degree of the polynomial
//!
//! Odd degrees keep the sign of the base.

use crate::core::{Result, SamplerConfig, SketchError, SparseVector};
use crate::kernel::traits::Kernel;
use crate::utils::dot;

/// Polynomial kernel with configurable degree, gamma, and coefficient
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialKernel {
    /// Scaling factor for the dot product
    pub gamma: f64,
    /// Independent term in the polynomial
    pub coef0: f64,
    /// Degree of the polynomial
    pub degree: u32,
}

impl PolynomialKernel {
    /// Creates a new polynomial kernel with the specified parameters
    ///
    /// # Examples
    /// ```
    /// use polysketch::kernel::PolynomialKernel;
    ///
    /// // Quadratic kernel: (x·y + 1)²
    /// let quad_kernel = PolynomialKernel::new(2, 1.0, 1.0).unwrap();
    /// assert_eq!(quad_kernel.degree, 2);
    /// ```
    pub fn new(degree: u32, gamma: f64, coef0: f64) -> Result<Self> {
        if degree == 0 {
            return Err(SketchError::Configuration(
                "Polynomial degree must be positive".to_string(),
            ));
        }
        if !gamma.is_finite() || gamma < 0.0 {
            return Err(SketchError::Configuration(format!(
                "Gamma must be finite and non-negative, got {gamma}"
            )));
        }

        Ok(Self {
            gamma,
            coef0,
            degree,
        })
    }

    /// Creates a quadratic kernel: (γ * <x,y> + 1)²
    pub fn quadratic(gamma: f64) -> Result<Self> {
        Self::new(2, gamma, 1.0)
    }

    /// Creates a cubic kernel: (γ * <x,y> + 1)³
    pub fn cubic(gamma: f64) -> Result<Self> {
        Self::new(3, gamma, 1.0)
    }

    /// Kernel matching a sampler configuration
    pub(crate) fn from_config(config: &SamplerConfig) -> Self {
        Self {
            gamma: config.gamma,
            coef0: config.coef0,
            degree: u32::try_from(config.degree).unwrap_or(u32::MAX),
        }
    }

    fn apply(&self, dot_product: f64) -> f64 {
        let base = self.gamma * dot_product + self.coef0;
        base.powi(i32::try_from(self.degree).unwrap_or(i32::MAX))
    }
}

impl Kernel for PolynomialKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        self.apply(dot(x, y))
    }

    fn compute_sparse(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        self.apply(x.dot(y))
    }
}
