//! Tensor sketch feature maps for the polynomial kernel
//!
//! Based on "Fast and scalable polynomial kernels via explicit feature maps"
//! by Ninh Pham and Rasmus Pagh

pub mod core;
pub mod kernel;
pub mod persistence;
pub mod sketch;
pub mod utils;

// Re-export main types for convenience
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{Result, SketchError};
pub use crate::kernel::{Kernel, PolynomialKernel};
pub use crate::persistence::SerializableSampler;
pub use crate::sketch::{CircularConvolver, CountSketch, PolynomialSampler};
pub use crate::utils::approximation::{approximation_report, ApproximationReport};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
