//! Kernel trait definition

use crate::core::SparseVector;

/// Exact kernel function trait
///
/// Used as ground truth when judging how well a feature map approximates
/// the kernel it was built for.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y) on dense vectors of equal width
    fn compute(&self, x: &[f64], y: &[f64]) -> f64;

    /// Compute kernel value K(x, y) on sparse vectors
    fn compute_sparse(&self, x: &SparseVector, y: &SparseVector) -> f64;
}
