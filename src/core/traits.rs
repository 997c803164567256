//! Core traits for explicit feature maps

use crate::core::Result;

/// A fitted explicit feature map
///
/// Maps fixed-width input vectors to `n_components`-dimensional vectors whose
/// inner products approximate some kernel between the original inputs.
pub trait FeatureMap: Send + Sync {
    /// Output dimensionality
    fn n_components(&self) -> usize;

    /// Map a single dense vector
    fn transform_one(&self, x: &[f64]) -> Result<Vec<f64>>;

    /// Map a batch of dense vectors
    ///
    /// The default implementation fails on the first bad row; implementors
    /// that must reject a batch before doing any work override this.
    fn transform(&self, xs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        xs.iter().map(|x| self.transform_one(x)).collect()
    }
}
