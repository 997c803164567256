//! Utility functions for feature maps and kernels

use crate::core::{FeatureMap, Result, SketchError};
use crate::kernel::Kernel;

/// Dense dot product over the common prefix of two slices
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}

/// Rescale every row to unit L2 norm; all-zero rows are left untouched
pub fn normalize_rows(rows: &mut [Vec<f64>]) {
    for row in rows {
        let norm = dot(&row[..], &row[..]).sqrt();
        if norm > 0.0 {
            row.iter_mut().for_each(|v| *v /= norm);
        }
    }
}

/// Approximation quality of a feature map against an exact kernel
pub mod approximation {
    use super::*;

    /// Exact kernel values below this magnitude are left out of the relative error
    pub const RELATIVE_ERROR_FLOOR: f64 = 1e-8;

    /// Error statistics over all sample pairs
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct ApproximationReport {
        /// Number of (i, j) pairs with i <= j that were compared
        pub n_pairs: usize,
        pub mean_absolute_error: f64,
        pub max_absolute_error: f64,
        /// Mean of |approx - exact| / |exact| over pairs above the floor
        pub mean_relative_error: f64,
    }

    /// Compare sketched inner products against `kernel` on every pair of `samples`
    ///
    /// Self-pairs are included.
    pub fn approximation_report<M, K>(
        feature_map: &M,
        kernel: &K,
        samples: &[Vec<f64>],
    ) -> Result<ApproximationReport>
    where
        M: FeatureMap + ?Sized,
        K: Kernel + ?Sized,
    {
        if samples.is_empty() {
            return Err(SketchError::InvalidInput(
                "approximation report needs at least one sample".to_string(),
            ));
        }

        let features = feature_map.transform(samples)?;

        let mut n_pairs = 0;
        let mut abs_sum = 0.0;
        let mut abs_max: f64 = 0.0;
        let mut rel_sum = 0.0;
        let mut rel_count = 0;

        for i in 0..samples.len() {
            for j in i..samples.len() {
                let exact = kernel.compute(&samples[i], &samples[j]);
                let approx = dot(&features[i], &features[j]);
                let error = (approx - exact).abs();

                n_pairs += 1;
                abs_sum += error;
                abs_max = abs_max.max(error);
                if exact.abs() > RELATIVE_ERROR_FLOOR {
                    rel_sum += error / exact.abs();
                    rel_count += 1;
                }
            }
        }

        Ok(ApproximationReport {
            n_pairs,
            mean_absolute_error: abs_sum / n_pairs as f64,
            max_absolute_error: abs_max,
            mean_relative_error: if rel_count == 0 {
                0.0
            } else {
                rel_sum / rel_count as f64
            },
        })
    }
}

/// Memory estimates for explicit versus sketched feature spaces
pub mod memory {
    /// Width of the explicit degree-`degree` tensor feature space, saturating at `usize::MAX`
    pub fn explicit_feature_count(n_features: usize, degree: usize) -> usize {
        (0..degree).fold(1usize, |acc, _| acc.saturating_mul(n_features))
    }

    /// Bytes needed to hold `n_samples` transformed vectors
    pub fn estimate_feature_memory(n_samples: usize, n_components: usize) -> usize {
        n_samples
            .saturating_mul(n_components)
            .saturating_mul(std::mem::size_of::<f64>())
    }
}
