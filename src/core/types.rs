//! Core type definitions

use crate::core::{Result, SketchError};
use serde::{Deserialize, Serialize};

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from a dense slice, keeping only non-zero entries
    pub fn from_dense(dense: &[f64]) -> Self {
        let (indices, values) = dense
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .unzip();
        Self { indices, values }
    }

    /// Expand into a dense vector of width `dim`
    ///
    /// # Panics
    /// Panics if an index is >= `dim`
    pub fn to_dense(&self, dim: usize) -> Vec<f64> {
        let mut dense = vec![0.0; dim];
        for (&i, &v) in self.indices.iter().zip(&self.values) {
            dense[i] = v;
        }
        dense
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Largest stored index, if any
    ///
    /// Scans every index, so vectors built directly from unsorted fields are
    /// handled too.
    pub fn max_index(&self) -> Option<usize> {
        self.indices.iter().max().copied()
    }

    /// Dot product with another sparse vector (two-pointer merge)
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let mut result = 0.0;
        let (mut i, mut j) = (0, 0);

        while i < self.indices.len() && j < other.indices.len() {
            if self.indices[i] == other.indices[j] {
                result += self.values[i] * other.values[j];
                i += 1;
                j += 1;
            } else if self.indices[i] < other.indices[j] {
                i += 1;
            } else {
                j += 1;
            }
        }

        result
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Configuration for the polynomial feature sampler
///
/// The approximated kernel is `K(x, y) = (gamma * <x, y> + coef0)^degree`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Output dimensionality of the feature map
    pub n_components: usize,
    /// Degree of the polynomial kernel
    pub degree: usize,
    /// Scaling factor for the dot product
    pub gamma: f64,
    /// Independent term of the polynomial
    pub coef0: f64,
    /// Seed for the hash/sign tables; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            n_components: 100,
            degree: 2,
            gamma: 1.0,
            coef0: 0.0,
            seed: None,
        }
    }
}

impl SamplerConfig {
    /// Create a configuration with the given output size and degree
    pub fn new(n_components: usize, degree: usize) -> Self {
        Self {
            n_components,
            degree,
            ..Self::default()
        }
    }

    /// Set the dot product scale
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set the polynomial offset
    pub fn with_coef0(mut self, coef0: f64) -> Self {
        self.coef0 = coef0;
        self
    }

    /// Fix the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Whether an extra constant offset column is sketched
    pub fn has_offset(&self) -> bool {
        self.coef0 != 0.0
    }

    /// Check every parameter, reporting the first violation
    pub fn validate(&self) -> Result<()> {
        if self.n_components == 0 {
            return Err(SketchError::Configuration(
                "n_components must be a positive integer".to_string(),
            ));
        }
        if self.degree == 0 {
            return Err(SketchError::Configuration(
                "degree must be a positive integer".to_string(),
            ));
        }
        if !self.gamma.is_finite() || self.gamma < 0.0 {
            return Err(SketchError::Configuration(format!(
                "gamma must be finite and non-negative, got {}",
                self.gamma
            )));
        }
        if !self.coef0.is_finite() || self.coef0 < 0.0 {
            return Err(SketchError::Configuration(format!(
                "coef0 must be finite and non-negative, got {}",
                self.coef0
            )));
        }
        Ok(())
    }
}
