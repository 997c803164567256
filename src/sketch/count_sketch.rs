//! Count sketch: a random signed hashing projection
//!
//! Each input coordinate `j` is sent to bucket `h(j)` with sign `s(j)`, so the
//! sketch of `x` is `c[h(j)] += s(j) * x[j]`. Inner products of sketches are
//! unbiased estimates of inner products of the inputs.

use crate::core::{Result, SketchError, SparseVector};
use rand::Rng;

/// One count sketch stage: a bucket index and a ±1 sign per input feature
#[derive(Debug, Clone, PartialEq)]
pub struct CountSketch {
    buckets: Vec<usize>,
    signs: Vec<f64>,
    n_components: usize,
}

impl CountSketch {
    /// Draw a fresh stage for `n_features` inputs hashed into `n_components` buckets
    pub fn random<R: Rng + ?Sized>(n_features: usize, n_components: usize, rng: &mut R) -> Self {
        let buckets = (0..n_features)
            .map(|_| rng.gen_range(0..n_components))
            .collect();
        let signs = (0..n_features)
            .map(|_| if rng.gen::<bool>() { 1.0 } else { -1.0 })
            .collect();

        Self {
            buckets,
            signs,
            n_components,
        }
    }

    /// Rebuild a stage from stored tables, checking every entry
    pub fn from_parts(buckets: Vec<usize>, signs: Vec<f64>, n_components: usize) -> Result<Self> {
        if buckets.len() != signs.len() {
            return Err(SketchError::InvalidInput(format!(
                "bucket table has {} entries but sign table has {}",
                buckets.len(),
                signs.len()
            )));
        }
        if let Some(&bad) = buckets.iter().find(|&&b| b >= n_components) {
            return Err(SketchError::InvalidInput(format!(
                "bucket index {bad} out of range for {n_components} components"
            )));
        }
        if let Some(&bad) = signs.iter().find(|&&s| s != 1.0 && s != -1.0) {
            return Err(SketchError::InvalidInput(format!(
                "sign must be +1 or -1, got {bad}"
            )));
        }

        Ok(Self {
            buckets,
            signs,
            n_components,
        })
    }

    /// Bucket assigned to each input feature
    pub fn buckets(&self) -> &[usize] {
        &self.buckets
    }

    /// Sign assigned to each input feature
    pub fn signs(&self) -> &[f64] {
        &self.signs
    }

    /// Number of input features this stage hashes (offset column included)
    pub fn n_features(&self) -> usize {
        self.buckets.len()
    }

    /// Number of output buckets
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Accumulate the sketch of `scale * x` into `out`
    ///
    /// When `offset` is set it is hashed as one extra trailing feature.
    pub fn project_into(&self, x: &[f64], scale: f64, offset: Option<f64>, out: &mut [f64]) {
        debug_assert_eq!(self.buckets.len(), x.len() + usize::from(offset.is_some()));
        debug_assert_eq!(out.len(), self.n_components);

        for ((&value, &bucket), &sign) in x.iter().zip(&self.buckets).zip(&self.signs) {
            out[bucket] += sign * scale * value;
        }
        if let Some(value) = offset {
            self.accumulate_offset(value, x.len(), out);
        }
    }

    /// Sparse counterpart of [`CountSketch::project_into`]; only non-zeros are visited
    ///
    /// `n_features` is the fitted input width, which locates the offset column.
    pub fn project_sparse_into(
        &self,
        x: &SparseVector,
        n_features: usize,
        scale: f64,
        offset: Option<f64>,
        out: &mut [f64],
    ) {
        for (&index, &value) in x.indices.iter().zip(&x.values) {
            out[self.buckets[index]] += self.signs[index] * scale * value;
        }
        if let Some(value) = offset {
            self.accumulate_offset(value, n_features, out);
        }
    }

    fn accumulate_offset(&self, value: f64, column: usize, out: &mut [f64]) {
        out[self.buckets[column]] += self.signs[column] * value;
    }
}
