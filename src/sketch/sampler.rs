//! Tensor sketch approximation of the polynomial kernel
//!
//! Pham & Pagh, "Fast and scalable polynomial kernels via explicit feature
//! maps" (KDD 2013). For `K(x, y) = (γ<x, y> + r)^d` the sampler draws `d`
//! independent count sketches. Transforming `x` sketches `√γ·x` (with a
//! trailing `√r` column when `r != 0`) through each of them and combines the
//! `d` sketches by circular convolution, computed as a pointwise product of
//! their FFTs. The inner product of two outputs is an unbiased estimate of
//! `K(x, y)` whose variance falls as `n_components` grows.

use crate::core::{FeatureMap, Result, SamplerConfig, SketchError, SparseVector};
use crate::kernel::PolynomialKernel;
use crate::sketch::{CircularConvolver, CountSketch};
use log::{debug, trace};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Randomized feature map for the polynomial kernel
///
/// # Examples
/// ```
/// use polysketch::{PolynomialSampler, SamplerConfig};
///
/// # fn main() -> polysketch::core::Result<()> {
/// let mut sampler = PolynomialSampler::new(SamplerConfig::new(256, 2).with_seed(42))?;
/// sampler.fit(&[vec![0.0; 3]])?;
///
/// let features = sampler.transform(&[vec![1.0, 0.0, 0.0], vec![0.6, 0.8, 0.0]])?;
/// assert_eq!(features[0].len(), 256);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PolynomialSampler {
    config: SamplerConfig,
    fitted: Option<FittedState>,
}

#[derive(Debug, Clone, PartialEq)]
struct FittedState {
    n_features: usize,
    stages: Vec<CountSketch>,
}

impl PolynomialSampler {
    /// Create an unfitted sampler, rejecting invalid configurations
    pub fn new(config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fitted: None,
        })
    }

    /// Rebuild a fitted sampler from stored count sketch stages
    pub(crate) fn from_stages(
        config: SamplerConfig,
        n_features: usize,
        stages: Vec<CountSketch>,
    ) -> Result<Self> {
        config.validate()?;

        if n_features == 0 {
            return Err(SketchError::InvalidInput(
                "fitted width must be at least 1".to_string(),
            ));
        }
        let expected_width = table_width(n_features, &config)?;
        if stages.len() != config.degree {
            return Err(SketchError::InvalidInput(format!(
                "expected {} sketch stages, got {}",
                config.degree,
                stages.len()
            )));
        }
        if let Some(stage) = stages.iter().find(|s| {
            s.n_features() != expected_width || s.n_components() != config.n_components
        }) {
            return Err(SketchError::InvalidInput(format!(
                "sketch stage shape {}x{} does not match expected {}x{}",
                stage.n_features(),
                stage.n_components(),
                expected_width,
                config.n_components
            )));
        }

        Ok(Self {
            config,
            fitted: Some(FittedState { n_features, stages }),
        })
    }

    /// Sampler configuration
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Whether `fit` has been called
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Input width recorded at fit time
    pub fn n_features_in(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_features)
    }

    /// Count sketch stages drawn at fit time, one per degree
    pub fn stages(&self) -> Option<&[CountSketch]> {
        self.fitted.as_ref().map(|f| f.stages.as_slice())
    }

    /// The exact kernel this sampler approximates
    pub fn kernel(&self) -> PolynomialKernel {
        PolynomialKernel::from_config(&self.config)
    }

    /// Fit on example vectors; only their width is used
    ///
    /// Refitting discards the previous tables.
    pub fn fit(&mut self, samples: &[Vec<f64>]) -> Result<&mut Self> {
        let first = samples.first().ok_or_else(|| {
            SketchError::InvalidInput("cannot fit on an empty batch".to_string())
        })?;
        let width = first.len();
        if let Some(row) = samples.iter().position(|x| x.len() != width) {
            return Err(SketchError::InvalidInput(format!(
                "ragged batch: row 0 has {width} features but row {row} has {}",
                samples[row].len()
            )));
        }
        self.fit_dimension(width)
    }

    /// Fit for inputs of width `n_features`
    pub fn fit_dimension(&mut self, n_features: usize) -> Result<&mut Self> {
        if n_features == 0 {
            return Err(SketchError::InvalidInput(
                "input vectors must have at least one feature".to_string(),
            ));
        }

        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let width = table_width(n_features, &self.config)?;
        let stages = (0..self.config.degree)
            .map(|_| CountSketch::random(width, self.config.n_components, &mut rng))
            .collect();

        debug!(
            "Fitted tensor sketch: {} stages of {} -> {} (gamma={}, coef0={})",
            self.config.degree, width, self.config.n_components, self.config.gamma, self.config.coef0
        );

        self.fitted = Some(FittedState { n_features, stages });
        Ok(self)
    }

    /// Fit on `samples` and return their transform
    pub fn fit_transform(&mut self, samples: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.fit(samples)?;
        self.transform(samples)
    }

    /// Map a batch of dense vectors
    ///
    /// The whole batch is checked before any vector is sketched.
    pub fn transform(&self, samples: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let fitted = self.fitted()?;
        for x in samples {
            fitted.check_width(x.len())?;
        }
        trace!("Transforming {} dense vectors", samples.len());

        let mut workspace = Workspace::new(&self.config);
        Ok(samples
            .iter()
            .map(|x| fitted.sketch_dense(x, &mut workspace))
            .collect())
    }

    /// Map a single dense vector
    pub fn transform_one(&self, x: &[f64]) -> Result<Vec<f64>> {
        let fitted = self.fitted()?;
        fitted.check_width(x.len())?;

        let mut workspace = Workspace::new(&self.config);
        Ok(fitted.sketch_dense(x, &mut workspace))
    }

    /// Map a batch of sparse vectors
    ///
    /// A vector with any index outside the fitted width is a dimension
    /// mismatch; indices need not be sorted.
    pub fn transform_sparse(&self, samples: &[SparseVector]) -> Result<Vec<Vec<f64>>> {
        let fitted = self.fitted()?;
        for x in samples {
            if x.indices.len() != x.values.len() {
                return Err(SketchError::InvalidInput(format!(
                    "sparse vector has {} indices but {} values",
                    x.indices.len(),
                    x.values.len()
                )));
            }
            if let Some(max_index) = x.max_index() {
                if max_index >= fitted.n_features {
                    return Err(SketchError::DimensionMismatch {
                        expected: fitted.n_features,
                        actual: max_index + 1,
                    });
                }
            }
        }
        trace!("Transforming {} sparse vectors", samples.len());

        let mut workspace = Workspace::new(&self.config);
        Ok(samples
            .iter()
            .map(|x| {
                workspace.clear();
                for (stage, sketch) in fitted.stages.iter().zip(&mut workspace.sketches) {
                    stage.project_sparse_into(
                        x,
                        fitted.n_features,
                        workspace.scale,
                        workspace.offset,
                        sketch,
                    );
                }
                workspace.combine()
            })
            .collect())
    }

    fn fitted(&self) -> Result<&FittedState> {
        self.fitted.as_ref().ok_or(SketchError::NotFitted)
    }
}

/// Hash table width for `n_features` inputs, counting the offset column
fn table_width(n_features: usize, config: &SamplerConfig) -> Result<usize> {
    n_features
        .checked_add(usize::from(config.has_offset()))
        .ok_or_else(|| {
            SketchError::InvalidInput(format!("input width {n_features} is too large"))
        })
}

impl FittedState {
    fn sketch_dense(&self, x: &[f64], workspace: &mut Workspace) -> Vec<f64> {
        workspace.clear();
        for (stage, sketch) in self.stages.iter().zip(&mut workspace.sketches) {
            stage.project_into(x, workspace.scale, workspace.offset, sketch);
        }
        workspace.combine()
    }

    fn check_width(&self, actual: usize) -> Result<()> {
        if actual == self.n_features {
            Ok(())
        } else {
            Err(SketchError::DimensionMismatch {
                expected: self.n_features,
                actual,
            })
        }
    }
}

impl FeatureMap for PolynomialSampler {
    fn n_components(&self) -> usize {
        self.config.n_components
    }

    fn transform_one(&self, x: &[f64]) -> Result<Vec<f64>> {
        PolynomialSampler::transform_one(self, x)
    }

    fn transform(&self, xs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        PolynomialSampler::transform(self, xs)
    }
}

/// Per-call buffers: one count sketch per stage plus the FFT plans
struct Workspace {
    scale: f64,
    offset: Option<f64>,
    sketches: Vec<Vec<f64>>,
    convolver: Option<CircularConvolver>,
}

impl Workspace {
    fn new(config: &SamplerConfig) -> Self {
        // A single stage needs no convolution
        let convolver = (config.degree > 1).then(|| CircularConvolver::new(config.n_components));
        Self {
            scale: config.gamma.sqrt(),
            offset: config.has_offset().then(|| config.coef0.sqrt()),
            sketches: vec![vec![0.0; config.n_components]; config.degree],
            convolver,
        }
    }

    fn clear(&mut self) {
        for sketch in &mut self.sketches {
            sketch.fill(0.0);
        }
    }

    fn combine(&mut self) -> Vec<f64> {
        match self.convolver.as_mut() {
            Some(convolver) => {
                let mut out = vec![0.0; convolver.len()];
                convolver.convolve(&self.sketches, &mut out);
                out
            }
            None => self.sketches[0].clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Kernel;
    use crate::utils::dot;
    use approx::assert_relative_eq;

    fn fitted(n_components: usize, degree: usize, seed: u64, n_features: usize) -> PolynomialSampler {
        let mut sampler =
            PolynomialSampler::new(SamplerConfig::new(n_components, degree).with_seed(seed))
                .unwrap();
        sampler.fit_dimension(n_features).unwrap();
        sampler
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            PolynomialSampler::new(SamplerConfig::new(0, 2)),
            Err(SketchError::Configuration(_))
        ));
        assert!(matches!(
            PolynomialSampler::new(SamplerConfig::new(8, 0)),
            Err(SketchError::Configuration(_))
        ));
    }

    #[test]
    fn test_transform_before_fit() {
        let sampler = PolynomialSampler::new(SamplerConfig::new(8, 2)).unwrap();
        assert!(!sampler.is_fitted());
        assert_eq!(sampler.n_features_in(), None);
        assert!(matches!(
            sampler.transform(&[vec![1.0, 2.0]]),
            Err(SketchError::NotFitted)
        ));
        assert!(matches!(
            sampler.transform_one(&[1.0]),
            Err(SketchError::NotFitted)
        ));
        assert!(matches!(
            sampler.transform_sparse(&[SparseVector::empty()]),
            Err(SketchError::NotFitted)
        ));
    }

    #[test]
    fn test_fit_rejects_bad_batches() {
        let mut sampler = PolynomialSampler::new(SamplerConfig::new(8, 2)).unwrap();
        assert!(matches!(sampler.fit(&[]), Err(SketchError::InvalidInput(_))));
        assert!(matches!(
            sampler.fit(&[vec![]]),
            Err(SketchError::InvalidInput(_))
        ));
        assert!(matches!(
            sampler.fit(&[vec![1.0, 2.0], vec![1.0]]),
            Err(SketchError::InvalidInput(_))
        ));
        assert!(!sampler.is_fitted());
    }

    #[test]
    fn test_fitted_state_shape() {
        let sampler = fitted(16, 3, 5, 10);
        let stages = sampler.stages().unwrap();
        assert_eq!(stages.len(), 3);
        assert!(stages.iter().all(|s| s.n_features() == 10));
        assert!(stages.iter().all(|s| s.buckets().iter().all(|&b| b < 16)));
        assert_ne!(stages[0], stages[1]);

        let mut with_offset =
            PolynomialSampler::new(SamplerConfig::new(16, 2).with_coef0(1.0).with_seed(5))
                .unwrap();
        with_offset.fit(&[vec![0.0; 10]]).unwrap();
        assert_eq!(with_offset.n_features_in(), Some(10));
        assert!(with_offset
            .stages()
            .unwrap()
            .iter()
            .all(|s| s.n_features() == 11));
    }

    #[test]
    fn test_output_width() {
        for n_features in [1, 3, 40] {
            let sampler = fitted(12, 2, 1, n_features);
            let out = sampler.transform(&[vec![0.5; n_features]]).unwrap();
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].len(), 12);
        }
    }

    #[test]
    fn test_deterministic_given_seed() {
        let a = fitted(32, 3, 99, 6);
        let b = fitted(32, 3, 99, 6);
        assert_eq!(a.stages(), b.stages());

        let x = vec![vec![0.1, -0.4, 0.3, 0.0, 0.9, -0.2]];
        assert_eq!(a.transform(&x).unwrap(), b.transform(&x).unwrap());

        let c = fitted(32, 3, 100, 6);
        assert_ne!(a.stages(), c.stages());
    }

    #[test]
    fn test_refit_replaces_state() {
        let mut sampler =
            PolynomialSampler::new(SamplerConfig::new(16, 2).with_seed(4)).unwrap();
        sampler.fit_dimension(5).unwrap();
        let first = sampler.stages().unwrap().to_vec();

        sampler.fit_dimension(3).unwrap();
        assert_eq!(sampler.n_features_in(), Some(3));
        assert!(matches!(
            sampler.transform(&[vec![0.0; 5]]),
            Err(SketchError::DimensionMismatch {
                expected: 3,
                actual: 5
            })
        ));

        sampler.fit_dimension(5).unwrap();
        assert_eq!(sampler.stages().unwrap(), first.as_slice());
    }

    #[test]
    fn test_dimension_mismatch_rejects_whole_batch() {
        let sampler = fitted(8, 2, 0, 5);
        let batch = vec![vec![1.0; 5], vec![1.0; 4], vec![1.0; 5]];
        assert!(matches!(
            sampler.transform(&batch),
            Err(SketchError::DimensionMismatch {
                expected: 5,
                actual: 4
            })
        ));

        let sparse = vec![SparseVector::new(vec![0, 5], vec![1.0, 1.0])];
        assert!(matches!(
            sampler.transform_sparse(&sparse),
            Err(SketchError::DimensionMismatch {
                expected: 5,
                actual: 6
            })
        ));
    }

    #[test]
    fn test_unsorted_sparse_vector_out_of_range() {
        let sampler = fitted(8, 2, 0, 3);
        let unsorted = SparseVector {
            indices: vec![10, 0],
            values: vec![1.0, 1.0],
        };
        assert!(matches!(
            sampler.transform_sparse(&[unsorted]),
            Err(SketchError::DimensionMismatch {
                expected: 3,
                actual: 11
            })
        ));

        let ragged = SparseVector {
            indices: vec![0, 1],
            values: vec![1.0],
        };
        assert!(matches!(
            sampler.transform_sparse(&[ragged]),
            Err(SketchError::InvalidInput(_))
        ));

        // unsorted but in range is fine and matches the sorted form
        let shuffled = SparseVector {
            indices: vec![2, 0],
            values: vec![0.5, -1.0],
        };
        let sorted = SparseVector::new(vec![2, 0], vec![0.5, -1.0]);
        let a = sampler.transform_sparse(&[shuffled]).unwrap();
        let b = sampler.transform_sparse(&[sorted]).unwrap();
        for (x, y) in a[0].iter().zip(&b[0]) {
            assert_relative_eq!(x, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rebuild_rejects_overflowing_width() {
        let config = SamplerConfig::new(8, 1).with_coef0(1.0);
        assert!(matches!(
            PolynomialSampler::from_stages(config, usize::MAX, Vec::new()),
            Err(SketchError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_orthogonal_unit_vectors() {
        // degree 2 sketches of basis vectors are signed basis vectors, so the
        // inner product of two of them is exactly -1, 0 or 1
        let sampler = fitted(4, 2, 0, 3);
        let out = sampler
            .transform(&[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]])
            .unwrap();
        assert_eq!(out[0].len(), 4);
        assert_eq!(out[1].len(), 4);

        let cross = dot(&out[0], &out[1]);
        assert!(cross.abs() <= 1.0 + 1e-9, "cross term {cross}");
        let rounded = cross.round();
        assert_relative_eq!(cross, rounded, epsilon = 1e-9);

        // self inner products are exact: (e·e)^2 = 1
        assert_relative_eq!(dot(&out[0], &out[0]), 1.0, epsilon = 1e-9);
        assert_relative_eq!(dot(&out[1], &out[1]), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_orthogonal_average_is_zero() {
        let trials = 1000;
        let total: f64 = (0..trials)
            .map(|seed| {
                let sampler = fitted(4, 2, seed, 3);
                let out = sampler
                    .transform(&[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]])
                    .unwrap();
                dot(&out[0], &out[1])
            })
            .sum();
        assert!((total / trials as f64).abs() < 0.1);
    }

    #[test]
    fn test_degree_one_is_count_sketch() {
        let sampler = fitted(8, 1, 2, 4);
        let x = [1.0, -2.0, 0.5, 3.0];
        let out = sampler.transform_one(&x).unwrap();

        let stage = &sampler.stages().unwrap()[0];
        let mut expected = vec![0.0; 8];
        stage.project_into(&x, 1.0, None, &mut expected);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_transform_one_matches_batch() {
        let mut sampler = PolynomialSampler::new(
            SamplerConfig::new(20, 3)
                .with_gamma(0.5)
                .with_coef0(2.0)
                .with_seed(8),
        )
        .unwrap();
        let batch = vec![vec![0.2, 0.4, -0.1], vec![1.0, 0.0, 0.3]];
        let out = sampler.fit_transform(&batch).unwrap();

        for (x, row) in batch.iter().zip(&out) {
            let single = sampler.transform_one(x).unwrap();
            for (a, b) in single.iter().zip(row) {
                assert_relative_eq!(a, b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_sparse_matches_dense() {
        let mut sampler = PolynomialSampler::new(
            SamplerConfig::new(32, 3).with_coef0(0.5).with_seed(21),
        )
        .unwrap();
        sampler.fit_dimension(6).unwrap();

        let dense = vec![
            vec![0.0, 1.0, 0.0, -0.5, 0.0, 2.0],
            vec![0.0; 6],
            vec![0.3, 0.3, 0.3, 0.3, 0.3, 0.3],
        ];
        let sparse: Vec<SparseVector> = dense.iter().map(|x| SparseVector::from_dense(x)).collect();

        let from_dense = sampler.transform(&dense).unwrap();
        let from_sparse = sampler.transform_sparse(&sparse).unwrap();
        for (a, b) in from_dense.iter().flatten().zip(from_sparse.iter().flatten()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_unbiased_across_seeds() {
        let u = vec![0.6, 0.8, 0.0, 0.0];
        let v = vec![0.8, 0.0, 0.6, 0.0];

        for degree in [2usize, 3] {
            let trials = 2000u64;
            let mut sampler_kernel = None;
            let mean = (0..trials)
                .map(|seed| {
                    let sampler = fitted(64, degree, seed, 4);
                    sampler_kernel.get_or_insert_with(|| sampler.kernel());
                    let out = sampler.transform(&[u.clone(), v.clone()]).unwrap();
                    dot(&out[0], &out[1])
                })
                .sum::<f64>()
                / trials as f64;

            let exact = sampler_kernel.unwrap().compute(&u, &v);
            assert_relative_eq!(exact, 0.48f64.powi(degree as i32), epsilon = 1e-12);
            assert!(
                (mean - exact).abs() < 0.08,
                "degree {degree}: mean {mean} vs exact {exact}"
            );
        }
    }

    #[test]
    fn test_unbiased_with_gamma_and_coef0() {
        let config = SamplerConfig::new(64, 2).with_gamma(0.5).with_coef0(1.0);
        let u = vec![0.6, 0.8, 0.0];
        let v = vec![1.0, 0.0, 0.0];
        let exact = PolynomialKernel::new(2, 0.5, 1.0).unwrap().compute(&u, &v);
        assert_relative_eq!(exact, 1.69, epsilon = 1e-12);

        let trials = 2000u64;
        let mean = (0..trials)
            .map(|seed| {
                let mut sampler = PolynomialSampler::new(config.clone().with_seed(seed)).unwrap();
                let out = sampler.fit_transform(&[u.clone(), v.clone()]).unwrap();
                dot(&out[0], &out[1])
            })
            .sum::<f64>()
            / trials as f64;

        assert!((mean - exact).abs() < 0.1, "mean {mean} vs exact {exact}");
    }

    #[test]
    fn test_error_shrinks_with_components() {
        let u = vec![0.5, 0.5, 0.5, 0.5, 0.0, 0.0];
        let v = vec![0.0, 0.5, 0.5, 0.5, 0.5, 0.0];
        let exact = 0.75f64.powi(3);

        let mse = |n_components: usize| {
            let trials = 200u64;
            (0..trials)
                .map(|seed| {
                    let sampler = fitted(n_components, 3, seed, 6);
                    let out = sampler.transform(&[u.clone(), v.clone()]).unwrap();
                    (dot(&out[0], &out[1]) - exact).powi(2)
                })
                .sum::<f64>()
                / trials as f64
        };

        let coarse = mse(8);
        let fine = mse(512);
        assert!(fine < coarse, "mse at 512 ({fine}) not below mse at 8 ({coarse})");
    }

    #[test]
    fn test_nondeterministic_without_seed() {
        let mut a = PolynomialSampler::new(SamplerConfig::new(64, 2)).unwrap();
        let mut b = PolynomialSampler::new(SamplerConfig::new(64, 2)).unwrap();
        a.fit_dimension(32).unwrap();
        b.fit_dimension(32).unwrap();
        assert_ne!(a.stages(), b.stages());
    }

    #[test]
    fn test_feature_map_trait_object() {
        let sampler = fitted(10, 2, 3, 2);
        let map: &dyn FeatureMap = &sampler;
        assert_eq!(map.n_components(), 10);
        assert_eq!(map.transform_one(&[1.0, 1.0]).unwrap().len(), 10);
        assert!(map.transform(&[vec![1.0]]).is_err());
    }
}
