//! Sampler serialization and persistence
//!
//! A fitted sampler is fully described by its configuration and the bucket and
//! sign tables of each count sketch stage. Saving those lets a feature map be
//! reproduced exactly even when it was fitted without a seed.

use crate::core::{Result, SamplerConfig, SketchError};
use crate::sketch::{CountSketch, PolynomialSampler};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serializable representation of a fitted sampler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableSampler {
    /// Configuration the sampler was built with
    pub config: SamplerConfig,
    /// Input width seen at fit time (offset column excluded)
    pub n_features: usize,
    /// One entry per degree
    pub stages: Vec<SerializableStage>,
    /// Model metadata
    pub metadata: SamplerMetadata,
}

/// Tables of one count sketch stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableStage {
    pub buckets: Vec<usize>,
    pub signs: Vec<f64>,
}

/// Metadata for tracking and validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerMetadata {
    /// Library version used to create the file
    pub library_version: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl From<&CountSketch> for SerializableStage {
    fn from(stage: &CountSketch) -> Self {
        Self {
            buckets: stage.buckets().to_vec(),
            signs: stage.signs().to_vec(),
        }
    }
}

impl SerializableSampler {
    /// Capture a fitted sampler
    pub fn from_sampler(sampler: &PolynomialSampler) -> Result<Self> {
        let stages = sampler.stages().ok_or(SketchError::NotFitted)?;
        let n_features = sampler.n_features_in().ok_or(SketchError::NotFitted)?;

        Ok(Self {
            config: sampler.config().clone(),
            n_features,
            stages: stages.iter().map(SerializableStage::from).collect(),
            metadata: SamplerMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        })
    }

    /// Save to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(SketchError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SketchError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(SketchError::IoError)?;
        let reader = BufReader::new(file);
        let model: Self = serde_json::from_reader(reader)
            .map_err(|e| SketchError::SerializationError(e.to_string()))?;

        if model.metadata.library_version != env!("CARGO_PKG_VERSION") {
            warn!(
                "Sampler was saved by version {}, loading with {}",
                model.metadata.library_version,
                env!("CARGO_PKG_VERSION")
            );
        }
        Ok(model)
    }

    /// Rebuild the fitted sampler, checking the tables against the configuration
    pub fn to_sampler(&self) -> Result<PolynomialSampler> {
        let stages = self
            .stages
            .iter()
            .map(|s| {
                CountSketch::from_parts(
                    s.buckets.clone(),
                    s.signs.clone(),
                    self.config.n_components,
                )
            })
            .collect::<Result<Vec<_>>>()
            .map_err(|e| SketchError::SerializationError(e.to_string()))?;

        PolynomialSampler::from_stages(self.config.clone(), self.n_features, stages)
            .map_err(|e| SketchError::SerializationError(e.to_string()))
    }

    /// Print a short summary
    pub fn print_summary(&self) {
        println!("=== Polynomial Sampler Summary ===");
        println!(
            "Kernel: ({} * <x, y> + {})^{}",
            self.config.gamma, self.config.coef0, self.config.degree
        );
        println!("Components: {}", self.config.n_components);
        println!("Input Features: {}", self.n_features);
        match self.config.seed {
            Some(seed) => println!("Seed: {seed}"),
            None => println!("Seed: (entropy)"),
        }
        println!("Library Version: {}", self.metadata.library_version);
        println!("Created: {}", self.metadata.created_at);
    }
}
