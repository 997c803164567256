//! Approximation Sweep
//!
//! Sweeps the number of tensor sketch components at degree 4 on synthetic
//! unit-norm data and reports how closely the sketched inner products track
//! the exact polynomial kernel, along with the time spent transforming the
//! batch and scoring every pair.
//!
//! Run with `RUST_LOG=debug cargo run --example approximation_sweep` to see
//! the fitted table shapes.

use env_logger::Env;
use log::info;
use polysketch::utils::memory::explicit_feature_count;
use polysketch::utils::normalize_rows;
use polysketch::{approximation_report, PolynomialSampler, SamplerConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

const N_FEATURES: usize = 54;
const N_SAMPLES: usize = 200;
const DEGREE: usize = 4;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    println!("=== Tensor Sketch Approximation Sweep ===");
    println!(
        "Explicit degree-{DEGREE} feature space over {N_FEATURES} inputs: {} features",
        explicit_feature_count(N_FEATURES, DEGREE)
    );
    println!();

    // Non-negative features scaled to unit length
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut samples: Vec<Vec<f64>> = (0..N_SAMPLES)
        .map(|_| (0..N_FEATURES).map(|_| rng.gen::<f64>()).collect())
        .collect();
    normalize_rows(&mut samples);
    info!("Generated {} samples with {} features", N_SAMPLES, N_FEATURES);

    println!(
        "{:>12} {:>14} {:>14} {:>14} {:>12}",
        "components", "mean abs err", "max abs err", "mean rel err", "eval (ms)"
    );

    for n_components in [200, 500, 1000, 1500] {
        let mut sampler =
            PolynomialSampler::new(SamplerConfig::new(n_components, DEGREE).with_seed(0))?;
        sampler.fit(&samples[0..1])?;

        let start = Instant::now();
        let report = approximation_report(&sampler, &sampler.kernel(), &samples)?;
        let elapsed = start.elapsed();
        info!(
            "Compared {} sample pairs at {} components",
            report.n_pairs, n_components
        );

        println!(
            "{:>12} {:>14.6} {:>14.6} {:>14.4} {:>12.2}",
            n_components,
            report.mean_absolute_error,
            report.max_absolute_error,
            report.mean_relative_error,
            elapsed.as_secs_f64() * 1000.0
        );
    }

    Ok(())
}
