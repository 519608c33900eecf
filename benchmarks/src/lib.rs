//! Synthetic strain tables for the osd-transfer benchmarks.
//!
//! Real tables hold a few thousand genes per strain; the generator produces
//! rows of the same shape with `target_i = 2 * baseline + i` plus uniform noise.

use osd_transfer::dataset::{to_arrays, Partitioner, Sample, ScaledDataset};
use osd_transfer::preprocessing::{StandardScaler, Transformer};
use osd_transfer::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// `n` samples with baselines drawn from `[2, 14)`.
pub fn synthetic_samples(n: usize, seed: u64) -> Vec<Sample> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|k| {
            let baseline = rng.gen_range(2.0..14.0);
            let mut targets = [0.0; 6];
            for (i, t) in targets.iter_mut().enumerate() {
                *t = 2.0 * baseline + i as f64 + rng.gen_range(-0.25..0.25);
            }
            Sample::new(format!("ENSMUSG{:011}", k), baseline, targets)
        })
        .collect()
}

/// Scaled train and validation splits, as the trainer sees them.
pub fn scaled_splits(n: usize, seed: u64) -> Result<(ScaledDataset, ScaledDataset)> {
    let samples = synthetic_samples(n, seed);
    let (x, y) = to_arrays(&samples);
    let data = ScaledDataset::new(
        StandardScaler::new().fit_transform(&x)?,
        StandardScaler::new().fit_transform(&y)?,
    )?;
    let split = Partitioner::default().split(n)?;
    Ok((data.select(&split.train), data.select(&split.validation)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_samples_are_reproducible() {
        assert_eq!(synthetic_samples(5, 1), synthetic_samples(5, 1));
        assert!(synthetic_samples(50, 2).iter().all(|s| s.check_finite().is_ok()));
    }

    #[test]
    fn test_scaled_splits_sizes() {
        let (train, validation) = scaled_splits(100, 0).unwrap();
        assert_eq!(train.len(), 70);
        assert_eq!(validation.len(), 15);
    }
}
