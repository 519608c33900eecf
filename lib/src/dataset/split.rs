//! Seeded train / validation / test partitioning.
//!
//! The split is two-stage: a holdout of roughly 30% of the samples is carved
//! off first, then the holdout is divided evenly into validation and test.
//! Membership depends only on the seed and the sample count, so re-running
//! with the same seed reproduces the same partition.

use crate::error::{Result, TransferError};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

/// Smallest sample count for which all three partitions are non-empty.
pub const MIN_SAMPLES: usize = 3;

/// Disjoint index sets covering `0..n` exactly once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

impl Split {
    /// Total number of indices across the three partitions.
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Deterministic two-stage splitter.
///
/// Defaults:
/// - `holdout_fraction`: 0.3
/// - `test_fraction`: 0.5 (share of the holdout that becomes the test split)
#[derive(Clone, Debug)]
pub struct Partitioner {
    seed: u64,
    holdout_fraction: f64,
    test_fraction: f64,
}

impl Partitioner {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            holdout_fraction: 0.3,
            test_fraction: 0.5,
        }
    }

    pub fn holdout_fraction(mut self, fraction: f64) -> Self {
        self.holdout_fraction = fraction;
        self
    }

    pub fn test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Partitions the indices `0..n`.
    ///
    /// Sizes: `holdout = max(ceil(holdout_fraction * n), 2)`,
    /// `test = ceil(test_fraction * holdout)`, `validation = holdout - test`,
    /// `train = n - holdout`, each clamped so no partition is empty.
    ///
    /// # Errors
    /// - `Data` if `n < 3`
    /// - `InvalidParameter` if a fraction lies outside `(0, 1)`
    pub fn split(&self, n: usize) -> Result<Split> {
        if n < MIN_SAMPLES {
            return Err(TransferError::Data(format!(
                "need at least {} samples for a train/validation/test split, got {}",
                MIN_SAMPLES, n
            )));
        }
        for (name, value) in [
            ("holdout_fraction", self.holdout_fraction),
            ("test_fraction", self.test_fraction),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(TransferError::InvalidParameter(format!(
                    "{} must lie in (0, 1), got {}",
                    name, value
                )));
            }
        }

        let holdout_len = ((self.holdout_fraction * n as f64).ceil() as usize).clamp(2, n - 1);
        let test_len = ((self.test_fraction * holdout_len as f64).ceil() as usize)
            .clamp(1, holdout_len - 1);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);

        let train = indices.split_off(holdout_len);
        let mut holdout = indices;
        holdout.shuffle(&mut rng);
        let validation = holdout.split_off(test_len);
        let test = holdout;

        Ok(Split {
            train,
            validation,
            test,
        })
    }
}

impl Default for Partitioner {
    fn default() -> Self {
        Self::new(42)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn assert_exhaustive(split: &Split, n: usize) {
        let all: HashSet<usize> = split
            .train
            .iter()
            .chain(&split.validation)
            .chain(&split.test)
            .copied()
            .collect();
        assert_eq!(all.len(), n, "partitions overlap");
        assert_eq!(split.len(), n);
        assert_eq!(all, (0..n).collect::<HashSet<_>>());
    }

    #[test]
    fn test_split_sizes_twenty() {
        let split = Partitioner::new(42).split(20).unwrap();
        assert_eq!(split.train.len(), 14);
        assert_eq!(split.validation.len(), 3);
        assert_eq!(split.test.len(), 3);
        assert_exhaustive(&split, 20);
    }

    #[test]
    fn test_split_sizes_hundred() {
        let split = Partitioner::new(7).split(100).unwrap();
        assert_eq!(split.train.len(), 70);
        assert_eq!(split.validation.len(), 15);
        assert_eq!(split.test.len(), 15);
    }

    #[test]
    fn test_split_minimum_size() {
        let split = Partitioner::new(0).split(3).unwrap();
        assert_eq!(split.train.len(), 1);
        assert_eq!(split.validation.len(), 1);
        assert_eq!(split.test.len(), 1);
    }

    #[test]
    fn test_split_too_small() {
        assert!(matches!(
            Partitioner::new(0).split(2),
            Err(TransferError::Data(_))
        ));
        assert!(matches!(
            Partitioner::new(0).split(0),
            Err(TransferError::Data(_))
        ));
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let result = Partitioner::new(0).holdout_fraction(1.0).split(10);
        assert!(matches!(result, Err(TransferError::InvalidParameter(_))));
        let result = Partitioner::new(0).test_fraction(0.0).split(10);
        assert!(matches!(result, Err(TransferError::InvalidParameter(_))));
    }

    #[test]
    fn test_split_different_seeds_differ() {
        let a = Partitioner::new(1).split(50).unwrap();
        let b = Partitioner::new(2).split(50).unwrap();
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn prop_split_disjoint_and_exhaustive(n in 3usize..300, seed in any::<u64>()) {
            let split = Partitioner::new(seed).split(n).unwrap();
            assert_exhaustive(&split, n);
            prop_assert!(!split.train.is_empty());
            prop_assert!(!split.validation.is_empty());
            prop_assert!(!split.test.is_empty());
        }

        #[test]
        fn prop_split_reproducible(n in 3usize..300, seed in any::<u64>()) {
            let first = Partitioner::new(seed).split(n).unwrap();
            let second = Partitioner::new(seed).split(n).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
