//! End-to-end training run for one strain.
//!
//! [`TransferPipeline`] threads every piece of run state explicitly: the two
//! fitted scalers, the split, the model parameters and the loss trace all come
//! back in a [`PipelineOutcome`]. Nothing is global, so independent runs can
//! happen side by side.
//!
//! ```text
//! samples -> scalers (fit on all rows) -> split -> trainer -> evaluate(test)
//!                                                         -> Predictor
//! ```

use crate::config::{OptimizerKind, TransferConfig};
use crate::dataset::split::MIN_SAMPLES;
use crate::dataset::{
    complete_samples, to_arrays, Partitioner, RowSource, Sample, ScaledDataset, Split, TARGET_COUNT,
};
use crate::error::{Result, TransferError};
use crate::evaluation::{evaluate, evaluate_per_target, TargetError};
use crate::loss::MSELoss;
use crate::model::{Fitted, MlpModel, MlpParams, MlpRegressor};
use crate::optimizer::{Adam, Optimizer, SGD};
use crate::predictor::Predictor;
use crate::preprocessing::{FittedTransformer, StandardScaler, Transformer};
use crate::trainer::{LossTrace, Trainer};
use tracing::{debug, info};

/// Everything a finished run produced.
#[derive(Clone, Debug)]
pub struct PipelineOutcome {
    pub predictor: Predictor,
    pub trace: LossTrace,
    /// Joint MSE on the test split, in scaled units.
    pub test_mse: f64,
    pub per_target_mse: [TargetError; TARGET_COUNT],
    pub split: Split,
}

#[derive(Clone, Debug, Default)]
pub struct TransferPipeline {
    config: TransferConfig,
}

impl TransferPipeline {
    /// # Errors
    /// `InvalidParameter` if the config does not validate.
    pub fn new(config: TransferConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Pulls rows from `source`, drops incomplete ones and runs on the rest.
    pub fn run_source<S: RowSource + ?Sized>(&self, source: &S) -> Result<PipelineOutcome> {
        let samples = complete_samples(source.rows()?)?;
        self.run(&samples)
    }

    /// Scales, splits, trains and evaluates on complete samples.
    ///
    /// # Errors
    /// - `Data` if fewer than three samples are given
    /// - `Numeric` if a sample is non-finite or training diverges
    pub fn run(&self, samples: &[Sample]) -> Result<PipelineOutcome> {
        if samples.len() < MIN_SAMPLES {
            return Err(TransferError::Data(format!(
                "need at least {} samples, got {}",
                MIN_SAMPLES,
                samples.len()
            )));
        }
        for sample in samples {
            sample.check_finite()?;
        }

        let (raw_x, raw_y) = to_arrays(samples);
        let input_scaler = StandardScaler::new().fit(&raw_x)?;
        let target_scaler = StandardScaler::new().fit(&raw_y)?;
        let data = ScaledDataset::new(
            input_scaler.transform(&raw_x)?,
            target_scaler.transform(&raw_y)?,
        )?;

        let split = Partitioner::new(self.config.split_seed)
            .holdout_fraction(self.config.holdout_fraction)
            .test_fraction(self.config.test_fraction)
            .split(data.len())?;
        info!(
            train = split.train.len(),
            validation = split.validation.len(),
            test = split.test.len(),
            "partitioned samples"
        );
        let train = data.select(&split.train);
        let validation = data.select(&split.validation);
        let test = data.select(&split.test);

        let lr = self.config.learning_rate;
        let (model, trace) = match self.config.optimizer {
            OptimizerKind::Adam => self.train(Adam::new(lr), &train, &validation)?,
            OptimizerKind::Sgd => self.train(SGD::new(lr), &train, &validation)?,
        };

        let test_mse = evaluate(&model, &test)?;
        let per_target_mse = evaluate_per_target(&model, &test)?;
        info!(test_mse, epochs = trace.len(), "training finished");
        for t in &per_target_mse {
            debug!(column = %t.target, mse = t.mse, "test error");
        }

        Ok(PipelineOutcome {
            predictor: Predictor::new(model, input_scaler, target_scaler)?,
            trace,
            test_mse,
            per_target_mse,
            split,
        })
    }

    fn train<O>(
        &self,
        optimizer: O,
        train: &ScaledDataset,
        validation: &ScaledDataset,
    ) -> Result<(MlpModel<Fitted>, LossTrace)>
    where
        O: Optimizer<MlpParams> + Clone,
    {
        let trainer: Trainer<MSELoss, O, MlpRegressor, MlpParams> =
            Trainer::builder(MSELoss, optimizer)
                .max_epochs(self.config.epochs)
                .verbose(self.config.verbose)
                .build();
        trainer.fit(MlpRegressor::new(self.config.init_seed), train, validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{RawRow, VecRowSource};

    fn samples(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|k| {
                let b = 5.0 + k as f64 * 0.5;
                Sample::new(format!("g{}", k), b, [0, 1, 2, 3, 4, 5].map(|i| 2.0 * b + i as f64))
            })
            .collect()
    }

    fn quiet(epochs: usize) -> TransferPipeline {
        TransferPipeline::new(TransferConfig {
            epochs,
            verbose: false,
            ..TransferConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_new_validates_config() {
        let config = TransferConfig {
            epochs: 0,
            ..TransferConfig::default()
        };
        assert!(matches!(
            TransferPipeline::new(config),
            Err(TransferError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_run_too_few_samples() {
        assert!(matches!(
            quiet(5).run(&samples(2)),
            Err(TransferError::Data(_))
        ));
    }

    #[test]
    fn test_run_non_finite_sample() {
        let mut data = samples(10);
        data[4].targets[1] = f64::NAN;
        assert!(matches!(
            quiet(5).run(&data),
            Err(TransferError::Numeric(_))
        ));
    }

    #[test]
    fn test_run_outcome_shape() {
        let outcome = quiet(10).run(&samples(20)).unwrap();
        assert_eq!(outcome.trace.len(), 10);
        assert_eq!(outcome.split.train.len(), 14);
        assert_eq!(outcome.split.len(), 20);
        assert!(outcome.test_mse.is_finite());
        assert_eq!(outcome.predictor.input_scaler().n_features_in(), 1);
    }

    #[test]
    fn test_run_is_deterministic() {
        let a = quiet(15).run(&samples(12)).unwrap();
        let b = quiet(15).run(&samples(12)).unwrap();
        assert_eq!(a.split, b.split);
        assert_eq!(a.trace, b.trace);
        assert_eq!(a.test_mse, b.test_mse);
    }

    #[test]
    fn test_run_with_sgd() {
        let pipeline = TransferPipeline::new(TransferConfig {
            epochs: 20,
            learning_rate: 0.01,
            optimizer: OptimizerKind::Sgd,
            verbose: false,
            ..TransferConfig::default()
        })
        .unwrap();
        let outcome = pipeline.run(&samples(10)).unwrap();
        assert_eq!(outcome.trace.len(), 20);
    }

    #[test]
    fn test_run_source_drops_incomplete_rows() {
        let mut rows: Vec<RawRow> = samples(6).into_iter().map(RawRow::from).collect();
        rows[2].targets[3] = None;
        rows[5].baseline = None;
        let outcome = quiet(3).run_source(&VecRowSource::new(rows)).unwrap();
        assert_eq!(outcome.split.len(), 4);
    }

    #[test]
    fn test_run_source_all_incomplete() {
        let rows = vec![RawRow {
            id: "x".into(),
            baseline: None,
            targets: [None; 6],
        }];
        assert!(matches!(
            quiet(3).run_source(&VecRowSource::new(rows)),
            Err(TransferError::Data(_))
        ));
    }
}
