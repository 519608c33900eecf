//! Held-out evaluation of a fitted model.
//!
//! Uses the same [`mean_squared_error`] as training, so a test figure is
//! directly comparable with the trace's training and validation losses.

use crate::dataset::{ScaledDataset, TargetColumn, TARGET_COUNT};
use crate::error::{Result, TransferError};
use crate::loss::mean_squared_error;
use crate::model::{Fitted, InferenceModel, MlpModel};
use ndarray::Axis;
use serde::Serialize;

/// Joint MSE over all `n * 6` scaled entries of the test split.
///
/// # Errors
/// `Data` if the split is empty.
pub fn evaluate(model: &MlpModel<Fitted>, test: &ScaledDataset) -> Result<f64> {
    ensure_not_empty(test)?;
    let predictions = model.predict_batch(test.x());
    Ok(mean_squared_error(&predictions, test.y()))
}

/// MSE of one target column over the test split.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TargetError {
    pub target: TargetColumn,
    pub mse: f64,
}

/// One MSE per target column, in output order.
pub fn evaluate_per_target(
    model: &MlpModel<Fitted>,
    test: &ScaledDataset,
) -> Result<[TargetError; TARGET_COUNT]> {
    ensure_not_empty(test)?;
    let predictions = model.predict_batch(test.x());
    let squared = (&predictions - test.y()).mapv(|d| d * d);
    let means = squared
        .mean_axis(Axis(0))
        .ok_or_else(|| TransferError::Data("test split is empty".into()))?;

    Ok(TargetColumn::ALL.map(|target| TargetError {
        target,
        mse: means[target.index()],
    }))
}

fn ensure_not_empty(test: &ScaledDataset) -> Result<()> {
    if test.is_empty() {
        return Err(TransferError::Data("test split is empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MlpRegressor;
    use crate::model::TrainableModel;
    use ndarray::{array, Array2};

    fn model() -> MlpModel<Fitted> {
        MlpRegressor::new(4).into_fitted()
    }

    #[test]
    fn test_evaluate_matches_manual_mse() {
        let model = model();
        let x = array![[-0.5], [0.0], [0.5]];
        let y = Array2::from_shape_fn((3, 6), |(i, j)| (i + j) as f64 * 0.1);
        let test = ScaledDataset::new(x.clone(), y.clone()).unwrap();

        let preds = model.predict_batch(&x);
        let manual = (&preds - &y).mapv(|d| d * d).sum() / 18.0;
        assert!((evaluate(&model, &test).unwrap() - manual).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_empty_split() {
        let test = ScaledDataset::new(Array2::zeros((0, 1)), Array2::zeros((0, 6))).unwrap();
        assert!(matches!(
            evaluate(&model(), &test),
            Err(TransferError::Data(_))
        ));
        assert!(evaluate_per_target(&model(), &test).is_err());
    }

    #[test]
    fn test_per_target_averages_to_joint_mse() {
        let model = model();
        let x = array![[-1.0], [0.2], [1.3], [0.7]];
        let y = Array2::from_shape_fn((4, 6), |(i, j)| (i as f64 - j as f64) * 0.3);
        let test = ScaledDataset::new(x, y).unwrap();

        let per_target = evaluate_per_target(&model, &test).unwrap();
        let mean: f64 = per_target.iter().map(|t| t.mse).sum::<f64>() / 6.0;
        assert!((mean - evaluate(&model, &test).unwrap()).abs() < 1e-12);
        assert_eq!(per_target[3].target, TargetColumn::Gc75Days);
    }

    #[test]
    fn test_evaluate_is_read_only() {
        let model = model();
        let before = model.params().clone();
        let test = ScaledDataset::new(array![[0.1]], Array2::zeros((1, 6))).unwrap();
        let first = evaluate(&model, &test).unwrap();
        let second = evaluate(&model, &test).unwrap();
        assert_eq!(first, second);
        assert_eq!(model.params(), &before);
    }
}
