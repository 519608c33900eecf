//! Post-training inference in physical units.
//!
//! A [`Predictor`] bundles the fitted network with the two scalers it was
//! trained against, so a raw baseline goes in and six raw readings come out:
//!
//! ```text
//! baseline -> input scaler -> network -> inverse target scaler -> TargetVector
//! ```

use crate::dataset::{TargetColumn, TARGET_COUNT};
use crate::error::{Result, TransferError};
use crate::model::{Fitted, InferenceModel, MlpModel};
use crate::preprocessing::{FittedStandardScaler, FittedTransformer};
use ndarray::Array2;
use serde::{Serialize, Serializer};

/// Six predicted readings in [`TargetColumn::ALL`] order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetVector {
    values: [f64; TARGET_COUNT],
}

impl TargetVector {
    pub fn new(values: [f64; TARGET_COUNT]) -> Self {
        Self { values }
    }

    pub fn get(&self, column: TargetColumn) -> f64 {
        self.values[column.index()]
    }

    pub fn values(&self) -> &[f64; TARGET_COUNT] {
        &self.values
    }

    /// Pairs every value with its column.
    pub fn iter(&self) -> impl Iterator<Item = (TargetColumn, f64)> + '_ {
        TargetColumn::ALL.iter().map(move |c| (*c, self.get(*c)))
    }
}

/// Serializes as a map from column name to value, in output order.
impl Serialize for TargetVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(c, v)| (c.column_name(), v)))
    }
}

/// Fitted model plus the scalers it was trained with. Inference only.
#[derive(Clone, Debug)]
pub struct Predictor {
    model: MlpModel<Fitted>,
    input_scaler: FittedStandardScaler,
    target_scaler: FittedStandardScaler,
}

impl Predictor {
    /// # Errors
    /// `FeatureMismatch` if the input scaler is not one column wide or the
    /// target scaler not six.
    pub fn new(
        model: MlpModel<Fitted>,
        input_scaler: FittedStandardScaler,
        target_scaler: FittedStandardScaler,
    ) -> Result<Self> {
        if input_scaler.n_features_in() != 1 {
            return Err(TransferError::FeatureMismatch {
                expected: 1,
                got: input_scaler.n_features_in(),
            });
        }
        if target_scaler.n_features_in() != TARGET_COUNT {
            return Err(TransferError::FeatureMismatch {
                expected: TARGET_COUNT,
                got: target_scaler.n_features_in(),
            });
        }
        Ok(Self {
            model,
            input_scaler,
            target_scaler,
        })
    }

    pub fn model(&self) -> &MlpModel<Fitted> {
        &self.model
    }

    pub fn input_scaler(&self) -> &FittedStandardScaler {
        &self.input_scaler
    }

    pub fn target_scaler(&self) -> &FittedStandardScaler {
        &self.target_scaler
    }

    /// Predicts the six readings for one raw baseline.
    ///
    /// # Errors
    /// `InvalidInput` if `baseline` is NaN or infinite. The predictor stays
    /// usable afterwards.
    pub fn predict(&self, baseline: f64) -> Result<TargetVector> {
        let mut out = self.predict_many(&[baseline])?;
        out.pop()
            .ok_or_else(|| TransferError::InvalidInput("no prediction produced".into()))
    }

    /// Predicts for several raw baselines at once, in input order.
    pub fn predict_many(&self, baselines: &[f64]) -> Result<Vec<TargetVector>> {
        if let Some((i, v)) = baselines.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(TransferError::InvalidInput(format!(
                "baseline #{} is {}, expected a finite number",
                i, v
            )));
        }

        let raw = Array2::from_shape_fn((baselines.len(), 1), |(i, _)| baselines[i]);
        let scaled = self.input_scaler.transform(&raw)?;
        let outputs = self.model.predict_batch(&scaled);
        let physical = self.target_scaler.inverse_transform(&outputs)?;

        Ok(physical
            .rows()
            .into_iter()
            .map(|row| {
                let mut values = [0.0; TARGET_COUNT];
                for (slot, v) in values.iter_mut().zip(row.iter()) {
                    *slot = *v;
                }
                TargetVector::new(values)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MlpRegressor, TrainableModel};
    use crate::preprocessing::{StandardScaler, Transformer};
    use ndarray::array;

    fn predictor() -> Predictor {
        let inputs = array![[8.0], [9.0], [10.0]];
        let targets = Array2::from_shape_fn((3, 6), |(i, j)| 8.0 + i as f64 + 0.1 * j as f64);
        Predictor::new(
            MlpRegressor::new(0).into_fitted(),
            StandardScaler::new().fit(&inputs).unwrap(),
            StandardScaler::new().fit(&targets).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_predict_inverts_both_scalers() {
        let p = predictor();
        let raw = 9.5;
        let scaled = (raw - p.input_scaler().mean()[0]) / p.input_scaler().std()[0];
        let net = p.model().predict(&scaled);

        let out = p.predict(raw).unwrap();
        for col in TargetColumn::ALL {
            let j = col.index();
            let expected = net[j] * p.target_scaler().std()[j] + p.target_scaler().mean()[j];
            assert!((out.get(col) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_predict_rejects_non_finite() {
        let p = predictor();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(p.predict(bad), Err(TransferError::InvalidInput(_))));
        }
        // still usable
        assert!(p.predict(9.0).is_ok());
    }

    #[test]
    fn test_predict_many_matches_single() {
        let p = predictor();
        let many = p.predict_many(&[8.5, 9.35, 11.0]).unwrap();
        assert_eq!(many.len(), 3);
        let single = p.predict(9.35).unwrap();
        for (a, b) in many[1].values().iter().zip(single.values()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!(p.predict_many(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_predict_many_names_bad_index() {
        let err = predictor().predict_many(&[1.0, f64::NAN]).unwrap_err();
        assert!(err.to_string().contains("#1"));
    }

    #[test]
    fn test_new_rejects_swapped_scalers() {
        let inputs = array![[1.0], [2.0]];
        let targets = Array2::from_shape_fn((2, 6), |(i, j)| (i * j) as f64);
        let result = Predictor::new(
            MlpRegressor::new(0).into_fitted(),
            StandardScaler::new().fit(&targets).unwrap(),
            StandardScaler::new().fit(&inputs).unwrap(),
        );
        assert!(matches!(
            result,
            Err(TransferError::FeatureMismatch {
                expected: 1,
                got: 6
            })
        ));
    }

    #[test]
    fn test_target_vector_accessors_and_json() {
        let v = TargetVector::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(v.get(TargetColumn::Gc25Days), 3.0);
        assert_eq!(v.iter().count(), 6);

        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(
            json,
            r#"{"flt_25days_avg":1.0,"flt_75days_avg":2.0,"gc_25days_avg":3.0,"gc_75days_avg":4.0,"viv_25days_avg":5.0,"viv_75days_avg":6.0}"#
        );
    }
}
