//! Standard Scaler (Z-score normalization).
//!
//! Transforms features by removing the mean and scaling to unit variance.
//!
//! The standard score of a sample `x` is calculated as:
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the column mean and `s` the population standard deviation
//! (ddof = 0) of the fitted data. The inverse is `x = z * s + u`.
//!
//! A constant column has `s = 0`; it is stored as `s = 1` so the column
//! transforms to zero and inverse-transforms back to the constant.

use crate::error::{Result, TransferError};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Serializable parameters for a fitted StandardScaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerParams {
    /// Mean of each feature.
    pub mean: Vec<f64>,
    /// Standard deviation of each feature, with zeros replaced by 1.
    pub std: Vec<f64>,
    /// Number of features seen during fit.
    pub n_features: usize,
}

/// StandardScaler transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct StandardScaler;

impl StandardScaler {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for StandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = StandardScalerParams;
    type Fitted = FittedStandardScaler;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted> {
        let (rows, cols) = data.dim();

        if rows == 0 {
            return Err(TransferError::Data(
                "Cannot fit StandardScaler on empty data".to_string(),
            ));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(TransferError::Numeric(
                "Cannot fit StandardScaler on non-finite values".to_string(),
            ));
        }

        let mean = data
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(cols));
        // population std (ddof=0)
        let std = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 { 1.0 } else { s });

        Ok(FittedStandardScaler {
            mean,
            std,
            n_features: cols,
        })
    }
}

/// Fitted StandardScaler ready for inference.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedStandardScaler {
    mean: Array1<f64>,
    std: Array1<f64>,
    n_features: usize,
}

impl FittedStandardScaler {
    /// Get the mean values for each feature.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Get the standard deviation values for each feature.
    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }

    fn check_features(&self, cols: usize) -> Result<()> {
        if cols != self.n_features {
            return Err(TransferError::FeatureMismatch {
                expected: self.n_features,
                got: cols,
            });
        }
        Ok(())
    }
}

impl FittedTransformer for FittedStandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = StandardScalerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output> {
        self.check_features(data.ncols())?;
        Ok((data - &self.mean) / &self.std)
    }

    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Input> {
        self.check_features(data.ncols())?;
        Ok(data * &self.std + &self.mean)
    }

    fn extract_params(&self) -> Self::Params {
        StandardScalerParams {
            mean: self.mean.to_vec(),
            std: self.std.to_vec(),
            n_features: self.n_features,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        if params.mean.len() != params.n_features || params.std.len() != params.n_features {
            return Err(TransferError::InvalidParameter(format!(
                "scaler params hold {} means and {} stds for {} features",
                params.mean.len(),
                params.std.len(),
                params.n_features
            )));
        }
        if params.std.iter().any(|&s| !(s.is_finite() && s > 0.0)) {
            return Err(TransferError::InvalidParameter(
                "scaler std must be positive and finite".to_string(),
            ));
        }

        Ok(Self {
            mean: Array1::from(params.mean),
            std: Array1::from(params.std),
            n_features: params.n_features,
        })
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }
}
