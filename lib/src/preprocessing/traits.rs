//! Core traits for preprocessing transformers.
//!
//! This module defines the two central traits:
//! - [`Transformer`]: Used during fitting; learns parameters from data.
//! - [`FittedTransformer`]: After fitting; transforms new data with the
//!   learned parameters and exposes them as plain serializable data.

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};

/// Trait for unfitted transformers.
///
/// # Example
/// ```rust
/// use osd_transfer::preprocessing::{FittedTransformer, StandardScaler, Transformer};
/// use ndarray::array;
///
/// let data = array![[1.0], [2.0], [3.0]];
/// let fitted = StandardScaler::new().fit(&data).unwrap();
/// let scaled = fitted.transform(&data).unwrap();
/// assert!(scaled[[1, 0]].abs() < 1e-12);
/// ```
pub trait Transformer: Clone {
    /// Input data type for transformation.
    type Input;
    /// Output data type after transformation.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: Serialize + DeserializeOwned;
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer<Params = Self::Params, Input = Self::Input, Output = Self::Output>;

    /// Fit the transformer to the data.
    ///
    /// # Errors
    /// - `Data` if the data is empty
    /// - `Numeric` if the data contains NaN or infinite values
    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted>;

    /// Fit the transformer and transform the data in one step.
    fn fit_transform(&self, data: &Self::Input) -> Result<Self::Output> {
        self.fit(data)?.transform(data)
    }
}

/// Trait for fitted transformers ready for inference.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` is a round-trip.
/// - `inverse_transform(transform(x)) == x` up to floating-point error.
pub trait FittedTransformer: Clone {
    /// Input data type for transformation.
    type Input;
    /// Output data type after transformation.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: Serialize + DeserializeOwned;

    /// Transform data using learned parameters.
    ///
    /// # Errors
    /// `FeatureMismatch` if the column count differs from the one seen during fit.
    fn transform(&self, data: &Self::Input) -> Result<Self::Output>;

    /// Reverse the transformation.
    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Input>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted transformer from parameters.
    fn from_params(params: Self::Params) -> Result<Self>
    where
        Self: Sized;

    /// Returns the number of features seen during fit.
    fn n_features_in(&self) -> usize;
}
