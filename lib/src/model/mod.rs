//! Models with their training state encoded in the type.
//!
//! [`TrainableModel`] is what the trainer drives; [`InferenceModel`] is all a
//! fitted model exposes. [`ParamOps`] is the element-wise algebra optimizers
//! need over a model's parameter set.

pub mod mlp;
pub mod state;

pub use mlp::{Activation, LayerSpec, MlpModel, MlpParams, MlpRegressor, TRANSFER_ARCHITECTURE};
pub use state::{Fitted, Unfitted};

pub trait TrainableModel {
    type Input;
    type Prediction;
    type Params;
    type Gradients;
    type Output;

    fn forward(&self, input: &Self::Input) -> Self::Prediction;
    fn backward(&self, input: &Self::Input, grad_output: &Self::Prediction) -> Self::Gradients;
    fn params(&self) -> &Self::Params;
    fn update_params(&mut self, new_params: &Self::Params);

    fn into_fitted(self) -> Self::Output;
}

/// Element-wise arithmetic over a full parameter set.
pub trait ParamOps: Clone {
    fn add(&self, other: &Self) -> Self;
    fn scale(&self, scalar: f64) -> Self;

    /// Applies `f` to every parameter.
    fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self;

    /// Combines two parameter sets of the same shape element by element.
    fn zip_map<F: Fn(f64, f64) -> f64>(&self, other: &Self, f: F) -> Self;

    fn all_finite(&self) -> bool;
}

pub trait InferenceModel {
    type InputSingle;
    type OutputSingle;
    type InputBatch;
    type OutputBatch;
    fn predict(&self, input: &Self::InputSingle) -> Self::OutputSingle;
    fn predict_batch(&self, input: &Self::InputBatch) -> Self::OutputBatch;
}
