// trainer/mod.rs
use crate::{
    dataset::ScaledDataset,
    error::{Result, TransferError},
    loss::Loss,
    model::{ParamOps, TrainableModel},
    optimizer::Optimizer,
};
use ndarray::Array2;
use std::marker::PhantomData;
use tracing::{debug, info};

pub mod trace;

pub use trace::{EpochLoss, LossTrace};

/// Orchestrates the training loop for a `TrainableModel`.
///
/// Every epoch is one full-batch step: forward on the whole training split,
/// one optimizer update, then a validation pass with the updated parameters.
/// Once built via `TrainerBuilder`, it is immutable and can be reused across
/// multiple models; each run starts from a fresh clone of the optimizer.
pub struct Trainer<L, O, M, P>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
{
    pub(crate) max_epochs: usize,
    pub(crate) verbose: bool,
    pub(crate) loss_fn: L,
    pub(crate) optimizer: O,
    _phantom_model: PhantomData<(M, P)>,
}

/// Fluent builder for constructing a `Trainer` with custom hyperparameters.
///
/// Defaults:
/// - `max_epochs`: 100
/// - `verbose`: true
pub struct TrainerBuilder<L, O, M, P>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
{
    max_epochs: usize,
    verbose: bool,
    loss_fn: L,
    optimizer: O,
    _phantom_model: PhantomData<(M, P)>,
}

impl<L, O, M, P> TrainerBuilder<L, O, M, P>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
{
    /// Creates a new `TrainerBuilder` with the given components.
    ///
    /// # Arguments
    /// * `loss_fn`: differentiable loss (e.g., `MSELoss`)
    /// * `optimizer`: parameter updater (e.g., `Adam`)
    pub fn new(loss_fn: L, optimizer: O) -> Self {
        Self {
            max_epochs: 100,
            verbose: true,
            loss_fn,
            optimizer,
            _phantom_model: PhantomData,
        }
    }

    pub fn max_epochs(mut self, epochs: usize) -> Self {
        self.max_epochs = epochs;
        self
    }

    /// Sets verbosity for training output.
    ///
    /// When `true`, epoch losses are logged at `info`; otherwise at `debug`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Trainer<L, O, M, P> {
        Trainer {
            max_epochs: self.max_epochs,
            verbose: self.verbose,
            loss_fn: self.loss_fn,
            optimizer: self.optimizer,
            _phantom_model: PhantomData,
        }
    }
}

impl<L, O, M, P> Trainer<L, O, M, P>
where
    L: Loss,
    M: TrainableModel<
        Input = Array2<f64>,
        Prediction = Array2<f64>,
        Params = P,
        Gradients = P,
    >,
    O: Optimizer<P> + Clone,
    P: ParamOps,
{
    /// Trains the model for `max_epochs` and converts it for inference.
    ///
    /// # Returns
    /// The fitted model and one [`EpochLoss`] per epoch, or an error if:
    /// - The training or validation split is empty (`Data`)
    /// - A loss or an updated parameter becomes non-finite (`Numeric`)
    pub fn fit(
        &self,
        mut model: M,
        train: &ScaledDataset,
        validation: &ScaledDataset,
    ) -> Result<(M::Output, LossTrace)> {
        let mut trace = LossTrace::new();
        self.fit_in_place(&mut model, train, validation, &mut trace)?;
        Ok((model.into_fitted(), trace))
    }

    /// Runs the training loop on a caller-owned model and trace.
    ///
    /// On a `Numeric` error the epoch's candidate parameters are discarded:
    /// `model` keeps the last parameters that produced finite losses and
    /// `trace` holds only the completed epochs.
    pub fn fit_in_place(
        &self,
        model: &mut M,
        train: &ScaledDataset,
        validation: &ScaledDataset,
        trace: &mut LossTrace,
    ) -> Result<()> {
        if train.is_empty() {
            return Err(TransferError::Data("training split is empty".into()));
        }
        if validation.is_empty() {
            return Err(TransferError::Data("validation split is empty".into()));
        }

        let mut optimizer = self.optimizer.clone();
        for epoch in 1..=self.max_epochs {
            let preds = model.forward(train.x());
            let train_loss = self.loss_fn.loss(&preds, train.y());
            if !train_loss.is_finite() {
                return Err(TransferError::Numeric(format!(
                    "epoch {}: training loss is {}",
                    epoch, train_loss
                )));
            }

            let grad_preds = self.loss_fn.grad_wrt_prediction(&preds, train.y());
            let grads = model.backward(train.x(), &grad_preds);
            let candidate = optimizer.step(model.params(), &grads);
            if !candidate.all_finite() {
                return Err(TransferError::Numeric(format!(
                    "epoch {}: optimizer produced non-finite parameters",
                    epoch
                )));
            }

            let previous = model.params().clone();
            model.update_params(&candidate);
            let validation_loss = self
                .loss_fn
                .loss(&model.forward(validation.x()), validation.y());
            if !validation_loss.is_finite() {
                model.update_params(&previous);
                return Err(TransferError::Numeric(format!(
                    "epoch {}: validation loss is {}",
                    epoch, validation_loss
                )));
            }

            if self.verbose {
                info!(epoch, train_loss, validation_loss, "epoch complete");
            } else {
                debug!(epoch, train_loss, validation_loss, "epoch complete");
            }
            trace.push(EpochLoss {
                epoch,
                train_loss,
                validation_loss,
            });
        }

        Ok(())
    }
}

impl<L, O, M, P> Trainer<L, O, M, P>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
{
    /// Convenience constructor that starts the builder pattern.
    ///
    /// Equivalent to `TrainerBuilder::new(...)`.
    pub fn builder(loss_fn: L, optimizer: O) -> TrainerBuilder<L, O, M, P> {
        TrainerBuilder::new(loss_fn, optimizer)
    }
}
