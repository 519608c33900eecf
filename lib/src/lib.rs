//! # osd-transfer
//!
//! Predicts six downstream expression readings of a mouse strain (flight,
//! ground control and vivarium at 25 and 75 days) from its single baseline
//! reading, using a small feed-forward regression network trained per strain.
//!
//! ## Core Design Principles
//!
//! - **Stateful Type Safety**: Models carry their training state in the type
//!   system (`Unfitted` vs `Fitted`), so an untrained network cannot predict.
//! - **Training/Inference Separation**: A fitted model holds only parameters;
//!   losses, optimizers and the training loop live in separate components.
//! - **Explicit Run State**: Scalers, split, parameters and loss trace are
//!   threaded through [`pipeline::TransferPipeline`] and returned to the caller.
//!
//! ## Quick Start
//!
//! ```rust
//! use osd_transfer::config::TransferConfig;
//! use osd_transfer::dataset::Sample;
//! use osd_transfer::pipeline::TransferPipeline;
//!
//! let samples: Vec<Sample> = (0..12)
//!     .map(|k| {
//!         let b = 8.0 + k as f64 * 0.25;
//!         Sample::new(format!("gene{}", k), b, [b, b + 0.1, b - 0.1, b + 0.2, b, b + 0.3])
//!     })
//!     .collect();
//!
//! let config = TransferConfig { epochs: 20, verbose: false, ..TransferConfig::default() };
//! let outcome = TransferPipeline::new(config)?.run(&samples)?;
//!
//! assert_eq!(outcome.trace.len(), 20);
//! let prediction = outcome.predictor.predict(9.352293386)?;
//! assert!(prediction.values().iter().all(|v| v.is_finite()));
//! # Ok::<(), osd_transfer::error::TransferError>(())
//! ```
//!
//! ## Module Structure
//!
//! - `dataset`: sample schema, row sources, replicate averaging, partitioning
//! - `preprocessing`: standard scaling of inputs and targets
//! - `model`: the 1→64→128→6 network with stateful type parameters
//! - `loss`: mean squared error shared by training, validation and test
//! - `optimizer`: parameter update algorithms (SGD, Adam)
//! - `trainer`: full-batch training loop and per-epoch loss trace
//! - `evaluation`: held-out test error
//! - `predictor`: inference in physical units
//! - `pipeline`: end-to-end run for one strain
//! - `config`: JSON run settings

/// Error type shared across the crate.
pub mod error;

/// Data loading utilities and dataset abstractions.
pub mod dataset;

/// Data preprocessing transformers.
pub mod preprocessing;

/// Differentiable loss functions for model training.
pub mod loss;

/// Machine learning models with compile-time state safety.
pub mod model;

/// Optimization algorithms for parameter updates.
pub mod optimizer;

/// High-level training loop orchestration.
pub mod trainer;

pub mod evaluation;

pub mod predictor;

pub mod pipeline;

pub mod config;

pub use error::{Result, TransferError};
