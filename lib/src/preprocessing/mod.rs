//! Data preprocessing transformers.
//!
//! Transformers follow the same fitted/unfitted split as models: an unfitted
//! [`Transformer`] learns parameters with `fit`, producing a
//! [`FittedTransformer`] that can `transform` and `inverse_transform`.
//!
//! The pipeline fits two independent [`StandardScaler`]s on the full dataset
//! before it is split: one over the baseline column and one over the six
//! target columns. Both are reused unchanged for every split and for
//! inference.
//!
//! # Example
//!
//! ```rust
//! use osd_transfer::preprocessing::{FittedTransformer, StandardScaler, Transformer};
//! use ndarray::array;
//!
//! let targets = array![[1.0, 10.0], [3.0, 10.0]];
//! let scaler = StandardScaler::new().fit(&targets).unwrap();
//!
//! let scaled = scaler.transform(&targets).unwrap();
//! assert_eq!(scaled, array![[-1.0, 0.0], [1.0, 0.0]]);
//!
//! let restored = scaler.inverse_transform(&scaled).unwrap();
//! assert_eq!(restored, targets);
//! ```

pub mod scaling;
pub mod traits;

pub use scaling::{FittedStandardScaler, StandardScaler, StandardScalerParams};
pub use traits::{FittedTransformer, Transformer};
