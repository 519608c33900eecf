//! Sample schema, scaled datasets and partitioning.
//!
//! A [`Sample`] is one gene's averaged expression for a single strain: the
//! baseline reading (`bsl_0days`) and six downstream readings in the fixed
//! order given by [`TargetColumn::ALL`]. The model output is positional, so
//! that order is the contract between data loading, training and prediction.
//!
//! # Example
//!
//! ```rust
//! use osd_transfer::dataset::{Sample, ScaledDataset};
//! use ndarray::{array, Array2};
//!
//! let sample = Sample::new("ENSMUSG00000000001", 9.35, [9.1, 9.0, 9.3, 9.2, 9.4, 9.3]);
//! assert!(sample.check_finite().is_ok());
//!
//! let data = ScaledDataset::new(array![[0.0], [1.0]], Array2::zeros((2, 6))).unwrap();
//! assert_eq!(data.len(), 2);
//! ```

use crate::error::{Result, TransferError};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod aggregate;
pub mod source;
pub mod split;

pub use self::source::{complete_samples, CsvRowSource, RawRow, RowSource, VecRowSource};
pub use self::split::{Partitioner, Split};

/// Number of predicted measurements per sample.
pub const TARGET_COUNT: usize = 6;

/// Column name of the baseline reading, without strain prefix.
pub const BASELINE_COLUMN: &str = "bsl_0days_avg";

/// One of the six downstream measurements, in model output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetColumn {
    Flt25Days,
    Flt75Days,
    Gc25Days,
    Gc75Days,
    Viv25Days,
    Viv75Days,
}

impl TargetColumn {
    /// All targets in output order.
    pub const ALL: [TargetColumn; TARGET_COUNT] = [
        TargetColumn::Flt25Days,
        TargetColumn::Flt75Days,
        TargetColumn::Gc25Days,
        TargetColumn::Gc75Days,
        TargetColumn::Viv25Days,
        TargetColumn::Viv75Days,
    ];

    /// Position of this target in a target vector.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name as stored in the per-strain tables (`flt_25days_avg`, ...).
    pub fn column_name(self) -> &'static str {
        match self {
            TargetColumn::Flt25Days => "flt_25days_avg",
            TargetColumn::Flt75Days => "flt_75days_avg",
            TargetColumn::Gc25Days => "gc_25days_avg",
            TargetColumn::Gc75Days => "gc_75days_avg",
            TargetColumn::Viv25Days => "viv_25days_avg",
            TargetColumn::Viv75Days => "viv_75days_avg",
        }
    }
}

impl fmt::Display for TargetColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Mouse strain of study OSD-253; each strain is trained independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strain {
    #[serde(rename = "c3h_hej")]
    C3hHej,
    #[serde(rename = "c57_6j")]
    C57Bl6j,
}

impl Strain {
    pub const ALL: [Strain; 2] = [Strain::C3hHej, Strain::C57Bl6j];

    /// Column prefix used in processed CSV files (`c57_6j`).
    pub fn prefix(self) -> &'static str {
        match self {
            Strain::C3hHej => "c3h_hej",
            Strain::C57Bl6j => "c57_6j",
        }
    }

    /// Name of the strain's table in the relational store.
    pub fn table_name(self) -> &'static str {
        match self {
            Strain::C3hHej => "c3h_hej_data",
            Strain::C57Bl6j => "c57_6j_data",
        }
    }

    /// Parses either the prefix (`c3h_hej`) or the table name (`c3h_hej_data`).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace('-', "_");
        Strain::ALL
            .into_iter()
            .find(|s| name == s.prefix() || name == s.table_name())
    }
}

impl fmt::Display for Strain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// One biological record: a baseline reading and its six downstream readings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Opaque identifier (Ensembl gene id); not seen by the model.
    pub id: String,
    pub baseline: f64,
    pub targets: [f64; TARGET_COUNT],
}

impl Sample {
    pub fn new(id: impl Into<String>, baseline: f64, targets: [f64; TARGET_COUNT]) -> Self {
        Self {
            id: id.into(),
            baseline,
            targets,
        }
    }

    /// Returns a `Numeric` error if the baseline or any target is NaN or infinite.
    pub fn check_finite(&self) -> Result<()> {
        if !self.baseline.is_finite() {
            return Err(TransferError::Numeric(format!(
                "sample {}: baseline is {}",
                self.id, self.baseline
            )));
        }
        if let Some(col) = TargetColumn::ALL
            .iter()
            .find(|c| !self.targets[c.index()].is_finite())
        {
            return Err(TransferError::Numeric(format!(
                "sample {}: {} is {}",
                self.id,
                col,
                self.targets[col.index()]
            )));
        }
        Ok(())
    }
}

/// Splits samples into a baseline column `(n, 1)` and a target block `(n, 6)`.
pub fn to_arrays(samples: &[Sample]) -> (Array2<f64>, Array2<f64>) {
    let n = samples.len();
    let baseline = Array2::from_shape_fn((n, 1), |(i, _)| samples[i].baseline);
    let targets = Array2::from_shape_fn((n, TARGET_COUNT), |(i, j)| samples[i].targets[j]);
    (baseline, targets)
}

/// Standardized inputs and targets, row-aligned.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaledDataset {
    x: Array2<f64>,
    y: Array2<f64>,
}

impl ScaledDataset {
    /// Pairs an input matrix `(n, 1)` with a target matrix `(n, 6)`.
    ///
    /// # Errors
    /// - `Data` if the row counts differ
    /// - `FeatureMismatch` if the input is not one wide or the targets not six wide
    pub fn new(x: Array2<f64>, y: Array2<f64>) -> Result<Self> {
        if x.ncols() != 1 {
            return Err(TransferError::FeatureMismatch {
                expected: 1,
                got: x.ncols(),
            });
        }
        if x.nrows() != y.nrows() {
            return Err(TransferError::Data(format!(
                "inputs have {} rows but targets have {}",
                x.nrows(),
                y.nrows()
            )));
        }
        if y.ncols() != TARGET_COUNT {
            return Err(TransferError::FeatureMismatch {
                expected: TARGET_COUNT,
                got: y.ncols(),
            });
        }
        Ok(Self { x, y })
    }

    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array2<f64> {
        &self.y
    }

    /// Copies the rows at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> ScaledDataset {
        ScaledDataset {
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
        }
    }
}
