//! Row sources: where raw `(id, baseline, targets)` records come from.
//!
//! The training core only needs complete, finite [`Sample`]s. Sources yield
//! [`RawRow`]s whose cells may be missing; [`complete_samples`] is the
//! boundary filter that drops incomplete rows before any scaler is fit.

use crate::dataset::{Sample, Strain, TargetColumn, BASELINE_COLUMN, TARGET_COUNT};
use crate::error::{Result, TransferError};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Identifier column names accepted in CSV headers, compared case-insensitively.
const ID_COLUMNS: [&str; 3] = ["ensmbl_id", "ensembl_id", "protein_id"];

/// A record as delivered by a source, before null filtering.
#[derive(Clone, Debug, PartialEq)]
pub struct RawRow {
    pub id: String,
    pub baseline: Option<f64>,
    pub targets: [Option<f64>; TARGET_COUNT],
}

impl RawRow {
    /// Converts to a [`Sample`] if no cell is missing.
    pub fn into_sample(self) -> Option<Sample> {
        let baseline = self.baseline?;
        let mut targets = [0.0; TARGET_COUNT];
        for (slot, cell) in targets.iter_mut().zip(self.targets) {
            *slot = cell?;
        }
        Some(Sample {
            id: self.id,
            baseline,
            targets,
        })
    }
}

impl From<Sample> for RawRow {
    fn from(sample: Sample) -> Self {
        RawRow {
            id: sample.id,
            baseline: Some(sample.baseline),
            targets: sample.targets.map(Some),
        }
    }
}

/// Delivers the ordered rows of one strain's table.
pub trait RowSource {
    fn rows(&self) -> Result<Vec<RawRow>>;
}

/// Drops rows with any missing cell and checks the rest for non-finite values.
///
/// # Errors
/// - `Data` if no complete row remains
/// - `Numeric` if a present value is NaN or infinite
pub fn complete_samples(rows: Vec<RawRow>) -> Result<Vec<Sample>> {
    let total = rows.len();
    let samples: Vec<Sample> = rows.into_iter().filter_map(RawRow::into_sample).collect();

    let dropped = total - samples.len();
    if dropped > 0 {
        warn!(dropped, total, "dropped rows with missing values");
    }
    if samples.is_empty() {
        return Err(TransferError::Data(format!(
            "no complete rows among {} delivered",
            total
        )));
    }
    for sample in &samples {
        sample.check_finite()?;
    }
    Ok(samples)
}

/// In-memory source, mostly for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct VecRowSource {
    rows: Vec<RawRow>,
}

impl VecRowSource {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }
}

impl From<Vec<Sample>> for VecRowSource {
    fn from(samples: Vec<Sample>) -> Self {
        Self::new(samples.into_iter().map(RawRow::from).collect())
    }
}

impl RowSource for VecRowSource {
    fn rows(&self) -> Result<Vec<RawRow>> {
        Ok(self.rows.clone())
    }
}

/// Reads a processed per-strain CSV.
///
/// Accepts both the strain-prefixed headers written by the aggregation step
/// (`c57_6j_bsl_0days_avg`) and the bare table column names
/// (`bsl_0days_avg`). Empty, `NaN`, `NA` and `NULL` cells are missing.
#[derive(Clone, Debug)]
pub struct CsvRowSource {
    path: PathBuf,
    strain: Option<Strain>,
}

impl CsvRowSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            strain: None,
        }
    }

    /// Prefers `<strain>_`-prefixed column names when present.
    pub fn with_strain(mut self, strain: Strain) -> Self {
        self.strain = Some(strain);
        self
    }

    /// Parses rows from any reader with the same rules as [`RowSource::rows`].
    pub fn read_rows<R: Read>(&self, reader: R) -> Result<Vec<RawRow>> {
        let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.to_ascii_lowercase())
            .collect();

        let id_col = headers
            .iter()
            .position(|h| ID_COLUMNS.contains(&h.as_str()))
            .ok_or_else(|| {
                TransferError::Data(format!(
                    "no identifier column (one of {:?}) in {}",
                    ID_COLUMNS,
                    self.path.display()
                ))
            })?;
        let baseline_col = self.locate(&headers, BASELINE_COLUMN)?;
        let mut target_cols = [0usize; TARGET_COUNT];
        for col in TargetColumn::ALL {
            target_cols[col.index()] = self.locate(&headers, col.column_name())?;
        }

        let mut rows = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            // header is line 1
            let line = i + 2;
            let id = record.get(id_col).unwrap_or_default().to_string();
            let baseline = parse_cell(record.get(baseline_col), line)?;
            let mut targets = [None; TARGET_COUNT];
            for (slot, &col) in targets.iter_mut().zip(target_cols.iter()) {
                *slot = parse_cell(record.get(col), line)?;
            }
            rows.push(RawRow {
                id,
                baseline,
                targets,
            });
        }
        debug!(rows = rows.len(), path = %self.path.display(), "read csv rows");
        Ok(rows)
    }

    fn locate(&self, headers: &[String], column: &str) -> Result<usize> {
        let mut candidates = Vec::with_capacity(Strain::ALL.len() + 1);
        if let Some(strain) = self.strain {
            candidates.push(format!("{}_{}", strain.prefix(), column));
        }
        candidates.push(column.to_string());
        if self.strain.is_none() {
            candidates.extend(Strain::ALL.iter().map(|s| format!("{}_{}", s.prefix(), column)));
        }

        candidates
            .iter()
            .find_map(|name| headers.iter().position(|h| h == name))
            .ok_or_else(|| {
                TransferError::Data(format!(
                    "column {} not found in {}",
                    column,
                    self.path.display()
                ))
            })
    }
}

impl RowSource for CsvRowSource {
    fn rows(&self) -> Result<Vec<RawRow>> {
        let file = File::open(&self.path)?;
        self.read_rows(BufReader::new(file))
    }
}

fn parse_cell(cell: Option<&str>, line: usize) -> Result<Option<f64>> {
    let cell = match cell {
        Some(c) => c.trim(),
        None => return Ok(None),
    };
    if cell.is_empty()
        || ["nan", "na", "null", "none"]
            .iter()
            .any(|m| cell.eq_ignore_ascii_case(m))
    {
        return Ok(None);
    }
    cell.parse::<f64>().map(Some).map_err(|_| {
        TransferError::Data(format!("line {}: cannot parse {:?} as a number", line, cell))
    })
}
