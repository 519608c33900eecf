//! Per-epoch loss history.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Training and validation MSE after one completed epoch (1-based).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpochLoss {
    pub epoch: usize,
    pub train_loss: f64,
    pub validation_loss: f64,
}

/// Append-only record of completed epochs, in order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LossTrace {
    records: Vec<EpochLoss>,
}

impl LossTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EpochLoss) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[EpochLoss] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&EpochLoss> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&EpochLoss> {
        self.records.last()
    }

    /// Writes `epoch,train_loss,validation_loss` rows with a header line.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        if self.records.is_empty() {
            wtr.write_record(["epoch", "train_loss", "validation_loss"])?;
        }
        for record in &self.records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_csv(File::create(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trace() -> LossTrace {
        let mut trace = LossTrace::new();
        trace.push(EpochLoss {
            epoch: 1,
            train_loss: 1.5,
            validation_loss: 2.0,
        });
        trace.push(EpochLoss {
            epoch: 2,
            train_loss: 0.75,
            validation_loss: 1.25,
        });
        trace
    }

    #[test]
    fn test_trace_accessors() {
        let trace = sample_trace();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.first().map(|r| r.epoch), Some(1));
        assert_eq!(trace.last().map(|r| r.train_loss), Some(0.75));
        assert!(LossTrace::new().is_empty());
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        sample_trace().write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "epoch,train_loss,validation_loss\n1,1.5,2.0\n2,0.75,1.25\n"
        );
    }

    #[test]
    fn test_write_csv_empty_trace_has_header() {
        let mut out = Vec::new();
        LossTrace::new().write_csv(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "epoch,train_loss,validation_loss\n"
        );
    }

    #[test]
    fn test_save_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.csv");
        sample_trace().save_csv(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
