//! Replicate averaging for raw per-mouse expression tables.
//!
//! The raw table has one identifier column followed by one column per mouse
//! replicate. Replicate headers split on `_` into at least five parts, where
//! part 1 is the strain, part 3 the condition and part 4 the time point
//! (`RR10_C57-6J_M23_FLT_25days`). Columns sharing strain, condition and time
//! point are averaged; zero and blank cells count as missing.
//!
//! The result can be written back as one processed CSV per strain, or fed
//! straight into training through [`ReplicateTable::row_source`].

use crate::dataset::source::{RawRow, VecRowSource};
use crate::dataset::{Strain, TargetColumn, BASELINE_COLUMN, TARGET_COUNT};
use crate::error::{Result, TransferError};
use csv::{ReaderBuilder, Writer};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Averaged replicate groups keyed by `<strain>_<condition>_<timepoint>_avg`.
#[derive(Clone, Debug, Default)]
pub struct ReplicateTable {
    ids: Vec<String>,
    groups: BTreeMap<String, Vec<Option<f64>>>,
}

/// Maps a replicate header to its group name, or `None` if it has too few parts.
pub fn group_name(header: &str) -> Option<String> {
    let parts: Vec<&str> = header.split('_').collect();
    if parts.len() < 5 {
        return None;
    }
    let name = format!("{}_{}_{}_avg", parts[1], parts[3], parts[4]);
    Some(name.to_ascii_lowercase().replace('-', "_"))
}

/// Reads a raw replicate table and averages each group row by row.
///
/// # Errors
/// `Data` if the header has no replicate columns or a cell is not numeric.
pub fn average_replicates<R: Read>(reader: R) -> Result<ReplicateTable> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    // column index -> group name
    let mut membership: Vec<(usize, String)> = Vec::new();
    for (col, header) in headers.iter().enumerate().skip(1) {
        match group_name(header) {
            Some(name) => membership.push((col, name)),
            None => warn!(column = header, "skipping column without strain/condition/timepoint"),
        }
    }
    if membership.is_empty() {
        return Err(TransferError::Data(
            "raw table has no replicate columns".to_string(),
        ));
    }

    let mut table = ReplicateTable::default();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        table
            .ids
            .push(record.get(0).unwrap_or_default().to_string());

        let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for (col, name) in &membership {
            let entry = sums.entry(name.as_str()).or_insert((0.0, 0));
            let cell = record.get(*col).unwrap_or_default();
            if cell.is_empty() {
                continue;
            }
            let value: f64 = cell.parse().map_err(|_| {
                TransferError::Data(format!(
                    "line {}: cannot parse {:?} in column {}",
                    i + 2,
                    cell,
                    &headers[*col]
                ))
            })?;
            if value != 0.0 && value.is_finite() {
                entry.0 += value;
                entry.1 += 1;
            }
        }
        for (name, (sum, count)) in sums {
            let mean = (count > 0).then(|| sum / count as f64);
            table.groups.entry(name.to_string()).or_default().push(mean);
        }
    }
    Ok(table)
}

impl ReplicateTable {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Averaged values of one group, `None` where every replicate was missing.
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    /// Strains that have at least one group in this table.
    pub fn strains(&self) -> Vec<Strain> {
        Strain::ALL
            .into_iter()
            .filter(|s| self.strain_columns(*s).next().is_some())
            .collect()
    }

    fn strain_columns(&self, strain: Strain) -> impl Iterator<Item = &String> {
        let prefix = format!("{}_", strain.prefix());
        self.groups.keys().filter(move |k| k.starts_with(&prefix))
    }

    /// Output column order for a strain: baseline, the six targets, then any
    /// other groups of that strain in name order.
    fn output_columns(&self, strain: Strain) -> Vec<String> {
        let mut columns: Vec<String> = std::iter::once(BASELINE_COLUMN)
            .chain(TargetColumn::ALL.iter().map(|c| c.column_name()))
            .map(|c| format!("{}_{}", strain.prefix(), c))
            .collect();
        let extras: Vec<String> = self
            .strain_columns(strain)
            .filter(|k| !columns.contains(k))
            .cloned()
            .collect();
        columns.extend(extras);
        columns
    }

    /// Writes the processed CSV for one strain; returns the number of rows.
    pub fn write_strain<W: Write>(&self, strain: Strain, writer: W) -> Result<usize> {
        let columns = self.output_columns(strain);
        let mut wtr = Writer::from_writer(writer);

        let mut header = vec!["ensmbl_id".to_string()];
        header.extend(columns.iter().cloned());
        wtr.write_record(&header)?;

        for (row, id) in self.ids.iter().enumerate() {
            let mut record = vec![id.clone()];
            for name in &columns {
                let cell = self
                    .column(name)
                    .and_then(|values| values[row])
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                record.push(cell);
            }
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(self.ids.len())
    }

    /// Rows for one strain in the shape the training pipeline consumes.
    pub fn row_source(&self, strain: Strain) -> VecRowSource {
        let lookup = |column: &str| {
            self.column(&format!("{}_{}", strain.prefix(), column))
        };
        let baseline = lookup(BASELINE_COLUMN);
        let targets: Vec<Option<&[Option<f64>]>> = TargetColumn::ALL
            .iter()
            .map(|c| lookup(c.column_name()))
            .collect();

        let rows = self
            .ids
            .iter()
            .enumerate()
            .map(|(row, id)| {
                let mut cells = [None; TARGET_COUNT];
                for (slot, column) in cells.iter_mut().zip(&targets) {
                    *slot = column.and_then(|values| values[row]);
                }
                RawRow {
                    id: id.clone(),
                    baseline: baseline.and_then(|values| values[row]),
                    targets: cells,
                }
            })
            .collect();
        VecRowSource::new(rows)
    }
}

/// Averages a raw table file and writes `processed_data_<strain>.csv` for each
/// strain present into `out_dir`. Returns the written paths.
pub fn aggregate_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, out_dir: Q) -> Result<Vec<PathBuf>> {
    let file = File::open(input.as_ref())?;
    let table = average_replicates(BufReader::new(file))?;

    let mut written = Vec::new();
    for strain in table.strains() {
        let path = out_dir
            .as_ref()
            .join(format!("processed_data_{}.csv", strain.prefix()));
        let rows = table.write_strain(strain, File::create(&path)?)?;
        info!(%strain, rows, path = %path.display(), "wrote processed table");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::source::{complete_samples, RowSource};

    const RAW: &str = "\
Protein,RR10_C57-6J_M1_BSL_0days,RR10_C57-6J_M2_BSL_0days,RR10_C57-6J_M3_FLT_25days,RR10_C57-6J_M4_FLT_75days,RR10_C57-6J_M5_GC_25days,RR10_C57-6J_M6_GC_75days,RR10_C57-6J_M7_VIV_25days,RR10_C57-6J_M8_VIV_75days,RR10_C3H-HeJ_M9_BSL_0days,notes
G1,2,4,5,6,7,8,9,10,1,x
G2,0,0,5,6,7,8,9,10,3,y
";

    #[test]
    fn test_group_name() {
        assert_eq!(
            group_name("RR10_C57-6J_M23_FLT_25days").as_deref(),
            Some("c57_6j_flt_25days_avg")
        );
        assert_eq!(group_name("Protein"), None);
    }

    #[test]
    fn test_average_replicates() {
        let table = average_replicates(RAW.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        let baseline = table.column("c57_6j_bsl_0days_avg").unwrap();
        // zeros are missing, not averaged in
        assert_eq!(baseline, &[Some(3.0), None]);
        assert_eq!(table.column("c3h_hej_bsl_0days_avg").unwrap(), &[Some(1.0), Some(3.0)]);
        assert_eq!(table.strains(), vec![Strain::C3hHej, Strain::C57Bl6j]);
    }

    #[test]
    fn test_row_source_feeds_training_rows() {
        let table = average_replicates(RAW.as_bytes()).unwrap();
        let rows = table.row_source(Strain::C57Bl6j).rows().unwrap();
        let samples = complete_samples(rows).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].id, "G1");
        assert_eq!(samples[0].baseline, 3.0);
        assert_eq!(samples[0].targets, [5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
    }

    #[test]
    fn test_write_strain_canonical_columns() {
        let table = average_replicates(RAW.as_bytes()).unwrap();
        let mut out = Vec::new();
        table.write_strain(Strain::C57Bl6j, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ensmbl_id,c57_6j_bsl_0days_avg,c57_6j_flt_25days_avg,c57_6j_flt_75days_avg,c57_6j_gc_25days_avg,c57_6j_gc_75days_avg,c57_6j_viv_25days_avg,c57_6j_viv_75days_avg"
        );
        assert_eq!(lines.next().unwrap(), "G1,3,5,6,7,8,9,10");
        assert_eq!(lines.next().unwrap(), "G2,,5,6,7,8,9,10");
    }

    #[test]
    fn test_aggregate_file_round_trips_through_csv_source() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Mouse_data.csv");
        std::fs::write(&input, RAW).unwrap();

        let written = aggregate_file(&input, dir.path()).unwrap();
        assert_eq!(written.len(), 2);

        let c57 = dir.path().join("processed_data_c57_6j.csv");
        assert!(written.contains(&c57));
        let rows = crate::dataset::CsvRowSource::new(&c57)
            .with_strain(Strain::C57Bl6j)
            .rows()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].baseline, None);
    }

    #[test]
    fn test_average_replicates_rejects_text_cell() {
        let raw = "id,RR10_C57-6J_M1_BSL_0days\nG1,abc\n";
        assert!(matches!(
            average_replicates(raw.as_bytes()),
            Err(TransferError::Data(_))
        ));
    }

    #[test]
    fn test_average_replicates_without_groups() {
        let raw = "id,value\nG1,1\n";
        assert!(average_replicates(raw.as_bytes()).is_err());
    }
}
