//! CSV Data Loader
//!
//! Turns an uploaded equipment CSV into a cleaned [`EquipmentDataset`].
//!
//! ## Cleaning Steps
//!
//! 1. Header-driven parse; all five required columns must be present
//! 2. Numeric coercion: unparseable or non-finite cells become missing
//! 3. Per-column mean imputation over every parsed row (before any drop)
//! 4. Rows with fewer than three of the five required fields are dropped
//! 5. Exact duplicates are removed, keeping the first occurrence
//!
//! Extra columns are accepted and ignored. Only the five required columns are
//! retained, so duplicate detection compares exactly those.

use crate::error::AnalysisError;
use crate::types::{EquipmentDataset, EquipmentRecord, Parameter};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Read, Write};
use tracing::{debug, info};

pub const NAME_COLUMN: &str = "Equipment Name";
pub const TYPE_COLUMN: &str = "Type";

/// Required columns in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    NAME_COLUMN,
    TYPE_COLUMN,
    "Flowrate",
    "Pressure",
    "Temperature",
];

/// Minimum non-missing required fields for a row to survive.
const MIN_PRESENT_FIELDS: usize = 3;

/// What the loader did to the raw table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows_read: usize,
    /// Missing numeric cells filled with the column mean, keyed by column.
    pub imputed_values: BTreeMap<String, usize>,
    pub deficient_rows_dropped: usize,
    pub duplicate_rows_removed: usize,
    pub cleaned_size: usize,
    pub original_columns: Vec<String>,
    pub ignored_columns: Vec<String>,
}

/// Cleaned dataset plus the record of how it was produced.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: EquipmentDataset,
    pub summary: CleaningSummary,
}

/// One parsed row before imputation.
struct RawRow {
    name: Option<String>,
    equipment_type: Option<String>,
    numbers: [Option<f64>; 3],
}

impl RawRow {
    fn present_fields(&self) -> usize {
        usize::from(self.name.is_some())
            + usize::from(self.equipment_type.is_some())
            + self.numbers.iter().filter(|v| v.is_some()).count()
    }
}

pub struct DataLoader;

impl DataLoader {
    /// Parse and clean a CSV stream.
    pub fn load<R: Read>(reader: R) -> Result<LoadedDataset, AnalysisError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let header_map = build_header_map(&headers);

        for column in REQUIRED_COLUMNS {
            if !header_map.contains_key(column) {
                return Err(AnalysisError::Schema {
                    column: column.to_string(),
                });
            }
        }
        let idx = |column: &str| header_map.get(column).copied().unwrap_or_default();
        let name_idx = idx(NAME_COLUMN);
        let type_idx = idx(TYPE_COLUMN);
        let numeric_idx = Parameter::ALL.map(|p| idx(p.column()));

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            rows.push(RawRow {
                name: text_cell(&record, name_idx),
                equipment_type: text_cell(&record, type_idx),
                numbers: numeric_idx.map(|i| numeric_cell(&record, i)),
            });
        }

        let original_columns: Vec<String> = headers.iter().map(str::to_string).collect();
        let ignored_columns = original_columns
            .iter()
            .filter(|c| !REQUIRED_COLUMNS.contains(&c.as_str()))
            .cloned()
            .collect();

        let mut summary = CleaningSummary {
            rows_read: rows.len(),
            original_columns,
            ignored_columns,
            ..CleaningSummary::default()
        };

        let fills = Self::column_means(&rows, &mut summary)?;
        let dataset = Self::clean(rows, fills, &mut summary)?;

        info!(
            rows_read = summary.rows_read,
            cleaned = summary.cleaned_size,
            dropped = summary.deficient_rows_dropped,
            duplicates = summary.duplicate_rows_removed,
            "Equipment CSV loaded"
        );
        Ok(LoadedDataset { dataset, summary })
    }

    pub fn load_bytes(bytes: &[u8]) -> Result<LoadedDataset, AnalysisError> {
        Self::load(bytes)
    }

    /// Fill value per numeric column; `None` when the column needs no fill.
    fn column_means(
        rows: &[RawRow],
        summary: &mut CleaningSummary,
    ) -> Result<[Option<f64>; 3], AnalysisError> {
        let mut fills = [None; 3];
        for (i, parameter) in Parameter::ALL.iter().enumerate() {
            let parsed: Vec<f64> = rows.iter().filter_map(|r| r.numbers[i]).collect();
            let missing = rows.len() - parsed.len();
            if missing == 0 {
                continue;
            }
            let mean = crate::stats::mean(&parsed).ok_or_else(|| AnalysisError::DataQuality {
                column: parameter.column().to_string(),
            })?;
            debug!(column = parameter.column(), missing, mean, "Imputing missing values");
            summary
                .imputed_values
                .insert(parameter.column().to_string(), missing);
            fills[i] = Some(mean);
        }
        Ok(fills)
    }

    fn clean(
        rows: Vec<RawRow>,
        fills: [Option<f64>; 3],
        summary: &mut CleaningSummary,
    ) -> Result<EquipmentDataset, AnalysisError> {
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            if row.present_fields() < MIN_PRESENT_FIELDS {
                summary.deficient_rows_dropped += 1;
                continue;
            }
            let value = |i: usize| row.numbers[i].or(fills[i]).unwrap_or_default();
            let record = EquipmentRecord {
                flowrate: value(0),
                pressure: value(1),
                temperature: value(2),
                name: row.name,
                equipment_type: row.equipment_type,
            };
            if seen.insert(record.identity()) {
                records.push(record);
            } else {
                summary.duplicate_rows_removed += 1;
            }
        }

        if records.is_empty() {
            return Err(AnalysisError::EmptyDataset);
        }
        summary.cleaned_size = records.len();
        Ok(EquipmentDataset::new(records))
    }

    /// Write a dataset back out with the five required columns.
    ///
    /// Missing names and types are written as empty cells so a reload sees
    /// them as missing again.
    pub fn write_csv<W: Write>(dataset: &EquipmentDataset, writer: W) -> Result<(), AnalysisError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(REQUIRED_COLUMNS)?;
        for record in dataset {
            wtr.write_record([
                record.name.clone().unwrap_or_default(),
                record.equipment_type.clone().unwrap_or_default(),
                record.flowrate.to_string(),
                record.pressure.to_string(),
                record.temperature.to_string(),
            ])?;
        }
        wtr.flush()
            .map_err(|e| AnalysisError::Csv(format!("Failed to flush CSV output: {e}")))?;
        Ok(())
    }

    pub fn to_csv_bytes(dataset: &EquipmentDataset) -> Result<Vec<u8>, AnalysisError> {
        let mut buf = Vec::new();
        Self::write_csv(dataset, &mut buf)?;
        Ok(buf)
    }
}

/// Header name to column index. The first occurrence wins for repeated names.
fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (i, h) in headers.iter().enumerate() {
        map.entry(h.to_string()).or_insert(i);
    }
    map
}

fn text_cell(record: &StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn numeric_cell(record: &StringRecord, idx: usize) -> Option<f64> {
    record
        .get(idx)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature\n";

    fn load(body: &str) -> Result<LoadedDataset, AnalysisError> {
        DataLoader::load(format!("{HEADER}{body}").as_bytes())
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let csv = "Equipment Name,Type,Flowrate,Temperature\nP1,Pump,100,70\n";
        match DataLoader::load(csv.as_bytes()) {
            Err(AnalysisError::Schema { column }) => assert_eq!(column, "Pressure"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_reports_first_column() {
        match DataLoader::load(&b""[..]) {
            Err(AnalysisError::Schema { column }) => assert_eq!(column, NAME_COLUMN),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicates_removed_keeping_first() {
        let loaded = load("P1,Pump,100,5,70\nP1,Pump,100,5,70\nC1,Compressor,50,9,60\n").unwrap();
        assert_eq!(loaded.dataset.len(), 2);
        assert_eq!(loaded.summary.duplicate_rows_removed, 1);
        assert_eq!(loaded.dataset.records()[0].name(), "P1");
        assert_eq!(loaded.dataset.records()[1].name(), "C1");
    }

    #[test]
    fn test_unparseable_values_filled_with_mean() {
        let loaded = load("P1,Pump,100,5,70\nP2,Pump,abc,7,80\nP3,Pump,200,,90\n").unwrap();
        let records = loaded.dataset.records();
        assert_eq!(records[1].flowrate, 150.0);
        assert_eq!(records[2].pressure, 6.0);
        assert_eq!(loaded.summary.imputed_values["Flowrate"], 1);
        assert_eq!(loaded.summary.imputed_values["Pressure"], 1);
        assert!(!loaded.summary.imputed_values.contains_key("Temperature"));
    }

    #[test]
    fn test_fully_unparseable_column_is_data_quality_error() {
        match load("P1,Pump,100,x,70\nP2,Pump,120,y,80\n") {
            Err(AnalysisError::DataQuality { column }) => assert_eq!(column, "Pressure"),
            other => panic!("expected data quality error, got {other:?}"),
        }
    }

    #[test]
    fn test_deficient_rows_dropped() {
        // Second row only has a name and a flowrate
        let loaded = load("P1,Pump,100,5,70\nP2,,110,,\nP3,,120,6,\n").unwrap();
        assert_eq!(loaded.summary.deficient_rows_dropped, 1);
        assert_eq!(loaded.dataset.len(), 2);
        // Imputation means were computed before the drop
        assert_eq!(loaded.dataset.records()[1].temperature, 70.0);
        assert_eq!(loaded.dataset.records()[1].equipment_type(), "Unknown");
    }

    #[test]
    fn test_header_only_is_empty_dataset() {
        assert!(matches!(load(""), Err(AnalysisError::EmptyDataset)));
    }

    #[test]
    fn test_extra_columns_ignored_and_whitespace_trimmed() {
        let csv = "Notes, Equipment Name ,Type,Flowrate,Pressure,Temperature\nx, P1 , Pump ,100, 5 ,70\n";
        let loaded = DataLoader::load(csv.as_bytes()).unwrap();
        assert_eq!(loaded.summary.ignored_columns, vec!["Notes".to_string()]);
        let r = &loaded.dataset.records()[0];
        assert_eq!(r.name(), "P1");
        assert_eq!(r.equipment_type(), "Pump");
        assert_eq!(r.pressure, 5.0);
    }

    #[test]
    fn test_written_csv_reloads_unchanged() {
        let loaded = load("P1,Pump,100.5,5,70\n,Valve,80,,65\nC1,Compressor,50,9.25,60\n").unwrap();
        let bytes = DataLoader::to_csv_bytes(&loaded.dataset).unwrap();
        let reloaded = DataLoader::load_bytes(&bytes).unwrap();
        assert_eq!(reloaded.dataset, loaded.dataset);
        assert!(reloaded.summary.imputed_values.is_empty());
        assert_eq!(reloaded.summary.deficient_rows_dropped, 0);
        assert_eq!(reloaded.summary.duplicate_rows_removed, 0);
    }
}
