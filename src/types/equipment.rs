//! Equipment records and the cleaned dataset they live in.

use serde::{Deserialize, Serialize};

/// Label used when a categorical cell was empty in the source CSV.
pub const UNKNOWN_LABEL: &str = "Unknown";

// ============================================================================
// Parameters
// ============================================================================

/// One of the three numeric process parameters carried by every record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parameter {
    Flowrate,
    Pressure,
    Temperature,
}

impl Parameter {
    /// All parameters in report order.
    pub const ALL: [Self; 3] = [Self::Flowrate, Self::Pressure, Self::Temperature];

    /// Column name as it appears in the CSV header and in report keys.
    pub const fn column(self) -> &'static str {
        match self {
            Self::Flowrate => "Flowrate",
            Self::Pressure => "Pressure",
            Self::Temperature => "Temperature",
        }
    }

    /// Lower-case key used in snake_case report fields.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Flowrate => "flowrate",
            Self::Pressure => "pressure",
            Self::Temperature => "temperature",
        }
    }

    /// Position in [`Parameter::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Read this parameter from a record.
    pub const fn value_of(self, record: &EquipmentRecord) -> f64 {
        match self {
            Self::Flowrate => record.flowrate,
            Self::Pressure => record.pressure,
            Self::Temperature => record.temperature,
        }
    }

    /// The three unordered parameter pairs, in the order the key correlations are reported.
    pub const PAIRS: [(Self, Self); 3] = [
        (Self::Flowrate, Self::Temperature),
        (Self::Flowrate, Self::Pressure),
        (Self::Pressure, Self::Temperature),
    ];
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

// ============================================================================
// Records
// ============================================================================

/// One row of the cleaned equipment table.
///
/// Numeric fields are always finite once a record leaves the loader. The
/// categorical fields may still be missing because a row only needs three of
/// its five fields to survive cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub name: Option<String>,
    pub equipment_type: Option<String>,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

impl EquipmentRecord {
    pub fn new(name: &str, equipment_type: &str, flowrate: f64, pressure: f64, temperature: f64) -> Self {
        Self {
            name: Some(name.to_string()),
            equipment_type: Some(equipment_type.to_string()),
            flowrate,
            pressure,
            temperature,
        }
    }

    /// Equipment name, or [`UNKNOWN_LABEL`] when the cell was empty.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    /// Equipment type, or [`UNKNOWN_LABEL`] when the cell was empty.
    pub fn equipment_type(&self) -> &str {
        self.equipment_type.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub const fn value(&self, parameter: Parameter) -> f64 {
        parameter.value_of(self)
    }

    /// Number of non-missing fields among the five required columns.
    pub fn present_fields(&self) -> usize {
        3 + usize::from(self.name.is_some()) + usize::from(self.equipment_type.is_some())
    }

    /// Exact-identity key used for duplicate removal (bitwise float comparison).
    pub(crate) fn identity(&self) -> (Option<String>, Option<String>, [u64; 3]) {
        (
            self.name.clone(),
            self.equipment_type.clone(),
            [
                self.flowrate.to_bits(),
                self.pressure.to_bits(),
                self.temperature.to_bits(),
            ],
        )
    }
}

/// Full record payload as it appears inside report lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub equipment_name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

impl From<&EquipmentRecord> for RecordSummary {
    fn from(record: &EquipmentRecord) -> Self {
        Self {
            equipment_name: record.name().to_string(),
            equipment_type: record.equipment_type().to_string(),
            flowrate: record.flowrate,
            pressure: record.pressure,
            temperature: record.temperature,
        }
    }
}

// ============================================================================
// Dataset
// ============================================================================

/// Ordered, duplicate-free collection of cleaned records.
///
/// Order follows the source CSV so that "first occurrence" tie-breaks are
/// reproducible.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EquipmentDataset {
    records: Vec<EquipmentRecord>,
}

impl EquipmentDataset {
    pub fn new(records: Vec<EquipmentRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[EquipmentRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EquipmentRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column of values for one parameter, in record order.
    pub fn values(&self, parameter: Parameter) -> Vec<f64> {
        self.records.iter().map(|r| r.value(parameter)).collect()
    }

    /// Distinct equipment types in order of first appearance.
    pub fn types(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for record in &self.records {
            let t = record.equipment_type();
            if !seen.iter().any(|s| s == t) {
                seen.push(t.to_string());
            }
        }
        seen
    }

    /// Records grouped by type, groups in order of first appearance.
    pub fn by_type(&self) -> Vec<(String, Vec<&EquipmentRecord>)> {
        self.types()
            .into_iter()
            .map(|t| {
                let members = self
                    .records
                    .iter()
                    .filter(|r| r.equipment_type() == t)
                    .collect();
                (t, members)
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a EquipmentDataset {
    type Item = &'a EquipmentRecord;
    type IntoIter = std::slice::Iter<'a, EquipmentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_in_first_appearance_order() {
        let ds = EquipmentDataset::new(vec![
            EquipmentRecord::new("V1", "Valve", 1.0, 1.0, 1.0),
            EquipmentRecord::new("P1", "Pump", 2.0, 2.0, 2.0),
            EquipmentRecord::new("V2", "Valve", 3.0, 3.0, 3.0),
        ]);
        assert_eq!(ds.types(), vec!["Valve".to_string(), "Pump".to_string()]);

        let groups = ds.by_type();
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].1.len(), 1);
    }

    #[test]
    fn test_missing_labels_fall_back_to_unknown() {
        let record = EquipmentRecord {
            name: None,
            equipment_type: None,
            flowrate: 1.0,
            pressure: 2.0,
            temperature: 3.0,
        };
        assert_eq!(record.name(), UNKNOWN_LABEL);
        assert_eq!(record.equipment_type(), UNKNOWN_LABEL);
        assert_eq!(record.present_fields(), 3);
    }

    #[test]
    fn test_record_summary_uses_type_key() {
        let record = EquipmentRecord::new("P1", "Pump", 100.0, 5.0, 70.0);
        let json = serde_json::to_value(RecordSummary::from(&record)).unwrap();
        assert_eq!(json["type"], "Pump");
        assert_eq!(json["equipment_name"], "P1");
    }
}
