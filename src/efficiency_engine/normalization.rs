//! Per-column scaling: min-max (feeds scoring), Z-score and robust (median/IQR).

use crate::config::defaults::DEGENERATE_NORMALIZED_VALUE;
use crate::stats;
use crate::types::{EquipmentDataset, Parameter};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Scaling parameters of one column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnScaling {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: Option<f64>,
    pub median: f64,
    pub iqr: f64,
    /// `max == min`: every min-max value is the degenerate constant.
    pub degenerate: bool,
}

impl ColumnScaling {
    fn fit(values: &[f64]) -> Option<Self> {
        let s = stats::describe(values)?;
        Some(Self {
            min: s.min,
            max: s.max,
            mean: s.mean,
            std: s.std,
            median: s.median,
            iqr: s.iqr(),
            degenerate: s.max == s.min,
        })
    }

    pub fn min_max(&self, x: f64) -> f64 {
        if self.degenerate {
            DEGENERATE_NORMALIZED_VALUE
        } else {
            (x - self.min) / (self.max - self.min)
        }
    }

    pub fn z_score(&self, x: f64) -> Option<f64> {
        self.std.filter(|s| *s > 0.0).map(|s| (x - self.mean) / s)
    }

    pub fn robust(&self, x: f64) -> Option<f64> {
        (self.iqr > 0.0).then(|| (x - self.median) / self.iqr)
    }
}

/// All three scalings of one value.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScaledValue {
    pub min_max: f64,
    pub z_score: Option<f64>,
    pub robust: Option<f64>,
}

/// Per-analysis normalized view of a dataset, rows in record order.
#[derive(Debug, Clone)]
pub struct NormalizedView {
    scaling: [ColumnScaling; 3],
    rows: Vec<[ScaledValue; 3]>,
}

impl NormalizedView {
    /// `None` only for an empty dataset.
    pub fn build(dataset: &EquipmentDataset) -> Option<Self> {
        let [f, p, t] = Parameter::ALL;
        let scaling = [
            ColumnScaling::fit(&dataset.values(f))?,
            ColumnScaling::fit(&dataset.values(p))?,
            ColumnScaling::fit(&dataset.values(t))?,
        ];
        for (parameter, s) in Parameter::ALL.iter().zip(&scaling) {
            if s.degenerate {
                warn!(
                    column = parameter.column(),
                    value = DEGENERATE_NORMALIZED_VALUE,
                    "Constant column, min-max normalization degenerate"
                );
            }
        }

        let rows = dataset
            .iter()
            .map(|record| {
                Parameter::ALL.map(|parameter| {
                    let s = &scaling[parameter.index()];
                    let x = record.value(parameter);
                    ScaledValue {
                        min_max: s.min_max(x),
                        z_score: s.z_score(x),
                        robust: s.robust(x),
                    }
                })
            })
            .collect();

        Some(Self { scaling, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn scaling(&self, parameter: Parameter) -> &ColumnScaling {
        &self.scaling[parameter.index()]
    }

    pub fn scaled(&self, row: usize, parameter: Parameter) -> Option<&ScaledValue> {
        self.rows.get(row).map(|r| &r[parameter.index()])
    }

    /// Min-max triple (flowrate, pressure, temperature) for one row.
    pub fn min_max(&self, row: usize) -> Option<[f64; 3]> {
        self.rows.get(row).map(|r| r.map(|v| v.min_max))
    }
}

/// Report entry for one column: scaling parameters plus every scaled value.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnNormalization {
    #[serde(flatten)]
    pub scaling: ColumnScaling,
    pub values: Vec<NamedScaledValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedScaledValue {
    pub equipment_name: String,
    #[serde(flatten)]
    pub value: ScaledValue,
}

pub fn normalization_report(
    dataset: &EquipmentDataset,
    view: &NormalizedView,
) -> BTreeMap<String, ColumnNormalization> {
    Parameter::ALL
        .iter()
        .map(|&parameter| {
            let values = dataset
                .iter()
                .enumerate()
                .filter_map(|(i, record)| {
                    view.scaled(i, parameter).map(|v| NamedScaledValue {
                        equipment_name: record.name().to_string(),
                        value: *v,
                    })
                })
                .collect();
            (
                parameter.column().to_string(),
                ColumnNormalization {
                    scaling: view.scaling(parameter).clone(),
                    values,
                },
            )
        })
        .collect()
}
