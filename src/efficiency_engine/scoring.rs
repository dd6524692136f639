//! Composite score formulas over min-max normalized parameters.
//!
//! ## Scores
//! - `efficiency_score`: 0.4·f + 0.3·p + 0.3·(1 - |t - 0.7|)
//! - `performance_index`: 0.35·f + 0.35·p + 0.3·max(0, 1 - |t - 0.6|)
//! - `equipment_efficiency`: per-type weight profile, clamped to [0, 1]
//! - `operational_score`: floored closeness of f, p, t to 0.75 / 0.65 / 0.7
//!
//! Equipment types map to a [`WeightProfile`] through a lookup table rather
//! than branching on type names at the call site.

use serde::Serialize;

/// Temperature target of the default efficiency score.
const EFFICIENCY_TEMP_TARGET: f64 = 0.7;
const PERFORMANCE_TEMP_TARGET: f64 = 0.6;
const OPERATIONAL_TARGETS: [f64; 3] = [0.75, 0.65, 0.7];

/// `1 - |x - target|`.
pub fn closeness(x: f64, target: f64) -> f64 {
    1.0 - (x - target).abs()
}

/// `max(0, 1 - |x - target|)`.
pub fn floored_closeness(x: f64, target: f64) -> f64 {
    closeness(x, target).max(0.0)
}

/// One weighted contribution of a normalized parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Term {
    /// `weight · x`
    Direct(f64),
    /// `weight · max(0, 1 - |x - target|)`
    Closeness { weight: f64, target: f64 },
}

impl Term {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Direct(weight) => weight * x,
            Self::Closeness { weight, target } => weight * floored_closeness(x, target),
        }
    }
}

/// Terms for flowrate, pressure and temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightProfile {
    pub flowrate: Term,
    pub pressure: Term,
    pub temperature: Term,
}

impl WeightProfile {
    pub fn score(&self, [f, p, t]: [f64; 3]) -> f64 {
        self.flowrate.apply(f) + self.pressure.apply(p) + self.temperature.apply(t)
    }
}

const fn closeness_term(weight: f64, target: f64) -> Term {
    Term::Closeness { weight, target }
}

/// Type-specific weights. Keys are lower-case with whitespace removed.
const TYPE_PROFILES: [(&str, WeightProfile); 6] = [
    (
        "pump",
        WeightProfile {
            flowrate: Term::Direct(0.5),
            pressure: Term::Direct(0.3),
            temperature: closeness_term(0.2, 0.5),
        },
    ),
    (
        "compressor",
        WeightProfile {
            flowrate: Term::Direct(0.3),
            pressure: Term::Direct(0.5),
            temperature: closeness_term(0.2, 0.4),
        },
    ),
    (
        "heatexchanger",
        WeightProfile {
            flowrate: Term::Direct(0.4),
            pressure: Term::Direct(0.2),
            temperature: Term::Direct(0.4),
        },
    ),
    (
        "reactor",
        WeightProfile {
            flowrate: Term::Direct(0.2),
            pressure: Term::Direct(0.4),
            temperature: Term::Direct(0.4),
        },
    ),
    (
        "condenser",
        WeightProfile {
            flowrate: Term::Direct(0.5),
            pressure: Term::Direct(0.2),
            temperature: closeness_term(0.3, 0.6),
        },
    ),
    (
        "valve",
        WeightProfile {
            flowrate: Term::Direct(0.4),
            pressure: closeness_term(0.4, 0.5),
            temperature: closeness_term(0.2, 0.5),
        },
    ),
];

/// Profile for an equipment type, `None` for types scored with the default formula.
pub fn profile_for(equipment_type: &str) -> Option<&'static WeightProfile> {
    let key: String = equipment_type
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    TYPE_PROFILES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, profile)| profile)
}

/// The four scores of one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquipmentScores {
    pub efficiency_score: f64,
    pub performance_index: f64,
    pub equipment_efficiency: f64,
    pub operational_score: f64,
}

impl EquipmentScores {
    /// Score a record from its normalized (flowrate, pressure, temperature).
    pub fn compute(normalized: [f64; 3], equipment_type: &str) -> Self {
        let efficiency_score = efficiency_score(normalized);
        let equipment_efficiency = profile_for(equipment_type)
            .map_or(efficiency_score, |profile| profile.score(normalized))
            .clamp(0.0, 1.0);
        Self {
            efficiency_score,
            performance_index: performance_index(normalized),
            equipment_efficiency,
            operational_score: operational_score(normalized),
        }
    }

    pub const fn get(&self, kind: ScoreKind) -> f64 {
        match kind {
            ScoreKind::OverallEfficiency => self.efficiency_score,
            ScoreKind::PerformanceIndex => self.performance_index,
            ScoreKind::EquipmentEfficiency => self.equipment_efficiency,
            ScoreKind::OperationalScore => self.operational_score,
        }
    }
}

pub fn efficiency_score([f, p, t]: [f64; 3]) -> f64 {
    0.4 * f + 0.3 * p + 0.3 * closeness(t, EFFICIENCY_TEMP_TARGET)
}

pub fn performance_index([f, p, t]: [f64; 3]) -> f64 {
    0.35 * f + 0.35 * p + 0.3 * floored_closeness(t, PERFORMANCE_TEMP_TARGET)
}

pub fn operational_score([f, p, t]: [f64; 3]) -> f64 {
    let [tf, tp, tt] = OPERATIONAL_TARGETS;
    0.4 * floored_closeness(f, tf) + 0.3 * floored_closeness(p, tp) + 0.3 * floored_closeness(t, tt)
}

/// The four ranked scores, with their report keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    OverallEfficiency,
    PerformanceIndex,
    EquipmentEfficiency,
    OperationalScore,
}

impl ScoreKind {
    pub const ALL: [Self; 4] = [
        Self::OverallEfficiency,
        Self::PerformanceIndex,
        Self::EquipmentEfficiency,
        Self::OperationalScore,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::OverallEfficiency => "overall_efficiency",
            Self::PerformanceIndex => "performance_index",
            Self::EquipmentEfficiency => "equipment_efficiency",
            Self::OperationalScore => "operational_score",
        }
    }
}
