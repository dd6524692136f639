//! Statistic result types shared by the analysis engines.

use serde::{Deserialize, Serialize};

/// Why a statistic has no value.
///
/// Engines report `None` plus one of these instead of a fallback constant, so
/// that a legitimate zero can be told apart from a computation that was not
/// defined for the data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    /// Not enough observations for the statistic (e.g. std of one value).
    InsufficientSamples,
    /// Every observation is identical.
    ConstantValues,
    /// Sample is larger than the method supports.
    TooManySamples,
    /// The numeric routine failed to produce a finite result.
    NumericalFailure,
}

impl std::fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientSamples => write!(f, "insufficient samples"),
            Self::ConstantValues => write!(f, "constant values"),
            Self::TooManySamples => write!(f, "too many samples"),
            Self::NumericalFailure => write!(f, "numerical failure"),
        }
    }
}

/// Full descriptive battery for one numeric column (or one column within a type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation (n-1). `None` for a single observation.
    pub std: Option<f64>,
    pub median: f64,
    pub q10: f64,
    pub q25: f64,
    pub q75: f64,
    pub q90: f64,
    pub q95: f64,
    pub q99: f64,
    pub range: f64,
    pub variance: Option<f64>,
    /// `std / mean`; 0.0 when the mean is zero.
    pub coefficient_of_variation: Option<f64>,
    pub skewness: Option<f64>,
    /// Excess kurtosis.
    pub kurtosis: Option<f64>,
}

impl DescriptiveStats {
    pub fn iqr(&self) -> f64 {
        self.q75 - self.q25
    }
}

/// Compact location/spread summary used for score columns and sub-populations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
}

/// Shapiro-Wilk normality test outcome. All fields are `None` when the test
/// is not defined for the column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityTest {
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub is_normal: Option<bool>,
    pub undefined_reason: Option<UndefinedReason>,
}

impl NormalityTest {
    pub const fn undefined(reason: UndefinedReason) -> Self {
        Self {
            statistic: None,
            p_value: None,
            is_normal: None,
            undefined_reason: Some(reason),
        }
    }
}

/// Heuristic shape classification from skewness and excess kurtosis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DistributionShape {
    Normal,
    #[serde(rename = "Right-skewed")]
    RightSkewed,
    #[serde(rename = "Left-skewed")]
    LeftSkewed,
    #[serde(rename = "Heavy-tailed")]
    HeavyTailed,
    #[serde(rename = "Light-tailed")]
    LightTailed,
    Unknown,
}

impl std::fmt::Display for DistributionShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Normal => "Normal",
            Self::RightSkewed => "Right-skewed",
            Self::LeftSkewed => "Left-skewed",
            Self::HeavyTailed => "Heavy-tailed",
            Self::LightTailed => "Light-tailed",
            Self::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Qualitative strength of a correlation coefficient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum CorrelationStrength {
    #[serde(rename = "Very Weak")]
    VeryWeak,
    Weak,
    Moderate,
    Strong,
    #[serde(rename = "Very Strong")]
    VeryStrong,
}

impl CorrelationStrength {
    /// Classify by |r|: <0.2, <0.4, <0.6, <0.8, otherwise very strong.
    pub fn from_coefficient(r: f64) -> Self {
        match r.abs() {
            a if a < 0.2 => Self::VeryWeak,
            a if a < 0.4 => Self::Weak,
            a if a < 0.6 => Self::Moderate,
            a if a < 0.8 => Self::Strong,
            _ => Self::VeryStrong,
        }
    }
}

impl std::fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::VeryWeak => "Very Weak",
            Self::Weak => "Weak",
            Self::Moderate => "Moderate",
            Self::Strong => "Strong",
            Self::VeryStrong => "Very Strong",
        };
        f.write_str(label)
    }
}

/// Sign of a correlation coefficient. Zero counts as positive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CorrelationDirection {
    Positive,
    Negative,
}

impl CorrelationDirection {
    pub fn from_coefficient(r: f64) -> Self {
        if r < 0.0 {
            Self::Negative
        } else {
            Self::Positive
        }
    }
}

impl std::fmt::Display for CorrelationDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "Positive"),
            Self::Negative => write!(f, "Negative"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_boundaries() {
        assert_eq!(CorrelationStrength::from_coefficient(0.19), CorrelationStrength::VeryWeak);
        assert_eq!(CorrelationStrength::from_coefficient(-0.2), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::from_coefficient(0.59), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::from_coefficient(-0.79), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::from_coefficient(0.8), CorrelationStrength::VeryStrong);
    }

    #[test]
    fn test_labels_serialize_with_spaces() {
        let json = serde_json::to_value(CorrelationStrength::VeryStrong).unwrap();
        assert_eq!(json, "Very Strong");
        let json = serde_json::to_value(DistributionShape::RightSkewed).unwrap();
        assert_eq!(json, "Right-skewed");
        let json = serde_json::to_value(UndefinedReason::ConstantValues).unwrap();
        assert_eq!(json, "constant_values");
    }
}
