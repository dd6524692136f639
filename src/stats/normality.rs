//! Normality checks: Shapiro-Wilk (Royston 1995, AS R94) and the
//! skew/kurtosis shape heuristic.

use crate::types::{DistributionShape, NormalityTest, UndefinedReason};
use statrs::distribution::{ContinuousCDF, Normal};

/// Supported sample sizes for the Royston approximation.
const MIN_SAMPLES: usize = 3;
const MAX_SAMPLES: usize = 5000;

/// Raw Shapiro-Wilk result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapiroWilk {
    pub w: f64,
    pub p_value: f64,
}

// Royston polynomial coefficients (AS R94)
const SW_C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const SW_C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const SW_C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const SW_C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const SW_C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const SW_C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const SW_G: [f64; 2] = [-2.273, 0.459];

/// Horner evaluation of c[0] + c[1]x + c[2]x² + ...
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

fn standard_normal() -> Result<Normal, UndefinedReason> {
    Normal::new(0.0, 1.0).map_err(|_| UndefinedReason::NumericalFailure)
}

/// Shapiro-Wilk W and p-value.
///
/// Undefined for fewer than 3 or more than 5000 values, and for constant input.
pub fn shapiro_wilk(values: &[f64]) -> Result<ShapiroWilk, UndefinedReason> {
    let n = values.len();
    if n < MIN_SAMPLES {
        return Err(UndefinedReason::InsufficientSamples);
    }
    if n > MAX_SAMPLES {
        return Err(UndefinedReason::TooManySamples);
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(UndefinedReason::NumericalFailure);
    }

    let x = super::sorted(values);
    if x[n - 1] - x[0] < 1e-300 {
        return Err(UndefinedReason::ConstantValues);
    }

    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    if ss < 1e-300 {
        return Err(UndefinedReason::ConstantValues);
    }

    if n == 3 {
        // Exact: a = [1/sqrt(2), 0, -1/sqrt(2)]
        let num = std::f64::consts::FRAC_1_SQRT_2 * (x[2] - x[0]);
        let w = (num * num / ss).clamp(0.75, 1.0);
        let p = 1.0 - (6.0 / std::f64::consts::PI) * w.sqrt().acos();
        return Ok(ShapiroWilk {
            w,
            p_value: p.clamp(0.0, 1.0),
        });
    }

    let normal = standard_normal()?;
    let a = coefficients(&normal, n)?;

    let sa: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();
    let w = sa * sa / ss;
    if !(0.0..=1.0 + 1e-10).contains(&w) {
        return Err(UndefinedReason::NumericalFailure);
    }
    let w = w.min(1.0);

    let p_value = p_value(&normal, w, n);
    if !p_value.is_finite() {
        return Err(UndefinedReason::NumericalFailure);
    }
    Ok(ShapiroWilk {
        w,
        p_value: p_value.clamp(0.0, 1.0),
    })
}

/// Half-vector of Royston weights, lower tail first.
fn coefficients(normal: &Normal, n: usize) -> Result<Vec<f64>, UndefinedReason> {
    let nn2 = n / 2;
    let nf = n as f64;

    // Blom approximation of expected normal order statistics
    let m: Vec<f64> = (0..nn2)
        .map(|i| normal.inverse_cdf((i as f64 + 1.0 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let a1 = poly(&SW_C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; nn2];
    a[0] = a1;

    let (corrected, fac_sq, one_minus) = if n <= 5 {
        (1, summ2 - 2.0 * m[0] * m[0], 1.0 - 2.0 * a1 * a1)
    } else {
        let a2 = -m[1] / ssumm2 + poly(&SW_C2, rsn);
        a[1] = a2;
        (
            2,
            summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1],
            1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2,
        )
    };
    if fac_sq <= 0.0 || one_minus <= 0.0 {
        return Err(UndefinedReason::NumericalFailure);
    }
    let fac = (fac_sq / one_minus).sqrt();
    for i in corrected..nn2 {
        a[i] = -m[i] / fac;
    }
    Ok(a)
}

/// Royston's normalizing transformation of 1 - W.
fn p_value(normal: &Normal, w: f64, n: usize) -> f64 {
    let nf = n as f64;
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }
    let y = w1.ln();

    let (z_input, m, s) = if n <= 11 {
        let gamma = poly(&SW_G, nf);
        if y >= gamma {
            return 0.0;
        }
        (-(gamma - y).ln(), poly(&SW_C3, nf), poly(&SW_C4, nf).exp())
    } else {
        let ln_n = nf.ln();
        (y, poly(&SW_C5, ln_n), poly(&SW_C6, ln_n).exp())
    };
    if s < 1e-300 {
        return 0.0;
    }
    1.0 - normal.cdf((z_input - m) / s)
}

/// Shapiro-Wilk as a report entry; `is_normal` when p > alpha.
pub fn normality_test(values: &[f64], alpha: f64) -> NormalityTest {
    match shapiro_wilk(values) {
        Ok(result) => NormalityTest {
            statistic: Some(result.w),
            p_value: Some(result.p_value),
            is_normal: Some(result.p_value > alpha),
            undefined_reason: None,
        },
        Err(reason) => {
            tracing::warn!(samples = values.len(), reason = %reason, "Shapiro-Wilk undefined");
            NormalityTest::undefined(reason)
        }
    }
}

/// Shape heuristic, checked in priority order: normal, skewed, tailed.
pub fn classify_shape(
    skewness: Option<f64>,
    kurtosis: Option<f64>,
    tolerance: f64,
) -> DistributionShape {
    let (Some(skew), Some(kurt)) = (skewness, kurtosis) else {
        return DistributionShape::Unknown;
    };
    if skew.abs() < tolerance && kurt.abs() < tolerance {
        DistributionShape::Normal
    } else if skew > tolerance {
        DistributionShape::RightSkewed
    } else if skew < -tolerance {
        DistributionShape::LeftSkewed
    } else if kurt > tolerance {
        DistributionShape::HeavyTailed
    } else if kurt < -tolerance {
        DistributionShape::LightTailed
    } else {
        DistributionShape::Unknown
    }
}
