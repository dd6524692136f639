//! Descriptive statistics over plain `f64` slices.
//!
//! Percentiles use linear interpolation between closest ranks, the same
//! convention as the spreadsheet/pandas default. Skewness and kurtosis are the
//! bias-adjusted sample estimators (G1, G2), kurtosis in the excess convention.

use crate::types::{DescriptiveStats, SummaryStats};
use statrs::statistics::Statistics;

/// Copy and sort ascending.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// Linear-interpolated percentile of already sorted values, `q` in [0, 1].
pub fn percentile(sorted_values: &[f64], q: f64) -> Option<f64> {
    if sorted_values.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted_values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted_values[lo] + (sorted_values[hi] - sorted_values[lo]) * frac)
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(Statistics::mean(values))
    }
}

/// True when every value is identical (or there are none).
pub fn is_constant(values: &[f64]) -> bool {
    match values.first() {
        Some(first) => values.iter().all(|v| v == first),
        None => true,
    }
}

/// Sample variance (n-1). Exactly 0.0 for constant input.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    if is_constant(values) {
        return Some(0.0);
    }
    let var = Statistics::variance(values);
    var.is_finite().then_some(var)
}

/// Sample standard deviation (n-1).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// `std / mean`, defined as 0.0 when the mean is zero.
pub fn coefficient_of_variation(mean: f64, std: Option<f64>) -> Option<f64> {
    let std = std?;
    if mean == 0.0 {
        Some(0.0)
    } else {
        Some(std / mean)
    }
}

/// Biased central moments m2, m3, m4.
fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let m = Statistics::mean(values);
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Adjusted Fisher-Pearson skewness. Needs 3 values; 0.0 for constant input.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    if is_constant(values) {
        return Some(0.0);
    }
    let (m2, m3, _) = central_moments(values);
    if m2 <= 0.0 {
        return Some(0.0);
    }
    let nf = n as f64;
    let g1 = m3 / m2.powf(1.5);
    let g = g1 * (nf * (nf - 1.0)).sqrt() / (nf - 2.0);
    g.is_finite().then_some(g)
}

/// Bias-adjusted excess kurtosis. Needs 4 values; 0.0 for constant input.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    if is_constant(values) {
        return Some(0.0);
    }
    let (m2, _, m4) = central_moments(values);
    if m2 <= 0.0 {
        return Some(0.0);
    }
    let nf = n as f64;
    let g2 = m4 / (m2 * m2) - 3.0;
    let k = ((nf + 1.0) * g2 + 6.0) * (nf - 1.0) / ((nf - 2.0) * (nf - 3.0));
    k.is_finite().then_some(k)
}

/// Full descriptive battery. `None` only for an empty slice.
pub fn describe(values: &[f64]) -> Option<DescriptiveStats> {
    let s = sorted(values);
    let mean = mean(values)?;
    let variance = sample_variance(values);
    let std = variance.map(f64::sqrt);
    let min = *s.first()?;
    let max = *s.last()?;
    let q = |p: f64| percentile(&s, p).unwrap_or(mean);

    Some(DescriptiveStats {
        count: values.len(),
        mean,
        min,
        max,
        std,
        median: q(0.5),
        q10: q(0.10),
        q25: q(0.25),
        q75: q(0.75),
        q90: q(0.90),
        q95: q(0.95),
        q99: q(0.99),
        range: max - min,
        variance,
        coefficient_of_variation: coefficient_of_variation(mean, std),
        skewness: skewness(values),
        kurtosis: kurtosis(values),
    })
}

/// Compact summary. `None` only for an empty slice.
pub fn summarize(values: &[f64]) -> Option<SummaryStats> {
    let s = sorted(values);
    let mean = mean(values)?;
    Some(SummaryStats {
        count: values.len(),
        mean,
        median: percentile(&s, 0.5)?,
        std: sample_std(values),
        min: *s.first()?,
        max: *s.last()?,
        q25: percentile(&s, 0.25)?,
        q75: percentile(&s, 0.75)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_percentile_linear_interpolation() {
        let s = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(percentile(&s, 0.25).unwrap(), 1.75));
        assert!(approx(percentile(&s, 0.5).unwrap(), 2.5));
        assert!(approx(percentile(&s, 0.75).unwrap(), 3.25));
        assert!(approx(percentile(&s, 1.0).unwrap(), 4.0));
        assert!(percentile(&[], 0.5).is_none());
    }

    #[test]
    fn test_sample_std_matches_hand_computation() {
        // mean 5, squared deviations sum = 32, n-1 = 7
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = sample_std(&v).unwrap();
        assert!(approx(std, (32.0_f64 / 7.0).sqrt()));
    }

    #[test]
    fn test_single_value_degrades_to_none() {
        let stats = describe(&[42.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean, 42.0);
        assert!(stats.std.is_none());
        assert!(stats.variance.is_none());
        assert!(stats.coefficient_of_variation.is_none());
        assert!(stats.skewness.is_none());
        assert!(stats.kurtosis.is_none());
        assert_eq!(stats.median, 42.0);
        assert_eq!(stats.q99, 42.0);
    }

    #[test]
    fn test_constant_column_has_zero_spread() {
        let stats = describe(&[0.1, 0.1, 0.1, 0.1, 0.1]).unwrap();
        assert_eq!(stats.std, Some(0.0));
        assert_eq!(stats.coefficient_of_variation, Some(0.0));
        assert_eq!(stats.skewness, Some(0.0));
        assert_eq!(stats.kurtosis, Some(0.0));
        assert_eq!(stats.range, 0.0);
    }

    #[test]
    fn test_cv_zero_mean_is_zero() {
        assert_eq!(coefficient_of_variation(0.0, Some(3.0)), Some(0.0));
        assert_eq!(coefficient_of_variation(2.0, Some(1.0)), Some(0.5));
        assert_eq!(coefficient_of_variation(2.0, None), None);
    }

    #[test]
    fn test_skewness_sign() {
        let right = [1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 10.0];
        assert!(skewness(&right).unwrap() > 0.5);
        let left: Vec<f64> = right.iter().map(|v| -v).collect();
        assert!(skewness(&left).unwrap() < -0.5);
        let symmetric = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(approx(skewness(&symmetric).unwrap(), 0.0));
    }

    #[test]
    fn test_kurtosis_uniform_is_light_tailed() {
        let uniform: Vec<f64> = (0..20).map(f64::from).collect();
        // Excess kurtosis of a discrete uniform sample is about -1.2
        assert!(kurtosis(&uniform).unwrap() < -1.0);
        assert!(kurtosis(&[1.0, 2.0, 3.0]).is_none());
    }
}
