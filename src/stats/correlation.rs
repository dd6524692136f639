//! Pearson Correlation Engine
//!
//! Pearson coefficients with two-tailed significance from the Student-t
//! distribution (statrs), plus a labelled matrix builder.
//!
//! ## Key Features
//! - Centered (two-pass) Pearson r, undefined for constant or short columns
//! - P-value via Student's t with n-2 degrees of freedom
//! - Square matrices keyed by column label; the diagonal is 1.0 only where r is defined

use statrs::distribution::{ContinuousCDF, StudentsT};
use std::collections::BTreeMap;

/// Labelled correlation matrix. `None` cells are pairs with no defined r.
pub type CorrelationMatrix = BTreeMap<String, BTreeMap<String, Option<f64>>>;

/// Correlation analysis engine with statistical significance testing
pub struct CorrelationEngine;

impl CorrelationEngine {
    /// Pearson correlation coefficient.
    ///
    /// Formula: r = Σ[(xi - x̄)(yi - ȳ)] / sqrt(Σ(xi - x̄)² × Σ(yi - ȳ)²)
    ///
    /// Returns `None` for mismatched lengths, fewer than 2 points, or when
    /// either side has zero variance.
    pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
        let n = x.len();
        if n < 2 || n != y.len() {
            return None;
        }
        let nf = n as f64;
        let mean_x = x.iter().sum::<f64>() / nf;
        let mean_y = y.iter().sum::<f64>() / nf;

        let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
        for (a, b) in x.iter().zip(y) {
            let dx = a - mean_x;
            let dy = b - mean_y;
            sxy += dx * dy;
            sxx += dx * dx;
            syy += dy * dy;
        }

        if sxx == 0.0 || syy == 0.0 {
            return None;
        }
        let r = sxy / (sxx * syy).sqrt();
        r.is_finite().then(|| r.clamp(-1.0, 1.0))
    }

    /// Two-tailed p-value for a coefficient over `n` paired samples.
    ///
    /// Formula: t = r × sqrt(n-2) / sqrt(1-r²)
    pub fn p_value_for_r(r: f64, n: usize) -> Option<f64> {
        if n < 3 {
            return None;
        }

        // Perfect correlation: t is unbounded
        if r.abs() >= 0.9999 {
            return Some(0.0);
        }

        let df = (n - 2) as f64;
        let t_stat = r * df.sqrt() / (1.0 - r * r).sqrt();

        let t_dist = StudentsT::new(0.0, 1.0, df).ok()?;
        let p = 2.0 * (1.0 - t_dist.cdf(t_stat.abs()));
        p.is_finite().then(|| p.clamp(0.0, 1.0))
    }

    /// Full pairwise matrix over labelled columns of equal length.
    pub fn matrix(columns: &[(String, Vec<f64>)]) -> CorrelationMatrix {
        let mut matrix = CorrelationMatrix::new();
        for (name_a, a) in columns {
            let row = matrix.entry(name_a.clone()).or_default();
            for (name_b, b) in columns {
                let r = if name_a == name_b {
                    Self::pearson(a, a).map(|_| 1.0)
                } else {
                    Self::pearson(a, b)
                };
                row.insert(name_b.clone(), r);
            }
        }
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_positive_correlation() {
        let x: Vec<f64> = (0..50).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
        let r = CorrelationEngine::pearson(&x, &y).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        assert_eq!(CorrelationEngine::p_value_for_r(r, x.len()), Some(0.0));
    }

    #[test]
    fn test_perfect_negative_correlation() {
        let x: Vec<f64> = (0..50).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 100.0 - v).collect();
        let r = CorrelationEngine::pearson(&x, &y).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_is_undefined() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [5.0, 5.0, 5.0, 5.0];
        assert!(CorrelationEngine::pearson(&x, &y).is_none());
        assert!(CorrelationEngine::pearson(&[1.0], &[2.0]).is_none());
        assert!(CorrelationEngine::pearson(&x, &x[..3]).is_none());
    }

    #[test]
    fn test_p_value_calculation_accuracy() {
        // r = 0.5 with n = 30: t = 0.5 * sqrt(28) / sqrt(0.75) ≈ 3.055, p ≈ 0.0049
        let p = CorrelationEngine::p_value_for_r(0.5, 30).unwrap();
        assert!(p > 0.003 && p < 0.007, "p = {p}");
        // Weak correlation on few samples is not significant
        let p = CorrelationEngine::p_value_for_r(0.2, 10).unwrap();
        assert!(p > 0.05);
        assert!(CorrelationEngine::p_value_for_r(0.5, 2).is_none());
    }

    #[test]
    fn test_matrix_diagonal_follows_column_variance() {
        let columns = vec![
            ("a".to_string(), vec![1.0, 2.0, 3.0, 4.0]),
            ("b".to_string(), vec![2.0, 1.0, 4.0, 3.0]),
            ("c".to_string(), vec![7.0, 7.0, 7.0, 7.0]),
        ];
        let m = CorrelationEngine::matrix(&columns);
        assert_eq!(m["a"]["a"], Some(1.0));
        assert_eq!(m["a"]["b"], m["b"]["a"]);
        assert_eq!(m["a"]["c"], None);
        assert_eq!(m["b"]["b"], Some(1.0));
        assert_eq!(m["c"]["c"], None);
        assert!(m["c"].values().all(Option::is_none));
    }

    #[test]
    fn test_matrix_short_columns_have_no_diagonal() {
        let columns = vec![("a".to_string(), vec![3.0]), ("b".to_string(), vec![4.0])];
        let m = CorrelationEngine::matrix(&columns);
        assert_eq!(m["a"]["a"], None);
        assert_eq!(m["a"]["b"], None);
    }
}
