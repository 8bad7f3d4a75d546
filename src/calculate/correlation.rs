//! Pearson correlation between two numeric series.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Pearson product-moment correlation coefficient of `x` and `y`.
///
/// Series of unequal length are truncated to the shorter one. Returns `NaN`
/// when fewer than two pairs remain or either series has zero variance.
pub fn correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() {
        warn!(
            "Correlation of series with unequal lengths {} and {}, truncating",
            x.len(),
            y.len()
        );
    }
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let (x, y) = (&x[..n], &y[..n]);

    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    let mut variance_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        variance_x += dx * dx;
        variance_y += dy * dy;
    }

    if variance_x == 0.0 || variance_y == 0.0 {
        return f64::NAN;
    }

    (covariance / (variance_x * variance_y).sqrt()).clamp(-1.0, 1.0)
}

/// [`correlation`] with `None` in place of `NaN`.
pub fn correlation_or_none(x: &[f64], y: &[f64]) -> Option<f64> {
    let r = correlation(x, y);
    if r.is_nan() {
        None
    } else {
        Some(r)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Human reading of a correlation coefficient's magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Perfect,
    Strong,
    Moderate,
    None,
    /// Not enough data to compute a coefficient
    Undefined,
}

impl CorrelationStrength {
    /// Classify a coefficient by its absolute value.
    pub fn from_coefficient(r: f64) -> Self {
        if r.is_nan() {
            return CorrelationStrength::Undefined;
        }
        let magnitude = r.abs();
        if magnitude >= 0.99 {
            CorrelationStrength::Perfect
        } else if magnitude > 0.8 {
            CorrelationStrength::Strong
        } else if magnitude > 0.6 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::None
        }
    }
}

impl fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationStrength::Perfect => write!(f, "(perfect)"),
            CorrelationStrength::Strong => write!(f, "(strong)"),
            CorrelationStrength::Moderate => write!(f, "(moderate)"),
            CorrelationStrength::None => write!(f, "(no relation)"),
            CorrelationStrength::Undefined => write!(f, "–"),
        }
    }
}

/// Label for a coefficient, e.g. `"(strong)"`.
pub fn describe_correlation(r: f64) -> String {
    CorrelationStrength::from_coefficient(r).to_string()
}

/// Coefficient with two decimals and its label, or a placeholder for `NaN`.
pub fn format_correlation(r: f64) -> String {
    match CorrelationStrength::from_coefficient(r) {
        CorrelationStrength::Undefined => "–".to_string(),
        strength => format!("{:.2} {}", r, strength),
    }
}
