//! Shared utilities: scalar math, logging, name lookup.
//!
//! Every helper here treats a missing or non-finite number as `None` and
//! never turns it into zero.

use tracing::Level;

/// Initialize tracing with env filter. Safe to call once at startup.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Normalize weapon name for lookup (lowercase, trim).
pub fn normalize_name(s: &str) -> String {
    s.trim().to_lowercase()
}

pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    x.max(lo).min(hi)
}

/// Keep a value only if it is a finite number.
pub fn finite(x: Option<f64>) -> Option<f64> {
    x.filter(|v| v.is_finite())
}

/// Keep a value only if it is finite and strictly positive.
pub fn positive(x: Option<f64>) -> Option<f64> {
    finite(x).filter(|v| *v > 0.0)
}

/// Coerce a text cell into a number. Empty, unparsable and non-finite cells are `None`.
pub fn coerce_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    finite(t.parse::<f64>().ok())
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n−1 denominator). `None` with fewer than two finite values.
pub fn stddev(values: &[f64]) -> Option<f64> {
    let arr: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if arr.len() < 2 {
        return None;
    }
    let m = arr.iter().sum::<f64>() / arr.len() as f64;
    let var = arr.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (arr.len() - 1) as f64;
    Some(var.sqrt())
}

/// Min-max normalization into [0,1]. A degenerate range (min == max) maps to the 0.5 midpoint.
pub fn normalize(value: Option<f64>, min: f64, max: f64) -> Option<f64> {
    let v = finite(value)?;
    if max == min {
        return Some(0.5);
    }
    Some(clamp((v - min) / (max - min), 0.0, 1.0))
}

pub fn invert(x: Option<f64>) -> Option<f64> {
    x.map(|v| 1.0 - v)
}

/// Weighted mean over the components that are present: Σ(w·v) / Σ(w).
pub fn weighted_average(parts: &[(f64, Option<f64>)]) -> Option<f64> {
    let mut w_sum = 0.0;
    let mut v_sum = 0.0;
    for (w, v) in parts {
        if let Some(v) = finite(*v) {
            w_sum += w;
            v_sum += w * v;
        }
    }
    if w_sum > 0.0 {
        Some(v_sum / w_sum)
    } else {
        None
    }
}

/// Unweighted mean of the present components.
pub fn average_present(parts: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = parts.iter().filter_map(|p| finite(*p)).collect();
    mean(&present)
}

/// Percentile with linear interpolation between order statistics.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    let mut arr: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if arr.is_empty() || !pct.is_finite() {
        return None;
    }
    arr.sort_by(|a, b| a.total_cmp(b));
    let rank = (pct / 100.0) * (arr.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Some(arr[lower]);
    }
    let weight = rank - lower as f64;
    Some(arr[lower] + (arr[upper] - arr[lower]) * weight)
}

/// 0–1 value onto the 0–100 display scale, one decimal place.
pub fn to_score100(x01: f64) -> f64 {
    (x01 * 1000.0).round() / 10.0
}
