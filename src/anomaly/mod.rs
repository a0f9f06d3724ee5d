//! Validation summary and dataset anomalies: severity, explanation, technical note.

use crate::config::{ScoreWeights, MISSING_METRIC_WARN_RATIO};
use crate::metrics::{MetricKey, MetricMap};
use crate::pipeline::ScoredWeapon;
use crate::stats::{MetricRange, PopulationStats};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AnomalySeverity {
    Info,
    Warn,
    Crit,
}

impl AnomalySeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            AnomalySeverity::Info => "INFO",
            AnomalySeverity::Warn => "WARN",
            AnomalySeverity::Crit => "CRIT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub code: String,
    pub severity: AnomalySeverity,
    /// Short explanation for balance reviewers.
    pub summary: String,
    /// Technical note for devs.
    pub technical: String,
    pub weapons: Vec<String>,
    pub metric: Option<String>,
}

impl Anomaly {
    pub fn metric_missing(key: MetricKey, missing: usize, total: usize) -> Self {
        let pct = missing as f64 / total.max(1) as f64 * 100.0;
        Self {
            code: "METRIC_MISSING".to_string(),
            severity: AnomalySeverity::Warn,
            summary: format!("Metric {} missing {:.1}%", key.as_ref(), pct),
            technical: format!(
                "{} of {} weapon(s) have no normalized {} ({})",
                missing,
                total,
                key.as_ref(),
                key.descriptor().label
            ),
            weapons: vec![],
            metric: Some(key.as_ref().to_string()),
        }
    }

    pub fn stat_range_invalid(key: MetricKey, range: &MetricRange) -> Self {
        Self {
            code: "STAT_RANGE_INVALID".to_string(),
            severity: AnomalySeverity::Crit,
            summary: format!("Stat range invalid for {}", key.as_ref()),
            technical: format!(
                "min={:?} max={:?} samples={}",
                range.min, range.max, range.samples
            ),
            weapons: vec![],
            metric: Some(key.as_ref().to_string()),
        }
    }

    pub fn weights_zero() -> Self {
        Self {
            code: "WEIGHTS_ZERO".to_string(),
            severity: AnomalySeverity::Crit,
            summary: "Weights sum to 0".to_string(),
            technical: "All six scoring weights are zero; every Score is null.".to_string(),
            weapons: vec![],
            metric: None,
        }
    }

    pub fn score_outlier(name: &str, category: &str, z: f64) -> Self {
        Self {
            code: "SCORE_OUTLIER".to_string(),
            severity: AnomalySeverity::Info,
            summary: format!("{} scores {:.2}σ above the {} average.", name, z, category),
            technical: format!("category={} z={}", category, z),
            weapons: vec![name.to_string()],
            metric: None,
        }
    }

    pub fn unscoreable(name: &str) -> Self {
        Self {
            code: "UNSCOREABLE".to_string(),
            severity: AnomalySeverity::Info,
            summary: format!("{} has no scoreable dimension.", name),
            technical: "No weighted dimension has both a positive weight and a normalized value."
                .to_string(),
            weapons: vec![name.to_string()],
            metric: None,
        }
    }
}

/// Health of one recompute cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationSummary {
    /// Normalized values inside [0,1].
    pub ok_metrics: usize,
    /// Normalized values present.
    pub total_metrics: usize,
    pub weights_invalid: bool,
    pub anomalies: Vec<Anomaly>,
}

impl ValidationSummary {
    pub fn ok_text(&self) -> String {
        format!("Metrics OK: {}/{}", self.ok_metrics, self.total_metrics.max(1))
    }

    /// Warn and crit summaries joined, or "All metrics nominal".
    pub fn missing_text(&self) -> String {
        let warnings: Vec<&str> = self
            .anomalies
            .iter()
            .filter(|a| a.severity != AnomalySeverity::Info)
            .map(|a| a.summary.as_str())
            .collect();
        if warnings.is_empty() {
            "All metrics nominal".to_string()
        } else {
            warnings.join(" | ")
        }
    }

    pub fn count(&self, severity: AnomalySeverity) -> usize {
        self.anomalies.iter().filter(|a| a.severity == severity).count()
    }
}

/// Check normalized bounds, missing-metric ratios, stats ranges, weights, outliers and
/// unscoreable rows.
pub fn validate(
    rows: &[ScoredWeapon],
    stats: &PopulationStats,
    weights: &ScoreWeights,
) -> ValidationSummary {
    let mut summary = ValidationSummary::default();
    let mut missing = MetricMap::<usize>::default();
    for row in rows {
        for (key, value) in row.normalized.values.iter() {
            match value {
                Some(v) => {
                    summary.total_metrics += 1;
                    if (0.0..=1.0).contains(v) {
                        summary.ok_metrics += 1;
                    }
                }
                None => missing[key] += 1,
            }
        }
    }

    for (key, range) in stats.ranges.iter() {
        let count = missing[key];
        if !rows.is_empty() && count as f64 / rows.len() as f64 > MISSING_METRIC_WARN_RATIO {
            summary
                .anomalies
                .push(Anomaly::metric_missing(key, count, rows.len()));
        }
        // Computed ranges always hold min <= max; this catches hand-built stats.
        if !range.is_valid() {
            summary.anomalies.push(Anomaly::stat_range_invalid(key, range));
        }
    }

    if weights.is_zero() {
        summary.weights_invalid = true;
        summary.anomalies.push(Anomaly::weights_zero());
    }

    for row in rows {
        if let (true, Some(z)) = (row.outlier_warning, row.outlier_index) {
            summary
                .anomalies
                .push(Anomaly::score_outlier(&row.record.name, &row.record.category, z));
        }
        if row.score.is_none() {
            summary.anomalies.push(Anomaly::unscoreable(&row.record.name));
        }
    }
    summary
}
