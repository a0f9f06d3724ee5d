//! Normalizer and composite scorer.

use crate::config::ScoreWeights;
use crate::metrics::{Direction, MetricKey, MetricValues, NormBasis, RawMetrics, REGISTRY};
use crate::stats::PopulationStats;
use crate::util::{clamp, finite, invert, to_score100};
use serde::Serialize;

/// Scored dimensions, in [`ScoreWeights::as_array`] order.
pub const DIMENSIONS: [MetricKey; 6] = [
    MetricKey::Ttk,
    MetricKey::Sustain,
    MetricKey::Handling,
    MetricKey::RangeScore,
    MetricKey::ReloadPenalty,
    MetricKey::ArmorCons,
];

/// Per-weapon [0,1] values where 1.0 is always favorable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedMetrics {
    pub values: MetricValues,
    /// Inverted, normalized TTK volatility.
    pub consistency: Option<f64>,
    /// Weight normalized against the dataset weight range (not inverted).
    pub weight_factor: Option<f64>,
}

impl NormalizedMetrics {
    pub fn get(&self, key: MetricKey) -> Option<f64> {
        self.values[key]
    }
}

/// Map every raw metric into [0,1] against the population ranges, inverting lower-is-better ones.
pub fn normalize_metrics(raw: &RawMetrics, stats: &PopulationStats) -> NormalizedMetrics {
    let mut values = MetricValues::default();
    for d in REGISTRY.iter() {
        let value = raw.get(d.key);
        let scaled = match d.basis {
            NormBasis::Population => stats.range(d.key).normalize(value),
            NormBasis::CategoryMax => raw
                .damage_per_cycle_base
                .or_else(|| stats.range(d.key).normalize(value)),
        };
        let oriented = match d.direction {
            Direction::HigherIsBetter => scaled,
            Direction::LowerIsBetter => invert(scaled),
        };
        values[d.key] = finite(oriented).map(|v| clamp(v, 0.0, 1.0));
    }
    NormalizedMetrics {
        consistency: values[MetricKey::Volatility],
        weight_factor: raw.weight_factor,
        values,
    }
}

/// Score01 over the dimensions with positive weight and a non-null value.
/// `None` when no dimension qualifies, so an unscoreable weapon is never ranked last.
pub fn composite_score(norm: &NormalizedMetrics, weights: &ScoreWeights) -> Option<f64> {
    let weights = weights.normalized();
    let mut w_sum = 0.0;
    let mut v_sum = 0.0;
    for (key, w) in DIMENSIONS.iter().zip(weights.as_array()) {
        if w <= 0.0 {
            continue;
        }
        if let Some(v) = norm.get(*key) {
            w_sum += w;
            v_sum += w * v;
        }
    }
    if w_sum > 0.0 {
        Some(clamp(v_sum / w_sum, 0.0, 1.0))
    } else {
        None
    }
}

/// Composite score on both scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub score01: f64,
    pub score: f64,
}

pub fn score(norm: &NormalizedMetrics, weights: &ScoreWeights) -> Option<Score> {
    composite_score(norm, weights).map(|score01| Score {
        score01,
        score: to_score100(score01),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use crate::metrics::MetricMap;
    use crate::stats::MetricRange;

    fn raw(values: &[(MetricKey, f64)]) -> RawMetrics {
        let mut v = MetricValues::default();
        for (k, x) in values {
            v[*k] = Some(*x);
        }
        RawMetrics {
            values: v,
            breakpoint: Default::default(),
            weight_factor: None,
            damage_per_cycle_base: None,
            reloads_every_kill: false,
        }
    }

    fn stats_with(ranges: &[(MetricKey, f64, f64)]) -> PopulationStats {
        let mut map = MetricMap::<MetricRange>::default();
        for (k, min, max) in ranges {
            map[*k] = MetricRange::from_values(&[*min, *max]);
        }
        PopulationStats {
            ranges: map,
            headshot_p75: None,
            working_set: 2,
        }
    }

    #[test]
    fn lower_is_better_inverted() {
        let stats = stats_with(&[(MetricKey::Ttk, 1.0, 3.0), (MetricKey::Sustain, 100.0, 200.0)]);
        let n = normalize_metrics(
            &raw(&[(MetricKey::Ttk, 1.5), (MetricKey::Sustain, 150.0)]),
            &stats,
        );
        assert_eq!(n.get(MetricKey::Ttk), Some(0.75));
        assert_eq!(n.get(MetricKey::Sustain), Some(0.5));
        assert_eq!(n.get(MetricKey::Handling), None);
    }

    #[test]
    fn consistency_is_inverted_volatility() {
        let stats = stats_with(&[(MetricKey::Volatility, 0.0, 1.0)]);
        let n = normalize_metrics(&raw(&[(MetricKey::Volatility, 0.2)]), &stats);
        assert!((n.consistency.unwrap() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn damage_per_cycle_prefers_category_base() {
        let stats = stats_with(&[(MetricKey::DamagePerCycle, 100.0, 500.0)]);
        let mut r = raw(&[(MetricKey::DamagePerCycle, 300.0)]);
        assert_eq!(normalize_metrics(&r, &stats).get(MetricKey::DamagePerCycle), Some(0.5));
        r.damage_per_cycle_base = Some(0.9);
        assert_eq!(normalize_metrics(&r, &stats).get(MetricKey::DamagePerCycle), Some(0.9));
    }

    #[test]
    fn score_skips_null_dimensions() {
        let mut n = NormalizedMetrics::default();
        n.values[MetricKey::Ttk] = Some(1.0);
        n.values[MetricKey::Handling] = Some(0.0);
        // META: ttk 30, handling 15 survive -> 30/45
        let s = score(&n, &Preset::Meta.weights()).unwrap();
        assert!((s.score01 - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.score, 66.7);
    }

    #[test]
    fn zero_weights_or_no_values_are_unscoreable() {
        let mut n = NormalizedMetrics::default();
        assert_eq!(composite_score(&n, &Preset::Meta.weights()), None);
        n.values[MetricKey::Ttk] = Some(0.4);
        assert_eq!(composite_score(&n, &ScoreWeights::default()), None);
        let only_range = ScoreWeights::new(0.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        assert_eq!(composite_score(&n, &only_range), None);
    }
}
