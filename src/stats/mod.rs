//! Population statistics: per-metric normalization ranges over the working set,
//! the headshot-dependency percentile, and per-category score summaries.

use crate::config::HEADSHOT_DEPENDENCY_PERCENTILE;
use crate::metrics::{MetricKey, MetricMap, RawMetrics};
use crate::util::{finite, mean, normalize, percentile, stddev};
use serde::Serialize;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// Min/max of one metric over the weapons that have a value for it.
/// With zero samples both bounds are `None` and nothing can be normalized against it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub samples: usize,
}

impl MetricRange {
    pub fn from_values(values: &[f64]) -> Self {
        let mut range = Self::default();
        for v in values.iter().copied().filter(|v| v.is_finite()) {
            range.min = Some(range.min.map_or(v, |m| m.min(v)));
            range.max = Some(range.max.map_or(v, |m| m.max(v)));
            range.samples += 1;
        }
        range
    }

    /// `None` for "no data", 0.5 for "no variance".
    pub fn normalize(&self, value: Option<f64>) -> Option<f64> {
        normalize(value, self.min?, self.max?)
    }

    /// An empty range is valid; a populated one needs `min <= max`.
    pub fn is_valid(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            (None, None) => true,
            _ => false,
        }
    }
}

/// Normalization reference for one recompute cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopulationStats {
    pub ranges: MetricMap<MetricRange>,
    /// 75th percentile of headshot dependency over the working set.
    pub headshot_p75: Option<f64>,
    pub working_set: usize,
}

impl PopulationStats {
    pub fn compute(raws: &[RawMetrics]) -> Self {
        let mut ranges = MetricMap::<MetricRange>::default();
        let mut head_dep = Vec::new();
        for key in MetricKey::iter() {
            let values: Vec<f64> = raws.iter().filter_map(|r| finite(r.get(key))).collect();
            if key == MetricKey::HeadDep {
                head_dep = values.clone();
            }
            ranges[key] = MetricRange::from_values(&values);
        }
        Self {
            ranges,
            headshot_p75: percentile(&head_dep, HEADSHOT_DEPENDENCY_PERCENTILE),
            working_set: raws.len(),
        }
    }

    pub fn range(&self, key: MetricKey) -> &MetricRange {
        &self.ranges[key]
    }

    /// True when the value sits strictly above the working-set p75.
    pub fn is_high_headshot_dependency(&self, value: Option<f64>) -> bool {
        match (finite(value), self.headshot_p75) {
            (Some(v), Some(p75)) => v > p75,
            _ => false,
        }
    }
}

/// Score mean and sample stddev for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategorySummary {
    /// Weapons in the category within the working set.
    pub count: usize,
    /// Weapons with a non-null score.
    pub scored: usize,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
}

impl CategorySummary {
    /// Group `(category, score)` pairs; null scores count toward `count` only.
    pub fn collect<'a>(
        items: impl IntoIterator<Item = (&'a str, Option<f64>)>,
    ) -> BTreeMap<String, CategorySummary> {
        let mut groups: BTreeMap<String, (usize, Vec<f64>)> = BTreeMap::new();
        for (category, score) in items {
            let entry = groups.entry(category.to_string()).or_default();
            entry.0 += 1;
            if let Some(s) = finite(score) {
                entry.1.push(s);
            }
        }
        groups
            .into_iter()
            .map(|(category, (count, scores))| {
                let summary = CategorySummary {
                    count,
                    scored: scores.len(),
                    mean: mean(&scores),
                    stddev: stddev(&scores),
                };
                (category, summary)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricValues;

    fn raw_with(key: MetricKey, value: Option<f64>) -> RawMetrics {
        let mut values = MetricValues::default();
        values[key] = value;
        RawMetrics {
            values,
            breakpoint: Default::default(),
            weight_factor: None,
            damage_per_cycle_base: None,
            reloads_every_kill: false,
        }
    }

    #[test]
    fn ranges_skip_nulls() {
        let raws = vec![
            raw_with(MetricKey::Ttk, Some(1.0)),
            raw_with(MetricKey::Ttk, None),
            raw_with(MetricKey::Ttk, Some(3.0)),
        ];
        let stats = PopulationStats::compute(&raws);
        let ttk = stats.range(MetricKey::Ttk);
        assert_eq!((ttk.min, ttk.max, ttk.samples), (Some(1.0), Some(3.0), 2));
        assert_eq!(stats.range(MetricKey::Sustain).samples, 0);
        assert_eq!(stats.working_set, 3);
    }

    #[test]
    fn empty_range_cannot_normalize() {
        let empty = MetricRange::default();
        assert_eq!(empty.normalize(Some(1.0)), None);
        assert!(empty.is_valid());
        let flat = MetricRange::from_values(&[2.0, 2.0]);
        assert_eq!(flat.normalize(Some(2.0)), Some(0.5));
    }

    #[test]
    fn inverted_range_is_invalid() {
        let r = MetricRange {
            min: Some(3.0),
            max: Some(1.0),
            samples: 2,
        };
        assert!(!r.is_valid());
    }

    #[test]
    fn headshot_p75_flag() {
        let raws: Vec<RawMetrics> = [1.0, 2.0, 3.0, 4.0]
            .iter()
            .map(|v| raw_with(MetricKey::HeadDep, Some(*v)))
            .collect();
        let stats = PopulationStats::compute(&raws);
        assert_eq!(stats.headshot_p75, Some(3.25));
        assert!(stats.is_high_headshot_dependency(Some(4.0)));
        assert!(!stats.is_high_headshot_dependency(Some(3.0)));
        assert!(!stats.is_high_headshot_dependency(None));
    }

    #[test]
    fn category_summary_counts_unscored() {
        let summaries = CategorySummary::collect([
            ("AR", Some(40.0)),
            ("AR", Some(60.0)),
            ("AR", None),
            ("SMG", Some(10.0)),
        ]);
        let ar = summaries["AR"];
        assert_eq!((ar.count, ar.scored), (3, 2));
        assert_eq!(ar.mean, Some(50.0));
        assert!(ar.stddev.is_some());
        assert_eq!(summaries["SMG"].stddev, None);
    }
}
