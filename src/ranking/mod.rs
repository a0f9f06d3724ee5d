//! Secondary rankers over the scored population: role dominance, outlier index,
//! counter score/rank, distance-band suitability, skill floor and ceiling.
//!
//! Inputs are slices aligned with the working set; outputs keep that alignment.

use crate::config::{DistanceBand, DISTANCE_BANDS, OUTLIER_Z_THRESHOLD, TOP_DECILE};
use crate::metrics::MetricKey;
use crate::scoring::NormalizedMetrics;
use crate::stats::CategorySummary;
use crate::util::{average_present, clamp, finite, invert, to_score100};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Percentile position within a ranked group (top = 100, bottom = 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub index: f64,
    pub top10: bool,
}

/// Rank descending, skipping nulls. Equal values keep their input order.
pub fn rank_placements(values: &[Option<f64>]) -> Vec<Option<Placement>> {
    let mut order: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| finite(*v).map(|v| (i, v)))
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1));
    let n = order.len();
    let top_n = ((n as f64 * TOP_DECILE).ceil() as usize).max(1);
    let mut out = vec![None; values.len()];
    for (idx, (i, _)) in order.into_iter().enumerate() {
        let pct = if n > 1 {
            1.0 - idx as f64 / (n - 1) as f64
        } else {
            1.0
        };
        out[i] = Some(Placement {
            index: to_score100(pct),
            top10: idx < top_n,
        });
    }
    out
}

/// Percentile rank of Score01 within each category.
pub fn role_dominance(rows: &[(&str, Option<f64>)]) -> Vec<Option<Placement>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, (category, _)) in rows.iter().enumerate() {
        groups.entry(*category).or_default().push(i);
    }
    let mut out = vec![None; rows.len()];
    for members in groups.values() {
        let scores: Vec<Option<f64>> = members.iter().map(|i| rows[*i].1).collect();
        for (i, placement) in members.iter().zip(rank_placements(&scores)) {
            out[*i] = placement;
        }
    }
    out
}

/// Z-score of a weapon's Score against its category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Outlier {
    pub index: Option<f64>,
    pub warning: bool,
}

pub fn outlier_indices(rows: &[(&str, Option<f64>)]) -> Vec<Outlier> {
    let summaries = CategorySummary::collect(rows.iter().copied());
    rows.iter()
        .map(|(category, score)| {
            let z = summaries.get(*category).and_then(|s| z_score(*score, s));
            Outlier {
                index: z,
                warning: z.is_some_and(|z| z > OUTLIER_Z_THRESHOLD),
            }
        })
        .collect()
}

/// Undefined when the category stddev is zero or has fewer than two scores.
fn z_score(score: Option<f64>, summary: &CategorySummary) -> Option<f64> {
    let s = finite(score)?;
    let mean = summary.mean?;
    let sd = summary.stddev.filter(|sd| *sd > 0.0)?;
    Some((s - mean) / sd)
}

/// Counter viability on [0,1]: mean of the present components among headshot
/// independence, armor consistency, inverted reload penalty and kills per magazine.
pub fn counter_score(norm: &NormalizedMetrics) -> Option<f64> {
    average_present(&[
        norm.get(MetricKey::HeadDep),
        norm.get(MetricKey::ArmorCons),
        norm.get(MetricKey::ReloadPenalty),
        norm.get(MetricKey::KillsPerMag),
    ])
}

/// How forgiving a weapon is, 0–100.
pub fn skill_floor(norm: &NormalizedMetrics) -> Option<f64> {
    average_present(&[
        norm.get(MetricKey::HeadDep),
        norm.consistency,
        norm.get(MetricKey::KillsPerMag),
    ])
    .map(to_score100)
}

/// How much upside a skilled user gets, 0–100. Rewards headshot dependency.
pub fn skill_ceiling(norm: &NormalizedMetrics) -> Option<f64> {
    average_present(&[
        norm.get(MetricKey::CritLeverage),
        norm.get(MetricKey::Handling),
        invert(norm.get(MetricKey::HeadDep)),
    ])
    .map(to_score100)
}

/// Suitability per distance band on the 0–100 scale, in [`DISTANCE_BANDS`] order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandScores(pub [Option<f64>; 4]);

impl BandScores {
    pub fn get(&self, key: &str) -> Option<f64> {
        DISTANCE_BANDS
            .iter()
            .position(|b| b.key == key)
            .and_then(|i| self.0[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<f64>)> + '_ {
        DISTANCE_BANDS.iter().map(|b| b.key).zip(self.0.iter().copied())
    }
}

impl Serialize for BandScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(DISTANCE_BANDS.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, &value)?;
        }
        map.end()
    }
}

/// Share of a band the weapon's range covers. Unknown range counts as full coverage.
fn band_coverage(range: Option<f64>, band: &DistanceBand) -> f64 {
    let Some(range) = finite(range) else {
        return 1.0;
    };
    if range < band.min {
        return clamp(range / band.min.max(0.0001), 0.0, 1.0);
    }
    if band.max.is_finite() && range > band.max {
        let excess = range - band.max;
        let span = (band.max - band.min).max(1.0);
        return clamp(1.0 - excess / span, 0.0, 1.0);
    }
    1.0
}

/// coverage × range score × Score01 per band. All null without a range score or a score.
pub fn distance_band_scores(
    range: Option<f64>,
    range_score: Option<f64>,
    score01: Option<f64>,
) -> BandScores {
    let (Some(range_score), Some(score01)) = (finite(range_score), finite(score01)) else {
        return BandScores::default();
    };
    let base = clamp(range_score, 0.0, 1.0) * clamp(score01, 0.0, 1.0);
    let mut out = BandScores::default();
    for (slot, band) in out.0.iter_mut().zip(DISTANCE_BANDS.iter()) {
        *slot = Some(to_score100(clamp(base * band_coverage(range, band), 0.0, 1.0)));
    }
    out
}
