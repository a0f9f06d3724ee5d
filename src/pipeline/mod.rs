//! Recompute pipeline: controls → context → raw metrics → population stats →
//! normalized metrics → composite score → secondary rankings → sorted rows.
//!
//! Every call rebuilds the output from `(records, controls, sort)`; nothing is cached
//! between calls.

mod sort;

pub use sort::{SortDir, SortKey, SortSpec};

use crate::anomaly::{validate, ValidationSummary};
use crate::config::{Preset, ScoreWeights};
use crate::error::{BalanceError, BalanceResult};
use crate::metrics::{Context, MetricKey, RawMetrics};
use crate::model::{ArmorTier, WeaponRecord, Zone};
use crate::ranking::{
    counter_score, distance_band_scores, outlier_indices, rank_placements, role_dominance,
    skill_ceiling, skill_floor, BandScores,
};
use crate::scoring::{normalize_metrics, score, NormalizedMetrics};
use crate::stats::{CategorySummary, PopulationStats};
use crate::util::{normalize_name, to_score100};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use strum::{Display, EnumString};
use tracing::debug;

/// What the chart plots. Display only; no effect on computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, Serialize)]
#[strum(ascii_case_insensitive)]
pub enum ChartMetric {
    #[default]
    #[strum(to_string = "SCORE")]
    Score,
    #[strum(to_string = "TTK")]
    Ttk,
}

/// Validated control selections. Unknown enum strings are rejected when building these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Controls {
    pub armor: ArmorTier,
    pub zone: Zone,
    /// `None` means all categories.
    pub category: Option<String>,
    /// Lowercased Name substring; empty matches everything.
    pub search: String,
    pub chart_metric: ChartMetric,
    pub preset: Preset,
    /// Raw user weights; renormalized at scoring time.
    pub weights: ScoreWeights,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            armor: ArmorTier::Heavy,
            zone: Zone::Overall,
            category: None,
            search: String::new(),
            chart_metric: ChartMetric::Score,
            preset: Preset::Meta,
            weights: Preset::Meta.weights(),
        }
    }
}

impl Controls {
    /// Build from a control-name → value mapping.
    ///
    /// Keys: `armor`, `zone`, `category`, `search`, `chartMetric`, `preset`, `w_<weight>`.
    /// The preset seeds all six weights regardless of key order; `w_` keys then override
    /// single entries, and the preset reports `CUSTOM` when the result differs from it.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> BalanceResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut controls = Controls::default();
        let mut overrides: Vec<(&'static str, f64)> = Vec::new();
        for (key, value) in pairs {
            let (key, raw) = (key.as_ref(), value.as_ref());
            let value = raw.trim();
            let invalid = || BalanceError::invalid_control(key, value);
            match key {
                "armor" => controls.armor = ArmorTier::from_str(value).map_err(|_| invalid())?,
                "zone" => controls.zone = Zone::from_str(value).map_err(|_| invalid())?,
                "category" => {
                    controls.category = (!value.is_empty() && !value.eq_ignore_ascii_case("All"))
                        .then(|| value.to_string())
                }
                "search" => controls.search = raw.to_lowercase(),
                "chartMetric" => {
                    controls.chart_metric = ChartMetric::from_str(value).map_err(|_| invalid())?
                }
                "preset" => controls.preset = Preset::from_str(value).map_err(|_| invalid())?,
                other => {
                    let name = other
                        .strip_prefix("w_")
                        .and_then(|n| ScoreWeights::NAMES.iter().copied().find(|known| *known == n))
                        .ok_or_else(invalid)?;
                    let w: f64 = value.parse().map_err(|_| invalid())?;
                    overrides.push((name, w));
                }
            }
        }
        controls.weights = controls.preset.weights();
        for (name, w) in &overrides {
            controls.weights.set(name, *w);
        }
        controls.weights.validate()?;
        if !overrides.is_empty() && controls.weights != controls.preset.weights() {
            controls.preset = Preset::Custom;
        }
        Ok(controls)
    }

    /// Category and Name-substring filter.
    pub fn matches(&self, record: &WeaponRecord) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |c| record.category == c);
        category_ok && record.name.to_lowercase().contains(&self.search)
    }
}

/// Explicit inputs of one recompute cycle.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub records: Vec<WeaponRecord>,
    pub controls: Controls,
    pub sort: SortSpec,
}

impl PipelineState {
    pub fn new(records: Vec<WeaponRecord>, controls: Controls, sort: SortSpec) -> Self {
        Self {
            records,
            controls,
            sort,
        }
    }
}

/// A record with everything derived for it in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredWeapon {
    pub record: WeaponRecord,
    pub raw: RawMetrics,
    pub normalized: NormalizedMetrics,
    pub score01: Option<f64>,
    /// 0–100, one decimal.
    pub score: Option<f64>,
    pub role_dominance_index: Option<f64>,
    pub role_dominance_top10: bool,
    pub outlier_index: Option<f64>,
    pub outlier_warning: bool,
    pub counter_score01: Option<f64>,
    pub counter_score: Option<f64>,
    pub counter_rank: Option<f64>,
    pub counter_top10: bool,
    pub distance_bands: BandScores,
    pub skill_floor: Option<f64>,
    pub skill_ceiling: Option<f64>,
    /// Headshot dependency above the working-set p75.
    pub head_dep_high: bool,
}

impl ScoredWeapon {
    /// A row with no derived values yet.
    pub fn unscored(record: WeaponRecord) -> Self {
        Self {
            record,
            raw: RawMetrics::default(),
            normalized: NormalizedMetrics::default(),
            score01: None,
            score: None,
            role_dominance_index: None,
            role_dominance_top10: false,
            outlier_index: None,
            outlier_warning: false,
            counter_score01: None,
            counter_score: None,
            counter_rank: None,
            counter_top10: false,
            distance_bands: BandScores::default(),
            skill_floor: None,
            skill_ceiling: None,
            head_dep_high: false,
        }
    }

    pub fn ttk(&self) -> Option<f64> {
        self.raw.get(MetricKey::Ttk)
    }
}

/// Rows in sort order plus the population-level figures they were derived against.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub rows: Vec<ScoredWeapon>,
    pub stats: PopulationStats,
    pub categories: BTreeMap<String, CategorySummary>,
    pub validation: ValidationSummary,
    pub total_records: usize,
    pub context: Context,
    pub sort: SortSpec,
}

impl PipelineOutput {
    pub fn status_text(&self) -> String {
        format!("Showing {} of {}", self.rows.len(), self.total_records)
    }
}

/// Run the full pipeline.
pub fn recompute(state: &PipelineState) -> PipelineOutput {
    let controls = &state.controls;
    let context = Context::build(&state.records, controls.armor, controls.zone, &controls.weights);

    let working: Vec<&WeaponRecord> = state
        .records
        .iter()
        .filter(|r| controls.matches(r))
        .collect();
    let raws: Vec<RawMetrics> = working
        .iter()
        .map(|r| RawMetrics::compute(r, &context))
        .collect();
    let stats = PopulationStats::compute(&raws);

    let mut rows: Vec<ScoredWeapon> = working
        .into_iter()
        .zip(raws)
        .map(|(record, raw)| {
            let normalized = normalize_metrics(&raw, &stats);
            let scored = score(&normalized, &controls.weights);
            let counter01 = counter_score(&normalized);
            let mut row = ScoredWeapon::unscored(record.clone());
            row.score01 = scored.map(|s| s.score01);
            row.score = scored.map(|s| s.score);
            row.counter_score01 = counter01;
            row.counter_score = counter01.map(to_score100);
            row.distance_bands = distance_band_scores(
                record.range,
                raw.get(MetricKey::RangeScore),
                row.score01,
            );
            row.skill_floor = skill_floor(&normalized);
            row.skill_ceiling = skill_ceiling(&normalized);
            row.head_dep_high = stats.is_high_headshot_dependency(raw.get(MetricKey::HeadDep));
            row.raw = raw;
            row.normalized = normalized;
            row
        })
        .collect();

    let by_category_01: Vec<(&str, Option<f64>)> = rows
        .iter()
        .map(|r| (r.record.category.as_str(), r.score01))
        .collect();
    let dominance = role_dominance(&by_category_01);
    let by_category_100: Vec<(&str, Option<f64>)> = rows
        .iter()
        .map(|r| (r.record.category.as_str(), r.score))
        .collect();
    let outliers = outlier_indices(&by_category_100);
    let categories = CategorySummary::collect(by_category_100.iter().copied());
    let counters: Vec<Option<f64>> = rows.iter().map(|r| r.counter_score01).collect();
    let counter_ranks = rank_placements(&counters);

    for (((row, dom), out), counter) in rows
        .iter_mut()
        .zip(dominance)
        .zip(outliers)
        .zip(counter_ranks)
    {
        row.role_dominance_index = dom.map(|p| p.index);
        row.role_dominance_top10 = dom.is_some_and(|p| p.top10);
        row.outlier_index = out.index;
        row.outlier_warning = out.warning;
        row.counter_rank = counter.map(|p| p.index);
        row.counter_top10 = counter.is_some_and(|p| p.top10);
    }

    let validation = validate(&rows, &stats, &controls.weights);
    state.sort.sort(&mut rows);

    let unscoreable = rows.iter().filter(|r| r.score.is_none()).count();
    debug!(
        "recomputed {} of {} weapon(s) ({} unscoreable) armor={} zone={}",
        rows.len(),
        state.records.len(),
        unscoreable,
        controls.armor,
        controls.zone
    );

    PipelineOutput {
        rows,
        stats,
        categories,
        validation,
        total_records: state.records.len(),
        context,
        sort: state.sort,
    }
}

/// Detail row for one weapon from the same recompute output as the table.
pub fn weapon_detail<'a>(output: &'a PipelineOutput, name: &str) -> Option<&'a ScoredWeapon> {
    let key = normalize_name(name);
    output
        .rows
        .iter()
        .find(|r| normalize_name(&r.record.name) == key)
}
