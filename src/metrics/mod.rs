//! Metric registry: one descriptor per derived metric (key, label, direction,
//! normalization basis, raw calculator). Stats, normalization and scoring
//! iterate [`REGISTRY`] instead of naming metrics one by one.

mod calc;

pub use calc::{
    armor_breakpoint, armor_consistency, armor_pen_delta, crit_leverage, damage_per_cycle,
    exposure_time, handling_index, headshot_dependency, kills_per_mag, mobility_cost, range_score,
    reload_tax, sustained_dps, sustained_dps_from, ttk_volatility, weight_factor, ArmorBreakpoint,
    ArmorPenDelta,
};

use crate::config::{HitWeights, ScoreWeights, OVERALL_HIT_WEIGHTS};
use crate::model::{resolve_stk, resolve_ttk, ArmorTier, WeaponRecord, Zone};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};
use strum::{AsRefStr, EnumCount, EnumIter, IntoEnumIterator};

/// Every derived per-weapon metric.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumCount, AsRefStr,
)]
pub enum MetricKey {
    #[strum(serialize = "TTK")]
    Ttk,
    #[strum(serialize = "STK")]
    Stk,
    Sustain,
    Handling,
    RangeScore,
    ReloadPenalty,
    ArmorCons,
    ArmorBreak,
    Volatility,
    ExposureTime,
    MobilityCost,
    KillsPerMag,
    DamagePerCycle,
    CritLeverage,
    HeadDep,
    ArmorPen,
    ArmorPenSeconds,
}

impl MetricKey {
    pub fn descriptor(self) -> &'static MetricDescriptor {
        &REGISTRY[self as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Reference the raw value is normalized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormBasis {
    /// Min/max over the current working set.
    Population,
    /// Ratio to the weapon's category maximum over the whole dataset; population min/max
    /// when unknown.
    CategoryMax,
}

pub type RawFn = fn(&WeaponRecord, &Context) -> Option<f64>;

pub struct MetricDescriptor {
    pub key: MetricKey,
    pub label: &'static str,
    pub direction: Direction,
    pub basis: NormBasis,
    pub raw: RawFn,
}

impl std::fmt::Debug for MetricDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricDescriptor")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("direction", &self.direction)
            .field("basis", &self.basis)
            .finish()
    }
}

const fn metric(
    key: MetricKey,
    label: &'static str,
    direction: Direction,
    raw: RawFn,
) -> MetricDescriptor {
    MetricDescriptor {
        key,
        label,
        direction,
        basis: NormBasis::Population,
        raw,
    }
}

use Direction::{HigherIsBetter as Higher, LowerIsBetter as Lower};

/// Registry in [`MetricKey`] order.
pub static REGISTRY: [MetricDescriptor; MetricKey::COUNT] = [
    metric(MetricKey::Ttk, "Time to Kill", Lower, |r, c| c.ttk(r)),
    metric(MetricKey::Stk, "Shots to Kill", Lower, |r, c| c.stk(r)),
    metric(MetricKey::Sustain, "Sustained DPS", Higher, sustained_dps),
    metric(MetricKey::Handling, "Handling", Higher, |r, _| Some(handling_index(r))),
    metric(MetricKey::RangeScore, "Range Score", Higher, range_score),
    metric(MetricKey::ReloadPenalty, "Reload Penalty", Lower, |r, c| {
        reload_tax(r.reload, c.ttk(r))
    }),
    metric(MetricKey::ArmorCons, "Armor Consistency", Higher, |r, c| {
        armor_consistency(r, c.zone, &c.hit_weights)
    }),
    metric(MetricKey::ArmorBreak, "Armor Breakpoint", Lower, |r, _| armor_breakpoint(r).avg),
    metric(MetricKey::Volatility, "TTK Volatility", Lower, |r, c| {
        ttk_volatility(r, c.zone, &c.hit_weights)
    }),
    metric(MetricKey::ExposureTime, "Exposure Time", Lower, exposure_time),
    metric(MetricKey::MobilityCost, "Mobility Cost", Lower, mobility_cost),
    metric(MetricKey::KillsPerMag, "Kills per Mag", Higher, kills_per_mag),
    MetricDescriptor {
        key: MetricKey::DamagePerCycle,
        label: "Damage per Cycle",
        direction: Higher,
        basis: NormBasis::CategoryMax,
        raw: |r, _| damage_per_cycle(r),
    },
    metric(MetricKey::CritLeverage, "Crit Leverage", Higher, |r, c| crit_leverage(r, c.armor)),
    metric(MetricKey::HeadDep, "Headshot Dependency", Lower, |r, c| {
        headshot_dependency(r, c.armor)
    }),
    metric(MetricKey::ArmorPen, "Armor Pen Delta", Lower, |r, c| {
        armor_pen_delta(r, c.zone, &c.hit_weights).ratio
    }),
    metric(MetricKey::ArmorPenSeconds, "Armor Pen Δs", Lower, |r, c| {
        armor_pen_delta(r, c.zone, &c.hit_weights).seconds
    }),
];

/// Fixed-size map with one slot per [`MetricKey`]. Serializes as a JSON object in key order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricMap<T>([T; MetricKey::COUNT]);

pub type MetricValues = MetricMap<Option<f64>>;

impl<T> MetricMap<T> {
    pub fn iter(&self) -> impl Iterator<Item = (MetricKey, &T)> {
        MetricKey::iter().zip(self.0.iter())
    }
}

impl<T> Index<MetricKey> for MetricMap<T> {
    type Output = T;
    fn index(&self, key: MetricKey) -> &T {
        &self.0[key as usize]
    }
}

impl<T> IndexMut<MetricKey> for MetricMap<T> {
    fn index_mut(&mut self, key: MetricKey) -> &mut T {
        &mut self.0[key as usize]
    }
}

impl<T: Serialize> Serialize for MetricMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(MetricKey::COUNT))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key.as_ref(), value)?;
        }
        map.end()
    }
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<ValueRange>, v| match acc {
                None => Some(ValueRange { min: v, max: v }),
                Some(r) => Some(ValueRange {
                    min: r.min.min(v),
                    max: r.max.max(v),
                }),
            })
    }
}

/// Per-cycle computation context: user selections plus dataset-wide references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Context {
    pub armor: ArmorTier,
    pub zone: Zone,
    pub hit_weights: HitWeights,
    /// Max Range per category over the whole dataset.
    pub category_max_range: BTreeMap<String, f64>,
    /// Max Mag×DMG per category over the whole dataset.
    pub category_max_dpc: BTreeMap<String, f64>,
    /// Weight min/max over the whole dataset.
    pub weight_range: Option<ValueRange>,
    /// User weights rescaled to sum to 1.
    pub weights: ScoreWeights,
}

impl Context {
    /// Build from the full, unfiltered dataset so category maxima stay stable under search/filter.
    pub fn build(
        records: &[WeaponRecord],
        armor: ArmorTier,
        zone: Zone,
        weights: &ScoreWeights,
    ) -> Self {
        let mut category_max_range = BTreeMap::<String, f64>::new();
        let mut category_max_dpc = BTreeMap::<String, f64>::new();
        for r in records {
            if let Some(range) = r.range.filter(|v| v.is_finite() && *v > 0.0) {
                let e = category_max_range.entry(r.category.clone()).or_insert(0.0);
                *e = e.max(range);
            }
            if let Some(dpc) = damage_per_cycle(r) {
                let e = category_max_dpc.entry(r.category.clone()).or_insert(0.0);
                *e = e.max(dpc);
            }
        }
        let weight_range = ValueRange::of(records.iter().filter_map(|r| r.weight));
        Self {
            armor,
            zone,
            hit_weights: OVERALL_HIT_WEIGHTS,
            category_max_range,
            category_max_dpc,
            weight_range,
            weights: weights.normalized(),
        }
    }

    /// TTK for the selected zone and armor.
    pub fn ttk(&self, r: &WeaponRecord) -> Option<f64> {
        resolve_ttk(r, self.zone, self.armor, &self.hit_weights)
    }

    /// STK for the selected zone and armor.
    pub fn stk(&self, r: &WeaponRecord) -> Option<f64> {
        resolve_stk(r, self.zone, self.armor, &self.hit_weights)
    }

    /// Overall-zone TTK for the selected armor.
    pub fn overall_ttk(&self, r: &WeaponRecord) -> Option<f64> {
        resolve_ttk(r, Zone::Overall, self.armor, &self.hit_weights)
    }
}

/// Raw metrics for one weapon in one context, plus companion values that are not ranked.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawMetrics {
    pub values: MetricValues,
    pub breakpoint: ArmorBreakpoint,
    /// Weight normalized against the dataset weight range.
    pub weight_factor: Option<f64>,
    /// Mag×DMG relative to the category maximum.
    pub damage_per_cycle_base: Option<f64>,
    /// True when a magazine holds at most one kill.
    pub reloads_every_kill: bool,
}

impl RawMetrics {
    pub fn compute(record: &WeaponRecord, ctx: &Context) -> Self {
        let mut values = MetricValues::default();
        for d in REGISTRY.iter() {
            values[d.key] = (d.raw)(record, ctx).filter(|v| v.is_finite());
        }
        let damage_per_cycle_base = values[MetricKey::DamagePerCycle].and_then(|dpc| {
            let max = *ctx.category_max_dpc.get(&record.category)?;
            (max > 0.0).then(|| crate::util::clamp(dpc / max, 0.0, 1.0))
        });
        Self {
            reloads_every_kill: values[MetricKey::KillsPerMag].is_some_and(|k| k <= 1.0),
            values,
            breakpoint: armor_breakpoint(record),
            weight_factor: weight_factor(record, ctx),
            damage_per_cycle_base,
        }
    }

    pub fn get(&self, key: MetricKey) -> Option<f64> {
        self.values[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_in_key_order() {
        for (i, key) in MetricKey::iter().enumerate() {
            assert_eq!(REGISTRY[i].key, key);
            assert_eq!(key.descriptor().key, key);
        }
    }

    #[test]
    fn lower_is_better_set() {
        let lower: Vec<MetricKey> = REGISTRY
            .iter()
            .filter(|d| d.direction == Direction::LowerIsBetter)
            .map(|d| d.key)
            .collect();
        for k in [
            MetricKey::Ttk,
            MetricKey::ReloadPenalty,
            MetricKey::ArmorBreak,
            MetricKey::Volatility,
            MetricKey::ExposureTime,
            MetricKey::MobilityCost,
            MetricKey::HeadDep,
            MetricKey::ArmorPen,
        ] {
            assert!(lower.contains(&k), "{:?} should be lower-is-better", k);
        }
        assert_eq!(MetricKey::Sustain.descriptor().direction, Direction::HigherIsBetter);
    }

    #[test]
    fn metric_map_serializes_all_keys() {
        let mut m = MetricValues::default();
        m[MetricKey::Ttk] = Some(0.5);
        let json = serde_json::to_value(m).unwrap();
        assert_eq!(json["TTK"], serde_json::json!(0.5));
        assert!(json["Sustain"].is_null());
        assert_eq!(json.as_object().unwrap().len(), MetricKey::COUNT);
    }

    #[test]
    fn context_maxima_per_category() {
        let mut a = WeaponRecord::new("A", "AR");
        a.range = Some(40.0);
        a.mag = Some(30.0);
        a.damage = Some(10.0);
        a.weight = Some(8.0);
        let mut b = WeaponRecord::new("B", "AR");
        b.range = Some(55.0);
        b.weight = Some(3.0);
        let ctx = Context::build(&[a, b], ArmorTier::Heavy, Zone::Body, &ScoreWeights::default());
        assert_eq!(ctx.category_max_range.get("AR"), Some(&55.0));
        assert_eq!(ctx.category_max_dpc.get("AR"), Some(&300.0));
        assert_eq!(ctx.weight_range, Some(ValueRange { min: 3.0, max: 8.0 }));
    }
}
