//! Row ordering: sort keys, direction toggling, null-last comparison.

use super::ScoredWeapon;
use crate::metrics::MetricKey;
use serde::Serialize;
use std::cmp::Ordering;
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display, Serialize,
)]
#[strum(ascii_case_insensitive)]
pub enum SortKey {
    Name,
    Score,
    RoleDom,
    OutlierIndex,
    CounterScore,
    #[strum(to_string = "TTK")]
    Ttk,
    #[strum(to_string = "STK")]
    Stk,
    #[strum(to_string = "DPS")]
    Dps,
    DamagePerCycle,
    Sustain,
    Engage,
    Reload,
    Handling,
    Range,
    HeadDep,
    CritLeverage,
    Armor,
    ArmorPen,
    #[strum(to_string = "ArmorBP")]
    ArmorBp,
    SkillCeiling,
    SkillFloor,
    Consistency,
    Vol,
    Exposure,
    Mobility,
}

impl SortKey {
    /// Numeric sort value; `None` sorts last. `Name` has no numeric value.
    pub fn value(self, row: &ScoredWeapon) -> Option<f64> {
        let raw = |k: MetricKey| row.raw.get(k);
        match self {
            SortKey::Name => None,
            SortKey::Score => row.score01,
            SortKey::RoleDom => row.role_dominance_index,
            SortKey::OutlierIndex => row.outlier_index,
            SortKey::CounterScore => row.counter_score01,
            SortKey::Ttk => raw(MetricKey::Ttk),
            SortKey::Stk => raw(MetricKey::Stk),
            SortKey::Dps => row.record.listed_dps,
            SortKey::DamagePerCycle => raw(MetricKey::DamagePerCycle),
            SortKey::Sustain => raw(MetricKey::Sustain),
            SortKey::Engage => raw(MetricKey::KillsPerMag),
            SortKey::Reload => row.record.reload,
            SortKey::Handling => raw(MetricKey::Handling),
            SortKey::Range => row.record.range,
            SortKey::HeadDep => raw(MetricKey::HeadDep),
            SortKey::CritLeverage => raw(MetricKey::CritLeverage),
            SortKey::Armor => raw(MetricKey::ArmorCons),
            SortKey::ArmorPen => raw(MetricKey::ArmorPen),
            SortKey::ArmorBp => raw(MetricKey::ArmorBreak),
            SortKey::SkillCeiling => row.skill_ceiling,
            SortKey::SkillFloor => row.skill_floor,
            SortKey::Consistency => row.normalized.consistency,
            SortKey::Vol => raw(MetricKey::Volatility),
            SortKey::Exposure => raw(MetricKey::ExposureTime),
            SortKey::Mobility => raw(MetricKey::MobilityCost),
        }
        .filter(|v| v.is_finite())
    }

    /// Direction a freshly selected key starts in.
    pub fn initial_dir(self) -> SortDir {
        if self == SortKey::Name {
            SortDir::Asc
        } else {
            SortDir::Desc
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, Serialize)]
#[strum(ascii_case_insensitive)]
pub enum SortDir {
    #[strum(to_string = "asc")]
    Asc,
    #[strum(to_string = "desc")]
    Desc,
}

impl SortDir {
    pub fn flipped(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub dir: SortDir,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::Score,
            dir: SortDir::Desc,
        }
    }
}

impl SortSpec {
    pub fn new(key: SortKey, dir: SortDir) -> Self {
        Self { key, dir }
    }

    /// Header click: same key flips direction, a new key starts in its initial direction.
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            Self::new(key, self.dir.flipped())
        } else {
            Self::new(key, key.initial_dir())
        }
    }

    /// Nulls go last in both directions.
    pub fn compare(&self, a: &ScoredWeapon, b: &ScoredWeapon) -> Ordering {
        if self.key == SortKey::Name {
            let ord = a
                .record
                .name
                .to_lowercase()
                .cmp(&b.record.name.to_lowercase());
            return match self.dir {
                SortDir::Asc => ord,
                SortDir::Desc => ord.reverse(),
            };
        }
        match (self.key.value(a), self.key.value(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => match self.dir {
                SortDir::Asc => x.total_cmp(&y),
                SortDir::Desc => y.total_cmp(&x),
            },
        }
    }

    /// Stable sort in place.
    pub fn sort(&self, rows: &mut [ScoredWeapon]) {
        rows.sort_by(|a, b| self.compare(a, b));
    }
}
