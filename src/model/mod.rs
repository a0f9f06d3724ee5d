//! Weapon model: input record, hit zones, armor tiers, zone/armor TTK and STK tables.

mod load;
mod resolve;

pub use load::{
    load_weapons_csv, load_weapons_from_reader, parse_zone_column, LoadedDataset, ZoneColumn,
};
pub use resolve::{resolve_stk, resolve_ttk};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Body region struck, or the synthetic weighted "Overall" composite.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumString,
    Display,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Zone {
    Head,
    Body,
    Leg,
    Overall,
}

impl Zone {
    /// The three physical zones that carry table columns.
    pub const HITS: [Zone; 3] = [Zone::Head, Zone::Body, Zone::Leg];

    /// Row in a [`ZoneTable`]; `None` for `Overall`.
    pub fn hit_index(self) -> Option<usize> {
        match self {
            Zone::Head => Some(0),
            Zone::Body => Some(1),
            Zone::Leg => Some(2),
            Zone::Overall => None,
        }
    }
}

/// Opponent armor level: unarmored (0), Light, Medium, Heavy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumString,
    Display,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum ArmorTier {
    #[strum(to_string = "0")]
    #[serde(rename = "0")]
    Unarmored,
    #[strum(to_string = "L")]
    #[serde(rename = "L")]
    Light,
    #[strum(to_string = "M")]
    #[serde(rename = "M")]
    Medium,
    #[strum(to_string = "H")]
    #[serde(rename = "H")]
    Heavy,
}

impl ArmorTier {
    pub const ALL: [ArmorTier; 4] = [
        ArmorTier::Unarmored,
        ArmorTier::Light,
        ArmorTier::Medium,
        ArmorTier::Heavy,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Values keyed by (hit zone, armor tier): rows Head/Body/Leg, columns 0/L/M/H.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneTable([[Option<f64>; 4]; 3]);

impl ZoneTable {
    /// Direct cell lookup. `Overall` has no cell of its own; see [`resolve_ttk`].
    pub fn get(&self, zone: Zone, tier: ArmorTier) -> Option<f64> {
        let row = zone.hit_index()?;
        self.0[row][tier.index()]
    }

    pub fn set(&mut self, zone: Zone, tier: ArmorTier, value: Option<f64>) {
        if let Some(row) = zone.hit_index() {
            self.0[row][tier.index()] = value;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().flatten().all(Option::is_none)
    }
}

/// One row of the weapon table. Immutable once loaded; the pipeline only derives copies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeaponRecord {
    /// Unique display key.
    pub name: String,
    /// Grouping key for per-category normalization.
    pub category: String,
    /// Per-shot damage.
    pub damage: Option<f64>,
    /// Magazine capacity.
    pub mag: Option<f64>,
    /// Reload time in seconds.
    pub reload: Option<f64>,
    /// Effective range in meters.
    pub range: Option<f64>,
    pub stability: Option<f64>,
    pub agility: Option<f64>,
    pub stealth: Option<f64>,
    pub weight: Option<f64>,
    pub sell: Option<f64>,
    pub crit_multi: Option<f64>,
    /// DPS figure as listed in the source table; display only.
    pub listed_dps: Option<f64>,
    pub firing_mode: Option<String>,
    /// Armor penetration label from the source table; distinct from computed penetration metrics.
    pub armor_pen_label: Option<String>,
    pub rarity: Option<String>,
    pub notes: Option<String>,
    pub ttk: ZoneTable,
    pub stk: ZoneTable,
}

impl WeaponRecord {
    pub fn new(name: &str, category: &str) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            ..Default::default()
        }
    }

    pub fn with_ttk(mut self, zone: Zone, tier: ArmorTier, seconds: f64) -> Self {
        self.ttk.set(zone, tier, Some(seconds));
        self
    }

    pub fn with_stk(mut self, zone: Zone, tier: ArmorTier, shots: f64) -> Self {
        self.stk.set(zone, tier, Some(shots));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn armor_tier_codes() {
        assert_eq!(ArmorTier::from_str("0").unwrap(), ArmorTier::Unarmored);
        assert_eq!(ArmorTier::from_str("h").unwrap(), ArmorTier::Heavy);
        assert_eq!(ArmorTier::Medium.to_string(), "M");
        assert!(ArmorTier::from_str("X").is_err());
    }

    #[test]
    fn zone_parse_and_index() {
        assert_eq!(Zone::from_str("overall").unwrap(), Zone::Overall);
        assert_eq!(Zone::Overall.hit_index(), None);
        assert_eq!(Zone::Leg.hit_index(), Some(2));
        assert!(Zone::from_str("Torso").is_err());
    }

    #[test]
    fn zone_table_cells() {
        let mut t = ZoneTable::default();
        assert!(t.is_empty());
        t.set(Zone::Body, ArmorTier::Light, Some(1.25));
        t.set(Zone::Overall, ArmorTier::Light, Some(9.0));
        assert_eq!(t.get(Zone::Body, ArmorTier::Light), Some(1.25));
        assert_eq!(t.get(Zone::Head, ArmorTier::Light), None);
        assert_eq!(t.get(Zone::Overall, ArmorTier::Light), None);
        assert!(!t.is_empty());
    }
}
