//! Domain constants, scoring weights and run configuration loading.

use crate::error::{BalanceError, BalanceResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum::{Display, EnumIter, EnumString};

/// Maximum size in bytes for a weapon table CSV.
pub const MAX_CSV_BYTES: usize = 16 * 1024 * 1024;

/// Maximum number of weapon rows accepted from one table (bound input size).
pub const MAX_RECORDS: usize = 100_000;

/// Z-score above which a weapon's score is flagged as a spike within its category.
pub const OUTLIER_Z_THRESHOLD: f64 = 1.5;

/// Share of a ranked group that counts as its top decile.
pub const TOP_DECILE: f64 = 0.1;

/// Headshot dependency above this percentile of the working set is flagged high.
pub const HEADSHOT_DEPENDENCY_PERCENTILE: f64 = 75.0;

/// A normalized metric missing for more than this share of weapons raises a warning.
pub const MISSING_METRIC_WARN_RATIO: f64 = 0.3;

/// Rows shown in the chart series.
pub const CHART_TOP_N: usize = 15;

/// Fixed hit distribution used to build the synthetic "Overall" zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HitWeights {
    pub head: f64,
    pub body: f64,
    pub leg: f64,
}

pub const OVERALL_HIT_WEIGHTS: HitWeights = HitWeights {
    head: 0.20,
    body: 0.70,
    leg: 0.10,
};

/// Named engagement distance band in meters; `max` is infinite for the last band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceBand {
    pub key: &'static str,
    pub min: f64,
    pub max: f64,
}

pub const DISTANCE_BANDS: [DistanceBand; 4] = [
    DistanceBand {
        key: "CQC",
        min: 0.0,
        max: 10.0,
    },
    DistanceBand {
        key: "Close",
        min: 10.0,
        max: 25.0,
    },
    DistanceBand {
        key: "Mid",
        min: 25.0,
        max: 40.0,
    },
    DistanceBand {
        key: "Long",
        min: 40.0,
        max: f64::INFINITY,
    },
];

/// User weights for the six scored dimensions. Raw slider values; see [`ScoreWeights::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default)]
    pub ttk: f64,
    #[serde(default)]
    pub sustain: f64,
    #[serde(default)]
    pub handling: f64,
    #[serde(default)]
    pub range: f64,
    #[serde(default)]
    pub reload: f64,
    #[serde(default)]
    pub armor: f64,
}

impl ScoreWeights {
    pub const NAMES: [&'static str; 6] = ["ttk", "sustain", "handling", "range", "reload", "armor"];

    pub fn new(ttk: f64, sustain: f64, handling: f64, range: f64, reload: f64, armor: f64) -> Self {
        Self {
            ttk,
            sustain,
            handling,
            range,
            reload,
            armor,
        }
    }

    pub fn as_array(&self) -> [f64; 6] {
        [
            self.ttk,
            self.sustain,
            self.handling,
            self.range,
            self.reload,
            self.armor,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Set one weight by name. Unknown names are ignored and return false.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        let slot = match name {
            "ttk" => &mut self.ttk,
            "sustain" => &mut self.sustain,
            "handling" => &mut self.handling,
            "range" => &mut self.range,
            "reload" => &mut self.reload,
            "armor" => &mut self.armor,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Reject negative or non-finite entries.
    pub fn validate(&self) -> BalanceResult<()> {
        for (name, value) in Self::NAMES.iter().zip(self.as_array()) {
            if !value.is_finite() || value < 0.0 {
                return Err(BalanceError::InvalidWeight {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Rescale so the weights sum to 1. All-zero weights stay all-zero.
    ///
    /// Divides by the largest weight first so sums of huge weights cannot overflow.
    pub fn normalized(&self) -> Self {
        let largest = self.as_array().into_iter().fold(0.0, f64::max);
        if largest <= 0.0 || !largest.is_finite() {
            return Self::default();
        }
        let scaled = self.as_array().map(|w| w / largest);
        let sum: f64 = scaled.iter().sum();
        let [ttk, sustain, handling, range, reload, armor] = scaled.map(|w| w / sum);
        Self::new(ttk, sustain, handling, range, reload, armor)
    }

    pub fn is_zero(&self) -> bool {
        self.as_array().iter().all(|w| *w <= 0.0)
    }
}

/// Built-in weight presets. `Custom` marks weights edited away from a preset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Preset {
    #[strum(to_string = "META")]
    #[serde(rename = "META")]
    Meta,
    #[strum(to_string = "CQC")]
    #[serde(rename = "CQC")]
    Cqc,
    #[strum(to_string = "MID")]
    #[serde(rename = "MID")]
    Mid,
    #[strum(to_string = "LONG")]
    #[serde(rename = "LONG")]
    Long,
    #[strum(to_string = "CUSTOM")]
    #[serde(rename = "CUSTOM")]
    Custom,
}

impl Preset {
    /// Preset weights; `Custom` falls back to META as a starting point.
    pub fn weights(self) -> ScoreWeights {
        match self {
            Preset::Meta | Preset::Custom => ScoreWeights::new(30.0, 20.0, 15.0, 15.0, 10.0, 10.0),
            Preset::Cqc => ScoreWeights::new(35.0, 10.0, 25.0, 5.0, 20.0, 5.0),
            Preset::Mid => ScoreWeights::new(25.0, 20.0, 15.0, 25.0, 10.0, 5.0),
            Preset::Long => ScoreWeights::new(15.0, 5.0, 15.0, 35.0, 10.0, 20.0),
        }
    }
}

/// Optional run settings from a TOML file. Every field may be overridden on the command line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunConfig {
    /// Weapon table CSV.
    pub data: Option<PathBuf>,
    /// Output directory for JSON and HTML reports.
    pub out_dir: Option<PathBuf>,
    pub armor: Option<String>,
    pub zone: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub chart_metric: Option<String>,
    pub preset: Option<String>,
    pub sort: Option<String>,
    pub sort_dir: Option<String>,
    /// Custom weights; replaces the preset, missing entries count as zero.
    pub weights: Option<ScoreWeights>,
}

impl RunConfig {
    pub fn load(path: &Path) -> BalanceResult<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> BalanceResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Control mapping in the form `Controls::from_pairs` consumes.
    pub fn control_pairs(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        let mut push = |key: &str, v: &Option<String>| {
            if let Some(v) = v {
                out.push((key.to_string(), v.clone()));
            }
        };
        push("armor", &self.armor);
        push("zone", &self.zone);
        push("category", &self.category);
        push("search", &self.search);
        push("chartMetric", &self.chart_metric);
        push("preset", &self.preset);
        if let Some(w) = &self.weights {
            for (name, value) in ScoreWeights::NAMES.iter().zip(w.as_array()) {
                out.push((format!("w_{}", name), value.to_string()));
            }
        }
        out
    }
}

/// Load a bare `[weights]`-style TOML file (six keys at the top level).
pub fn load_weights_file(path: &Path) -> BalanceResult<ScoreWeights> {
    let s = std::fs::read_to_string(path)?;
    let w: ScoreWeights = toml::from_str(&s)?;
    w.validate()?;
    Ok(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn normalized_weights_sum_to_one() {
        let w = Preset::Meta.weights().normalized();
        assert!((w.sum() - 1.0).abs() < 1e-12);
        assert!((w.ttk - 0.30).abs() < 1e-12);
    }

    #[test]
    fn huge_weights_still_sum_to_one() {
        let mut w = ScoreWeights::default();
        w.set("ttk", 1e308);
        w.set("sustain", 1e308);
        assert!(w.validate().is_ok());
        assert!(!w.is_zero());
        let n = w.normalized();
        assert!((n.sum() - 1.0).abs() < 1e-12);
        assert!((n.ttk - 0.5).abs() < 1e-12);
        assert_eq!(n.range, 0.0);
    }

    #[test]
    fn zero_weights_stay_zero() {
        let w = ScoreWeights::default().normalized();
        assert!(w.is_zero());
    }

    #[test]
    fn negative_weight_rejected() {
        let mut w = Preset::Cqc.weights();
        w.set("range", -1.0);
        assert!(w.validate().is_err());
    }

    #[test]
    fn preset_parses_case_insensitive() {
        assert_eq!(Preset::from_str("long").unwrap(), Preset::Long);
        assert_eq!(Preset::from_str("META").unwrap(), Preset::Meta);
        assert!(Preset::from_str("SNIPER").is_err());
    }

    #[test]
    fn run_config_from_toml() {
        let cfg = RunConfig::from_toml(
            r#"
armor = "M"
zone = "Body"
preset = "CQC"

[weights]
ttk = 10
armor = 5
"#,
        )
        .unwrap();
        assert_eq!(cfg.armor.as_deref(), Some("M"));
        let w = cfg.weights.unwrap();
        assert_eq!(w.ttk, 10.0);
        assert_eq!(w.sustain, 0.0);
        let pairs = cfg.control_pairs();
        assert!(pairs.contains(&("w_armor".to_string(), "5".to_string())));
        assert!(pairs.contains(&("zone".to_string(), "Body".to_string())));
    }
}
