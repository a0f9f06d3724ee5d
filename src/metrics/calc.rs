//! Per-weapon raw metric calculators.
//!
//! Each returns `None` when a required input is missing or outside its domain
//! (non-positive time, zero denominator, STK ≤ 1 where a fire rate is inferred).
//! `None` propagates; nothing defaults to zero except the handling index.

use super::Context;
use crate::config::HitWeights;
use crate::model::{resolve_ttk, ArmorTier, WeaponRecord, Zone};
use crate::util::{clamp, finite, normalize, positive, stddev};
use serde::Serialize;

/// Sustained DPS over full magazine cycles for the selected zone/armor.
pub fn sustained_dps(r: &WeaponRecord, ctx: &Context) -> Option<f64> {
    sustained_dps_from(r.damage, r.mag, r.reload, ctx.ttk(r), ctx.stk(r))
}

/// Fire rate is inferred as (STK−1)/TTK, so at least two shots per kill are required.
pub fn sustained_dps_from(
    damage: Option<f64>,
    mag: Option<f64>,
    reload: Option<f64>,
    ttk: Option<f64>,
    stk: Option<f64>,
) -> Option<f64> {
    let damage = positive(damage)?;
    let mag = positive(mag)?;
    let reload = finite(reload).filter(|v| *v >= 0.0)?;
    let ttk = positive(ttk)?;
    let stk = finite(stk).filter(|v| *v > 1.0)?;
    let shots_per_sec = (stk - 1.0) / ttk;
    let time_firing = (mag - 1.0) / shots_per_sec;
    if !time_firing.is_finite() || time_firing < 0.0 {
        return None;
    }
    let cycle = time_firing + reload;
    if cycle <= 0.0 {
        return None;
    }
    Some(mag * damage / cycle)
}

/// Stability×0.4 + Agility×0.4 + Stealth×0.2.
/// Missing sub-scores count as 0 here, unlike every other metric: a weapon
/// lacking one handling stat is still ranked on the others.
pub fn handling_index(r: &WeaponRecord) -> f64 {
    let stab = finite(r.stability).unwrap_or(0.0);
    let agil = finite(r.agility).unwrap_or(0.0);
    let stlh = finite(r.stealth).unwrap_or(0.0);
    stab * 0.4 + agil * 0.4 + stlh * 0.2
}

/// 1 − (TTK_H − TTK_0) / TTK_0, clamped to [0,1].
pub fn armor_consistency(r: &WeaponRecord, zone: Zone, hw: &HitWeights) -> Option<f64> {
    let ttk0 = positive(resolve_ttk(r, zone, ArmorTier::Unarmored, hw))?;
    let ttk_h = positive(resolve_ttk(r, zone, ArmorTier::Heavy, hw))?;
    Some(clamp(1.0 - (ttk_h - ttk0) / ttk0, 0.0, 1.0))
}

/// Sample stddev of TTK across the four armor tiers; needs two valid tiers.
pub fn ttk_volatility(r: &WeaponRecord, zone: Zone, hw: &HitWeights) -> Option<f64> {
    let values: Vec<f64> = ArmorTier::ALL
        .iter()
        .filter_map(|t| finite(resolve_ttk(r, zone, *t, hw)))
        .collect();
    stddev(&values)
}

/// Body-zone armored/unarmored TTK ratios.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ArmorBreakpoint {
    pub delta_l: Option<f64>,
    pub delta_m: Option<f64>,
    pub delta_h: Option<f64>,
    pub avg: Option<f64>,
}

/// All-or-nothing: every ratio is `None` unless Body TTK is valid for all four tiers.
pub fn armor_breakpoint(r: &WeaponRecord) -> ArmorBreakpoint {
    let body = |t| positive(r.ttk.get(Zone::Body, t));
    let (Some(t0), Some(tl), Some(tm), Some(th)) = (
        body(ArmorTier::Unarmored),
        body(ArmorTier::Light),
        body(ArmorTier::Medium),
        body(ArmorTier::Heavy),
    ) else {
        return ArmorBreakpoint::default();
    };
    let (dl, dm, dh) = (tl / t0, tm / t0, th / t0);
    ArmorBreakpoint {
        delta_l: Some(dl),
        delta_m: Some(dm),
        delta_h: Some(dh),
        avg: Some((dl + dm + dh) / 3.0),
    }
}

/// Heavy-vs-medium TTK gap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ArmorPenDelta {
    pub seconds: Option<f64>,
    pub ratio: Option<f64>,
}

pub fn armor_pen_delta(r: &WeaponRecord, zone: Zone, hw: &HitWeights) -> ArmorPenDelta {
    let ttk_m = positive(resolve_ttk(r, zone, ArmorTier::Medium, hw));
    let ttk_h = positive(resolve_ttk(r, zone, ArmorTier::Heavy, hw));
    match (ttk_m, ttk_h) {
        (Some(m), Some(h)) => ArmorPenDelta {
            seconds: Some(h - m),
            ratio: Some((h - m) / m),
        },
        _ => ArmorPenDelta::default(),
    }
}

/// Body TTK / Head TTK at the given armor tier.
pub fn headshot_dependency(r: &WeaponRecord, armor: ArmorTier) -> Option<f64> {
    let body = positive(r.ttk.get(Zone::Body, armor))?;
    let head = positive(r.ttk.get(Zone::Head, armor))?;
    Some(body / head)
}

/// (Body TTK − Head TTK) × crit multiplier.
pub fn crit_leverage(r: &WeaponRecord, armor: ArmorTier) -> Option<f64> {
    let body = positive(r.ttk.get(Zone::Body, armor))?;
    let head = positive(r.ttk.get(Zone::Head, armor))?;
    let crit = positive(r.crit_multi)?;
    Some((body - head) * crit)
}

/// Mag × DMG.
pub fn damage_per_cycle(r: &WeaponRecord) -> Option<f64> {
    Some(positive(r.mag)? * positive(r.damage)?)
}

/// Weight normalized against the dataset weight range.
pub fn weight_factor(r: &WeaponRecord, ctx: &Context) -> Option<f64> {
    let range = ctx.weight_range?;
    normalize(r.weight, range.min, range.max)
}

/// Overall TTK × (1 + normalized weight).
pub fn exposure_time(r: &WeaponRecord, ctx: &Context) -> Option<f64> {
    let ttk = positive(ctx.overall_ttk(r))?;
    let factor = weight_factor(r, ctx)?;
    Some(ttk * (1.0 + factor))
}

/// (Weight / Agility) × Overall TTK.
pub fn mobility_cost(r: &WeaponRecord, ctx: &Context) -> Option<f64> {
    let weight = finite(r.weight).filter(|v| *v >= 0.0)?;
    let agility = positive(r.agility)?;
    let ttk = positive(ctx.overall_ttk(r))?;
    Some(weight / agility * ttk)
}

/// floor(Mag / STK) for the selected zone/armor.
pub fn kills_per_mag(r: &WeaponRecord, ctx: &Context) -> Option<f64> {
    let mag = positive(r.mag)?;
    let stk = positive(ctx.stk(r))?;
    Some((mag / stk).floor())
}

/// Reload / (Reload + TTK): share of an engagement cycle spent reloading.
pub fn reload_tax(reload: Option<f64>, ttk: Option<f64>) -> Option<f64> {
    let reload = finite(reload).filter(|v| *v >= 0.0)?;
    let ttk = finite(ttk).filter(|v| *v >= 0.0)?;
    let denom = reload + ttk;
    if denom <= 0.0 {
        return None;
    }
    Some(reload / denom)
}

/// Range relative to the category's longest range across the whole dataset.
pub fn range_score(r: &WeaponRecord, ctx: &Context) -> Option<f64> {
    let range = positive(r.range)?;
    let max = positive(ctx.category_max_range.get(&r.category).copied())?;
    Some(clamp(range / max, 0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScoreWeights, OVERALL_HIT_WEIGHTS};

    fn body_tiers(t0: f64, tl: f64, tm: f64, th: f64) -> WeaponRecord {
        WeaponRecord::new("Ferro", "Rifle")
            .with_ttk(Zone::Body, ArmorTier::Unarmored, t0)
            .with_ttk(Zone::Body, ArmorTier::Light, tl)
            .with_ttk(Zone::Body, ArmorTier::Medium, tm)
            .with_ttk(Zone::Body, ArmorTier::Heavy, th)
    }

    #[test]
    fn sustained_dps_basic() {
        // 4 shots in 0.6s -> 5 shots/s; 29 more shots take 5.8s; + 2s reload.
        let d =
            sustained_dps_from(Some(50.0), Some(30.0), Some(2.0), Some(0.6), Some(4.0)).unwrap();
        assert!((d - 1500.0 / 7.8).abs() < 1e-9);
    }

    #[test]
    fn sustained_dps_needs_two_shots() {
        assert_eq!(
            sustained_dps_from(Some(50.0), Some(30.0), Some(2.0), Some(0.2), Some(1.0)),
            None
        );
    }

    #[test]
    fn sustained_dps_allows_zero_reload() {
        assert!(
            sustained_dps_from(Some(10.0), Some(5.0), Some(0.0), Some(1.0), Some(3.0)).is_some()
        );
        assert_eq!(
            sustained_dps_from(Some(10.0), Some(5.0), Some(-1.0), Some(1.0), Some(3.0)),
            None
        );
    }

    #[test]
    fn handling_defaults_missing_to_zero() {
        let mut w = WeaponRecord::new("H", "SMG");
        w.stability = Some(60.0);
        w.agility = Some(70.0);
        w.stealth = Some(40.0);
        assert!((handling_index(&w) - 60.0).abs() < 1e-9);
        w.stealth = None;
        assert!((handling_index(&w) - 52.0).abs() < 1e-9);
    }

    #[test]
    fn armor_consistency_clamps_to_zero() {
        let w = body_tiers(1.0, 1.2, 1.5, 2.0);
        assert_eq!(armor_consistency(&w, Zone::Body, &OVERALL_HIT_WEIGHTS), Some(0.0));
        let w = body_tiers(1.0, 1.0, 1.1, 1.25);
        let c = armor_consistency(&w, Zone::Body, &OVERALL_HIT_WEIGHTS).unwrap();
        assert!((c - 0.75).abs() < 1e-9);
    }

    #[test]
    fn volatility_needs_two_tiers() {
        let w = WeaponRecord::new("V", "AR").with_ttk(Zone::Body, ArmorTier::Heavy, 1.0);
        assert_eq!(ttk_volatility(&w, Zone::Body, &OVERALL_HIT_WEIGHTS), None);
        let w = w.with_ttk(Zone::Body, ArmorTier::Light, 2.0);
        let v = ttk_volatility(&w, Zone::Body, &OVERALL_HIT_WEIGHTS).unwrap();
        assert!((v - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn breakpoint_all_or_nothing() {
        let bp = armor_breakpoint(&body_tiers(1.0, 1.2, 1.5, 2.1));
        assert!((bp.avg.unwrap() - 1.6).abs() < 1e-9);
        assert!((bp.delta_h.unwrap() - 2.1).abs() < 1e-9);
        let partial = WeaponRecord::new("P", "AR")
            .with_ttk(Zone::Body, ArmorTier::Unarmored, 1.0)
            .with_ttk(Zone::Body, ArmorTier::Heavy, 2.0);
        assert_eq!(armor_breakpoint(&partial), ArmorBreakpoint::default());
    }

    #[test]
    fn armor_pen_seconds_and_ratio() {
        let pen = armor_pen_delta(
            &body_tiers(1.0, 1.2, 1.6, 2.0),
            Zone::Body,
            &OVERALL_HIT_WEIGHTS,
        );
        assert!((pen.seconds.unwrap() - 0.4).abs() < 1e-9);
        assert!((pen.ratio.unwrap() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn headshot_and_crit() {
        let mut w = WeaponRecord::new("C", "Sniper")
            .with_ttk(Zone::Head, ArmorTier::Medium, 0.5)
            .with_ttk(Zone::Body, ArmorTier::Medium, 1.5);
        assert_eq!(headshot_dependency(&w, ArmorTier::Medium), Some(3.0));
        assert_eq!(crit_leverage(&w, ArmorTier::Medium), None);
        w.crit_multi = Some(2.0);
        assert_eq!(crit_leverage(&w, ArmorTier::Medium), Some(2.0));
        let w = w.with_ttk(Zone::Head, ArmorTier::Medium, 0.0);
        assert_eq!(headshot_dependency(&w, ArmorTier::Medium), None);
    }

    #[test]
    fn reload_tax_domain() {
        assert_eq!(reload_tax(Some(1.0), Some(3.0)), Some(0.25));
        assert_eq!(reload_tax(Some(0.0), Some(3.0)), Some(0.0));
        assert_eq!(reload_tax(Some(0.0), Some(0.0)), None);
        assert_eq!(reload_tax(Some(-1.0), Some(3.0)), None);
        assert_eq!(reload_tax(None, Some(3.0)), None);
    }

    #[test]
    fn kills_per_mag_floors_and_exposure_scales_with_weight() {
        let mut light = WeaponRecord::new("L", "SMG")
            .with_ttk(Zone::Body, ArmorTier::Heavy, 1.0)
            .with_stk(Zone::Body, ArmorTier::Heavy, 7.0);
        light.mag = Some(20.0);
        light.weight = Some(2.0);
        light.agility = Some(50.0);
        let mut heavy = light.clone();
        heavy.name = "Hv".to_string();
        heavy.weight = Some(10.0);
        let records = vec![light.clone(), heavy.clone()];
        let ctx = Context::build(&records, ArmorTier::Heavy, Zone::Body, &ScoreWeights::default());
        assert_eq!(kills_per_mag(&light, &ctx), Some(2.0));
        assert_eq!(exposure_time(&light, &ctx), Some(1.0));
        assert_eq!(exposure_time(&heavy, &ctx), Some(2.0));
        assert!((mobility_cost(&heavy, &ctx).unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn range_score_against_category_max() {
        let mut a = WeaponRecord::new("A", "AR");
        a.range = Some(30.0);
        let mut b = WeaponRecord::new("B", "AR");
        b.range = Some(60.0);
        let records = vec![a.clone(), b];
        let ctx = Context::build(&records, ArmorTier::Heavy, Zone::Body, &ScoreWeights::default());
        assert_eq!(range_score(&a, &ctx), Some(0.5));
        let mut stranger = WeaponRecord::new("S", "Launcher");
        stranger.range = Some(30.0);
        assert_eq!(range_score(&stranger, &ctx), None);
    }
}
