//! Zone/armor resolution of time-to-kill and shots-to-kill.
//! A physical zone reads its cell directly; "Overall" blends Head/Body/Leg by the fixed
//! hit weights.

use super::{ArmorTier, WeaponRecord, Zone, ZoneTable};
use crate::config::HitWeights;
use crate::util::{finite, weighted_average};

/// Resolved TTK in seconds for `zone` against `tier`, or `None` when no component is present.
pub fn resolve_ttk(
    record: &WeaponRecord,
    zone: Zone,
    tier: ArmorTier,
    hit_weights: &HitWeights,
) -> Option<f64> {
    resolve(&record.ttk, zone, tier, hit_weights)
}

/// Resolved STK for `zone` against `tier`. "Overall" may be fractional.
pub fn resolve_stk(
    record: &WeaponRecord,
    zone: Zone,
    tier: ArmorTier,
    hit_weights: &HitWeights,
) -> Option<f64> {
    resolve(&record.stk, zone, tier, hit_weights)
}

fn resolve(table: &ZoneTable, zone: Zone, tier: ArmorTier, hw: &HitWeights) -> Option<f64> {
    if zone != Zone::Overall {
        return finite(table.get(zone, tier));
    }
    weighted_average(&[
        (hw.head, table.get(Zone::Head, tier)),
        (hw.body, table.get(Zone::Body, tier)),
        (hw.leg, table.get(Zone::Leg, tier)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OVERALL_HIT_WEIGHTS;

    fn smg() -> WeaponRecord {
        WeaponRecord::new("Stitcher", "SMG")
            .with_ttk(Zone::Head, ArmorTier::Heavy, 0.6)
            .with_ttk(Zone::Body, ArmorTier::Heavy, 0.9)
            .with_ttk(Zone::Leg, ArmorTier::Heavy, 1.2)
            .with_stk(Zone::Head, ArmorTier::Heavy, 3.0)
            .with_stk(Zone::Body, ArmorTier::Heavy, 5.0)
            .with_stk(Zone::Leg, ArmorTier::Heavy, 7.0)
    }

    #[test]
    fn overall_is_hit_weighted() {
        let w = smg();
        let ttk = resolve_ttk(&w, Zone::Overall, ArmorTier::Heavy, &OVERALL_HIT_WEIGHTS).unwrap();
        assert!((ttk - 0.87).abs() < 1e-9);
        let stk = resolve_stk(&w, Zone::Overall, ArmorTier::Heavy, &OVERALL_HIT_WEIGHTS).unwrap();
        assert!((stk - 4.8).abs() < 1e-9);
    }

    #[test]
    fn direct_zone_reads_cell() {
        let w = smg();
        assert_eq!(
            resolve_ttk(&w, Zone::Leg, ArmorTier::Heavy, &OVERALL_HIT_WEIGHTS),
            Some(1.2)
        );
        assert_eq!(
            resolve_ttk(&w, Zone::Leg, ArmorTier::Light, &OVERALL_HIT_WEIGHTS),
            None
        );
    }

    #[test]
    fn overall_uses_present_components_only() {
        let w = WeaponRecord::new("Half", "AR").with_ttk(Zone::Body, ArmorTier::Medium, 1.5);
        let ttk = resolve_ttk(&w, Zone::Overall, ArmorTier::Medium, &OVERALL_HIT_WEIGHTS);
        assert_eq!(ttk, Some(1.5));
        assert_eq!(
            resolve_ttk(&w, Zone::Overall, ArmorTier::Heavy, &OVERALL_HIT_WEIGHTS),
            None
        );
    }
}
