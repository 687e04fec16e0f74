//! Land cost + rest of the cost stack → margin, ratio and appreciation band.

use crate::config::defaults::EngineDefaults;
use crate::core::land_value::ResolvedLandValue;
use crate::core::revenue::RevenueCost;
use crate::domain::bilan::{
    AppreciationBand, BuildableEnvelopeResult, CostSection, FeasibilityBilan, LandValueDeltas,
    LandValueDetail, MarginSection, RevenueSection, ValueDelta,
};

// 門檻比較的浮點容忍
const BAND_EPSILON: f64 = 1e-9;

/// ratio ≥ T+0.05 → very comfortable; ≥ T → comfortable; ≥ T−0.03 → tight;
/// otherwise low. Offsets come from `EngineDefaults`.
pub fn appreciation_band(ratio: f64, target: f64, defaults: &EngineDefaults) -> AppreciationBand {
    let at_least = |threshold: f64| ratio + BAND_EPSILON >= threshold;

    if at_least(target + defaults.very_comfortable_offset) {
        AppreciationBand::VeryComfortable
    } else if at_least(target) {
        AppreciationBand::Comfortable
    } else if at_least(target - defaults.tight_offset) {
        AppreciationBand::Tight
    } else {
        AppreciationBand::Low
    }
}

/// `None` when total revenue is zero.
pub fn margin_ratio(margin_amount: f64, revenue_total: f64) -> Option<f64> {
    if revenue_total == 0.0 {
        None
    } else {
        Some(margin_amount / revenue_total)
    }
}

/// Delta against the residual value, with its share of the residual
/// (`None` when the residual is zero).
pub fn delta_vs_residual(value: f64, residual: f64) -> ValueDelta {
    let absolute = value - residual;
    ValueDelta {
        absolute,
        percent_of_residual: if residual == 0.0 {
            None
        } else {
            Some(absolute / residual * 100.0)
        },
    }
}

pub fn aggregate(
    envelope: &BuildableEnvelopeResult,
    revenue_cost: &RevenueCost,
    land: &ResolvedLandValue,
    declared: Option<f64>,
    residual: f64,
    target_margin_ratio: f64,
    defaults: &EngineDefaults,
) -> FeasibilityBilan {
    let land_cost = land.value;
    let cost_total = revenue_cost.cost_excluding_land + land_cost;
    let margin_amount = revenue_cost.revenue_total - cost_total;
    let ratio = margin_ratio(margin_amount, revenue_cost.revenue_total);

    let per_m2_floor_area = if envelope.total_floor_area_m2 > 0.0 {
        Some(land_cost / envelope.total_floor_area_m2)
    } else {
        None
    };

    FeasibilityBilan {
        revenue: RevenueSection {
            by_use: revenue_cost.revenue_by_use,
            total: revenue_cost.revenue_total,
        },
        costs: CostSection {
            construction_by_use: revenue_cost.construction_by_use,
            construction: revenue_cost.construction_total,
            fees: revenue_cost.fees,
            land: land_cost,
            excluding_land: revenue_cost.cost_excluding_land,
            total: cost_total,
        },
        margin: MarginSection {
            amount: margin_amount,
            ratio,
            band: ratio.map(|r| appreciation_band(r, target_margin_ratio, defaults)),
            target_ratio: target_margin_ratio,
        },
        land_value: LandValueDetail {
            mode_requested: land.requested,
            mode_used: land.used,
            fallback: land.fallback.is_some(),
            fallback_detail: land.fallback,
            value_used: land_cost,
            declared,
            residual,
            market: land.market_value,
            market_sample: land.market_sample.clone(),
            deltas: LandValueDeltas {
                declared_vs_residual: declared.map(|d| delta_vs_residual(d, residual)),
                market_vs_residual: land.market_value.map(|m| delta_vs_residual(m, residual)),
            },
            per_m2_floor_area,
            per_m2_terrain: land_cost / envelope.terrain_area_m2,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        let defaults = EngineDefaults::default();
        let target = defaults.target_margin_ratio;

        assert_eq!(
            appreciation_band(target + 0.05, target, &defaults),
            AppreciationBand::VeryComfortable
        );
        assert_eq!(
            appreciation_band(0.17, target, &defaults),
            AppreciationBand::VeryComfortable
        );
        assert_eq!(
            appreciation_band(target, target, &defaults),
            AppreciationBand::Comfortable
        );
        assert_eq!(
            appreciation_band(0.12, target, &defaults),
            AppreciationBand::Comfortable
        );
        assert_eq!(
            appreciation_band(target - 0.03, target, &defaults),
            AppreciationBand::Tight
        );
        assert_eq!(
            appreciation_band(0.09, target, &defaults),
            AppreciationBand::Tight
        );
        assert_eq!(
            appreciation_band(target - 0.03 - 0.0001, target, &defaults),
            AppreciationBand::Low
        );
        assert_eq!(
            appreciation_band(-0.4, target, &defaults),
            AppreciationBand::Low
        );
    }

    #[test]
    fn test_band_follows_configured_target() {
        let defaults = EngineDefaults::default();
        assert_eq!(
            appreciation_band(0.12, 0.15, &defaults),
            AppreciationBand::Tight
        );
    }

    #[test]
    fn test_margin_ratio_null_on_zero_revenue() {
        assert_eq!(margin_ratio(-1_000.0, 0.0), None);
        assert_eq!(margin_ratio(0.0, 0.0), None);
        assert_eq!(margin_ratio(50.0, 100.0), Some(0.5));
    }

    #[test]
    fn test_delta_vs_residual() {
        let delta = delta_vs_residual(1_500_000.0, 2_000_000.0);
        assert_eq!(delta.absolute, -500_000.0);
        assert_eq!(delta.percent_of_residual, Some(-25.0));

        let delta = delta_vs_residual(10.0, 0.0);
        assert_eq!(delta.absolute, 10.0);
        assert_eq!(delta.percent_of_residual, None);
    }
}
