//! Revenue and non-land cost from the per-use floor area split.
//!
//! Pure: safe to re-run with another profile for what-if comparisons.

use crate::domain::bilan::FeeLines;
use crate::domain::model::{FeeBase, FeeKind, FinancingProfile, PerUse};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevenueCost {
    pub revenue_by_use: PerUse,
    pub revenue_total: f64,
    pub construction_by_use: PerUse,
    pub construction_total: f64,
    pub fees: FeeLines,
    pub cost_excluding_land: f64,
}

fn fee_amount(kind: FeeKind, profile: &FinancingProfile, construction: f64, revenue: f64) -> f64 {
    let base = match kind.base() {
        FeeBase::Construction => construction,
        FeeBase::Revenue => revenue,
    };
    base * profile.fees.get(kind)
}

pub fn compute_revenue_cost(floor_area_by_use: &PerUse, profile: &FinancingProfile) -> RevenueCost {
    let revenue_by_use = floor_area_by_use.times(&profile.sale_price_m2);
    let revenue_total = revenue_by_use.total();

    let construction_by_use = floor_area_by_use.times(&profile.construction_cost_m2);
    let construction_total = construction_by_use.total();

    let fee = |kind| fee_amount(kind, profile, construction_total, revenue_total);
    let fees = FeeLines {
        design: fee(FeeKind::Design),
        honoraria: fee(FeeKind::Honoraria),
        commercial: fee(FeeKind::Commercial),
        financing: fee(FeeKind::Financing),
        tax: fee(FeeKind::Tax),
    };

    RevenueCost {
        revenue_by_use,
        revenue_total,
        construction_by_use,
        construction_total,
        fees,
        cost_excluding_land: construction_total + fees.total(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::EngineDefaults;

    #[test]
    fn test_reference_arithmetic() {
        let profile = EngineDefaults::default().default_profile();
        let split = PerUse {
            residential: 1275.0,
            commercial: 0.0,
        };
        let result = compute_revenue_cost(&split, &profile);

        assert_eq!(result.revenue_total, 7_650_000.0);
        assert_eq!(result.construction_total, 3_187_500.0);
        assert_eq!(result.fees.honoraria, 159_375.0);
        assert!((result.fees.design - 95_625.0).abs() < 1e-6);
        assert!((result.fees.commercial - 229_500.0).abs() < 1e-6);
        assert!((result.fees.financing - 153_000.0).abs() < 1e-6);
        assert!((result.fees.tax - 153_000.0).abs() < 1e-6);
        assert!((result.cost_excluding_land - 3_978_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_mixed_use_revenue() {
        let profile = EngineDefaults::default().default_profile();
        let split = PerUse {
            residential: 100.0,
            commercial: 50.0,
        };
        let result = compute_revenue_cost(&split, &profile);
        assert_eq!(result.revenue_by_use.residential, 600_000.0);
        assert_eq!(result.revenue_by_use.commercial, 200_000.0);
        assert_eq!(result.revenue_total, 800_000.0);
        assert_eq!(result.construction_total, 250_000.0 + 100_000.0);
    }

    #[test]
    fn test_zero_area_yields_zero() {
        let profile = EngineDefaults::default().default_profile();
        let result = compute_revenue_cost(&PerUse::default(), &profile);
        assert_eq!(result.revenue_total, 0.0);
        assert_eq!(result.cost_excluding_land, 0.0);
    }
}
