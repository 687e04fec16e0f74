//! Named home of every default constant used by the engine.
//!
//! Unknown zoning fields, a missing financing profile and the comparables
//! thresholds all resolve here, so tests can assert on the values directly.

use crate::domain::merge::{merge_field, DeepMerge};
use crate::domain::model::{FeeRatios, FinancingProfile, PerUse};
use crate::utils::error::{FeasibilityError, Result};
use crate::utils::validation::{validate_positive, validate_range, validate_ratio};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FOOTPRINT_RATIO: f64 = 0.6;
pub const DEFAULT_MAX_HEIGHT_M: f64 = 15.0;
pub const DEFAULT_FLOOR_HEIGHT_M: f64 = 3.0;
pub const DEFAULT_EFFICIENCY: f64 = 0.85;
/// 樓層數上限；超過的高度視為輸入錯誤
pub const DEFAULT_MAX_LEVELS: u32 = 100;
pub const DEFAULT_TARGET_MARGIN_RATIO: f64 = 0.12;

// 退縮距離僅回顯，取保守值
pub const DEFAULT_STREET_SETBACK_M: f64 = 5.0;
pub const DEFAULT_REAR_SETBACK_M: f64 = 4.0;
pub const DEFAULT_SIDE_SETBACK_M: f64 = 3.0;

pub const DEFAULT_MIN_SAMPLE: usize = 30;
pub const DEFAULT_MIN_PRICE_M2: f64 = 50.0;
pub const DEFAULT_MAX_PRICE_M2: f64 = 20_000.0;
pub const DEFAULT_MAX_TERRAIN_AREA_M2: f64 = 5_000.0;
pub const DEFAULT_AREA_PREFIX_LENGTH: usize = 5;

pub const DEFAULT_VERY_COMFORTABLE_OFFSET: f64 = 0.05;
pub const DEFAULT_TIGHT_OFFSET: f64 = 0.03;

pub const DEFAULT_PROFILE_NAME: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineDefaults {
    pub footprint_ratio: f64,
    pub max_height_m: f64,
    pub floor_height_m: f64,
    pub efficiency: f64,
    /// Upper bound on the level count a height may imply.
    pub max_levels: u32,
    /// Default profile margin, also the appreciation-band reference when no
    /// profile overrides it.
    pub target_margin_ratio: f64,
    pub street_setback_m: f64,
    pub rear_setback_m: f64,
    pub side_setback_m: f64,
    pub comparables: ComparablesSettings,
    pub very_comfortable_offset: f64,
    pub tight_offset: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparablesSettings {
    pub min_sample: usize,
    pub min_price_m2: f64,
    pub max_price_m2: f64,
    pub max_terrain_area_m2: f64,
    pub area_prefix_length: usize,
    /// 只採計最近 N 年的交易；未設定則不限
    pub max_age_years: Option<u32>,
}

impl Default for ComparablesSettings {
    fn default() -> Self {
        Self {
            min_sample: DEFAULT_MIN_SAMPLE,
            min_price_m2: DEFAULT_MIN_PRICE_M2,
            max_price_m2: DEFAULT_MAX_PRICE_M2,
            max_terrain_area_m2: DEFAULT_MAX_TERRAIN_AREA_M2,
            area_prefix_length: DEFAULT_AREA_PREFIX_LENGTH,
            max_age_years: None,
        }
    }
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self {
            footprint_ratio: DEFAULT_FOOTPRINT_RATIO,
            max_height_m: DEFAULT_MAX_HEIGHT_M,
            floor_height_m: DEFAULT_FLOOR_HEIGHT_M,
            efficiency: DEFAULT_EFFICIENCY,
            max_levels: DEFAULT_MAX_LEVELS,
            target_margin_ratio: DEFAULT_TARGET_MARGIN_RATIO,
            street_setback_m: DEFAULT_STREET_SETBACK_M,
            rear_setback_m: DEFAULT_REAR_SETBACK_M,
            side_setback_m: DEFAULT_SIDE_SETBACK_M,
            comparables: ComparablesSettings::default(),
            very_comfortable_offset: DEFAULT_VERY_COMFORTABLE_OFFSET,
            tight_offset: DEFAULT_TIGHT_OFFSET,
        }
    }
}

impl EngineDefaults {
    /// Built-in financing profile used when no profile is named or the
    /// named one cannot be found.
    pub fn default_profile(&self) -> FinancingProfile {
        FinancingProfile {
            name: DEFAULT_PROFILE_NAME.to_string(),
            sale_price_m2: PerUse {
                residential: 6000.0,
                commercial: 4000.0,
            },
            construction_cost_m2: PerUse {
                residential: 2500.0,
                commercial: 2000.0,
            },
            fees: FeeRatios {
                design: 0.03,
                honoraria: 0.05,
                commercial: 0.03,
                financing: 0.02,
                tax: 0.02,
            },
            target_margin_ratio: self.target_margin_ratio,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_ratio("defaults.footprint_ratio", self.footprint_ratio)?;
        validate_positive("defaults.max_height_m", self.max_height_m)?;
        validate_positive("defaults.floor_height_m", self.floor_height_m)?;
        validate_ratio("defaults.efficiency", self.efficiency)?;
        if self.efficiency >= 1.0 {
            return Err(FeasibilityError::invalid_input(
                "defaults.efficiency",
                self.efficiency,
                "Efficiency must be strictly below 1",
            ));
        }
        validate_range("defaults.max_levels", self.max_levels, 1, 1_000)?;
        validate_range("defaults.target_margin_ratio", self.target_margin_ratio, 0.0, 0.99)?;
        validate_range("defaults.street_setback_m", self.street_setback_m, 0.0, f64::MAX)?;
        validate_range("defaults.rear_setback_m", self.rear_setback_m, 0.0, f64::MAX)?;
        validate_range("defaults.side_setback_m", self.side_setback_m, 0.0, f64::MAX)?;
        validate_range("defaults.very_comfortable_offset", self.very_comfortable_offset, 0.0, 1.0)?;
        validate_range("defaults.tight_offset", self.tight_offset, 0.0, 1.0)?;

        let comparables = &self.comparables;
        validate_range("defaults.comparables.min_sample", comparables.min_sample, 1, usize::MAX)?;
        validate_positive("defaults.comparables.min_price_m2", comparables.min_price_m2)?;
        validate_range(
            "defaults.comparables.max_price_m2",
            comparables.max_price_m2,
            comparables.min_price_m2,
            f64::MAX,
        )?;
        validate_positive(
            "defaults.comparables.max_terrain_area_m2",
            comparables.max_terrain_area_m2,
        )?;
        validate_range(
            "defaults.comparables.area_prefix_length",
            comparables.area_prefix_length,
            1,
            14,
        )?;
        Ok(())
    }
}

/// `[defaults]` section of the engine TOML file; any subset of fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineDefaultsPatch {
    pub footprint_ratio: Option<f64>,
    pub max_height_m: Option<f64>,
    pub floor_height_m: Option<f64>,
    pub efficiency: Option<f64>,
    pub max_levels: Option<u32>,
    pub target_margin_ratio: Option<f64>,
    pub street_setback_m: Option<f64>,
    pub rear_setback_m: Option<f64>,
    pub side_setback_m: Option<f64>,
    pub comparables: Option<ComparablesPatch>,
    pub very_comfortable_offset: Option<f64>,
    pub tight_offset: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComparablesPatch {
    pub min_sample: Option<usize>,
    pub min_price_m2: Option<f64>,
    pub max_price_m2: Option<f64>,
    pub max_terrain_area_m2: Option<f64>,
    pub area_prefix_length: Option<usize>,
    pub max_age_years: Option<u32>,
}

impl DeepMerge for ComparablesSettings {
    type Patch = ComparablesPatch;

    fn merge(&mut self, patch: &ComparablesPatch) {
        merge_field(&mut self.min_sample, &patch.min_sample);
        merge_field(&mut self.min_price_m2, &patch.min_price_m2);
        merge_field(&mut self.max_price_m2, &patch.max_price_m2);
        merge_field(&mut self.max_terrain_area_m2, &patch.max_terrain_area_m2);
        merge_field(&mut self.area_prefix_length, &patch.area_prefix_length);
        if let Some(years) = patch.max_age_years {
            self.max_age_years = Some(years);
        }
    }
}

impl DeepMerge for EngineDefaults {
    type Patch = EngineDefaultsPatch;

    fn merge(&mut self, patch: &EngineDefaultsPatch) {
        merge_field(&mut self.footprint_ratio, &patch.footprint_ratio);
        merge_field(&mut self.max_height_m, &patch.max_height_m);
        merge_field(&mut self.floor_height_m, &patch.floor_height_m);
        merge_field(&mut self.efficiency, &patch.efficiency);
        merge_field(&mut self.max_levels, &patch.max_levels);
        merge_field(&mut self.target_margin_ratio, &patch.target_margin_ratio);
        merge_field(&mut self.street_setback_m, &patch.street_setback_m);
        merge_field(&mut self.rear_setback_m, &patch.rear_setback_m);
        merge_field(&mut self.side_setback_m, &patch.side_setback_m);
        merge_field(&mut self.comparables, &patch.comparables);
        merge_field(&mut self.very_comfortable_offset, &patch.very_comfortable_offset);
        merge_field(&mut self.tight_offset, &patch.tight_offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_constants() {
        let defaults = EngineDefaults::default();
        assert_eq!(defaults.footprint_ratio, 0.6);
        assert_eq!(defaults.max_height_m, 15.0);
        assert_eq!(defaults.floor_height_m, 3.0);
        assert_eq!(defaults.efficiency, 0.85);
        assert_eq!(defaults.max_levels, 100);
        assert_eq!(defaults.target_margin_ratio, 0.12);
        assert_eq!(defaults.comparables.min_sample, 30);
        assert_eq!(defaults.comparables.min_price_m2, 50.0);
        assert_eq!(defaults.comparables.max_price_m2, 20_000.0);
        assert_eq!(defaults.comparables.max_terrain_area_m2, 5_000.0);
        assert!(defaults.validate().is_ok());
    }

    #[test]
    fn test_default_profile_follows_target_margin() {
        let defaults = EngineDefaults {
            target_margin_ratio: 0.15,
            ..Default::default()
        };
        let profile = defaults.default_profile();
        assert_eq!(profile.name, DEFAULT_PROFILE_NAME);
        assert_eq!(profile.target_margin_ratio, 0.15);
        assert_eq!(profile.fees.honoraria, 0.05);
    }

    #[test]
    fn test_patch_merges_nested_comparables() {
        let patch = EngineDefaultsPatch {
            efficiency: Some(0.8),
            comparables: Some(ComparablesPatch {
                min_sample: Some(10),
                max_age_years: Some(5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = EngineDefaults::default().merged(&patch);
        assert_eq!(merged.efficiency, 0.8);
        assert_eq!(merged.max_levels, DEFAULT_MAX_LEVELS);
        assert_eq!(merged.comparables.min_sample, 10);
        assert_eq!(merged.comparables.max_age_years, Some(5));
        assert_eq!(merged.comparables.max_price_m2, 20_000.0);
        assert_eq!(merged.footprint_ratio, 0.6);
    }

    #[test]
    fn test_patch_overrides_level_limit() {
        let patch = EngineDefaultsPatch {
            max_levels: Some(12),
            ..Default::default()
        };
        let merged = EngineDefaults::default().merged(&patch);
        assert_eq!(merged.max_levels, 12);
        assert_eq!(merged.floor_height_m, DEFAULT_FLOOR_HEIGHT_M);
    }

    #[test]
    fn test_invalid_defaults_rejected() {
        let defaults = EngineDefaults {
            floor_height_m: 0.0,
            ..Default::default()
        };
        assert!(defaults.validate().is_err());

        let mut defaults = EngineDefaults::default();
        defaults.comparables.max_price_m2 = 10.0;
        assert!(defaults.validate().is_err());

        let defaults = EngineDefaults {
            max_levels: 0,
            ..Default::default()
        };
        assert!(defaults.validate().is_err());
    }
}
