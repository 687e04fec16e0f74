//! Zoning envelope → buildable footprint, level count and usable floor area.

use crate::config::defaults::EngineDefaults;
use crate::domain::bilan::{BuildableEnvelopeResult, LevelRow, ResolvedSetbacks};
use crate::domain::model::{PerUse, ProjectScenario, ProjectUse, ScenarioTag, UseKind, ZoningEnvelope};
use crate::utils::error::{FeasibilityError, Result};
use crate::utils::validation::{validate_non_negative, validate_positive, validate_ratio};

// 高度 ÷ 層高 的浮點誤差容忍
const LEVEL_EPSILON: f64 = 1e-9;

/// 未知欄位取預設值並記錄欄位名稱
fn or_default(value: Option<f64>, fallback: f64, field: &str, defaulted: &mut Vec<String>) -> f64 {
    match value {
        Some(value) => value,
        None => {
            defaulted.push(field.to_string());
            fallback
        }
    }
}

pub fn level_count(max_height_m: f64, floor_height_m: f64) -> u32 {
    let levels = (max_height_m / floor_height_m + LEVEL_EPSILON).floor();
    if levels < 1.0 {
        1
    } else {
        levels as u32
    }
}

/// Split total floor area across uses. Mixed projects put the ground level
/// in commercial use and the upper levels in residential use.
pub fn floor_area_by_use(dominant_use: ProjectUse, level_area_m2: f64, levels: u32) -> PerUse {
    let total = level_area_m2 * levels as f64;
    match dominant_use {
        ProjectUse::Residential => PerUse {
            residential: total,
            commercial: 0.0,
        },
        ProjectUse::Commercial => PerUse {
            residential: 0.0,
            commercial: total,
        },
        ProjectUse::Mixed => PerUse {
            residential: level_area_m2 * levels.saturating_sub(1) as f64,
            commercial: level_area_m2,
        },
    }
}

fn use_of_level(dominant_use: ProjectUse, level: u32) -> UseKind {
    match dominant_use {
        ProjectUse::Residential => UseKind::Residential,
        ProjectUse::Commercial => UseKind::Commercial,
        ProjectUse::Mixed if level == 0 => UseKind::Commercial,
        ProjectUse::Mixed => UseKind::Residential,
    }
}

fn row(first_level: u32, level_count: u32, use_kind: UseKind, level_area_m2: f64) -> LevelRow {
    LevelRow {
        first_level,
        level_count,
        use_kind,
        area_per_level_m2: level_area_m2,
        area_m2: level_area_m2 * level_count as f64,
    }
}

/// 報表分層：只影響列的切分，總面積不變
pub fn level_rows(project: &ProjectScenario, level_area_m2: f64, levels: u32) -> Vec<LevelRow> {
    match project.scenario {
        ScenarioTag::Uniform => (0..levels)
            .map(|level| row(level, 1, use_of_level(project.dominant_use, level), level_area_m2))
            .collect(),
        ScenarioTag::Podium => {
            let mut rows = vec![row(0, 1, use_of_level(project.dominant_use, 0), level_area_m2)];
            if levels > 1 {
                rows.push(row(
                    1,
                    levels - 1,
                    use_of_level(project.dominant_use, 1),
                    level_area_m2,
                ));
            }
            rows
        }
    }
}

pub fn resolve_envelope(
    terrain_area_m2: f64,
    zoning: &ZoningEnvelope,
    project: &ProjectScenario,
    defaults: &EngineDefaults,
) -> Result<BuildableEnvelopeResult> {
    validate_positive("parcel.terrain_area_m2", terrain_area_m2)?;

    let mut defaulted = Vec::new();

    let footprint_ratio = or_default(
        zoning.footprint_ratio,
        defaults.footprint_ratio,
        "footprint_ratio",
        &mut defaulted,
    );
    validate_ratio("zoning.footprint_ratio", footprint_ratio)?;
    if let Some(cap) = zoning.footprint_cap_m2 {
        validate_non_negative("zoning.footprint_cap_m2", cap)?;
    }

    let mut footprint_m2 = terrain_area_m2 * footprint_ratio;
    if let Some(cap) = zoning.footprint_cap_m2 {
        footprint_m2 = footprint_m2.min(cap);
    }
    let footprint_m2 = footprint_m2.min(terrain_area_m2);

    let max_height_m = or_default(
        zoning.max_height_m,
        defaults.max_height_m,
        "max_height_m",
        &mut defaulted,
    );
    validate_positive("zoning.max_height_m", max_height_m)?;
    if (max_height_m / defaults.floor_height_m + LEVEL_EPSILON).floor()
        > f64::from(defaults.max_levels)
    {
        return Err(FeasibilityError::invalid_input(
            "zoning.max_height_m",
            max_height_m,
            format!(
                "Height implies more than {} levels of {} m",
                defaults.max_levels, defaults.floor_height_m
            ),
        ));
    }
    let levels = level_count(max_height_m, defaults.floor_height_m);

    let mut level_area_m2 = footprint_m2 * defaults.efficiency;
    let mut total_floor_area_m2 = level_area_m2 * levels as f64;

    // 容積率（若適用）封頂總樓地板面積
    let mut density_limited = false;
    if zoning.density_applicable != Some(false) {
        if let Some(coefficient) = zoning.density_coefficient {
            validate_positive("zoning.density_coefficient", coefficient)?;
            let density_cap_m2 = terrain_area_m2 * coefficient;
            if total_floor_area_m2 > density_cap_m2 {
                total_floor_area_m2 = density_cap_m2;
                level_area_m2 = density_cap_m2 / levels as f64;
                density_limited = true;
            }
        }
    }

    let setbacks = ResolvedSetbacks {
        street_m: or_default(
            zoning.setbacks.street_m,
            defaults.street_setback_m,
            "setbacks.street_m",
            &mut defaulted,
        ),
        rear_m: or_default(
            zoning.setbacks.rear_m,
            defaults.rear_setback_m,
            "setbacks.rear_m",
            &mut defaulted,
        ),
        sides_m: or_default(
            zoning.setbacks.sides_m,
            defaults.side_setback_m,
            "setbacks.sides_m",
            &mut defaulted,
        ),
    };
    validate_non_negative("zoning.setbacks.street_m", setbacks.street_m)?;
    validate_non_negative("zoning.setbacks.rear_m", setbacks.rear_m)?;
    validate_non_negative("zoning.setbacks.sides_m", setbacks.sides_m)?;

    Ok(BuildableEnvelopeResult {
        zone_code: zoning.zone_code.clone(),
        terrain_area_m2,
        footprint_ratio,
        footprint_cap_m2: zoning.footprint_cap_m2,
        footprint_m2,
        max_height_m,
        floor_height_m: defaults.floor_height_m,
        levels,
        efficiency: defaults.efficiency,
        level_area_m2,
        total_floor_area_m2,
        density_limited,
        setbacks,
        scenario: project.scenario,
        level_rows: level_rows(project, level_area_m2, levels),
        floor_area_by_use: floor_area_by_use(project.dominant_use, level_area_m2, levels),
        defaulted_fields: defaulted,
    })
}
