use crate::domain::model::{LandValueMode, PerUse, ScenarioTag, UseKind};
use crate::utils::rounding;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSetbacks {
    pub street_m: f64,
    pub rear_m: f64,
    pub sides_m: f64,
}

/// 報表用的樓層列：`level_count` 層、每層 `area_per_level_m2`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRow {
    pub first_level: u32,
    pub level_count: u32,
    pub use_kind: UseKind,
    pub area_per_level_m2: f64,
    pub area_m2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildableEnvelopeResult {
    pub zone_code: Option<String>,
    pub terrain_area_m2: f64,
    pub footprint_ratio: f64,
    pub footprint_cap_m2: Option<f64>,
    pub footprint_m2: f64,
    pub max_height_m: f64,
    pub floor_height_m: f64,
    pub levels: u32,
    pub efficiency: f64,
    pub level_area_m2: f64,
    pub total_floor_area_m2: f64,
    pub density_limited: bool,
    pub setbacks: ResolvedSetbacks,
    pub scenario: ScenarioTag,
    pub level_rows: Vec<LevelRow>,
    /// Floor area per use; always sums to `total_floor_area_m2`.
    pub floor_area_by_use: PerUse,
    /// Zoning fields that were unknown and took a documented default.
    pub defaulted_fields: Vec<String>,
}

impl BuildableEnvelopeResult {
    pub fn rounded(&self) -> Self {
        Self {
            terrain_area_m2: rounding::area(self.terrain_area_m2),
            footprint_cap_m2: self.footprint_cap_m2.map(rounding::area),
            footprint_m2: rounding::area(self.footprint_m2),
            level_area_m2: rounding::area(self.level_area_m2),
            total_floor_area_m2: rounding::area(self.total_floor_area_m2),
            level_rows: self
                .level_rows
                .iter()
                .map(|row| LevelRow {
                    area_per_level_m2: rounding::area(row.area_per_level_m2),
                    area_m2: rounding::area(row.area_m2),
                    ..row.clone()
                })
                .collect(),
            floor_area_by_use: round_per_use(&self.floor_area_by_use, rounding::area),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeLines {
    pub design: f64,
    pub honoraria: f64,
    pub commercial: f64,
    pub financing: f64,
    pub tax: f64,
}

impl FeeLines {
    pub fn total(&self) -> f64 {
        self.design + self.honoraria + self.commercial + self.financing + self.tax
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenueSection {
    pub by_use: PerUse,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSection {
    pub construction_by_use: PerUse,
    pub construction: f64,
    pub fees: FeeLines,
    pub land: f64,
    pub excluding_land: f64,
    pub total: f64,
}

/// Serialized with its label: "very comfortable", "comfortable", "tight", "low".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppreciationBand {
    #[serde(rename = "very comfortable")]
    VeryComfortable,
    Comfortable,
    Tight,
    Low,
}

impl AppreciationBand {
    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryComfortable => "very comfortable",
            Self::Comfortable => "comfortable",
            Self::Tight => "tight",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for AppreciationBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginSection {
    pub amount: f64,
    /// `None` when total revenue is zero.
    pub ratio: Option<f64>,
    pub band: Option<AppreciationBand>,
    pub target_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    InsufficientSample,
    SourceUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSampleMeta {
    pub area_prefix: String,
    pub records_fetched: usize,
    pub records_eligible: usize,
    pub discarded_out_of_band: usize,
    pub records_retained: usize,
    pub min_sample: usize,
    pub median_price_m2: Option<f64>,
    pub resolved: bool,
    pub reason: Option<UnresolvedReason>,
}

/// Recorded whenever the requested land-value mode could not be honoured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackRecord {
    pub from: LandValueMode,
    pub to: LandValueMode,
    pub reason: UnresolvedReason,
    pub substituted_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueDelta {
    pub absolute: f64,
    /// `None` when the residual value is zero.
    pub percent_of_residual: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LandValueDeltas {
    pub declared_vs_residual: Option<ValueDelta>,
    pub market_vs_residual: Option<ValueDelta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandValueDetail {
    pub mode_requested: LandValueMode,
    pub mode_used: LandValueMode,
    pub fallback: bool,
    pub fallback_detail: Option<FallbackRecord>,
    pub value_used: f64,
    pub declared: Option<f64>,
    pub residual: f64,
    pub market: Option<f64>,
    pub market_sample: Option<MarketSampleMeta>,
    pub deltas: LandValueDeltas,
    pub per_m2_floor_area: Option<f64>,
    pub per_m2_terrain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityBilan {
    pub revenue: RevenueSection,
    pub costs: CostSection,
    pub margin: MarginSection,
    pub land_value: LandValueDetail,
}

impl FeasibilityBilan {
    pub fn rounded(&self) -> Self {
        let money = rounding::money;
        let delta = |d: &Option<ValueDelta>| {
            d.map(|d| ValueDelta {
                absolute: money(d.absolute),
                percent_of_residual: d.percent_of_residual.map(|p| rounding::round_to(p, 2)),
            })
        };
        let land = &self.land_value;

        Self {
            revenue: RevenueSection {
                by_use: round_per_use(&self.revenue.by_use, money),
                total: money(self.revenue.total),
            },
            costs: CostSection {
                construction_by_use: round_per_use(&self.costs.construction_by_use, money),
                construction: money(self.costs.construction),
                fees: FeeLines {
                    design: money(self.costs.fees.design),
                    honoraria: money(self.costs.fees.honoraria),
                    commercial: money(self.costs.fees.commercial),
                    financing: money(self.costs.fees.financing),
                    tax: money(self.costs.fees.tax),
                },
                land: money(self.costs.land),
                excluding_land: money(self.costs.excluding_land),
                total: money(self.costs.total),
            },
            margin: MarginSection {
                amount: money(self.margin.amount),
                ratio: self.margin.ratio.map(rounding::ratio),
                ..self.margin
            },
            land_value: LandValueDetail {
                fallback_detail: land.fallback_detail.map(|f| FallbackRecord {
                    substituted_value: money(f.substituted_value),
                    ..f
                }),
                value_used: money(land.value_used),
                declared: land.declared.map(money),
                residual: money(land.residual),
                market: land.market.map(money),
                market_sample: land.market_sample.as_ref().map(|meta| MarketSampleMeta {
                    median_price_m2: meta.median_price_m2.map(money),
                    ..meta.clone()
                }),
                deltas: LandValueDeltas {
                    declared_vs_residual: delta(&land.deltas.declared_vs_residual),
                    market_vs_residual: delta(&land.deltas.market_vs_residual),
                },
                per_m2_floor_area: land.per_m2_floor_area.map(money),
                per_m2_terrain: money(land.per_m2_terrain),
                ..land.clone()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSourceKind {
    Default,
    Catalog,
    DefaultAfterMiss,
    DefaultAfterError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileProvenance {
    pub requested: Option<String>,
    pub resolved_name: String,
    pub source: ProfileSourceKind,
    pub overridden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationCode {
    ProfileNotFound,
    ProfileLookupFailed,
    ZoningFieldsDefaulted,
    DensityLimited,
    MarketFallback,
}

/// A recovered degradation, reported alongside the result instead of as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub code: AnnotationCode,
    pub message: String,
}

impl Annotation {
    pub fn new(code: AnnotationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityResponse {
    pub envelope: BuildableEnvelopeResult,
    pub bilan: FeasibilityBilan,
    pub profile: ProfileProvenance,
    pub annotations: Vec<Annotation>,
    pub computed_at: DateTime<Utc>,
}

impl FeasibilityResponse {
    pub fn has_annotation(&self, code: AnnotationCode) -> bool {
        self.annotations.iter().any(|a| a.code == code)
    }
}

fn round_per_use(values: &PerUse, round: fn(f64) -> f64) -> PerUse {
    PerUse {
        residential: round(values.residential),
        commercial: round(values.commercial),
    }
}
