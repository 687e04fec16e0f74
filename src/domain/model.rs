use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 用途別（售價與造價皆依用途區分）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseKind {
    Residential,
    Commercial,
}

impl UseKind {
    pub const ALL: [UseKind; 2] = [UseKind::Residential, UseKind::Commercial];
}

/// 專案主要用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectUse {
    #[serde(alias = "residential_only")]
    Residential,
    #[serde(alias = "commercial_only")]
    Commercial,
    Mixed,
}

/// 樓層面積在報表中的分配方式，不影響總樓地板面積
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioTag {
    /// 每層一列
    #[default]
    Uniform,
    /// 地面層一列，其餘樓層合併一列
    Podium,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParcelInput {
    pub id: String,
    pub terrain_area_m2: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Setbacks {
    pub street_m: Option<f64>,
    pub rear_m: Option<f64>,
    pub sides_m: Option<f64>,
}

/// Zoning rules binding on a parcel. Every field may be unknown; unknown
/// fields resolve to `EngineDefaults`, never to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoningEnvelope {
    pub zone_code: Option<String>,
    #[serde(default)]
    pub setbacks: Setbacks,
    /// Footprint limit as a share of terrain area, in (0, 1].
    pub footprint_ratio: Option<f64>,
    /// Absolute footprint cap in m².
    pub footprint_cap_m2: Option<f64>,
    pub max_height_m: Option<f64>,
    pub density_applicable: Option<bool>,
    pub density_coefficient: Option<f64>,
}

impl ZoningEnvelope {
    /// 以 `over` 覆蓋查得的規則：有提供的欄位優先
    pub fn overlaid_with(&self, over: &ZoningEnvelope) -> ZoningEnvelope {
        ZoningEnvelope {
            zone_code: over.zone_code.clone().or_else(|| self.zone_code.clone()),
            setbacks: Setbacks {
                street_m: over.setbacks.street_m.or(self.setbacks.street_m),
                rear_m: over.setbacks.rear_m.or(self.setbacks.rear_m),
                sides_m: over.setbacks.sides_m.or(self.setbacks.sides_m),
            },
            footprint_ratio: over.footprint_ratio.or(self.footprint_ratio),
            footprint_cap_m2: over.footprint_cap_m2.or(self.footprint_cap_m2),
            max_height_m: over.max_height_m.or(self.max_height_m),
            density_applicable: over.density_applicable.or(self.density_applicable),
            density_coefficient: over.density_coefficient.or(self.density_coefficient),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectScenario {
    #[serde(rename = "use")]
    pub dominant_use: ProjectUse,
    #[serde(default)]
    pub scenario: ScenarioTag,
}

/// Per-use amounts (€/m², m² or €, depending on context).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerUse {
    pub residential: f64,
    pub commercial: f64,
}

impl PerUse {
    pub fn get(&self, use_kind: UseKind) -> f64 {
        match use_kind {
            UseKind::Residential => self.residential,
            UseKind::Commercial => self.commercial,
        }
    }

    pub fn total(&self) -> f64 {
        self.residential + self.commercial
    }

    /// 逐用途相乘（面積 × 單價）
    pub fn times(&self, rates: &PerUse) -> PerUse {
        PerUse {
            residential: self.residential * rates.residential,
            commercial: self.commercial * rates.commercial,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerUsePatch {
    pub residential: Option<f64>,
    pub commercial: Option<f64>,
}

/// 費用計算基準，固定不可設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeBase {
    Construction,
    Revenue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeKind {
    Design,
    Honoraria,
    Commercial,
    Financing,
    Tax,
}

impl FeeKind {
    pub const ALL: [FeeKind; 5] = [
        FeeKind::Design,
        FeeKind::Honoraria,
        FeeKind::Commercial,
        FeeKind::Financing,
        FeeKind::Tax,
    ];

    pub fn base(self) -> FeeBase {
        match self {
            FeeKind::Design | FeeKind::Honoraria => FeeBase::Construction,
            FeeKind::Commercial | FeeKind::Financing | FeeKind::Tax => FeeBase::Revenue,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeeRatios {
    pub design: f64,
    pub honoraria: f64,
    pub commercial: f64,
    pub financing: f64,
    pub tax: f64,
}

impl FeeRatios {
    pub fn get(&self, kind: FeeKind) -> f64 {
        match kind {
            FeeKind::Design => self.design,
            FeeKind::Honoraria => self.honoraria,
            FeeKind::Commercial => self.commercial,
            FeeKind::Financing => self.financing,
            FeeKind::Tax => self.tax,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeeRatiosPatch {
    pub design: Option<f64>,
    pub honoraria: Option<f64>,
    pub commercial: Option<f64>,
    pub financing: Option<f64>,
    pub tax: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingProfile {
    pub name: String,
    pub sale_price_m2: PerUse,
    pub construction_cost_m2: PerUse,
    pub fees: FeeRatios,
    /// Target margin as a share of total revenue.
    pub target_margin_ratio: f64,
}

/// Partial financing profile. Used both for catalog entries and for caller
/// overrides; unknown keys are rejected at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinancingOverrides {
    pub sale_price_m2: Option<PerUsePatch>,
    pub construction_cost_m2: Option<PerUsePatch>,
    pub fees: Option<FeeRatiosPatch>,
    pub target_margin_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinancingSection {
    pub profile_id: Option<String>,
    pub overrides: Option<FinancingOverrides>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandValueMode {
    Declared,
    #[default]
    Residual,
    Market,
    None,
}

impl std::fmt::Display for LandValueMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Declared => write!(f, "declared"),
            Self::Residual => write!(f, "residual"),
            Self::Market => write!(f, "market"),
            Self::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LandValueRequest {
    #[serde(default)]
    pub mode: LandValueMode,
    pub declared_value: Option<f64>,
    /// 行政區代碼前綴；未提供時取地號前幾碼
    pub area_prefix: Option<String>,
}

/// Incoming request. Every section is optional at the wire level so that a
/// missing required section is reported by name instead of as a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeasibilityRequest {
    pub parcel: Option<ParcelInput>,
    pub zoning: Option<ZoningEnvelope>,
    pub project: Option<ProjectScenario>,
    pub financing: Option<FinancingSection>,
    pub land_value: Option<LandValueRequest>,
}

/// One transaction as returned by the comparables source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub mutation_id: String,
    pub date: Option<NaiveDate>,
    pub commune_code: String,
    pub price: Option<f64>,
    pub terrain_area_m2: Option<f64>,
    pub built_area_m2: Option<f64>,
    #[serde(default)]
    pub has_structure: bool,
}

impl TransactionRecord {
    /// 純土地交易：無建物
    pub fn is_bare_land(&self) -> bool {
        !self.has_structure && !self.built_area_m2.is_some_and(|area| area > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoning_overlay_prefers_supplied_fields() {
        let looked_up = ZoningEnvelope {
            zone_code: Some("UA".to_string()),
            footprint_ratio: Some(0.5),
            max_height_m: Some(12.0),
            setbacks: Setbacks {
                street_m: Some(4.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let supplied = ZoningEnvelope {
            max_height_m: Some(18.0),
            setbacks: Setbacks {
                rear_m: Some(6.0),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = looked_up.overlaid_with(&supplied);
        assert_eq!(merged.zone_code.as_deref(), Some("UA"));
        assert_eq!(merged.footprint_ratio, Some(0.5));
        assert_eq!(merged.max_height_m, Some(18.0));
        assert_eq!(merged.setbacks.street_m, Some(4.0));
        assert_eq!(merged.setbacks.rear_m, Some(6.0));
        assert_eq!(merged.setbacks.sides_m, None);
    }

    #[test]
    fn test_override_typo_is_rejected() {
        let json = r#"{ "sale_price_m2": { "residental": 7000 } }"#;
        assert!(serde_json::from_str::<FinancingOverrides>(json).is_err());

        let json = r#"{ "sale_price_m2": { "residential": 7000 } }"#;
        let overrides: FinancingOverrides = serde_json::from_str(json).unwrap();
        assert_eq!(
            overrides.sale_price_m2.unwrap().residential,
            Some(7000.0)
        );
    }

    #[test]
    fn test_bare_land_detection() {
        let mut record = TransactionRecord {
            mutation_id: "2023-1".to_string(),
            date: None,
            commune_code: "69123".to_string(),
            price: Some(100_000.0),
            terrain_area_m2: Some(400.0),
            built_area_m2: None,
            has_structure: false,
        };
        assert!(record.is_bare_land());

        record.built_area_m2 = Some(0.0);
        assert!(record.is_bare_land());

        record.built_area_m2 = Some(85.0);
        assert!(!record.is_bare_land());

        record.built_area_m2 = None;
        record.has_structure = true;
        assert!(!record.is_bare_land());
    }

    #[test]
    fn test_request_parses_use_keyword() {
        let json = r#"{
            "parcel": { "id": "75056000AB0001", "terrain_area_m2": 500 },
            "project": { "use": "mixed", "scenario": "podium" },
            "land_value": { "mode": "market" }
        }"#;
        let request: FeasibilityRequest = serde_json::from_str(json).unwrap();
        let project = request.project.unwrap();
        assert_eq!(project.dominant_use, ProjectUse::Mixed);
        assert_eq!(project.scenario, ScenarioTag::Podium);
        assert_eq!(request.land_value.unwrap().mode, LandValueMode::Market);
        assert!(request.zoning.is_none());
    }
}
