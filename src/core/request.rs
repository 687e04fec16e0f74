use crate::domain::model::{
    FeasibilityRequest, FinancingSection, LandValueMode, LandValueRequest, ParcelInput,
    ProjectScenario, ZoningEnvelope,
};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_non_negative, validate_positive, validate_ratio,
    validate_required_field, Validate,
};

/// Request whose required sections are present and whose supplied values
/// are structurally valid.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub parcel: ParcelInput,
    pub zoning: Option<ZoningEnvelope>,
    pub project: ProjectScenario,
    pub financing: FinancingSection,
    pub land_value: LandValueRequest,
}

fn validate_zoning(zoning: &ZoningEnvelope) -> Result<()> {
    if let Some(ratio) = zoning.footprint_ratio {
        validate_ratio("zoning.footprint_ratio", ratio)?;
    }
    if let Some(cap) = zoning.footprint_cap_m2 {
        validate_non_negative("zoning.footprint_cap_m2", cap)?;
    }
    if let Some(height) = zoning.max_height_m {
        validate_positive("zoning.max_height_m", height)?;
    }
    if let Some(coefficient) = zoning.density_coefficient {
        validate_positive("zoning.density_coefficient", coefficient)?;
    }
    let setbacks = &zoning.setbacks;
    for (field, value) in [
        ("zoning.setbacks.street_m", setbacks.street_m),
        ("zoning.setbacks.rear_m", setbacks.rear_m),
        ("zoning.setbacks.sides_m", setbacks.sides_m),
    ] {
        if let Some(value) = value {
            validate_non_negative(field, value)?;
        }
    }
    Ok(())
}

impl Validate for FeasibilityRequest {
    fn validate(&self) -> Result<()> {
        let parcel = validate_required_field("parcel", &self.parcel)?;
        validate_required_field("project", &self.project)?;

        validate_non_empty_string("parcel.id", &parcel.id)?;
        if let Some(area) = parcel.terrain_area_m2 {
            validate_positive("parcel.terrain_area_m2", area)?;
        }

        if let Some(zoning) = &self.zoning {
            validate_zoning(zoning)?;
        }

        if let Some(financing) = &self.financing {
            if let Some(profile_id) = &financing.profile_id {
                validate_non_empty_string("financing.profile_id", profile_id)?;
            }
        }

        if let Some(land_value) = &self.land_value {
            if let Some(declared) = land_value.declared_value {
                validate_non_negative("land_value.declared_value", declared)?;
            }
            if land_value.mode == LandValueMode::Declared {
                validate_required_field("land_value.declared_value", &land_value.declared_value)?;
            }
            if let Some(prefix) = &land_value.area_prefix {
                validate_non_empty_string("land_value.area_prefix", prefix)?;
            }
        }

        Ok(())
    }
}

impl FeasibilityRequest {
    /// 驗證後拆成必要區段
    pub fn into_validated(self) -> Result<ValidatedRequest> {
        self.validate()?;
        let parcel = validate_required_field("parcel", &self.parcel)?.clone();
        let project = validate_required_field("project", &self.project)?.clone();

        Ok(ValidatedRequest {
            parcel,
            zoning: self.zoning,
            project,
            financing: self.financing.unwrap_or_default(),
            land_value: self.land_value.unwrap_or_default(),
        })
    }
}
