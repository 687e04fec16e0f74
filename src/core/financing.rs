//! Financing profile resolution: by name or default, then caller overrides.

use crate::domain::bilan::{Annotation, AnnotationCode, ProfileProvenance, ProfileSourceKind};
use crate::domain::merge::DeepMerge;
use crate::domain::model::{FeeKind, FinancingOverrides, FinancingProfile, UseKind};
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_negative, validate_range};

/// Outcome of the profile-by-name lookup, as seen by the resolver.
#[derive(Debug, Clone)]
pub enum ProfileLookup {
    NotRequested,
    Found(FinancingProfile),
    Missing,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub profile: FinancingProfile,
    pub provenance: ProfileProvenance,
    pub annotation: Option<Annotation>,
}

fn fee_field(kind: FeeKind) -> &'static str {
    match kind {
        FeeKind::Design => "design",
        FeeKind::Honoraria => "honoraria",
        FeeKind::Commercial => "commercial",
        FeeKind::Financing => "financing",
        FeeKind::Tax => "tax",
    }
}

fn use_field(use_kind: UseKind) -> &'static str {
    match use_kind {
        UseKind::Residential => "residential",
        UseKind::Commercial => "commercial",
    }
}

/// 單價與造價不得為負，費率須在 [0, 1]，目標利潤率須在 [0, 1)
pub fn validate_profile(profile: &FinancingProfile, prefix: &str) -> Result<()> {
    for use_kind in UseKind::ALL {
        validate_non_negative(
            &format!("{}.sale_price_m2.{}", prefix, use_field(use_kind)),
            profile.sale_price_m2.get(use_kind),
        )?;
        validate_non_negative(
            &format!("{}.construction_cost_m2.{}", prefix, use_field(use_kind)),
            profile.construction_cost_m2.get(use_kind),
        )?;
    }
    for kind in FeeKind::ALL {
        validate_range(
            &format!("{}.fees.{}", prefix, fee_field(kind)),
            profile.fees.get(kind),
            0.0,
            1.0,
        )?;
    }
    validate_range(
        &format!("{}.target_margin_ratio", prefix),
        profile.target_margin_ratio,
        0.0,
        0.99,
    )?;
    Ok(())
}

/// Resolve the profile to use. A missing or failing lookup never fails the
/// computation: the default profile is used and the degradation annotated.
/// Caller overrides are deep-merged last and the result validated.
pub fn resolve_profile(
    requested: Option<&str>,
    lookup: ProfileLookup,
    default_profile: &FinancingProfile,
    overrides: Option<&FinancingOverrides>,
) -> Result<ResolvedProfile> {
    let (base, source, annotation) = match lookup {
        ProfileLookup::NotRequested => (default_profile.clone(), ProfileSourceKind::Default, None),
        ProfileLookup::Found(profile) => (profile, ProfileSourceKind::Catalog, None),
        ProfileLookup::Missing => (
            default_profile.clone(),
            ProfileSourceKind::DefaultAfterMiss,
            Some(Annotation::new(
                AnnotationCode::ProfileNotFound,
                format!(
                    "Financing profile '{}' not found; default profile used",
                    requested.unwrap_or_default()
                ),
            )),
        ),
        ProfileLookup::Failed(message) => (
            default_profile.clone(),
            ProfileSourceKind::DefaultAfterError,
            Some(Annotation::new(
                AnnotationCode::ProfileLookupFailed,
                format!(
                    "Financing profile '{}' lookup failed ({}); default profile used",
                    requested.unwrap_or_default(),
                    message
                ),
            )),
        ),
    };

    let profile = match overrides {
        Some(patch) => base.merged(patch),
        None => base,
    };
    validate_profile(&profile, "financing")?;

    Ok(ResolvedProfile {
        provenance: ProfileProvenance {
            requested: requested.map(str::to_string),
            resolved_name: profile.name.clone(),
            source,
            overridden: overrides.is_some(),
        },
        profile,
        annotation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::EngineDefaults;
    use crate::domain::model::{FeeRatiosPatch, PerUsePatch};

    fn default_profile() -> FinancingProfile {
        EngineDefaults::default().default_profile()
    }

    #[test]
    fn test_no_id_uses_defaults() {
        let resolved =
            resolve_profile(None, ProfileLookup::NotRequested, &default_profile(), None).unwrap();
        assert_eq!(resolved.profile, default_profile());
        assert_eq!(resolved.provenance.source, ProfileSourceKind::Default);
        assert!(resolved.annotation.is_none());
    }

    #[test]
    fn test_missing_id_falls_back_to_defaults() {
        let resolved = resolve_profile(
            Some("atlantis"),
            ProfileLookup::Missing,
            &default_profile(),
            None,
        )
        .unwrap();
        assert_eq!(resolved.profile, default_profile());
        assert_eq!(resolved.provenance.source, ProfileSourceKind::DefaultAfterMiss);
        assert_eq!(resolved.provenance.requested.as_deref(), Some("atlantis"));
        assert_eq!(
            resolved.annotation.map(|a| a.code),
            Some(AnnotationCode::ProfileNotFound)
        );
    }

    #[test]
    fn test_failed_lookup_falls_back_to_defaults() {
        let resolved = resolve_profile(
            Some("paris"),
            ProfileLookup::Failed("timeout".to_string()),
            &default_profile(),
            None,
        )
        .unwrap();
        assert_eq!(resolved.provenance.source, ProfileSourceKind::DefaultAfterError);
        assert_eq!(
            resolved.annotation.map(|a| a.code),
            Some(AnnotationCode::ProfileLookupFailed)
        );
    }

    #[test]
    fn test_overrides_merge_onto_catalog_profile() {
        let mut catalog = default_profile();
        catalog.name = "paris".to_string();
        catalog.sale_price_m2.residential = 11_000.0;

        let overrides = FinancingOverrides {
            construction_cost_m2: Some(PerUsePatch {
                commercial: Some(2200.0),
                ..Default::default()
            }),
            fees: Some(FeeRatiosPatch {
                financing: Some(0.025),
                ..Default::default()
            }),
            ..Default::default()
        };

        let resolved = resolve_profile(
            Some("paris"),
            ProfileLookup::Found(catalog),
            &default_profile(),
            Some(&overrides),
        )
        .unwrap();

        assert_eq!(resolved.profile.name, "paris");
        assert_eq!(resolved.profile.sale_price_m2.residential, 11_000.0);
        assert_eq!(resolved.profile.construction_cost_m2.commercial, 2200.0);
        assert_eq!(resolved.profile.construction_cost_m2.residential, 2500.0);
        assert_eq!(resolved.profile.fees.financing, 0.025);
        assert_eq!(resolved.profile.fees.design, 0.03);
        assert!(resolved.provenance.overridden);
        assert_eq!(resolved.provenance.source, ProfileSourceKind::Catalog);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let overrides = FinancingOverrides {
            sale_price_m2: Some(PerUsePatch {
                residential: Some(-1.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let result = resolve_profile(
            None,
            ProfileLookup::NotRequested,
            &default_profile(),
            Some(&overrides),
        );
        assert!(result.is_err());
    }
}
