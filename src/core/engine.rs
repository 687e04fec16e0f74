use crate::config::defaults::EngineDefaults;
use crate::core::aggregator::aggregate;
use crate::core::comparables::{area_prefix, evaluate_market, unavailable_meta};
use crate::core::envelope::resolve_envelope;
use crate::core::financing::{resolve_profile, ProfileLookup};
use crate::core::land_value::{residual_value, LandValueInputs, LandValueState, MarketEvidence};
use crate::core::request::ValidatedRequest;
use crate::core::revenue::compute_revenue_cost;
use crate::domain::bilan::{Annotation, AnnotationCode, FeasibilityResponse};
use crate::domain::model::{FeasibilityRequest, LandValueMode, ZoningEnvelope};
use crate::domain::ports::{ParcelSource, ProfileSource, TransactionSource, ZoningSource};
use crate::utils::error::{ErrorCategory, FeasibilityError, Result};
use chrono::{NaiveDate, Utc};

/// Orchestrates one feasibility evaluation: resolve inputs, compute the
/// envelope, revenue/cost and land value, then aggregate the bilan.
///
/// Holds no state between evaluations; the collaborators are read-only.
pub struct FeasibilityEngine<Z, P, A, T>
where
    Z: ZoningSource,
    P: ProfileSource,
    A: ParcelSource,
    T: TransactionSource,
{
    zoning: Z,
    profiles: P,
    parcels: A,
    transactions: T,
    defaults: EngineDefaults,
}

/// 供錯誤日誌重現用
#[derive(Debug, Clone)]
struct EvaluationContext {
    parcel_id: String,
    zone: Option<String>,
    requested_mode: LandValueMode,
}

impl<Z, P, A, T> FeasibilityEngine<Z, P, A, T>
where
    Z: ZoningSource,
    P: ProfileSource,
    A: ParcelSource,
    T: TransactionSource,
{
    pub fn new(zoning: Z, profiles: P, parcels: A, transactions: T, defaults: EngineDefaults) -> Self {
        Self {
            zoning,
            profiles,
            parcels,
            transactions,
            defaults,
        }
    }

    pub fn defaults(&self) -> &EngineDefaults {
        &self.defaults
    }

    pub async fn evaluate(&self, request: FeasibilityRequest) -> Result<FeasibilityResponse> {
        self.evaluate_as_of(request, Utc::now().date_naive()).await
    }

    /// Same as [`evaluate`](Self::evaluate) with an explicit reference date
    /// for the comparables age window.
    pub async fn evaluate_as_of(
        &self,
        request: FeasibilityRequest,
        as_of: NaiveDate,
    ) -> Result<FeasibilityResponse> {
        // 結構不合法直接回報，不做任何計算
        let request = request.into_validated()?;

        let mut context = EvaluationContext {
            parcel_id: request.parcel.id.clone(),
            zone: request.zoning.as_ref().and_then(|z| z.zone_code.clone()),
            requested_mode: request.land_value.mode,
        };

        tracing::info!(
            parcel_id = %context.parcel_id,
            requested_mode = %context.requested_mode,
            "🏗️ Starting feasibility evaluation"
        );

        let result = self.compute(&request, as_of, &mut context).await;

        match &result {
            Ok(response) => tracing::info!(
                parcel_id = %context.parcel_id,
                mode_used = %response.bilan.land_value.mode_used,
                fallback = response.bilan.land_value.fallback,
                "✅ Feasibility evaluation completed"
            ),
            Err(e) => {
                let zone = context.zone.as_deref().unwrap_or("unknown");
                match e.category() {
                    ErrorCategory::External | ErrorCategory::Internal => tracing::error!(
                        parcel_id = %context.parcel_id,
                        zone = %zone,
                        requested_mode = %context.requested_mode,
                        "❌ Feasibility evaluation failed: {}",
                        e
                    ),
                    _ => tracing::warn!(
                        parcel_id = %context.parcel_id,
                        zone = %zone,
                        requested_mode = %context.requested_mode,
                        "⚠️ Feasibility evaluation rejected: {}",
                        e
                    ),
                }
            }
        }

        result
    }

    async fn compute(
        &self,
        request: &ValidatedRequest,
        as_of: NaiveDate,
        context: &mut EvaluationContext,
    ) -> Result<FeasibilityResponse> {
        let parcel_id = request.parcel.id.as_str();
        let mut annotations = Vec::new();

        let terrain_area_m2 = self.resolve_terrain_area(request).await?;
        let zoning = self.resolve_zoning(parcel_id, request.zoning.as_ref()).await?;
        context.zone = zoning.zone_code.clone();

        // 兩個唯讀查詢彼此無順序依賴，並行發出
        let (profile_lookup, market) = tokio::join!(
            self.lookup_profile(request.financing.profile_id.as_deref()),
            self.lookup_market(request, terrain_area_m2, as_of),
        );

        let resolved_profile = resolve_profile(
            request.financing.profile_id.as_deref(),
            profile_lookup,
            &self.defaults.default_profile(),
            request.financing.overrides.as_ref(),
        )?;
        if let Some(annotation) = resolved_profile.annotation.clone() {
            tracing::warn!(parcel_id = %parcel_id, "⚠️ {}", annotation.message);
            annotations.push(annotation);
        }
        let profile = &resolved_profile.profile;

        let envelope = resolve_envelope(terrain_area_m2, &zoning, &request.project, &self.defaults)?;
        if !envelope.defaulted_fields.is_empty() {
            let message = format!(
                "Zoning fields unknown, documented defaults used: {}",
                envelope.defaulted_fields.join(", ")
            );
            tracing::warn!(parcel_id = %parcel_id, "⚠️ {}", message);
            annotations.push(Annotation::new(AnnotationCode::ZoningFieldsDefaulted, message));
        }
        if envelope.density_limited {
            annotations.push(Annotation::new(
                AnnotationCode::DensityLimited,
                format!(
                    "Floor area capped by density coefficient at {:.2} m²",
                    envelope.total_floor_area_m2
                ),
            ));
        }
        tracing::debug!(
            footprint_m2 = envelope.footprint_m2,
            levels = envelope.levels,
            total_floor_area_m2 = envelope.total_floor_area_m2,
            "Envelope resolved"
        );

        let revenue_cost = compute_revenue_cost(&envelope.floor_area_by_use, profile);
        let residual = residual_value(
            revenue_cost.revenue_total,
            profile.target_margin_ratio,
            revenue_cost.cost_excluding_land,
        );

        let land = LandValueState::start(request.land_value.mode).resolve(&LandValueInputs {
            residual,
            declared: request.land_value.declared_value,
            market,
        })?;
        if let Some(fallback) = &land.fallback {
            let message = format!(
                "Land value mode '{}' unresolved ({:?}); residual value {:.2} substituted",
                fallback.from, fallback.reason, fallback.substituted_value
            );
            tracing::warn!(parcel_id = %parcel_id, "⚠️ {}", message);
            annotations.push(Annotation::new(AnnotationCode::MarketFallback, message));
        }

        let bilan = aggregate(
            &envelope,
            &revenue_cost,
            &land,
            request.land_value.declared_value,
            residual,
            profile.target_margin_ratio,
            &self.defaults,
        );

        Ok(FeasibilityResponse {
            envelope: envelope.rounded(),
            bilan: bilan.rounded(),
            profile: resolved_profile.provenance,
            annotations,
            computed_at: Utc::now(),
        })
    }

    async fn resolve_terrain_area(&self, request: &ValidatedRequest) -> Result<f64> {
        if let Some(area) = request.parcel.terrain_area_m2 {
            return Ok(area);
        }

        // 呼叫端未提供才查地籍
        let parcel_id = &request.parcel.id;
        match self.parcels.terrain_area(parcel_id).await? {
            Some(area) if area.is_finite() && area > 0.0 => Ok(area),
            Some(area) => Err(FeasibilityError::invalid_input(
                "parcel.terrain_area_m2",
                area,
                "Terrain area from the parcel source must be > 0",
            )),
            None => Err(FeasibilityError::TerrainAreaUnresolved {
                parcel_id: parcel_id.clone(),
            }),
        }
    }

    async fn resolve_zoning(
        &self,
        parcel_id: &str,
        supplied: Option<&ZoningEnvelope>,
    ) -> Result<ZoningEnvelope> {
        let looked_up = self.zoning.envelope_for_parcel(parcel_id).await?;

        match (looked_up, supplied) {
            (Some(found), Some(over)) => Ok(found.overlaid_with(over)),
            (Some(found), None) => Ok(found),
            (None, Some(over)) => Ok(over.clone()),
            (None, None) => Err(FeasibilityError::ZoningNotFound {
                parcel_id: parcel_id.to_string(),
            }),
        }
    }

    async fn lookup_profile(&self, profile_id: Option<&str>) -> ProfileLookup {
        let Some(name) = profile_id else {
            return ProfileLookup::NotRequested;
        };

        match self.profiles.profile_by_name(name).await {
            Ok(Some(profile)) => ProfileLookup::Found(profile),
            Ok(None) => ProfileLookup::Missing,
            Err(e) => ProfileLookup::Failed(e.to_string()),
        }
    }

    /// 只有 market 模式才查詢成交資料
    async fn lookup_market(
        &self,
        request: &ValidatedRequest,
        terrain_area_m2: f64,
        as_of: NaiveDate,
    ) -> MarketEvidence {
        if request.land_value.mode != LandValueMode::Market {
            return MarketEvidence::NotQueried;
        }

        let settings = &self.defaults.comparables;
        let prefix = match &request.land_value.area_prefix {
            Some(prefix) => prefix.trim().to_string(),
            None => area_prefix(&request.parcel.id, settings.area_prefix_length),
        };

        match self.transactions.transactions_by_prefix(&prefix).await {
            Ok(records) => {
                tracing::debug!(
                    area_prefix = %prefix,
                    records = records.len(),
                    "Comparable transactions fetched"
                );
                MarketEvidence::Evaluated(evaluate_market(
                    &records,
                    settings,
                    &prefix,
                    terrain_area_m2,
                    as_of,
                ))
            }
            Err(e) => {
                tracing::warn!(area_prefix = %prefix, "⚠️ Comparables source unavailable: {}", e);
                MarketEvidence::SourceUnavailable {
                    meta: unavailable_meta(&prefix, settings),
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryParcels, InMemoryProfiles, InMemoryTransactions, InMemoryZoning,
    };
    use crate::domain::bilan::{AppreciationBand, ProfileSourceKind};
    use crate::domain::model::{
        FinancingSection, LandValueRequest, ParcelInput, ProjectScenario, ProjectUse,
    };

    type MemoryEngine =
        FeasibilityEngine<InMemoryZoning, InMemoryProfiles, InMemoryParcels, InMemoryTransactions>;

    fn engine() -> MemoryEngine {
        FeasibilityEngine::new(
            InMemoryZoning::default(),
            InMemoryProfiles::default(),
            InMemoryParcels::default(),
            InMemoryTransactions::default(),
            EngineDefaults::default(),
        )
    }

    fn request(mode: LandValueMode) -> FeasibilityRequest {
        FeasibilityRequest {
            parcel: Some(ParcelInput {
                id: "69123000AB0042".to_string(),
                terrain_area_m2: Some(500.0),
            }),
            zoning: Some(ZoningEnvelope {
                zone_code: Some("UB".to_string()),
                footprint_ratio: Some(0.6),
                max_height_m: Some(15.0),
                ..Default::default()
            }),
            project: Some(ProjectScenario {
                dominant_use: ProjectUse::Residential,
                scenario: Default::default(),
            }),
            financing: None,
            land_value: Some(LandValueRequest {
                mode,
                ..Default::default()
            }),
        }
    }

    #[tokio::test]
    async fn test_residual_mode_margin_equals_target() {
        let response = engine()
            .evaluate(request(LandValueMode::Residual))
            .await
            .unwrap();

        let bilan = &response.bilan;
        assert_eq!(bilan.land_value.value_used, 2_754_000.0);
        assert_eq!(bilan.margin.amount, 918_000.0);
        assert_eq!(bilan.margin.ratio, Some(0.12));
        assert_eq!(bilan.margin.band, Some(AppreciationBand::Comfortable));
        assert_eq!(response.profile.source, ProfileSourceKind::Default);
    }

    #[tokio::test]
    async fn test_zoning_not_found() {
        let mut req = request(LandValueMode::None);
        req.zoning = None;
        let err = engine().evaluate(req).await.unwrap_err();
        assert!(matches!(err, FeasibilityError::ZoningNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_terrain_area_from_parcel_source() {
        let engine = FeasibilityEngine::new(
            InMemoryZoning::default(),
            InMemoryProfiles::default(),
            InMemoryParcels::default().with_parcel("69123000AB0042", 500.0),
            InMemoryTransactions::default(),
            EngineDefaults::default(),
        );
        let mut req = request(LandValueMode::None);
        req.parcel.as_mut().unwrap().terrain_area_m2 = None;

        let response = engine.evaluate(req).await.unwrap();
        assert_eq!(response.envelope.terrain_area_m2, 500.0);
        assert_eq!(response.bilan.costs.land, 0.0);
    }

    #[tokio::test]
    async fn test_unresolved_terrain_area() {
        let mut req = request(LandValueMode::None);
        req.parcel.as_mut().unwrap().terrain_area_m2 = None;
        let err = engine().evaluate(req).await.unwrap_err();
        assert!(matches!(err, FeasibilityError::TerrainAreaUnresolved { .. }));
    }

    #[tokio::test]
    async fn test_unknown_profile_is_annotated_not_raised() {
        let mut req = request(LandValueMode::Residual);
        req.financing = Some(FinancingSection {
            profile_id: Some("atlantis".to_string()),
            overrides: None,
        });
        let response = engine().evaluate(req).await.unwrap();
        assert_eq!(response.profile.source, ProfileSourceKind::DefaultAfterMiss);
        assert!(response.has_annotation(AnnotationCode::ProfileNotFound));
    }
}
