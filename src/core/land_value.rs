//! Land value resolution.
//!
//! Resolution is an explicit state machine so that a market → residual
//! fallback is a recorded transition:
//!
//! ```text
//! Resolving{mode} ──────────────────────────────► Resolved{mode}
//!        │ (market requested, market unresolved)
//!        └────► FallingBack{reason} ────────────► Resolved{residual, fallback}
//! ```

use crate::core::comparables::MarketOutcome;
use crate::domain::bilan::{FallbackRecord, MarketSampleMeta, UnresolvedReason};
use crate::domain::model::LandValueMode;
use crate::utils::error::{FeasibilityError, Result};

/// Land price implied by the target margin:
/// `revenue × (1 − target_margin) − cost_excluding_land`.
pub fn residual_value(revenue_total: f64, target_margin_ratio: f64, cost_excluding_land: f64) -> f64 {
    revenue_total * (1.0 - target_margin_ratio) - cost_excluding_land
}

/// 市場比較法的查詢結果
#[derive(Debug, Clone, PartialEq)]
pub enum MarketEvidence {
    /// 非 market 模式時不查詢
    NotQueried,
    Evaluated(MarketOutcome),
    SourceUnavailable { meta: MarketSampleMeta, message: String },
}

#[derive(Debug, Clone)]
pub struct LandValueInputs {
    pub residual: f64,
    pub declared: Option<f64>,
    pub market: MarketEvidence,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLandValue {
    pub requested: LandValueMode,
    pub used: LandValueMode,
    pub value: f64,
    pub fallback: Option<FallbackRecord>,
    pub market_value: Option<f64>,
    pub market_sample: Option<MarketSampleMeta>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LandValueState {
    Resolving {
        requested: LandValueMode,
    },
    FallingBack {
        requested: LandValueMode,
        reason: UnresolvedReason,
        market_sample: Option<MarketSampleMeta>,
    },
    Resolved(ResolvedLandValue),
}

impl LandValueState {
    pub fn start(requested: LandValueMode) -> Self {
        Self::Resolving { requested }
    }

    fn resolved(requested: LandValueMode, used: LandValueMode, value: f64) -> Self {
        Self::Resolved(ResolvedLandValue {
            requested,
            used,
            value,
            fallback: None,
            market_value: None,
            market_sample: None,
        })
    }

    /// One transition.
    pub fn advance(self, inputs: &LandValueInputs) -> Result<Self> {
        match self {
            Self::Resolving { requested } => match requested {
                LandValueMode::Declared => {
                    let declared = inputs.declared.ok_or_else(|| {
                        FeasibilityError::invalid_input(
                            "land_value.declared_value",
                            "null",
                            "Declared mode requires a declared value",
                        )
                    })?;
                    Ok(Self::resolved(requested, LandValueMode::Declared, declared))
                }
                LandValueMode::Residual => {
                    Ok(Self::resolved(requested, LandValueMode::Residual, inputs.residual))
                }
                LandValueMode::None => Ok(Self::resolved(requested, LandValueMode::None, 0.0)),
                LandValueMode::Market => match &inputs.market {
                    MarketEvidence::Evaluated(MarketOutcome::Resolved { value, meta }) => {
                        Ok(Self::Resolved(ResolvedLandValue {
                            requested,
                            used: LandValueMode::Market,
                            value: *value,
                            fallback: None,
                            market_value: Some(*value),
                            market_sample: Some(meta.clone()),
                        }))
                    }
                    MarketEvidence::Evaluated(MarketOutcome::Unresolved { meta }) => {
                        Ok(Self::FallingBack {
                            requested,
                            reason: meta.reason.unwrap_or(UnresolvedReason::InsufficientSample),
                            market_sample: Some(meta.clone()),
                        })
                    }
                    MarketEvidence::SourceUnavailable { meta, .. } => Ok(Self::FallingBack {
                        requested,
                        reason: UnresolvedReason::SourceUnavailable,
                        market_sample: Some(meta.clone()),
                    }),
                    MarketEvidence::NotQueried => Ok(Self::FallingBack {
                        requested,
                        reason: UnresolvedReason::SourceUnavailable,
                        market_sample: None,
                    }),
                },
            },
            Self::FallingBack {
                requested,
                reason,
                market_sample,
            } => Ok(Self::Resolved(ResolvedLandValue {
                requested,
                used: LandValueMode::Residual,
                value: inputs.residual,
                fallback: Some(FallbackRecord {
                    from: requested,
                    to: LandValueMode::Residual,
                    reason,
                    substituted_value: inputs.residual,
                }),
                market_value: None,
                market_sample,
            })),
            resolved @ Self::Resolved(_) => Ok(resolved),
        }
    }

    /// Drive transitions until resolved.
    pub fn resolve(self, inputs: &LandValueInputs) -> Result<ResolvedLandValue> {
        let mut state = self;
        loop {
            state = match state.advance(inputs)? {
                Self::Resolved(resolved) => return Ok(resolved),
                next => next,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(resolved: bool, retained: usize) -> MarketSampleMeta {
        MarketSampleMeta {
            area_prefix: "75056".to_string(),
            records_fetched: retained,
            records_eligible: retained,
            discarded_out_of_band: 0,
            records_retained: retained,
            min_sample: 30,
            median_price_m2: resolved.then_some(1_000.0),
            resolved,
            reason: (!resolved).then_some(UnresolvedReason::InsufficientSample),
        }
    }

    fn inputs(market: MarketEvidence) -> LandValueInputs {
        LandValueInputs {
            residual: 2_754_000.0,
            declared: Some(1_500_000.0),
            market,
        }
    }

    #[test]
    fn test_residual_formula_and_idempotence() {
        let first = residual_value(7_650_000.0, 0.12, 3_978_000.0);
        let second = residual_value(7_650_000.0, 0.12, 3_978_000.0);
        assert_eq!(first, second);
        assert!((first - 2_754_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_declared_mode_uses_value_as_is() {
        let resolved = LandValueState::start(LandValueMode::Declared)
            .resolve(&inputs(MarketEvidence::NotQueried))
            .unwrap();
        assert_eq!(resolved.used, LandValueMode::Declared);
        assert_eq!(resolved.value, 1_500_000.0);
        assert!(resolved.fallback.is_none());
        assert!(resolved.market_sample.is_none());
    }

    #[test]
    fn test_declared_mode_without_value_fails() {
        let mut missing = inputs(MarketEvidence::NotQueried);
        missing.declared = None;
        assert!(LandValueState::start(LandValueMode::Declared)
            .resolve(&missing)
            .is_err());
    }

    #[test]
    fn test_none_mode_is_zero() {
        let resolved = LandValueState::start(LandValueMode::None)
            .resolve(&inputs(MarketEvidence::NotQueried))
            .unwrap();
        assert_eq!(resolved.used, LandValueMode::None);
        assert_eq!(resolved.value, 0.0);
    }

    #[test]
    fn test_market_resolved() {
        let evidence = MarketEvidence::Evaluated(MarketOutcome::Resolved {
            value: 500_000.0,
            meta: sample(true, 42),
        });
        let resolved = LandValueState::start(LandValueMode::Market)
            .resolve(&inputs(evidence))
            .unwrap();
        assert_eq!(resolved.used, LandValueMode::Market);
        assert_eq!(resolved.value, 500_000.0);
        assert_eq!(resolved.market_value, Some(500_000.0));
        assert!(resolved.fallback.is_none());
    }

    #[test]
    fn test_market_fallback_is_an_explicit_transition() {
        let evidence = MarketEvidence::Evaluated(MarketOutcome::Unresolved {
            meta: sample(false, 29),
        });
        let inputs = inputs(evidence);

        let state = LandValueState::start(LandValueMode::Market)
            .advance(&inputs)
            .unwrap();
        assert!(matches!(
            state,
            LandValueState::FallingBack {
                reason: UnresolvedReason::InsufficientSample,
                ..
            }
        ));

        let resolved = match state.advance(&inputs).unwrap() {
            LandValueState::Resolved(resolved) => resolved,
            other => panic!("expected resolved state, got {:?}", other),
        };
        assert_eq!(resolved.requested, LandValueMode::Market);
        assert_eq!(resolved.used, LandValueMode::Residual);
        assert_eq!(resolved.value, 2_754_000.0);
        assert_eq!(resolved.market_value, None);
        let fallback = resolved.fallback.unwrap();
        assert_eq!(fallback.from, LandValueMode::Market);
        assert_eq!(fallback.to, LandValueMode::Residual);
        assert_eq!(fallback.substituted_value, 2_754_000.0);
        assert_eq!(resolved.market_sample.unwrap().records_retained, 29);
    }

    #[test]
    fn test_source_unavailable_falls_back() {
        let evidence = MarketEvidence::SourceUnavailable {
            meta: sample(false, 0),
            message: "connection refused".to_string(),
        };
        let resolved = LandValueState::start(LandValueMode::Market)
            .resolve(&inputs(evidence))
            .unwrap();
        assert_eq!(resolved.used, LandValueMode::Residual);
        assert_eq!(
            resolved.fallback.map(|f| f.reason),
            Some(UnresolvedReason::SourceUnavailable)
        );
    }
}
