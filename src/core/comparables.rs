//! Market-comparables land value: median €/m² of recent bare-land sales in
//! the same administrative area, applied to the subject terrain area.

use crate::config::defaults::ComparablesSettings;
use crate::domain::bilan::{MarketSampleMeta, UnresolvedReason};
use crate::domain::model::TransactionRecord;
use chrono::{Months, NaiveDate};

#[derive(Debug, Clone, PartialEq)]
pub enum MarketOutcome {
    Resolved { value: f64, meta: MarketSampleMeta },
    Unresolved { meta: MarketSampleMeta },
}

impl MarketOutcome {
    pub fn meta(&self) -> &MarketSampleMeta {
        match self {
            Self::Resolved { meta, .. } | Self::Unresolved { meta } => meta,
        }
    }
}

/// Statistical median: ascending sort; odd count → central value, even
/// count → mean of the two central values. `None` for an empty sample.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// 取地號前 N 碼作為行政區前綴（字元數，非位元組）
pub fn area_prefix(parcel_id: &str, length: usize) -> String {
    parcel_id.trim().chars().take(length).collect()
}

/// 價格 ÷ 土地面積；不符合篩選條件的交易回傳 None
pub fn eligible_price_m2(
    record: &TransactionRecord,
    settings: &ComparablesSettings,
    as_of: NaiveDate,
) -> Option<f64> {
    if !record.is_bare_land() {
        return None;
    }
    let area = record.terrain_area_m2.filter(|a| *a > 0.0 && *a <= settings.max_terrain_area_m2)?;
    let price = record.price.filter(|p| *p > 0.0)?;

    if let (Some(years), Some(date)) = (settings.max_age_years, record.date) {
        let oldest = as_of
            .checked_sub_months(Months::new(years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        if date < oldest {
            return None;
        }
    }

    Some(price / area)
}

pub fn evaluate_market(
    records: &[TransactionRecord],
    settings: &ComparablesSettings,
    area_prefix: &str,
    subject_terrain_m2: f64,
    as_of: NaiveDate,
) -> MarketOutcome {
    let ratios: Vec<f64> = records
        .iter()
        .filter_map(|record| eligible_price_m2(record, settings, as_of))
        .collect();
    let records_eligible = ratios.len();

    let retained: Vec<f64> = ratios
        .into_iter()
        .filter(|ratio| *ratio >= settings.min_price_m2 && *ratio <= settings.max_price_m2)
        .collect();

    let mut meta = MarketSampleMeta {
        area_prefix: area_prefix.to_string(),
        records_fetched: records.len(),
        records_eligible,
        discarded_out_of_band: records_eligible - retained.len(),
        records_retained: retained.len(),
        min_sample: settings.min_sample,
        median_price_m2: None,
        resolved: false,
        reason: None,
    };

    if retained.len() < settings.min_sample {
        meta.reason = Some(UnresolvedReason::InsufficientSample);
        return MarketOutcome::Unresolved { meta };
    }

    match median(&retained) {
        Some(median_price_m2) => {
            meta.median_price_m2 = Some(median_price_m2);
            meta.resolved = true;
            MarketOutcome::Resolved {
                value: median_price_m2 * subject_terrain_m2,
                meta,
            }
        }
        None => {
            meta.reason = Some(UnresolvedReason::InsufficientSample);
            MarketOutcome::Unresolved { meta }
        }
    }
}

/// 來源無法連線時的樣本描述
pub fn unavailable_meta(area_prefix: &str, settings: &ComparablesSettings) -> MarketSampleMeta {
    MarketSampleMeta {
        area_prefix: area_prefix.to_string(),
        records_fetched: 0,
        records_eligible: 0,
        discarded_out_of_band: 0,
        records_retained: 0,
        min_sample: settings.min_sample,
        median_price_m2: None,
        resolved: false,
        reason: Some(UnresolvedReason::SourceUnavailable),
    }
}
