use crate::domain::model::{FinancingProfile, TransactionRecord, ZoningEnvelope};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

// 外部協作者。`Ok(None)` 代表乾淨的查無資料，`Err` 代表來源本身失敗。

#[async_trait]
pub trait ZoningSource: Send + Sync {
    async fn envelope_for_parcel(&self, parcel_id: &str) -> Result<Option<ZoningEnvelope>>;
}

#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn profile_by_name(&self, name: &str) -> Result<Option<FinancingProfile>>;
}

#[async_trait]
pub trait ParcelSource: Send + Sync {
    async fn terrain_area(&self, parcel_id: &str) -> Result<Option<f64>>;
}

#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Transactions whose commune code starts with `area_prefix`.
    async fn transactions_by_prefix(&self, area_prefix: &str) -> Result<Vec<TransactionRecord>>;
}

#[async_trait]
impl<T: ZoningSource + ?Sized> ZoningSource for Arc<T> {
    async fn envelope_for_parcel(&self, parcel_id: &str) -> Result<Option<ZoningEnvelope>> {
        (**self).envelope_for_parcel(parcel_id).await
    }
}

#[async_trait]
impl<T: ProfileSource + ?Sized> ProfileSource for Arc<T> {
    async fn profile_by_name(&self, name: &str) -> Result<Option<FinancingProfile>> {
        (**self).profile_by_name(name).await
    }
}

#[async_trait]
impl<T: ParcelSource + ?Sized> ParcelSource for Arc<T> {
    async fn terrain_area(&self, parcel_id: &str) -> Result<Option<f64>> {
        (**self).terrain_area(parcel_id).await
    }
}

#[async_trait]
impl<T: TransactionSource + ?Sized> TransactionSource for Arc<T> {
    async fn transactions_by_prefix(&self, area_prefix: &str) -> Result<Vec<TransactionRecord>> {
        (**self).transactions_by_prefix(area_prefix).await
    }
}
