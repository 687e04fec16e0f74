use crate::domain::model::{FinancingProfile, TransactionRecord, ZoningEnvelope};
use crate::domain::ports::{ParcelSource, ProfileSource, TransactionSource, ZoningSource};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct InMemoryZoning {
    envelopes: HashMap<String, ZoningEnvelope>,
}

impl InMemoryZoning {
    pub fn with_envelope(mut self, parcel_id: &str, envelope: ZoningEnvelope) -> Self {
        self.envelopes.insert(parcel_id.to_string(), envelope);
        self
    }
}

#[async_trait]
impl ZoningSource for InMemoryZoning {
    async fn envelope_for_parcel(&self, parcel_id: &str) -> Result<Option<ZoningEnvelope>> {
        Ok(self.envelopes.get(parcel_id).cloned())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryProfiles {
    profiles: HashMap<String, FinancingProfile>,
}

impl InMemoryProfiles {
    pub fn with_profile(mut self, profile: FinancingProfile) -> Self {
        self.profiles.insert(profile.name.clone(), profile);
        self
    }
}

#[async_trait]
impl ProfileSource for InMemoryProfiles {
    async fn profile_by_name(&self, name: &str) -> Result<Option<FinancingProfile>> {
        Ok(self.profiles.get(name).cloned())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryParcels {
    areas: HashMap<String, f64>,
}

impl InMemoryParcels {
    pub fn with_parcel(mut self, parcel_id: &str, terrain_area_m2: f64) -> Self {
        self.areas.insert(parcel_id.to_string(), terrain_area_m2);
        self
    }
}

#[async_trait]
impl ParcelSource for InMemoryParcels {
    async fn terrain_area(&self, parcel_id: &str) -> Result<Option<f64>> {
        Ok(self.areas.get(parcel_id).copied())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTransactions {
    records: Vec<TransactionRecord>,
}

impl InMemoryTransactions {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl TransactionSource for InMemoryTransactions {
    async fn transactions_by_prefix(&self, area_prefix: &str) -> Result<Vec<TransactionRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.commune_code.starts_with(area_prefix))
            .cloned()
            .collect())
    }
}
