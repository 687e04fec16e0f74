// Adapters layer: concrete collaborators (in-memory, parcel directory, DVF CSV, HTTP API).

pub mod csv_transactions;
pub mod http_transactions;
pub mod json_directory;
pub mod memory;

use crate::config::toml_config::SourcesConfig;
use crate::domain::model::{TransactionRecord, ZoningEnvelope};
use crate::domain::ports::{ParcelSource, TransactionSource, ZoningSource};
use crate::utils::error::Result;
use async_trait::async_trait;

pub use csv_transactions::CsvTransactionSource;
pub use http_transactions::HttpTransactionSource;
pub use json_directory::JsonParcelDirectory;

/// 依 `[sources]` 設定選擇的地籍來源；未設定則一律查無
#[derive(Debug, Clone)]
pub enum ParcelBackend {
    Directory(JsonParcelDirectory),
    Empty,
}

impl ParcelBackend {
    pub fn from_sources(sources: &SourcesConfig) -> Result<Self> {
        match &sources.parcel_directory {
            Some(path) => Ok(Self::Directory(JsonParcelDirectory::from_file(path)?)),
            None => Ok(Self::Empty),
        }
    }
}

#[async_trait]
impl ZoningSource for ParcelBackend {
    async fn envelope_for_parcel(&self, parcel_id: &str) -> Result<Option<ZoningEnvelope>> {
        match self {
            Self::Directory(directory) => directory.envelope_for_parcel(parcel_id).await,
            Self::Empty => Ok(None),
        }
    }
}

#[async_trait]
impl ParcelSource for ParcelBackend {
    async fn terrain_area(&self, parcel_id: &str) -> Result<Option<f64>> {
        match self {
            Self::Directory(directory) => directory.terrain_area(parcel_id).await,
            Self::Empty => Ok(None),
        }
    }
}

/// 依 `[sources]` 設定選擇的成交資料來源；未設定則樣本為空（market 模式會回退）
#[derive(Debug, Clone)]
pub enum TransactionBackend {
    Csv(CsvTransactionSource),
    Http(HttpTransactionSource),
    Empty,
}

impl TransactionBackend {
    pub fn from_sources(sources: &SourcesConfig) -> Result<Self> {
        if let Some(endpoint) = &sources.transactions_endpoint {
            return Ok(Self::Http(HttpTransactionSource::new(
                endpoint,
                sources.request_timeout_seconds,
            )?));
        }
        match &sources.transactions_csv {
            Some(path) => Ok(Self::Csv(CsvTransactionSource::new(path))),
            None => Ok(Self::Empty),
        }
    }
}

#[async_trait]
impl TransactionSource for TransactionBackend {
    async fn transactions_by_prefix(&self, area_prefix: &str) -> Result<Vec<TransactionRecord>> {
        match self {
            Self::Csv(source) => source.transactions_by_prefix(area_prefix).await,
            Self::Http(source) => source.transactions_by_prefix(area_prefix).await,
            Self::Empty => Ok(Vec::new()),
        }
    }
}
