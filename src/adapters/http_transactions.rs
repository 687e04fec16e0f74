use crate::domain::model::TransactionRecord;
use crate::domain::ports::TransactionSource;
use crate::utils::error::{FeasibilityError, Result};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Transaction source behind an HTTP API:
/// `GET {endpoint}?code_prefix=<prefix>` → JSON array of records.
#[derive(Debug, Clone)]
pub struct HttpTransactionSource {
    endpoint: String,
    client: Client,
}

impl HttpTransactionSource {
    pub fn new(endpoint: &str, timeout_seconds: Option<u64>) -> Result<Self> {
        validate_url("sources.transactions_endpoint", endpoint)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(
                timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            ))
            .build()?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }
}

#[async_trait]
impl TransactionSource for HttpTransactionSource {
    async fn transactions_by_prefix(&self, area_prefix: &str) -> Result<Vec<TransactionRecord>> {
        tracing::debug!("Making API request to: {} (prefix {})", self.endpoint, area_prefix);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("code_prefix", area_prefix)])
            .send()
            .await?;

        tracing::debug!("API response status: {}", response.status());

        if !response.status().is_success() {
            return Err(FeasibilityError::collaborator(
                "transactions_api",
                format!("HTTP {} from {}", response.status(), self.endpoint),
            ));
        }

        let records: Vec<TransactionRecord> = response.json().await?;
        Ok(records)
    }
}
