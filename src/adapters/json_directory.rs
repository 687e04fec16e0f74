use crate::domain::model::ZoningEnvelope;
use crate::domain::ports::{ParcelSource, ZoningSource};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 地籍目錄中的單筆地號
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParcelEntry {
    pub terrain_area_m2: Option<f64>,
    pub zoning: Option<ZoningEnvelope>,
}

/// Parcel directory loaded from a JSON file:
///
/// ```json
/// { "parcels": { "69123000AB0042": { "terrain_area_m2": 500, "zoning": { "zone_code": "UB" } } } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonParcelDirectory {
    #[serde(default)]
    parcels: HashMap<String, ParcelEntry>,
}

impl JsonParcelDirectory {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let directory: Self = serde_json::from_str(content)?;
        tracing::debug!("Loaded parcel directory with {} parcels", directory.parcels.len());
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.parcels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty()
    }
}

#[async_trait]
impl ZoningSource for JsonParcelDirectory {
    async fn envelope_for_parcel(&self, parcel_id: &str) -> Result<Option<ZoningEnvelope>> {
        Ok(self
            .parcels
            .get(parcel_id)
            .and_then(|entry| entry.zoning.clone()))
    }
}

#[async_trait]
impl ParcelSource for JsonParcelDirectory {
    async fn terrain_area(&self, parcel_id: &str) -> Result<Option<f64>> {
        Ok(self
            .parcels
            .get(parcel_id)
            .and_then(|entry| entry.terrain_area_m2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DIRECTORY: &str = r#"{
        "parcels": {
            "69123000AB0042": {
                "terrain_area_m2": 500,
                "zoning": { "zone_code": "UB", "footprint_ratio": 0.5, "max_height_m": 12 }
            },
            "69123000AB0043": { "terrain_area_m2": 220 }
        }
    }"#;

    #[tokio::test]
    async fn test_lookup_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(DIRECTORY.as_bytes()).unwrap();

        let directory = JsonParcelDirectory::from_file(temp_file.path()).unwrap();
        assert_eq!(directory.len(), 2);

        let zoning = directory
            .envelope_for_parcel("69123000AB0042")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(zoning.zone_code.as_deref(), Some("UB"));
        assert_eq!(zoning.footprint_ratio, Some(0.5));

        assert!(directory
            .envelope_for_parcel("69123000AB0043")
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            directory.terrain_area("69123000AB0043").await.unwrap(),
            Some(220.0)
        );
        assert_eq!(directory.terrain_area("unknown").await.unwrap(), None);
    }

    #[test]
    fn test_malformed_zoning_rejected() {
        let content = r#"{ "parcels": { "x": { "zoning": { "footprint": 0.5 } } } }"#;
        assert!(JsonParcelDirectory::from_json_str(content).is_err());
    }
}
