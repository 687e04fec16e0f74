use crate::config::defaults::{EngineDefaults, EngineDefaultsPatch};
use crate::core::financing::validate_profile;
use crate::domain::merge::DeepMerge;
use crate::domain::model::{FinancingOverrides, FinancingProfile};
use crate::domain::ports::ProfileSource;
use crate::utils::error::{FeasibilityError, Result};
use crate::utils::validation::{validate_path, validate_positive, validate_url, Validate};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Engine configuration file.
///
/// ```toml
/// [defaults]
/// efficiency = 0.82
///
/// [defaults.comparables]
/// min_sample = 30
///
/// [profiles.lyon_centre]
/// target_margin_ratio = 0.10
/// [profiles.lyon_centre.sale_price_m2]
/// residential = 5200
///
/// [sources]
/// parcel_directory = "./data/parcels.json"
/// transactions_csv = "./data/dvf_69.csv"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub defaults: Option<EngineDefaultsPatch>,
    /// 具名財務設定檔：以內建預設為底的 patch
    #[serde(default)]
    pub profiles: HashMap<String, FinancingOverrides>,
    pub sources: Option<SourcesConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    pub parcel_directory: Option<String>,
    pub transactions_csv: Option<String>,
    pub transactions_endpoint: Option<String>,
    pub request_timeout_seconds: Option<u64>,
}

impl EngineConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FeasibilityError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FeasibilityError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DVF_ENDPOINT})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FeasibilityError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 內建常數套上 `[defaults]` 後的結果
    pub fn engine_defaults(&self) -> EngineDefaults {
        match &self.defaults {
            Some(patch) => EngineDefaults::default().merged(patch),
            None => EngineDefaults::default(),
        }
    }

    /// 以內建預設為底，套上具名 patch
    pub fn catalog_profile(&self, name: &str) -> Option<FinancingProfile> {
        self.profiles.get(name).map(|patch| {
            let mut profile = self.engine_defaults().default_profile().merged(patch);
            profile.name = name.to_string();
            profile
        })
    }

    pub fn sources(&self) -> SourcesConfig {
        self.sources.clone().unwrap_or_default()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        self.engine_defaults().validate()?;

        let mut names: Vec<&String> = self.profiles.keys().collect();
        names.sort();
        for name in names {
            if let Some(profile) = self.catalog_profile(name) {
                validate_profile(&profile, &format!("profiles.{}", name))?;
            }
        }

        let sources = self.sources();
        if let Some(path) = &sources.parcel_directory {
            validate_path("sources.parcel_directory", path)?;
        }
        if let Some(path) = &sources.transactions_csv {
            validate_path("sources.transactions_csv", path)?;
        }
        if let Some(endpoint) = &sources.transactions_endpoint {
            validate_url("sources.transactions_endpoint", endpoint)?;
        }
        if sources.transactions_csv.is_some() && sources.transactions_endpoint.is_some() {
            return Err(FeasibilityError::ConfigValidationError {
                field: "sources".to_string(),
                message: "Set either transactions_csv or transactions_endpoint, not both"
                    .to_string(),
            });
        }
        if let Some(timeout) = sources.request_timeout_seconds {
            validate_positive("sources.request_timeout_seconds", timeout as f64)?;
        }

        Ok(())
    }
}

impl Validate for EngineConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[async_trait]
impl ProfileSource for EngineConfig {
    async fn profile_by_name(&self, name: &str) -> Result<Option<FinancingProfile>> {
        Ok(self.catalog_profile(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_profiles_and_defaults() {
        let toml_content = r#"
[defaults]
efficiency = 0.8

[defaults.comparables]
min_sample = 12

[profiles.lyon_centre]
target_margin_ratio = 0.10

[profiles.lyon_centre.sale_price_m2]
residential = 5200

[profiles.lyon_centre.fees]
tax = 0.0
"#;

        let config = EngineConfig::from_toml_str(toml_content).unwrap();
        let defaults = config.engine_defaults();
        assert_eq!(defaults.efficiency, 0.8);
        assert_eq!(defaults.comparables.min_sample, 12);
        assert_eq!(defaults.footprint_ratio, 0.6);

        let profile = config.catalog_profile("lyon_centre").unwrap();
        assert_eq!(profile.name, "lyon_centre");
        assert_eq!(profile.sale_price_m2.residential, 5200.0);
        assert_eq!(profile.sale_price_m2.commercial, 4000.0);
        assert_eq!(profile.fees.tax, 0.0);
        assert_eq!(profile.fees.honoraria, 0.05);
        assert_eq!(profile.target_margin_ratio, 0.10);
        assert!(config.catalog_profile("unknown").is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_FEASIBILITY_DVF_ENDPOINT", "https://dvf.example.com/api");

        let toml_content = r#"
[sources]
transactions_endpoint = "${TEST_FEASIBILITY_DVF_ENDPOINT}"
"#;

        let config = EngineConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.sources().transactions_endpoint.as_deref(),
            Some("https://dvf.example.com/api")
        );

        std::env::remove_var("TEST_FEASIBILITY_DVF_ENDPOINT");
    }

    #[test]
    fn test_unknown_profile_key_is_rejected() {
        let toml_content = r#"
[profiles.typo]
target_margin = 0.10
"#;
        assert!(EngineConfig::from_toml_str(toml_content).is_err());
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[sources]
transactions_endpoint = "invalid-url"
"#;
        let config = EngineConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let toml_content = r#"
[profiles.broken.fees]
honoraria = 1.5
"#;
        let config = EngineConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[defaults]
max_height_m = 12.0
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = EngineConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.engine_defaults().max_height_m, 12.0);
    }

    #[tokio::test]
    async fn test_profile_source_lookup() {
        let config = EngineConfig::from_toml_str("[profiles.premium]\ntarget_margin_ratio = 0.2\n")
            .unwrap();
        let found = config.profile_by_name("premium").await.unwrap();
        assert_eq!(found.unwrap().target_margin_ratio, 0.2);
        assert!(config.profile_by_name("missing").await.unwrap().is_none());
    }
}
