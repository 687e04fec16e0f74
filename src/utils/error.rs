use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeasibilityError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required request section: {section}")]
    MissingSection { section: String },

    #[error("Terrain area could not be resolved for parcel {parcel_id}")]
    TerrainAreaUnresolved { parcel_id: String },

    #[error("No zoning envelope found for parcel {parcel_id}")]
    ZoningNotFound { parcel_id: String },

    #[error("Collaborator '{collaborator}' failed: {message}")]
    Collaborator {
        collaborator: String,
        message: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    NotFound,
    External,
    Configuration,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FeasibilityError {
    pub fn invalid_input(field: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn collaborator(collaborator: &str, message: impl Into<String>) -> Self {
        Self::Collaborator {
            collaborator: collaborator.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. }
            | Self::MissingSection { .. }
            | Self::TerrainAreaUnresolved { .. }
            | Self::SerializationError(_) => ErrorCategory::Input,
            Self::ZoningNotFound { .. } => ErrorCategory::NotFound,
            Self::HttpError(_) | Self::Collaborator { .. } | Self::CsvError(_) => {
                ErrorCategory::External
            }
            Self::ConfigError { .. } | Self::ConfigValidationError { .. } => {
                ErrorCategory::Configuration
            }
            Self::IoError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 呼叫端可補資料後重試
            ErrorCategory::NotFound => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::External | ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    /// 是否為「查無資料」類錯誤，呼叫端可改為手動輸入
    pub fn is_not_found(&self) -> bool {
        matches!(self.category(), ErrorCategory::NotFound)
            || matches!(self, Self::TerrainAreaUnresolved { .. })
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::InvalidInput { field, .. } => {
                format!("Check the value of '{}' in the request", field)
            }
            Self::MissingSection { section } => {
                format!("Add the '{}' section to the request", section)
            }
            Self::TerrainAreaUnresolved { .. } => {
                "Provide parcel.terrain_area_m2 explicitly in the request".to_string()
            }
            Self::ZoningNotFound { .. } => {
                "Supply the zoning envelope manually in the request's 'zoning' section".to_string()
            }
            Self::Collaborator { collaborator, .. } => {
                format!("Check that the '{}' source is reachable and retry", collaborator)
            }
            Self::HttpError(_) => "Check the transaction API endpoint and network".to_string(),
            Self::CsvError(_) => "Check the transaction CSV export format".to_string(),
            Self::SerializationError(_) => "Check that the request is valid JSON".to_string(),
            Self::ConfigError { .. } | Self::ConfigValidationError { .. } => {
                "Check the engine configuration file".to_string()
            }
            Self::IoError(_) => "Check file paths and permissions".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("The request is invalid: {}", self),
            ErrorCategory::NotFound => format!("Missing zoning data: {}", self),
            ErrorCategory::External => format!("An external data source failed: {}", self),
            ErrorCategory::Configuration => format!("The configuration is invalid: {}", self),
            ErrorCategory::Internal => format!("Internal error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, FeasibilityError>;
