pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use adapters::{ParcelBackend, TransactionBackend};
pub use config::{EngineConfig, EngineDefaults};
pub use crate::core::engine::FeasibilityEngine;
pub use domain::bilan::FeasibilityResponse;
pub use domain::model::FeasibilityRequest;
pub use utils::error::{FeasibilityError, Result};
