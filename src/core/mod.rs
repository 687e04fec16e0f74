pub mod aggregator;
pub mod comparables;
pub mod engine;
pub mod envelope;
pub mod financing;
pub mod land_value;
pub mod request;
pub mod revenue;

pub use crate::domain::bilan::{BuildableEnvelopeResult, FeasibilityBilan, FeasibilityResponse};
pub use crate::domain::model::FeasibilityRequest;
pub use crate::domain::ports::{ParcelSource, ProfileSource, TransactionSource, ZoningSource};
pub use crate::utils::error::Result;
