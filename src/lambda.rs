#[cfg(feature = "lambda")]
use feasibility_engine::utils::logger;
#[cfg(feature = "lambda")]
use feasibility_engine::{
    EngineConfig, FeasibilityEngine, FeasibilityRequest, FeasibilityResponse, ParcelBackend,
    TransactionBackend,
};
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use std::sync::Arc;

#[cfg(feature = "lambda")]
fn load_config() -> Result<EngineConfig, Error> {
    // 未指定設定檔時使用內建預設
    let config = match std::env::var("FEASIBILITY_CONFIG") {
        Ok(path) => EngineConfig::from_file(&path)?,
        Err(_) => EngineConfig::default(),
    };
    feasibility_engine::utils::validation::Validate::validate(&config)?;
    Ok(config)
}

#[cfg(feature = "lambda")]
async fn function_handler(
    event: LambdaEvent<FeasibilityRequest>,
) -> Result<FeasibilityResponse, Error> {
    tracing::info!("Starting feasibility Lambda function");

    let config = load_config()?;
    let sources = config.sources();
    let parcels = Arc::new(ParcelBackend::from_sources(&sources)?);
    let transactions = TransactionBackend::from_sources(&sources)?;
    let defaults = config.engine_defaults();

    let engine = FeasibilityEngine::new(parcels.clone(), config, parcels, transactions, defaults);
    let response = engine.evaluate(event.payload).await.map_err(|e| {
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        Box::new(e) as Box<dyn std::error::Error + Send + Sync>
    })?;

    tracing::info!("Feasibility Lambda function completed successfully");
    Ok(response)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}

#[cfg(not(feature = "lambda"))]
fn main() {}
