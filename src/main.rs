use clap::Parser;
use feasibility_engine::utils::error::ErrorSeverity;
use feasibility_engine::utils::{logger, validation::Validate};
use feasibility_engine::{
    CliArgs, EngineConfig, FeasibilityEngine, FeasibilityError, FeasibilityRequest, ParcelBackend,
    TransactionBackend,
};
use std::sync::Arc;

fn exit_code(e: &FeasibilityError) -> i32 {
    // 根據錯誤嚴重程度決定退出碼
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2, // 查無資料，可補輸入後重試
        ErrorSeverity::High => 1,   // 請求或設定錯誤
        ErrorSeverity::Critical => 3, // 外部來源或系統錯誤
    }
}

fn fail(context: &str, e: &FeasibilityError) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e).max(1));
}

fn load_request(path: &str) -> Result<FeasibilityRequest, FeasibilityError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, FeasibilityError> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("Starting feasibility CLI");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    if let Err(e) = args.validate() {
        fail("Argument validation failed", &e);
    }

    // 載入並驗證引擎設定
    let config = match &args.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            EngineConfig::from_file(path).unwrap_or_else(|e| fail("Failed to load config", &e))
        }
        None => EngineConfig::default(),
    };
    if let Err(e) = config.validate() {
        fail("Configuration validation failed", &e);
    }

    let request = load_request(&args.request).unwrap_or_else(|e| fail("Failed to read request", &e));

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No computation will occur");
        if let Err(e) = request.validate() {
            fail("Request validation failed", &e);
        }
        let mut profiles: Vec<&String> = config.profiles.keys().collect();
        profiles.sort();
        let summary = serde_json::json!({
            "defaults": config.engine_defaults(),
            "profiles": profiles,
            "request": request,
        });
        println!("{}", to_json(&summary, args.pretty)?);
        return Ok(());
    }

    // 依設定建立外部協作者
    let sources = config.sources();
    let parcels = Arc::new(
        ParcelBackend::from_sources(&sources)
            .unwrap_or_else(|e| fail("Failed to open parcel directory", &e)),
    );
    let transactions = TransactionBackend::from_sources(&sources)
        .unwrap_or_else(|e| fail("Failed to set up transaction source", &e));
    let defaults = config.engine_defaults();

    let engine = FeasibilityEngine::new(parcels.clone(), config, parcels, transactions, defaults);

    match engine.evaluate(request).await {
        Ok(response) => {
            for annotation in &response.annotations {
                tracing::info!("📝 {:?}: {}", annotation.code, annotation.message);
            }
            println!("{}", to_json(&response, args.pretty)?);
        }
        Err(e) => fail("Feasibility evaluation failed", &e),
    }

    Ok(())
}
