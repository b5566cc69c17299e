use clap::Parser;
use paper_digest::app::build_engine;
use paper_digest::config::cli::LogFormat;
use paper_digest::domain::recency::SystemClock;
use paper_digest::utils::error::{DigestError, ErrorSeverity};
use paper_digest::utils::{logger, validation::Validate};
use paper_digest::{CliConfig, DigestEngine, DigestSettings, LocalStorage, TomlConfig};
use std::sync::Arc;

fn load_settings(cli: &CliConfig) -> Result<DigestSettings, DigestError> {
    let mut settings = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            TomlConfig::from_file(path)?.into_settings()
        }
        None => DigestSettings::default(),
    };

    cli.apply_to(&mut settings);
    // 金鑰只在啟動時讀一次
    settings.resolve_api_key()?;
    settings.validate()?;
    Ok(settings)
}

fn exit_with(e: &DigestError) -> ! {
    tracing::error!(
        "❌ Digest run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("🚀 Starting paper-digest");

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            exit_with(&e);
        }
    };
    if cli.verbose {
        tracing::debug!("Settings: {:?}", settings);
    }
    if settings.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(
        settings
            .output_path
            .clone()
            .unwrap_or_else(|| ".".to_string()),
    );
    let execution_id = format!("digest-{}", chrono::Local::now().format("%Y%m%d%H%M%S"));
    let engine = build_engine(&settings, storage, Arc::new(SystemClock), execution_id);

    tracing::info!("📋 {} topic(s) queued", engine.len());

    match engine.run().await {
        Ok(results) => {
            let summary = DigestEngine::execution_summary(&results);
            tracing::info!("✅ Digest run completed successfully!");
            tracing::info!("📊 Execution summary: {}", serde_json::json!(summary));
        }
        Err(e) => exit_with(&e),
    }
}
