use clap::Parser;
use relay_etl::app::runner::describe;
use relay_etl::config::env::{load_dotenv, EnvSource};
use relay_etl::utils::{logger, validation::Validate};
use relay_etl::{run_job, CliConfig, JobConfig, RunMode};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    // .env 先載入，讓 RUST_LOG 與 ${VAR} 替換都能用到
    let env_source = load_dotenv(Some(&args.env_file));

    logger::init_cli_logger(args.verbose, args.log_json);
    tracing::info!("Starting relay-etl");

    match env_source {
        Ok(EnvSource::File(path)) => tracing::info!("🔑 Loaded environment from {}", path.display()),
        Ok(EnvSource::ProcessOnly) => {
            tracing::debug!("No {} file, using process environment", args.env_file.display())
        }
        Err(e) => {
            tracing::error!("❌ {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    }

    tracing::info!("📁 Loading job from: {}", args.config.display());
    let config = match JobConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load job file '{}': {}", args.config.display(), e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    for line in describe(&config) {
        tracing::info!("  {}", line);
    }

    let monitor_enabled = args
        .monitor_override()
        .unwrap_or_else(|| config.monitoring_enabled());
    let mode = if args.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Load
    };

    match run_job(&config, mode, monitor_enabled).await {
        Ok(report) => {
            tracing::info!(
                "✅ Job '{}' finished: {} extracted, {} loaded into {} in {:?}",
                config.job.name,
                report.records_extracted,
                report.records_loaded,
                report.destination,
                report.duration
            );
            if let Some(response) = &report.response {
                println!("Response content: {}", response);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            std::process::exit(e.severity().exit_code());
        }
    }
}
