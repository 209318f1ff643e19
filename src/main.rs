use clap::Parser;
use scanocr::config::{Args, Config, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let json = args.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .init();

    // Reject bad settings before anything else starts
    let config = Config::try_from(args)?;

    tracing::info!("Starting scanocr-server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        policy = ?config.pipeline.threshold_policy,
        blur_kernel = config.pipeline.blur_kernel_size.get(),
        normalize = config.pipeline.normalize,
        languages = %config.ocr.languages.joined(),
        "Preprocessing configured"
    );
    tracing::info!("Binding to {}:{}", config.host, config.port);

    scanocr::server::run(config).await
}
