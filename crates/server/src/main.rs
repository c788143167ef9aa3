use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use agegate_estimator::{Estimator, EstimatorSettings, NullVideoDecoder, RegionDetector};
use agegate_pipeline::{BackgroundConfig, BackgroundProcessorBuilder, PipelineBuilder};
use agegate_server::api::AppState;
use agegate_server::config::AgegateConfig;

/// Agegate verification HTTP server.
#[derive(Parser, Debug)]
#[command(name = "agegate-server", about = "Standalone HTTP server for Agegate")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, default_value = "agegate.json")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration, or use defaults if the file does not exist.
    let config = AgegateConfig::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if !Path::new(&cli.config).exists() {
        info!(
            path = %cli.config,
            "config file not found, using defaults"
        );
    }

    config.gate.validate()?;

    // Create the collaborator backends.
    let sessions = agegate_server::state_factory::create_sessions(&config.state)?;
    let verifications =
        agegate_server::records_factory::create_verifications(&config.records).await?;
    let appeals = agegate_server::records_factory::create_appeals(&config.records).await?;
    info!(backend = %config.records.backend, "record stores initialized");

    let guild = agegate_server::guild_factory::create_guild(&config.discord)?;
    info!(backend = %guild.name(), "guild backend initialized");

    let forward = config.discord.enabled.then(|| Arc::clone(&guild));
    let audit = agegate_server::audit_factory::create_audit_sink(&config.gate, forward);

    let estimator = Arc::new(Estimator::new(
        Arc::new(RegionDetector::new()),
        Arc::new(NullVideoDecoder::new()),
        EstimatorSettings {
            bands: config.gate.verification.bands.clone(),
            blur_threshold: config.gate.verification.blur_threshold,
        },
    ));

    let pipeline = Arc::new(
        PipelineBuilder::new()
            .config(config.gate.clone())
            .sessions(sessions)
            .verifications(verifications)
            .appeals(appeals)
            .guild(guild)
            .audit(audit)
            .estimator(estimator)
            .build()?,
    );

    // Spawn the background processor for sweeps and the raid watchdog.
    let _background_shutdown_tx = if config.background.enabled {
        let bg_config = BackgroundConfig {
            retention_interval: Duration::from_secs(config.background.retention_interval_seconds),
            reminder_interval: Duration::from_secs(config.background.reminder_interval_seconds),
            kick_interval: Duration::from_secs(config.background.kick_interval_seconds),
            raid_check_interval: Duration::from_secs(
                config.background.raid_check_interval_seconds,
            ),
            enable_retention: config.background.enable_retention,
            enable_reminders: config.background.enable_reminders,
            enable_auto_kick: config.background.enable_auto_kick,
            enable_raid_watch: config.background.enable_raid_watch,
        };

        let (mut processor, shutdown_tx) = BackgroundProcessorBuilder::new()
            .config(bg_config)
            .pipeline(Arc::clone(&pipeline))
            .build()
            .map_err(|e| format!("failed to build background processor: {e}"))?;

        tokio::spawn(async move {
            processor.run().await;
        });

        info!("background processor started");
        Some(shutdown_tx)
    } else {
        None
    };

    let state = AppState {
        pipeline: Arc::clone(&pipeline),
    };
    let app = agegate_server::api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "agegate-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Wait for pending audit tasks to complete (with configurable timeout).
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    info!(
        timeout_secs = config.server.shutdown_timeout_seconds,
        "waiting for pending audit tasks..."
    );
    if tokio::time::timeout(shutdown_timeout, pipeline.shutdown())
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = config.server.shutdown_timeout_seconds,
            "shutdown timeout exceeded, some audit tasks may be lost"
        );
    }

    info!("agegate-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
