//! SymptomCheck: symptom-based disease lookup
//!
//! Main entry point for the web server.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use symptomcheck::adapters::sanitize::SanitizingMakeWriter;
use symptomcheck::adapters::sqlite::SqliteStorage;
use symptomcheck::web::{self, AppState};
use symptomcheck::{AccountService, AppConfig, PredictionContext, PredictionService};

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // stdout by default so container logs work; `file` for long-running hosts.
    let log_mode = std::env::var("SYMPTOMCHECK_LOG_MODE").unwrap_or_else(|_| "stdout".to_string());

    let (writer, guard) = if log_mode == "file" {
        let log_file = std::env::var("SYMPTOMCHECK_LOG_FILE")
            .unwrap_or_else(|_| "data/symptomcheck.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Cannot open log file {log_file}"))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::parse();
    config.validate()?;

    let _guard = init_logging()?;
    tracing::info!("Starting SymptomCheck...");

    let context = PredictionContext::load(
        &config.datasets_dir,
        &config.models_dir,
        config.model_pin(),
    )
    .context("Startup consistency check failed")?;
    tracing::info!(
        "Prediction context ready (model loaded: {})",
        context.model_digest().is_some()
    );
    let prediction = Arc::new(PredictionService::new(context));

    let storage = Arc::new(
        SqliteStorage::new(&config.database)
            .with_context(|| format!("Cannot open database {:?}", config.database))?,
    );
    let accounts = Arc::new(AccountService::new(storage, config.session_ttl()));
    if let Err(e) = accounts.purge_expired_sessions() {
        tracing::warn!("Failed to purge expired sessions: {}", e);
    }

    let state = AppState::new(prediction, accounts, config.secure_cookies);
    let app = web::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Cannot bind {}", config.bind))?;
    tracing::info!("Listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("SymptomCheck shutdown complete.");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutting down...");
}
