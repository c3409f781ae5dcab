//! cadence-api server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cadence_api::{build_router, AppState, ServerConfig};
use cadence_auth::{Credentials, TokenIssuer};
use cadence_cache::CacheConfig;
use cadence_db::Database;
use cadence_jobs::{
    JobWorker, RecurrenceExpander, RecurrenceHandler, ReminderDispatcher, ReminderHandler,
    Scheduler, SchedulerConfig, StoreNotificationSink, WorkerConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors
    //   RUST_LOG    - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cadence_api=debug,cadence_jobs=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("cadence-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = Database::connect(&database_url).await?;
    db.migrate().await?;
    info!(subsystem = "database", "Database connected and migrated");

    let cache = CacheConfig::from_env().connect().await;
    let issuer = TokenIssuer::from_env()?;
    let credentials = Credentials::new(db.users.clone(), issuer);

    let worker = JobWorker::new(db.clone(), WorkerConfig::from_env());
    worker
        .register_handler(RecurrenceHandler::new(RecurrenceExpander::new(
            db.tasks.clone(),
            cache.clone(),
        )))
        .await;
    worker
        .register_handler(ReminderHandler::new(ReminderDispatcher::new(
            db.tasks.clone(),
            Arc::new(StoreNotificationSink::new(db.notifications.clone())),
        )))
        .await;
    let worker_handle = worker.start();
    let scheduler_handle = Scheduler::new(db.clone(), SchedulerConfig::from_env()).start();

    let config = ServerConfig::from_env();
    let state = AppState::new(db, cache, credentials, &config);
    let app = build_router(state, &config);

    let addr = config.bind_address();
    info!(
        %addr,
        rate_limit_enabled = config.rate_limit_enabled,
        "Starting cadence-api"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await?;

    scheduler_handle.shutdown().await.ok();
    worker_handle.shutdown().await.ok();
    info!("cadence-api stopped");
    Ok(())
}
