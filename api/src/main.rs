use anyhow::{Context, bail};
use migration::Migrator;
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use tracing::info;
use tracing_appender::rolling;
use util::config::AppConfig;
use util::ws::WsServerOptions;

use api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::snapshot();

    // Load configuration and initialize logging
    let _log_guard = init_logging(&cfg);

    if cfg.jwt_secret.is_empty() {
        bail!("JWT_SECRET must be set");
    }

    // Set up dependencies
    let db = db::connect().await.context("failed to connect to database")?;
    Migrator::up(&db, None)
        .await
        .context("failed to apply migrations")?;

    let state = AppState::new(
        db,
        cfg.hub_channel_capacity,
        WsServerOptions::from_config(&cfg),
    );
    let app = api::app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.host, cfg.port))?;

    info!(project = %cfg.project_name, env = %cfg.env, %addr, "starting server");
    println!("Starting {} on http://{}", cfg.project_name, addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server crashed")?;

    info!("server stopped");
    Ok(())
}

fn init_logging(cfg: &AppConfig) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", &cfg.log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = cfg.log_to_stdout.then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(true)
            .with_thread_ids(true)
    });

    let env_filter =
        EnvFilter::try_new(&cfg.log_level).unwrap_or_else(|_| EnvFilter::new("api=info,util=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
