use actix_web::{web, App, HttpServer};
use clap::Parser;
use std::io;
use tokio::time::Duration;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

mod api;
mod config;
mod pages;
mod query;
mod remote;
mod shutdown;
mod state;
#[cfg(test)]
mod testing;
mod views;
mod worker;

use crate::api::{dashboard_config, not_found, validation};
use crate::config::{Cli, Config};
use crate::query::{JobQueries, QueryClient, QueryOptions};
use crate::remote::JobApiClient;
use crate::shutdown::ShutdownCoordinator;
use crate::state::AppState;
use crate::worker::CacheJanitor;

/// Bounds on the time between cache sweeps
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    // Load configuration from environment, then apply command-line flags
    let Config {
        api_base_url,
        host,
        port,
        log_dir,
        stale_time,
        gc_time,
        render_timeout,
        page_size,
    } = Config::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?
        .with_cli(cli);

    // Create logs directory if it doesn't exist
    std::fs::create_dir_all(&log_dir)?;

    // File-based logging with daily rotation and level separation
    // Log files will be created as: logs/info.log.2024-12-22, logs/error.log.2024-12-22, etc.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let info_file = tracing_appender::rolling::daily(&log_dir, "info.log");
    let warn_file = tracing_appender::rolling::daily(&log_dir, "warn.log");
    let error_file = tracing_appender::rolling::daily(&log_dir, "error.log");
    let debug_file = tracing_appender::rolling::daily(&log_dir, "debug.log");

    let info_layer = tracing_subscriber::fmt::layer()
        .with_writer(info_file)
        .with_ansi(false)
        .with_filter(LevelFilter::INFO);

    let warn_layer = tracing_subscriber::fmt::layer()
        .with_writer(warn_file)
        .with_ansi(false)
        .with_filter(LevelFilter::WARN);

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_file)
        .with_ansi(false)
        .with_filter(LevelFilter::ERROR);

    let debug_layer = tracing_subscriber::fmt::layer()
        .with_writer(debug_file)
        .with_ansi(false)
        .with_filter(LevelFilter::DEBUG);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(info_layer)
        .with(warn_layer)
        .with(error_layer)
        .with(debug_layer)
        .init();

    info!("Starting job-dashboard");
    info!("Configuration loaded successfully:");
    info!("  - Cache stale time: {:?}, gc time: {:?}", stale_time, gc_time);
    info!("  - Render timeout: {:?}", render_timeout);
    info!("  - Page size: {}", page_size);

    let api = JobApiClient::new(&api_base_url).map_err(io::Error::other)?;
    info!("Remote Job API client ready for {}", api.base_url());
    let cache = QueryClient::new(
        QueryOptions {
            stale_time,
            retry: true,
        },
        gc_time,
    );
    let state = web::Data::new(AppState::new(
        JobQueries::new(cache.clone(), api),
        page_size,
        render_timeout,
    ));

    // watch channel lets every background task see the same shutdown flag
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let server_state = state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(server_state.clone())
            .app_data(validation::query_config())
            .app_data(validation::form_config())
            .configure(dashboard_config)
            .default_service(web::to(not_found))
    });

    info!("Server starting on http://{}:{}", host, port);

    let server = server.bind((host.as_str(), port))?.run();
    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let sweep_interval = gc_time.clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL);
    let janitor = CacheJanitor::new(cache, sweep_interval);
    let janitor_handle = tokio::spawn(async move { janitor.run(shutdown_rx).await });

    let coordinator = ShutdownCoordinator::new(
        server_handle,
        server_task,
        vec![janitor_handle],
        shutdown_tx,
        state,
    );

    coordinator.wait_for_shutdown().await
}
