use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;

mod api;
mod config;
mod database;
mod monitoring;
mod pool;
mod retention;

use crate::api::AppState;
use crate::config::Config;
use crate::database::{Database, LibsqlDatabase};
use crate::monitoring::{ProbeRoundExecutor, ProbeScheduler};
use crate::pool::LibsqlManager;
use crate::retention::{RetentionCleanup, RetentionPolicy};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = Arc::new(Config::from_env().context("invalid configuration")?);

    if let Some(parent) = Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let db = libsql::Builder::new_local(&config.db_path)
        .build()
        .await
        .with_context(|| format!("failed to open database at {}", config.db_path))?;
    let pool: crate::pool::LibsqlPool =
        deadpool::managed::Pool::builder(LibsqlManager::new(db)).build()?;

    {
        let conn = pool.get().await?;
        database::initialize_database(&conn).await?;
    }
    info!(path = %config.db_path, "database ready");

    let database: Arc<dyn Database> = Arc::new(LibsqlDatabase::new_from_pool(pool));

    let executor = Arc::new(ProbeRoundExecutor::standard(database.clone(), &config)?);
    let scheduler = ProbeScheduler::new(executor, config.check_interval()).start();

    let retention_policy = RetentionPolicy { check_days: config.check_retention_days };
    let retention_task = if retention_policy.enabled() {
        info!(days = retention_policy.check_days, "retention cleanup enabled");
        Some(RetentionCleanup::new(database.clone(), retention_policy).start_periodic_cleanup())
    } else {
        None
    };

    let state = AppState { database, config: config.clone() };
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.bind, config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.bind, config.port))?;
    info!(addr = %listener.local_addr()?, "api listening");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(
            listener,
            api::router(state).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        {
            tracing::error!("api server failed: {e}");
        }
    });

    signal::ctrl_c().await?;
    info!("shutdown signal received");

    scheduler.stop().await;
    if let Some(task) = retention_task {
        task.abort();
    }
    server.abort();

    Ok(())
}
