use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod checkin;
mod config;
mod descriptor;
mod enrollment;
mod error;
mod matching;
mod models;
mod repositories;
mod routes;
mod state;

use common::database::{DatabaseConfig, init_pool};
use tokio::net::TcpListener;

use crate::{
    config::AppConfig,
    repositories::{AttendanceStore, postgres::PgAttendanceStore},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting attendance service");

    let app_config = AppConfig::from_env()?;
    let matching = app_config.matching();
    info!(
        match_threshold = matching.match_threshold,
        min_dims = matching.limits.min_dims,
        canonical_dims = matching.limits.canonical_dims,
        max_dims = matching.limits.max_dims,
        "Matching configuration loaded"
    );

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    let store = PgAttendanceStore::new(pool);

    // Check database connectivity
    if store.ping().await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let app = routes::create_router(AppState::new(store, matching));

    let listener = TcpListener::bind(&app_config.bind_addr).await?;
    info!("Attendance service listening on {}", app_config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
