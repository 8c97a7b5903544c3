//! Destination store access
//!
//! The store is PostgreSQL reached through an `sqlx` pool built from the
//! connection profile in [`DatabaseConfig`].

pub mod loader;
pub mod schema;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::Result;

pub use loader::{load, load_table, LoadStats};
pub use schema::{ensure_table, SchemaDrift};

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        "Database connection pool created"
    );

    Ok(pool)
}
