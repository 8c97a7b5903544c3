//! torcrime ingest library
//!
//! Loads the City of Toronto "Neighbourhood Crime Rates" dataset from the
//! CKAN open-data portal into a PostgreSQL table.
//!
//! # Steps
//!
//! - **Fetch** ([`fetch`]): discover the package's datastore-active
//!   resources and download each dump
//! - **Normalize** ([`normalize`]): project the fixed column set, drop
//!   incomplete rows and exact duplicates
//! - **Schema** ([`db::schema`]): `CREATE TABLE IF NOT EXISTS`
//! - **Load** ([`db::loader`]): batched inserts that ignore existing `_id`s
//!
//! # Example
//!
//! ```no_run
//! use torcrime_ingest::{config::Config, db, pipeline::Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let report = Pipeline::new(config)?.run(&pool).await?;
//!     println!("inserted {} rows", report.rows_inserted);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod models;
pub mod normalize;
pub mod pipeline;

pub use error::{IngestError, Result};
