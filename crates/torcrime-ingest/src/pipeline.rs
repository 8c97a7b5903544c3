//! Pipeline composition
//!
//! The four steps are plain typed calls:
//!
//! ```text
//! fetch ──► normalize ──┐
//!                       ├──► load
//! ensure_table ─────────┘
//! ```
//!
//! Each step runs to completion before the next starts. The first error
//! aborts the run and is returned unchanged.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::api::CkanClient;
use crate::config::Config;
use crate::db::{self, LoadStats};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::models::{CleanedTable, RawResource};
use crate::normalize;

/// Summary of one completed run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub dataset: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub resources: usize,
    pub rows_normalized: usize,
    pub rows_inserted: u64,
    pub rows_skipped: u64,
    /// `_id`s that appeared in more than one resource
    pub cross_resource_duplicates: Vec<i32>,
    pub schema_drift: bool,
    pub tables: Vec<LoadStats>,
}

pub struct Pipeline {
    config: Config,
    client: CkanClient,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let client = CkanClient::new(config.source.base_url.clone(), config.source.timeout())?;
        Ok(Self { config, client })
    }

    /// Step 1: download every active resource
    pub async fn fetch(&self) -> Result<Vec<RawResource>> {
        Fetcher::new(&self.client, self.config.source.dump_format)
            .fetch(&self.config.source.dataset)
            .await
    }

    /// Steps 1 and 2, without touching the store
    pub async fn prepare(&self) -> Result<Vec<CleanedTable>> {
        let resources = self.fetch().await?;
        normalize::normalize_all(&resources)
    }

    /// Run all four steps against `pool`
    pub async fn run(&self, pool: &PgPool) -> Result<PipelineReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline", %run_id, dataset = %self.config.source.dataset);
        self.run_inner(run_id, pool).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, pool: &PgPool) -> Result<PipelineReport> {
        let started_at = Utc::now();
        info!("Pipeline started");

        let resources = self.fetch().await?;
        let tables = normalize::normalize_all(&resources)?;

        let duplicates = cross_resource_duplicates(&tables);
        if !duplicates.is_empty() {
            warn!(
                count = duplicates.len(),
                ids = ?duplicates,
                "Same _id found in several resources; the first one loaded is kept"
            );
        }

        let drift = db::ensure_table(pool).await?;
        let stats = db::load(pool, &tables, self.config.load.batch_size).await?;

        let report = PipelineReport {
            run_id,
            dataset: self.config.source.dataset.clone(),
            started_at,
            finished_at: Utc::now(),
            resources: resources.len(),
            rows_normalized: tables.iter().map(CleanedTable::len).sum(),
            rows_inserted: stats.iter().map(|s| s.inserted).sum(),
            rows_skipped: stats.iter().map(|s| s.skipped).sum(),
            cross_resource_duplicates: duplicates,
            schema_drift: !drift.is_empty(),
            tables: stats,
        };

        info!(
            resources = report.resources,
            normalized = report.rows_normalized,
            inserted = report.rows_inserted,
            skipped = report.rows_skipped,
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "Pipeline finished"
        );

        Ok(report)
    }
}

/// `_id`s present in more than one cleaned table, ascending
pub fn cross_resource_duplicates(tables: &[CleanedTable]) -> Vec<i32> {
    let mut seen_in: HashMap<i32, usize> = HashMap::new();
    for table in tables {
        let ids: HashSet<i32> = table.rows.iter().map(|r| r.id).collect();
        for id in ids {
            *seen_in.entry(id).or_default() += 1;
        }
    }

    seen_in
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(id, _)| id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
