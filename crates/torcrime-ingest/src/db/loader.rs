// Loader for normalized rows
//
// Rows go in as multi-row INSERT ... ON CONFLICT ("_id") DO NOTHING
// statements of at most `batch_size` rows. Each cleaned table is loaded in
// its own transaction: it either lands completely or not at all, while tables
// committed earlier in the run stay committed.

use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{CleanedTable, NormalizedRow, COLUMNS, TABLE_NAME};

/// Outcome of loading one cleaned table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub resource_id: String,
    pub offered: usize,
    pub inserted: u64,
    /// Rows whose `_id` was already present
    pub skipped: u64,
}

fn insert_prefix() -> String {
    let columns = COLUMNS
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {TABLE_NAME} ({columns}) ")
}

fn insert_batch(rows: &[NormalizedRow]) -> QueryBuilder<'_, Postgres> {
    let mut query_builder = QueryBuilder::new(insert_prefix());

    query_builder.push_values(rows, |mut b, row| {
        b.push_bind(row.id).push_bind(&row.area_name);
        for count in row.counts() {
            b.push_bind(count);
        }
    });
    query_builder.push(r#" ON CONFLICT ("_id") DO NOTHING"#);

    query_builder
}

/// Load every table in order, stopping at the first failure
pub async fn load(
    pool: &PgPool,
    tables: &[CleanedTable],
    batch_size: usize,
) -> Result<Vec<LoadStats>> {
    let mut stats = Vec::with_capacity(tables.len());
    for table in tables {
        stats.push(load_table(pool, table, batch_size).await?);
    }
    Ok(stats)
}

/// Load one table inside a single transaction
#[tracing::instrument(skip(pool, table), fields(resource_id = %table.resource_id, rows = table.len()))]
pub async fn load_table(pool: &PgPool, table: &CleanedTable, batch_size: usize) -> Result<LoadStats> {
    let mut stats = LoadStats {
        resource_id: table.resource_id.clone(),
        offered: table.len(),
        ..LoadStats::default()
    };

    if table.is_empty() {
        debug!("Nothing to load");
        return Ok(stats);
    }

    let batch_size = batch_size.max(1);
    let total_batches = table.len().div_ceil(batch_size);
    let mut tx = pool.begin().await?;

    for (batch_idx, chunk) in table.rows.chunks(batch_size).enumerate() {
        let result = insert_batch(chunk).build().execute(&mut *tx).await?;
        stats.inserted += result.rows_affected();
        debug!(
            batch = batch_idx + 1,
            total_batches,
            rows = chunk.len(),
            inserted = result.rows_affected(),
            "Batch inserted"
        );
    }

    tx.commit().await?;

    stats.skipped = (stats.offered as u64).saturating_sub(stats.inserted);
    info!(
        inserted = stats.inserted,
        skipped = stats.skipped,
        "Table loaded"
    );

    Ok(stats)
}
