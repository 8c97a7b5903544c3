//! Reshape raw dumps into destination rows
//!
//! For every fetched resource:
//!
//! 1. read the payload into a [`frame::Frame`] (CSV text or JSON records)
//! 2. check that every projected column exists, failing with
//!    [`IngestError::SchemaMismatch`] listing all that are absent
//! 3. drop rows with a missing value in any projected column
//! 4. type the remaining cells into [`NormalizedRow`]s
//! 5. drop exact duplicates, keeping the first occurrence
//!
//! Deduplication is per resource; the same `_id` arriving from two resources
//! is left for the loader's conflict handling.

pub mod frame;

use std::collections::HashSet;
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::models::{CleanedTable, NormalizedRow, RawPayload, RawResource, COLUMNS};
use frame::Frame;

/// Normalize each resource, preserving input order
#[tracing::instrument(skip_all, fields(resources = resources.len()))]
pub fn normalize_all(resources: &[RawResource]) -> Result<Vec<CleanedTable>> {
    resources.iter().map(normalize).collect()
}

/// Normalize a single resource
pub fn normalize(resource: &RawResource) -> Result<CleanedTable> {
    let frame = match &resource.payload {
        RawPayload::Text(text) => frame::from_csv(&resource.id, text)?,
        RawPayload::Records(value) => frame::from_records(&resource.id, value)?,
    };
    debug!(
        resource_id = %resource.id,
        columns = ?frame.headers,
        "Parsed resource payload"
    );

    let table = clean(&resource.id, &frame)?;
    info!(
        resource_id = %resource.id,
        source_rows = table.source_rows,
        kept = table.len(),
        dropped_incomplete = table.dropped_incomplete,
        dropped_duplicates = table.dropped_duplicates,
        "Normalized resource"
    );
    Ok(table)
}

/// Project, filter and deduplicate one frame
pub fn clean(resource_id: &str, frame: &Frame) -> Result<CleanedTable> {
    let indices = project(resource_id, frame)?;

    let mut seen = HashSet::new();
    let mut table = CleanedTable {
        resource_id: resource_id.to_string(),
        source_rows: frame.rows.len(),
        ..CleanedTable::default()
    };

    for (row_idx, row) in frame.rows.iter().enumerate() {
        let Some(cells) = indices
            .iter()
            .map(|&i| row.get(i).and_then(|c| c.as_deref()))
            .collect::<Option<Vec<&str>>>()
        else {
            table.dropped_incomplete += 1;
            continue;
        };

        let typed = to_row(resource_id, row_idx + 1, &cells)?;
        if seen.insert(typed.clone()) {
            table.rows.push(typed);
        } else {
            table.dropped_duplicates += 1;
        }
    }

    Ok(table)
}

/// Positions of the projected columns, or every column that is missing
fn project(resource_id: &str, frame: &Frame) -> Result<Vec<usize>> {
    let mut indices = Vec::with_capacity(COLUMNS.len());
    let mut missing = Vec::new();

    for column in COLUMNS {
        match frame.column_index(column) {
            Some(idx) => indices.push(idx),
            None => missing.push(column.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(indices)
    } else {
        Err(IngestError::SchemaMismatch {
            resource: resource_id.to_string(),
            missing,
        })
    }
}

fn to_row(resource_id: &str, row: usize, cells: &[&str]) -> Result<NormalizedRow> {
    let int = |pos: usize| -> Result<i32> {
        parse_int(cells[pos]).ok_or_else(|| IngestError::InvalidValue {
            resource: resource_id.to_string(),
            row,
            column: COLUMNS[pos],
            value: cells[pos].to_string(),
        })
    };

    Ok(NormalizedRow {
        id: int(0)?,
        area_name: cells[1].to_string(),
        hood_id: int(2)?,
        assault: int(3)?,
        autotheft: int(4)?,
        biketheft: int(5)?,
        breakenter: int(6)?,
        homicide: int(7)?,
        robbery: int(8)?,
        shooting: int(9)?,
        theftfrommv: int(10)?,
        theftover: int(11)?,
        population: int(12)?,
    })
}

/// Integers, or floats with no fractional part ("42.0"), within `i32`
pub fn parse_int(raw: &str) -> Option<i32> {
    if let Ok(value) = raw.parse::<i32>() {
        return Some(value);
    }
    let value: f64 = raw.parse().ok()?;
    let in_range = value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX);
    if value.is_finite() && value.fract() == 0.0 && in_range {
        Some(value as i32)
    } else {
        None
    }
}
