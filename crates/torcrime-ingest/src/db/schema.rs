//! Destination table creation
//!
//! `CREATE TABLE IF NOT EXISTS` is the only DDL this tool issues. An existing
//! table is never altered; if its columns differ from the declared shape the
//! difference is logged and loading proceeds.

use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{COLUMNS, TABLE_NAME};

pub const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS toronto_crime_data (
    "_id" INT PRIMARY KEY,
    "AREA_NAME" VARCHAR(255),
    "HOOD_ID" INT,
    "ASSAULT_2024" INT,
    "AUTOTHEFT_2024" INT,
    "BIKETHEFT_2024" INT,
    "BREAKENTER_2024" INT,
    "HOMICIDE_2024" INT,
    "ROBBERY_2024" INT,
    "SHOOTING_2024" INT,
    "THEFTFROMMV_2024" INT,
    "THEFTOVER_2024" INT,
    "POPULATION_2024" INT
)
"#;

/// `information_schema` type name expected for a column
fn expected_type(column: &str) -> &'static str {
    if column == "AREA_NAME" {
        "character varying"
    } else {
        "integer"
    }
}

/// Differences between the live table and the declared shape
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDrift {
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
    /// (column, expected type, actual type)
    pub retyped: Vec<(String, String, String)>,
}

impl SchemaDrift {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && self.retyped.is_empty()
    }

    /// Compare live `(column_name, data_type)` pairs with the declared shape
    pub fn compare(live: &[(String, String)]) -> Self {
        let mut drift = SchemaDrift::default();

        for column in COLUMNS {
            match live.iter().find(|(name, _)| name == column) {
                None => drift.missing.push(column.to_string()),
                Some((_, actual)) if actual != expected_type(column) => drift.retyped.push((
                    column.to_string(),
                    expected_type(column).to_string(),
                    actual.clone(),
                )),
                Some(_) => {},
            }
        }

        drift.unexpected = live
            .iter()
            .filter(|(name, _)| !COLUMNS.contains(&name.as_str()))
            .map(|(name, _)| name.clone())
            .collect();

        drift
    }
}

/// Create the destination table if absent and report any drift
#[tracing::instrument(skip(pool))]
pub async fn ensure_table(pool: &PgPool) -> Result<SchemaDrift> {
    sqlx::query(CREATE_TABLE_SQL).execute(pool).await?;

    let live: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT column_name::text, data_type::text
        FROM information_schema.columns
        WHERE table_schema = current_schema() AND table_name = $1
        ORDER BY ordinal_position
        "#,
    )
    .bind(TABLE_NAME)
    .fetch_all(pool)
    .await?;

    let drift = SchemaDrift::compare(&live);
    if drift.is_empty() {
        info!(table = TABLE_NAME, "Destination table ready");
    } else {
        warn!(
            table = TABLE_NAME,
            missing = ?drift.missing,
            unexpected = ?drift.unexpected,
            retyped = ?drift.retyped,
            "Existing table differs from the declared shape; it will not be altered"
        );
    }

    Ok(drift)
}
