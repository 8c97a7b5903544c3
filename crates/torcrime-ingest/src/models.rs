//! Data shapes handed from step to step

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

/// Destination table for normalized rows
pub const TABLE_NAME: &str = "toronto_crime_data";

/// Projected columns, in declared (and bind) order
pub const COLUMNS: [&str; 13] = [
    "_id",
    "AREA_NAME",
    "HOOD_ID",
    "ASSAULT_2024",
    "AUTOTHEFT_2024",
    "BIKETHEFT_2024",
    "BREAKENTER_2024",
    "HOMICIDE_2024",
    "ROBBERY_2024",
    "SHOOTING_2024",
    "THEFTFROMMV_2024",
    "THEFTOVER_2024",
    "POPULATION_2024",
];

/// How the portal should serialise a datastore dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DumpFormat {
    #[default]
    Csv,
    Json,
}

impl DumpFormat {
    /// Query value for `/datastore/dump/{id}`; CSV is the portal default
    pub fn query_value(self) -> Option<&'static str> {
        match self {
            DumpFormat::Csv => None,
            DumpFormat::Json => Some("json"),
        }
    }
}

impl std::str::FromStr for DumpFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(DumpFormat::Csv),
            "json" => Ok(DumpFormat::Json),
            other => Err(format!("unknown dump format '{other}'")),
        }
    }
}

impl std::fmt::Display for DumpFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DumpFormat::Csv => write!(f, "csv"),
            DumpFormat::Json => write!(f, "json"),
        }
    }
}

/// Body of one datastore dump
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Delimited text with a header row
    Text(String),
    /// Structured records (array of objects, or CKAN's `fields` + `records`)
    Records(serde_json::Value),
}

impl RawPayload {
    pub fn len_hint(&self) -> usize {
        match self {
            RawPayload::Text(text) => text.len(),
            RawPayload::Records(serde_json::Value::Array(items)) => items.len(),
            RawPayload::Records(_) => 0,
        }
    }
}

/// One fetched resource, in metadata order
#[derive(Debug, Clone)]
pub struct RawResource {
    pub id: String,
    pub name: Option<String>,
    pub position: u32,
    pub payload: RawPayload,
}

/// A fully populated row of the destination table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedRow {
    #[serde(rename = "_id")]
    pub id: i32,
    #[serde(rename = "AREA_NAME")]
    pub area_name: String,
    #[serde(rename = "HOOD_ID")]
    pub hood_id: i32,
    #[serde(rename = "ASSAULT_2024")]
    pub assault: i32,
    #[serde(rename = "AUTOTHEFT_2024")]
    pub autotheft: i32,
    #[serde(rename = "BIKETHEFT_2024")]
    pub biketheft: i32,
    #[serde(rename = "BREAKENTER_2024")]
    pub breakenter: i32,
    #[serde(rename = "HOMICIDE_2024")]
    pub homicide: i32,
    #[serde(rename = "ROBBERY_2024")]
    pub robbery: i32,
    #[serde(rename = "SHOOTING_2024")]
    pub shooting: i32,
    #[serde(rename = "THEFTFROMMV_2024")]
    pub theftfrommv: i32,
    #[serde(rename = "THEFTOVER_2024")]
    pub theftover: i32,
    #[serde(rename = "POPULATION_2024")]
    pub population: i32,
}

impl NormalizedRow {
    /// Integer fields after `AREA_NAME`, in column order
    pub fn counts(&self) -> [i32; 11] {
        [
            self.hood_id,
            self.assault,
            self.autotheft,
            self.biketheft,
            self.breakenter,
            self.homicide,
            self.robbery,
            self.shooting,
            self.theftfrommv,
            self.theftover,
            self.population,
        ]
    }
}

impl<'r> FromRow<'r, PgRow> for NormalizedRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get(COLUMNS[0])?,
            area_name: row.try_get(COLUMNS[1])?,
            hood_id: row.try_get(COLUMNS[2])?,
            assault: row.try_get(COLUMNS[3])?,
            autotheft: row.try_get(COLUMNS[4])?,
            biketheft: row.try_get(COLUMNS[5])?,
            breakenter: row.try_get(COLUMNS[6])?,
            homicide: row.try_get(COLUMNS[7])?,
            robbery: row.try_get(COLUMNS[8])?,
            shooting: row.try_get(COLUMNS[9])?,
            theftfrommv: row.try_get(COLUMNS[10])?,
            theftover: row.try_get(COLUMNS[11])?,
            population: row.try_get(COLUMNS[12])?,
        })
    }
}

/// Cleaned rows from one resource plus what was filtered out
#[derive(Debug, Clone, Default)]
pub struct CleanedTable {
    pub resource_id: String,
    pub rows: Vec<NormalizedRow>,
    pub source_rows: usize,
    pub dropped_incomplete: usize,
    pub dropped_duplicates: usize,
}

impl CleanedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_row_uses_column_names() {
        let row = NormalizedRow {
            id: 1,
            area_name: "West Humber-Clairville".to_string(),
            hood_id: 1,
            assault: 10,
            autotheft: 11,
            biketheft: 12,
            breakenter: 13,
            homicide: 14,
            robbery: 15,
            shooting: 16,
            theftfrommv: 17,
            theftover: 18,
            population: 19,
        };

        let value = serde_json::to_value(&row).unwrap();
        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        let mut expected = COLUMNS.to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert_eq!(row.counts()[0], 1);
        assert_eq!(row.counts()[10], 19);
    }

    #[test]
    fn test_dump_format_parsing() {
        assert_eq!("CSV".parse::<DumpFormat>().unwrap(), DumpFormat::Csv);
        assert_eq!("json".parse::<DumpFormat>().unwrap(), DumpFormat::Json);
        assert!("xml".parse::<DumpFormat>().is_err());
        assert_eq!(DumpFormat::Csv.query_value(), None);
        assert_eq!(DumpFormat::Json.query_value(), Some("json"));
    }
}
