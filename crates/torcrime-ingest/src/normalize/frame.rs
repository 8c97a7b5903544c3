//! Untyped tabular view of a dump
//!
//! Both payload shapes are read into a [`Frame`]: named columns, rows of
//! optional cells. A cell is `None` when the source left it empty, wrote one
//! of the usual NA markers, or (for records) omitted the key or sent `null`.

use serde_json::{Map, Value};

use crate::error::{IngestError, Result};

/// Text cells treated as missing, matching the markers common CSV readers
/// recognise by default.
pub const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Frame {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Append a header if unseen, returning its index
    fn intern(&mut self, name: &str) -> usize {
        match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            },
        }
    }
}

fn cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if NA_MARKERS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse delimited text with a header row
///
/// Short rows are padded with missing cells; a row with more cells than the
/// header is rejected. A leading UTF-8 BOM on the header is dropped.
pub fn from_csv(resource: &str, text: &str) -> Result<Frame> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let width = headers.len();
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > width {
            return Err(IngestError::RaggedRow {
                resource: resource.to_string(),
                row: idx + 1,
                expected: width,
                found: record.len(),
            });
        }
        let mut row: Vec<Option<String>> = record.iter().map(cell).collect();
        row.resize(width, None);
        rows.push(row);
    }

    Ok(Frame { headers, rows })
}

/// Flatten structured records into a frame
///
/// Accepts an array of objects, CKAN's dump shape
/// `{"fields": [{"id": ..}], "records": [[..]]}`, a `{"records": [{..}]}`
/// object, or any of those under a `"result"` key.
pub fn from_records(resource: &str, value: &Value) -> Result<Frame> {
    match value {
        Value::Array(items) => from_objects(resource, items),
        Value::Object(map) => {
            if let Some(inner @ Value::Object(_)) = map.get("result") {
                return from_records(resource, inner);
            }
            match map.get("records") {
                Some(Value::Array(records)) => {
                    if records.iter().all(Value::is_array) && map.contains_key("fields") {
                        from_positional(resource, map, records)
                    } else {
                        from_objects(resource, records)
                    }
                },
                _ => Err(unsupported(resource, "object without a 'records' array")),
            }
        },
        other => Err(unsupported(resource, &format!("top-level {}", kind(other)))),
    }
}

fn from_objects(resource: &str, items: &[Value]) -> Result<Frame> {
    let mut frame = Frame::default();
    let mut flat_rows = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        let Value::Object(object) = item else {
            return Err(unsupported(
                resource,
                &format!("record {} is {}, expected an object", idx + 1, kind(item)),
            ));
        };
        let mut flat = Vec::new();
        flatten("", object, &mut flat);
        for (key, _) in &flat {
            frame.intern(key);
        }
        flat_rows.push(flat);
    }

    let width = frame.headers.len();
    for flat in flat_rows {
        let mut row = vec![None; width];
        for (key, value) in flat {
            if let Some(idx) = frame.column_index(&key) {
                row[idx] = value;
            }
        }
        frame.rows.push(row);
    }

    Ok(frame)
}

fn from_positional(resource: &str, map: &Map<String, Value>, records: &[Value]) -> Result<Frame> {
    let Some(Value::Array(fields)) = map.get("fields") else {
        return Err(unsupported(resource, "'fields' is not an array"));
    };

    let headers = fields
        .iter()
        .map(|field| match field.get("id").and_then(Value::as_str) {
            Some(id) => Ok(id.to_string()),
            None => Err(unsupported(resource, "field descriptor without an 'id'")),
        })
        .collect::<Result<Vec<_>>>()?;

    let width = headers.len();
    let rows = records
        .iter()
        .map(|record| {
            let values = record.as_array().map(Vec::as_slice).unwrap_or_default();
            let mut row: Vec<Option<String>> = values.iter().take(width).map(scalar).collect();
            row.resize(width, None);
            row
        })
        .collect();

    Ok(Frame { headers, rows })
}

/// Nested objects become `parent.child` columns
fn flatten(prefix: &str, object: &Map<String, Value>, out: &mut Vec<(String, Option<String>)>) {
    for (key, value) in object {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(nested) => flatten(&name, nested, out),
            other => out.push((name, scalar(other))),
        }
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => cell(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        composite => Some(composite.to_string()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn unsupported(resource: &str, detail: &str) -> IngestError {
    IngestError::UnsupportedPayload {
        resource: resource.to_string(),
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_csv_na_markers_and_short_rows() {
        let frame = from_csv("r", "\u{feff}a,b,c\n1,NA,x\n2,,\n3\n").unwrap();
        assert_eq!(frame.headers, vec!["a", "b", "c"]);
        assert_eq!(
            frame.rows,
            vec![
                vec![Some("1".into()), None, Some("x".into())],
                vec![Some("2".into()), None, None],
                vec![Some("3".into()), None, None],
            ]
        );
    }

    #[test]
    fn test_csv_quoted_commas() {
        let frame = from_csv("r", "_id,AREA_NAME\n1,\"Yonge-St.Clair, North\"\n").unwrap();
        assert_eq!(frame.rows[0][1].as_deref(), Some("Yonge-St.Clair, North"));
    }

    #[test]
    fn test_csv_rows_wider_than_header_are_rejected() {
        let err = from_csv("r", "a,b\n1,2\n3,4,5\n").unwrap_err();
        match err {
            IngestError::RaggedRow {
                resource,
                row,
                expected,
                found,
            } => {
                assert_eq!(resource, "r");
                assert_eq!(row, 2);
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            },
            other => panic!("expected RaggedRow, got {other:?}"),
        }
    }

    #[test]
    fn test_objects_are_flattened_with_union_of_keys() {
        let value = json!([
            { "_id": 1, "geo": { "ward": 3 } },
            { "_id": 2, "extra": null, "geo": { "ward": 4, "zone": "N" } }
        ]);
        let frame = from_records("r", &value).unwrap();
        assert_eq!(frame.headers, vec!["_id", "geo.ward", "extra", "geo.zone"]);
        assert_eq!(
            frame.rows[0],
            vec![Some("1".into()), Some("3".into()), None, None]
        );
        assert_eq!(
            frame.rows[1],
            vec![Some("2".into()), Some("4".into()), None, Some("N".into())]
        );
    }

    #[test]
    fn test_ckan_positional_dump() {
        let value = json!({
            "fields": [{ "id": "_id", "type": "int" }, { "id": "AREA_NAME", "type": "text" }],
            "records": [[1, "Annex"], [2, null]]
        });
        let frame = from_records("r", &value).unwrap();
        assert_eq!(frame.headers, vec!["_id", "AREA_NAME"]);
        assert_eq!(frame.rows[1], vec![Some("2".into()), None]);
    }

    #[test]
    fn test_result_wrapper_is_unwrapped() {
        let value = json!({ "result": { "records": [{ "_id": 7 }] } });
        let frame = from_records("r", &value).unwrap();
        assert_eq!(frame.rows, vec![vec![Some("7".into())]]);
    }

    #[test]
    fn test_unsupported_shapes() {
        assert!(matches!(
            from_records("r", &json!("just text")),
            Err(IngestError::UnsupportedPayload { .. })
        ));
        assert!(matches!(
            from_records("r", &json!([1, 2, 3])),
            Err(IngestError::UnsupportedPayload { .. })
        ));
        assert!(matches!(
            from_records("r", &json!({ "rows": [] })),
            Err(IngestError::UnsupportedPayload { .. })
        ));
    }
}
