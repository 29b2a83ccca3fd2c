//! Purpose: Load a tabular JSON document into an in-memory cursor for the CLI.
//! Exports: `load_table`, `read_table`.
//! Role: Input boundary of the `sqljson` binary; stands in for a database driver.
//! Invariants: Every row must have exactly one cell per declared column.
//! Invariants: Column kinds come from `kind`, else from the declared `type`, else stay unsupported.
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use sqljson::api::{CellValue, ColumnType, Error, ErrorKind, MemoryCursor, ScanKind, suggest_kind};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableDocument {
    columns: Vec<ColumnSpec>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColumnSpec {
    name: String,
    #[serde(default, rename = "type")]
    database_type: String,
    #[serde(default)]
    kind: Option<ScanKind>,
}

pub(crate) fn load_table(path: Option<&Path>) -> Result<MemoryCursor, Error> {
    match path {
        Some(path) => {
            let file = File::open(path).map_err(|err| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("failed to open input {}", path.display()))
                    .with_source(err)
            })?;
            read_table(BufReader::new(file))
        }
        None => read_table(io::stdin().lock()),
    }
}

pub(crate) fn read_table<R: Read>(reader: R) -> Result<MemoryCursor, Error> {
    let document: TableDocument = serde_json::from_reader(reader).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid table document: {err}"))
            .with_hint(r#"Expected {"columns":[{"name":..,"type":..}],"rows":[[..],..]}."#)
            .with_source(err)
    })?;

    let width = document.columns.len();
    let mut cursor = MemoryCursor::new(document.columns.into_iter().map(|column| {
        let suggested = column
            .kind
            .or_else(|| suggest_kind(&column.database_type));
        (column.name, ColumnType::new(column.database_type, suggested))
    }));

    for (index, row) in document.rows.into_iter().enumerate() {
        if row.len() != width {
            return Err(Error::new(ErrorKind::Usage).with_message(format!(
                "row {index} has {} cells, expected {width}",
                row.len()
            )));
        }
        cursor.push_row(row.into_iter().map(cell_from_json).collect());
    }
    Ok(cursor)
}

fn cell_from_json(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(value) => CellValue::Bool(value),
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                CellValue::Int(value)
            } else if let Some(value) = number.as_u64() {
                CellValue::UInt(value)
            } else {
                CellValue::Float(number.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(text) => CellValue::Text(text),
        // Nested documents are handed over as JSON text, like a JSON column would be.
        nested @ (Value::Array(_) | Value::Object(_)) => CellValue::Text(nested.to_string()),
    }
}
