// Forward-only row cursor contract and an in-memory cursor for the CLI and tests.
use std::collections::VecDeque;
use std::str::FromStr;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::error::BoxError;
use crate::core::scan::{ColumnType, ScanKind, ScanValue};

pub trait RowCursor {
    fn column_names(&mut self) -> Result<Vec<String>, BoxError>;
    fn column_types(&mut self) -> Result<Vec<ColumnType>, BoxError>;
    /// Move to the next row; false once exhausted or failed.
    fn advance(&mut self) -> bool;
    /// Decode the current row into `targets`, one per column.
    fn scan(&mut self, targets: &mut [ScanValue]) -> Result<(), BoxError>;
    /// Error that ended iteration, checked after `advance` returns false.
    fn take_error(&mut self) -> Option<BoxError>;
}

impl<C: RowCursor + ?Sized> RowCursor for &mut C {
    fn column_names(&mut self) -> Result<Vec<String>, BoxError> {
        (**self).column_names()
    }

    fn column_types(&mut self) -> Result<Vec<ColumnType>, BoxError> {
        (**self).column_types()
    }

    fn advance(&mut self) -> bool {
        (**self).advance()
    }

    fn scan(&mut self, targets: &mut [ScanValue]) -> Result<(), BoxError> {
        (**self).scan(targets)
    }

    fn take_error(&mut self) -> Option<BoxError> {
        (**self).take_error()
    }
}

/// A driver-level value before it is scanned into a target.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(OffsetDateTime),
}

/// Representation an in-memory driver suggests for a declared type name.
pub fn suggest_kind(database_type: &str) -> Option<ScanKind> {
    let upper = database_type.trim().to_ascii_uppercase();
    let unsigned = upper.ends_with(" UNSIGNED");
    let base = upper.trim_end_matches(" UNSIGNED");
    let kind = match (base, unsigned) {
        ("CHAR" | "VARCHAR" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "JSON" | "DECIMAL", _) => {
            ScanKind::Text
        }
        ("TINYINT", false) => ScanKind::I8,
        ("TINYINT", true) => ScanKind::U8,
        ("SMALLINT", false) => ScanKind::I16,
        ("SMALLINT", true) => ScanKind::U16,
        ("INT" | "INTEGER" | "MEDIUMINT", false) => ScanKind::I32,
        ("INT" | "INTEGER" | "MEDIUMINT", true) => ScanKind::U32,
        ("BIGINT", false) => ScanKind::I64,
        ("BIGINT", true) => ScanKind::U64,
        ("FLOAT" | "REAL", _) => ScanKind::F32,
        ("DOUBLE", _) => ScanKind::F64,
        ("BOOL" | "BOOLEAN", _) => ScanKind::Bool,
        ("TIMESTAMP" | "DATETIME", _) => ScanKind::Timestamp,
        ("BLOB" | "BINARY" | "VARBINARY", _) => ScanKind::Bytes,
        _ => return None,
    };
    Some(kind)
}

/// Cursor over rows held in memory.
#[derive(Debug, Default)]
pub struct MemoryCursor {
    names: Vec<String>,
    types: Vec<ColumnType>,
    rows: VecDeque<Vec<CellValue>>,
    current: Option<Vec<CellValue>>,
    trailing_error: Option<String>,
    metadata_unavailable: bool,
    metadata_calls: usize,
}

impl MemoryCursor {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        let (names, types) = columns
            .into_iter()
            .map(|(name, column_type)| (name.into(), column_type))
            .unzip();
        Self {
            names,
            types,
            ..Self::default()
        }
    }

    pub fn with_row(mut self, row: Vec<CellValue>) -> Self {
        self.push_row(row);
        self
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.rows.push_back(row);
    }

    /// Report `message` from `take_error` once the rows are exhausted.
    pub fn with_trailing_error(mut self, message: impl Into<String>) -> Self {
        self.trailing_error = Some(message.into());
        self
    }

    pub fn with_metadata_unavailable(mut self) -> Self {
        self.metadata_unavailable = true;
        self
    }

    /// Number of `column_names`/`column_types` calls seen so far.
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowCursor for MemoryCursor {
    fn column_names(&mut self) -> Result<Vec<String>, BoxError> {
        self.metadata_calls += 1;
        if self.metadata_unavailable {
            return Err("column metadata unavailable".into());
        }
        Ok(self.names.clone())
    }

    fn column_types(&mut self) -> Result<Vec<ColumnType>, BoxError> {
        self.metadata_calls += 1;
        if self.metadata_unavailable {
            return Err("column metadata unavailable".into());
        }
        Ok(self.types.clone())
    }

    fn advance(&mut self) -> bool {
        self.current = self.rows.pop_front();
        self.current.is_some()
    }

    fn scan(&mut self, targets: &mut [ScanValue]) -> Result<(), BoxError> {
        let row = self
            .current
            .as_ref()
            .ok_or("scan called without a current row")?;
        if row.len() != targets.len() {
            return Err(format!(
                "expected {} destination arguments in scan, not {}",
                row.len(),
                targets.len()
            )
            .into());
        }
        for (index, (target, cell)) in targets.iter_mut().zip(row).enumerate() {
            assign(target, cell).map_err(|err| -> BoxError {
                let name = self.names.get(index).map(String::as_str).unwrap_or("?");
                format!("scan error on column index {index}, name {name:?}: {err}").into()
            })?;
        }
        Ok(())
    }

    fn take_error(&mut self) -> Option<BoxError> {
        if !self.rows.is_empty() {
            return None;
        }
        self.trailing_error.take().map(BoxError::from)
    }
}

fn mismatch(cell: &CellValue, target: &str) -> BoxError {
    format!("cannot store {cell:?} into {target}").into()
}

fn int_from<T>(cell: &CellValue, target: &str) -> Result<T, BoxError>
where
    T: TryFrom<i64> + TryFrom<u64> + FromStr,
{
    let converted = match cell {
        CellValue::Int(value) => <T as TryFrom<i64>>::try_from(*value).ok(),
        CellValue::UInt(value) => <T as TryFrom<u64>>::try_from(*value).ok(),
        CellValue::Bool(value) => <T as TryFrom<u64>>::try_from(u64::from(*value)).ok(),
        CellValue::Text(text) => text.trim().parse::<T>().ok(),
        _ => None,
    };
    converted.ok_or_else(|| mismatch(cell, target))
}

fn float_from(cell: &CellValue, target: &str) -> Result<f64, BoxError> {
    match cell {
        CellValue::Float(value) => Ok(*value),
        CellValue::Int(value) => Ok(*value as f64),
        CellValue::UInt(value) => Ok(*value as f64),
        CellValue::Text(text) => text.trim().parse().map_err(|_| mismatch(cell, target)),
        _ => Err(mismatch(cell, target)),
    }
}

fn assign(target: &mut ScanValue, cell: &CellValue) -> Result<(), BoxError> {
    if matches!(cell, CellValue::Null) {
        target.set_null();
        return Ok(());
    }
    match target {
        ScanValue::Text(_) => match cell {
            CellValue::Text(text) => target.set_text(text),
            CellValue::Bytes(bytes) => target.set_text(&String::from_utf8_lossy(bytes)),
            CellValue::Bool(value) => target.set_text(if *value { "true" } else { "false" }),
            CellValue::Int(value) => target.set_text(&value.to_string()),
            CellValue::UInt(value) => target.set_text(&value.to_string()),
            CellValue::Float(value) => target.set_text(&value.to_string()),
            CellValue::Timestamp(ts) => target.set_text(&ts.format(&Rfc3339)?),
            CellValue::Null => {}
        },
        ScanValue::Bytes(_) => match cell {
            CellValue::Text(text) => target.set_bytes(text.as_bytes()),
            CellValue::Bytes(bytes) => target.set_bytes(bytes),
            _ => return Err(mismatch(cell, "bytes")),
        },
        ScanValue::I8(slot) => *slot = Some(int_from(cell, "i8")?),
        ScanValue::I16(slot) => *slot = Some(int_from(cell, "i16")?),
        ScanValue::I32(slot) => *slot = Some(int_from(cell, "i32")?),
        ScanValue::I64(slot) => *slot = Some(int_from(cell, "i64")?),
        ScanValue::U8(slot) => *slot = Some(int_from(cell, "u8")?),
        ScanValue::U16(slot) => *slot = Some(int_from(cell, "u16")?),
        ScanValue::U32(slot) => *slot = Some(int_from(cell, "u32")?),
        ScanValue::U64(slot) => *slot = Some(int_from(cell, "u64")?),
        ScanValue::F32(slot) => *slot = Some(float_from(cell, "f32")? as f32),
        ScanValue::F64(slot) => *slot = Some(float_from(cell, "f64")?),
        ScanValue::Bool(slot) => {
            *slot = Some(match cell {
                CellValue::Bool(value) => *value,
                CellValue::Int(0) | CellValue::UInt(0) => false,
                CellValue::Int(1) | CellValue::UInt(1) => true,
                CellValue::Text(text) => match text.trim() {
                    "true" | "1" => true,
                    "false" | "0" => false,
                    _ => return Err(mismatch(cell, "bool")),
                },
                _ => return Err(mismatch(cell, "bool")),
            })
        }
        ScanValue::Timestamp(slot) => {
            *slot = Some(match cell {
                CellValue::Timestamp(ts) => *ts,
                CellValue::Text(text) => OffsetDateTime::parse(text.trim(), &Rfc3339)?,
                _ => return Err(mismatch(cell, "timestamp")),
            })
        }
        // The driver hands back a value we cannot encode; encoding reports it.
        ScanValue::Unsupported(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CellValue, MemoryCursor, RowCursor, suggest_kind};
    use crate::core::scan::{ColumnType, ScanKind, ScanValue};
    use time::macros::datetime;

    fn cursor() -> MemoryCursor {
        MemoryCursor::new([
            ("widget_id", ColumnType::new("VARCHAR", Some(ScanKind::Text))),
            ("count", ColumnType::new("INT", Some(ScanKind::I32))),
        ])
    }

    #[test]
    fn suggests_kinds_for_common_types() {
        assert_eq!(suggest_kind("varchar"), Some(ScanKind::Text));
        assert_eq!(suggest_kind("BIGINT UNSIGNED"), Some(ScanKind::U64));
        assert_eq!(suggest_kind("tinyint"), Some(ScanKind::I8));
        assert_eq!(suggest_kind("DATETIME"), Some(ScanKind::Timestamp));
        assert_eq!(suggest_kind("GEOMETRY"), None);
    }

    #[test]
    fn scans_rows_in_order_then_exhausts() {
        let mut cursor = cursor()
            .with_row(vec![CellValue::Text("abc".into()), CellValue::Int(1)])
            .with_row(vec![CellValue::Null, CellValue::Text(" 2 ".into())]);
        let mut targets = vec![ScanValue::Text(None), ScanValue::I32(None)];

        assert!(cursor.advance());
        cursor.scan(&mut targets).expect("scan");
        assert_eq!(
            targets,
            vec![ScanValue::Text(Some("abc".into())), ScanValue::I32(Some(1))]
        );

        assert!(cursor.advance());
        cursor.scan(&mut targets).expect("scan");
        assert_eq!(targets, vec![ScanValue::Text(None), ScanValue::I32(Some(2))]);

        assert!(!cursor.advance());
        assert!(cursor.take_error().is_none());
    }

    #[test]
    fn overflow_is_scan_error() {
        let mut cursor = MemoryCursor::new([("n", ColumnType::new("TINYINT", Some(ScanKind::I8)))])
            .with_row(vec![CellValue::Int(300)]);
        let mut targets = vec![ScanValue::I8(None)];
        assert!(cursor.advance());
        let err = cursor.scan(&mut targets).unwrap_err();
        assert!(err.to_string().contains("name \"n\""));
    }

    #[test]
    fn converts_between_text_and_typed_targets() {
        let ts = datetime!(2024-02-01 10:00 UTC);
        let mut cursor = MemoryCursor::new([
            ("a", ColumnType::new("BIGINT", Some(ScanKind::I64))),
            ("b", ColumnType::new("TIMESTAMP", Some(ScanKind::Timestamp))),
            ("c", ColumnType::new("BOOL", Some(ScanKind::Bool))),
        ])
        .with_row(vec![
            CellValue::UInt(18446744073709551615),
            CellValue::Timestamp(ts),
            CellValue::Int(1),
        ]);
        let mut targets = vec![
            ScanValue::Text(None),
            ScanValue::Text(None),
            ScanValue::Bool(None),
        ];
        assert!(cursor.advance());
        cursor.scan(&mut targets).expect("scan");
        assert_eq!(
            targets,
            vec![
                ScanValue::Text(Some("18446744073709551615".into())),
                ScanValue::Text(Some("2024-02-01T10:00:00Z".into())),
                ScanValue::Bool(Some(true)),
            ]
        );
    }

    #[test]
    fn trailing_error_only_after_exhaustion() {
        let mut cursor = cursor()
            .with_row(vec![CellValue::Text("abc".into()), CellValue::Int(1)])
            .with_trailing_error("connection reset");
        assert!(cursor.take_error().is_none());
        assert!(cursor.advance());
        assert!(!cursor.advance());
        let err = cursor.take_error().expect("error");
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn metadata_calls_are_counted() {
        let mut cursor = cursor().with_metadata_unavailable();
        assert!(cursor.column_names().is_err());
        assert!(cursor.column_types().is_err());
        assert_eq!(cursor.metadata_calls(), 2);
    }
}
