// Scan representations: the closed set of nullable targets a column value lands in.
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Representation a column is decoded into.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanKind {
    Text,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Timestamp,
    Bytes,
}

/// Declared type information reported by a cursor for one column.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnType {
    /// Source type name, e.g. `VARCHAR` or `BIGINT UNSIGNED`.
    pub database_type: String,
    /// Representation the driver suggests, `None` when it has no mapping we know.
    pub suggested: Option<ScanKind>,
}

impl ColumnType {
    pub fn new(database_type: impl Into<String>, suggested: Option<ScanKind>) -> Self {
        Self {
            database_type: database_type.into(),
            suggested,
        }
    }
}

/// A reusable, per-column holder for the current row's value.
#[derive(Clone, Debug, PartialEq)]
pub enum ScanValue {
    Text(Option<String>),
    I8(Option<i8>),
    I16(Option<i16>),
    I32(Option<i32>),
    I64(Option<i64>),
    U8(Option<u8>),
    U16(Option<u16>),
    U32(Option<u32>),
    U64(Option<u64>),
    F32(Option<f32>),
    F64(Option<f64>),
    Bool(Option<bool>),
    Timestamp(Option<OffsetDateTime>),
    Bytes(Option<Vec<u8>>),
    /// Driver representation outside the encoder's dispatch; carries the type name.
    Unsupported(String),
}

impl ScanValue {
    /// Fresh zero-valued (null) holder for `kind`.
    pub fn empty(kind: ScanKind) -> Self {
        match kind {
            ScanKind::Text => ScanValue::Text(None),
            ScanKind::I8 => ScanValue::I8(None),
            ScanKind::I16 => ScanValue::I16(None),
            ScanKind::I32 => ScanValue::I32(None),
            ScanKind::I64 => ScanValue::I64(None),
            ScanKind::U8 => ScanValue::U8(None),
            ScanKind::U16 => ScanValue::U16(None),
            ScanKind::U32 => ScanValue::U32(None),
            ScanKind::U64 => ScanValue::U64(None),
            ScanKind::F32 => ScanValue::F32(None),
            ScanKind::F64 => ScanValue::F64(None),
            ScanKind::Bool => ScanValue::Bool(None),
            ScanKind::Timestamp => ScanValue::Timestamp(None),
            ScanKind::Bytes => ScanValue::Bytes(None),
        }
    }

    pub fn kind(&self) -> Option<ScanKind> {
        let kind = match self {
            ScanValue::Text(_) => ScanKind::Text,
            ScanValue::I8(_) => ScanKind::I8,
            ScanValue::I16(_) => ScanKind::I16,
            ScanValue::I32(_) => ScanKind::I32,
            ScanValue::I64(_) => ScanKind::I64,
            ScanValue::U8(_) => ScanKind::U8,
            ScanValue::U16(_) => ScanKind::U16,
            ScanValue::U32(_) => ScanKind::U32,
            ScanValue::U64(_) => ScanKind::U64,
            ScanValue::F32(_) => ScanKind::F32,
            ScanValue::F64(_) => ScanKind::F64,
            ScanValue::Bool(_) => ScanKind::Bool,
            ScanValue::Timestamp(_) => ScanKind::Timestamp,
            ScanValue::Bytes(_) => ScanKind::Bytes,
            ScanValue::Unsupported(_) => return None,
        };
        Some(kind)
    }

    pub fn is_null(&self) -> bool {
        match self {
            ScanValue::Text(v) => v.is_none(),
            ScanValue::I8(v) => v.is_none(),
            ScanValue::I16(v) => v.is_none(),
            ScanValue::I32(v) => v.is_none(),
            ScanValue::I64(v) => v.is_none(),
            ScanValue::U8(v) => v.is_none(),
            ScanValue::U16(v) => v.is_none(),
            ScanValue::U32(v) => v.is_none(),
            ScanValue::U64(v) => v.is_none(),
            ScanValue::F32(v) => v.is_none(),
            ScanValue::F64(v) => v.is_none(),
            ScanValue::Bool(v) => v.is_none(),
            ScanValue::Timestamp(v) => v.is_none(),
            ScanValue::Bytes(v) => v.is_none(),
            ScanValue::Unsupported(_) => false,
        }
    }

    pub fn set_null(&mut self) {
        if let Some(kind) = self.kind() {
            *self = ScanValue::empty(kind);
        }
    }

    /// Borrow the value as text when it is a non-null text or UTF-8 byte value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScanValue::Text(Some(text)) => Some(text.as_str()),
            ScanValue::Bytes(Some(bytes)) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// Replace the text value, reusing the held allocation when there is one.
    pub fn set_text(&mut self, value: &str) {
        if let ScanValue::Text(Some(buf)) = self {
            buf.clear();
            buf.push_str(value);
            return;
        }
        *self = ScanValue::Text(Some(value.to_string()));
    }

    /// Replace the byte value, reusing the held allocation when there is one.
    pub fn set_bytes(&mut self, value: &[u8]) {
        if let ScanValue::Bytes(Some(buf)) = self {
            buf.clear();
            buf.extend_from_slice(value);
            return;
        }
        *self = ScanValue::Bytes(Some(value.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::{ScanKind, ScanValue};

    #[test]
    fn empty_holders_are_null_and_keep_kind() {
        let kinds = [
            ScanKind::Text,
            ScanKind::I8,
            ScanKind::I64,
            ScanKind::U64,
            ScanKind::F32,
            ScanKind::Bool,
            ScanKind::Timestamp,
            ScanKind::Bytes,
        ];
        for kind in kinds {
            let value = ScanValue::empty(kind);
            assert!(value.is_null());
            assert_eq!(value.kind(), Some(kind));
        }
    }

    #[test]
    fn set_text_reuses_allocation() {
        let mut value = ScanValue::Text(Some(String::with_capacity(64)));
        value.set_text("abc");
        let ptr = match &value {
            ScanValue::Text(Some(text)) => text.as_ptr(),
            other => panic!("unexpected {other:?}"),
        };
        value.set_text("def");
        match &value {
            ScanValue::Text(Some(text)) => {
                assert_eq!(text, "def");
                assert_eq!(text.as_ptr(), ptr);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn set_null_keeps_representation() {
        let mut value = ScanValue::I32(Some(7));
        value.set_null();
        assert_eq!(value, ScanValue::I32(None));

        let mut unsupported = ScanValue::Unsupported("GEOMETRY".to_string());
        unsupported.set_null();
        assert!(!unsupported.is_null());
    }

    #[test]
    fn scan_kind_names_are_snake_case() {
        let text = serde_json::to_string(&ScanKind::U64).expect("encode");
        assert_eq!(text, "\"u64\"");
        let kind: ScanKind = serde_json::from_str("\"timestamp\"").expect("decode");
        assert_eq!(kind, ScanKind::Timestamp);
    }
}
