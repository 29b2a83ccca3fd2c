//! Purpose: Define the stable public Rust API boundary for sqljson.
//! Exports: Writer, cursor and sink contracts, scan types, configuration, errors.
//! Role: Public, additive-only surface over the `core` modules.
//! Invariants: Everything a driver or HTTP adapter needs is re-exported here.
//! Invariants: Names exported here do not change meaning between minor versions.

pub use crate::core::cursor::{CellValue, MemoryCursor, RowCursor, suggest_kind};
pub use crate::core::encode::{needs_escape, write_raw_value, write_str, write_value};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{BoxError, Error, ErrorKind};
pub use crate::core::options::{DEFAULT_RAW_JSON_SUFFIX, WriterOptions};
pub use crate::core::resolve::{NamePattern, ScanOverride, TypeOverride};
pub use crate::core::scan::{ColumnType, ScanKind, ScanValue};
pub use crate::core::sink::{ContentType, JSON_CONTENT_TYPE, ResponseBuffer, Sink};
pub use crate::core::writer::{FieldHook, FieldOutcome, RowsWriter, WriterState};
