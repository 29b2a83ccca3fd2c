//! Purpose: Append the JSON literal for one scanned value to a row buffer.
//! Exports: `needs_escape`, `write_str`, `write_value`, `write_raw_value`.
//! Role: Closed dispatch over `ScanValue`; the hot path of the row streamer.
//! Invariants: Unsupported representations fail; nothing is stringified by guess.
//! Invariants: Only printable ASCII without `"`/`\` takes the unescaped fast path;
//!   everything else goes through serde_json's string encoder. This is not a UTF-8 check.
//! Invariants: Borrowed views of byte values never outlive the call.
use std::io::Write;

use bstr::ByteSlice;
use time::format_description::well_known::Rfc3339;

use crate::core::error::{Error, ErrorKind};
use crate::core::scan::ScanValue;

const NULL: &[u8] = b"null";

/// True when `bytes` contains anything outside printable ASCII, or a quote or backslash.
pub fn needs_escape(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .any(|&b| !(0x20..=0x7e).contains(&b) || b == b'"' || b == b'\\')
}

/// Append `text` as a quoted JSON string.
pub fn write_str(out: &mut Vec<u8>, text: &str) -> Result<(), Error> {
    if needs_escape(text.as_bytes()) {
        return serde_json::to_writer(&mut *out, text).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("string encode failed")
                .with_source(err)
        });
    }
    out.reserve(text.len() + 2);
    out.push(b'"');
    out.extend_from_slice(text.as_bytes());
    out.push(b'"');
    Ok(())
}

fn write_int<I: itoa::Integer>(out: &mut Vec<u8>, value: Option<I>) {
    match value {
        Some(value) => {
            let mut buf = itoa::Buffer::new();
            out.extend_from_slice(buf.format(value).as_bytes());
        }
        None => out.extend_from_slice(NULL),
    }
}

fn write_float<F: std::fmt::Display>(
    out: &mut Vec<u8>,
    value: Option<F>,
    finite: bool,
) -> Result<(), Error> {
    match value {
        // Display gives the shortest round-trip decimal without exponent.
        Some(value) if finite => write!(out, "{value}").map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("float encode failed")
                .with_source(err)
        }),
        _ => {
            out.extend_from_slice(NULL);
            Ok(())
        }
    }
}

fn unsupported(type_name: &str) -> Error {
    Error::new(ErrorKind::UnsupportedType)
        .with_message(format!("no JSON encoding for scan type {type_name}"))
        .with_hint("Add a scan override mapping this column to a supported kind.")
}

/// Append the JSON literal for `value`. `scratch` is cleared and reused for
/// formatting that may fail part-way.
pub fn write_value(out: &mut Vec<u8>, scratch: &mut Vec<u8>, value: &ScanValue) -> Result<(), Error> {
    match value {
        ScanValue::Text(Some(text)) => write_str(out, text)?,
        ScanValue::Bytes(Some(bytes)) => write_str(out, &bytes.to_str_lossy())?,
        ScanValue::I8(v) => write_int(out, *v),
        ScanValue::I16(v) => write_int(out, *v),
        ScanValue::I32(v) => write_int(out, *v),
        ScanValue::I64(v) => write_int(out, *v),
        ScanValue::U8(v) => write_int(out, *v),
        ScanValue::U16(v) => write_int(out, *v),
        ScanValue::U32(v) => write_int(out, *v),
        ScanValue::U64(v) => write_int(out, *v),
        ScanValue::F32(v) => write_float(out, *v, v.is_some_and(f32::is_finite))?,
        ScanValue::F64(v) => write_float(out, *v, v.is_some_and(f64::is_finite))?,
        ScanValue::Bool(Some(true)) => out.extend_from_slice(b"true"),
        ScanValue::Bool(Some(false)) => out.extend_from_slice(b"false"),
        ScanValue::Timestamp(Some(ts)) => {
            scratch.clear();
            // Years outside 0..=9999 and sub-minute offsets cannot be RFC 3339.
            if ts.format_into(scratch, &Rfc3339).is_ok() {
                out.push(b'"');
                out.extend_from_slice(scratch);
                out.push(b'"');
            } else {
                out.extend_from_slice(NULL);
            }
        }
        ScanValue::Text(None)
        | ScanValue::Bytes(None)
        | ScanValue::Bool(None)
        | ScanValue::Timestamp(None) => out.extend_from_slice(NULL),
        ScanValue::Unsupported(type_name) => return Err(unsupported(type_name)),
    }
    Ok(())
}

/// Append `value` as already-formed JSON. Text and bytes are copied verbatim;
/// other kinds have no quoting to skip and use [`write_value`].
///
/// An empty value is not JSON on its own, so it becomes `null`, or `[]` when
/// `empty_as_array` is set (legacy behavior, byte columns only).
pub fn write_raw_value(
    out: &mut Vec<u8>,
    scratch: &mut Vec<u8>,
    value: &ScanValue,
    empty_as_array: bool,
) -> Result<(), Error> {
    let (raw, is_bytes): (&[u8], bool) = match value {
        ScanValue::Text(Some(text)) => (text.as_bytes(), false),
        ScanValue::Bytes(Some(bytes)) => (bytes, true),
        _ => return write_value(out, scratch, value),
    };
    if raw.is_empty() {
        out.extend_from_slice(if empty_as_array && is_bytes { b"[]" } else { NULL });
    } else {
        out.extend_from_slice(raw);
    }
    Ok(())
}
