//! Purpose: Stream cursor rows into a sink as JSON objects, one flush per row.
//! Exports: `RowsWriter`, `FieldOutcome`, `FieldHook`, `WriterState`.
//! Role: Row streamer; drives resolution, scanning, per-column encoding and comma bookkeeping.
//! Invariants: Scan targets are resolved once per result set and reused until `reset`.
//! Invariants: A separator precedes every emitted field after the first; skipped fields leave none.
//! Invariants: Bytes flushed before a failure stay flushed; callers needing atomic output
//!   must stage the sink themselves.
//! Invariants: One writer per active result set; nothing here is synchronized.
use std::io::Write;

use tracing::{debug, trace};

use crate::core::cursor::RowCursor;
use crate::core::encode::{write_raw_value, write_str, write_value};
use crate::core::error::{BoxError, Error, ErrorKind};
use crate::core::options::WriterOptions;
use crate::core::resolve::resolve_targets;
use crate::core::scan::ScanValue;
use crate::core::sink::{JSON_CONTENT_TYPE, Sink};

/// What a field hook did with a column.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldOutcome {
    /// Not handled; use the default encoder.
    Default,
    /// The hook wrote the value literal, trusted to be valid JSON.
    Handled,
    /// Omit the column, name and value, from this row.
    Skip,
}

/// Per-column override: `(out, column_name, column_index, value)`.
///
/// `out` is a scratch buffer reused for every column; anything written is
/// only kept when the hook returns [`FieldOutcome::Handled`].
pub type FieldHook =
    Box<dyn FnMut(&mut Vec<u8>, &str, usize, &ScanValue) -> Result<FieldOutcome, BoxError> + Send>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriterState {
    Unresolved,
    Ready,
}

pub struct RowsWriter<W> {
    sink: W,
    options: WriterOptions,
    hook: Option<FieldHook>,
    state: WriterState,
    columns: Vec<String>,
    keys: Vec<Vec<u8>>,
    raw: Vec<bool>,
    targets: Vec<ScanValue>,
    row_buf: Vec<u8>,
    value_buf: Vec<u8>,
    rows_in_response: u64,
}

impl<W: Write> RowsWriter<W> {
    pub fn new(sink: W) -> Self {
        Self::with_options(sink, WriterOptions::default())
    }

    pub fn with_options(sink: W, options: WriterOptions) -> Self {
        Self {
            sink,
            options,
            hook: None,
            state: WriterState::Unresolved,
            columns: Vec::new(),
            keys: Vec::new(),
            raw: Vec::new(),
            targets: Vec::new(),
            row_buf: Vec::new(),
            value_buf: Vec::new(),
            rows_in_response: 0,
        }
    }

    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Vec<u8>, &str, usize, &ScanValue) -> Result<FieldOutcome, BoxError>
            + Send
            + 'static,
    {
        self.set_hook(hook);
        self
    }

    pub fn set_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&mut Vec<u8>, &str, usize, &ScanValue) -> Result<FieldOutcome, BoxError>
            + Send
            + 'static,
    {
        self.hook = Some(Box::new(hook));
    }

    pub fn clear_hook(&mut self) {
        self.hook = None;
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values scanned for the most recent row.
    pub fn targets(&self) -> &[ScanValue] {
        &self.targets
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    pub fn into_sink(self) -> W {
        self.sink
    }

    /// Resolve column names and scan targets; a no-op once resolved.
    pub fn resolve<C: RowCursor + ?Sized>(&mut self, cursor: &mut C) -> Result<(), Error> {
        if self.state == WriterState::Ready {
            return Ok(());
        }

        let names = cursor.column_names().map_err(metadata_error)?;
        let types = cursor.column_types().map_err(metadata_error)?;
        let resolution = resolve_targets(
            &names,
            &types,
            &self.options.scan_overrides,
            &self.options.type_overrides,
        )?;

        self.keys = names
            .iter()
            .map(|name| encode_key(name))
            .collect::<Result<_, _>>()?;
        self.raw = names
            .iter()
            .map(|name| self.options.is_raw_json(name))
            .collect();
        self.targets = resolution.targets;
        self.columns = names;
        self.row_buf.reserve(self.options.row_capacity);
        self.rows_in_response = 0;
        self.state = WriterState::Ready;

        debug!(
            columns = self.columns.len(),
            overridden = resolution.overridden,
            raw_json = self.raw.iter().filter(|raw| **raw).count(),
            "resolved scan targets"
        );
        Ok(())
    }

    /// Scan the current row and write it as `{...}\n`.
    pub fn write_row<C: RowCursor + ?Sized>(&mut self, cursor: &mut C) -> Result<(), Error> {
        self.write_row_with(cursor, false)
    }

    /// Like [`write_row`](Self::write_row), with a leading comma on every row but the first.
    pub fn write_comma_row<C: RowCursor + ?Sized>(&mut self, cursor: &mut C) -> Result<(), Error> {
        self.write_row_with(cursor, true)
    }

    pub fn write_row_with<C: RowCursor + ?Sized>(
        &mut self,
        cursor: &mut C,
        leading_comma: bool,
    ) -> Result<(), Error> {
        self.resolve(cursor)?;

        self.row_buf.clear();
        if leading_comma && self.rows_in_response > 0 {
            self.row_buf.push(b',');
        }

        cursor.scan(&mut self.targets).map_err(|err| {
            Error::new(ErrorKind::Scan)
                .with_message("row scan failed")
                .with_boxed_source(err)
        })?;

        self.row_buf.push(b'{');
        let mut emitted = 0usize;
        for index in 0..self.columns.len() {
            if self.write_field(index, emitted > 0)? {
                emitted += 1;
            }
        }
        self.row_buf.extend_from_slice(b"}\n");

        self.flush_row()?;
        self.rows_in_response += 1;
        Ok(())
    }

    /// Write every remaining row, comma-separated, without enclosing brackets.
    /// Each call starts a new sequence: its first row never carries a comma.
    /// Returns the number of rows written.
    pub fn write_comma_rows<C: RowCursor + ?Sized>(&mut self, cursor: &mut C) -> Result<u64, Error> {
        self.rows_in_response = 0;
        let mut written = 0u64;
        while cursor.advance() {
            self.write_comma_row(cursor)?;
            written += 1;
        }
        if let Some(err) = cursor.take_error() {
            return Err(Error::new(ErrorKind::Iteration)
                .with_message("cursor iteration failed")
                .with_boxed_source(err));
        }
        Ok(written)
    }

    /// Write the named columns of the last scanned row as `"name":value` pairs,
    /// in column order, without braces.
    pub fn write_fields(&mut self, names: &[&str]) -> Result<(), Error> {
        if self.state != WriterState::Ready {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("no row has been scanned")
                .with_hint("Call write_row or write_comma_row before write_fields."));
        }

        self.row_buf.clear();
        let mut emitted = 0usize;
        for index in 0..self.columns.len() {
            if !names.contains(&self.columns[index].as_str()) {
                continue;
            }
            if self.write_field(index, emitted > 0)? {
                emitted += 1;
            }
        }
        self.flush_row()
    }

    /// Forget the bound result set so the writer can take a differently-shaped one.
    /// Buffer capacity is kept.
    pub fn reset(&mut self) {
        self.state = WriterState::Unresolved;
        self.columns.clear();
        self.keys.clear();
        self.raw.clear();
        self.targets.clear();
        self.row_buf.clear();
        self.value_buf.clear();
        self.rows_in_response = 0;
        trace!("writer reset");
    }

    fn write_field(&mut self, index: usize, separate: bool) -> Result<bool, Error> {
        let mark = self.row_buf.len();
        if separate {
            self.row_buf.push(b',');
        }
        self.row_buf.extend_from_slice(&self.keys[index]);

        let name = &self.columns[index];
        let value = &self.targets[index];

        if let Some(hook) = self.hook.as_mut() {
            self.value_buf.clear();
            let outcome = hook(&mut self.value_buf, name, index, value)
                .map_err(|err| hook_error(err, name, index))?;
            match outcome {
                FieldOutcome::Skip => {
                    self.row_buf.truncate(mark);
                    return Ok(false);
                }
                FieldOutcome::Handled => {
                    debug_assert!(!self.value_buf.is_empty(), "hook handled {name} without output");
                    self.row_buf.extend_from_slice(&self.value_buf);
                    return Ok(true);
                }
                FieldOutcome::Default => {}
            }
        }

        let encoded = if self.raw[index] {
            write_raw_value(
                &mut self.row_buf,
                &mut self.value_buf,
                value,
                self.options.empty_raw_as_array,
            )
        } else {
            write_value(&mut self.row_buf, &mut self.value_buf, value)
        };
        encoded.map_err(|err| err.with_column(name.as_str(), index))?;
        Ok(true)
    }

    fn flush_row(&mut self) -> Result<(), Error> {
        let result = self.sink.write_all(&self.row_buf);
        self.row_buf.clear();
        result.map_err(write_error)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.sink.write_all(bytes).map_err(write_error)
    }
}

impl<W: Sink> RowsWriter<W> {
    /// Write the whole result set as a JSON array, setting the sink's content
    /// type first when it has one and it is unset.
    pub fn write_response<C: RowCursor + ?Sized>(&mut self, cursor: &mut C) -> Result<u64, Error> {
        if let Some(meta) = self.sink.metadata() {
            let unset = meta.content_type().is_none_or(str::is_empty);
            if unset {
                meta.set_content_type(JSON_CONTENT_TYPE);
            }
        }

        self.write_bytes(b"[\n")?;
        let rows = self.write_comma_rows(cursor)?;
        self.write_bytes(b"]\n")?;

        debug!(rows, "wrote response");
        Ok(rows)
    }
}

fn encode_key(name: &str) -> Result<Vec<u8>, Error> {
    let mut key = Vec::with_capacity(name.len() + 3);
    write_str(&mut key, name)?;
    key.push(b':');
    Ok(key)
}

fn metadata_error(err: BoxError) -> Error {
    Error::new(ErrorKind::Metadata)
        .with_message("column metadata unavailable")
        .with_boxed_source(err)
}

fn hook_error(err: BoxError, name: &str, index: usize) -> Error {
    // Hooks that already speak our error type keep it unchanged.
    match err.downcast::<Error>() {
        Ok(err) => *err,
        Err(err) => Error::new(ErrorKind::Hook)
            .with_message("field hook failed")
            .with_column(name, index)
            .with_boxed_source(err),
    }
}

fn write_error(err: std::io::Error) -> Error {
    Error::new(ErrorKind::Write)
        .with_message("sink write failed")
        .with_source(err)
}
