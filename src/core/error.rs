use std::error::Error as StdError;
use std::fmt;

/// Boxed error returned by cursors and override hooks.
pub type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    Metadata,
    Scan,
    Iteration,
    UnsupportedType,
    Hook,
    Write,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    column: Option<String>,
    column_index: Option<usize>,
    source: Option<BoxError>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            column: None,
            column_index: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn column_index(&self) -> Option<usize> {
        self.column_index
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_column(mut self, name: impl Into<String>, index: usize) -> Self {
        self.column = Some(name.into());
        self.column_index = Some(index);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_boxed_source(mut self, source: BoxError) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(column) = &self.column {
            write!(f, " (column: {column}")?;
            if let Some(index) = self.column_index {
                write!(f, " #{index}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::Metadata => 3,
        ErrorKind::Scan => 4,
        ErrorKind::Iteration => 5,
        ErrorKind::UnsupportedType => 6,
        ErrorKind::Hook => 7,
        ErrorKind::Write => 8,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};
    use std::error::Error as StdError;
    use std::io;

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::Metadata, 3),
            (ErrorKind::Scan, 4),
            (ErrorKind::Iteration, 5),
            (ErrorKind::UnsupportedType, 6),
            (ErrorKind::Hook, 7),
            (ErrorKind::Write, 8),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_column_context() {
        let err = Error::new(ErrorKind::UnsupportedType)
            .with_message("no encoding for uuid")
            .with_column("widget_id", 2);
        assert_eq!(
            err.to_string(),
            "UnsupportedType: no encoding for uuid (column: widget_id #2)"
        );
    }

    #[test]
    fn source_is_kept_verbatim() {
        let err = Error::new(ErrorKind::Write)
            .with_source(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "pipe closed");
    }
}
