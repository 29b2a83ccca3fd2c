//! Purpose: Writer configuration: override tables, raw-JSON routing, legacy quirks.
//! Exports: `WriterOptions`, `DEFAULT_RAW_JSON_SUFFIX`.
//! Role: Injectable policy so the engine carries no deployment-specific column names.
//! Invariants: Every field has a default; config files may name any subset.
//! Invariants: Unknown config keys are rejected rather than ignored.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};
use crate::core::resolve::{ScanOverride, TypeOverride};

pub const DEFAULT_RAW_JSON_SUFFIX: &str = "_json";
const DEFAULT_ROW_CAPACITY: usize = 1024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriterOptions {
    /// Column-name rules, first match wins.
    pub scan_overrides: Vec<ScanOverride>,
    /// Declared-type rules, consulted when no name rule matched.
    pub type_overrides: Vec<TypeOverride>,
    /// Columns ending with one of these are emitted as pre-formed JSON.
    pub raw_json_suffixes: Vec<String>,
    /// Emit `[]` instead of `null` for an empty raw-JSON value.
    pub empty_raw_as_array: bool,
    pub row_capacity: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            scan_overrides: Vec::new(),
            type_overrides: Vec::new(),
            raw_json_suffixes: vec![DEFAULT_RAW_JSON_SUFFIX.to_string()],
            empty_raw_as_array: false,
            row_capacity: DEFAULT_ROW_CAPACITY,
        }
    }
}

impl WriterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan_override(mut self, rule: ScanOverride) -> Self {
        self.scan_overrides.push(rule);
        self
    }

    pub fn with_type_override(mut self, rule: TypeOverride) -> Self {
        self.type_overrides.push(rule);
        self
    }

    pub fn with_raw_json_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.raw_json_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_empty_raw_as_array(mut self, enabled: bool) -> Self {
        self.empty_raw_as_array = enabled;
        self
    }

    pub fn is_raw_json(&self, column: &str) -> bool {
        self.raw_json_suffixes
            .iter()
            .any(|suffix| !suffix.is_empty() && column.ends_with(suffix.as_str()))
    }

    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        serde_json::from_str(input).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("invalid writer config: {err}"))
                .with_hint("Config keys: scan_overrides, type_overrides, raw_json_suffixes, empty_raw_as_array, row_capacity.")
                .with_source(err)
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("failed to read config {}", path.display()))
                .with_source(err)
        })?;
        Self::from_json_str(&text)
    }
}
