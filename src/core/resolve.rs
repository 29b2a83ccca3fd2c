// Scan-target resolution: name overrides, then type overrides, then the driver suggestion.
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};
use crate::core::scan::{ColumnType, ScanKind, ScanValue};

/// Column-name matcher used by override rules.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamePattern {
    Exact(String),
    Suffix(String),
}

impl NamePattern {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Exact(exact) => name == exact,
            NamePattern::Suffix(suffix) => name.ends_with(suffix.as_str()),
        }
    }
}

/// Force a representation for columns whose name matches `pattern`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScanOverride {
    pub pattern: NamePattern,
    pub kind: ScanKind,
}

impl ScanOverride {
    pub fn exact(name: impl Into<String>, kind: ScanKind) -> Self {
        Self {
            pattern: NamePattern::Exact(name.into()),
            kind,
        }
    }

    pub fn suffix(suffix: impl Into<String>, kind: ScanKind) -> Self {
        Self {
            pattern: NamePattern::Suffix(suffix.into()),
            kind,
        }
    }
}

/// Force a representation for a declared database type, optionally only when
/// the driver suggests a specific kind for it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TypeOverride {
    pub database_type: String,
    #[serde(default)]
    pub suggested: Option<ScanKind>,
    pub kind: ScanKind,
}

impl TypeOverride {
    fn matches(&self, column_type: &ColumnType) -> bool {
        if !self
            .database_type
            .eq_ignore_ascii_case(&column_type.database_type)
        {
            return false;
        }
        match self.suggested {
            Some(kind) => column_type.suggested == Some(kind),
            None => true,
        }
    }
}

#[derive(Debug)]
pub struct Resolution {
    pub targets: Vec<ScanValue>,
    pub overridden: usize,
}

pub fn resolve_targets(
    names: &[String],
    types: &[ColumnType],
    scan_overrides: &[ScanOverride],
    type_overrides: &[TypeOverride],
) -> Result<Resolution, Error> {
    if names.len() != types.len() {
        return Err(Error::new(ErrorKind::Metadata).with_message(format!(
            "cursor reported {} column names but {} column types",
            names.len(),
            types.len()
        )));
    }

    let mut overridden = 0;
    let targets = names
        .iter()
        .zip(types)
        .map(|(name, column_type)| {
            let forced = scan_overrides
                .iter()
                .find(|rule| rule.pattern.matches(name))
                .map(|rule| rule.kind)
                .or_else(|| {
                    type_overrides
                        .iter()
                        .find(|rule| rule.matches(column_type))
                        .map(|rule| rule.kind)
                });
            match forced {
                Some(kind) => {
                    overridden += 1;
                    ScanValue::empty(kind)
                }
                None => match column_type.suggested {
                    Some(kind) => ScanValue::empty(kind),
                    None => ScanValue::Unsupported(column_type.database_type.clone()),
                },
            }
        })
        .collect();

    Ok(Resolution {
        targets,
        overridden,
    })
}
