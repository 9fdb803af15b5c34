//! Field-level construction errors that stay machine-readable while they
//! propagate.
//!
//! - **`DataCreateErrorKind`**: what went wrong with a single value
//! - **`FieldPath`**          : which schema field it was, grown while unwinding
//! - **`CellLocation`**       : which physical cell the bad value came from
//! - **`Origin`**             : which source/sheet, attached by the collector
//! - **`DataCreateError`**    : one struct that glues the four together
//!
//! Nothing here formats location into the message eagerly; callers and tools
//! can read every part back from the error value.

use std::{error::Error, fmt};

use smallvec::SmallVec;
use thiserror::Error;

use crate::coord::CellLocation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies a data source and, optionally, one sheet inside it.
///
/// Renders as `sheet@url` when the sheet is known, which is also the form a
/// user writes to select one sheet of a multi-sheet file.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Origin {
    pub url: String,
    pub sheet: Option<String>,
}

impl Origin {
    pub fn new(url: impl Into<String>, sheet: Option<String>) -> Self {
        Self {
            url: url.into(),
            sheet: sheet.filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn url_only(url: impl Into<String>) -> Self {
        Self::new(url, None)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sheet {
            Some(sheet) => write!(f, "{sheet}@{}", self.url),
            None => f.write_str(&self.url),
        }
    }
}

/// What went wrong while turning one raw value into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataCreateErrorKind {
    #[error("expected {expected}, found {found} `{value}`")]
    InvalidValue {
        expected: String,
        found: &'static str,
        value: String,
    },

    #[error("`{value}` is out of range for {expected}")]
    OutOfRange { expected: String, value: String },

    #[error("bean `{bean}` has no column for field `{field}`")]
    MissingColumn { bean: String, field: String },

    #[error("not enough data: {expected} expected but the cells are exhausted")]
    MissingData { expected: String },

    #[error("unexpected extra data `{value}`")]
    ExtraData { value: String },

    #[error("value must not be empty")]
    EmptyValue,

    #[error("duplicate element `{value}` in set")]
    DuplicateElement { value: String },

    #[error("duplicate key `{key}` in map")]
    DuplicateKey { key: String },
}

/// One step of the path from the record root to the failing value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Field path, stored innermost-first because segments are pushed while the
/// error unwinds out of nested types.
pub type FieldPath = SmallVec<[PathSegment; 4]>;

/// The single error value the materializer passes around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCreateError {
    pub kind: DataCreateErrorKind,
    path: FieldPath,
    pub location: Option<CellLocation>,
    pub origin: Option<Origin>,
}

/* ───────────────────── Constructors & helpers ─────────────────────── */

impl From<DataCreateErrorKind> for DataCreateError {
    fn from(kind: DataCreateErrorKind) -> Self {
        Self {
            kind,
            path: FieldPath::new(),
            location: None,
            origin: None,
        }
    }
}

impl DataCreateError {
    pub fn new(kind: DataCreateErrorKind) -> Self {
        kind.into()
    }

    /// Record that the failure happened inside field `name`.
    pub fn push_field(mut self, name: impl Into<String>) -> Self {
        self.path.push(PathSegment::Field(name.into()));
        self
    }

    /// Record that the failure happened inside element `index` of a collection.
    pub fn push_index(mut self, index: usize) -> Self {
        self.path.push(PathSegment::Index(index));
        self
    }

    /// Attach the offending cell. The innermost location wins: once set it is
    /// not overwritten by callers further up.
    pub fn with_location(mut self, location: CellLocation) -> Self {
        if self.location.is_none() {
            self.location = Some(location);
        }
        self
    }

    /// Attach the source/sheet the failing row was read from.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn set_origin(&mut self, origin: Origin) {
        self.origin = Some(origin);
    }

    /// Path segments from the record root down to the failing value.
    pub fn path(&self) -> impl Iterator<Item = &PathSegment> {
        self.path.iter().rev()
    }

    /// Dotted rendering of [`Self::path`], e.g. `rewards[1].count`.
    pub fn path_string(&self) -> String {
        let mut out = String::new();
        for seg in self.path() {
            match seg {
                PathSegment::Field(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                PathSegment::Index(i) => {
                    out.push_str(&format!("[{i}]"));
                }
            }
        }
        out
    }
}

/* ───────────────────────── Display / Error ────────────────────────── */

impl fmt::Display for DataCreateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if !self.path.is_empty() {
            write!(f, " at field `{}`", self.path_string())?;
        }

        match (&self.origin, &self.location) {
            (Some(origin), Some(loc)) => write!(f, " [origin: {origin}!{loc}]")?,
            (Some(origin), None) => write!(f, " [origin: {origin}]")?,
            (None, Some(loc)) => write!(f, " ({loc})")?,
            (None, None) => {}
        }

        Ok(())
    }
}

impl Error for DataCreateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_is_reported_outermost_first() {
        let err = DataCreateError::new(DataCreateErrorKind::EmptyValue)
            .push_field("count")
            .push_index(1)
            .push_field("rewards");
        assert_eq!(err.path_string(), "rewards[1].count");
    }

    #[test]
    fn innermost_location_wins() {
        let err = DataCreateError::new(DataCreateErrorKind::EmptyValue)
            .with_location(CellLocation::new(4, 2))
            .with_location(CellLocation::new(4, 1));
        assert_eq!(err.location, Some(CellLocation::new(4, 2)));
    }

    #[test]
    fn display_includes_origin_and_cell() {
        let err = DataCreateError::new(DataCreateErrorKind::InvalidValue {
            expected: "int".to_string(),
            found: "text",
            value: "abc".to_string(),
        })
        .push_field("id")
        .with_location(CellLocation::new(5, 2))
        .with_origin(Origin::new("item.xlsx", Some("Items".to_string())));
        assert_eq!(
            err.to_string(),
            "expected int, found text `abc` at field `id` [origin: Items@item.xlsx!B5]"
        );
    }

    #[test]
    fn origin_without_sheet_is_plain_url() {
        assert_eq!(Origin::new("a.csv", Some("  ".to_string())).to_string(), "a.csv");
    }
}
