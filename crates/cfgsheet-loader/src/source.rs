//! The row/column data source: one private instance per table.
//!
//! ```text
//! Loading ──► ParsingHeader ──► EmittingRows ──► Done
//!    │              │                 │
//!    └──────────────┴──────► Failed ◄─┘
//! ```
//!
//! `load*` drives the first two phases; `read_multi` the rest. Failures are
//! terminal for the call that hit them and are returned, never logged away.

use cfgsheet_schema::{Schema, TBean};

use crate::config::LoaderConfig;
use crate::creator::{CreateError, SheetDataCreator};
use crate::error::LoadError;
use crate::raw::{RawRow, RawSheet, header_not_found, load_raw_sheets};
use crate::record::Record;
use crate::sheet::RowColumnSheet;
use crate::tags::{is_ignore_tag, parse_tags};
use crate::title::TitleRow;
use crate::traits::SheetReader;

/// Url given to sheets handed over in-process instead of read from a file.
pub const INTERN_URL: &str = "__intern__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadPhase {
    /// Nothing loaded yet, or reading sheets from the producer.
    Loading,
    /// Header parsed; rows are ready to be read.
    ParsingHeader,
    EmittingRows,
    Done,
    Failed,
}

/// Loader behind one interface, so a compiler can hold any source kind.
pub trait DataLoader {
    /// Take ownership of already decoded sheets of one table.
    fn load_raw(
        &mut self,
        url: &str,
        sheet_name: Option<&str>,
        sheets: Vec<RawSheet>,
    ) -> Result<(), LoadError>;

    /// Every non-ignored record, sheet by sheet, row by row.
    fn read_multi(&mut self, schema: &Schema, bean: &str) -> Result<Vec<Record>, LoadError>;

    /// The single record of a singleton table.
    fn read_one(&mut self, schema: &Schema, bean: &str) -> Result<Record, LoadError>;
}

#[derive(Debug, Clone)]
pub struct RowColumnDataSource {
    pub(crate) config: LoaderConfig,
    pub(crate) url: String,
    pub(crate) sheets: Vec<RowColumnSheet>,
    /// Directive rows of the first sheet; the header every sheet shares.
    pub(crate) not_data_cells: Vec<RawRow>,
    phase: LoadPhase,
}

impl Default for RowColumnDataSource {
    fn default() -> Self {
        Self::with_config(LoaderConfig::default())
    }
}

impl RowColumnDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LoaderConfig) -> Self {
        Self {
            config,
            url: String::new(),
            sheets: Vec::new(),
            not_data_cells: Vec::new(),
            phase: LoadPhase::Loading,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn sheets(&self) -> &[RowColumnSheet] {
        &self.sheets
    }

    pub fn is_loaded(&self) -> bool {
        !self.sheets.is_empty()
    }

    /// Read the table sheets of `url` from `reader`. With `sheet_name` only
    /// that sheet is loaded.
    pub fn load<R: SheetReader>(
        &mut self,
        url: &str,
        sheet_name: Option<&str>,
        reader: &mut R,
    ) -> Result<(), LoadError> {
        #[cfg(feature = "tracing")]
        tracing::trace!(url, sheet = ?sheet_name, "loading table");
        self.phase = LoadPhase::Loading;
        let sheets = load_raw_sheets(url, sheet_name, reader).inspect_err(|_| {
            self.phase = LoadPhase::Failed;
        })?;
        self.load_raw(url, sheet_name, sheets)
    }

    /// Load sheets produced in-process, under the url [`INTERN_URL`].
    pub fn load_sheets(&mut self, sheets: Vec<RawSheet>) -> Result<(), LoadError> {
        self.load_raw(INTERN_URL, None, sheets)
    }

    /// Adopt decoded sheets. The first sheet's directive rows become the
    /// header of every sheet; the rest contribute data rows only.
    pub fn load_raw(
        &mut self,
        url: &str,
        sheet_name: Option<&str>,
        sheets: Vec<RawSheet>,
    ) -> Result<(), LoadError> {
        self.phase = LoadPhase::Loading;
        self.url = url.to_string();
        self.sheets.clear();
        self.not_data_cells.clear();

        let Some(first) = sheets.first() else {
            self.phase = LoadPhase::Failed;
            return Err(header_not_found(url, sheet_name));
        };

        self.phase = LoadPhase::ParsingHeader;
        let title_row = match TitleRow::parse(&first.not_data_cells) {
            Ok(title_row) => title_row,
            Err(message) => {
                self.phase = LoadPhase::Failed;
                return Err(LoadError::InvalidHeader {
                    url: url.to_string(),
                    sheet: first.name.clone(),
                    message,
                });
            }
        };
        self.not_data_cells = first.not_data_cells.clone();
        self.sheets = sheets
            .into_iter()
            .map(|raw| RowColumnSheet::new(url, raw, title_row.clone()))
            .collect();
        Ok(())
    }

    /// Materialize every non-ignored row as a `bean` record, in sheet then
    /// row order. The first failure aborts the whole read.
    pub fn read_multi(&mut self, schema: &Schema, bean: &str) -> Result<Vec<Record>, LoadError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("read_multi", url = self.url.as_str(), bean).entered();
        if !self.is_loaded() {
            return Err(LoadError::NotLoaded);
        }
        let bean = schema.bean(bean).inspect_err(|_| {
            self.phase = LoadPhase::Failed;
        })?;

        self.phase = LoadPhase::EmittingRows;
        let result = self.collect(schema, bean);
        self.phase = match &result {
            Ok(_records) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    url = self.url.as_str(),
                    sheets = self.sheets.len(),
                    records = _records.len(),
                    "table read"
                );
                LoadPhase::Done
            }
            Err(_) => LoadPhase::Failed,
        };
        result
    }

    fn collect(&self, schema: &Schema, bean: &TBean) -> Result<Vec<Record>, LoadError> {
        let creator = SheetDataCreator::new(schema, &self.config);
        let mut records = Vec::new();
        for sheet in &self.sheets {
            for row in sheet.rows() {
                if is_ignore_tag(row.tag(), &self.config) {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(sheet = sheet.name(), row = row.row_number(), tag = row.tag(), "ignored row");
                    continue;
                }
                let data = creator.create_bean(bean, &row).map_err(|e| match e {
                    CreateError::Data(e) => LoadError::from(e.with_origin(sheet.origin())),
                    CreateError::Schema(e) => LoadError::SheetProcessing {
                        sheet: sheet.name().to_string(),
                        source: Box::new(e),
                    },
                })?;
                records.push(Record::new(
                    data,
                    sheet.origin(),
                    row.row_number(),
                    parse_tags(row.tag(), &self.config),
                ));
            }
        }
        Ok(records)
    }

    /// Row/column tables hold many records; single-record reads are refused.
    pub fn read_one(&mut self, _schema: &Schema, _bean: &str) -> Result<Record, LoadError> {
        Err(LoadError::Unsupported {
            operation: "read_one",
            source_kind: "row/column",
        })
    }
}

impl DataLoader for RowColumnDataSource {
    fn load_raw(
        &mut self,
        url: &str,
        sheet_name: Option<&str>,
        sheets: Vec<RawSheet>,
    ) -> Result<(), LoadError> {
        Self::load_raw(self, url, sheet_name, sheets)
    }

    fn read_multi(&mut self, schema: &Schema, bean: &str) -> Result<Vec<Record>, LoadError> {
        Self::read_multi(self, schema, bean)
    }

    fn read_one(&mut self, schema: &Schema, bean: &str) -> Result<Record, LoadError> {
        Self::read_one(self, schema, bean)
    }
}

/// Loader families, keyed by source file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoaderKind {
    RowColumn,
}

impl LoaderKind {
    pub fn create(self, config: LoaderConfig) -> Box<dyn DataLoader> {
        match self {
            LoaderKind::RowColumn => Box::new(RowColumnDataSource::with_config(config)),
        }
    }
}

/// Loader kind for a file extension, with or without the leading dot.
pub fn loader_for_extension(ext: &str) -> Option<LoaderKind> {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    match ext.as_str() {
        "xls" | "xlsx" | "xlsm" | "xlm" | "csv" => Some(LoaderKind::RowColumn),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgsheet_common::CellValue;
    use cfgsheet_schema::{BeanDef, SchemaDef};

    fn raw(name: &str, rows: &[&[&str]]) -> RawSheet {
        RawSheet::from_rows(
            name,
            rows.iter()
                .map(|r| r.iter().map(|v| CellValue::from(*v)).collect::<Vec<_>>()),
        )
        .unwrap()
    }

    fn schema() -> Schema {
        SchemaDef::new()
            .with_bean(BeanDef::new("Item").field("id", "int").field("name", "string"))
            .build()
            .unwrap()
    }

    #[test]
    fn phases_follow_a_successful_read() {
        let mut source = RowColumnDataSource::new();
        assert_eq!(source.phase(), LoadPhase::Loading);
        source
            .load_sheets(vec![raw("S", &[&["##var", "id", "name"], &["", "1", "a"]])])
            .unwrap();
        assert_eq!(source.phase(), LoadPhase::ParsingHeader);
        assert_eq!(source.url(), INTERN_URL);

        let records = source.read_multi(&schema(), "Item").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(source.phase(), LoadPhase::Done);
        assert_eq!(records[0].location(), "S@__intern__:2");
    }

    #[test]
    fn empty_load_fails() {
        let mut source = RowColumnDataSource::new();
        let err = source.load_raw("a.xlsx", Some(" "), Vec::new()).unwrap_err();
        assert!(matches!(err, LoadError::HeaderNotFound { sheet: None, .. }));
        assert_eq!(source.phase(), LoadPhase::Failed);
    }

    #[test]
    fn read_before_load_is_an_error() {
        let mut source = RowColumnDataSource::new();
        assert!(matches!(
            source.read_multi(&schema(), "Item"),
            Err(LoadError::NotLoaded)
        ));
    }

    #[test]
    fn failed_row_marks_the_read_failed() {
        let mut source = RowColumnDataSource::new();
        source
            .load_sheets(vec![raw("S", &[&["##var", "id", "name"], &["", "x", "a"]])])
            .unwrap();
        assert!(source.read_multi(&schema(), "Item").is_err());
        assert_eq!(source.phase(), LoadPhase::Failed);
    }

    #[test]
    fn unknown_root_bean_is_a_schema_error() {
        let mut source = RowColumnDataSource::new();
        source
            .load_sheets(vec![raw("Weapons", &[&["##var", "id"], &["", "1"]])])
            .unwrap();
        let err = source.read_multi(&schema(), "Missing").unwrap_err();
        assert!(matches!(err, LoadError::Schema(_)));
        assert_eq!(source.phase(), LoadPhase::Failed);
    }

    #[test]
    fn read_one_is_unsupported() {
        let mut source = RowColumnDataSource::new();
        let err = source.read_one(&schema(), "Item").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Unsupported {
                operation: "read_one",
                ..
            }
        ));
    }

    #[test]
    fn extensions_map_to_row_column_loader() {
        for ext in ["xls", "xlsx", "XLSM", ".xlm", "csv"] {
            assert_eq!(loader_for_extension(ext), Some(LoaderKind::RowColumn), "{ext}");
        }
        assert_eq!(loader_for_extension("json"), None);

        let mut loader = LoaderKind::RowColumn.create(LoaderConfig::default());
        loader
            .load_raw("t.csv", None, vec![raw("S", &[&["##var", "id", "name"], &["", "1", "a"]])])
            .unwrap();
        assert_eq!(loader.read_multi(&schema(), "Item").unwrap().len(), 1);
    }
}
