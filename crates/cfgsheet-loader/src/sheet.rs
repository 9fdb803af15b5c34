//! Logical rows over one physical sheet.

use cfgsheet_common::Origin;
use smallvec::SmallVec;

use crate::error::LoadError;
use crate::raw::{RawRow, RawSheet};
use crate::title::{Title, TitleRow};

/// A normalized physical sheet: its header plus its data rows. Immutable
/// once built; [`RowColumnSheet::rows`] can be walked any number of times.
#[derive(Debug, Clone)]
pub struct RowColumnSheet {
    url: String,
    name: String,
    title_row: TitleRow,
    rows: Vec<RawRow>,
}

impl RowColumnSheet {
    /// Wrap a raw sheet under an already parsed header.
    pub fn new(url: impl Into<String>, raw: RawSheet, title_row: TitleRow) -> Self {
        Self {
            url: url.into(),
            name: raw.name,
            title_row,
            rows: raw.cells,
        }
    }

    /// Build a sheet whose header comes from its own directive rows.
    pub fn from_raw(url: impl Into<String>, raw: RawSheet) -> Result<Self, LoadError> {
        let url = url.into();
        let title_row =
            TitleRow::parse(&raw.not_data_cells).map_err(|message| LoadError::InvalidHeader {
                url: url.clone(),
                sheet: raw.name.clone(),
                message,
            })?;
        Ok(Self::new(url, raw, title_row))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// `sheet@url`, the identifier attached to records and errors.
    pub fn url_with_params(&self) -> String {
        self.origin().to_string()
    }

    pub fn origin(&self) -> Origin {
        Origin::new(self.url.as_str(), Some(self.name.clone()))
    }

    pub fn title_row(&self) -> &TitleRow {
        &self.title_row
    }

    pub fn raw_rows(&self) -> &[RawRow] {
        &self.rows
    }

    /// A fresh pass over the logical rows, in physical order.
    pub fn rows(&self) -> LogicalRows<'_> {
        LogicalRows {
            sheet: self,
            next: 0,
        }
    }
}

/// One record's worth of cells: the first physical row plus any rows that
/// continue it through multi-row columns.
#[derive(Debug, Clone)]
pub struct LogicalRow<'a> {
    title_row: &'a TitleRow,
    tag: String,
    rows: SmallVec<[&'a RawRow; 1]>,
}

impl<'a> LogicalRow<'a> {
    /// A logical row made of one physical row.
    pub fn single(title_row: &'a TitleRow, row: &'a RawRow) -> Self {
        let mut rows = SmallVec::new();
        rows.push(row);
        Self {
            title_row,
            tag: row.marker(),
            rows,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn title_row(&self) -> &'a TitleRow {
        self.title_row
    }

    pub fn root_title(&self) -> &'a Title {
        self.title_row.root()
    }

    pub fn first(&self) -> &'a RawRow {
        self.rows[0]
    }

    /// Every physical row of this logical row, first row included.
    pub fn rows(&self) -> &[&'a RawRow] {
        &self.rows
    }

    /// 1-based physical row number of the first row.
    pub fn row_number(&self) -> u32 {
        self.first().row
    }
}

#[derive(Debug, Clone)]
pub struct LogicalRows<'a> {
    sheet: &'a RowColumnSheet,
    next: usize,
}

impl<'a> LogicalRows<'a> {
    fn is_blank(&self, row: &RawRow) -> bool {
        let root = self.sheet.title_row.root();
        row.is_blank_in(root.from_index, root.to_index)
    }
}

impl<'a> Iterator for LogicalRows<'a> {
    type Item = LogicalRow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let sheet: &'a RowColumnSheet = self.sheet;
        let rows = &sheet.rows;
        let title_row = &sheet.title_row;

        let first = loop {
            let row = rows.get(self.next)?;
            self.next += 1;
            if !self.is_blank(row) {
                break row;
            }
        };

        let mut group: SmallVec<[&'a RawRow; 1]> = SmallVec::new();
        group.push(first);
        if title_row.has_multi_row() {
            while let Some(row) = rows.get(self.next) {
                if self.is_blank(row) {
                    self.next += 1;
                    continue;
                }
                if !title_row.is_continuation(row) {
                    break;
                }
                group.push(row);
                self.next += 1;
            }
        }

        Some(LogicalRow {
            title_row,
            tag: first.marker(),
            rows: group,
        })
    }
}
