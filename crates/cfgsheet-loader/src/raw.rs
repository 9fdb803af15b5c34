//! Cell grid normalization: split a decoded grid into directive rows and
//! data rows.

use cfgsheet_common::{CellLocation, CellValue};

use crate::error::LoadError;
use crate::traits::{Grid, SheetReader};

static EMPTY: CellValue = CellValue::Empty;

/// One grid position. Coordinates are 1-based physical row/column.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
}

impl Cell {
    pub fn location(&self) -> CellLocation {
        CellLocation::new(self.row, self.col)
    }
}

/// One physical row. `cells[i]` sits in column `i + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub row: u32,
    pub cells: Vec<Cell>,
}

impl RawRow {
    fn from_values(row: u32, values: Vec<CellValue>) -> Self {
        let cells = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| Cell {
                row,
                col: i as u32 + 1,
                value,
            })
            .collect();
        Self { row, cells }
    }

    pub fn cell(&self, col: u32) -> Option<&Cell> {
        col.checked_sub(1)
            .and_then(|i| self.cells.get(i as usize))
    }

    /// Value at `col`, `Empty` past the end of a ragged row.
    pub fn value(&self, col: u32) -> &CellValue {
        self.cell(col).map_or(&EMPTY, |c| &c.value)
    }

    pub fn text(&self, col: u32) -> String {
        self.value(col).to_text()
    }

    /// Trimmed text of column A: the directive name or the row tag.
    pub fn marker(&self) -> String {
        self.text(1).trim().to_string()
    }

    /// True when every cell in `from..=to` is blank.
    pub fn is_blank_in(&self, from: u32, to: u32) -> bool {
        (from..=to).all(|c| self.value(c).is_blank())
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.value.is_blank())
    }

    pub fn width(&self) -> u32 {
        self.cells.len() as u32
    }
}

/// A physical sheet split into its header (directive) rows and data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    /// Sheet display name.
    pub name: String,
    pub not_data_cells: Vec<RawRow>,
    pub cells: Vec<RawRow>,
}

impl RawSheet {
    /// A grid is a table sheet when its A1 cell starts with `##`.
    pub fn is_table_grid(grid: &Grid) -> bool {
        grid.first()
            .and_then(|row| row.first())
            .is_some_and(|a1| a1.to_text().trim().starts_with("##"))
    }

    /// Split `grid` into directive and data rows, or `None` when the grid
    /// is not a table sheet.
    ///
    /// Directive rows are the contiguous leading rows whose column A starts
    /// with `#`. Everything after is data, in physical order; rows empty in
    /// every column are dropped.
    pub fn from_grid(name: impl Into<String>, grid: Grid) -> Option<Self> {
        if !Self::is_table_grid(&grid) {
            return None;
        }
        let mut not_data_cells = Vec::new();
        let mut cells = Vec::new();
        let mut in_header = true;
        for (i, values) in grid.into_iter().enumerate() {
            let row = RawRow::from_values(i as u32 + 1, values);
            if in_header && row.marker().starts_with('#') {
                not_data_cells.push(row);
                continue;
            }
            in_header = false;
            if !row.is_blank() {
                cells.push(row);
            }
        }
        Some(Self {
            name: name.into(),
            not_data_cells,
            cells,
        })
    }

    /// Build a sheet from rows of values, mainly for in-process tables.
    pub fn from_rows<I, R>(name: impl Into<String>, rows: I) -> Option<Self>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = CellValue>,
    {
        let grid = rows
            .into_iter()
            .map(|r| r.into_iter().collect())
            .collect();
        Self::from_grid(name, grid)
    }
}

fn normalize_sheet_name(sheet_name: Option<&str>) -> Option<&str> {
    sheet_name.map(str::trim).filter(|s| !s.is_empty())
}

/// The "no sheets" error for `url`, naming the requested sheet if any.
pub(crate) fn header_not_found(url: &str, sheet_name: Option<&str>) -> LoadError {
    LoadError::HeaderNotFound {
        url: url.to_string(),
        sheet: normalize_sheet_name(sheet_name).map(str::to_string),
    }
}

/// Read the table sheets of one source.
///
/// With a sheet name only that sheet is considered. An empty result is the
/// "no sheets" signal: no visited sheet had a `##` marker in A1, or the named
/// sheet does not exist.
pub fn load_raw_sheets<R: SheetReader>(
    url: &str,
    sheet_name: Option<&str>,
    reader: &mut R,
) -> Result<Vec<RawSheet>, LoadError> {
    let reader_err = |e: R::Error| LoadError::Reader {
        url: url.to_string(),
        message: e.to_string(),
    };
    let wanted = normalize_sheet_name(sheet_name);
    let names = reader.sheet_names().map_err(reader_err)?;

    let mut sheets = Vec::new();
    for name in names {
        if wanted.is_some_and(|w| w != name) {
            continue;
        }
        let grid = reader.read_grid(&name).map_err(reader_err)?;
        match RawSheet::from_grid(name.as_str(), grid) {
            Some(sheet) => sheets.push(sheet),
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(url, sheet = name.as_str(), "skipping sheet without ## marker in A1");
            }
        }
    }
    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryWorkbook;

    fn row(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    #[test]
    fn splits_directive_and_data_rows() {
        let grid = vec![
            row(&["##var", "id", "name"]),
            row(&["##type", "int", "string"]),
            row(&["", "1", "a"]),
            row(&["", "", ""]),
            row(&["##", "comment rows after data stay data"]),
            row(&["!", "2", "b"]),
        ];
        let sheet = RawSheet::from_grid("S", grid).unwrap();
        assert_eq!(sheet.not_data_cells.len(), 2);
        let rows: Vec<u32> = sheet.cells.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![3, 5, 6]);
        assert_eq!(sheet.cells[2].marker(), "!");
        assert_eq!(sheet.cells[0].cell(3).unwrap().location().to_a1(), "C3");
    }

    #[test]
    fn rejects_grid_without_marker() {
        assert!(RawSheet::from_grid("S", vec![row(&["id", "name"])]).is_none());
        assert!(RawSheet::from_grid("S", vec![row(&["#var", "id"])]).is_none());
        assert!(RawSheet::from_grid("S", Vec::new()).is_none());
    }

    #[test]
    fn ragged_rows_read_as_empty() {
        let sheet = RawSheet::from_grid("S", vec![row(&["##var", "a", "b"]), row(&["", "1"])])
            .unwrap();
        assert_eq!(sheet.cells[0].value(3), &CellValue::Empty);
        assert!(sheet.cells[0].is_blank_in(3, 5));
        assert!(!sheet.cells[0].is_blank_in(2, 3));
    }

    #[test]
    fn load_filters_by_sheet_name() {
        let mut wb = MemoryWorkbook::new()
            .with_sheet("notes", vec![row(&["just text"])])
            .with_sheet("a", vec![row(&["##var", "id"]), row(&["", "1"])])
            .with_sheet("b", vec![row(&["##var", "id"]), row(&["", "2"])]);

        let all = load_raw_sheets("t.xlsx", None, &mut wb).unwrap();
        let names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let only_b = load_raw_sheets("t.xlsx", Some("b"), &mut wb).unwrap();
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b[0].name, "b");

        assert!(load_raw_sheets("t.xlsx", Some("zzz"), &mut wb).unwrap().is_empty());
        assert!(load_raw_sheets("t.xlsx", Some("notes"), &mut wb).unwrap().is_empty());
        assert_eq!(load_raw_sheets("t.xlsx", Some("  "), &mut wb).unwrap().len(), 2);
    }
}
