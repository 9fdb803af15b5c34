use cfgsheet_common::CellValue;
use serde::{Deserialize, Serialize};

use crate::traits::{Grid, SheetReader};

#[derive(Debug, thiserror::Error)]
pub enum MemoryWorkbookError {
    #[error("sheet `{0}` does not exist")]
    NoSuchSheet(String),
    #[cfg(feature = "json")]
    #[error("invalid workbook JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Cell as written in workbook JSON: a plain scalar.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
enum JsonCell {
    Null(()),
    Bool(bool),
    Int(i64),
    Number(f64),
    Text(String),
}

impl From<JsonCell> for CellValue {
    fn from(cell: JsonCell) -> Self {
        match cell {
            JsonCell::Null(()) => CellValue::Empty,
            JsonCell::Bool(b) => CellValue::Boolean(b),
            JsonCell::Int(i) => CellValue::Int(i),
            JsonCell::Number(n) => CellValue::Number(n),
            JsonCell::Text(s) => CellValue::from(s),
        }
    }
}

impl From<&CellValue> for JsonCell {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => JsonCell::Null(()),
            CellValue::Boolean(b) => JsonCell::Bool(*b),
            CellValue::Int(i) => JsonCell::Int(*i),
            CellValue::Number(n) => JsonCell::Number(*n),
            other => JsonCell::Text(other.to_text()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
struct JsonWorkbook {
    #[serde(default)]
    sheets: Vec<JsonSheet>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
struct JsonSheet {
    name: String,
    #[serde(default)]
    rows: Vec<Vec<JsonCell>>,
}

/// Sheets held in memory, in insertion order.
///
/// With the `json` feature the workbook can be read from a document of the
/// form `{"sheets": [{"name": "Items", "rows": [["##var", "id"], ["", 1]]}]}`.
#[derive(Debug, Default, Clone)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, Grid)>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet, replacing any sheet of the same name in place.
    pub fn add_sheet(&mut self, name: impl Into<String>, grid: Grid) -> &mut Self {
        let name = name.into();
        match self.sheets.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = grid,
            None => self.sheets.push((name, grid)),
        }
        self
    }

    pub fn with_sheet(mut self, name: impl Into<String>, grid: Grid) -> Self {
        self.add_sheet(name, grid);
        self
    }

    pub fn sheet(&self, name: &str) -> Option<&Grid> {
        self.sheets.iter().find(|(n, _)| n == name).map(|(_, g)| g)
    }
}

#[cfg(feature = "json")]
impl MemoryWorkbook {
    pub fn open_bytes(data: &[u8]) -> Result<Self, MemoryWorkbookError> {
        Ok(Self::from_json(serde_json::from_slice(data)?))
    }

    pub fn open_reader<R: std::io::Read>(reader: R) -> Result<Self, MemoryWorkbookError> {
        Ok(Self::from_json(serde_json::from_reader(reader)?))
    }

    pub fn open_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, MemoryWorkbookError> {
        let file = std::fs::File::open(path)?;
        Self::open_reader(std::io::BufReader::new(file))
    }

    /// Serialize back to workbook JSON. Dates and times are written as text.
    pub fn to_json_string(&self) -> Result<String, MemoryWorkbookError> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }

    fn from_json(doc: JsonWorkbook) -> Self {
        let sheets = doc
            .sheets
            .into_iter()
            .map(|s| {
                let grid = s
                    .rows
                    .into_iter()
                    .map(|row| row.into_iter().map(CellValue::from).collect())
                    .collect();
                (s.name, grid)
            })
            .collect();
        Self { sheets }
    }

    fn to_json(&self) -> JsonWorkbook {
        JsonWorkbook {
            sheets: self
                .sheets
                .iter()
                .map(|(name, grid)| JsonSheet {
                    name: name.clone(),
                    rows: grid
                        .iter()
                        .map(|row| row.iter().map(JsonCell::from).collect())
                        .collect(),
                })
                .collect(),
        }
    }
}

impl SheetReader for MemoryWorkbook {
    type Error = MemoryWorkbookError;

    fn sheet_names(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.sheets.iter().map(|(n, _)| n.clone()).collect())
    }

    fn read_grid(&mut self, sheet: &str) -> Result<Grid, Self::Error> {
        self.sheet(sheet)
            .cloned()
            .ok_or_else(|| MemoryWorkbookError::NoSuchSheet(sheet.to_string()))
    }
}
