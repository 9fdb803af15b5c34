//! Grid and workbook fixtures for tests.

use std::io::Write;

pub use cfgsheet_common::CellValue;
use tempfile::NamedTempFile;

/// Build a grid row by row; every cell goes through `CellValue::from`, so
/// `""` is an empty cell.
///
/// ```
/// use cfgsheet_testkit::grid;
/// let g = grid![
///     ["##var", "id", "name"],
///     ["", 1, "Sword"],
/// ];
/// assert_eq!(g.len(), 2);
/// ```
#[macro_export]
macro_rules! grid {
    ($([$($cell:expr),* $(,)?]),* $(,)?) => {
        vec![$(vec![$($crate::CellValue::from($cell)),*]),*]
    };
}

/// A table sheet with a `##var` row of `fields`, a `##type` row of `types`
/// and untagged data rows.
pub fn table(fields: &[&str], types: &[&str], rows: Vec<Vec<CellValue>>) -> Vec<Vec<CellValue>> {
    let header = |marker: &str, cells: &[&str]| {
        std::iter::once(CellValue::from(marker))
            .chain(cells.iter().map(|c| CellValue::from(*c)))
            .collect::<Vec<_>>()
    };
    let mut grid = vec![header("##var", fields), header("##type", types)];
    grid.extend(rows.into_iter().map(|row| {
        std::iter::once(CellValue::Empty)
            .chain(row)
            .collect::<Vec<_>>()
    }));
    grid
}

fn cell_json(value: &CellValue) -> serde_json::Value {
    match value {
        CellValue::Empty => serde_json::Value::Null,
        CellValue::Boolean(b) => serde_json::Value::Bool(*b),
        CellValue::Int(i) => serde_json::Value::from(*i),
        CellValue::Number(n) => serde_json::Value::from(*n),
        other => serde_json::Value::String(other.to_text()),
    }
}

/// Workbook JSON document for `sheets`, in the layout the in-memory
/// workbook reads.
pub fn workbook_json(sheets: &[(&str, Vec<Vec<CellValue>>)]) -> String {
    let sheets: Vec<serde_json::Value> = sheets
        .iter()
        .map(|(name, grid)| {
            let rows: Vec<serde_json::Value> = grid
                .iter()
                .map(|row| row.iter().map(cell_json).collect())
                .collect();
            serde_json::json!({ "name": name, "rows": rows })
        })
        .collect();
    serde_json::json!({ "sheets": sheets }).to_string()
}

/// Write [`workbook_json`] to a temp file that lives as long as the handle.
pub fn write_workbook(sheets: &[(&str, Vec<Vec<CellValue>>)]) -> std::io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
    file.write_all(workbook_json(sheets).as_bytes())?;
    file.flush()?;
    Ok(file)
}
