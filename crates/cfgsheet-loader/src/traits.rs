use cfgsheet_common::CellValue;

/// A sheet as a dense, row-major grid. `grid[r][c]` is the cell at physical
/// row `r + 1`, column `c + 1`; rows may be ragged.
pub type Grid = Vec<Vec<CellValue>>;

/// Producer of decoded sheet grids.
///
/// Implementations own file decoding; the loader only ever sees grids.
pub trait SheetReader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Result<Vec<String>, Self::Error>;

    fn read_grid(&mut self, sheet: &str) -> Result<Grid, Self::Error>;
}
