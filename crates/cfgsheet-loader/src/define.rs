//! Metadata queries over a loaded table: table definition rows and
//! per-column field info used to derive a schema from a sheet.

use crate::error::LoadError;
use crate::raw::{RawRow, header_not_found, load_raw_sheets};
use crate::source::RowColumnDataSource;
use crate::title::TitleRow;
use crate::traits::SheetReader;

/// Where a definition row's description came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptionSource {
    /// The description column (column D) of the data row.
    Cell,
    /// The table has no description column; the name doubles as description.
    NameFallback,
}

/// One data row seen as a table definition entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineRow {
    /// Column B, trimmed.
    pub type_or_name: String,
    /// Column C when the table has an id column, else the zero-based row index.
    pub id: String,
    pub description: String,
    pub description_source: DescriptionSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    /// Column B of the `##type` directive row.
    pub type_name: String,
    /// Column B of the `##desc` / `##comment` / `##` directive row.
    pub description: String,
    pub rows: Vec<DefineRow>,
}

/// One top-level column of a table, read from the header directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub ty: String,
    pub group: String,
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefInfo {
    pub fields: Vec<FieldInfo>,
}

fn find_directive<'r>(rows: &'r [RawRow], names: &[&str]) -> Option<&'r RawRow> {
    rows.iter()
        .rev()
        .find(|r| names.iter().any(|n| r.marker().eq_ignore_ascii_case(n)))
}

impl RowColumnDataSource {
    /// The table's definition view. A table "has an id" when cell C1 starts
    /// with `#`, and "has a comment" when cell D1 does.
    pub fn table_definition(&self) -> Result<TableDefinition, LoadError> {
        let Some(head) = self.not_data_cells.first() else {
            return Err(LoadError::NotLoaded);
        };
        let has_id = head.text(3).starts_with('#');
        let has_comment = head.text(4).starts_with('#');

        let type_name = find_directive(&self.not_data_cells, &["##type"])
            .map(|r| r.text(2).trim().to_string())
            .unwrap_or_default();
        let description = find_directive(&self.not_data_cells, &["##desc", "##comment", "##"])
            .map(|r| r.text(2))
            .unwrap_or_default();

        let rows = self
            .sheets
            .iter()
            .flat_map(|s| s.raw_rows())
            .enumerate()
            .map(|(index, cells)| {
                let name = cells.text(2).trim().to_string();
                let id = if has_id {
                    cells.text(3).trim().to_string()
                } else {
                    index.to_string()
                };
                let (description, description_source) = if has_comment {
                    (cells.text(4), DescriptionSource::Cell)
                } else {
                    (name.clone(), DescriptionSource::NameFallback)
                };
                DefineRow {
                    type_or_name: name,
                    id,
                    description,
                    description_source,
                }
            })
            .collect();

        Ok(TableDefinition {
            type_name,
            description,
            rows,
        })
    }

    /// [`Self::table_definition`] as string rows: first
    /// `[type, "", description]`, then `[name, id, description]` per data row.
    pub fn define_rows(&self) -> Result<Vec<Vec<String>>, LoadError> {
        let def = self.table_definition()?;
        let mut out = Vec::with_capacity(def.rows.len() + 1);
        out.push(vec![def.type_name, String::new(), def.description]);
        out.extend(
            def.rows
                .into_iter()
                .map(|r| vec![r.type_or_name, r.id, r.description]),
        );
        Ok(out)
    }

    /// Per-column `{ name, type, group, desc }` of the loaded header.
    pub fn table_def_info(&self) -> Result<TableDefInfo, LoadError> {
        let Some(first) = self.sheets.first() else {
            return Err(LoadError::NotLoaded);
        };
        Ok(def_info(first.title_row(), &self.not_data_cells))
    }

    /// Read only the header of `url` and describe its columns, without
    /// materializing any record.
    pub fn load_table_def_info<R: SheetReader>(
        url: &str,
        sheet_name: Option<&str>,
        reader: &mut R,
    ) -> Result<TableDefInfo, LoadError> {
        let sheets = load_raw_sheets(url, sheet_name, reader)?;
        let Some(first) = sheets.first() else {
            return Err(header_not_found(url, sheet_name));
        };
        let title_row = TitleRow::parse(&first.not_data_cells).map_err(|message| {
            LoadError::InvalidHeader {
                url: url.to_string(),
                sheet: first.name.clone(),
                message,
            }
        })?;
        Ok(def_info(&title_row, &first.not_data_cells))
    }
}

fn def_info(title_row: &TitleRow, header: &[RawRow]) -> TableDefInfo {
    let type_row = find_directive(header, &["##type"]);
    let group_row = find_directive(header, &["##group"]);
    let desc_row = find_directive(header, &["##desc", "##comment", "##"]);
    let at = |row: Option<&RawRow>, col: u32| row.map(|r| r.text(col).trim().to_string()).unwrap_or_default();

    let fields = title_row
        .root()
        .sub_titles
        .iter()
        .map(|t| FieldInfo {
            name: t.name.clone(),
            ty: at(type_row, t.from_index),
            group: at(group_row, t.from_index),
            desc: at(desc_row, t.from_index),
        })
        .collect();
    TableDefInfo { fields }
}
