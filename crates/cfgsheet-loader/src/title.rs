//! Column titles parsed from a sheet's directive rows.
//!
//! Title rows are the `##var` (or `##field`) rows; the k-th one names the
//! depth-k columns. A depth-k title owns a span of columns that depth-(k+1)
//! titles subdivide, the way merged header cells do in a workbook:
//!
//! ```text
//! ##var   id   name   reward          *drops
//! ##var             id     count
//! ```
//!
//! Cell syntax: `#...` comments the column out, `*name` marks a multi-row
//! title, `name#sep=;#non_empty` attaches attributes.

use std::ops::RangeInclusive;

use cfgsheet_common::{CellLocation, col_to_letters};
use cfgsheet_schema::split_attrs;
use rustc_hash::FxHashSet;

use crate::raw::RawRow;

#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    pub name: String,
    /// First column of the span, 1-based.
    pub from_index: u32,
    /// Last column of the span, inclusive.
    pub to_index: u32,
    pub multi_row: bool,
    attrs: Vec<(String, String)>,
    pub sub_titles: Vec<Title>,
}

impl Title {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn sep(&self) -> Option<&str> {
        self.attr("sep").filter(|s| !s.is_empty())
    }

    pub fn default_value(&self) -> Option<&str> {
        self.attr("default")
    }

    pub fn non_empty(&self) -> bool {
        self.attr("non_empty").is_some_and(|v| v != "false")
    }

    pub fn has_sub_titles(&self) -> bool {
        !self.sub_titles.is_empty()
    }

    pub fn sub_title(&self, name: &str) -> Option<&Title> {
        self.sub_titles.iter().find(|t| t.name == name)
    }

    pub fn columns(&self) -> RangeInclusive<u32> {
        self.from_index..=self.to_index
    }

    /// Location of the title's first column on physical row `row`.
    pub fn location(&self, row: u32) -> CellLocation {
        CellLocation::new(row, self.from_index)
    }

    fn collect_multi_row_columns(&self, out: &mut FxHashSet<u32>) {
        if self.multi_row {
            out.extend(self.columns());
        }
        for sub in &self.sub_titles {
            sub.collect_multi_row_columns(out);
        }
    }
}

/// The parsed header of a sheet: a root title spanning every named column.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleRow {
    root: Title,
    multi_row_columns: FxHashSet<u32>,
}

fn directive(row: &RawRow) -> String {
    row.marker().to_ascii_lowercase()
}

impl TitleRow {
    /// Parse the title tree from directive rows. Errors are plain messages;
    /// the caller knows which sheet they belong to.
    pub fn parse(header: &[RawRow]) -> Result<Self, String> {
        let mut rows: Vec<&RawRow> = header
            .iter()
            .filter(|r| matches!(directive(r).as_str(), "##var" | "##field"))
            .collect();
        if rows.is_empty() {
            rows.extend(header.first());
        }
        let Some(width) = rows.iter().map(|r| r.width()).max() else {
            return Err("sheet has no header rows".to_string());
        };

        let top = parse_level(&rows, 0, 2, width)?;
        let (Some(first), Some(last)) = (top.first(), top.last()) else {
            return Err("header names no columns".to_string());
        };
        let root = Title {
            name: String::new(),
            from_index: first.from_index,
            to_index: last.to_index,
            multi_row: false,
            attrs: Vec::new(),
            sub_titles: top,
        };

        let mut multi_row_columns = FxHashSet::default();
        root.collect_multi_row_columns(&mut multi_row_columns);
        Ok(Self {
            root,
            multi_row_columns,
        })
    }

    pub fn root(&self) -> &Title {
        &self.root
    }

    pub fn has_multi_row(&self) -> bool {
        !self.multi_row_columns.is_empty()
    }

    pub fn is_multi_row_column(&self, col: u32) -> bool {
        self.multi_row_columns.contains(&col)
    }

    /// True when `row` carries nothing outside multi-row columns, i.e. it
    /// continues the previous logical row.
    pub fn is_continuation(&self, row: &RawRow) -> bool {
        self.has_multi_row()
            && self
                .root
                .columns()
                .filter(|c| !self.is_multi_row_column(*c))
                .all(|c| row.value(c).is_blank())
    }
}

struct ParsedName {
    name: String,
    multi_row: bool,
    attrs: Vec<(String, String)>,
}

/// `None` for blank and commented cells.
fn parse_title_cell(raw: &str) -> Option<ParsedName> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }
    let (multi_row, body) = match raw.strip_prefix('*') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let (name, attrs) = split_attrs(body);
    Some(ParsedName {
        name: name.to_string(),
        multi_row,
        attrs,
    })
}

fn has_deeper_name(rows: &[&RawRow], depth: usize, col: u32) -> bool {
    rows.iter()
        .skip(depth + 1)
        .any(|r| parse_title_cell(&r.text(col)).is_some())
}

fn parse_level(rows: &[&RawRow], depth: usize, from: u32, to: u32) -> Result<Vec<Title>, String> {
    let Some(row) = rows.get(depth) else {
        return Ok(Vec::new());
    };

    let mut titles: Vec<Title> = Vec::new();
    let mut col = from;
    while col <= to {
        let Some(parsed) = parse_title_cell(&row.text(col)) else {
            col += 1;
            continue;
        };
        if parsed.name.is_empty() {
            return Err(format!(
                "title in column {} has no name",
                col_to_letters(col)
            ));
        }

        let mut end = col;
        while end < to {
            let next = end + 1;
            let text = row.text(next);
            let widens = if text.trim().is_empty() {
                has_deeper_name(rows, depth, next)
            } else {
                parse_title_cell(&text).is_some_and(|p| p.name == parsed.name)
            };
            if !widens {
                break;
            }
            end = next;
        }

        if titles.iter().any(|t| t.name == parsed.name) {
            return Err(format!(
                "duplicate title `{}` in column {}",
                parsed.name,
                col_to_letters(col)
            ));
        }
        titles.push(Title {
            sub_titles: parse_level(rows, depth + 1, col, end)?,
            name: parsed.name,
            from_index: col,
            to_index: end,
            multi_row: parsed.multi_row,
            attrs: parsed.attrs,
        });
        col = end + 1;
    }
    Ok(titles)
}
