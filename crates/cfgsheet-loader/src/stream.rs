//! Sequential reader over the cells of one title span.

use cfgsheet_common::{CellLocation, CellValue};

use crate::raw::RawRow;

/// One value pulled from a stream, with the cell it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamItem {
    pub value: CellValue,
    pub location: CellLocation,
}

/// Values of a cell range, split by separator characters. Blank cells and
/// blank pieces are dropped.
#[derive(Debug, Clone)]
pub struct CellStream {
    items: Vec<StreamItem>,
    pos: usize,
    anchor: CellLocation,
}

fn push_split(items: &mut Vec<StreamItem>, value: &CellValue, location: CellLocation, sep: Option<&str>) {
    if value.is_blank() {
        return;
    }
    match (value, sep) {
        (CellValue::Text(text), Some(sep)) if !sep.is_empty() => {
            items.extend(
                text.split(|c| sep.contains(c))
                    .filter(|piece| !piece.trim().is_empty())
                    .map(|piece| StreamItem {
                        value: CellValue::Text(piece.to_string()),
                        location,
                    }),
            );
        }
        _ => items.push(StreamItem {
            value: value.clone(),
            location,
        }),
    }
}

impl CellStream {
    /// Cells `from..=to` of `row`, left to right.
    pub fn from_row(row: &RawRow, from: u32, to: u32, sep: Option<&str>) -> Self {
        let mut items = Vec::new();
        for col in from..=to {
            if let Some(cell) = row.cell(col) {
                push_split(&mut items, &cell.value, cell.location(), sep);
            }
        }
        Self {
            items,
            pos: 0,
            anchor: CellLocation::new(row.row, from),
        }
    }

    /// Re-split a single item, for values that carry their own separator.
    pub fn from_item(item: &StreamItem, sep: Option<&str>) -> Self {
        let mut items = Vec::new();
        push_split(&mut items, &item.value, item.location, sep);
        Self {
            items,
            pos: 0,
            anchor: item.location,
        }
    }

    pub fn peek(&self) -> Option<&StreamItem> {
        self.items.get(self.pos)
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.pos)
    }

    /// Where to point an error about the current read position: the next
    /// item, else the last consumed one, else the start of the range.
    pub fn location(&self) -> CellLocation {
        self.items
            .get(self.pos)
            .or_else(|| self.pos.checked_sub(1).and_then(|i| self.items.get(i)))
            .map_or(self.anchor, |item| item.location)
    }
}

impl Iterator for CellStream {
    type Item = StreamItem;

    fn next(&mut self) -> Option<StreamItem> {
        let item = self.items.get(self.pos).cloned()?;
        self.pos += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}
