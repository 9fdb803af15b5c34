use std::collections::BTreeSet;

use cfgsheet_common::Origin;

use crate::data::DBean;

/// One materialized table row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub data: DBean,
    /// Source and sheet the row was read from.
    pub source: Origin,
    /// 1-based physical row of the record's first row.
    pub row: u32,
    pub tags: BTreeSet<String>,
}

impl Record {
    pub fn new(data: DBean, source: Origin, row: u32, tags: BTreeSet<String>) -> Self {
        Self {
            data,
            source,
            row,
            tags,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// `sheet@url:row`, for messages about this record.
    pub fn location(&self) -> String {
        format!("{}:{}", self.source, self.row)
    }
}
