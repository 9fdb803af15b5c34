use cfgsheet_common::DateSystem;
use serde::{Deserialize, Serialize};

/// Knobs that shape how raw cells become typed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Rows whose tag (or any tag token) equals one of these are skipped.
    pub ignore_tags: Vec<String>,
    /// Characters that split a tag cell into tokens.
    pub tag_separators: String,
    /// Split characters for collection cells that declare no `sep`.
    pub default_collection_sep: String,
    /// Text read as null by nullable types.
    pub null_literal: String,
    pub true_literals: Vec<String>,
    pub false_literals: Vec<String>,
    /// chrono formats tried in order for text cells feeding `datetime` fields.
    pub datetime_formats: Vec<String>,
    /// Empty cells of non-nullable primitives take the column default or zero.
    pub empty_as_default: bool,
    pub trim_strings: bool,
    pub date_system: DateSystem,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            ignore_tags: vec!["##".to_string(), "!".to_string()],
            tag_separators: ",;| ".to_string(),
            default_collection_sep: ",".to_string(),
            null_literal: "null".to_string(),
            true_literals: ["true", "1", "y", "yes", "是"].map(String::from).to_vec(),
            false_literals: ["false", "0", "n", "no", "否"].map(String::from).to_vec(),
            datetime_formats: [
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%d %H:%M",
                "%Y-%m-%d",
                "%Y/%m/%d %H:%M:%S",
                "%Y/%m/%d",
            ]
            .map(String::from)
            .to_vec(),
            empty_as_default: true,
            trim_strings: false,
            date_system: DateSystem::Excel1900,
        }
    }
}

impl LoaderConfig {
    pub fn with_ignore_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_collection_sep(mut self, sep: impl Into<String>) -> Self {
        self.default_collection_sep = sep.into();
        self
    }

    pub fn with_empty_as_default(mut self, yes: bool) -> Self {
        self.empty_as_default = yes;
        self
    }

    pub fn with_trim_strings(mut self, yes: bool) -> Self {
        self.trim_strings = yes;
        self
    }

    pub fn with_date_system(mut self, system: DateSystem) -> Self {
        self.date_system = system;
        self
    }

    pub(crate) fn parse_bool(&self, text: &str) -> Option<bool> {
        let text = text.trim();
        if self.true_literals.iter().any(|l| l.eq_ignore_ascii_case(text)) {
            Some(true)
        } else if self.false_literals.iter().any(|l| l.eq_ignore_ascii_case(text)) {
            Some(false)
        } else {
            None
        }
    }

    pub(crate) fn is_null_literal(&self, text: &str) -> bool {
        !self.null_literal.is_empty() && text.trim().eq_ignore_ascii_case(&self.null_literal)
    }
}
