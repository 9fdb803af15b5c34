use cfgsheet_common::DataCreateError;
use cfgsheet_schema::SchemaError;
use thiserror::Error;

/// Failures that abort loading or reading one table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No sheet of the source carries a `##` marker in A1.
    #[error("{}", header_not_found_message(.url, .sheet.as_deref()))]
    HeaderNotFound { url: String, sheet: Option<String> },

    #[error("`{operation}` is not supported by {source_kind} sources")]
    Unsupported {
        operation: &'static str,
        source_kind: &'static str,
    },

    #[error(transparent)]
    FieldConstruction(Box<DataCreateError>),

    #[error("sheet:{sheet}")]
    SheetProcessing {
        sheet: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid header in `{url}` sheet `{sheet}`: {message}")]
    InvalidHeader {
        url: String,
        sheet: String,
        message: String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("failed to read `{url}`: {message}")]
    Reader { url: String, message: String },

    #[error("no sheets loaded; call load before reading records")]
    NotLoaded,
}

fn header_not_found_message(url: &str, sheet: Option<&str>) -> String {
    match sheet {
        Some(sheet) => format!(
            "`{url}` sheet `{sheet}` does not exist or is not a valid sheet (cell A1 of a valid sheet must start with ##)"
        ),
        None => format!(
            "`{url}` contains no valid sheet (cell A1 of a valid sheet must start with ##)"
        ),
    }
}

impl From<DataCreateError> for LoadError {
    fn from(err: DataCreateError) -> Self {
        LoadError::FieldConstruction(Box::new(err))
    }
}

impl LoadError {
    /// The field-level error, when this failure came from a single value.
    pub fn as_data_error(&self) -> Option<&DataCreateError> {
        match self {
            LoadError::FieldConstruction(e) => Some(e),
            _ => None,
        }
    }
}
