pub mod backends;
pub mod config;
pub mod creator;
pub mod data;
pub mod define;
pub mod error;
pub mod raw;
pub mod record;
pub mod sheet;
pub mod source;
pub mod stream;
pub mod tags;
pub mod title;
pub mod traits;

pub use backends::{MemoryWorkbook, MemoryWorkbookError};
pub use config::LoaderConfig;
pub use creator::{CreateError, SheetDataCreator};
pub use data::{DBean, DataValue};
pub use define::{DefineRow, DescriptionSource, FieldInfo, TableDefInfo, TableDefinition};
pub use error::LoadError;
pub use raw::{Cell, RawRow, RawSheet, load_raw_sheets};
pub use record::Record;
pub use sheet::{LogicalRow, LogicalRows, RowColumnSheet};
pub use source::{
    DataLoader, INTERN_URL, LoadPhase, LoaderKind, RowColumnDataSource, loader_for_extension,
};
pub use stream::{CellStream, StreamItem};
pub use tags::{is_ignore_tag, parse_tags};
pub use title::{Title, TitleRow};
pub use traits::{Grid, SheetReader};

// Re-export for convenience
pub use cfgsheet_common::{CellLocation, CellValue, DataCreateError, DataCreateErrorKind, Origin};
