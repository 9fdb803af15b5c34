//! Meta crate that re-exports the cfgsheet layers with sensible defaults.
//! Depend on this crate and opt into specific layers via feature flags, or
//! reach the underlying crates through the module re-exports.

#[cfg(feature = "common")]
pub use cfgsheet_common as common;

#[cfg(feature = "schema")]
pub use cfgsheet_schema as schema;

#[cfg(feature = "loader")]
pub use cfgsheet_loader as loader;

#[cfg(feature = "common")]
pub use cfgsheet_common::{CellLocation, CellValue, DataCreateError, DataCreateErrorKind, Origin};

#[cfg(feature = "schema")]
pub use cfgsheet_schema::{BeanDef, FieldDef, Schema, SchemaDef, SchemaError, TBean, TType};

#[cfg(feature = "loader")]
pub use cfgsheet_loader::{
    DBean, DataLoader, DataValue, LoadError, LoadPhase, LoaderConfig, MemoryWorkbook, RawSheet,
    Record, RowColumnDataSource, SheetReader, loader_for_extension,
};

#[cfg(feature = "json")]
pub mod doc_examples;
