//! Record schema model: the closed set of field types a sheet row is
//! materialized into, plus YAML definitions and validation.

pub mod definition;
pub mod error;
pub mod schema;
pub mod types;
pub mod validation;

pub use definition::{BeanDef, FieldDef, SchemaDef};
pub use error::SchemaError;
pub use schema::{Schema, TBean, TField};
pub use types::{CollectionKind, PrimitiveType, TCollection, TType, TypeKind, split_attrs};
pub use validation::{SchemaIssue, ValidationError};
