use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unknown bean `{name}`")]
    UnknownBean { name: String },

    #[error("invalid type expression `{expr}`: {message}")]
    TypeSyntax { expr: String, message: String },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("failed to parse schema YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read schema: {0}")]
    Io(#[from] std::io::Error),
}
