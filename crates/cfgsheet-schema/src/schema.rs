use std::path::Path;

use rustc_hash::FxHashMap;

use crate::definition::SchemaDef;
use crate::error::SchemaError;
use crate::types::TType;

/// A resolved, validated set of beans.
#[derive(Debug, Clone)]
pub struct Schema {
    beans: Vec<TBean>,
    index: FxHashMap<String, usize>,
}

/// A composite record type.
#[derive(Debug, Clone, PartialEq)]
pub struct TBean {
    pub name: String,
    pub sep: Option<String>,
    pub comment: Option<String>,
    pub fields: Vec<TField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TField {
    pub name: String,
    pub ty: TType,
    pub sep: Option<String>,
    pub comment: Option<String>,
}

impl Schema {
    pub(crate) fn from_beans(beans: Vec<TBean>) -> Self {
        let index = beans
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.clone(), i))
            .collect();
        Self { beans, index }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, SchemaError> {
        SchemaDef::from_yaml_str(yaml)?.build()
    }

    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, SchemaError> {
        SchemaDef::from_yaml_reader(reader)?.build()
    }

    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let file = std::fs::File::open(path)?;
        Self::from_yaml_reader(std::io::BufReader::new(file))
    }

    /// Beans in declaration order.
    pub fn beans(&self) -> &[TBean] {
        &self.beans
    }

    pub fn get(&self, name: &str) -> Option<&TBean> {
        self.index.get(name).map(|&i| &self.beans[i])
    }

    pub fn bean(&self, name: &str) -> Result<&TBean, SchemaError> {
        self.get(name).ok_or_else(|| SchemaError::UnknownBean {
            name: name.to_string(),
        })
    }
}

impl TBean {
    pub fn field(&self, name: &str) -> Option<&TField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &TField> {
        self.fields.iter()
    }
}
