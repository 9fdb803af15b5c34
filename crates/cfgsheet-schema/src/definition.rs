use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::schema::{Schema, TBean, TField};
use crate::types::{CollectionKind, PrimitiveType, TType, TypeKind};
use crate::validation::{SchemaIssue, ValidationError};

static BEAN_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .unwrap_or_else(|e| panic!("bean name regex must compile: {e}"))
});

static FIELD_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
        .unwrap_or_else(|e| panic!("field name regex must compile: {e}"))
});

/// Serializable schema description, usually read from YAML.
///
/// ```yaml
/// beans:
///   - name: Item
///     fields:
///       - { name: id, type: int }
///       - { name: rewards, type: "list,Reward", sep: ";" }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDef {
    #[serde(default)]
    pub beans: Vec<BeanDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BeanDef {
    pub name: String,
    /// Separator characters used when the whole bean sits in one cell.
    #[serde(default)]
    pub sep: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub sep: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl SchemaDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bean(mut self, bean: BeanDef) -> Self {
        self.beans.push(bean);
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Validate the definitions and return every issue found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let mut seen_beans = FxHashSet::default();

        for (bi, bean) in self.beans.iter().enumerate() {
            let path = format!("beans[{bi}]");
            if !BEAN_NAME.is_match(&bean.name) {
                issues.push(SchemaIssue::new(
                    format!("{path}.name"),
                    format!("`{}` is not a valid bean name", bean.name),
                ));
            } else if PrimitiveType::parse(&bean.name).is_some() {
                issues.push(SchemaIssue::new(
                    format!("{path}.name"),
                    format!("bean name `{}` shadows a primitive type", bean.name),
                ));
            }
            if !seen_beans.insert(bean.name.as_str()) {
                issues.push(SchemaIssue::new(
                    format!("{path}.name"),
                    format!("duplicate bean `{}`", bean.name),
                ));
            }
            if bean.sep.as_deref().is_some_and(str::is_empty) {
                issues.push(SchemaIssue::new(
                    format!("{path}.sep"),
                    "separator must not be empty",
                ));
            }
            if bean.fields.is_empty() {
                issues.push(SchemaIssue::new(
                    format!("{path}.fields"),
                    "bean must define at least one field",
                ));
            }

            let mut seen_fields = FxHashSet::default();
            for (fi, field) in bean.fields.iter().enumerate() {
                let fpath = format!("{path}.fields[{fi}]");
                if !FIELD_NAME.is_match(&field.name) {
                    issues.push(SchemaIssue::new(
                        format!("{fpath}.name"),
                        format!("`{}` is not a valid field name", field.name),
                    ));
                }
                if !seen_fields.insert(field.name.as_str()) {
                    issues.push(SchemaIssue::new(
                        format!("{fpath}.name"),
                        format!("duplicate field `{}` in bean `{}`", field.name, bean.name),
                    ));
                }
                if field.sep.as_deref().is_some_and(str::is_empty) {
                    issues.push(SchemaIssue::new(
                        format!("{fpath}.sep"),
                        "separator must not be empty",
                    ));
                }
                match TType::parse(&field.ty) {
                    Ok(ty) => self.check_type(&ty, &format!("{fpath}.type"), &mut issues),
                    Err(e) => issues.push(SchemaIssue::new(format!("{fpath}.type"), e.to_string())),
                }
            }
        }

        if let Some(cycle) = self.find_containment_cycle() {
            issues.push(SchemaIssue::new(
                "beans",
                format!(
                    "beans contain themselves without a nullable or collection break: {}",
                    cycle.join(" -> ")
                ),
            ));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }

    fn check_type(&self, ty: &TType, path: &str, issues: &mut Vec<SchemaIssue>) {
        for name in ty.referenced_beans() {
            if !self.beans.iter().any(|b| b.name == name) {
                issues.push(SchemaIssue::new(path, format!("unknown bean `{name}`")));
            }
        }
        let TypeKind::Collection(coll) = &ty.kind else {
            return;
        };
        if coll.sep.as_deref().is_some_and(str::is_empty) {
            issues.push(SchemaIssue::new(path, "separator must not be empty"));
        }
        match &coll.kind {
            CollectionKind::Set if coll.element.as_primitive().is_none() => {
                issues.push(SchemaIssue::new(
                    path,
                    format!("set elements must be primitive, found `{}`", coll.element),
                ));
            }
            CollectionKind::Map { key } if key.as_primitive().is_none() || key.nullable => {
                issues.push(SchemaIssue::new(
                    path,
                    format!("map keys must be non-nullable primitives, found `{key}`"),
                ));
            }
            _ => {}
        }
    }

    /// Find beans that contain themselves through plain (non-nullable,
    /// non-collection) bean fields. Such beans can never be materialized.
    fn find_containment_cycle(&self) -> Option<Vec<String>> {
        let mut edges: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
        for bean in &self.beans {
            let targets = bean
                .fields
                .iter()
                .filter_map(|f| TType::parse(&f.ty).ok())
                .filter_map(|ty| match ty.kind {
                    TypeKind::Bean(name) if !ty.nullable => Some(name),
                    _ => None,
                })
                .filter_map(|name| {
                    self.beans
                        .iter()
                        .find(|b| b.name == name)
                        .map(|b| b.name.as_str())
                })
                .collect();
            edges.insert(bean.name.as_str(), targets);
        }

        fn visit<'a>(
            node: &'a str,
            edges: &FxHashMap<&'a str, Vec<&'a str>>,
            stack: &mut Vec<&'a str>,
            done: &mut FxHashSet<&'a str>,
        ) -> Option<Vec<String>> {
            if let Some(pos) = stack.iter().position(|n| *n == node) {
                let mut cycle: Vec<String> = stack[pos..].iter().map(|s| s.to_string()).collect();
                cycle.push(node.to_string());
                return Some(cycle);
            }
            if done.contains(node) {
                return None;
            }
            stack.push(node);
            for next in edges.get(node).into_iter().flatten() {
                if let Some(cycle) = visit(next, edges, stack, done) {
                    return Some(cycle);
                }
            }
            stack.pop();
            done.insert(node);
            None
        }

        let mut done = FxHashSet::default();
        for bean in &self.beans {
            let mut stack = Vec::new();
            if let Some(cycle) = visit(bean.name.as_str(), &edges, &mut stack, &mut done) {
                return Some(cycle);
            }
        }
        None
    }

    /// Validate and resolve into a [`Schema`].
    pub fn build(self) -> Result<Schema, SchemaError> {
        self.validate()?;
        let mut beans = Vec::with_capacity(self.beans.len());
        for bean in self.beans {
            let mut fields = Vec::with_capacity(bean.fields.len());
            for field in bean.fields {
                fields.push(TField {
                    ty: TType::parse(&field.ty)?,
                    name: field.name,
                    sep: field.sep,
                    comment: field.comment,
                });
            }
            beans.push(TBean {
                name: bean.name,
                sep: bean.sep,
                comment: bean.comment,
                fields,
            });
        }
        Ok(Schema::from_beans(beans))
    }
}

impl BeanDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sep: None,
            comment: None,
            fields: Vec::new(),
        }
    }

    pub fn with_sep(mut self, sep: impl Into<String>) -> Self {
        self.sep = Some(sep.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.fields.push(FieldDef::new(name, ty));
        self
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            sep: None,
            comment: None,
        }
    }

    pub fn with_sep(mut self, sep: impl Into<String>) -> Self {
        self.sep = Some(sep.into());
        self
    }
}
