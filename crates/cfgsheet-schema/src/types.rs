//! Closed type model consumed by the record materializer.
//!
//! A field type is one of three shapes: a primitive scalar, a reference to a
//! bean (composite record) declared in the same [`Schema`](crate::Schema), or
//! a collection of another type. Keeping the set closed lets the materializer
//! dispatch with an exhaustive `match`.

use std::fmt;

use crate::error::SchemaError;

/// Scalar types a single cell (or a single piece of a split cell) converts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    DateTime,
}

impl PrimitiveType {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Self::Bool,
            "byte" => Self::Byte,
            "short" => Self::Short,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "string" => Self::String,
            "datetime" => Self::DateTime,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::DateTime => "datetime",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    List,
    Array,
    Set,
    /// Key/value pairs; the collection's element type is the value type.
    Map { key: Box<TType> },
}

impl CollectionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Array => "array",
            Self::Set => "set",
            Self::Map { .. } => "map",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TCollection {
    pub kind: CollectionKind,
    pub element: Box<TType>,
    /// Separator characters declared inline, e.g. `(list#sep=|),int`.
    pub sep: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive(PrimitiveType),
    /// Reference to a bean by name, resolved through the owning schema.
    Bean(String),
    Collection(TCollection),
}

/// A field type: shape plus nullability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TType {
    pub kind: TypeKind,
    pub nullable: bool,
}

impl TType {
    pub fn primitive(p: PrimitiveType) -> Self {
        Self {
            kind: TypeKind::Primitive(p),
            nullable: false,
        }
    }

    pub fn bean(name: impl Into<String>) -> Self {
        Self {
            kind: TypeKind::Bean(name.into()),
            nullable: false,
        }
    }

    pub fn collection(kind: CollectionKind, element: TType) -> Self {
        Self {
            kind: TypeKind::Collection(TCollection {
                kind,
                element: Box::new(element),
                sep: None,
            }),
            nullable: false,
        }
    }

    pub fn list(element: TType) -> Self {
        Self::collection(CollectionKind::List, element)
    }

    pub fn map(key: TType, value: TType) -> Self {
        Self::collection(
            CollectionKind::Map {
                key: Box::new(key),
            },
            value,
        )
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self.kind {
            TypeKind::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&TCollection> {
        match &self.kind {
            TypeKind::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// Parse a type expression such as `int?`, `list,Item` or
    /// `(map#sep=;),string,int`.
    pub fn parse(expr: &str) -> Result<Self, SchemaError> {
        parse_type(expr.trim()).map_err(|message| SchemaError::TypeSyntax {
            expr: expr.to_string(),
            message,
        })
    }

    /// Every bean name this type refers to, including through collections.
    pub fn referenced_beans(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_beans(self, &mut out);
        out
    }
}

fn collect_beans<'a>(ty: &'a TType, out: &mut Vec<&'a str>) {
    match &ty.kind {
        TypeKind::Primitive(_) => {}
        TypeKind::Bean(name) => out.push(name.as_str()),
        TypeKind::Collection(c) => {
            if let CollectionKind::Map { key } = &c.kind {
                collect_beans(key, out);
            }
            collect_beans(&c.element, out);
        }
    }
}

impl fmt::Display for TType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeKind::Primitive(p) => write!(f, "{p}")?,
            TypeKind::Bean(name) => f.write_str(name)?,
            TypeKind::Collection(c) => {
                match &c.sep {
                    Some(sep) => write!(f, "({}#sep={sep})", c.kind.name())?,
                    None => f.write_str(c.kind.name())?,
                }
                if let CollectionKind::Map { key } = &c.kind {
                    write!(f, ",{key}")?;
                }
                write!(f, ",{}", c.element)?;
            }
        }
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

/// Split `name#k=v#flag` into the name and its attributes.
///
/// A bare attribute key (no `=`) is recorded with the value `"true"`.
pub fn split_attrs(raw: &str) -> (&str, Vec<(String, String)>) {
    let mut parts = raw.split('#');
    let name = parts.next().unwrap_or_default().trim();
    let attrs = parts
        .filter(|p| !p.trim().is_empty())
        .map(|p| match p.split_once('=') {
            Some((k, v)) => (k.trim().to_string(), v.to_string()),
            None => (p.trim().to_string(), "true".to_string()),
        })
        .collect();
    (name, attrs)
}

fn parse_type(expr: &str) -> Result<TType, String> {
    if expr.is_empty() {
        return Err("empty type expression".to_string());
    }

    let (head, rest) = split_head(expr)?;
    let Some(rest) = rest else {
        return parse_scalar(head);
    };

    let (kind_name, attrs) = split_attrs(head);
    let mut sep = None;
    for (k, v) in attrs {
        match k.as_str() {
            "sep" => sep = Some(v),
            other => return Err(format!("unknown collection attribute `{other}`")),
        }
    }

    let kind = match kind_name {
        "list" => CollectionKind::List,
        "array" => CollectionKind::Array,
        "set" => CollectionKind::Set,
        "map" => {
            let Some((key, value)) = rest.split_once(',') else {
                return Err("map requires a key and a value type".to_string());
            };
            let key = parse_type(key.trim())?;
            let element = parse_type(value.trim())?;
            return Ok(TType {
                kind: TypeKind::Collection(TCollection {
                    kind: CollectionKind::Map { key: Box::new(key) },
                    element: Box::new(element),
                    sep,
                }),
                nullable: false,
            });
        }
        other => return Err(format!("`{other}` is not a collection type")),
    };

    let element = parse_type(rest.trim())?;
    Ok(TType {
        kind: TypeKind::Collection(TCollection {
            kind,
            element: Box::new(element),
            sep,
        }),
        nullable: false,
    })
}

/// Split off the leading segment of a type expression. A parenthesised head
/// may itself contain separators (`(list#sep=,),int`).
fn split_head(expr: &str) -> Result<(&str, Option<&str>), String> {
    if let Some(inner) = expr.strip_prefix('(') {
        let Some(close) = inner.find(')') else {
            return Err("unbalanced `(`".to_string());
        };
        let head = &inner[..close];
        let after = inner[close + 1..].trim_start();
        return match after.strip_prefix(',') {
            Some(rest) => Ok((head.trim(), Some(rest))),
            None if after.is_empty() => Err(format!("`{head}` needs an element type")),
            None => Err(format!("unexpected `{after}` after `({head})`")),
        };
    }
    match expr.split_once(',') {
        Some((head, rest)) => Ok((head.trim(), Some(rest))),
        None => Ok((expr, None)),
    }
}

fn parse_scalar(expr: &str) -> Result<TType, String> {
    let (name, nullable) = match expr.strip_suffix('?') {
        Some(n) => (n.trim(), true),
        None => (expr, false),
    };
    if name.is_empty() {
        return Err("missing type name".to_string());
    }
    if matches!(name, "list" | "array" | "set" | "map") {
        return Err(format!("`{name}` needs an element type"));
    }
    let kind = match PrimitiveType::parse(name) {
        Some(p) => TypeKind::Primitive(p),
        None => TypeKind::Bean(name.to_string()),
    };
    Ok(TType { kind, nullable })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primitives_and_nullability() {
        assert_eq!(
            TType::parse("int").unwrap(),
            TType::primitive(PrimitiveType::Int)
        );
        assert_eq!(
            TType::parse(" string? ").unwrap(),
            TType::primitive(PrimitiveType::String).nullable()
        );
        assert_eq!(TType::parse("Item").unwrap(), TType::bean("Item"));
    }

    #[test]
    fn parses_collections() {
        let ty = TType::parse("list,Reward").unwrap();
        assert_eq!(ty, TType::list(TType::bean("Reward")));

        let ty = TType::parse("map,string,list,int").unwrap();
        assert_eq!(
            ty,
            TType::map(
                TType::primitive(PrimitiveType::String),
                TType::list(TType::primitive(PrimitiveType::Int))
            )
        );
    }

    #[test]
    fn parses_inline_separator() {
        let ty = TType::parse("(list#sep=|),int").unwrap();
        let coll = ty.as_collection().unwrap();
        assert_eq!(coll.sep.as_deref(), Some("|"));
        assert_eq!(ty.to_string(), "(list#sep=|),int");
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(TType::parse("").is_err());
        assert!(TType::parse("list").is_err());
        assert!(TType::parse("map,int").is_err());
        assert!(TType::parse("(list#sep=,").is_err());
        assert!(TType::parse("(list#bogus=1),int").is_err());
        assert!(TType::parse("tuple,int").is_err());
    }

    #[test]
    fn display_roundtrips_expression() {
        for expr in ["int", "int?", "list,Item", "map,int,string", "set,long"] {
            assert_eq!(TType::parse(expr).unwrap().to_string(), expr);
        }
    }

    #[test]
    fn collects_referenced_beans() {
        let ty = TType::parse("map,string,list,Reward").unwrap();
        assert_eq!(ty.referenced_beans(), vec!["Reward"]);
    }

    #[test]
    fn split_attrs_handles_flags() {
        let (name, attrs) = split_attrs("count#default=1#non_empty");
        assert_eq!(name, "count");
        assert_eq!(
            attrs,
            vec![
                ("default".to_string(), "1".to_string()),
                ("non_empty".to_string(), "true".to_string())
            ]
        );
    }
}
