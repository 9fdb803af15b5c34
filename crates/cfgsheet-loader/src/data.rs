//! Typed values produced by the materializer.

use std::fmt;

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Null,
    Bool(bool),
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    DateTime(NaiveDateTime),
    Bean(DBean),
    List(Vec<DataValue>),
    Array(Vec<DataValue>),
    Set(Vec<DataValue>),
    /// Entries in sheet order.
    Map(Vec<(DataValue, DataValue)>),
}

/// A materialized bean: field values in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct DBean {
    pub type_name: String,
    pub fields: Vec<(String, DataValue)>,
}

impl DBean {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: DataValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&DataValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

impl DataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    pub fn as_bean(&self) -> Option<&DBean> {
        match self {
            DataValue::Bean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            DataValue::Byte(v) => Some(v as i64),
            DataValue::Short(v) => Some(v as i64),
            DataValue::Int(v) => Some(v as i64),
            DataValue::Long(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            DataValue::Float(v) => Some(v as f64),
            DataValue::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Elements of a list, array or set.
    pub fn elements(&self) -> Option<&[DataValue]> {
        match self {
            DataValue::List(v) | DataValue::Array(v) | DataValue::Set(v) => Some(v),
            _ => None,
        }
    }

    #[cfg(feature = "json")]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            DataValue::Null => Value::Null,
            DataValue::Bool(b) => Value::Bool(*b),
            DataValue::Byte(v) => Value::from(*v),
            DataValue::Short(v) => Value::from(*v),
            DataValue::Int(v) => Value::from(*v),
            DataValue::Long(v) => Value::from(*v),
            DataValue::Float(v) => Value::from(*v as f64),
            DataValue::Double(v) => Value::from(*v),
            DataValue::String(s) => Value::String(s.clone()),
            DataValue::DateTime(dt) => Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            DataValue::Bean(b) => b.to_json(),
            DataValue::List(v) | DataValue::Array(v) | DataValue::Set(v) => {
                Value::Array(v.iter().map(DataValue::to_json).collect())
            }
            DataValue::Map(entries) => Value::Array(
                entries
                    .iter()
                    .map(|(k, v)| Value::Array(vec![k.to_json(), v.to_json()]))
                    .collect(),
            ),
        }
    }
}

#[cfg(feature = "json")]
impl DBean {
    /// Object with a `$type` key next to the fields.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert(
            "$type".to_string(),
            serde_json::Value::String(self.type_name.clone()),
        );
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_json());
        }
        serde_json::Value::Object(map)
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[DataValue]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Null => f.write_str("null"),
            DataValue::Bool(b) => write!(f, "{b}"),
            DataValue::Byte(v) => write!(f, "{v}"),
            DataValue::Short(v) => write!(f, "{v}"),
            DataValue::Int(v) => write!(f, "{v}"),
            DataValue::Long(v) => write!(f, "{v}"),
            DataValue::Float(v) => write!(f, "{v}"),
            DataValue::Double(v) => write!(f, "{v}"),
            DataValue::String(s) => f.write_str(s),
            DataValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            DataValue::Bean(b) => write!(f, "{b}"),
            DataValue::List(v) | DataValue::Array(v) | DataValue::Set(v) => write_seq(f, v),
            DataValue::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl fmt::Display for DBean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.type_name)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, " {name}: {value}")?;
        }
        f.write_str(" }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_readable() {
        let bean = DBean::new("Item")
            .with_field("id", DataValue::Int(1))
            .with_field(
                "tags",
                DataValue::List(vec![
                    DataValue::String("a".into()),
                    DataValue::String("b".into()),
                ]),
            );
        assert_eq!(bean.to_string(), "Item { id: 1, tags: [a, b] }");
        assert_eq!(bean.get("id").and_then(DataValue::as_i64), Some(1));
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_carries_type_tag() {
        let bean = DBean::new("Reward")
            .with_field("id", DataValue::Int(3))
            .with_field("count", DataValue::Null);
        let json = bean.to_json();
        assert_eq!(json["$type"], "Reward");
        assert_eq!(json["id"], 3);
        assert!(json["count"].is_null());
    }
}
