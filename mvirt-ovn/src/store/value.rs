//! Column values and rows.
//!
//! Rows are schema-less column maps. Typed models convert to and from rows
//! through the [`Column`] trait, so the store never needs to know the Rust
//! type behind a table.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single column value.
///
/// Optional scalars are encoded as sets with zero or one element, the same
/// way the northbound schema models them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    String(String),
    Integer(i64),
    Boolean(bool),
    Set(BTreeSet<String>),
    Map(BTreeMap<String, String>),
}

impl Value {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
        }
    }

    /// Build a set value from any iterator of strings.
    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    /// True for empty sets and maps. Scalars are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Set(s) => s.is_empty(),
            Value::Map(m) => m.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(m: BTreeMap<String, String>) -> Self {
        Value::Map(m)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::Set(v.into_iter().collect())
    }
}

impl From<Option<String>> for Value {
    fn from(v: Option<String>) -> Self {
        Value::Set(v.into_iter().collect())
    }
}

/// A stored row: its UUID plus named columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub uuid: String,
    pub columns: BTreeMap<String, Value>,
}

impl Row {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            columns: BTreeMap::new(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn set(&mut self, column: &str, value: Value) {
        self.columns.insert(column.to_string(), value);
    }

    /// Convenience accessor for string columns, used by store-level filters.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        match self.columns.get(column) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

/// Conversion between a Rust field type and a column [`Value`].
///
/// A missing column decodes to the type's empty value, which is how rows
/// written by other clients with fewer columns are tolerated.
pub trait Column: Sized {
    fn encode(&self) -> Value;
    fn decode(value: Option<&Value>) -> Result<Self, String>;
}

fn mismatch(expected: &str, got: &Value) -> String {
    format!("expected {}, got {}", expected, got.type_name())
}

impl Column for String {
    fn encode(&self) -> Value {
        Value::String(self.clone())
    }

    fn decode(value: Option<&Value>) -> Result<Self, String> {
        match value {
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(mismatch("string", other)),
        }
    }
}

impl Column for Option<String> {
    fn encode(&self) -> Value {
        Value::Set(self.iter().cloned().collect())
    }

    fn decode(value: Option<&Value>) -> Result<Self, String> {
        match value {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Set(s)) if s.len() <= 1 => Ok(s.iter().next().cloned()),
            Some(Value::Set(s)) => Err(format!("optional column holds {} values", s.len())),
            Some(other) => Err(mismatch("optional string", other)),
        }
    }
}

impl Column for i64 {
    fn encode(&self) -> Value {
        Value::Integer(*self)
    }

    fn decode(value: Option<&Value>) -> Result<Self, String> {
        match value {
            None => Ok(0),
            Some(Value::Integer(v)) => Ok(*v),
            Some(other) => Err(mismatch("integer", other)),
        }
    }
}

impl Column for bool {
    fn encode(&self) -> Value {
        Value::Boolean(*self)
    }

    fn decode(value: Option<&Value>) -> Result<Self, String> {
        match value {
            None => Ok(false),
            Some(Value::Boolean(v)) => Ok(*v),
            Some(other) => Err(mismatch("boolean", other)),
        }
    }
}

/// Sets decode sorted; callers must not rely on insertion order.
impl Column for Vec<String> {
    fn encode(&self) -> Value {
        Value::set(self.iter().cloned())
    }

    fn decode(value: Option<&Value>) -> Result<Self, String> {
        match value {
            None => Ok(Vec::new()),
            Some(Value::Set(s)) => Ok(s.iter().cloned().collect()),
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(other) => Err(mismatch("set", other)),
        }
    }
}

impl Column for BTreeMap<String, String> {
    fn encode(&self) -> Value {
        Value::Map(self.clone())
    }

    fn decode(value: Option<&Value>) -> Result<Self, String> {
        match value {
            None => Ok(BTreeMap::new()),
            Some(Value::Map(m)) => Ok(m.clone()),
            Some(other) => Err(mismatch("map", other)),
        }
    }
}
