//! Runtime values and their types
//!
//! Properties carry [`Value`]s checked against a [`TypeSpec`]. Struct fields
//! keep declaration order.

use crate::error::ValueError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dynamically typed property or configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Unset; only meaningful inside partial configuration arrays
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Fixed array or container
    Array(Vec<Value>),
    /// Compound value
    Struct(IndexMap<String, Value>),
}

impl Value {
    /// Name of the value's kind, used in error messages
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Struct(_) => "struct",
        }
    }

    /// Check for [`Value::Null`]
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer content
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric content as float (integers are widened)
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean content
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// String content
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Array content
    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Struct field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Struct(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Build a struct value from `(name, value)` pairs
    pub fn structure<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "~"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, item)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {item}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

/// Type of a property value
///
/// Task model descriptions write compound types as single-key maps:
///
/// ```yaml
/// type: int
/// type: { array: { element: float, len: 3 } }
/// type: { struct: { a: int, b: int } }
/// ```
///
/// Plain `serde_yaml` expects `!array` tags for enum variants instead; use
/// [`TypeSpec::from_yaml_str`] or the `type` field of
/// [`PropertySpec`](crate::property::PropertySpec) to read the map form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeSpec {
    /// Boolean
    Bool,
    /// Signed integer
    Int,
    /// Floating point
    Float,
    /// String
    String,
    /// Array (`len` set) or container (`len` unset)
    Array {
        /// Element type
        element: Box<TypeSpec>,
        /// Fixed size, if any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        len: Option<usize>,
    },
    /// Compound type with ordered fields
    Struct(IndexMap<String, TypeSpec>),
}

impl TypeSpec {
    /// Growable container of `element`
    #[must_use]
    pub fn container(element: TypeSpec) -> Self {
        Self::Array {
            element: Box::new(element),
            len: None,
        }
    }

    /// Fixed-size array of `element`
    #[must_use]
    pub fn array(element: TypeSpec, len: usize) -> Self {
        Self::Array {
            element: Box::new(element),
            len: Some(len),
        }
    }

    /// Compound type from `(name, type)` pairs
    pub fn structure<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, TypeSpec)>,
        K: Into<String>,
    {
        Self::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Parse a type written in task model notation
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::with::singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(text))
    }

    /// Integer types need a rounding mode when given a float
    #[inline]
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int)
    }

    /// Int or float
    #[inline]
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Field type of a compound
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&TypeSpec> {
        match self {
            Self::Struct(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Element type of an array or container
    #[must_use]
    pub fn element(&self) -> Option<&TypeSpec> {
        match self {
            Self::Array { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Fixed size of an array
    #[must_use]
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            Self::Array { len, .. } => *len,
            _ => None,
        }
    }

    /// Zero-initialized value of this type
    ///
    /// Fixed arrays get `len` zeroed elements, containers start empty.
    #[must_use]
    pub fn zero(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::String => Value::String(String::new()),
            Self::Array { element, len } => {
                Value::Array(vec![element.zero(); len.unwrap_or(0)])
            }
            Self::Struct(fields) => Value::Struct(
                fields
                    .iter()
                    .map(|(name, t)| (name.clone(), t.zero()))
                    .collect(),
            ),
        }
    }

    /// Turn integers stored in float-typed positions into floats
    ///
    /// Call after [`TypeSpec::check`]; other values are returned unchanged.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn widen(&self, value: Value) -> Value {
        match (self, value) {
            (Self::Float, Value::Int(v)) => Value::Float(v as f64),
            (Self::Array { element, .. }, Value::Array(items)) => {
                Value::Array(items.into_iter().map(|item| element.widen(item)).collect())
            }
            (Self::Struct(fields), Value::Struct(values)) => Value::Struct(
                values
                    .into_iter()
                    .map(|(name, item)| {
                        let item = match fields.get(&name) {
                            Some(field_t) => field_t.widen(item),
                            None => item,
                        };
                        (name, item)
                    })
                    .collect(),
            ),
            (_, value) => value,
        }
    }

    /// Validate a complete value against this type
    pub fn check(&self, value: &Value) -> Result<(), ValueError> {
        self.check_at(value, "")
    }

    fn check_at(&self, value: &Value, path: &str) -> Result<(), ValueError> {
        match (self, value) {
            (Self::Bool, Value::Bool(_))
            | (Self::Int, Value::Int(_))
            | (Self::Float, Value::Float(_) | Value::Int(_))
            | (Self::String, Value::String(_)) => Ok(()),
            (Self::Array { element, len }, Value::Array(items)) => {
                if let Some(max) = len {
                    if items.len() > *max {
                        return Err(ValueError::ArrayTooLong {
                            path: path.to_string(),
                            len: items.len(),
                            max: *max,
                        });
                    }
                }
                items
                    .iter()
                    .enumerate()
                    .try_for_each(|(i, item)| element.check_at(item, &format!("{path}[{i}]")))
            }
            (Self::Struct(fields), Value::Struct(values)) => {
                for (name, item) in values {
                    let field_t = fields.get(name).ok_or_else(|| ValueError::UnknownField {
                        path: path.to_string(),
                        field: name.clone(),
                    })?;
                    field_t.check_at(item, &format!("{path}.{name}"))?;
                }
                Ok(())
            }
            _ => Err(ValueError::TypeMismatch {
                path: path.to_string(),
                expected: self.to_string(),
                found: value.kind().to_string(),
            }),
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Array { element, len: Some(n) } => write!(f, "{element}[{n}]"),
            Self::Array { element, len: None } => write!(f, "{element}[]"),
            Self::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, t)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {t}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
