//! Task properties
//!
//! A [`PropertySet`] holds the runtime values of the properties declared by a
//! [`TaskModel`](crate::model::TaskModel). Writes are type-checked.

use crate::error::{TaskError, TaskResult};
use crate::value::{TypeSpec, Value};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declaration of a property in a task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    /// Property name
    pub name: String,
    /// Value type
    #[serde(rename = "type", with = "serde_yaml::with::singleton_map_recursive")]
    pub type_spec: TypeSpec,
    /// Documentation, written as comments when saving configurations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Initial value; the type's zero value when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl PropertySpec {
    /// New property declaration
    #[must_use]
    pub fn new(name: impl Into<String>, type_spec: TypeSpec) -> Self {
        Self {
            name: name.into(),
            type_spec,
            doc: None,
            default: None,
        }
    }

    /// Set documentation
    #[inline]
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Set initial value
    #[inline]
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Initial runtime value
    #[must_use]
    pub fn initial_value(&self) -> Value {
        self.default
            .clone()
            .map_or_else(|| self.type_spec.zero(), |value| self.type_spec.widen(value))
    }
}

/// A property instance on a running task
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    spec: PropertySpec,
    value: Value,
    last_write: Option<DateTime<Utc>>,
}

impl Property {
    fn new(spec: PropertySpec) -> Self {
        let value = spec.initial_value();
        Self {
            spec,
            value,
            last_write: None,
        }
    }

    /// Property name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Declaration
    #[inline]
    #[must_use]
    pub fn spec(&self) -> &PropertySpec {
        &self.spec
    }

    /// Current value
    #[inline]
    #[must_use]
    pub fn read(&self) -> &Value {
        &self.value
    }

    /// Timestamp of the last write, if any
    #[inline]
    #[must_use]
    pub fn last_write(&self) -> Option<DateTime<Utc>> {
        self.last_write
    }

    fn write(&mut self, value: Value, timestamp: DateTime<Utc>) -> TaskResult<()> {
        self.spec.type_spec.check(&value)?;
        self.value = self.spec.type_spec.widen(value);
        self.last_write = Some(timestamp);
        Ok(())
    }
}

/// Ordered set of properties owned by a task context
#[derive(Debug, Clone, Default)]
pub struct PropertySet {
    owner: String,
    properties: IndexMap<String, Property>,
}

impl PropertySet {
    /// Build from declarations; values start at their initial value
    pub fn new<'a>(owner: &str, specs: impl IntoIterator<Item = &'a PropertySpec>) -> Self {
        Self {
            owner: owner.to_string(),
            properties: specs
                .into_iter()
                .map(|spec| (spec.name.clone(), Property::new(spec.clone())))
                .collect(),
        }
    }

    /// Look up a property
    pub fn get(&self, name: &str) -> TaskResult<&Property> {
        self.properties
            .get(name)
            .ok_or_else(|| TaskError::property_not_found(&self.owner, name))
    }

    /// Read a property value
    pub fn read(&self, name: &str) -> TaskResult<&Value> {
        self.get(name).map(Property::read)
    }

    /// Write a property value now
    pub fn write(&mut self, name: &str, value: impl Into<Value>) -> TaskResult<()> {
        self.write_at(name, value.into(), Utc::now())
    }

    /// Write a property value with an explicit timestamp
    pub fn write_at(&mut self, name: &str, value: Value, timestamp: DateTime<Utc>) -> TaskResult<()> {
        let owner = &self.owner;
        let property = self
            .properties
            .get_mut(name)
            .ok_or_else(|| TaskError::property_not_found(owner, name))?;
        property.write(value, timestamp)?;
        tracing::debug!(task = %owner, property = name, "property written");
        Ok(())
    }

    /// Check if a property exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Property names in declaration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.properties.keys().map(String::as_str).collect()
    }

    /// Iterate over properties
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Number of properties
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if there are no properties
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
