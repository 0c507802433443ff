//! Task models and the model loader
//!
//! A [`TaskModel`] describes what a task exposes: its properties and ports.
//! The [`ModelLoader`] maps model names (`project::Task`) to models, either
//! registered from code or read from a YAML description.

use crate::port::{PortDirection, PortSpec};
use crate::property::PropertySpec;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Interface description of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskModel {
    /// Model name, `project::Task`
    pub name: String,
    /// Documentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Declared properties
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
    /// Declared ports
    #[serde(default)]
    pub ports: Vec<PortSpec>,
}

impl TaskModel {
    /// Empty model
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            properties: Vec::new(),
            ports: Vec::new(),
        }
    }

    /// Set documentation
    #[inline]
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Add a property
    #[inline]
    #[must_use]
    pub fn with_property(mut self, property: PropertySpec) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a port
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: PortSpec) -> Self {
        self.ports.push(port);
        self
    }

    /// Find a property declaration
    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Find a port declaration
    #[must_use]
    pub fn find_port(&self, name: &str) -> Option<&PortSpec> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Output port declarations
    pub fn output_ports(&self) -> impl Iterator<Item = &PortSpec> {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Output)
    }

    /// Input port declarations
    pub fn input_ports(&self) -> impl Iterator<Item = &PortSpec> {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Input)
    }
}

/// Raised when a model name is not known to a loader
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("task model '{0}' not found")]
pub struct TaskModelNotFound(pub String);

/// Registry of task models by name
#[derive(Debug, Clone, Default)]
pub struct ModelLoader {
    models: IndexMap<String, TaskModel>,
}

impl ModelLoader {
    /// Empty loader
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader pre-populated with the models shipped by this crate
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut loader = Self::new();
        loader.register(crate::source::CycleSource::task_model());
        loader
    }

    /// Parse models from a YAML sequence of model descriptions
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        let models: Vec<TaskModel> = serde_yaml::from_str(text)?;
        let mut loader = Self::new();
        for model in models {
            loader.register(model);
        }
        Ok(loader)
    }

    /// Register a model, replacing any model with the same name
    pub fn register(&mut self, model: TaskModel) {
        self.models.insert(model.name.clone(), model);
    }

    /// Look up a model by name
    pub fn task_model_from_name(&self, name: &str) -> Result<&TaskModel, TaskModelNotFound> {
        self.models
            .get(name)
            .ok_or_else(|| TaskModelNotFound(name.to_string()))
    }

    /// Check if a model is known
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Registered model names
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }
}
