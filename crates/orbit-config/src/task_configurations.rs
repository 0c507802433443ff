//! Configurations of a single task model
//!
//! Holds named sections, each a partial configuration of the model's
//! properties. Sections are loaded from YAML files, combined with
//! [`TaskConfigurations::conf`] and applied onto running tasks.

use crate::error::{ConfigError, ConfigResult};
use crate::header::{split_sections, DEFAULT_SECTION};
use crate::merge::{merge_conf, Section};
use crate::normalize::normalize_conf;
use chrono::Utc;
use indexmap::IndexMap;
use orbit_core::{TaskHandle, TaskModel, TypeSpec, Value};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Named configuration sections for one task model
#[derive(Debug)]
pub struct TaskConfigurations {
    model: TaskModel,
    sections: IndexMap<String, Section>,
    merged: Mutex<HashMap<(Vec<String>, bool), Section>>,
}

impl TaskConfigurations {
    /// No sections yet
    #[must_use]
    pub fn new(model: TaskModel) -> Self {
        Self {
            model,
            sections: IndexMap::new(),
            merged: Mutex::new(HashMap::new()),
        }
    }

    /// Model the sections apply to
    #[inline]
    #[must_use]
    pub fn model(&self) -> &TaskModel {
        &self.model
    }

    /// Section by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Check if a section exists
    #[inline]
    #[must_use]
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Section names in load order
    #[must_use]
    pub fn section_names(&self) -> Vec<&str> {
        self.sections.keys().map(String::as_str).collect()
    }

    /// Number of sections
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Check if no section is known
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Load sections from a YAML file
    ///
    /// Returns the names of the sections that were added or changed.
    pub fn load_from_yaml(&mut self, path: impl AsRef<Path>) -> ConfigResult<Vec<String>> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        self.load_from_str(&text, &path.display().to_string())
            .map_err(|e| e.context(format!("error loading {}", path.display())))
    }

    /// Load sections from YAML text; `origin` names the text in errors
    pub fn load_from_str(&mut self, text: &str, origin: &str) -> ConfigResult<Vec<String>> {
        let mut changed = Vec::new();
        for raw in split_sections(text, origin)? {
            let name = raw.header.name.clone();
            let body: Option<Section> = if raw.body.trim().is_empty() {
                None
            } else {
                serde_yaml::from_str(&raw.body).map_err(|source| ConfigError::Yaml {
                    origin: origin.to_string(),
                    section: name.clone(),
                    source,
                })?
            };

            let context = || format!("while loading section {name} of {origin}");
            let body = normalize_conf(&self.model, body.unwrap_or_default())
                .map_err(|e| e.context(context()))?;
            let resolved = self
                .resolve_chain(&name, &raw.header.chain, body)
                .map_err(|e| e.context(context()))?;

            if self.insert(&name, resolved, raw.header.merge)? {
                changed.push(name);
            }
        }
        Ok(changed)
    }

    /// Merge chained sections, in order, with a section body
    ///
    /// The body goes where its own name appears in the chain, or last.
    fn resolve_chain(&self, name: &str, chain: &[String], body: Section) -> ConfigResult<Section> {
        if chain.is_empty() {
            return Ok(body);
        }
        let mut result = Section::new();
        let mut body_merged = false;
        for link in chain {
            if link == name {
                result = merge_conf(&result, &body, true)?;
                body_merged = true;
            } else {
                let section = self
                    .sections
                    .get(link)
                    .ok_or_else(|| ConfigError::UnknownSection(link.clone()))?;
                result = merge_conf(&result, section, true)?;
            }
        }
        if !body_merged {
            result = merge_conf(&result, &body, true)?;
        }
        Ok(result)
    }

    /// Add a section from a raw configuration
    ///
    /// With `merge`, the configuration is merged onto an existing section of
    /// the same name. Returns whether the stored section changed.
    pub fn add(&mut self, name: &str, conf: Section, merge: bool) -> ConfigResult<bool> {
        let conf = normalize_conf(&self.model, conf)?;
        self.insert(name, conf, merge)
    }

    fn insert(&mut self, name: &str, conf: Section, merge: bool) -> ConfigResult<bool> {
        let (conf, changed) = match self.sections.get(name) {
            Some(existing) => {
                let conf = if merge {
                    merge_conf(existing, &conf, true)?
                } else {
                    conf
                };
                let changed = *existing != conf;
                (conf, changed)
            }
            None => (conf, true),
        };
        self.sections.insert(name.to_string(), conf);
        if changed {
            self.merged.lock().clear();
        }
        Ok(changed)
    }

    /// Store the current properties of `task` as a section
    pub fn extract(&mut self, name: &str, task: &dyn TaskHandle, merge: bool) -> ConfigResult<bool> {
        let conf = read_task_conf(task);
        self.add(name, conf, merge).map_err(|e| {
            e.context(format!(
                "while saving section {name} from task {}({})",
                task.name(),
                self.model.name
            ))
        })
    }

    /// Combination of the named sections
    ///
    /// Sections are merged left to right. Without `override_`, a section
    /// may not change a value set by an earlier one.
    pub fn conf<S: AsRef<str>>(&self, names: &[S], override_: bool) -> ConfigResult<Section> {
        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        match names.as_slice() {
            [] => Ok(Section::new()),
            [single] => self
                .sections
                .get(single)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownSection(single.clone())),
            [init @ .., last] => {
                let key = (names.clone(), override_);
                if let Some(cached) = self.merged.lock().get(&key) {
                    return Ok(cached.clone());
                }
                let last_section = self
                    .sections
                    .get(last)
                    .ok_or_else(|| ConfigError::UnknownSection(last.clone()))?;
                let base = self.conf(init, override_)?;
                let merged = merge_conf(&base, last_section, override_)?;
                self.merged.lock().insert(key, merged.clone());
                Ok(merged)
            }
        }
    }

    /// Complete property values for the named sections
    ///
    /// Each configured property starts from its zero value and gets the
    /// partial configuration applied.
    pub fn conf_as_values<S: AsRef<str>>(
        &self,
        names: &[S],
        override_: bool,
    ) -> ConfigResult<IndexMap<String, Value>> {
        let conf = self.conf(names, override_)?;
        let mut result = IndexMap::with_capacity(conf.len());
        for (name, partial) in &conf {
            let type_spec = self.property_type(name)?;
            let value = apply_conf_on_value(type_spec.zero(), partial, type_spec)
                .map_err(|e| e.prefixed(&format!(".{name}")))?;
            result.insert(name.clone(), value);
        }
        Ok(result)
    }

    /// Every section with its resolved configuration
    pub fn resolved_sections(&self) -> ConfigResult<Vec<(String, Section)>> {
        self.sections
            .keys()
            .map(|name| Ok((name.clone(), self.conf(&[name], false)?)))
            .collect()
    }

    /// Apply the named sections onto `task`
    ///
    /// Applying `default` when it does not exist leaves the task untouched.
    pub fn apply<S: AsRef<str>>(
        &self,
        task: &mut dyn TaskHandle,
        names: &[S],
        override_: bool,
    ) -> ConfigResult<()> {
        let names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
        if let Some(missing) = names.iter().find(|n| !self.has_section(n)) {
            let joined = names.join(", ");
            if names.len() == 1 && *missing == DEFAULT_SECTION {
                tracing::info!(
                    task = task.name(),
                    model = %self.model.name,
                    "required to apply configuration {joined}, but this configuration is not registered or empty. Not changing anything."
                );
                return Ok(());
            }
            return Err(ConfigError::NoConfiguration {
                sections: joined,
                model: self.model.name.clone(),
            });
        }
        let conf = self.conf(&names, override_)?;
        self.apply_section(task, &conf)
    }

    /// Apply a partial configuration onto `task`
    ///
    /// All properties are written with the same timestamp.
    pub fn apply_section(&self, task: &mut dyn TaskHandle, conf: &Section) -> ConfigResult<()> {
        let timestamp = Utc::now();
        for (name, partial) in conf {
            let type_spec = task
                .model()
                .find_property(name)
                .map(|p| p.type_spec.clone())
                .ok_or_else(|| ConfigError::UnknownProperty {
                    property: name.clone(),
                    model: task.model().name.clone(),
                })?;
            let current = task.properties().read(name)?.clone();
            let value = apply_conf_on_value(current, partial, &type_spec)
                .map_err(|e| e.prefixed(&format!(".{name}")))?;
            task.properties_mut().write_at(name, value, timestamp)?;
        }
        Ok(())
    }

    /// Append a section to a YAML file
    ///
    /// `path` may be a directory, in which case the file is
    /// `<path>/<model name>.yml`.
    pub fn save(&self, section: &str, path: impl AsRef<Path>) -> ConfigResult<(Section, PathBuf)> {
        let conf = self.conf(&[section], false)?;
        let written = save_conf(&conf, path, section, &self.model)?;
        Ok((conf, written))
    }

    fn property_type(&self, name: &str) -> ConfigResult<&TypeSpec> {
        self.model
            .find_property(name)
            .map(|p| &p.type_spec)
            .ok_or_else(|| ConfigError::UnknownProperty {
                property: name.to_string(),
                model: self.model.name.clone(),
            })
    }
}

/// Current property values of a task as a section
pub fn read_task_conf(task: &dyn TaskHandle) -> Section {
    task.properties()
        .iter()
        .map(|p| (p.name().to_string(), p.read().clone()))
        .collect()
}

/// Apply a partial configuration onto a complete value
///
/// Struct fields absent from `conf` and `Null` array elements keep their
/// current value. Containers grow with zero elements to fit `conf`.
pub fn apply_conf_on_value(value: Value, conf: &Value, value_t: &TypeSpec) -> ConfigResult<Value> {
    match (conf, value_t, value) {
        (Value::Null, _, value) => Ok(value),
        (Value::Struct(conf_fields), TypeSpec::Struct(field_types), Value::Struct(mut fields)) => {
            for (name, field_conf) in conf_fields {
                let field_t = field_types
                    .get(name)
                    .ok_or_else(|| ConfigError::conversion(format!("{name} is not a field of {value_t}")))?;
                let current = fields.shift_remove(name).unwrap_or_else(|| field_t.zero());
                let updated = apply_conf_on_value(current, field_conf, field_t)
                    .map_err(|e| e.prefixed(&format!(".{name}")))?;
                fields.insert(name.clone(), updated);
            }
            // Restore declaration order after re-inserting updated fields.
            let ordered = field_types
                .keys()
                .filter_map(|k| fields.shift_remove(k).map(|v| (k.clone(), v)))
                .collect();
            Ok(Value::Struct(ordered))
        }
        (Value::Array(conf_items), TypeSpec::Array { element, len }, Value::Array(mut items)) => {
            match len {
                Some(max) if conf_items.len() > *max => {
                    return Err(ConfigError::conversion(format!(
                        "configuration object size {} is larger than field size {max}",
                        conf_items.len()
                    )));
                }
                _ => {
                    while items.len() < conf_items.len() {
                        items.push(element.zero());
                    }
                }
            }
            for (idx, item_conf) in conf_items.iter().enumerate() {
                let current = std::mem::replace(&mut items[idx], Value::Null);
                items[idx] = apply_conf_on_value(current, item_conf, element)
                    .map_err(|e| e.prefixed(&format!("[{idx}]")))?;
            }
            Ok(Value::Array(items))
        }
        (Value::Struct(_) | Value::Array(_), _, value) => Err(ConfigError::conversion(format!(
            "cannot apply {conf} on a {} value of type {value_t}",
            value.kind()
        ))),
        (leaf, value_t, _) => {
            value_t
                .check(leaf)
                .map_err(|e| ConfigError::conversion(e.to_string()))?;
            Ok(value_t.widen(leaf.clone()))
        }
    }
}

/// Append `conf` as section `name` to a YAML file
///
/// Each property is preceded by its documentation as YAML comments.
/// Returns the path of the file written.
pub fn save_conf(
    conf: &Section,
    path: impl AsRef<Path>,
    name: &str,
    model: &TaskModel,
) -> ConfigResult<PathBuf> {
    let path = path.as_ref();
    let file = if path.is_dir() {
        path.join(format!("{}.yml", model.name))
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        path.to_path_buf()
    };

    let mut keys: Vec<&String> = conf.keys().collect();
    keys.sort();

    let mut parts = Vec::with_capacity(keys.len() * 2);
    for key in keys {
        match model.find_property(key).and_then(|p| p.doc.as_deref()) {
            Some(doc) => parts.push(
                doc.lines()
                    .map(|line| format!("# {line}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            None => parts.push("# no documentation available for this property".to_string()),
        }
        let mut single = IndexMap::new();
        single.insert(key.as_str(), &conf[key]);
        let yaml = serde_yaml::to_string(&single).map_err(|source| ConfigError::Yaml {
            origin: file.display().to_string(),
            section: name.to_string(),
            source,
        })?;
        parts.push(yaml.trim_end().to_string());
    }

    let mut out = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&file)
        .map_err(|e| ConfigError::io(&file, e))?;
    writeln!(out, "--- name:{name}").map_err(|e| ConfigError::io(&file, e))?;
    writeln!(out, "{}", parts.join("\n")).map_err(|e| ConfigError::io(&file, e))?;
    tracing::info!(file = %file.display(), section = name, "configuration saved");
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_core::PropertySpec;
    use pretty_assertions::assert_eq;

    fn model() -> TaskModel {
        TaskModel::new("demo::Task")
            .with_property(PropertySpec::new("threshold", TypeSpec::Int))
            .with_property(PropertySpec::new("speed", TypeSpec::Int))
    }

    const FILE: &str = "\
--- name:default
threshold: 20
--- name:fast
speed: 10
--- name:slow
speed: 1
";

    fn loaded() -> TaskConfigurations {
        let mut confs = TaskConfigurations::new(model());
        confs.load_from_str(FILE, "demo.yml").unwrap();
        confs
    }

    #[test]
    fn load_reports_changed_sections() {
        let mut confs = TaskConfigurations::new(model());
        let changed = confs.load_from_str(FILE, "demo.yml").unwrap();
        assert_eq!(changed, vec!["default", "fast", "slow"]);

        let changed = confs.load_from_str(FILE, "demo.yml").unwrap();
        assert!(changed.is_empty());
    }

    #[test]
    fn conf_combines_sections() {
        let confs = loaded();
        let conf = confs.conf(&["default", "fast"], false).unwrap();
        assert_eq!(conf["threshold"], Value::Int(20));
        assert_eq!(conf["speed"], Value::Int(10));
    }

    #[test]
    fn conf_conflict_without_override() {
        let confs = loaded();
        assert!(matches!(
            confs.conf(&["default", "fast", "slow"], false),
            Err(ConfigError::MergeConflict { .. })
        ));
        let conf = confs.conf(&["default", "fast", "slow"], true).unwrap();
        assert_eq!(conf["speed"], Value::Int(1));
    }

    #[test]
    fn conf_of_unknown_section() {
        let confs = loaded();
        assert!(matches!(
            confs.conf(&["default", "medium"], true),
            Err(ConfigError::UnknownSection(name)) if name == "medium"
        ));
        assert!(confs.conf::<&str>(&[], false).unwrap().is_empty());
    }

    #[test]
    fn apply_on_value_grows_containers() {
        let t = TypeSpec::container(TypeSpec::Int);
        let conf = Value::Array(vec![Value::Null, Value::Int(5)]);
        let value = apply_conf_on_value(Value::Array(vec![]), &conf, &t).unwrap();
        assert_eq!(value, Value::from(vec![0, 5]));
    }

    #[test]
    fn apply_on_value_keeps_unset_fields() {
        let t = TypeSpec::structure([("a", TypeSpec::Int), ("b", TypeSpec::Int)]);
        let current = Value::structure([("a", Value::Int(21)), ("b", Value::Int(42))]);
        let conf = Value::structure([("b", Value::Int(43))]);
        let value = apply_conf_on_value(current, &conf, &t).unwrap();
        assert_eq!(value, Value::structure([("a", Value::Int(21)), ("b", Value::Int(43))]));
    }

    #[test]
    fn apply_on_value_widens_ints_for_floats() {
        let t = TypeSpec::structure([("gain", TypeSpec::Float)]);
        let conf = Value::structure([("gain", Value::Int(2))]);
        let value = apply_conf_on_value(t.zero(), &conf, &t).unwrap();
        assert_eq!(value, Value::structure([("gain", Value::Float(2.0))]));
    }

    #[test]
    fn apply_on_fixed_array_rejects_larger_conf() {
        let t = TypeSpec::array(TypeSpec::Int, 1);
        let err = apply_conf_on_value(t.zero(), &Value::from(vec![1, 2]), &t).unwrap_err();
        assert!(matches!(err, ConfigError::ConversionFailed { .. }));
    }
}
