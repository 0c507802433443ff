//! Configurations of every known task model

use crate::error::{ConfigError, ConfigResult};
use crate::header::DEFAULT_SECTION;
use crate::merge::Section;
use crate::task_configurations::TaskConfigurations;
use indexmap::IndexMap;
use orbit_core::{ModelLoader, TaskHandle};
use std::path::{Path, PathBuf};

/// Loads configuration files and applies them on tasks by model name
#[derive(Debug)]
pub struct ConfigurationManager {
    loader: ModelLoader,
    conf: IndexMap<String, TaskConfigurations>,
}

impl ConfigurationManager {
    /// Manager resolving models with `loader`
    #[must_use]
    pub fn new(loader: ModelLoader) -> Self {
        Self {
            loader,
            conf: IndexMap::new(),
        }
    }

    /// Model loader
    #[inline]
    #[must_use]
    pub fn loader(&self) -> &ModelLoader {
        &self.loader
    }

    /// Configurations of a model, if any were loaded
    #[inline]
    #[must_use]
    pub fn get(&self, model: &str) -> Option<&TaskConfigurations> {
        self.conf.get(model)
    }

    /// Names of the models that have configurations
    #[must_use]
    pub fn model_names(&self) -> Vec<&str> {
        self.conf.keys().map(String::as_str).collect()
    }

    /// Load every `*.yml` file of a directory
    ///
    /// The model of each file is its file stem. Files for unknown models are
    /// skipped. Returns the changed sections per model.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> ConfigResult<IndexMap<String, Vec<String>>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ConfigError::NotADirectory(dir.to_path_buf()));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| ConfigError::io(dir, e))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "yml"))
            .collect();
        files.sort();

        let mut changed = IndexMap::new();
        for file in files {
            let Some(model) = file.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            if !self.loader.contains(&model) {
                tracing::warn!(
                    file = %file.display(),
                    model,
                    "ignoring configuration file: no such task model"
                );
                continue;
            }
            for (model, sections) in self.load_file(&file, Some(&model))? {
                if !sections.is_empty() {
                    changed.insert(model, sections);
                }
            }
        }
        Ok(changed)
    }

    /// Load one configuration file
    ///
    /// Without `model`, the file stem names the model.
    pub fn load_file(
        &mut self,
        path: impl AsRef<Path>,
        model: Option<&str>,
    ) -> ConfigResult<IndexMap<String, Vec<String>>> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::NotAFile(path.to_path_buf()));
        }
        let model_name = match model {
            Some(name) => name.to_string(),
            None => path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
                .ok_or_else(|| ConfigError::NotAFile(path.to_path_buf()))?,
        };

        let confs = self.configurations_mut(&model_name)?;
        let changed = confs.load_from_yaml(path)?;
        tracing::info!(
            file = %path.display(),
            model = %model_name,
            sections = changed.len(),
            "configuration file loaded"
        );

        let mut result = IndexMap::new();
        result.insert(model_name, changed);
        Ok(result)
    }

    fn configurations_mut(&mut self, model: &str) -> ConfigResult<&mut TaskConfigurations> {
        if !self.conf.contains_key(model) {
            let task_model = self.loader.task_model_from_name(model)?.clone();
            self.conf
                .insert(model.to_string(), TaskConfigurations::new(task_model));
        }
        self.conf
            .get_mut(model)
            .ok_or_else(|| ConfigError::NoModelConfiguration(model.to_string()))
    }

    /// Section names to use for `model` when `names` is given
    ///
    /// An empty list means the only section of the model, or `default`.
    #[must_use]
    pub fn resolve_requested_names(&self, model: &str, names: &[String]) -> Vec<String> {
        if !names.is_empty() {
            return names.to_vec();
        }
        match self.conf.get(model) {
            Some(confs) if confs.len() == 1 => confs
                .section_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            _ => vec![DEFAULT_SECTION.to_string()],
        }
    }

    /// Combined configuration of sections of `model`
    ///
    /// A model without configuration resolves to an empty section when only
    /// the default section is requested.
    pub fn resolve(&self, model: &str, names: &[String], override_: bool) -> ConfigResult<Section> {
        let names = self.resolve_requested_names(model, names);
        match self.conf.get(model) {
            Some(confs) => confs.conf(&names, override_),
            None if names == [DEFAULT_SECTION] => Ok(Section::new()),
            None => Err(ConfigError::NoModelConfiguration(model.to_string())),
        }
    }

    /// Apply sections onto `task`
    ///
    /// Returns the names that were applied. A task without configuration
    /// is left untouched when only the default section is requested.
    pub fn apply(
        &self,
        task: &mut dyn TaskHandle,
        names: &[String],
        override_: bool,
    ) -> ConfigResult<Vec<String>> {
        let model = task.model().name.clone();
        let names = self.resolve_requested_names(&model, names);
        match self.conf.get(&model) {
            Some(confs) => {
                confs.apply(task, &names, override_)?;
                tracing::info!(
                    task = task.name(),
                    model = %model,
                    sections = %names.join(", "),
                    "configuration applied"
                );
                Ok(names)
            }
            None if names == [DEFAULT_SECTION] => {
                tracing::info!(
                    task = task.name(),
                    model = %model,
                    "no configuration available for this model, not changing anything"
                );
                Ok(Vec::new())
            }
            None => Err(ConfigError::NoModelConfiguration(model)),
        }
    }

    /// Store the current properties of `task` and append them to a file
    ///
    /// The section is named after the task unless `section` is given.
    /// Returns the path of the file written.
    pub fn save(
        &mut self,
        task: &dyn TaskHandle,
        path: impl AsRef<Path>,
        section: Option<&str>,
    ) -> ConfigResult<PathBuf> {
        let section = section.unwrap_or_else(|| task.name()).to_string();
        let model = task.model().name.clone();
        let confs = self.configurations_mut(&model)?;
        confs.extract(&section, task, false)?;
        let (_, file) = confs.save(&section, path)?;
        Ok(file)
    }
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new(ModelLoader::with_builtin())
    }
}
