//! Orbit Config - named configurations for task properties
//!
//! Configuration files hold YAML sections for one task model:
//! - Sections are partial property values, combined by merging
//! - Numeric values may carry units and rounding modes
//! - Sections apply onto tasks and can be extracted back from them
//!
//! # Example
//!
//! ```
//! use orbit_config::TaskConfigurations;
//! use orbit_core::{PropertySpec, TaskModel, TypeSpec, Value};
//!
//! let model = TaskModel::new("demo::Task")
//!     .with_property(PropertySpec::new("threshold", TypeSpec::Int))
//!     .with_property(PropertySpec::new("angle", TypeSpec::Float));
//!
//! let mut confs = TaskConfigurations::new(model);
//! confs.load_from_str("threshold: 20\n--- name:tilted\nangle: 90.deg\n", "demo.yml")?;
//!
//! let conf = confs.conf(&["default", "tilted"], false)?;
//! assert_eq!(conf["threshold"], Value::Int(20));
//! # Ok::<(), orbit_config::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod header;
pub mod manager;
pub mod merge;
pub mod normalize;
pub mod task_configurations;
pub mod units;

use orbit_core::TaskHandle;
use std::path::Path;

// Re-exports
pub use error::{ConfigError, ConfigResult};
pub use header::{parse_header, split_sections, RawSection, SectionHeader, DEFAULT_SECTION};
pub use manager::ConfigurationManager;
pub use merge::{merge_conf, Section};
pub use normalize::{normalize_conf, normalize_value};
pub use task_configurations::{apply_conf_on_value, read_task_conf, save_conf, TaskConfigurations};
pub use units::{convert_unit_to_si, evaluate_numeric_field, RoundingMode};

/// Apply sections of a configuration file onto `task`
///
/// A directory `path` resolves to `<path>/<model name>.yml`. Returns
/// `false` without touching the task when the file does not exist.
pub fn apply_conf<S: AsRef<str>>(
    task: &mut dyn TaskHandle,
    path: impl AsRef<Path>,
    names: &[S],
    override_: bool,
) -> ConfigResult<bool> {
    let path = path.as_ref();
    let file = if path.is_dir() {
        path.join(format!("{}.yml", task.model().name))
    } else {
        path.to_path_buf()
    };
    if !file.is_file() {
        tracing::debug!(file = %file.display(), "no configuration file");
        return Ok(false);
    }

    let mut confs = TaskConfigurations::new(task.model().clone());
    confs.load_from_yaml(&file)?;
    confs.apply(task, names, override_)?;
    Ok(true)
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
