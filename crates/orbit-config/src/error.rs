//! Error types for Orbit Config

use orbit_core::{TaskError, TaskModelNotFound};
use std::path::PathBuf;

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Malformed section header line
    #[error("{origin}:{line}: {message}")]
    Header {
        /// File or other source name
        origin: String,
        /// 1-based line number
        line: usize,
        /// What is wrong
        message: String,
    },

    /// Section body is not valid YAML
    #[error("{origin}: section '{section}': {source}")]
    Yaml {
        /// File or other source name
        origin: String,
        /// Section being parsed
        section: String,
        /// Parser error
        #[source]
        source: serde_yaml::Error,
    },

    /// Value does not fit the property type
    #[error("failed to convert configuration value for {path}: {message}")]
    ConversionFailed {
        /// Location (`.prop.field[2]`)
        path: String,
        /// What is wrong
        message: String,
    },

    /// Configuration names a property the model does not have
    #[error("{property} is not a property of {model}")]
    UnknownProperty {
        /// Property name
        property: String,
        /// Model name
        model: String,
    },

    /// Two sections set different values without override
    #[error("cannot merge configuration: conflict in {path} between v1={left} and v2={right}")]
    MergeConflict {
        /// Location of the conflicting leaf
        path: String,
        /// Value from the earlier section
        left: String,
        /// Value from the later section
        right: String,
    },

    /// Requested section does not exist
    #[error("{0} is not a known configuration section")]
    UnknownSection(String),

    /// No sections for the requested names on a model
    #[error("no configuration {sections} for {model}")]
    NoConfiguration {
        /// Requested section names, comma separated
        sections: String,
        /// Model name
        model: String,
    },

    /// Manager has nothing registered for a model
    #[error("no configuration available for {0}")]
    NoModelConfiguration(String),

    /// Unit expression not understood
    #[error("does not know how to convert {0} to SI")]
    UnknownUnit(String),

    /// String used for a numeric field is not a number
    #[error("{0} does not look like a numeric field")]
    NotNumeric(String),

    /// Task model lookup failed
    #[error(transparent)]
    Model(#[from] TaskModelNotFound),

    /// Task property access failed
    #[error(transparent)]
    Task(#[from] TaskError),

    /// Filesystem error
    #[error("i/o error on {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Path was expected to be a directory
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    /// Path was expected to be a file
    #[error("{0} does not exist or is not a file")]
    NotAFile(PathBuf),

    /// Error with the context it occurred in
    #[error("{context}: {source}")]
    Context {
        /// What was being done
        context: String,
        /// Underlying error
        #[source]
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// Conversion failure at the current location
    pub(crate) fn conversion(message: impl Into<String>) -> Self {
        Self::ConversionFailed {
            path: String::new(),
            message: message.into(),
        }
    }

    /// Prepend a path segment to a conversion failure
    pub(crate) fn prefixed(self, segment: &str) -> Self {
        match self {
            Self::ConversionFailed { path, message } => Self::ConversionFailed {
                path: format!("{segment}{path}"),
                message,
            },
            other => other,
        }
    }

    /// Attach context
    pub(crate) fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping context layers
    #[must_use]
    pub fn root(&self) -> &ConfigError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
