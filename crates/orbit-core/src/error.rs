//! Error types for Orbit Core
//!
//! Provides error handling for:
//! - Lifecycle transitions and hook failures
//! - Property and port lookups
//! - Value validation against property types
//! - Name service resolution

use crate::state::TaskState;

/// Main task error type
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Named property, port or model does not exist
    #[error("no {kind} named '{name}' on task '{task}'")]
    NotFound {
        /// What was looked up ("property", "port", ...)
        kind: &'static str,
        /// Requested name
        name: String,
        /// Task the lookup ran on
        task: String,
    },

    /// Lifecycle operation not allowed in the current state
    #[error("illegal state transition: {from} -> {to}")]
    IllegalTransition {
        /// Current state
        from: TaskState,
        /// Requested state
        to: TaskState,
    },

    /// A configure or start hook returned `false`
    #[error("{hook} refused by task '{task}'")]
    HookRefused {
        /// Hook name
        hook: &'static str,
        /// Task name
        task: String,
    },

    /// A hook reported an error
    #[error("hook failed: {0}")]
    Hook(#[from] HookError),

    /// Value rejected by a property type
    #[error("invalid value: {0}")]
    Value(#[from] ValueError),
}

impl TaskError {
    /// Shortcut for a missing property
    pub fn property_not_found(task: &str, name: &str) -> Self {
        Self::NotFound {
            kind: "property",
            name: name.to_string(),
            task: task.to_string(),
        }
    }

    /// Shortcut for a missing port
    pub fn port_not_found(task: &str, name: &str) -> Self {
        Self::NotFound {
            kind: "port",
            name: name.to_string(),
            task: task.to_string(),
        }
    }

    /// Check if error is a failed lookup
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors reported by task hooks
///
/// The variant selects the state the task ends up in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    /// Recoverable; the task moves to `RuntimeError`
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Unrecoverable; the task moves to `FatalError`
    #[error("fatal error: {0}")]
    Fatal(String),

    /// The task moves to `Exception` and must be recovered to `Stopped`
    #[error("exception: {0}")]
    Exception(String),
}

impl HookError {
    /// State a task enters when a hook fails with this error
    #[must_use]
    pub fn target_state(&self) -> TaskState {
        match self {
            Self::Runtime(_) => TaskState::RuntimeError,
            Self::Fatal(_) => TaskState::FatalError,
            Self::Exception(_) => TaskState::Exception,
        }
    }
}

/// Errors raised when a value does not match a type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// Wrong kind of value
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Location of the value (`.field[2]`)
        path: String,
        /// Expected type name
        expected: String,
        /// Found value kind
        found: String,
    },

    /// Struct field not declared by the type
    #[error("unknown field '{field}' at '{path}'")]
    UnknownField {
        /// Location of the struct
        path: String,
        /// Offending field
        field: String,
    },

    /// Array larger than its fixed size
    #[error("array too big at '{path}': got {len} for a maximum of {max}")]
    ArrayTooLong {
        /// Location of the array
        path: String,
        /// Actual length
        len: usize,
        /// Declared length
        max: usize,
    },
}

/// Name service errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameServiceError {
    /// No provider is enabled
    #[error("cannot resolve '{0}': no name service provider enabled")]
    NoProviders(String),

    /// No provider knows the name
    #[error("task '{0}' not found")]
    NotFound(String),

    /// Provider kind is not known
    #[error("unknown name service provider '{0}'")]
    UnknownProvider(String),

    /// Name already taken in a provider
    #[error("task '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Result alias for task operations
pub type TaskResult<T> = Result<T, TaskError>;
