//! Task lifecycle state machine

use crate::error::TaskError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a task context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// Constructed, not configured yet
    PreOperational,
    /// Configured, not executing
    Stopped,
    /// Executing the update hook on every trigger
    Running,
    /// Executing the error hook until recovered
    RuntimeError,
    /// Terminal; the task cannot be used any more
    FatalError,
    /// A hook raised an exception; must be recovered to `Stopped`
    Exception,
}

impl TaskState {
    /// All states, in declaration order
    pub const ALL: [TaskState; 6] = [
        TaskState::PreOperational,
        TaskState::Stopped,
        TaskState::Running,
        TaskState::RuntimeError,
        TaskState::FatalError,
        TaskState::Exception,
    ];

    /// True in states where the task executes code on trigger
    #[inline]
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running | Self::RuntimeError)
    }

    /// True once the task has been configured
    #[inline]
    #[must_use]
    pub fn is_ready(self) -> bool {
        self != Self::PreOperational
    }

    /// Upper-case name as shown in component summaries
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreOperational => "PRE_OPERATIONAL",
            Self::Stopped => "STOPPED",
            Self::Running => "RUNNING",
            Self::RuntimeError => "RUNTIME_ERROR",
            Self::FatalError => "FATAL_ERROR",
            Self::Exception => "EXCEPTION",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates a state transition.
pub fn validate_transition(from: TaskState, to: TaskState) -> Result<(), TaskError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(TaskError::IllegalTransition { from, to })
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: TaskState) -> Vec<TaskState> {
    use TaskState::*;
    match from {
        PreOperational => vec![Stopped, FatalError],
        Stopped => vec![Stopped, Running, PreOperational, Exception, FatalError],
        Running => vec![Stopped, RuntimeError, Exception, FatalError],
        RuntimeError => vec![Running, Stopped, Exception, FatalError],
        Exception => vec![Stopped, FatalError],
        FatalError => vec![],
    }
}

fn allowed(from: TaskState, to: TaskState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
