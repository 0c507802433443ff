//! Task contexts
//!
//! A [`Task`] supplies the hooks; a [`TaskContext`] hosts it, owns its
//! properties and drives the lifecycle state machine. Tasks shared with a
//! name service or an activity are handled through [`TaskRef`].

use crate::error::{HookError, TaskError, TaskResult};
use crate::model::TaskModel;
use crate::port::PortSpec;
use crate::property::PropertySet;
use crate::state::{validate_transition, TaskState};
use crate::value::Value;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// User code run by a task context
///
/// Every hook has a default that does nothing and succeeds.
pub trait Task: Send + 'static {
    /// Interface description; queried once at construction
    fn model(&self) -> TaskModel;

    /// Called on `configure()`; returning `false` refuses the transition
    fn configure_hook(&mut self, _properties: &PropertySet) -> Result<bool, HookError> {
        Ok(true)
    }

    /// Called on `start()`; returning `false` refuses the transition
    fn start_hook(&mut self) -> Result<bool, HookError> {
        Ok(true)
    }

    /// Called on every trigger while `Running`
    fn update_hook(&mut self) -> Result<(), HookError> {
        Ok(())
    }

    /// Called on every trigger while in `RuntimeError`
    fn error_hook(&mut self) -> Result<(), HookError> {
        Ok(())
    }

    /// Called on `stop()`
    fn stop_hook(&mut self) {}

    /// Called on `cleanup()`
    fn cleanup_hook(&mut self) {}
}

/// Host for a [`Task`]
pub struct TaskContext<T: Task> {
    name: String,
    model: TaskModel,
    properties: PropertySet,
    state: TaskState,
    triggers: u64,
    task: T,
}

impl<T: Task> TaskContext<T> {
    /// Construct a named task context in `PreOperational`
    pub fn new(name: impl Into<String>, task: T) -> Self {
        let name = name.into();
        let model = task.model();
        let properties = PropertySet::new(&name, model.properties.iter());
        tracing::debug!(task = %name, model = %model.name, "task context created");
        Self {
            name,
            model,
            properties,
            state: TaskState::PreOperational,
            triggers: 0,
            task,
        }
    }

    /// Task name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Task model
    #[inline]
    #[must_use]
    pub fn model(&self) -> &TaskModel {
        &self.model
    }

    /// Current lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// True while triggers execute code
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// True once configured
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    /// Number of triggers that executed a hook
    #[inline]
    #[must_use]
    pub fn trigger_count(&self) -> u64 {
        self.triggers
    }

    /// Hosted task
    #[inline]
    #[must_use]
    pub fn task(&self) -> &T {
        &self.task
    }

    /// Hosted task, mutably
    #[inline]
    pub fn task_mut(&mut self) -> &mut T {
        &mut self.task
    }

    /// Property values
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    /// Property values, mutably
    #[inline]
    pub fn properties_mut(&mut self) -> &mut PropertySet {
        &mut self.properties
    }

    /// Read a property
    pub fn property(&self, name: &str) -> TaskResult<&Value> {
        self.properties.read(name)
    }

    /// Write a property
    pub fn write_property(&mut self, name: &str, value: impl Into<Value>) -> TaskResult<()> {
        self.properties.write(name, value)
    }

    /// Port declaration by name
    pub fn port(&self, name: &str) -> TaskResult<&PortSpec> {
        self.model
            .find_port(name)
            .ok_or_else(|| TaskError::port_not_found(&self.name, name))
    }

    /// `PreOperational|Stopped -> Stopped`
    pub fn configure(&mut self) -> TaskResult<()> {
        if !matches!(self.state, TaskState::PreOperational | TaskState::Stopped) {
            return Err(TaskError::IllegalTransition {
                from: self.state,
                to: TaskState::Stopped,
            });
        }
        match self.task.configure_hook(&self.properties) {
            Ok(true) => self.enter(TaskState::Stopped),
            Ok(false) => Err(self.refused("configure_hook")),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// `Stopped -> Running`
    pub fn start(&mut self) -> TaskResult<()> {
        if self.state != TaskState::Stopped {
            return Err(TaskError::IllegalTransition {
                from: self.state,
                to: TaskState::Running,
            });
        }
        match self.task.start_hook() {
            Ok(true) => self.enter(TaskState::Running),
            Ok(false) => Err(self.refused("start_hook")),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Run one execution step
    ///
    /// Runs `update_hook` when `Running` and `error_hook` when in
    /// `RuntimeError`. Returns `false` without doing anything in any other
    /// state.
    pub fn trigger(&mut self) -> TaskResult<bool> {
        let outcome = match self.state {
            TaskState::Running => self.task.update_hook(),
            TaskState::RuntimeError => self.task.error_hook(),
            _ => return Ok(false),
        };
        self.triggers += 1;
        match outcome {
            Ok(()) => Ok(true),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// `RuntimeError -> Running` or `Exception -> Stopped`
    pub fn recover(&mut self) -> TaskResult<()> {
        match self.state {
            TaskState::RuntimeError => self.enter(TaskState::Running),
            TaskState::Exception => self.enter(TaskState::Stopped),
            from => Err(TaskError::IllegalTransition {
                from,
                to: TaskState::Running,
            }),
        }
    }

    /// `Running|RuntimeError -> Stopped`
    pub fn stop(&mut self) -> TaskResult<()> {
        if !self.state.is_running() {
            return Err(TaskError::IllegalTransition {
                from: self.state,
                to: TaskState::Stopped,
            });
        }
        self.task.stop_hook();
        self.enter(TaskState::Stopped)
    }

    /// `Stopped -> PreOperational`
    pub fn cleanup(&mut self) -> TaskResult<()> {
        validate_transition(self.state, TaskState::PreOperational)?;
        self.task.cleanup_hook();
        self.enter(TaskState::PreOperational)
    }

    fn enter(&mut self, to: TaskState) -> TaskResult<()> {
        validate_transition(self.state, to)?;
        tracing::info!(task = %self.name, from = %self.state, to = %to, "state change");
        self.state = to;
        Ok(())
    }

    fn refused(&self, hook: &'static str) -> TaskError {
        tracing::warn!(task = %self.name, hook, "hook refused transition");
        TaskError::HookRefused {
            hook,
            task: self.name.clone(),
        }
    }

    /// Move to the state selected by a hook error, when reachable
    fn fail(&mut self, error: HookError) -> TaskError {
        let target = error.target_state();
        tracing::warn!(task = %self.name, state = %self.state, %error, "hook failed");
        if validate_transition(self.state, target).is_ok() {
            self.state = target;
        }
        TaskError::Hook(error)
    }
}

impl<T: Task> fmt::Display for TaskContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Component {}", self.name)?;
        writeln!(f, "  model: {}", self.model.name)?;
        writeln!(f, "  state: {}", self.state)?;
        for property in self.properties.iter() {
            writeln!(
                f,
                "  property {} ({}) = {}",
                property.name(),
                property.spec().type_spec,
                property.read()
            )?;
        }
        for port in &self.model.ports {
            writeln!(f, "  {port}")?;
        }
        Ok(())
    }
}

impl<T: Task + fmt::Debug> fmt::Debug for TaskContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("name", &self.name)
            .field("model", &self.model.name)
            .field("state", &self.state)
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}

/// Object-safe view of a task context
pub trait TaskHandle: Send {
    /// Task name
    fn name(&self) -> &str;
    /// Task model
    fn model(&self) -> &TaskModel;
    /// Current state
    fn state(&self) -> TaskState;
    /// Property values
    fn properties(&self) -> &PropertySet;
    /// Property values, mutably
    fn properties_mut(&mut self) -> &mut PropertySet;
    /// See [`TaskContext::configure`]
    fn configure(&mut self) -> TaskResult<()>;
    /// See [`TaskContext::start`]
    fn start(&mut self) -> TaskResult<()>;
    /// See [`TaskContext::trigger`]
    fn trigger(&mut self) -> TaskResult<bool>;
    /// See [`TaskContext::recover`]
    fn recover(&mut self) -> TaskResult<()>;
    /// See [`TaskContext::stop`]
    fn stop(&mut self) -> TaskResult<()>;
    /// See [`TaskContext::cleanup`]
    fn cleanup(&mut self) -> TaskResult<()>;
    /// Component summary
    fn summary(&self) -> String;
}

impl<T: Task> TaskHandle for TaskContext<T> {
    fn name(&self) -> &str {
        TaskContext::name(self)
    }

    fn model(&self) -> &TaskModel {
        TaskContext::model(self)
    }

    fn state(&self) -> TaskState {
        TaskContext::state(self)
    }

    fn properties(&self) -> &PropertySet {
        TaskContext::properties(self)
    }

    fn properties_mut(&mut self) -> &mut PropertySet {
        TaskContext::properties_mut(self)
    }

    fn configure(&mut self) -> TaskResult<()> {
        TaskContext::configure(self)
    }

    fn start(&mut self) -> TaskResult<()> {
        TaskContext::start(self)
    }

    fn trigger(&mut self) -> TaskResult<bool> {
        TaskContext::trigger(self)
    }

    fn recover(&mut self) -> TaskResult<()> {
        TaskContext::recover(self)
    }

    fn stop(&mut self) -> TaskResult<()> {
        TaskContext::stop(self)
    }

    fn cleanup(&mut self) -> TaskResult<()> {
        TaskContext::cleanup(self)
    }

    fn summary(&self) -> String {
        self.to_string()
    }
}

/// Shared, type-erased task context
pub type TaskRef = Arc<Mutex<dyn TaskHandle>>;

/// Wrap a task context for sharing
///
/// Keep the typed handle for direct access to the task; coerce a clone into
/// a [`TaskRef`] for registration.
#[must_use]
pub fn share<T: Task>(context: TaskContext<T>) -> Arc<Mutex<TaskContext<T>>> {
    Arc::new(Mutex::new(context))
}
