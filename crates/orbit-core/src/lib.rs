//! Orbit Core - dataflow task components
//!
//! Hosts user tasks in named task contexts that:
//! - Drive a lifecycle state machine and the task's hooks
//! - Own type-checked properties
//! - Publish samples through typed output ports
//! - Can be resolved by name and triggered periodically
//!
//! # Example
//!
//! ```
//! use orbit_core::{ConnectionPolicy, CycleSource, InputPort, TaskContext};
//!
//! let mut source = TaskContext::new("source", CycleSource::new());
//! let reader = InputPort::new("reader");
//! source.task().cycle_port().connect_to(&reader, ConnectionPolicy::Buffer(16));
//!
//! source.configure()?;
//! source.start()?;
//! for _ in 0..3 {
//!     source.trigger()?;
//! }
//! assert_eq!(reader.drain(), vec![1, 2, 3]);
//! # Ok::<(), orbit_core::TaskError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod activity;
pub mod error;
pub mod model;
pub mod nameservice;
pub mod port;
pub mod property;
pub mod source;
pub mod state;
pub mod task;
pub mod value;

// Re-exports for convenience
pub use activity::PeriodicActivity;
pub use error::{HookError, NameServiceError, TaskError, TaskResult, ValueError};
pub use model::{ModelLoader, TaskModel, TaskModelNotFound};
pub use nameservice::{provider_from_kind, LocalNameService, NameService, Nameservice};
pub use port::{ConnectionPolicy, FlowStatus, InputPort, OutputPort, PortDirection, PortSpec};
pub use property::{Property, PropertySet, PropertySpec};
pub use source::{CycleSource, CYCLE_PORT, CYCLE_SOURCE_MODEL};
pub use state::TaskState;
pub use task::{share, Task, TaskContext, TaskHandle, TaskRef};
pub use value::{TypeSpec, Value};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for writing and hosting tasks
    pub use crate::{
        share, ConnectionPolicy, FlowStatus, HookError, InputPort, OutputPort, PortSpec,
        PropertySet, PropertySpec, Task, TaskContext, TaskHandle, TaskModel, TaskRef, TaskState,
        TypeSpec, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
