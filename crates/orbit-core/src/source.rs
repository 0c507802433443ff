//! Counter-emitting source task
//!
//! Publishes 1, 2, 3, ... on its `cycle` output, one value per update.
//! The counter lives in the instance, so separately constructed sources
//! never share a sequence.

use crate::error::HookError;
use crate::model::TaskModel;
use crate::port::{OutputPort, PortSpec};
use crate::task::Task;

/// Model name of [`CycleSource`]
pub const CYCLE_SOURCE_MODEL: &str = "simple_source::source";

/// Name of the single output port
pub const CYCLE_PORT: &str = "cycle";

/// Source task writing an incrementing counter
#[derive(Debug)]
pub struct CycleSource {
    cycle: u64,
    out: OutputPort<u64>,
}

impl CycleSource {
    /// New source; the first update publishes 1
    #[must_use]
    pub fn new() -> Self {
        Self {
            cycle: 0,
            out: OutputPort::new(CYCLE_PORT),
        }
    }

    /// Interface of every cycle source
    #[must_use]
    pub fn task_model() -> TaskModel {
        TaskModel::new(CYCLE_SOURCE_MODEL)
            .with_doc("emits an incrementing counter on every update")
            .with_port(
                PortSpec::output(CYCLE_PORT, "u64").with_doc("number of updates so far, starting at 1"),
            )
    }

    /// Last published value, 0 before the first update
    #[inline]
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The `cycle` output port
    #[inline]
    #[must_use]
    pub fn cycle_port(&self) -> &OutputPort<u64> {
        &self.out
    }
}

impl Default for CycleSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for CycleSource {
    fn model(&self) -> TaskModel {
        Self::task_model()
    }

    fn update_hook(&mut self) -> Result<(), HookError> {
        self.cycle += 1;
        self.out.write(self.cycle);
        tracing::trace!(cycle = self.cycle, "cycle written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{ConnectionPolicy, InputPort};

    #[test]
    fn update_writes_next_cycle() {
        let mut source = CycleSource::new();
        let reader = InputPort::new("reader");
        source.cycle_port().connect_to(&reader, ConnectionPolicy::Buffer(8));

        for _ in 0..3 {
            source.update_hook().unwrap();
        }
        assert_eq!(reader.drain(), vec![1, 2, 3]);
        assert_eq!(source.cycle(), 3);
    }

    #[test]
    fn fresh_source_has_written_nothing() {
        let source = CycleSource::default();
        assert_eq!(source.cycle(), 0);
        assert_eq!(source.cycle_port().last_written(), None);
    }
}
