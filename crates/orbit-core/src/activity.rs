//! Periodic activity
//!
//! Triggers a single task at a fixed period on the tokio runtime. There is
//! no ordering between activities; each one only knows its own task.

use crate::task::TaskRef;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to a running periodic activity
#[derive(Debug)]
pub struct PeriodicActivity {
    period: Duration,
    stop: watch::Sender<bool>,
    worker: JoinHandle<u64>,
}

impl PeriodicActivity {
    /// Start triggering `task` every `period`
    ///
    /// The first trigger happens immediately. Must be called from within a
    /// tokio runtime.
    #[must_use]
    pub fn spawn(task: TaskRef, period: Duration) -> Self {
        let (stop, mut stopped) = watch::channel(false);
        let worker = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut executed = 0u64;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let mut guard = task.lock();
                        match guard.trigger() {
                            Ok(true) => executed += 1,
                            Ok(false) => {}
                            Err(error) => {
                                executed += 1;
                                tracing::warn!(task = guard.name(), %error, "trigger failed");
                            }
                        }
                    }
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }
            executed
        });
        Self {
            period,
            stop,
            worker,
        }
    }

    /// Trigger period
    #[inline]
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stop triggering and return the number of triggers that ran a hook
    pub async fn stop(self) -> u64 {
        // The worker may already be gone if the runtime is shutting down.
        let _ = self.stop.send(true);
        match self.worker.await {
            Ok(count) => count,
            Err(error) => {
                tracing::error!(%error, "activity worker panicked");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{ConnectionPolicy, InputPort};
    use crate::source::CycleSource;
    use crate::task::{share, TaskContext};

    #[tokio::test(start_paused = true)]
    async fn activity_drives_cycle_source() {
        let source = share(TaskContext::new("source", CycleSource::new()));
        let reader = InputPort::new("reader");
        {
            let mut ctx = source.lock();
            ctx.task().cycle_port().connect_to(&reader, ConnectionPolicy::Buffer(64));
            ctx.configure().unwrap();
            ctx.start().unwrap();
        }

        let activity = PeriodicActivity::spawn(source.clone(), Duration::from_millis(10));
        for expected in 1..=5u64 {
            assert_eq!(reader.wait().await, expected);
        }
        let executed = activity.stop().await;

        assert!(executed >= 5);
        assert_eq!(source.lock().task().cycle(), executed);
    }

    #[tokio::test(start_paused = true)]
    async fn activity_on_stopped_task_executes_nothing() {
        let source = share(TaskContext::new("source", CycleSource::new()));
        let activity = PeriodicActivity::spawn(source.clone(), Duration::from_millis(1));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(activity.stop().await, 0);
        assert_eq!(source.lock().task().cycle(), 0);
    }
}
