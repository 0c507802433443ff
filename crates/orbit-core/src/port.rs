//! Typed data ports
//!
//! An [`OutputPort`] delivers every written sample to the inputs connected
//! to it. Each connection is a channel with its own [`ConnectionPolicy`].
//!
//! # Example
//!
//! ```
//! use orbit_core::{ConnectionPolicy, FlowStatus, InputPort, OutputPort};
//!
//! let out = OutputPort::<u64>::new("cycle");
//! let reader = InputPort::<u64>::new("reader");
//! out.connect_to(&reader, ConnectionPolicy::Data);
//!
//! out.write(1);
//! assert_eq!(reader.read(), (FlowStatus::NewData, Some(1)));
//! assert_eq!(reader.read(), (FlowStatus::OldData, Some(1)));
//! ```

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Direction of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    /// Data flows into the task
    Input,
    /// Data flows out of the task
    Output,
}

/// Declaration of a port in a task model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Port name
    pub name: String,
    /// Direction
    pub direction: PortDirection,
    /// Name of the sample type
    #[serde(rename = "type")]
    pub type_name: String,
    /// Documentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl PortSpec {
    /// Output port declaration
    #[must_use]
    pub fn output(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Output,
            type_name: type_name.into(),
            doc: None,
        }
    }

    /// Input port declaration
    #[must_use]
    pub fn input(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Input,
            type_name: type_name.into(),
            doc: None,
        }
    }

    /// Set documentation
    #[inline]
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            PortDirection::Input => "in",
            PortDirection::Output => "out",
        };
        write!(f, "{dir} port {} ({})", self.name, self.type_name)
    }
}

/// How samples are kept on a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionPolicy {
    /// Keep only the most recent sample
    #[default]
    Data,
    /// Keep up to `n` samples; the oldest is dropped on overflow
    Buffer(usize),
}

/// Result of reading an input port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    /// Nothing was ever received
    NoData,
    /// No new sample since the last read; the last one is returned again
    OldData,
    /// A sample arrived since the last read
    NewData,
}

struct Channel<T> {
    policy: ConnectionPolicy,
    queue: Mutex<VecDeque<T>>,
    notify: Arc<Notify>,
}

impl<T> Channel<T> {
    fn push(&self, sample: T) {
        {
            let mut queue = self.queue.lock();
            match self.policy {
                ConnectionPolicy::Data => {
                    queue.clear();
                    queue.push_back(sample);
                }
                ConnectionPolicy::Buffer(size) => {
                    if queue.len() >= size.max(1) {
                        queue.pop_front();
                    }
                    queue.push_back(sample);
                }
            }
        }
        self.notify.notify_one();
    }

    fn pop(&self) -> Option<T> {
        self.queue.lock().pop_front()
    }
}

/// Typed output port
pub struct OutputPort<T> {
    name: String,
    channels: Mutex<Vec<Arc<Channel<T>>>>,
    last: Mutex<Option<T>>,
    writes: AtomicU64,
}

impl<T: Clone + Send + 'static> OutputPort<T> {
    /// New unconnected port
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: Mutex::new(Vec::new()),
            last: Mutex::new(None),
            writes: AtomicU64::new(0),
        }
    }

    /// Port name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publish a sample to every connected input
    pub fn write(&self, sample: T) {
        for channel in self.channels.lock().iter() {
            channel.push(sample.clone());
        }
        *self.last.lock() = Some(sample);
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Connect to an input port
    pub fn connect_to(&self, input: &InputPort<T>, policy: ConnectionPolicy) {
        let channel = Arc::new(Channel {
            policy,
            queue: Mutex::new(VecDeque::new()),
            notify: Arc::clone(&input.inner.notify),
        });
        input.inner.channels.lock().push(Arc::clone(&channel));
        self.channels.lock().push(channel);
        tracing::debug!(port = %self.name, input = %input.name, ?policy, "ports connected");
    }

    /// Check if at least one input is connected
    #[must_use]
    pub fn connected(&self) -> bool {
        !self.channels.lock().is_empty()
    }

    /// Drop every connection; already delivered samples stay readable
    pub fn disconnect_all(&self) {
        self.channels.lock().clear();
    }

    /// Most recently written sample
    #[must_use]
    pub fn last_written(&self) -> Option<T> {
        self.last.lock().clone()
    }

    /// Number of samples written so far
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl<T> fmt::Debug for OutputPort<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputPort")
            .field("name", &self.name)
            .field("connections", &self.channels.lock().len())
            .finish_non_exhaustive()
    }
}

struct InputInner<T> {
    channels: Mutex<Vec<Arc<Channel<T>>>>,
    last: Mutex<Option<T>>,
    notify: Arc<Notify>,
}

/// Typed input port
///
/// Clones share the same connections and read state.
pub struct InputPort<T> {
    name: String,
    inner: Arc<InputInner<T>>,
}

impl<T: Clone + Send + 'static> InputPort<T> {
    /// New unconnected port
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(InputInner {
                channels: Mutex::new(Vec::new()),
                last: Mutex::new(None),
                notify: Arc::new(Notify::new()),
            }),
        }
    }

    /// Port name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the next sample
    ///
    /// Connections are polled in connection order.
    pub fn read(&self) -> (FlowStatus, Option<T>) {
        let fresh = self.inner.channels.lock().iter().find_map(|c| c.pop());
        let mut last = self.inner.last.lock();
        match fresh {
            Some(sample) => {
                *last = Some(sample.clone());
                (FlowStatus::NewData, Some(sample))
            }
            None => match last.as_ref() {
                Some(sample) => (FlowStatus::OldData, Some(sample.clone())),
                None => (FlowStatus::NoData, None),
            },
        }
    }

    /// Read only new samples
    pub fn read_new(&self) -> Option<T> {
        match self.read() {
            (FlowStatus::NewData, sample) => sample,
            _ => None,
        }
    }

    /// Drain every pending sample, oldest first
    pub fn drain(&self) -> Vec<T> {
        std::iter::from_fn(|| self.read_new()).collect()
    }

    /// Wait until a new sample is available and return it
    pub async fn wait(&self) -> T {
        loop {
            let notified = self.inner.notify.notified();
            if let Some(sample) = self.read_new() {
                return sample;
            }
            notified.await;
        }
    }

    /// Check if at least one output is connected
    #[must_use]
    pub fn connected(&self) -> bool {
        !self.inner.channels.lock().is_empty()
    }
}

impl<T> Clone for InputPort<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for InputPort<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputPort")
            .field("name", &self.name)
            .field("connections", &self.inner.channels.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconnected_input_has_no_data() {
        let input = InputPort::<i32>::new("in");
        assert_eq!(input.read(), (FlowStatus::NoData, None));
    }

    #[test]
    fn data_policy_keeps_latest() {
        let out = OutputPort::new("out");
        let input = InputPort::new("in");
        out.connect_to(&input, ConnectionPolicy::Data);

        out.write(1);
        out.write(2);
        assert_eq!(input.read(), (FlowStatus::NewData, Some(2)));
        assert_eq!(input.read(), (FlowStatus::OldData, Some(2)));
    }

    #[test]
    fn buffer_policy_drops_oldest() {
        let out = OutputPort::new("out");
        let input = InputPort::new("in");
        out.connect_to(&input, ConnectionPolicy::Buffer(2));

        for i in 1..=3 {
            out.write(i);
        }
        assert_eq!(input.drain(), vec![2, 3]);
    }

    #[test]
    fn write_reaches_every_input() {
        let out = OutputPort::new("out");
        let a = InputPort::new("a");
        let b = InputPort::new("b");
        out.connect_to(&a, ConnectionPolicy::Data);
        out.connect_to(&b, ConnectionPolicy::Buffer(4));

        out.write("x".to_string());
        assert_eq!(a.read_new().as_deref(), Some("x"));
        assert_eq!(b.read_new().as_deref(), Some("x"));
        assert_eq!(out.write_count(), 1);
    }

    #[test]
    fn last_written_without_connection() {
        let out = OutputPort::new("out");
        assert!(!out.connected());
        out.write(7);
        assert_eq!(out.last_written(), Some(7));
    }

    #[test]
    fn disconnect_stops_delivery() {
        let out = OutputPort::new("out");
        let input = InputPort::new("in");
        out.connect_to(&input, ConnectionPolicy::Data);
        out.disconnect_all();
        out.write(1);
        assert_eq!(input.read(), (FlowStatus::NoData, None));
    }

    #[tokio::test]
    async fn wait_returns_sample_written_from_another_task() {
        let out = Arc::new(OutputPort::new("out"));
        let input = InputPort::new("in");
        out.connect_to(&input, ConnectionPolicy::Data);

        let writer = Arc::clone(&out);
        tokio::spawn(async move { writer.write(42u64) });

        assert_eq!(input.wait().await, 42);
    }
}
