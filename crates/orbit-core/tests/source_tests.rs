//! CycleSource Tests
//!
//! The published sequence on a fresh instance is exactly 1..=N.

use orbit_core::prelude::*;
use orbit_core::{CycleSource, CYCLE_PORT, CYCLE_SOURCE_MODEL};
use proptest::prelude::*;

fn running_source(name: &str) -> (TaskContext<CycleSource>, InputPort<u64>) {
    let mut ctx = TaskContext::new(name, CycleSource::new());
    let reader = InputPort::new("reader");
    ctx.task()
        .cycle_port()
        .connect_to(&reader, ConnectionPolicy::Buffer(1024));
    ctx.configure().unwrap();
    ctx.start().unwrap();
    (ctx, reader)
}

#[test]
fn test_first_update_publishes_one() {
    let (mut ctx, reader) = running_source("source");
    assert_eq!(reader.read(), (FlowStatus::NoData, None));

    ctx.trigger().unwrap();
    assert_eq!(reader.read(), (FlowStatus::NewData, Some(1)));
}

#[test]
fn test_instances_count_independently() {
    let (mut a, reader_a) = running_source("a");
    let (mut b, reader_b) = running_source("b");

    for _ in 0..3 {
        a.trigger().unwrap();
    }
    b.trigger().unwrap();

    assert_eq!(reader_a.drain(), vec![1, 2, 3]);
    assert_eq!(reader_b.drain(), vec![1]);
}

#[test]
fn test_no_output_before_start() {
    let mut ctx = TaskContext::new("source", CycleSource::new());
    ctx.configure().unwrap();
    assert!(!ctx.trigger().unwrap());
    assert_eq!(ctx.task().cycle_port().write_count(), 0);
}

#[test]
fn test_counter_survives_stop_and_restart() {
    let (mut ctx, reader) = running_source("source");
    ctx.trigger().unwrap();
    ctx.stop().unwrap();
    ctx.start().unwrap();
    ctx.trigger().unwrap();
    assert_eq!(reader.drain(), vec![1, 2]);
}

#[test]
fn test_model_exposes_single_output() {
    let ctx = TaskContext::new("source", CycleSource::new());
    assert_eq!(ctx.model().name, CYCLE_SOURCE_MODEL);
    assert!(ctx.properties().is_empty());
    assert_eq!(ctx.model().ports.len(), 1);
    assert_eq!(ctx.port(CYCLE_PORT).unwrap().direction, orbit_core::PortDirection::Output);
}

proptest! {
    #[test]
    fn prop_sequence_is_one_to_n(n in 1usize..200) {
        let (mut ctx, reader) = running_source("source");
        for _ in 0..n {
            prop_assert!(ctx.trigger().unwrap());
        }
        let expected: Vec<u64> = (1..=n as u64).collect();
        prop_assert_eq!(reader.drain(), expected);
        prop_assert_eq!(ctx.task().cycle_port().last_written(), Some(n as u64));
    }
}
