//! Testing utilities for Orbit workspace
//!
//! Fixture task with struct, simple and string properties, plus helpers
//! to write configuration files.

#![allow(missing_docs)]

use orbit_core::{
    ModelLoader, PropertySpec, Task, TaskContext, TaskModel, TypeSpec, Value,
};
use std::path::PathBuf;
use tempfile::TempDir;

pub const FIXTURE_MODEL: &str = "process::Test";

pub fn prop1_type() -> TypeSpec {
    TypeSpec::structure([("a", TypeSpec::Int), ("b", TypeSpec::Int)])
}

pub fn prop1(a: i64, b: i64) -> Value {
    Value::structure([("a", Value::Int(a)), ("b", Value::Int(b))])
}

pub fn fixture_model() -> TaskModel {
    TaskModel::new(FIXTURE_MODEL)
        .with_doc("task with one property of each kind")
        .with_property(
            PropertySpec::new("prop1", prop1_type())
                .with_doc("a struct property")
                .with_default(prop1(21, 42)),
        )
        .with_property(PropertySpec::new("prop2", TypeSpec::Int).with_default(84))
        .with_property(
            PropertySpec::new("prop3", TypeSpec::String)
                .with_doc("a string property\nspanning two lines")
                .with_default("42"),
        )
}

/// Task whose only behaviour is to expose the fixture model's properties
#[derive(Debug, Default)]
pub struct PropertyFixture;

impl Task for PropertyFixture {
    fn model(&self) -> TaskModel {
        fixture_model()
    }
}

pub fn fixture_task(name: &str) -> TaskContext<PropertyFixture> {
    TaskContext::new(name, PropertyFixture)
}

pub fn fixture_loader() -> ModelLoader {
    let mut loader = ModelLoader::with_builtin();
    loader.register(fixture_model());
    loader
}

pub fn conf_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

pub fn write_conf(dir: &TempDir, file_name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(file_name);
    std::fs::write(&path, content).unwrap();
    path
}

pub fn write_fixture_conf(dir: &TempDir, content: &str) -> PathBuf {
    write_conf(dir, &format!("{FIXTURE_MODEL}.yml"), content)
}
