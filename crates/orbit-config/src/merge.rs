//! Merging of partial configurations
//!
//! Structs merge field by field. Arrays merge element by element, where a
//! `Null` element leaves the other side's element in place and the longer
//! array contributes its tail. Leaves conflict unless `override_` is set, in
//! which case the later value wins.

use crate::error::{ConfigError, ConfigResult};
use indexmap::IndexMap;
use orbit_core::Value;

/// A partial configuration of a task: property name to partial value
pub type Section = IndexMap<String, Value>;

/// Merge `b` into `a`
pub fn merge_conf(a: &Section, b: &Section, override_: bool) -> ConfigResult<Section> {
    merge_maps(a, b, override_, "")
}

fn merge_maps(
    a: &IndexMap<String, Value>,
    b: &IndexMap<String, Value>,
    override_: bool,
    path: &str,
) -> ConfigResult<IndexMap<String, Value>> {
    let mut result = a.clone();
    for (key, v2) in b {
        let merged = match result.get(key) {
            Some(v1) => merge_values(v1, v2, override_, &format!("{path}.{key}"))?,
            None => v2.clone(),
        };
        result.insert(key.clone(), merged);
    }
    Ok(result)
}

fn merge_values(v1: &Value, v2: &Value, override_: bool, path: &str) -> ConfigResult<Value> {
    match (v1, v2) {
        (Value::Struct(m1), Value::Struct(m2)) => {
            merge_maps(m1, m2, override_, path).map(Value::Struct)
        }
        (Value::Array(a1), Value::Array(a2)) => {
            merge_arrays(a1, a2, override_, path).map(Value::Array)
        }
        _ if override_ || v1 == v2 => Ok(v2.clone()),
        _ => Err(ConfigError::MergeConflict {
            path: path.to_string(),
            left: v1.to_string(),
            right: v2.to_string(),
        }),
    }
}

fn merge_arrays(a: &[Value], b: &[Value], override_: bool, path: &str) -> ConfigResult<Vec<Value>> {
    let mut result = Vec::with_capacity(a.len().max(b.len()));
    for (idx, v1) in a.iter().enumerate() {
        let merged = match b.get(idx) {
            None | Some(Value::Null) => v1.clone(),
            Some(v2) if v1.is_null() => v2.clone(),
            Some(v2) => merge_values(v1, v2, override_, &format!("{path}[{idx}]"))?,
        };
        result.push(merged);
    }
    if b.len() > a.len() {
        result.extend_from_slice(&b[a.len()..]);
    }
    Ok(result)
}
