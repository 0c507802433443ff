//! Validation of raw configuration against a task model
//!
//! Raw values come straight from YAML. Normalization checks property and
//! field names, enforces fixed array sizes and converts numeric leaves
//! (including strings with units) to the property's numeric type. Partial
//! values stay partial: missing struct fields and `Null` array elements are
//! kept as they are.

use crate::error::{ConfigError, ConfigResult};
use crate::merge::Section;
use crate::units::{evaluate_numeric_field, round_for_integer};
use orbit_core::{TaskModel, TypeSpec, Value};

/// Normalize a raw section against `model`
pub fn normalize_conf(model: &TaskModel, conf: Section) -> ConfigResult<Section> {
    let mut result = Section::with_capacity(conf.len());
    for (name, value) in conf {
        let property = model
            .find_property(&name)
            .ok_or_else(|| ConfigError::UnknownProperty {
                property: name.clone(),
                model: model.name.clone(),
            })?;
        let value = normalize_value(value, &property.type_spec)
            .map_err(|e| e.prefixed(&format!(".{name}")))?;
        result.insert(name, value);
    }
    Ok(result)
}

/// Normalize one (possibly partial) value against its type
pub fn normalize_value(value: Value, value_t: &TypeSpec) -> ConfigResult<Value> {
    match (value_t, value) {
        (_, Value::Null) => Ok(Value::Null),
        (TypeSpec::Struct(fields), Value::Struct(values)) => {
            let mut result = indexmap::IndexMap::with_capacity(values.len());
            for (name, item) in values {
                let field_t = fields
                    .get(&name)
                    .ok_or_else(|| ConfigError::conversion(format!("{name} is not a field of {value_t}")))?;
                let item = normalize_value(item, field_t).map_err(|e| e.prefixed(&format!(".{name}")))?;
                result.insert(name, item);
            }
            Ok(Value::Struct(result))
        }
        (TypeSpec::Array { element, len }, Value::Array(items)) => {
            if let Some(max) = len {
                if items.len() > *max {
                    return Err(ConfigError::conversion(format!(
                        "array too big (got {} for a maximum of {max})",
                        items.len()
                    )));
                }
            }
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    normalize_value(item, element).map_err(|e| e.prefixed(&format!("[{i}]")))
                })
                .collect::<ConfigResult<Vec<_>>>()
                .map(Value::Array)
        }
        (TypeSpec::Int, Value::String(text)) => {
            evaluate_numeric_field(&text, true).map_err(|e| ConfigError::conversion(e.to_string()))
        }
        (TypeSpec::Float, Value::String(text)) => {
            match evaluate_numeric_field(&text, false).map_err(|e| ConfigError::conversion(e.to_string()))? {
                Value::Int(v) => Ok(to_float(v)),
                other => Ok(other),
            }
        }
        (TypeSpec::Int, Value::Float(v)) => Ok(Value::Int(round_for_integer(v, None, &v.to_string()))),
        (TypeSpec::Float, Value::Int(v)) => Ok(to_float(v)),
        (value_t, value) => {
            value_t
                .check(&value)
                .map_err(|e| ConfigError::conversion(e.to_string()))?;
            Ok(value)
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_float(v: i64) -> Value {
    Value::Float(v as f64)
}
