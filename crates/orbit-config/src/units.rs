//! Numeric fields with units
//!
//! Numeric properties can be written as strings carrying units and a
//! rounding mode, e.g. `"90.deg"`, `"2.5.km"`, `"3.m^2"` or `"7.5.s.round"`.
//! Values are converted to SI.

use crate::error::{ConfigError, ConfigResult};
use once_cell::sync::Lazy;
use orbit_core::Value;
use regex::Regex;
use std::f64::consts::PI;

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("valid regex"));
static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-]?\d+(?:\.\d+)?(?:e[+-]\d+)?)(.*)").expect("valid regex"));
static UNIT_EXPR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.\w+(?:\^-?\d+)?").expect("valid regex"));

/// Scale prefixes, tried in this order
const SCALES: [(&str, f64); 8] = [
    ("M", 1e6),
    ("k", 1e3),
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("mu", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
];

fn unit_to_si(unit: &str) -> Option<f64> {
    match unit {
        "m" | "N" | "s" | "Pa" => Some(1.0),
        "deg" => Some(PI / 180.0),
        "g" => Some(1e-3),
        "bar" => Some(100_000.0),
        _ => None,
    }
}

/// How a float is turned into an integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingMode {
    /// Towards positive infinity
    Ceil,
    /// Towards negative infinity
    #[default]
    Floor,
    /// To nearest
    Round,
}

impl RoundingMode {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "ceil" => Some(Self::Ceil),
            "floor" => Some(Self::Floor),
            "round" => Some(Self::Round),
            _ => None,
        }
    }

    /// Apply to a float
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn apply(self, value: f64) -> i64 {
        match self {
            Self::Ceil => value.ceil() as i64,
            Self::Floor => value.floor() as i64,
            Self::Round => value.round() as i64,
        }
    }
}

/// Conversion factor from `unit[^power]` to SI
pub fn convert_unit_to_si(expr: &str) -> ConfigResult<f64> {
    let (unit, power) = match expr.split_once('^') {
        Some((unit, power)) => (
            unit,
            power
                .parse::<i32>()
                .map_err(|_| ConfigError::UnknownUnit(expr.to_string()))?,
        ),
        None => (expr, 1),
    };

    if let Some(factor) = unit_to_si(unit) {
        return Ok(factor.powi(power));
    }
    for (prefix, scale) in SCALES {
        if let Some(base) = unit.strip_prefix(prefix).and_then(unit_to_si) {
            return Ok((base * scale).powi(power));
        }
    }
    Err(ConfigError::UnknownUnit(expr.to_string()))
}

/// Parse a numeric string with optional units and rounding mode
///
/// Plain integers are returned as-is. A float used for an integer field
/// without a rounding mode is floored with a warning.
pub fn evaluate_numeric_field(field: &str, integer: bool) -> ConfigResult<Value> {
    let field = field.trim();
    if INTEGER.is_match(field) {
        return field
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ConfigError::NotNumeric(field.to_string()));
    }

    let captures = NUMBER
        .captures(field)
        .ok_or_else(|| ConfigError::NotNumeric(field.to_string()))?;
    let mut value: f64 = captures[1]
        .parse()
        .map_err(|_| ConfigError::NotNumeric(field.to_string()))?;

    let mut rounding = None;
    for unit_expr in UNIT_EXPR.find_iter(&captures[2]) {
        let name = &unit_expr.as_str()[1..];
        match RoundingMode::parse(name) {
            Some(mode) => rounding = Some(mode),
            None => value *= convert_unit_to_si(name)?,
        }
    }

    if integer {
        Ok(Value::Int(round_for_integer(value, rounding, field)))
    } else {
        Ok(Value::Float(value))
    }
}

/// Turn a float into an integer field value
pub(crate) fn round_for_integer(value: f64, rounding: Option<RoundingMode>, source: &str) -> i64 {
    let mode = rounding.unwrap_or_else(|| {
        tracing::warn!(
            value = source,
            "float used for an integer field, but no rounding mode specified. \
             Append one of .round, .floor or .ceil. This defaults to .floor"
        );
        RoundingMode::Floor
    });
    mode.apply(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn base_units() {
        assert!(approx(convert_unit_to_si("m").unwrap(), 1.0));
        assert!(approx(convert_unit_to_si("deg").unwrap(), PI / 180.0));
        assert!(approx(convert_unit_to_si("bar").unwrap(), 100_000.0));
    }

    #[test]
    fn scaled_and_powered_units() {
        assert!(approx(convert_unit_to_si("km").unwrap(), 1e3));
        assert!(approx(convert_unit_to_si("mm").unwrap(), 1e-3));
        assert!(approx(convert_unit_to_si("mus").unwrap(), 1e-6));
        assert!(approx(convert_unit_to_si("cm^2").unwrap(), 1e-4));
        assert!(approx(convert_unit_to_si("s^-1").unwrap(), 1.0));
        assert!(approx(convert_unit_to_si("kg").unwrap(), 1.0));
    }

    #[test]
    fn unknown_unit() {
        assert!(matches!(
            convert_unit_to_si("furlong"),
            Err(ConfigError::UnknownUnit(_))
        ));
    }

    #[test]
    fn plain_integer_string() {
        assert_eq!(evaluate_numeric_field("-42", true).unwrap(), Value::Int(-42));
        assert_eq!(evaluate_numeric_field("42", false).unwrap(), Value::Int(42));
    }

    #[test]
    fn float_with_unit() {
        let Value::Float(v) = evaluate_numeric_field("90.deg", false).unwrap() else {
            panic!("expected float");
        };
        assert!(approx(v, PI / 2.0));

        let Value::Float(v) = evaluate_numeric_field("2.5.km", false).unwrap() else {
            panic!("expected float");
        };
        assert!(approx(v, 2500.0));
    }

    #[test]
    fn integer_field_rounding() {
        assert_eq!(evaluate_numeric_field("2.5.round", true).unwrap(), Value::Int(3));
        assert_eq!(evaluate_numeric_field("2.2.ceil", true).unwrap(), Value::Int(3));
        assert_eq!(evaluate_numeric_field("2.7", true).unwrap(), Value::Int(2));
        assert_eq!(evaluate_numeric_field("1.5.km.floor", true).unwrap(), Value::Int(1500));
    }

    #[test]
    fn not_numeric() {
        assert!(matches!(
            evaluate_numeric_field("fast", false),
            Err(ConfigError::NotNumeric(_))
        ));
    }
}
