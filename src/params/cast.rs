// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Casting of caller-supplied values into exact decimals.
//!
//! Real numbers are converted through their shortest round-trip string
//! form, so `0.1_f64` becomes exactly `0.1` rather than the binary
//! expansion of the nearest double. Later passes add and scale these
//! values and must not compound binary rounding error.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::AssignmentValue;
use crate::error::CompileError;
use crate::ir::ParamKind;

/// An uncast value as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Int(i64),
    Real(f64),
    Decimal(Decimal),
    Bool(bool),
    Text(String),
    List(Vec<RawValue>),
    Null,
}

impl RawValue {
    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Int(_) => "int",
            RawValue::Real(_) => "float",
            RawValue::Decimal(_) => "decimal",
            RawValue::Bool(_) => "bool",
            RawValue::Text(_) => "str",
            RawValue::List(_) => "list",
            RawValue::Null => "null",
        }
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Int(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Int(value.into())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Real(value)
    }
}

impl From<Decimal> for RawValue {
    fn from(value: Decimal) -> Self {
        RawValue::Decimal(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(values: Vec<T>) -> Self {
        RawValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => RawValue::Int(i),
                None => n
                    .as_f64()
                    .map(RawValue::Real)
                    .unwrap_or_else(|| RawValue::Text(n.to_string())),
            },
            Value::String(s) => RawValue::Text(s),
            Value::Array(items) => RawValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(_) => RawValue::Text(value.to_string()),
        }
    }
}

/// Cast a single real-number-like value.
pub fn cast_scalar_param(value: &RawValue, name: &str) -> Result<Decimal, CompileError> {
    match value {
        RawValue::Int(i) => Ok(Decimal::from(*i)),
        RawValue::Decimal(d) => Ok(*d),
        RawValue::Real(f) if f.is_finite() => Decimal::from_str(&f.to_string())
            .map_err(|_| CompileError::type_kind(name, "a real number", "float out of range")),
        RawValue::Real(_) => Err(CompileError::type_kind(
            name,
            "a real number",
            "non-finite float",
        )),
        other => Err(CompileError::type_kind(
            name,
            "a real number",
            other.type_name(),
        )),
    }
}

/// Cast a sequence of reals.
pub fn cast_vector_param(value: &RawValue, name: &str) -> Result<Vec<Decimal>, CompileError> {
    match value {
        RawValue::List(items) => items
            .iter()
            .map(|item| cast_scalar_param(item, name))
            .collect(),
        other => Err(CompileError::type_kind(
            name,
            "a list of real numbers",
            other.type_name(),
        )),
    }
}

/// Cast one real per batch item.
pub fn cast_batch_scalar_param(
    value: &RawValue,
    name: &str,
) -> Result<Vec<Decimal>, CompileError> {
    match value {
        RawValue::List(items) => items
            .iter()
            .map(|item| cast_scalar_param(item, name))
            .collect(),
        other => Err(CompileError::type_kind(
            name,
            "a list of real numbers",
            other.type_name(),
        )),
    }
}

/// Cast one vector per batch item.
pub fn cast_batch_vector_param(
    value: &RawValue,
    name: &str,
) -> Result<Vec<Vec<Decimal>>, CompileError> {
    match value {
        RawValue::List(items) => items
            .iter()
            .map(|item| cast_vector_param(item, name))
            .collect(),
        other => Err(CompileError::type_kind(
            name,
            "a list of lists of real numbers",
            other.type_name(),
        )),
    }
}

/// Cast a static value according to its declared kind.
pub fn cast_param(
    kind: ParamKind,
    value: &RawValue,
    name: &str,
) -> Result<AssignmentValue, CompileError> {
    match kind {
        ParamKind::Scalar => cast_scalar_param(value, name).map(AssignmentValue::Scalar),
        ParamKind::Vector => cast_vector_param(value, name).map(AssignmentValue::Vector),
    }
}

/// Cast a per-batch sequence according to its declared kind.
pub fn cast_batch_param(
    kind: ParamKind,
    value: &RawValue,
    name: &str,
) -> Result<Vec<AssignmentValue>, CompileError> {
    match kind {
        ParamKind::Scalar => Ok(cast_batch_scalar_param(value, name)?
            .into_iter()
            .map(AssignmentValue::Scalar)
            .collect()),
        ParamKind::Vector => Ok(cast_batch_vector_param(value, name)?
            .into_iter()
            .map(AssignmentValue::Vector)
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_scalar_from_float_uses_string_form() {
        let value = cast_scalar_param(&RawValue::Real(0.1), "x").unwrap();
        assert_eq!(value, dec!(0.1));
        assert_eq!(value.to_string(), "0.1");
    }

    #[test]
    fn test_scalar_from_int_and_decimal() {
        assert_eq!(cast_scalar_param(&RawValue::Int(-3), "x").unwrap(), dec!(-3));
        assert_eq!(
            cast_scalar_param(&RawValue::Decimal(dec!(2.50)), "x").unwrap(),
            dec!(2.50)
        );
    }

    #[test]
    fn test_scalar_rejects_non_numbers() {
        for value in [
            RawValue::Text("1.0".into()),
            RawValue::Bool(true),
            RawValue::Null,
            RawValue::List(vec![RawValue::Int(1)]),
            RawValue::Real(f64::NAN),
            RawValue::Real(f64::INFINITY),
        ] {
            let err = cast_scalar_param(&value, "omega").unwrap_err();
            match err {
                CompileError::TypeKind { name, .. } => assert_eq!(name, "omega"),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn test_type_kind_names_offending_type() {
        let err = cast_scalar_param(&RawValue::Text("a".into()), "omega").unwrap_err();
        assert_eq!(
            err.to_string(),
            "parameter 'omega' must be a real number, found type: str"
        );
    }

    #[test]
    fn test_vector_casts_each_element() {
        let value = RawValue::from(vec![1.5, 2.0, -0.25]);
        assert_eq!(
            cast_vector_param(&value, "mask").unwrap(),
            vec![dec!(1.5), dec!(2), dec!(-0.25)]
        );
    }

    #[test]
    fn test_vector_rejects_scalar_and_nesting() {
        assert!(matches!(
            cast_vector_param(&RawValue::Real(1.0), "mask"),
            Err(CompileError::TypeKind { .. })
        ));
        let nested = RawValue::List(vec![RawValue::from(vec![1, 2])]);
        assert!(matches!(
            cast_vector_param(&nested, "mask"),
            Err(CompileError::TypeKind { .. })
        ));
    }

    #[test]
    fn test_batch_vector() {
        let value = RawValue::List(vec![RawValue::from(vec![1, 0]), RawValue::from(vec![0, 1])]);
        let cast = cast_batch_vector_param(&value, "mask").unwrap();
        assert_eq!(cast, vec![vec![dec!(1), dec!(0)], vec![dec!(0), dec!(1)]]);
    }

    #[test]
    fn test_batch_rejects_non_sequence() {
        let err = cast_batch_scalar_param(&RawValue::Real(1.0), "delta").unwrap_err();
        assert!(err.to_string().contains("a list of real numbers"));
        let err = cast_batch_vector_param(&RawValue::Int(1), "mask").unwrap_err();
        assert!(err.to_string().contains("a list of lists of real numbers"));
    }

    #[test]
    fn test_from_json_value() {
        let json: serde_json::Value = serde_json::from_str("[1, 2.5, [3]]").unwrap();
        let raw = RawValue::from(json);
        assert_eq!(
            raw,
            RawValue::List(vec![
                RawValue::Int(1),
                RawValue::Real(2.5),
                RawValue::List(vec![RawValue::Int(3)]),
            ])
        );
    }

    proptest! {
        #[test]
        fn prop_cast_preserves_decimal_text(mantissa in -1_000_000_000i64..1_000_000_000, scale in 0u32..9) {
            let original = Decimal::new(mantissa, scale);
            let text = original.to_string();
            let as_float: f64 = text.parse().unwrap();
            let cast = cast_scalar_param(&RawValue::Real(as_float), "x").unwrap();
            prop_assert_eq!(cast, original);
        }
    }
}
