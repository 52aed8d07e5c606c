// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Parameter casting, assignment sets and per-task resolution.
//!
//! - [`cast`]: raw values to exact decimals
//! - [`assignment`]: static and batch assignment sets
//! - [`resolve`]: one fully merged assignment map per batch index

pub mod assignment;
pub mod cast;
pub mod resolve;

use std::fmt;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use assignment::AssignmentSet;
pub use cast::RawValue;
pub use resolve::{BatchAssignments, Params};

/// A cast parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssignmentValue {
    Scalar(Decimal),
    Vector(Vec<Decimal>),
}

impl AssignmentValue {
    pub fn as_scalar(&self) -> Option<Decimal> {
        match self {
            AssignmentValue::Scalar(value) => Some(*value),
            AssignmentValue::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[Decimal]> {
        match self {
            AssignmentValue::Scalar(_) => None,
            AssignmentValue::Vector(values) => Some(values),
        }
    }
}

impl fmt::Display for AssignmentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentValue::Scalar(value) => write!(f, "{}", value),
            AssignmentValue::Vector(values) => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

/// Name → value bindings applied to one program tree.
pub type AssignmentMap = IndexMap<String, AssignmentValue>;
