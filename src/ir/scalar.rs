// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Symbolic scalar expressions.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// A scalar expression appearing anywhere in the program tree.
///
/// Leaves are either literals, free variables, or variables that a
/// substitution pass has already bound. [`Scalar::Assigned`] keeps the
/// original name so the binding stays visible in the tree and can be
/// rebound by a later pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scalar {
    Literal { value: Decimal },
    Variable { name: String },
    Assigned { name: String, value: Decimal },
    Add { lhs: Box<Scalar>, rhs: Box<Scalar> },
    Mul { lhs: Box<Scalar>, rhs: Box<Scalar> },
    Div { lhs: Box<Scalar>, rhs: Box<Scalar> },
    Neg { expr: Box<Scalar> },
    Min { lhs: Box<Scalar>, rhs: Box<Scalar> },
    Max { lhs: Box<Scalar>, rhs: Box<Scalar> },
}

impl Scalar {
    pub fn literal(value: Decimal) -> Self {
        Scalar::Literal { value }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Scalar::Variable { name: name.into() }
    }

    pub fn add(self, rhs: impl Into<Scalar>) -> Self {
        Scalar::Add {
            lhs: Box::new(self),
            rhs: Box::new(rhs.into()),
        }
    }

    pub fn mul(self, rhs: impl Into<Scalar>) -> Self {
        Scalar::Mul {
            lhs: Box::new(self),
            rhs: Box::new(rhs.into()),
        }
    }

    pub fn div(self, rhs: impl Into<Scalar>) -> Self {
        Scalar::Div {
            lhs: Box::new(self),
            rhs: Box::new(rhs.into()),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn neg(self) -> Self {
        Scalar::Neg {
            expr: Box::new(self),
        }
    }

    pub fn min(self, rhs: impl Into<Scalar>) -> Self {
        Scalar::Min {
            lhs: Box::new(self),
            rhs: Box::new(rhs.into()),
        }
    }

    pub fn max(self, rhs: impl Into<Scalar>) -> Self {
        Scalar::Max {
            lhs: Box::new(self),
            rhs: Box::new(rhs.into()),
        }
    }

    /// Evaluate the expression.
    ///
    /// # Errors
    ///
    /// `UnboundParameter` for the first free variable encountered and
    /// `Arithmetic` on overflow or division by zero.
    pub fn value(&self) -> Result<Decimal, CompileError> {
        match self {
            Scalar::Literal { value } | Scalar::Assigned { value, .. } => Ok(*value),
            Scalar::Variable { name } => Err(CompileError::UnboundParameter(name.clone())),
            Scalar::Add { lhs, rhs } => {
                let (a, b) = (lhs.value()?, rhs.value()?);
                a.checked_add(b)
                    .ok_or_else(|| CompileError::Arithmetic(format!("{} + {} overflows", a, b)))
            }
            Scalar::Mul { lhs, rhs } => {
                let (a, b) = (lhs.value()?, rhs.value()?);
                a.checked_mul(b)
                    .ok_or_else(|| CompileError::Arithmetic(format!("{} * {} overflows", a, b)))
            }
            Scalar::Div { lhs, rhs } => {
                let (a, b) = (lhs.value()?, rhs.value()?);
                if b.is_zero() {
                    return Err(CompileError::Arithmetic(format!("{} / 0", a)));
                }
                a.checked_div(b)
                    .ok_or_else(|| CompileError::Arithmetic(format!("{} / {} overflows", a, b)))
            }
            Scalar::Neg { expr } => Ok(-expr.value()?),
            Scalar::Min { lhs, rhs } => Ok(lhs.value()?.min(rhs.value()?)),
            Scalar::Max { lhs, rhs } => Ok(lhs.value()?.max(rhs.value()?)),
        }
    }

    /// Whether any free variable remains in the expression.
    pub fn is_bound(&self) -> bool {
        match self {
            Scalar::Literal { .. } | Scalar::Assigned { .. } => true,
            Scalar::Variable { .. } => false,
            Scalar::Neg { expr } => expr.is_bound(),
            Scalar::Add { lhs, rhs }
            | Scalar::Mul { lhs, rhs }
            | Scalar::Div { lhs, rhs }
            | Scalar::Min { lhs, rhs }
            | Scalar::Max { lhs, rhs } => lhs.is_bound() && rhs.is_bound(),
        }
    }
}

impl From<Decimal> for Scalar {
    fn from(value: Decimal) -> Self {
        Scalar::Literal { value }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Literal {
            value: Decimal::from(value),
        }
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Literal {
            value: Decimal::from(value),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Literal { value } => write!(f, "{}", value),
            Scalar::Variable { name } => write!(f, "{}", name),
            Scalar::Assigned { name, value } => write!(f, "{}={}", name, value),
            Scalar::Add { lhs, rhs } => write!(f, "({} + {})", lhs, rhs),
            Scalar::Mul { lhs, rhs } => write!(f, "({} * {})", lhs, rhs),
            Scalar::Div { lhs, rhs } => write!(f, "({} / {})", lhs, rhs),
            Scalar::Neg { expr } => write!(f, "-{}", expr),
            Scalar::Min { lhs, rhs } => write!(f, "min({}, {})", lhs, rhs),
            Scalar::Max { lhs, rhs } => write!(f, "max({}, {})", lhs, rhs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_literal_arithmetic_is_exact() {
        let expr = Scalar::from(dec!(0.1)).add(dec!(0.2));
        assert_eq!(expr.value().unwrap(), dec!(0.3));
    }

    #[test]
    fn test_free_variable_is_unbound() {
        let expr = Scalar::var("omega").mul(2);
        assert!(!expr.is_bound());
        assert_eq!(
            expr.value().unwrap_err(),
            CompileError::UnboundParameter("omega".into())
        );
    }

    #[test]
    fn test_assigned_variable_evaluates() {
        let expr = Scalar::Assigned {
            name: "omega".into(),
            value: dec!(15.8),
        }
        .neg();
        assert!(expr.is_bound());
        assert_eq!(expr.value().unwrap(), dec!(-15.8));
    }

    #[test]
    fn test_division_by_zero() {
        let expr = Scalar::from(1).div(0);
        assert!(matches!(expr.value(), Err(CompileError::Arithmetic(_))));
    }

    #[test]
    fn test_min_max() {
        assert_eq!(Scalar::from(3).min(2).value().unwrap(), dec!(2));
        assert_eq!(Scalar::from(3).max(2).value().unwrap(), dec!(3));
    }

    #[test]
    fn test_serde_tagged_form() {
        let expr = Scalar::var("t");
        let json = serde_json::to_string(&expr).unwrap();
        assert_eq!(json, r#"{"kind":"variable","name":"t"}"#);
        let back: Scalar = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
    }
}
