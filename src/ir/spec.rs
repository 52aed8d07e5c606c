// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Parameter specification derived from a program tree.
//!
//! [`derive_param_spec`] walks the tree once and records every parameter
//! name in first-encounter order together with its kind. A name read by a
//! run-time vector modulation is a vector; every other name is a scalar.
//! Names produced by `record` waveforms are tracked separately since they
//! are bound during compilation rather than by the caller.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::circuit::{AnalogCircuit, Pulse};
use super::field::{Field, SpatialModulation};
use super::register::Register;
use super::scalar::Scalar;
use super::waveform::Waveform;
use crate::error::CompileError;

/// Declared kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Scalar,
    Vector,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Scalar => write!(f, "scalar"),
            ParamKind::Vector => write!(f, "vector"),
        }
    }
}

/// Parameter names of a program tree and their kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    params: IndexMap<String, ParamKind>,
    recorded: IndexSet<String>,
}

impl ParamSpec {
    pub fn kind(&self, name: &str) -> Option<ParamKind> {
        self.params.get(name).copied()
    }

    pub fn is_vector(&self, name: &str) -> bool {
        self.kind(name) == Some(ParamKind::Vector)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Names in first-encounter order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamKind)> {
        self.params.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    pub fn vector_names(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, kind)| *kind == ParamKind::Vector)
            .map(|(name, _)| name)
    }

    /// Names bound by `record` waveforms.
    pub fn recorded(&self) -> &IndexSet<String> {
        &self.recorded
    }

    pub fn is_recorded(&self, name: &str) -> bool {
        self.recorded.contains(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Walk `circuit` once and collect its parameters.
///
/// # Errors
///
/// `ShapeMismatch` if a name is used both as a scalar and as a vector, or
/// if a recorded name is also read as a vector.
pub fn derive_param_spec(circuit: &AnalogCircuit) -> Result<ParamSpec, CompileError> {
    let mut collector = ParamCollector::default();
    collector.register(&circuit.register)?;
    for pulse in circuit.sequence.pulses() {
        collector.pulse(pulse)?;
    }
    Ok(collector.spec)
}

#[derive(Default)]
struct ParamCollector {
    spec: ParamSpec,
}

impl ParamCollector {
    fn declare(&mut self, name: &str, kind: ParamKind) -> Result<(), CompileError> {
        match self.spec.params.get(name) {
            Some(existing) if *existing != kind => Err(CompileError::ShapeMismatch(format!(
                "parameter '{}' is used both as a {} and as a {}",
                name, existing, kind
            ))),
            Some(_) => Ok(()),
            None => {
                if kind == ParamKind::Vector && self.spec.recorded.contains(name) {
                    return Err(CompileError::ShapeMismatch(format!(
                        "recorded value '{}' cannot be used as a vector",
                        name
                    )));
                }
                self.spec.params.insert(name.to_string(), kind);
                Ok(())
            }
        }
    }

    fn scalar(&mut self, scalar: &Scalar) -> Result<(), CompileError> {
        match scalar {
            Scalar::Literal { .. } => Ok(()),
            Scalar::Variable { name } | Scalar::Assigned { name, .. } => {
                self.declare(name, ParamKind::Scalar)
            }
            Scalar::Neg { expr } => self.scalar(expr),
            Scalar::Add { lhs, rhs }
            | Scalar::Mul { lhs, rhs }
            | Scalar::Div { lhs, rhs }
            | Scalar::Min { lhs, rhs }
            | Scalar::Max { lhs, rhs } => {
                self.scalar(lhs)?;
                self.scalar(rhs)
            }
        }
    }

    fn scalars<'a>(
        &mut self,
        scalars: impl IntoIterator<Item = &'a Scalar>,
    ) -> Result<(), CompileError> {
        scalars.into_iter().try_for_each(|s| self.scalar(s))
    }

    fn register(&mut self, register: &Register) -> Result<(), CompileError> {
        for site in &register.arrangement().sites {
            self.scalar(&site.x)?;
            self.scalar(&site.y)?;
        }
        if let Register::Parallel(parallel) = register {
            self.scalar(&parallel.cluster_spacing)?;
        }
        Ok(())
    }

    fn pulse(&mut self, pulse: &Pulse) -> Result<(), CompileError> {
        pulse.fields().try_for_each(|field| self.field(field))
    }

    fn field(&mut self, field: &Field) -> Result<(), CompileError> {
        for drive in &field.drives {
            match &drive.modulation {
                SpatialModulation::Uniform => {}
                SpatialModulation::ScaledLocations { locations } => {
                    self.scalars(locations.iter().map(|l| &l.scale))?;
                }
                SpatialModulation::RunTimeVector { name }
                | SpatialModulation::AssignedRunTimeVector { name, .. } => {
                    self.declare(name, ParamKind::Vector)?;
                }
            }
            self.waveform(&drive.waveform)?;
        }
        Ok(())
    }

    fn waveform(&mut self, waveform: &Waveform) -> Result<(), CompileError> {
        match waveform {
            Waveform::Constant { value, duration } => {
                self.scalar(value)?;
                self.scalar(duration)
            }
            Waveform::Linear {
                start,
                stop,
                duration,
            } => {
                self.scalar(start)?;
                self.scalar(stop)?;
                self.scalar(duration)
            }
            Waveform::PiecewiseLinear { durations, values }
            | Waveform::PiecewiseConstant { durations, values } => {
                self.scalars(durations)?;
                self.scalars(values)
            }
            Waveform::Append { waveforms } => {
                waveforms.iter().try_for_each(|w| self.waveform(w))
            }
            Waveform::Scale { factor, waveform } => {
                self.scalar(factor)?;
                self.waveform(waveform)
            }
            Waveform::Negative { waveform } => self.waveform(waveform),
            Waveform::Record { name, waveform } => {
                self.waveform(waveform)?;
                if self.spec.is_vector(name) {
                    return Err(CompileError::ShapeMismatch(format!(
                        "recorded value '{}' cannot be used as a vector",
                        name
                    )));
                }
                self.spec.recorded.insert(name.clone());
                Ok(())
            }
        }
    }
}
