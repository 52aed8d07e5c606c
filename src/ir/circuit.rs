// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Top-level program tree.

use serde::{Deserialize, Serialize};

use super::field::Field;
use super::register::Register;

/// The fields driving one level coupling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pulse {
    pub detuning: Option<Field>,
    pub rabi_amplitude: Option<Field>,
    pub rabi_phase: Option<Field>,
}

impl Pulse {
    pub fn with_detuning(mut self, field: Field) -> Self {
        self.detuning = Some(field);
        self
    }

    pub fn with_rabi_amplitude(mut self, field: Field) -> Self {
        self.rabi_amplitude = Some(field);
        self
    }

    pub fn with_rabi_phase(mut self, field: Field) -> Self {
        self.rabi_phase = Some(field);
        self
    }

    /// Fields in canonical order: detuning, rabi amplitude, rabi phase.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        [&self.detuning, &self.rabi_amplitude, &self.rabi_phase]
            .into_iter()
            .flatten()
    }
}

/// Pulses per level coupling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sequence {
    pub rydberg: Option<Pulse>,
    pub hyperfine: Option<Pulse>,
}

impl Sequence {
    pub fn rydberg(pulse: Pulse) -> Self {
        Self {
            rydberg: Some(pulse),
            hyperfine: None,
        }
    }

    pub fn pulses(&self) -> impl Iterator<Item = &Pulse> {
        [&self.rydberg, &self.hyperfine].into_iter().flatten()
    }
}

/// A register together with the sequence that drives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalogCircuit {
    pub register: Register,
    pub sequence: Sequence,
}

impl AnalogCircuit {
    pub fn new(register: impl Into<Register>, sequence: Sequence) -> Self {
        Self {
            register: register.into(),
            sequence,
        }
    }

    /// Load a program tree from its JSON form.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
