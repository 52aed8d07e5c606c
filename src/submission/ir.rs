// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hardware task representation and results.
//!
//! All quantities are SI: seconds, radians per second, metres.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sampled values at increasing times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub times: Vec<Decimal>,
    pub values: Vec<Decimal>,
}

impl TimeSeries {
    pub fn new(times: Vec<Decimal>, values: Vec<Decimal>) -> Self {
        Self { times, values }
    }

    /// A series that is zero from 0 to `duration`.
    pub fn zero(duration: Decimal) -> Self {
        Self {
            times: vec![Decimal::ZERO, duration],
            values: vec![Decimal::ZERO, Decimal::ZERO],
        }
    }

    /// The last sample time.
    pub fn duration(&self) -> Decimal {
        self.times.last().copied().unwrap_or(Decimal::ZERO)
    }
}

/// A field applied identically to every site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalField {
    pub global: TimeSeries,
}

/// A field with a per-site coefficient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalField {
    pub time_series: TimeSeries,
    pub lattice_site_coefficients: Vec<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetuningField {
    pub global: TimeSeries,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RydbergHamiltonian {
    pub rabi_frequency_amplitude: GlobalField,
    pub rabi_frequency_phase: GlobalField,
    pub detuning: DetuningField,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveHamiltonian {
    pub rydberg: RydbergHamiltonian,
}

/// Site positions and which of them hold an atom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lattice {
    pub sites: Vec<(Decimal, Decimal)>,
    pub filling: Vec<u8>,
}

/// One hardware task, ready to serialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpecification {
    pub nshots: u32,
    pub lattice: Lattice,
    pub effective_hamiltonian: EffectiveHamiltonian,
}

impl TaskSpecification {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Status reported for a whole task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatusCode {
    Completed,
    Failed,
    Cancelled,
    PartiallyCompleted,
}

/// Status reported per shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotStatus {
    Completed,
    Failed,
    MissingPreSequence,
    MissingPostSequence,
    MissingMeasurement,
}

/// Measured occupations of one shot, one entry per site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotResult {
    pub shot_status: ShotStatus,
    pub pre_sequence: Vec<u8>,
    pub post_sequence: Vec<u8>,
}

/// Result of executing a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_status: TaskStatusCode,
    pub shot_outputs: Vec<ShotResult>,
}

impl TaskResult {
    /// Count post-sequence bitstrings of completed shots.
    pub fn bitstring_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for shot in &self.shot_outputs {
            if shot.shot_status != ShotStatus::Completed {
                continue;
            }
            let bits: String = shot
                .post_sequence
                .iter()
                .map(|bit| if *bit == 0 { '0' } else { '1' })
                .collect();
            *counts.entry(bits).or_insert(0) += 1;
        }
        counts
    }
}
