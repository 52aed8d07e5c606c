// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Translation of tasks into the Braket analog Hamiltonian simulation
//! (AHS) program format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::submission::{TaskSpecification, TimeSeries};

/// Spatial pattern of a Braket field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pattern {
    Uniform(UniformPattern),
    Sites(Vec<Decimal>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UniformPattern {
    Uniform,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BraketField {
    pub time_series: TimeSeries,
    pub pattern: Pattern,
}

impl BraketField {
    fn uniform(time_series: &TimeSeries) -> Self {
        Self {
            time_series: time_series.clone(),
            pattern: Pattern::Uniform(UniformPattern::Uniform),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrivingField {
    pub amplitude: BraketField,
    pub phase: BraketField,
    pub detuning: BraketField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftingField {
    pub magnitude: BraketField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BraketHamiltonian {
    pub driving_fields: Vec<DrivingField>,
    pub shifting_fields: Vec<ShiftingField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomRegister {
    pub sites: Vec<(Decimal, Decimal)>,
    pub filling: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setup {
    pub ahs_register: AtomRegister,
}

/// An AHS program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AhsProgram {
    pub setup: Setup,
    pub hamiltonian: BraketHamiltonian,
}

/// An AHS program with its shot count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BraketTaskSpecification {
    pub nshots: u32,
    pub program: AhsProgram,
}

/// Translate a task into Braket's AHS format.
pub fn to_braket_task_ir(task: &TaskSpecification) -> BraketTaskSpecification {
    let rydberg = &task.effective_hamiltonian.rydberg;
    let driving = DrivingField {
        amplitude: BraketField::uniform(&rydberg.rabi_frequency_amplitude.global),
        phase: BraketField::uniform(&rydberg.rabi_frequency_phase.global),
        detuning: BraketField::uniform(&rydberg.detuning.global),
    };
    let shifting_fields = rydberg
        .detuning
        .local
        .iter()
        .map(|local| ShiftingField {
            magnitude: BraketField {
                time_series: local.time_series.clone(),
                pattern: Pattern::Sites(local.lattice_site_coefficients.clone()),
            },
        })
        .collect();

    BraketTaskSpecification {
        nshots: task.nshots,
        program: AhsProgram {
            setup: Setup {
                ahs_register: AtomRegister {
                    sites: task.lattice.sites.clone(),
                    filling: task.lattice.filling.clone(),
                },
            },
            hamiltonian: BraketHamiltonian {
                driving_fields: vec![driving],
                shifting_fields,
            },
        },
    }
}
