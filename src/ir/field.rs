// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Drive fields and their spatial modulation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::scalar::Scalar;
use super::waveform::Waveform;

/// Per-site scale factor of a local drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationScale {
    /// Index into the register's site list.
    pub site: usize,
    pub scale: Scalar,
}

/// How a waveform is distributed over the register sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpatialModulation {
    /// Same amplitude on every site.
    Uniform,
    /// Explicit scale for a subset of sites; others are zero.
    ScaledLocations { locations: Vec<LocationScale> },
    /// One coefficient per site, supplied as a vector parameter.
    RunTimeVector { name: String },
    /// A run-time vector after substitution.
    AssignedRunTimeVector { name: String, values: Vec<Decimal> },
}

/// A waveform paired with its spatial modulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drive {
    pub modulation: SpatialModulation,
    pub waveform: Waveform,
}

/// Sum of drives acting on one physical quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub drives: Vec<Drive>,
}

impl Field {
    pub fn uniform(waveform: Waveform) -> Self {
        Self {
            drives: vec![Drive {
                modulation: SpatialModulation::Uniform,
                waveform,
            }],
        }
    }

    pub fn with_drive(mut self, modulation: SpatialModulation, waveform: Waveform) -> Self {
        self.drives.push(Drive {
            modulation,
            waveform,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.drives.is_empty()
    }
}
