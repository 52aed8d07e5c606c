// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Device limits consumed by code generation and discretization.
//!
//! Quantities are SI, matching the task representation.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Range and grid of one continuous quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    pub min: Decimal,
    pub max: Decimal,
    pub resolution: Decimal,
}

impl Quantity {
    pub fn new(min: Decimal, max: Decimal, resolution: Decimal) -> Self {
        Self {
            min,
            max,
            resolution,
        }
    }

    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCapabilities {
    pub number_shots_min: u32,
    pub number_shots_max: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticeCapabilities {
    /// Usable area width in metres.
    pub width: Decimal,
    /// Usable area height in metres.
    pub height: Decimal,
    pub position_resolution: Decimal,
    pub number_sites_max: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDetuningCapabilities {
    pub detuning: Quantity,
    pub site_coefficient: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RydbergCapabilities {
    pub time: Quantity,
    pub rabi_frequency: Quantity,
    pub detuning: Quantity,
    pub phase: Quantity,
    pub local: LocalDetuningCapabilities,
}

/// Limits of one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub task: TaskCapabilities,
    pub lattice: LatticeCapabilities,
    pub rydberg: RydbergCapabilities,
}

impl Capabilities {
    /// Published limits of QuEra Aquila.
    pub fn aquila() -> Self {
        Self {
            task: TaskCapabilities {
                number_shots_min: 1,
                number_shots_max: 1000,
            },
            lattice: LatticeCapabilities {
                width: Decimal::new(75, 6),
                height: Decimal::new(76, 6),
                position_resolution: Decimal::new(1, 7),
                number_sites_max: 256,
            },
            rydberg: RydbergCapabilities {
                time: Quantity::new(Decimal::ZERO, Decimal::new(4, 6), Decimal::new(1, 9)),
                rabi_frequency: Quantity::new(
                    Decimal::ZERO,
                    Decimal::from(15_800_000),
                    Decimal::from(400),
                ),
                detuning: Quantity::new(
                    Decimal::from(-125_000_000),
                    Decimal::from(125_000_000),
                    Decimal::new(2, 1),
                ),
                phase: Quantity::new(Decimal::from(-99), Decimal::from(99), Decimal::new(5, 7)),
                local: LocalDetuningCapabilities {
                    detuning: Quantity::new(
                        Decimal::ZERO,
                        Decimal::from(60_000_000),
                        Decimal::from(2000),
                    ),
                    site_coefficient: Quantity::new(
                        Decimal::ZERO,
                        Decimal::ONE,
                        Decimal::new(1, 2),
                    ),
                },
            },
        }
    }

    /// Load from a YAML or JSON file, chosen by extension.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Ok(serde_yaml::from_str(&content)?),
        }
    }
}
