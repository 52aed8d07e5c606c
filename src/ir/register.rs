// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Atom registers. Coordinates are in micrometres.

use serde::{Deserialize, Serialize};

use super::scalar::Scalar;

/// One trap site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub x: Scalar,
    pub y: Scalar,
    #[serde(default = "default_filled")]
    pub filled: bool,
}

fn default_filled() -> bool {
    true
}

impl Site {
    pub fn new(x: impl Into<Scalar>, y: impl Into<Scalar>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            filled: true,
        }
    }

    pub fn vacant(mut self) -> Self {
        self.filled = false;
        self
    }
}

/// An explicit list of sites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomArrangement {
    pub sites: Vec<Site>,
}

impl AtomArrangement {
    pub fn new(sites: Vec<Site>) -> Self {
        Self { sites }
    }

    /// A single row of `n` sites spaced `spacing` apart.
    pub fn chain(n: usize, spacing: impl Into<Scalar>) -> Self {
        let spacing = spacing.into();
        let sites = (0..n)
            .map(|i| Site::new(spacing.clone().mul(i as i64), 0))
            .collect();
        Self { sites }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// An arrangement tiled across the device with `cluster_spacing` between copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelRegister {
    pub arrangement: AtomArrangement,
    pub cluster_spacing: Scalar,
}

/// The register of an analog circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Register {
    Array(AtomArrangement),
    Parallel(ParallelRegister),
}

impl Register {
    /// The arrangement of a single logical copy.
    pub fn arrangement(&self) -> &AtomArrangement {
        match self {
            Register::Array(arrangement) => arrangement,
            Register::Parallel(parallel) => &parallel.arrangement,
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, Register::Parallel(_))
    }

    pub fn parallelize(self, cluster_spacing: impl Into<Scalar>) -> Self {
        let arrangement = match self {
            Register::Array(arrangement) => arrangement,
            Register::Parallel(parallel) => parallel.arrangement,
        };
        Register::Parallel(ParallelRegister {
            arrangement,
            cluster_spacing: cluster_spacing.into(),
        })
    }
}

impl From<AtomArrangement> for Register {
    fn from(arrangement: AtomArrangement) -> Self {
        Register::Array(arrangement)
    }
}
