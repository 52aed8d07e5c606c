// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hardware task representation, device capabilities and discretization.

pub mod capabilities;
pub mod discretize;
pub mod ir;

pub use capabilities::{
    Capabilities, LatticeCapabilities, LocalDetuningCapabilities, Quantity, RydbergCapabilities,
    TaskCapabilities,
};
pub use ir::{
    DetuningField, EffectiveHamiltonian, GlobalField, Lattice, LocalField, RydbergHamiltonian,
    ShotResult, ShotStatus, TaskResult, TaskSpecification, TaskStatusCode, TimeSeries,
};
