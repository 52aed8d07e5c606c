// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Passes from a program tree to hardware tasks.
//!
//! 1. [`assign`]: substitute bound values and evaluate recorded values
//! 2. [`quera`]: lower the bound tree to a [`TaskSpecification`]
//! 3. [`braket`]: translate a task into the Braket AHS format
//!
//! [`TaskSpecification`]: crate::submission::TaskSpecification

pub mod assign;
pub mod braket;
pub mod parallel;
pub mod quera;
pub mod waveform;

pub use assign::{assign_circuit, Assign, AssignmentScan};
pub use braket::{to_braket_task_ir, BraketTaskSpecification};
pub use parallel::{ClusterLocationInfo, ClusterResult, ParallelDecoder};
pub use quera::QuEraCodeGen;
