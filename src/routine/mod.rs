// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Compile and execution routes.
//!
//! A [`Source`] is assigned, then sent down a route:
//!
//! ```text
//! Source ── braket() ──┬── aquila(backend) ───────► BraketHardwareRoutine ──► RemoteBatch
//!                      └── local_emulator(emu) ───► BraketLocalEmulatorRoutine ──► LocalBatch
//! ```

pub mod base;
pub mod braket;

pub use base::{compile_tasks, CompiledTask, Routine, Source};
pub use braket::{
    compile_local_tasks, BraketHardwareRoutine, BraketLocalEmulatorRoutine, BraketServiceOptions,
};
