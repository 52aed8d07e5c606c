// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Execution backends.
//!
//! This module provides the [`RemoteBackend`] and [`Emulator`] traits and the
//! Braket implementation of the former:
//!
//! - `braket::BraketBackend`: QuEra Aquila through AWS Braket

pub mod braket;
pub mod r#trait;

pub use braket::client::{BraketHttpClient, MockBraketClient};
pub use braket::BraketBackend;
pub use r#trait::{Emulator, RemoteBackend, RemoteTaskStatus};
