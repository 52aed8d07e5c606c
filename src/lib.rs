// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! QubitOS Analog Compiler
//!
//! This crate binds parameters of analog (neutral atom) programs, lowers
//! them to hardware tasks and runs batches of those tasks on AWS Braket or
//! a local emulator.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Source (program + assignments)          │
//! ├─────────────────────────────────────────┤
//! │  params: cast → assign → resolve         │
//! ├─────────────────────────────────────────┤
//! │  codegen: substitute → lower → tile      │
//! ├─────────────────────────────────────────┤
//! │  submission: discretize to capabilities  │
//! ├──────────────────┬──────────────────────┤
//! │  RemoteBatch     │  LocalBatch          │
//! │  (Braket, tokio) │  (emulator, rayon)   │
//! └──────────────────┴──────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`ir`]: Program tree and parameter spec
//! - [`params`]: Parameter casting, assignment sets and per-task resolution
//! - [`codegen`]: Substitution and hardware code generation
//! - [`submission`]: Task representation, capabilities and discretization
//! - [`task`]: Tasks and batches
//! - [`routine`]: Compile and execution routes
//! - [`backend`]: Remote backend and emulator traits
//! - [`config`]: Configuration management
//! - [`validation`]: Resource limit checks
//! - [`error`]: Error types

pub mod backend;
pub mod codegen;
pub mod config;
pub mod error;
pub mod ir;
pub mod params;
pub mod routine;
pub mod submission;
pub mod task;
pub mod validation;

pub use config::Config;
pub use error::{CompileError, Error, Result};
pub use routine::{Routine, Source};

#[cfg(test)]
pub mod test_utils;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
